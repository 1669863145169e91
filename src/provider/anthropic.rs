use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{read_success_body, Provider};
use crate::errors::{SiteError, SiteResult};
use crate::wire::Instruction;

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct Anthropic {
    model: String,
    api_key: String,
    api_base: String,
    temperature: f64,
    max_tokens: u32,
    client: Client,
}

impl Anthropic {
    pub fn new(
        model: String,
        api_key: String,
        api_base: String,
        temperature: f64,
        max_tokens: u32,
        timeout: Duration,
    ) -> SiteResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { model, api_key, api_base, temperature, max_tokens, client })
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

#[async_trait]
impl Provider for Anthropic {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, ins: &Instruction) -> SiteResult<String> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let body = MsgRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: &ins.system,
            messages: vec![Msg { role: "user", content: &ins.user }],
        };

        tracing::debug!(%url, model = %self.model, "anthropic: POST");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;
        let text = read_success_body(resp, "Anthropic").await?;

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| SiteError::Upstream(format!("unexpected Anthropic response: {e}\nRaw: {text}")))?;

        parsed
            .content
            .into_iter()
            .find(|b| b.r#type == "text")
            .map(|b| b.text)
            .ok_or_else(|| SiteError::Upstream("Anthropic response had no text block".into()))
    }
}
