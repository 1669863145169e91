use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{read_success_body, Provider};
use crate::errors::{SiteError, SiteResult};
use crate::wire::Instruction;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// OpenAI-compatible chat completions: one system message, one user message.
pub struct OpenAIProvider {
    model: String,
    api_key: String,
    api_base: String,
    temperature: f64,
    json_mode: bool,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(
        model: String,
        api_key: String,
        api_base: String,
        temperature: f64,
        json_mode: bool,
        timeout: Duration,
    ) -> SiteResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { model, api_key, api_base, temperature, json_mode, client })
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, ins: &Instruction) -> SiteResult<String> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": ins.system },
                { "role": "user", "content": ins.user }
            ],
            "temperature": self.temperature
        });
        if self.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        tracing::debug!(%url, model = %self.model, "openai: POST");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let text = read_success_body(resp, "OpenAI").await?;

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| SiteError::Upstream(format!("unexpected OpenAI response: {e}\nRaw: {text}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SiteError::Upstream("OpenAI response had no assistant message".into()))
    }
}
