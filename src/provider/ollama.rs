use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{read_success_body, Provider};
use crate::errors::{SiteError, SiteResult};
use crate::wire::Instruction;

pub const DEFAULT_URL: &str = "http://localhost:11434";

pub struct Ollama {
    model: String,
    url: String,
    temperature: f64,
    client: Client,
}

impl Ollama {
    pub fn new(model: String, url: String, temperature: f64, timeout: Duration) -> SiteResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { model, url, temperature, client })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

#[async_trait]
impl Provider for Ollama {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, ins: &Instruction) -> SiteResult<String> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Msg { role: "system", content: &ins.system },
                Msg { role: "user", content: &ins.user },
            ],
            stream: false,
            options: OllamaOptions { temperature: self.temperature },
        };

        tracing::debug!(%url, model = %self.model, "ollama: POST");

        let resp = self.client.post(&url).json(&body).send().await?;
        let text = read_success_body(resp, "Ollama").await?;

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| SiteError::Upstream(format!("unexpected Ollama response: {e}\nRaw: {text}")))?;
        Ok(parsed.message.content)
    }
}
