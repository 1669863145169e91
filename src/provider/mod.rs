use async_trait::async_trait;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::LlmConfig;
use crate::errors::{SiteError, SiteResult};
use crate::wire::Instruction;

pub mod anthropic;
pub mod ollama;
pub mod openai;

/// A chat-completion backend. Returns the assistant's text exactly as sent;
/// interpreting it is the caller's job.
#[async_trait]
pub trait Provider: Send + Sync {
    fn model(&self) -> &str;
    async fn complete(&self, ins: &Instruction) -> SiteResult<String>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &LlmConfig) -> SiteResult<DynProvider> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    match cfg.provider {
        ProviderKind::OpenAI => {
            let api_key = require_key(cfg, "OPENAI_API_KEY")?;
            Ok(Box::new(openai::OpenAIProvider::new(
                cfg.model.clone(),
                api_key,
                cfg.api_base.clone().unwrap_or_else(|| openai::DEFAULT_API_BASE.into()),
                cfg.temperature,
                cfg.json_mode,
                timeout,
            )?))
        }
        ProviderKind::Anthropic => {
            let api_key = require_key(cfg, "ANTHROPIC_API_KEY")?;
            Ok(Box::new(anthropic::Anthropic::new(
                cfg.model.clone(),
                api_key,
                cfg.api_base.clone().unwrap_or_else(|| anthropic::DEFAULT_API_BASE.into()),
                cfg.temperature,
                cfg.max_tokens,
                timeout,
            )?))
        }
        ProviderKind::Ollama => Ok(Box::new(ollama::Ollama::new(
            cfg.model.clone(),
            cfg.api_base.clone().unwrap_or_else(|| ollama::DEFAULT_URL.into()),
            cfg.temperature,
            timeout,
        )?)),
    }
}

fn require_key(cfg: &LlmConfig, var: &str) -> SiteResult<String> {
    cfg.api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| SiteError::Config(format!("{var} is not set and llm.api_key is empty")))
}

/// Non-2xx replies become upstream errors carrying the status and body.
pub(crate) async fn read_success_body(resp: reqwest::Response, who: &str) -> SiteResult<String> {
    let status = resp.status();
    let text = resp.text().await?;
    tracing::debug!(provider = who, %status, body_len = text.len(), "upstream replied");
    if !status.is_success() {
        return Err(SiteError::Upstream(format!("{who} API error ({status}): {text}")));
    }
    Ok(text)
}
