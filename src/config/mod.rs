use anyhow::{bail, Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::ProviderKind;

pub const DEFAULT_DEPLOY_COMMAND: &str = "netlify deploy --prod --dir={dir} --site={site}";
pub const DEFAULT_URL_PATTERN: &str = r"https://[^\s]+\.netlify\.app";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub deploy: DeployConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    /// Overrides the provider's public endpoint (proxies, local gateways, tests).
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Ask OpenAI-compatible APIs for `response_format: json_object`.
    pub json_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployConcurrency {
    /// One deploy at a time per process.
    Serialize,
    /// Deploys run side by side, each in its own scratch directory.
    Parallel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Command line with `{dir}` and `{site}` placeholders.
    pub command: String,
    pub site_id: Option<String>,
    pub url_pattern: String,
    /// Parent of the per-call scratch directories; system temp dir when unset.
    pub scratch_root: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub concurrency: DeployConcurrency,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    pub save_transcripts: bool,
    pub transcripts_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:4000".into() }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: "gpt-4.1".into(),
            api_base: None,
            api_key: None,
            temperature: 0.2,
            max_tokens: 8192,
            timeout_secs: 300,
            json_mode: false,
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_DEPLOY_COMMAND.into(),
            site_id: None,
            url_pattern: DEFAULT_URL_PATTERN.into(),
            scratch_root: None,
            timeout_secs: None,
            concurrency: DeployConcurrency::Serialize,
        }
    }
}

impl Config {
    /// Defaults, then the optional config file, then `overrides` (command-line
    /// flags), then environment credentials. The provider must be final before
    /// the environment is read because it decides which key variable applies.
    pub fn load(path: Option<&Path>, overrides: impl FnOnce(&mut Config)) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        overrides(&mut cfg);
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        match ext {
            "toml" => toml::from_str(&text)
                .with_context(|| format!("parsing {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&text)
                .with_context(|| format!("parsing {}", path.display())),
            other => bail!("unsupported config format: .{other}"),
        }
    }

    /// Credentials and the site id come from the environment when present.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let key_var = match self.llm.provider {
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Ollama => None,
        };
        if let Some(v) = key_var.and_then(|k| lookup(k)).filter(|v| !v.is_empty()) {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = lookup("NETLIFY_SITE_ID").filter(|v| !v.is_empty()) {
            self.deploy.site_id = Some(v);
        }
        if let Some(v) = lookup("VIBE_SITEGEN_BIND").filter(|v| !v.is_empty()) {
            self.server.bind = v;
        }
    }
}
