use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "open-ai", alias = "openai")]
    OpenAI,
    #[value(alias = "anthropic")]
    Anthropic,
    #[value(alias = "ollama")]
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "vibe_sitegen", version, about = "Prompt-to-website generator with live preview and one-step deploy")]
pub struct Args {
    /// TOML or YAML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Save each generation's prompt and raw reply as JSON.
    #[arg(long, default_value_t = false, global = true)]
    pub save_transcripts: bool,

    #[arg(long, default_value_t = false, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP backend and browser shell.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Generate a site once and write index.html, style.css and script.js.
    Generate {
        #[arg(long)]
        prompt: String,
        #[arg(long, default_value = "site")]
        out: PathBuf,
    },
    /// Deploy the files of a directory (top level only).
    Deploy {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        site: Option<String>,
        /// Only report whether the deploy tool is installed.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Interactive terminal shell: prompt, inspect, edit, preview, deploy.
    Studio {
        #[arg(long, default_value = "vibe-preview.html")]
        preview: PathBuf,
        /// Hide the spinner while waiting on the model or the deploy tool.
        #[arg(long = "no-progress", action = clap::ArgAction::SetFalse)]
        progress: bool,
    },
}
