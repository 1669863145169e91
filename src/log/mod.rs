use anyhow::Result;
use fs_err as fs;
use serde_json::to_string_pretty;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;
use crate::wire::Transcript;

/// Console output plus an optional plain-text log file. `RUST_LOG` wins over
/// the built-in default.
pub fn init(cfg: &LogConfig, debug: bool) -> Result<()> {
    let default = if debug { "debug,hyper=info,reqwest=info" } else { "info,tower_http=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let file_layer = match &cfg.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()?;
    Ok(())
}

/// Writes one JSON file per generation: `<dir>/<timestamp>-<id>.json`.
#[derive(Debug, Clone)]
pub struct TranscriptSink {
    dir: PathBuf,
}

impl TranscriptSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn save(&self, t: &Transcript) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let name = format!("{}-{}.json", t.timestamp.format("%Y%m%dT%H%M%S"), t.id);
        let path = self.dir.join(name);
        fs::write(&path, to_string_pretty(t)?)?;
        tracing::debug!(path = %path.display(), "transcript saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Outcome;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn transcript_lands_in_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TranscriptSink::new(dir.path().join("tx"));
        let t = Transcript {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            model: "gpt-4.1".into(),
            prompt: "a landing page for a coffee shop".into(),
            raw: Some("Sorry, I can't do that.".into()),
            outcome: Outcome::MalformedOutput,
        };
        let path = sink.save(&t).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().ends_with(&format!("{}.json", t.id)));
        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["raw"], "Sorry, I can't do that.");
        assert_eq!(saved["outcome"], "malformed_output");
    }
}
