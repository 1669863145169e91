use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{SiteError, SiteResult};
use crate::log::TranscriptSink;
use crate::prompt;
use crate::provider::{self, DynProvider};
use crate::wire::{Outcome, SiteArtifact, Transcript};

/// Turns a prompt into a [`SiteArtifact`] with one model round trip.
pub struct SiteGenerator {
    provider: DynProvider,
    transcripts: Option<TranscriptSink>,
}

impl SiteGenerator {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider, transcripts: None }
    }

    /// Provider from `llm`, transcripts from `log` when enabled.
    pub fn from_config(cfg: &Config) -> SiteResult<Self> {
        let generator = Self::new(provider::make_provider(&cfg.llm)?);
        Ok(if cfg.log.save_transcripts {
            let dir = cfg.log.transcripts_dir.clone().unwrap_or_else(|| ".vibe/transcripts".into());
            generator.with_transcripts(TranscriptSink::new(dir))
        } else {
            generator
        })
    }

    pub fn with_transcripts(mut self, sink: TranscriptSink) -> Self {
        self.transcripts = Some(sink);
        self
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// No prompt validation happens here; callers decide what a usable prompt is.
    pub async fn generate(&self, prompt: &str) -> SiteResult<SiteArtifact> {
        let id = Uuid::new_v4();
        tracing::info!(%id, model = self.provider.model(), prompt_len = prompt.len(), "generating site");

        let ins = prompt::instruction(prompt);
        let result = match self.provider.complete(&ins).await {
            Ok(raw) => {
                let parsed = parse_artifact(&raw);
                self.record(id, prompt, Some(raw), &parsed);
                parsed
            }
            Err(e) => {
                let failed: SiteResult<SiteArtifact> = Err(e);
                self.record(id, prompt, None, &failed);
                failed
            }
        };

        match &result {
            Ok(a) => tracing::info!(%id, html = a.html.len(), css = a.css.len(), js = a.js.len(), "site generated"),
            Err(e) => tracing::warn!(%id, kind = e.kind(), "generation failed: {e}"),
        }
        result
    }

    fn record(&self, id: Uuid, prompt: &str, raw: Option<String>, result: &SiteResult<SiteArtifact>) {
        let Some(sink) = &self.transcripts else { return };
        let outcome = match result {
            Ok(_) => Outcome::Artifact,
            Err(SiteError::MalformedOutput { .. }) => Outcome::MalformedOutput,
            Err(e) => Outcome::Upstream { message: e.to_string() },
        };
        let t = Transcript {
            id,
            timestamp: Utc::now(),
            model: self.provider.model().to_string(),
            prompt: prompt.to_string(),
            raw,
            outcome,
        };
        if let Err(e) = sink.save(&t) {
            tracing::warn!(%id, "could not save transcript: {e}");
        }
    }
}

/// Parse the model's reply. Strict JSON first; then a lenient pass that
/// unwraps a Markdown fence or tries each balanced object in the text. On
/// failure the reply comes back untouched in `MalformedOutput::raw`.
pub fn parse_artifact(raw: &str) -> SiteResult<SiteArtifact> {
    if let Ok(a) = serde_json::from_str::<SiteArtifact>(raw) {
        return Ok(a);
    }
    if let Some(a) = strip_code_fence(raw).and_then(|body| serde_json::from_str::<SiteArtifact>(body).ok()) {
        tracing::debug!("model reply was wrapped in a code fence");
        return Ok(a);
    }
    // Chatty replies: try each balanced `{...}` in turn until one is an artifact.
    let mut from = 0;
    while let Some((start, end)) = balanced_object(raw, from) {
        if let Ok(a) = serde_json::from_str::<SiteArtifact>(&raw[start..=end]) {
            tracing::debug!(offset = start, "model reply needed lenient parsing");
            return Ok(a);
        }
        from = start + 1;
    }
    Err(SiteError::MalformedOutput { raw: raw.to_string() })
}

fn strip_code_fence(s: &str) -> Option<&str> {
    let t = s.trim();
    let body = t.strip_prefix("```")?.strip_suffix("```")?;
    // Drop the info string ("json") on the opening line.
    let (_, rest) = body.split_once('\n')?;
    Some(rest.trim())
}

/// Byte range of the first balanced `{...}` at or after `from`, honouring
/// braces inside JSON strings.
fn balanced_object(s: &str, from: usize) -> Option<(usize, usize)> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate().skip(from) {
        if in_str {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_str = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_str = true,
            b'{' => {
                start.get_or_insert(i);
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|st| (st, i));
                }
            }
            _ => {}
        }
    }
    None
}
