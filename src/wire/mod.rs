use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::compose;

// ========================================
// HTTP and model wire types
// ========================================

/// One generated website. All three members must be present and string-valued;
/// anything else the model adds is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteArtifact {
    pub html: String,
    pub css: String,
    pub js: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// File name to file content, exactly as posted to `/deploy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployRequest {
    pub files: BTreeMap<String, String>,
}

impl DeployRequest {
    /// The standard three-file bundle: the composed document as `index.html`
    /// plus the raw stylesheet and script.
    pub fn from_artifact(artifact: &SiteArtifact) -> Self {
        let mut files = BTreeMap::new();
        files.insert("index.html".to_string(), compose::compose(artifact));
        files.insert("style.css".to_string(), artifact.css.clone());
        files.insert("script.js".to_string(), artifact.js.clone());
        Self { files }
    }

    pub fn total_bytes(&self) -> usize {
        self.files.values().map(|c| c.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployResponse {
    pub message: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Artifact,
    MalformedOutput,
    Upstream { message: String },
}

/// Saved record of one generation round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub outcome: Outcome,
}
