use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("model did not return a valid site artifact")]
    MalformedOutput { raw: String },
    #[error("deploy command failed ({status}): {stderr}")]
    DeployFailed { status: String, stderr: String },
    #[error("deploy finished but no site URL was found in its output")]
    UrlNotFound { stdout: String },
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid request body: {0}")]
    InvalidRequest(String),
}

impl SiteError {
    /// Stable tag used in HTTP payloads and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "upstream",
            Self::MalformedOutput { .. } => "malformed_output",
            Self::DeployFailed { .. } => "deploy_failed",
            Self::UrlNotFound { .. } => "url_not_found",
            Self::Filesystem(_) => "filesystem",
            Self::InvalidFileName(_) => "invalid_file_name",
            Self::Config(_) => "config",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    /// The text a human needs to diagnose the failure.
    pub fn details(&self) -> String {
        match self {
            Self::Upstream(msg) | Self::Config(msg) | Self::InvalidRequest(msg) => msg.clone(),
            Self::MalformedOutput { raw } => raw.clone(),
            Self::DeployFailed { stderr, .. } => stderr.clone(),
            Self::UrlNotFound { stdout } => stdout.clone(),
            Self::Filesystem(e) => e.to_string(),
            Self::InvalidFileName(name) => name.clone(),
        }
    }
}

impl From<reqwest::Error> for SiteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Upstream(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::Upstream(format!("could not reach LLM API: {e}"))
        } else {
            Self::Upstream(e.to_string())
        }
    }
}

pub type SiteResult<T> = Result<T, SiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(SiteError::MalformedOutput { raw: "x".into() }.kind(), "malformed_output");
        assert_eq!(SiteError::UrlNotFound { stdout: String::new() }.kind(), "url_not_found");
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(SiteError::from(io).kind(), "filesystem");
        assert_eq!(SiteError::InvalidRequest("missing field `prompt`".into()).kind(), "invalid_request");
    }

    #[test]
    fn details_carry_raw_text() {
        let e = SiteError::DeployFailed { status: "exit status: 1".into(), stderr: "auth error".into() };
        assert_eq!(e.details(), "auth error");
        let e = SiteError::MalformedOutput { raw: "Sorry, I can't do that.".into() };
        assert_eq!(e.details(), "Sorry, I can't do that.");
    }
}
