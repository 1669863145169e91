use fs_err as fs;
use humansize::{format_size, DECIMAL};
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

use crate::config::{DeployConcurrency, DeployConfig};
use crate::errors::{SiteError, SiteResult};
use crate::exec::{self, CmdResult};
use crate::safety;
use crate::wire::DeployRequest;

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub url: String,
    pub stdout: String,
    pub duration_ms: u128,
}

/// Stages files in a fresh scratch directory, hands it to the deploy CLI and
/// recovers the public URL. The directory never outlives the call.
pub struct DeployGateway {
    command: String,
    site_id: String,
    url_pattern: Regex,
    scratch_root: Option<PathBuf>,
    timeout: Option<Duration>,
    lock: Option<Mutex<()>>,
}

impl DeployGateway {
    pub fn from_config(cfg: &DeployConfig) -> SiteResult<Self> {
        let site_id = cfg.site_id.clone().unwrap_or_default();
        if site_id.is_empty() && cfg.command.contains("{site}") {
            return Err(SiteError::Config(
                "deploy.site_id is not set (NETLIFY_SITE_ID) but the deploy command needs {site}".into(),
            ));
        }
        let url_pattern = Regex::new(&cfg.url_pattern)
            .map_err(|e| SiteError::Config(format!("invalid deploy.url_pattern: {e}")))?;
        // Validate the template once up front.
        exec::build_argv(&cfg.command, &[])?;

        Ok(Self {
            command: cfg.command.clone(),
            site_id,
            url_pattern,
            scratch_root: cfg.scratch_root.clone(),
            timeout: cfg.timeout_secs.map(Duration::from_secs),
            lock: match cfg.concurrency {
                DeployConcurrency::Serialize => Some(Mutex::new(())),
                DeployConcurrency::Parallel => None,
            },
        })
    }

    /// First word of the command template, e.g. `netlify`.
    pub fn program(&self) -> Option<String> {
        exec::build_argv(&self.command, &[]).ok()?.into_iter().next()
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub async fn deploy(&self, req: &DeployRequest) -> SiteResult<DeployOutcome> {
        if let Some(bad) = req.files.keys().find(|n| !safety::file_name_is_allowed(n)) {
            return Err(SiteError::InvalidFileName(bad.clone()));
        }

        let _serial = match &self.lock {
            Some(m) => Some(m.lock().await),
            None => None,
        };

        let scratch = self.scratch_dir()?;
        tracing::info!(
            dir = %scratch.path().display(),
            files = req.files.len(),
            size = %format_size(req.total_bytes(), DECIMAL),
            site = %self.site_id,
            "staging deploy"
        );

        let result = match stage(scratch.path(), req) {
            Ok(()) => self.run_command(scratch.path()).await,
            Err(e) => Err(e),
        };

        let dir = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            tracing::error!(dir = %dir.display(), "could not remove scratch directory: {e}");
        }

        let out = result?;
        if !out.success {
            let status = out.status_label();
            tracing::warn!(%status, "deploy command failed");
            let stderr = if out.stderr.trim().is_empty() { out.stdout } else { out.stderr };
            return Err(SiteError::DeployFailed { status, stderr });
        }

        match scrape_url(&out.stdout, &self.url_pattern) {
            Some(url) => {
                tracing::info!(%url, ms = out.duration_ms as u64, "deployed");
                Ok(DeployOutcome { url, stdout: out.stdout, duration_ms: out.duration_ms })
            }
            None => {
                tracing::warn!("deploy command succeeded but printed no recognizable URL");
                Err(SiteError::UrlNotFound { stdout: out.stdout })
            }
        }
    }

    async fn run_command(&self, dir: &Path) -> SiteResult<CmdResult> {
        let dir_str = dir.to_string_lossy();
        let argv = exec::build_argv(&self.command, &[("dir", dir_str.as_ref()), ("site", self.site_id.as_str())])?;
        exec::run(&argv, self.timeout).await.map_err(|e| SiteError::DeployFailed {
            status: "not completed".into(),
            stderr: format!("{}: {e}", argv[0]),
        })
    }

    fn scratch_dir(&self) -> SiteResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vibe-site-");
        let dir = match &self.scratch_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

fn stage(dir: &Path, req: &DeployRequest) -> SiteResult<()> {
    for (name, content) in &req.files {
        fs::write(dir.join(name), content)?;
    }
    Ok(())
}

/// Find the site URL in the deploy tool's stdout. A JSON object (`--json`
/// mode) is read structurally; otherwise the first match of `pattern` wins.
pub fn scrape_url(stdout: &str, pattern: &Regex) -> Option<String> {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(stdout.trim()) {
        let found = ["url", "ssl_url", "deploy_url"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty());
        if let Some(url) = found {
            return Some(url.to_string());
        }
    }
    pattern.find(stdout).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_URL_PATTERN;

    fn pattern() -> Regex {
        Regex::new(DEFAULT_URL_PATTERN).unwrap()
    }

    #[test]
    fn scrapes_first_url_from_text() {
        let out = "Deploying...\nWebsite deployed to https://example-site.netlify.app ...\nLogs: https://other.netlify.app\n";
        assert_eq!(scrape_url(out, &pattern()).as_deref(), Some("https://example-site.netlify.app"));
    }

    #[test]
    fn prefers_structured_json() {
        let out = r#"{"site_id":"x","deploy_url":"https://abc--demo.netlify.app","url":"https://demo.netlify.app"}"#;
        assert_eq!(scrape_url(out, &pattern()).as_deref(), Some("https://demo.netlify.app"));
    }

    #[test]
    fn no_url_is_none() {
        assert_eq!(scrape_url("all done!", &pattern()), None);
        assert_eq!(scrape_url("see http://insecure.netlify.app", &pattern()), None);
    }

    #[test]
    fn site_placeholder_needs_a_site_id() {
        let cfg = DeployConfig::default();
        assert_eq!(DeployGateway::from_config(&cfg).err().unwrap().kind(), "config");
        let cfg = DeployConfig { site_id: Some("abc".into()), ..DeployConfig::default() };
        let gw = DeployGateway::from_config(&cfg).unwrap();
        assert_eq!(gw.program().as_deref(), Some("netlify"));
        assert_eq!(gw.site_id(), "abc");
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let cfg = DeployConfig {
            site_id: Some("abc".into()),
            url_pattern: "https://[".into(),
            ..DeployConfig::default()
        };
        assert_eq!(DeployGateway::from_config(&cfg).err().unwrap().kind(), "config");
    }
}
