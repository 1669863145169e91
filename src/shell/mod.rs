use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::compose;
use crate::deploy::DeployOutcome;
use crate::errors::SiteResult;
use crate::wire::{DeployRequest, SiteArtifact};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Html,
    Css,
    Js,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Tab::Html => "html",
            Tab::Css => "css",
            Tab::Js => "js",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tab {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Tab::Html),
            "css" => Ok(Tab::Css),
            "js" | "javascript" => Ok(Tab::Js),
            other => Err(ShellError::UnknownTab(other.to_string())),
        }
    }
}

/// Lifecycle of one user action: idle → in-flight → done | failed, and back to
/// in-flight on the next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionState {
    Idle,
    InFlight,
    Done,
    Failed(String),
}

impl ActionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ActionState::InFlight)
    }

    fn begin(&mut self, action: &'static str) -> Result<(), ShellError> {
        if self.is_busy() {
            return Err(ShellError::Busy(action));
        }
        *self = ActionState::InFlight;
        Ok(())
    }

    fn settle(&mut self, failure: Option<String>) {
        *self = match failure {
            None => ActionState::Done,
            Some(reason) => ActionState::Failed(reason),
        };
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShellError {
    #[error("{0} already in progress")]
    Busy(&'static str),
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("unknown tab {0:?} (expected html, css or js)")]
    UnknownTab(String),
}

/// Everything the user sees: prompt, the three code fields, the active tab,
/// the composed preview and the state of both actions.
#[derive(Debug, Clone)]
pub struct Workspace {
    prompt: String,
    artifact: SiteArtifact,
    active_tab: Tab,
    preview: String,
    generating: ActionState,
    deploying: ActionState,
    generation_error: Option<String>,
    deploy_url: Option<String>,
    deploy_error: Option<String>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::with_artifact(placeholder())
    }
}

impl Workspace {
    pub fn with_artifact(artifact: SiteArtifact) -> Self {
        let preview = compose::compose(&artifact);
        Self {
            prompt: String::new(),
            artifact,
            active_tab: Tab::Html,
            preview,
            generating: ActionState::Idle,
            deploying: ActionState::Idle,
            generation_error: None,
            deploy_url: None,
            deploy_error: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn artifact(&self) -> &SiteArtifact {
        &self.artifact
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn generating(&self) -> &ActionState {
        &self.generating
    }

    pub fn deploying(&self) -> &ActionState {
        &self.deploying
    }

    pub fn generation_error(&self) -> Option<&str> {
        self.generation_error.as_deref()
    }

    pub fn deploy_url(&self) -> Option<&str> {
        self.deploy_url.as_deref()
    }

    pub fn deploy_error(&self) -> Option<&str> {
        self.deploy_error.as_deref()
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    /// View-state only; the code fields are untouched.
    pub fn switch_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn code(&self, tab: Tab) -> &str {
        match tab {
            Tab::Html => &self.artifact.html,
            Tab::Css => &self.artifact.css,
            Tab::Js => &self.artifact.js,
        }
    }

    /// Replace one field and re-compose the preview right away.
    pub fn edit(&mut self, tab: Tab, text: impl Into<String>) {
        let text = text.into();
        match tab {
            Tab::Html => self.artifact.html = text,
            Tab::Css => self.artifact.css = text,
            Tab::Js => self.artifact.js = text,
        }
        self.generation_error = None;
        self.recompose();
    }

    /// Returns the prompt to send. Blank prompts and double starts are refused.
    pub fn begin_generate(&mut self) -> Result<String, ShellError> {
        if self.prompt.trim().is_empty() {
            return Err(ShellError::EmptyPrompt);
        }
        self.generating.begin("generation")?;
        Ok(self.prompt.clone())
    }

    pub fn finish_generate(&mut self, result: SiteResult<SiteArtifact>) {
        match result {
            Ok(artifact) => {
                self.artifact = artifact;
                self.active_tab = Tab::Html;
                self.generation_error = None;
                self.generating.settle(None);
                self.recompose();
            }
            Err(e) => {
                let msg = e.to_string();
                self.preview = compose::compose(&compose::error_panel(&msg));
                self.generation_error = Some(msg.clone());
                self.generating.settle(Some(msg));
            }
        }
    }

    /// Returns the file bundle to deploy for the current fields.
    pub fn begin_deploy(&mut self) -> Result<DeployRequest, ShellError> {
        self.deploying.begin("deploy")?;
        self.deploy_error = None;
        Ok(DeployRequest::from_artifact(&self.artifact))
    }

    /// Deploy failures are kept apart from generation failures and never
    /// replace the preview.
    pub fn finish_deploy(&mut self, result: SiteResult<DeployOutcome>) {
        match result {
            Ok(outcome) => {
                self.deploy_url = Some(outcome.url);
                self.deploying.settle(None);
            }
            Err(e) => {
                let msg = match e.details() {
                    d if d.trim().is_empty() => e.to_string(),
                    d => format!("{e}\n{}", d.trim()),
                };
                self.deploy_error = Some(msg.clone());
                self.deploying.settle(Some(msg));
            }
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.deploy_url = None;
        self.deploy_error = None;
    }

    fn recompose(&mut self) {
        self.preview = compose::compose(&self.artifact);
    }
}

fn placeholder() -> SiteArtifact {
    SiteArtifact {
        html: "<main class=\"hero\"><h1>Describe a website</h1><p>Your generated site will appear here.</p></main>"
            .into(),
        css: "body{margin:0;font-family:system-ui,sans-serif;background:#0f172a;color:#e2e8f0}.hero{min-height:100vh;display:grid;place-content:center;text-align:center}"
            .into(),
        js: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SiteError;

    fn coffee() -> SiteArtifact {
        SiteArtifact { html: "<h1>Brew</h1>".into(), css: "h1{color:brown}".into(), js: "".into() }
    }

    #[test]
    fn blank_prompt_is_refused() {
        let mut ws = Workspace::default();
        ws.set_prompt("   ");
        assert_eq!(ws.begin_generate(), Err(ShellError::EmptyPrompt));
        assert_eq!(ws.generating(), &ActionState::Idle);
    }

    #[test]
    fn second_generate_while_in_flight_is_refused() {
        let mut ws = Workspace::default();
        ws.set_prompt("a landing page for a coffee shop");
        assert_eq!(ws.begin_generate().unwrap(), "a landing page for a coffee shop");
        assert_eq!(ws.begin_generate(), Err(ShellError::Busy("generation")));
        // Deploy is gated independently.
        assert!(ws.begin_deploy().is_ok());
        ws.finish_generate(Ok(coffee()));
        assert_eq!(ws.generating(), &ActionState::Done);
        assert_eq!(ws.artifact(), &coffee());
        assert!(ws.preview().contains("<h1>Brew</h1>"));
        assert!(ws.begin_generate().is_ok());
    }

    #[test]
    fn generation_failure_shows_error_panel() {
        let mut ws = Workspace::with_artifact(coffee());
        ws.set_prompt("x");
        ws.begin_generate().unwrap();
        ws.finish_generate(Err(SiteError::MalformedOutput { raw: "nope".into() }));
        assert!(matches!(ws.generating(), ActionState::Failed(_)));
        assert!(ws.preview().contains("An error occurred"));
        assert_eq!(ws.artifact(), &coffee());
        // The next edit brings the real preview back.
        ws.edit(Tab::Js, "console.log(1)");
        assert!(ws.preview().contains("<script>console.log(1)</script>"));
        assert_eq!(ws.generation_error(), None);
    }

    #[test]
    fn tab_switch_leaves_code_alone() {
        let mut ws = Workspace::with_artifact(coffee());
        let before = ws.preview().to_string();
        ws.switch_tab(Tab::Css);
        assert_eq!(ws.active_tab(), Tab::Css);
        assert_eq!(ws.code(ws.active_tab()), "h1{color:brown}");
        assert_eq!(ws.preview(), before);
    }

    #[test]
    fn edits_recompose_immediately() {
        let mut ws = Workspace::with_artifact(coffee());
        ws.edit(Tab::Css, "h1{color:red}");
        assert_eq!(compose::extract(ws.preview()).unwrap().css, "h1{color:red}");
    }

    #[test]
    fn deploy_error_is_kept_apart() {
        let mut ws = Workspace::with_artifact(coffee());
        let req = ws.begin_deploy().unwrap();
        assert_eq!(req.files.len(), 3);
        let preview = ws.preview().to_string();
        ws.finish_deploy(Err(SiteError::DeployFailed { status: "exit status: 1".into(), stderr: "auth error".into() }));
        assert!(ws.deploy_error().unwrap().contains("auth error"));
        assert_eq!(ws.generation_error(), None);
        assert_eq!(ws.preview(), preview);

        ws.begin_deploy().unwrap();
        ws.finish_deploy(Ok(DeployOutcome {
            url: "https://example-site.netlify.app".into(),
            stdout: String::new(),
            duration_ms: 1,
        }));
        assert_eq!(ws.deploy_url(), Some("https://example-site.netlify.app"));
        assert_eq!(ws.deploy_error(), None);
        ws.dismiss_notice();
        assert_eq!(ws.deploy_url(), None);
    }

    #[test]
    fn tab_names_parse() {
        assert_eq!("CSS".parse::<Tab>().unwrap(), Tab::Css);
        assert_eq!("javascript".parse::<Tab>().unwrap(), Tab::Js);
        assert!("md".parse::<Tab>().is_err());
    }
}
