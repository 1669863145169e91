use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::errors::{SiteError, SiteResult};

#[derive(Debug, Clone)]
pub struct CmdResult {
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u128,
}

impl CmdResult {
    pub fn status_label(&self) -> String {
        match self.status {
            Some(code) => format!("exit status: {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Split a command template the way a POSIX shell would, then fill
/// `{name}` placeholders inside each token. Substituting after the split keeps
/// values containing spaces in a single argument.
pub fn build_argv(template: &str, vars: &[(&str, &str)]) -> SiteResult<Vec<String>> {
    let tokens = shlex::split(template)
        .ok_or_else(|| SiteError::Config(format!("unbalanced quotes in command: {template}")))?;
    if tokens.is_empty() {
        return Err(SiteError::Config("empty command".into()));
    }
    Ok(tokens
        .into_iter()
        .map(|t| {
            vars.iter()
                .fold(t, |acc, (name, value)| acc.replace(&format!("{{{name}}}"), value))
        })
        .collect())
}

/// Run `argv` to completion and capture both streams. Spawn failures and an
/// elapsed `timeout` are IO errors; a non-zero exit is not.
pub async fn run(argv: &[String], timeout: Option<Duration>) -> io::Result<CmdResult> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

    let mut c = Command::new(program);
    c.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(command = %argv.join(" "), "spawning");
    let started = Instant::now();
    let out = match timeout {
        Some(limit) => tokio::time::timeout(limit, c.output()).await.map_err(|_| {
            io::Error::new(io::ErrorKind::TimedOut, format!("command timed out after {}s", limit.as_secs()))
        })??,
        None => c.output().await?,
    };

    Ok(CmdResult {
        status: out.status.code(),
        success: out.status.success(),
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        duration_ms: started.elapsed().as_millis(),
    })
}
