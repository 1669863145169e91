use anyhow::Result;
use colored::Colorize;
use fs_err as fs;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use crate::deploy::DeployGateway;
use crate::generate::SiteGenerator;
use crate::shell::{ActionState, Tab, Workspace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioCommand {
    Generate(String),
    Tab(Tab),
    Show(Option<Tab>),
    Edit(Option<Tab>),
    Preview,
    Deploy,
    Status,
    Dismiss,
    Help,
    Quit,
    Nothing,
    Unknown(String),
}

/// Plain text is a prompt; `:word [arg]` is a command.
pub fn parse_command(line: &str) -> StudioCommand {
    let line = line.trim();
    if line.is_empty() {
        return StudioCommand::Nothing;
    }
    let Some(cmd) = line.strip_prefix(':') else {
        return StudioCommand::Generate(line.to_string());
    };
    let (word, arg) = match cmd.split_once(char::is_whitespace) {
        Some((w, a)) => (w, Some(a.trim())),
        None => (cmd, None),
    };
    let tab_arg = |a: Option<&str>| a.and_then(|s| s.parse::<Tab>().ok());
    match word {
        "tab" => match tab_arg(arg) {
            Some(t) => StudioCommand::Tab(t),
            None => StudioCommand::Unknown(line.to_string()),
        },
        "show" => StudioCommand::Show(tab_arg(arg)),
        "edit" => StudioCommand::Edit(tab_arg(arg)),
        "preview" => StudioCommand::Preview,
        "deploy" => StudioCommand::Deploy,
        "status" => StudioCommand::Status,
        "dismiss" => StudioCommand::Dismiss,
        "help" | "h" | "?" => StudioCommand::Help,
        "quit" | "q" | "exit" => StudioCommand::Quit,
        _ => StudioCommand::Unknown(line.to_string()),
    }
}

pub async fn studio(
    generator: SiteGenerator,
    deployer: Option<DeployGateway>,
    preview_path: &Path,
    progress: bool,
) -> Result<()> {
    let mut ws = Workspace::default();
    write_preview(&ws, preview_path)?;
    println!("{}", "vibe_sitegen studio".bold());
    println!("Preview file: {}  (open it in a browser; it is rewritten after every change)", preview_path.display());
    print_help();

    let stdin = io::stdin();
    loop {
        print!("{} ", format!("[{}]>", ws.active_tab()).cyan().bold());
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_command(&line) {
            StudioCommand::Nothing => {}
            StudioCommand::Generate(prompt) => {
                ws.set_prompt(prompt);
                let prompt = match ws.begin_generate() {
                    Ok(p) => p,
                    Err(e) => {
                        println!("{}", e.to_string().yellow());
                        continue;
                    }
                };
                let bar = progress.then(|| spinner("Generating site..."));
                let result = generator.generate(&prompt).await;
                if let Some(b) = bar {
                    b.finish_and_clear();
                }
                ws.finish_generate(result);
                write_preview(&ws, preview_path)?;
                show_status(&ws);
            }
            StudioCommand::Tab(t) => {
                ws.switch_tab(t);
                show_code(&ws, t);
            }
            StudioCommand::Show(t) => show_code(&ws, t.unwrap_or(ws.active_tab())),
            StudioCommand::Edit(t) => {
                let tab = t.unwrap_or(ws.active_tab());
                println!("Enter new {} (finish with a line containing only '.'):", tab.to_string().bold());
                let text = read_block(&mut stdin.lock())?;
                ws.edit(tab, text);
                write_preview(&ws, preview_path)?;
                println!("{} updated, preview refreshed.", tab);
            }
            StudioCommand::Preview => {
                write_preview(&ws, preview_path)?;
                println!("Preview written to {}", preview_path.display());
            }
            StudioCommand::Deploy => {
                let Some(gw) = &deployer else {
                    println!("{}", "Deploy is not configured (set NETLIFY_SITE_ID or deploy.site_id).".yellow());
                    continue;
                };
                if !confirm(&format!("Deploy the current site to {}?", gw.site_id())) {
                    println!("Deploy cancelled.");
                    continue;
                }
                let req = match ws.begin_deploy() {
                    Ok(r) => r,
                    Err(e) => {
                        println!("{}", e.to_string().yellow());
                        continue;
                    }
                };
                let bar = progress.then(|| spinner("Deploying..."));
                let result = gw.deploy(&req).await;
                if let Some(b) = bar {
                    b.finish_and_clear();
                }
                ws.finish_deploy(result);
                show_status(&ws);
            }
            StudioCommand::Status => show_status(&ws),
            StudioCommand::Dismiss => ws.dismiss_notice(),
            StudioCommand::Help => print_help(),
            StudioCommand::Quit => break,
            StudioCommand::Unknown(s) => println!("Unknown command: {s} (try :help)"),
        }
    }
    Ok(())
}

pub fn show_status(ws: &Workspace) {
    println!(
        "  {}: {}   {}: {}",
        "Generate".bold(),
        state_label(ws.generating()),
        "Deploy".bold(),
        state_label(ws.deploying())
    );
    let a = ws.artifact();
    println!("  html {}B   css {}B   js {}B", a.html.len(), a.css.len(), a.js.len());
    if let Some(e) = ws.generation_error() {
        println!("{}\n{}", "Generation error:".red().bold(), indent(e, 2));
    }
    if let Some(url) = ws.deploy_url() {
        println!("{} {}", "Live at".green().bold(), url.underline());
    }
    if let Some(e) = ws.deploy_error() {
        println!("{}\n{}", "Deploy error:".red().bold(), indent(e, 2));
    }
}

pub fn show_code(ws: &Workspace, tab: Tab) {
    println!("{}", format!("--- {} ---", tab).bold());
    let code = ws.code(tab);
    if code.is_empty() {
        println!("(empty)");
    } else {
        println!("{}", code);
    }
}

pub fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        let ans = s.trim().to_lowercase();
        ans == "y" || ans == "yes"
    } else {
        false
    }
}

pub fn write_preview(ws: &Workspace, path: &Path) -> Result<()> {
    fs::write(path, ws.preview())?;
    Ok(())
}

/// Lines up to a lone `.` (or end of input), joined with `\n`.
fn read_block(input: &mut impl BufRead) -> io::Result<String> {
    let mut lines = Vec::new();
    for line in input.lines() {
        let line = line?;
        if line == "." {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

fn spinner(msg: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} {elapsed}") {
        bar.set_style(style);
    }
    bar.set_message(msg);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn state_label(s: &ActionState) -> String {
    match s {
        ActionState::Idle => "idle".dimmed().to_string(),
        ActionState::InFlight => "in flight".yellow().to_string(),
        ActionState::Done => "done".green().to_string(),
        ActionState::Failed(_) => "failed".red().to_string(),
    }
}

fn print_help() {
    println!(
        "Type a prompt to generate a site. Commands: {} {} {} {} {} {} {} {}",
        ":tab html|css|js", ":show [tab]", ":edit [tab]", ":preview", ":deploy", ":status", ":dismiss", ":quit"
    );
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines()
        .map(|l| format!("{}{}", pad, l))
        .collect::<Vec<_>>()
        .join("\n")
}
