use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use fs_err as fs;
use std::path::Path;

use vibe_sitegen::cli::{Args, Command};
use vibe_sitegen::config::Config;
use vibe_sitegen::deploy::DeployGateway;
use vibe_sitegen::errors::SiteError;
use vibe_sitegen::generate::SiteGenerator;
use vibe_sitegen::wire::DeployRequest;
use vibe_sitegen::{log, safety, server, ux};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = Config::load(args.config.as_deref(), |cfg| {
        if let Some(p) = args.provider {
            cfg.llm.provider = p;
        }
        if let Some(m) = &args.model {
            cfg.llm.model = m.clone();
        }
        if let Some(t) = args.timeout_secs {
            cfg.llm.timeout_secs = t;
        }
        if args.save_transcripts {
            cfg.log.save_transcripts = true;
        }
        match &args.command {
            Command::Serve { bind: Some(b) } => cfg.server.bind = b.clone(),
            Command::Deploy { site: Some(s), .. } => cfg.deploy.site_id = Some(s.clone()),
            _ => {}
        }
    })?;
    log::init(&cfg.log, args.debug)?;

    match args.command {
        Command::Serve { .. } => server::serve(&cfg).await,
        Command::Generate { prompt, out } => generate_once(&cfg, &prompt, &out).await,
        Command::Deploy { dir, check, .. } => {
            if check {
                return check_deploy_tool(&cfg);
            }
            let dir = dir.context("--dir is required unless --check is given")?;
            deploy_dir(&cfg, &dir).await
        }
        Command::Studio { preview, progress } => {
            let generator = SiteGenerator::from_config(&cfg)?;
            let deployer = match DeployGateway::from_config(&cfg.deploy) {
                Ok(gw) => Some(gw),
                Err(e) => {
                    tracing::warn!("deploy disabled: {e}");
                    None
                }
            };
            ux::studio(generator, deployer, &preview, progress).await
        }
    }
}

async fn generate_once(cfg: &Config, prompt: &str, out: &Path) -> Result<()> {
    if prompt.trim().is_empty() {
        bail!("prompt is empty");
    }
    let generator = SiteGenerator::from_config(cfg)?;
    let artifact = match generator.generate(prompt).await {
        Ok(a) => a,
        Err(SiteError::MalformedOutput { raw }) => {
            eprintln!("{}\n{}", "Model output was not a valid site:".red().bold(), raw);
            bail!("invalid LLM output");
        }
        Err(e) => return Err(e.into()),
    };

    fs::create_dir_all(out)?;
    let bundle = DeployRequest::from_artifact(&artifact);
    for (name, content) in &bundle.files {
        fs::write(out.join(name), content)?;
    }
    println!("{} {}", "Site written to".green().bold(), out.display());
    Ok(())
}

fn check_deploy_tool(cfg: &Config) -> Result<()> {
    let gw = DeployGateway::from_config(&cfg.deploy)?;
    let program = gw.program().unwrap_or_default();
    if safety::program_is_available(&program) {
        println!("{} {} found on PATH (site {})", "ok:".green().bold(), program, gw.site_id());
        Ok(())
    } else {
        bail!("{program} not found on PATH")
    }
}

async fn deploy_dir(cfg: &Config, dir: &Path) -> Result<()> {
    let mut req = DeployRequest::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let content = fs::read_to_string(entry.path())?;
            req.files.insert(name, content);
        }
    }

    let gw = DeployGateway::from_config(&cfg.deploy)?;
    match gw.deploy(&req).await {
        Ok(outcome) => {
            println!("{} {}", "Deployed:".green().bold(), outcome.url);
            Ok(())
        }
        Err(e) => {
            let details = e.details();
            if !details.trim().is_empty() {
                eprintln!("{}\n{}", format!("{} ({}):", "Deploy error".red().bold(), e.kind()), details.trim());
            }
            Err(e.into())
        }
    }
}
