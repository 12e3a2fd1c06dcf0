use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sureclick::{load_policy, EnginePolicy};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use crate::cli::{cmd_policy, cmd_probe, OutputFormat, PolicyArgs, ProbeArgs};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Policy file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Output format
    #[arg(short, long, default_value = "human")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective engine policy
    Policy(PolicyArgs),

    /// Resolve locators against a live page, optionally clicking
    Probe(ProbeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        built = env!("BUILD_DATE"),
        "sureclick starting"
    );

    let policy = load_engine_policy(cli.config.as_ref())?;

    let result = match cli.command {
        Commands::Policy(args) => cmd_policy(args, &policy, cli.output),
        Commands::Probe(args) => cmd_probe(args, policy, cli.output).await,
    };

    if let Err(err) = result {
        error!(error = %format!("{err:#}"), "command failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    info!("done");
    Ok(())
}

/// `RUST_LOG` wins over `--log-level`. Logs go to stderr.
fn init_logging(level: &str, debug: bool) -> Result<()> {
    let default_directive = if debug {
        tracing::Level::DEBUG.to_string()
    } else {
        level
            .parse::<tracing::Level>()
            .with_context(|| format!("Invalid log level: {level}"))?
            .to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
    Ok(())
}

/// Explicit `--config`, else `<config dir>/sureclick/policy.yaml` when present.
fn load_engine_policy(config_path: Option<&PathBuf>) -> Result<EnginePolicy> {
    let path = match config_path {
        Some(path) => Some(path.clone()),
        None => dirs::config_dir().map(|mut dir| {
            dir.push("sureclick");
            dir.push("policy.yaml");
            dir
        }),
    };

    if let Some(path) = config_path {
        if !path.exists() {
            anyhow::bail!("Policy file not found: {}", path.display());
        }
    }

    let policy = load_policy(path.as_deref()).context("Failed to load engine policy")?;
    if let Some(path) = path.filter(|p| p.exists()) {
        info!("Loaded policy from: {}", path.display());
    }
    Ok(policy)
}
