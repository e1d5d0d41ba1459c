//! Casevault command line entry point.

mod bridge;
mod commands;
mod config;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "casevault")]
#[command(about = "Upload evidence to a case and check its integrity")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, global = true, env = "CASEVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Evidence API URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash and upload files as evidence of a case
    Upload {
        /// Case identifier
        #[arg(long = "case")]
        case_id: String,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Verify a case manifest's SHA-256 and HMAC on the server
    Verify {
        /// Manifest JSON file
        manifest: PathBuf,
    },
    /// Replay a case's audit log and report hash mismatches
    Replay {
        /// Case identifier
        #[arg(long = "case")]
        case_id: String,
    },
    /// Show the effective configuration
    Config,
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };
    let mut cfg = CliConfig::load_from(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    if let Some(api_url) = cli.api_url {
        cfg.api_url = api_url;
    }
    tracing::debug!(api_url = %cfg.api_url, "configuration loaded");

    match cli.command {
        Commands::Upload { case_id, files } => commands::upload(&cfg, &case_id, &files).await,
        Commands::Verify { manifest } => commands::verify(&cfg, &manifest).await,
        Commands::Replay { case_id } => commands::replay(&cfg, &case_id).await,
        Commands::Config => commands::show_config(&cfg, &path).map(|()| true),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn upload_requires_case_and_files() {
        assert!(Cli::try_parse_from(["casevault", "upload", "a.mp4"]).is_err());
        assert!(Cli::try_parse_from(["casevault", "upload", "--case", "c1"]).is_err());

        let cli =
            Cli::try_parse_from(["casevault", "upload", "--case", "c1", "a.mp4", "b.jpg"]).unwrap();
        match cli.command {
            Commands::Upload { case_id, files } => {
                assert_eq!(case_id, "c1");
                assert_eq!(files.len(), 2);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn global_overrides_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "casevault",
            "replay",
            "--case",
            "c9",
            "--api-url",
            "http://api.local",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://api.local"));
    }
}
