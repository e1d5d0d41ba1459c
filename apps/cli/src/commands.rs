//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use casevault_api::Client;
use casevault_notifications::Notifier;
use casevault_protocol::Manifest;
use casevault_transfer::LocalFile;
use casevault_upload::{BatchEvent, UploadBatch};
use tracing::{info, warn};

use crate::bridge::ApiBackend;
use crate::config::CliConfig;
use crate::render::{self, ProgressView};

fn client(config: &CliConfig) -> Result<Client> {
    let client = Client::new(&config.api_url, config.request_timeout())
        .with_context(|| format!("invalid API URL {}", config.api_url))?;
    Ok(client.with_chunk_size(config.chunk_size))
}

/// Uploads `paths` to `case_id`. Returns `false` if any upload failed.
pub async fn upload(config: &CliConfig, case_id: &str, paths: &[PathBuf]) -> Result<bool> {
    let mut files = Vec::with_capacity(paths.len());
    let mut unopened = 0;
    for path in paths {
        match LocalFile::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                eprintln!("skipping {}: {e}", path.display());
                unopened += 1;
            }
        }
    }

    let selected = files.len();
    let notifier = Notifier::new();
    let backend = Arc::new(ApiBackend::new(client(config)?));
    let mut batch = UploadBatch::new(config.batch_config(case_id), backend, notifier.clone());
    let mut events = batch
        .take_events()
        .context("batch event channel already taken")?;

    let ids = batch.admit(files);
    if ids.len() < selected {
        println!(
            "{} file(s) not admitted (accept filter or file limit)",
            selected - ids.len()
        );
    }
    if ids.is_empty() {
        println!("nothing to upload");
        return Ok(false);
    }
    info!(case = %case_id, files = ids.len(), "upload started");

    let mut view = ProgressView::new();
    while let Some(event) = events.recv().await {
        if let Some(line) = view.apply(&event) {
            println!("{line}");
        }
        if matches!(event, BatchEvent::AllTerminal { .. }) {
            break;
        }
    }

    let summary = batch.wait_settled().await;
    print!("{}", render::task_table(&batch.tasks()));
    for line in render::persistent_notices(&notifier.snapshot()) {
        eprintln!("{line}");
    }
    Ok(summary.failed == 0 && unopened == 0)
}

/// Reads and parses a manifest file. Nothing is sent on parse failure.
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(Manifest::parse(&text)?)
}

/// Verifies a manifest. Returns `false` if either check failed.
pub async fn verify(config: &CliConfig, path: &Path) -> Result<bool> {
    let manifest = read_manifest(path)?;
    info!(case = %manifest.case_id, evidence = manifest.evidence.len(), "verifying manifest");
    let result = client(config)?
        .verify_manifest(&manifest)
        .await
        .context("manifest verification failed")?;
    print!("{}", render::verification_report(&result));
    Ok(result.is_valid())
}

/// Replays a case audit. Returns `false` if mismatches were found.
pub async fn replay(config: &CliConfig, case_id: &str) -> Result<bool> {
    let result = client(config)?
        .audit_replay(case_id)
        .await
        .context("audit replay failed")?;
    print!("{}", render::replay_report(&result));
    Ok(result.is_clean())
}

/// Prints the effective configuration as TOML.
pub fn show_config(config: &CliConfig, path: &Path) -> Result<()> {
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
