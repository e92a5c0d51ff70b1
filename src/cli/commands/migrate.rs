//! Migrate command implementation.

use crate::cli::commands::validate::Connections;
use crate::config::{MigrationConfig, load_config, resolve_settings_path};
use crate::error::{Error, Result};
use crate::staging::AttachmentStore;
use crate::transfer::{MigrationStats, Migrator};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Serialize)]
struct MigrateOutput<'a> {
    provider: &'a str,
    project: &'a str,
    staging_dir: String,
    elapsed_ms: u128,
    #[serde(flatten)]
    stats: &'a MigrationStats,
}

/// Execute the migrate command.
pub fn execute(config_path: Option<&PathBuf>, keep_staging: bool, json: bool) -> Result<()> {
    let path = resolve_settings_path(config_path.map(PathBuf::as_path));
    let config = load_config(&path)?;
    info!(settings = %path.display(), "Settings loaded");

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    let started = Instant::now();
    let stats = rt.block_on(async { execute_async(&config, keep_staging).await })?;

    let output = MigrateOutput {
        provider: config.target.provider.as_str(),
        project: &config.target.project_key,
        staging_dir: config.staging_dir.display().to_string(),
        elapsed_ms: started.elapsed().as_millis(),
        stats: &stats,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_human(&output);
    }
    Ok(())
}

async fn execute_async(config: &MigrationConfig, keep_staging: bool) -> Result<MigrationStats> {
    let connections = Connections::new(config)?;
    connections.verify().await?;

    let store = AttachmentStore::new(config.staging_dir.clone());
    if keep_staging {
        store.ensure_root().await?;
    } else {
        store.reset().await?;
    }

    Migrator::new(&connections.source, &connections.target, &store)
        .with_key_field(config.target.external_key_field.clone())
        .with_key_range(config.target.key_range)
        .run()
        .await
}

fn print_human(output: &MigrateOutput<'_>) {
    use colored::Colorize;

    let stats = output.stats;

    println!();
    println!(
        "{} {} {}",
        "Migration complete".green().bold(),
        output.provider,
        output.project.bold()
    );
    println!("  Records:     {}", stats.processed);
    println!(
        "  Skipped:     {} without key, {} out of range, {} without attachments",
        stats.skipped_no_key, stats.skipped_out_of_range, stats.without_attachments
    );
    println!(
        "  Staged:      {} records, {} downloaded ({} bytes), {} reused",
        stats.transferred(),
        stats.materialized,
        stats.downloaded_bytes,
        stats.reused_staging
    );
    println!(
        "  Uploaded:    {} files ({} already present)",
        stats.uploaded_files.to_string().green(),
        stats.already_present_files
    );
    println!("  Staging dir: {}", output.staging_dir.dimmed());
    println!("  Elapsed:     {:.1}s", output.elapsed_ms as f64 / 1000.0);
}
