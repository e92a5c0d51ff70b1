//! Validate command implementation.
//!
//! Loads the settings and, unless `--offline`, checks both sets of
//! credentials against their instances.

use crate::config::{MigrationConfig, load_config, resolve_settings_path};
use crate::error::{Error, Result};
use crate::source::{JiraSource, SourceApi};
use crate::target::{TargetApi, TargetClient};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Serialize)]
struct ValidateOutput<'a> {
    settings: String,
    source: &'a str,
    target: &'a str,
    provider: &'a str,
    project: &'a str,
    key_field: Option<&'a str>,
    key_range: Option<(i64, i64)>,
    staging_dir: String,
    credentials_checked: bool,
}

/// Both clients, built from one configuration.
pub struct Connections {
    pub source: JiraSource,
    pub target: TargetClient,
}

impl Connections {
    pub fn new(config: &MigrationConfig) -> Result<Self> {
        Ok(Self {
            source: JiraSource::new(&config.source, config.request_timeout)?,
            target: TargetClient::from_config(&config.target, config.request_timeout)?,
        })
    }

    /// Check the credentials on both sides. A rejection is an
    /// [`Error::AuthFailure`] naming the side.
    pub async fn verify(&self) -> Result<()> {
        if !self.source.validate().await? {
            return Err(Error::AuthFailure {
                system: "source".into(),
            });
        }
        info!("Source credentials accepted");

        if !self.target.validate().await? {
            return Err(Error::AuthFailure {
                system: "target".into(),
            });
        }
        info!(provider = self.target.name(), "Target credentials accepted");
        Ok(())
    }
}

/// Execute the validate command.
pub fn execute(config_path: Option<&PathBuf>, offline: bool, json: bool) -> Result<()> {
    let path = resolve_settings_path(config_path.map(PathBuf::as_path));
    let config = load_config(&path)?;

    if !offline {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
        rt.block_on(async { Connections::new(&config)?.verify().await })?;
    }

    let output = ValidateOutput {
        settings: path.display().to_string(),
        source: &config.source.base_url,
        target: &config.target.base_url,
        provider: config.target.provider.as_str(),
        project: &config.target.project_key,
        key_field: config.target.external_key_field.as_deref(),
        key_range: config.target.key_range.map(|r| (r.start, r.end)),
        staging_dir: config.staging_dir.display().to_string(),
        credentials_checked: !offline,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_human(&output);
    }
    Ok(())
}

fn print_human(output: &ValidateOutput<'_>) {
    use colored::Colorize;

    println!("{} {}", "✓".green(), output.settings.bold());
    println!("  Source:   {}", output.source);
    println!("  Target:   {} ({})", output.target, output.provider);
    println!("  Project:  {}", output.project);
    if let Some(field) = output.key_field {
        println!("  Key field: {field}");
    }
    if let Some((start, end)) = output.key_range {
        println!("  Range:    {}..={}", fmt_bound(start), fmt_bound(end));
    }
    println!("  Staging:  {}", output.staging_dir);
    if output.credentials_checked {
        println!("  Credentials: {}", "ok".green());
    } else {
        println!("  Credentials: {}", "not checked (--offline)".dimmed());
    }
}

fn fmt_bound(value: i64) -> String {
    if value == i64::MIN || value == i64::MAX {
        "*".to_string()
    } else {
        value.to_string()
    }
}
