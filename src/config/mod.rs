//! Configuration management.
//!
//! Settings are read once at startup from a JSON file (default
//! `./settings.json`) and turned into immutable, validated values that the
//! clients borrow for the rest of the run.
//!
//! # File format
//!
//! ```json
//! {
//!   "source": { "url": "https://old-jira", "user": "me", "password": "..." },
//!   "target": {
//!     "provider": "tm4j",
//!     "url": "https://new-jira",
//!     "user": "me",
//!     "password": "...",
//!     "projectKey": "QA",
//!     "issueKeyCustomField": "Original Key",
//!     "issueKeyStart": "PROJ-1",
//!     "issueKeyEnd": "PROJ-500"
//!   },
//!   "stagingDir": "./attachments"
//! }
//! ```
//!
//! The legacy `sourceJira` / `targetJira` section names are accepted too.
//!
//! Environment variables take precedence over the file for secrets and the
//! staging directory:
//! - `ATTMIG_SOURCE_PASSWORD`, `ATTMIG_SOURCE_TOKEN`
//! - `ATTMIG_TARGET_PASSWORD`, `ATTMIG_TARGET_TOKEN`
//! - `ATTMIG_STAGING_DIR`

mod settings;

pub use settings::{RangeBound, Settings, SourceSettings, TargetSettings};

use crate::error::{Error, Result};
use crate::key::parse_key_number;
use crate::model::KeyRange;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Default staging directory, relative to the working directory.
pub const DEFAULT_STAGING_DIR: &str = "./attachments";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Login data for one side of the migration.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Which target API the attachments are pushed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetProvider {
    /// Plain Jira issues (`/rest/api/2`).
    #[default]
    Jira,
    /// TM4J test cases (`/rest/atm/1.0`).
    Tm4j,
}

impl TargetProvider {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Jira => "jira",
            Self::Tm4j => "tm4j",
        }
    }
}

/// Resolved source endpoint.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub credentials: Credentials,
}

/// Resolved target endpoint.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub provider: TargetProvider,
    pub base_url: String,
    pub credentials: Credentials,
    pub project_key: String,

    /// Field holding the source key on each target record.
    pub external_key_field: Option<String>,

    /// `None` when neither bound is configured.
    pub key_range: Option<KeyRange>,
}

/// Everything a migration run needs, validated.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source: SourceConfig,
    pub target: TargetConfig,
    pub staging_dir: PathBuf,
    pub request_timeout: Duration,
}

/// Resolve the settings file path.
///
/// Priority:
/// 1. Explicit `--config` path (or `ATTMIG_CONFIG`, via clap)
/// 2. `./settings.json`
#[must_use]
pub fn resolve_settings_path(explicit_path: Option<&Path>) -> PathBuf {
    explicit_path.map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE), Path::to_path_buf)
}

/// Read and parse the settings file.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::SettingsNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))
}

/// Load, apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<MigrationConfig> {
    let mut settings = load_settings(path)?;
    settings.apply_env_overrides(|name| std::env::var(name).ok());
    resolve(settings)
}

/// Turn raw settings into a validated [`MigrationConfig`].
pub fn resolve(settings: Settings) -> Result<MigrationConfig> {
    let Settings {
        source,
        target,
        staging_dir,
        request_timeout_secs,
    } = settings;

    let source = SourceConfig {
        base_url: normalize_url("source", &source.url)?,
        credentials: Credentials {
            user: source.user,
            password: source.password,
            token: source.token.filter(|t| !t.is_empty()),
        },
    };

    let project_key = target.project_key.trim().to_string();
    if project_key.is_empty() {
        return Err(Error::Config("target.projectKey must not be empty".into()));
    }

    let external_key_field = target
        .issue_key_custom_field
        .filter(|f| !f.trim().is_empty());
    if target.provider == TargetProvider::Tm4j && external_key_field.is_none() {
        return Err(Error::Config(
            "target.issueKeyCustomField is required for the tm4j provider".into(),
        ));
    }

    let key_range = parse_key_range(
        target.issue_key_start.as_ref(),
        target.issue_key_end.as_ref(),
    )?;

    let target = TargetConfig {
        provider: target.provider,
        base_url: normalize_url("target", &target.url)?,
        credentials: Credentials {
            user: target.user,
            password: target.password,
            token: target.token.filter(|t| !t.is_empty()),
        },
        project_key,
        external_key_field,
        key_range,
    };

    Ok(MigrationConfig {
        source,
        target,
        staging_dir: staging_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
        request_timeout: Duration::from_secs(
            request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
    })
}

/// Parse the configured key bounds.
///
/// Missing or empty bounds leave that side open. Text bounds go through the
/// same prefix-stripping parser as record keys, so `"PROJ-150"` means 150.
pub fn parse_key_range(
    start: Option<&RangeBound>,
    end: Option<&RangeBound>,
) -> Result<Option<KeyRange>> {
    let start = start.map(|b| parse_bound("issueKeyStart", b)).transpose()?.flatten();
    let end = end.map(|b| parse_bound("issueKeyEnd", b)).transpose()?.flatten();

    if start.is_none() && end.is_none() {
        return Ok(None);
    }

    let range = KeyRange::new(start.unwrap_or(i64::MIN), end.unwrap_or(i64::MAX));
    if range.start > range.end {
        return Err(Error::Config(format!(
            "issueKeyStart ({}) is greater than issueKeyEnd ({})",
            range.start, range.end
        )));
    }
    Ok(Some(range))
}

fn parse_bound(name: &str, bound: &RangeBound) -> Result<Option<i64>> {
    match bound {
        RangeBound::Number(n) => Ok(Some(*n)),
        RangeBound::Text(s) if s.trim().is_empty() => Ok(None),
        RangeBound::Text(s) => parse_key_number(s)
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} '{s}' does not contain a number"))),
    }
}

fn normalize_url(side: &str, url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config(format!("{side}.url must not be empty")));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(Error::Config(format!(
            "{side}.url must start with http:// or https:// (got '{trimmed}')"
        )));
    }
    Ok(trimmed.to_string())
}
