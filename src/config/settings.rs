//! Raw settings file shape.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::TargetProvider;

/// Top-level settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(alias = "sourceJira")]
    pub source: SourceSettings,

    #[serde(alias = "targetJira")]
    pub target: TargetSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Source instance section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSettings {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Target instance section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSettings {
    #[serde(default)]
    pub provider: TargetProvider,
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub project_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_key_custom_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_key_start: Option<RangeBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_key_end: Option<RangeBound>,
}

/// A key range bound, written either as a number or as a key string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeBound {
    Number(i64),
    Text(String),
}

impl Settings {
    /// Override secrets and paths from the environment.
    ///
    /// Takes a lookup function so tests don't have to touch the process
    /// environment. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(password) = get("ATTMIG_SOURCE_PASSWORD") {
            self.source.password = password;
        }
        if let Some(token) = get("ATTMIG_SOURCE_TOKEN") {
            self.source.token = Some(token);
        }
        if let Some(password) = get("ATTMIG_TARGET_PASSWORD") {
            self.target.password = password;
        }
        if let Some(token) = get("ATTMIG_TARGET_TOKEN") {
            self.target.token = Some(token);
        }
        if let Some(dir) = get("ATTMIG_STAGING_DIR") {
            self.staging_dir = Some(PathBuf::from(dir));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn minimal() -> Settings {
        serde_json::from_str(
            r#"{
                "source": { "url": "https://a", "user": "u", "password": "file-pw" },
                "target": { "url": "https://b", "projectKey": "P" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = minimal();
        assert_eq!(settings.target.provider, TargetProvider::Jira);
        assert!(settings.target.issue_key_start.is_none());
        assert!(settings.staging_dir.is_none());
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("ATTMIG_SOURCE_PASSWORD", "env-pw"),
            ("ATTMIG_TARGET_TOKEN", "tok"),
            ("ATTMIG_STAGING_DIR", "/tmp/stage"),
            ("ATTMIG_SOURCE_TOKEN", ""),
        ]
        .into_iter()
        .collect();

        let mut settings = minimal();
        settings.apply_env_overrides(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(settings.source.password, "env-pw");
        assert_eq!(settings.source.token, None);
        assert_eq!(settings.target.token.as_deref(), Some("tok"));
        assert_eq!(settings.staging_dir, Some(PathBuf::from("/tmp/stage")));
    }

    #[test]
    fn test_range_bound_accepts_number_or_text() {
        let n: RangeBound = serde_json::from_str("42").unwrap();
        assert_eq!(n, RangeBound::Number(42));
        let t: RangeBound = serde_json::from_str("\"PROJ-42\"").unwrap();
        assert_eq!(t, RangeBound::Text("PROJ-42".into()));
    }
}
