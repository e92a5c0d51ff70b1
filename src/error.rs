//! Error types for the attachment migrator.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=auth, 3=remote query, 4=upload, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Every fatal condition carries the record key and the operation that
//! failed. Nothing here prints; rendering happens once in `main`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for migrator operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Auth (exit 2)
    AuthFailure,

    // Remote query (exit 3)
    RemoteQueryError,

    // Upload (exit 4)
    UploadError,

    // Key parse (exit 5)
    KeyParseError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Transport (exit 10)
    TransportError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::AuthFailure => "AUTH_FAILURE",
            Self::RemoteQueryError => "REMOTE_QUERY_ERROR",
            Self::UploadError => "UPLOAD_ERROR",
            Self::KeyParseError => "KEY_PARSE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::AuthFailure => 2,
            Self::RemoteQueryError => 3,
            Self::UploadError => 4,
            Self::KeyParseError => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::TransportError => 10,
        }
    }

    /// Whether simply re-running the migration may succeed.
    ///
    /// Remote and transport failures are often transient, and the staging
    /// directory keeps already-downloaded attachments between runs. Key
    /// parse and config errors need an operator fix first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteQueryError | Self::UploadError | Self::TransportError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur while migrating attachments.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not authenticate against the {system} instance")]
    AuthFailure { system: String },

    #[error("Remote query failed: {operation} for {key} returned HTTP {status}")]
    RemoteQuery {
        operation: String,
        key: String,
        status: u16,
        body: String,
    },

    #[error("Upload failed: {file} to record {record} returned HTTP {status}")]
    Upload {
        record: String,
        file: String,
        status: u16,
        body: String,
    },

    #[error("Cannot parse a numeric key from '{key}'")]
    KeyParse { key: String },

    #[error("Settings file not found: {path}")]
    SettingsNotFound { path: PathBuf },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a remote query error from a failed response.
    pub(crate) fn remote_query(
        operation: impl Into<String>,
        key: impl Into<String>,
        status: reqwest::StatusCode,
        body: String,
    ) -> Self {
        Self::RemoteQuery {
            operation: operation.into(),
            key: key.into(),
            status: status.as_u16(),
            body,
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::AuthFailure { .. } => ErrorCode::AuthFailure,
            Self::RemoteQuery { .. } => ErrorCode::RemoteQueryError,
            Self::Upload { .. } => ErrorCode::UploadError,
            Self::KeyParse { .. } => ErrorCode::KeyParseError,
            Self::SettingsNotFound { .. } | Self::Config(_) => ErrorCode::ConfigError,
            Self::Http(_) => ErrorCode::TransportError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Response body returned by the remote side, if any.
    #[must_use]
    pub fn remote_body(&self) -> Option<&str> {
        match self {
            Self::RemoteQuery { body, .. } | Self::Upload { body, .. } if !body.is_empty() => {
                Some(body.as_str())
            }
            _ => None,
        }
    }

    /// Context-aware recovery hint for operators.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::AuthFailure { system } => Some(format!(
                "Check the {system} url, user and password (or token) in the settings file."
            )),

            Self::RemoteQuery { key, .. } => Some(format!(
                "Make sure '{key}' exists and is visible to the configured user, then re-run. \
                 Attachments already staged are reused."
            )),

            Self::Upload { record, .. } => Some(format!(
                "Nothing after '{record}' was processed. Re-run to resume; files already \
                 attached to the target are skipped."
            )),

            Self::KeyParse { key } => Some(format!(
                "'{key}' has no numeric part. Check issueKeyCustomField and the \
                 issueKeyStart/issueKeyEnd settings."
            )),

            Self::SettingsNotFound { path } => Some(format!(
                "Create {} or pass --config <path>.",
                path.display()
            )),

            Self::Http(_) | Self::Io(_) | Self::Json(_) | Self::Config(_) | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }
        if let Some(body) = self.remote_body() {
            obj["error"]["response"] = serde_json::Value::String(body.to_string());
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        let auth = Error::AuthFailure { system: "source".into() };
        assert_eq!(auth.exit_code(), 2);

        let key = Error::KeyParse { key: "XYZ".into() };
        assert_eq!(key.exit_code(), 5);
        assert!(!key.error_code().is_retryable());

        let upload = Error::Upload {
            record: "TC-1".into(),
            file: "a.png".into(),
            status: 500,
            body: String::new(),
        };
        assert_eq!(upload.exit_code(), 4);
        assert!(upload.error_code().is_retryable());
    }

    #[test]
    fn test_structured_json_includes_hint_and_body() {
        let err = Error::RemoteQuery {
            operation: "list attachments".into(),
            key: "PROJ-7".into(),
            status: 404,
            body: "{\"errorMessages\":[\"Issue does not exist\"]}".into(),
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "REMOTE_QUERY_ERROR");
        assert_eq!(json["error"]["exit_code"], 3);
        assert!(json["error"]["hint"].as_str().unwrap().contains("PROJ-7"));
        assert!(json["error"]["response"].as_str().unwrap().contains("does not exist"));
    }

    #[test]
    fn test_message_names_record_and_operation() {
        let err = Error::RemoteQuery {
            operation: "list attachments".into(),
            key: "PROJ-7".into(),
            status: 500,
            body: String::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("list attachments"));
        assert!(msg.contains("PROJ-7"));
        assert!(err.remote_body().is_none());
    }
}
