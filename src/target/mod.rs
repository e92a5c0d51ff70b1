//! Target record providers.
//!
//! Attachments land either on Jira issues or on TM4J test cases. Both sit
//! behind the same four capabilities:
//!
//! ```text
//!            ┌──────────────┐
//!            │  TargetApi   │  validate / search / existing / upload
//!            └──────┬───────┘
//!                   │
//!            ┌──────┴───────┐
//!            │ TargetClient │  ← picked from `target.provider`
//!            └──────┬───────┘
//!              ┌────┴────┐
//!              ▼         ▼
//!          ┌──────┐  ┌──────┐
//!          │ Jira │  │ TM4J │
//!          └──────┘  └──────┘
//!         200 per     201 per
//!         file, XSRF  file
//!         header
//! ```

pub mod cursor;
pub mod jira;
pub mod tm4j;

pub use cursor::{CursorState, PAGE_SIZE, RecordCursor};
pub use jira::JiraTarget;
pub use tm4j::Tm4jTarget;

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::config::{TargetConfig, TargetProvider};
use crate::error::{Error, Result};
use crate::http::error_body;
use crate::model::{StagedFile, TargetRecord};

/// Trait for target instances.
pub trait TargetApi: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Check that the credentials are accepted.
    fn validate(&self) -> impl Future<Output = Result<bool>> + Send;

    /// Fetch one page of records. `page` is zero-based.
    ///
    /// A page shorter than `page_size` is the last one. "No matching
    /// records" answers come back as an empty page, not an error.
    fn search(
        &self,
        page: usize,
        page_size: usize,
    ) -> impl Future<Output = Result<Vec<TargetRecord>>> + Send;

    /// Filenames already attached to the record.
    fn list_existing_attachments(
        &self,
        record_key: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Upload staged files to the record. Any rejection is an error.
    fn upload(
        &self,
        record_key: &str,
        files: &[StagedFile],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The closed set of supported target providers.
pub enum TargetClient {
    Jira(JiraTarget),
    Tm4j(Tm4jTarget),
}

impl TargetClient {
    /// Build the client selected by the configuration.
    pub fn from_config(config: &TargetConfig, timeout: Duration) -> Result<Self> {
        Ok(match config.provider {
            TargetProvider::Jira => Self::Jira(JiraTarget::new(config, timeout)?),
            TargetProvider::Tm4j => Self::Tm4j(Tm4jTarget::new(config, timeout)?),
        })
    }
}

impl TargetApi for TargetClient {
    fn name(&self) -> &'static str {
        match self {
            Self::Jira(t) => t.name(),
            Self::Tm4j(t) => t.name(),
        }
    }

    async fn validate(&self) -> Result<bool> {
        match self {
            Self::Jira(t) => t.validate().await,
            Self::Tm4j(t) => t.validate().await,
        }
    }

    async fn search(&self, page: usize, page_size: usize) -> Result<Vec<TargetRecord>> {
        match self {
            Self::Jira(t) => t.search(page, page_size).await,
            Self::Tm4j(t) => t.search(page, page_size).await,
        }
    }

    async fn list_existing_attachments(&self, record_key: &str) -> Result<Vec<String>> {
        match self {
            Self::Jira(t) => t.list_existing_attachments(record_key).await,
            Self::Tm4j(t) => t.list_existing_attachments(record_key).await,
        }
    }

    async fn upload(&self, record_key: &str, files: &[StagedFile]) -> Result<()> {
        match self {
            Self::Jira(t) => t.upload(record_key, files).await,
            Self::Tm4j(t) => t.upload(record_key, files).await,
        }
    }
}

/// Build a multipart `file` part streaming a staged file from disk.
pub(crate) async fn file_part(file: &StagedFile) -> Result<Part> {
    let handle = tokio::fs::File::open(&file.path).await?;
    let len = handle.metadata().await?.len();
    let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
    Ok(Part::stream_with_length(body, len).file_name(file.name.clone()))
}

/// Post each file in its own multipart request, stopping at the first one
/// whose status `accepted` rejects.
pub(crate) async fn upload_each<F>(
    record_key: &str,
    files: &[StagedFile],
    accepted: fn(StatusCode) -> bool,
    request: F,
) -> Result<()>
where
    F: Fn() -> reqwest::RequestBuilder + Send + Sync,
{
    for file in files {
        let form = Form::new().part("file", file_part(file).await?);
        let response = request().multipart(form).send().await?;

        let status = response.status();
        if !accepted(status) {
            let body = error_body(response).await;
            return Err(Error::Upload {
                record: record_key.to_string(),
                file: file.name.clone(),
                status: status.as_u16(),
                body,
            });
        }
        debug!(record = record_key, file = %file.name, "Uploaded attachment");
    }
    Ok(())
}
