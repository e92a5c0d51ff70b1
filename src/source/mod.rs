//! Source record client.
//!
//! The source instance is read-only from the migrator's point of view: it
//! lists a record's attachments and serves their bytes.
//!
//! [`SourceApi::materialize`] is built on top of the two primitives and
//! owns the staging idempotency contract:
//! - an existing staging entry means "already fetched", no request is made
//! - a failure while streaming removes the entry so a rerun retries it

pub mod jira;

pub use jira::JiraSource;

use std::future::Future;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::AttachmentDescriptor;
use crate::staging::AttachmentStore;

/// Result of [`SourceApi::materialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    /// A staging entry already existed; nothing was downloaded.
    AlreadyStaged,
    /// All attachments were streamed to disk.
    Downloaded { files: usize, bytes: u64 },
}

/// Trait for source instances.
pub trait SourceApi: Send + Sync {
    /// Check that the credentials are accepted.
    fn validate(&self) -> impl Future<Output = Result<bool>> + Send;

    /// Fetch attachment metadata for a record.
    fn list_attachments(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Vec<AttachmentDescriptor>>> + Send;

    /// Stream one attachment into `dest`, returning the bytes written.
    fn download(
        &self,
        key: &str,
        attachment: &AttachmentDescriptor,
        dest: &mut File,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Download every attachment of `key` into the staging area.
    ///
    /// All-or-nothing per record: on error the partially written entry is
    /// deleted before the error is returned.
    fn materialize(
        &self,
        store: &AttachmentStore,
        key: &str,
        attachments: &[AttachmentDescriptor],
    ) -> impl Future<Output = Result<Materialized>> + Send {
        async move {
            if store.exists(key).await {
                debug!(key, "Attachments already staged");
                return Ok(Materialized::AlreadyStaged);
            }
            store.create(key).await?;

            let result = async {
                let mut bytes = 0;
                for attachment in attachments {
                    let mut file = store.create_file(key, &attachment.filename).await?;
                    bytes += self.download(key, attachment, &mut file).await?;
                    file.flush().await?;
                    debug!(key, file = %attachment.filename, "Attachment staged");
                }
                Ok::<u64, Error>(bytes)
            }
            .await;

            match result {
                Ok(bytes) => Ok(Materialized::Downloaded {
                    files: attachments.len(),
                    bytes,
                }),
                Err(e) => {
                    if let Err(cleanup) = store.remove(key).await {
                        warn!(key, error = %cleanup, "Could not remove partial staging entry");
                    }
                    Err(e)
                }
            }
        }
    }
}
