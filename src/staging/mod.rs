//! Local attachment staging area.
//!
//! Downloaded attachments are kept on disk between download and upload:
//!
//! ```text
//! ./attachments/
//! ├── PROJ-100/
//! │   ├── screenshot.png
//! │   └── trace.log
//! └── PROJ-101/
//! ```
//!
//! The existence of a record's directory is the only signal that its
//! attachments were already fetched; nothing re-validates it against the
//! source. The whole tree is wiped once at the start of a run by
//! [`AttachmentStore::reset`].

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::model::StagedFile;

/// Filesystem-backed staging area keyed by source record key.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete the staging tree and recreate it empty.
    ///
    /// Must run once, before any record is processed.
    pub async fn reset(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Create the staging root if missing, keeping existing entries.
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Directory holding the attachments of `key`.
    #[must_use]
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_filename(key))
    }

    /// Whether attachments for `key` were already materialized.
    pub async fn exists(&self, key: &str) -> bool {
        fs::metadata(self.entry_path(key))
            .await
            .is_ok_and(|m| m.is_dir())
    }

    /// Create the directory for `key`.
    pub async fn create(&self, key: &str) -> Result<()> {
        fs::create_dir_all(self.entry_path(key)).await?;
        Ok(())
    }

    /// Remove the directory for `key` and everything in it.
    pub async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_dir_all(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List the staged files for `key`, sorted by name.
    ///
    /// A missing entry lists as empty.
    pub async fn list(&self, key: &str) -> Result<Vec<StagedFile>> {
        let dir = self.entry_path(key);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            files.push(StagedFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Create (or truncate) a staged file and hand back the open handle.
    pub async fn create_file(&self, key: &str, filename: &str) -> Result<fs::File> {
        let path = self.entry_path(key).join(sanitize_filename(filename));
        Ok(fs::File::create(path).await?)
    }

    /// Write a whole staged file in one go.
    pub async fn write(&self, key: &str, filename: &str, bytes: &[u8]) -> Result<()> {
        let mut file = self.create_file(key, filename).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Make a remote name safe to use as a single path component.
///
/// Path separators become `_` and dot-only names are prefixed, so a name
/// can never escape its staging directory.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        format!("_{cleaned}")
    } else {
        cleaned
    }
}
