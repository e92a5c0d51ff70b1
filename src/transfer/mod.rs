//! Attachment transfer engine.
//!
//! Drives one forward pass over the target records and, for each one:
//!
//! 1. extracts the external key (absent → skip)
//! 2. applies the numeric key range, if configured (outside → skip)
//! 3. lists the source attachments (none → skip)
//! 4. stages them locally, unless already staged
//! 5. asks the target which filenames it already has
//! 6. uploads only the staged files the target is missing
//!
//! Records are handled strictly one at a time so the read-then-write
//! duplicate check against the target needs no locking. Every failure is
//! fatal to the run; a rerun resumes thanks to the staging area and the
//! duplicate check.

mod stats;

pub use stats::MigrationStats;

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::key::{KeyExtractor, parse_key_number};
use crate::model::{KeyRange, StagedFile, TargetRecord};
use crate::source::{Materialized, SourceApi};
use crate::staging::{AttachmentStore, sanitize_filename};
use crate::target::{PAGE_SIZE, RecordCursor, TargetApi};

/// What happened to a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record carries no external key.
    NoExternalKey,
    /// The external key's number falls outside the configured range.
    OutOfRange { number: i64 },
    /// The source record has no attachments.
    NoAttachments,
    /// Attachments were staged and the missing ones uploaded.
    Transferred {
        external_key: String,
        materialized: Materialized,
        uploaded: usize,
        already_present: usize,
    },
}

/// Migrates attachments from a source to a target, record by record.
pub struct Migrator<'a, S: SourceApi, T: TargetApi> {
    source: &'a S,
    target: &'a T,
    store: &'a AttachmentStore,
    extractor: KeyExtractor,
    key_range: Option<KeyRange>,
    page_size: usize,
}

impl<'a, S: SourceApi, T: TargetApi> Migrator<'a, S, T> {
    pub fn new(source: &'a S, target: &'a T, store: &'a AttachmentStore) -> Self {
        Self {
            source,
            target,
            store,
            extractor: KeyExtractor::default(),
            key_range: None,
            page_size: PAGE_SIZE,
        }
    }

    /// Read external keys from `field` on each target record.
    pub fn with_key_field(mut self, field: Option<String>) -> Self {
        self.extractor = KeyExtractor::new(field);
        self
    }

    /// Only migrate records whose key number lies in `range`.
    pub fn with_key_range(mut self, range: Option<KeyRange>) -> Self {
        self.key_range = range;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Run the migration over every target record.
    ///
    /// Stops at the first error; records before it are fully migrated.
    pub async fn run(&self) -> Result<MigrationStats> {
        let mut cursor = RecordCursor::with_page_size(self.target, self.page_size);
        let mut stats = MigrationStats::default();
        let mut index = 0usize;

        while let Some(record) = cursor.next().await? {
            index += 1;
            debug!(
                page = cursor.state().pages_fetched(),
                position = cursor.state().position(),
                "Record {index}"
            );
            let outcome = self.process_record(index, &record).await?;
            stats.record(&outcome);
        }

        stats.pages = cursor.state().pages_fetched();
        info!(
            records = stats.processed,
            uploaded = stats.uploaded_files,
            "Migration complete"
        );
        Ok(stats)
    }

    /// Migrate a single record. `index` is its 1-based position in the run.
    pub async fn process_record(&self, index: usize, record: &TargetRecord) -> Result<RecordOutcome> {
        info!("#{index} {} {}", record.kind.as_str(), record.key);

        let Some(external_key) = self.extractor.extract(record) else {
            warn!(record = %record.key, "No external key found, skipping");
            return Ok(RecordOutcome::NoExternalKey);
        };

        if let Some(range) = self.key_range {
            let number = parse_key_number(&external_key)?;
            if !range.contains(number) {
                debug!(record = %record.key, %external_key, "Outside key range, skipping");
                return Ok(RecordOutcome::OutOfRange { number });
            }
        }

        let attachments = self.source.list_attachments(&external_key).await?;
        if attachments.is_empty() {
            info!("\tNo attachments to upload from {external_key}");
            return Ok(RecordOutcome::NoAttachments);
        }

        info!(
            "\tFound {} attachments, downloading from {external_key}",
            attachments.len()
        );
        let materialized = self
            .source
            .materialize(self.store, &external_key, &attachments)
            .await?;

        let existing = self.target.list_existing_attachments(&record.key).await?;
        let staged = self.store.list(&external_key).await?;
        let staged_count = staged.len();
        let pending = pending_uploads(staged, &existing);

        if pending.is_empty() {
            info!("\tAll attachments already present on {}", record.key);
        } else {
            info!("\tUploading {} attachments to {}", pending.len(), record.key);
            self.target.upload(&record.key, &pending).await?;
        }

        Ok(RecordOutcome::Transferred {
            external_key,
            materialized,
            uploaded: pending.len(),
            already_present: staged_count - pending.len(),
        })
    }
}

/// Staged files whose names the target doesn't have yet.
///
/// Remote names are compared in their on-disk form so sanitised names
/// still match.
#[must_use]
pub fn pending_uploads(staged: Vec<StagedFile>, existing: &[String]) -> Vec<StagedFile> {
    let existing: HashSet<String> = existing.iter().map(|n| sanitize_filename(n)).collect();
    staged
        .into_iter()
        .filter(|f| !existing.contains(&f.name))
        .collect()
}
