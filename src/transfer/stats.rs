//! Per-run counters.

use serde::Serialize;

use crate::source::Materialized;

use super::RecordOutcome;

/// Totals for one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStats {
    /// Records taken from the target cursor.
    pub processed: usize,
    pub skipped_no_key: usize,
    pub skipped_out_of_range: usize,
    pub without_attachments: usize,
    /// Records whose attachments were downloaded this run.
    pub materialized: usize,
    /// Records served from an existing staging entry.
    pub reused_staging: usize,
    pub downloaded_bytes: u64,
    pub uploaded_files: usize,
    pub already_present_files: usize,
    /// Search pages requested.
    pub pages: usize,
}

impl MigrationStats {
    /// Fold one record's outcome into the totals.
    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::NoExternalKey => self.skipped_no_key += 1,
            RecordOutcome::OutOfRange { .. } => self.skipped_out_of_range += 1,
            RecordOutcome::NoAttachments => self.without_attachments += 1,
            RecordOutcome::Transferred {
                materialized,
                uploaded,
                already_present,
                ..
            } => {
                match materialized {
                    Materialized::AlreadyStaged => self.reused_staging += 1,
                    Materialized::Downloaded { bytes, .. } => {
                        self.materialized += 1;
                        self.downloaded_bytes += bytes;
                    }
                }
                self.uploaded_files += uploaded;
                self.already_present_files += already_present;
            }
        }
    }

    /// Records that reached the upload step.
    #[must_use]
    pub const fn transferred(&self) -> usize {
        self.materialized + self.reused_staging
    }
}
