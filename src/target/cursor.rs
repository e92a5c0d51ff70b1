//! Forward-only cursor over paginated target records.
//!
//! ```text
//! UNSTARTED ──► FETCHING ──► HAS_RECORDS ──(buffer drained)──► FETCHING
//!                   │                                             │
//!                   └──────────────► EXHAUSTED ◄──────────────────┘
//! ```
//!
//! A page shorter than the page size is the last one. A full page always
//! triggers one more fetch, which may come back empty.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::Result;
use crate::model::TargetRecord;

use super::TargetApi;

/// Fixed number of records requested per page.
pub const PAGE_SIZE: usize = 200;

/// Where the cursor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    Unstarted,
    HasRecords,
    Exhausted,
}

/// Cursor bookkeeping, owned exclusively by one [`RecordCursor`].
#[derive(Debug, Default)]
pub struct CursorState {
    buffer: VecDeque<TargetRecord>,
    /// Next page to request (zero-based).
    page: usize,
    /// Position of the next record within the current page.
    index: usize,
    /// The page in the buffer is the last one.
    terminal: bool,
    started: bool,
    exhausted: bool,
}

impl CursorState {
    #[must_use]
    pub fn phase(&self) -> CursorPhase {
        if self.exhausted {
            CursorPhase::Exhausted
        } else if self.started {
            CursorPhase::HasRecords
        } else {
            CursorPhase::Unstarted
        }
    }

    /// Position of the next record within the current page.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.index
    }

    /// Pages requested so far.
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        self.page
    }

    fn take_buffered(&mut self) -> Option<TargetRecord> {
        let record = self.buffer.pop_front()?;
        self.index += 1;
        Some(record)
    }

    /// Install a freshly fetched page.
    fn load_page(&mut self, records: Vec<TargetRecord>, page_size: usize) {
        self.started = true;
        self.page += 1;
        self.index = 0;
        self.terminal = records.len() < page_size;
        self.exhausted = records.is_empty();
        self.buffer = records.into();
    }
}

/// Lazily pages through every record a target search returns.
pub struct RecordCursor<'a, T: TargetApi> {
    target: &'a T,
    page_size: usize,
    state: CursorState,
}

impl<'a, T: TargetApi> RecordCursor<'a, T> {
    pub fn new(target: &'a T) -> Self {
        Self::with_page_size(target, PAGE_SIZE)
    }

    pub fn with_page_size(target: &'a T, page_size: usize) -> Self {
        Self {
            target,
            page_size: page_size.max(1),
            state: CursorState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &CursorState {
        &self.state
    }

    /// Next record in server page order, or `None` once exhausted.
    ///
    /// After `None` is returned no further requests are made.
    pub async fn next(&mut self) -> Result<Option<TargetRecord>> {
        loop {
            if self.state.exhausted {
                return Ok(None);
            }
            if let Some(record) = self.state.take_buffered() {
                return Ok(Some(record));
            }
            if self.state.terminal {
                self.state.exhausted = true;
                return Ok(None);
            }

            let page = self.state.page;
            let records = self.target.search(page, self.page_size).await?;
            let count = records.len();
            self.state.load_page(records, self.page_size);
            debug!(page, count, phase = ?self.state.phase(), "Loaded target page");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeTarget, test_case};

    fn page(from: usize, count: usize) -> Vec<TargetRecord> {
        (from..from + count)
            .map(|i| test_case(&format!("QA-T{i}"), Some(format!("PROJ-{i}").as_str())))
            .collect()
    }

    async fn drain(cursor: &mut RecordCursor<'_, FakeTarget>) -> Vec<String> {
        let mut keys = Vec::new();
        while let Some(record) = cursor.next().await.unwrap() {
            keys.push(record.key);
        }
        keys
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let target = FakeTarget::new(vec![Vec::new()]);
        let mut cursor = RecordCursor::with_page_size(&target, 3);

        assert_eq!(cursor.state().phase(), CursorPhase::Unstarted);
        assert!(cursor.next().await.unwrap().is_none());
        assert_eq!(cursor.state().phase(), CursorPhase::Exhausted);
        assert_eq!(target.searches(), vec![0]);
    }

    #[tokio::test]
    async fn test_short_first_page_is_terminal() {
        let target = FakeTarget::new(vec![page(1, 2)]);
        let mut cursor = RecordCursor::with_page_size(&target, 3);

        assert!(cursor.next().await.unwrap().is_some());
        assert_eq!(cursor.state().position(), 1);
        assert_eq!(drain(&mut cursor).await, vec!["QA-T2"]);
        assert_eq!(target.searches(), vec![0]);
    }

    #[tokio::test]
    async fn test_full_page_then_short_page() {
        let target = FakeTarget::new(vec![page(1, 3), page(4, 1)]);
        let mut cursor = RecordCursor::with_page_size(&target, 3);

        assert_eq!(
            drain(&mut cursor).await,
            vec!["QA-T1", "QA-T2", "QA-T3", "QA-T4"]
        );
        assert_eq!(target.searches(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_full_page_confirms_end_with_extra_fetch() {
        let target = FakeTarget::new(vec![page(1, 3), Vec::new()]);
        let mut cursor = RecordCursor::with_page_size(&target, 3);

        assert_eq!(drain(&mut cursor).await.len(), 3);
        assert_eq!(target.searches(), vec![0, 1]);
        assert_eq!(cursor.state().pages_fetched(), 2);
        assert_eq!(cursor.state().position(), 0);
    }

    #[tokio::test]
    async fn test_no_requests_after_exhaustion() {
        let target = FakeTarget::new(vec![page(1, 1)]);
        let mut cursor = RecordCursor::with_page_size(&target, 3);

        drain(&mut cursor).await;
        assert!(cursor.next().await.unwrap().is_none());
        assert!(cursor.next().await.unwrap().is_none());
        assert_eq!(target.searches(), vec![0]);
    }

    #[tokio::test]
    async fn test_page_error_propagates() {
        let target = FakeTarget::new(vec![page(1, 3)]).failing_search_at(1);
        let mut cursor = RecordCursor::with_page_size(&target, 3);

        for _ in 0..3 {
            assert!(cursor.next().await.unwrap().is_some());
        }
        assert!(cursor.next().await.is_err());
    }
}
