//! Incremental history browser
//!
//! Accumulates pages of history as the user scrolls toward the end of the
//! list. Strictly forward: pages are only ever appended, never refetched.
//! Entries are not de-duplicated, so inserts or deletes on the server between
//! two page loads can show an entry twice or skip one.

use crate::history_client::{ClientError, HistoryClient};
use restbench_common::{HistoryPage, LogEntry, PageRequest};

/// Rows from the end of the list at which the next page is requested
pub const DEFAULT_SCROLL_THRESHOLD: usize = 2;

#[derive(Debug, Clone)]
pub struct HistoryBrowser {
    page: u32,
    limit: u32,
    has_more: bool,
    loaded_page: Option<u32>,
    total: Option<u64>,
    entries: Vec<LogEntry>,
    threshold: usize,
}

impl HistoryBrowser {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: PageRequest::new(1, limit).limit,
            has_more: true,
            loaded_page: None,
            total: None,
            entries: Vec::new(),
            threshold: DEFAULT_SCROLL_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Total reported by the last page load
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// The current page has not been fetched yet
    pub fn needs_load(&self) -> bool {
        self.loaded_page != Some(self.page)
    }

    /// Fetch the current page if it has not been fetched.
    ///
    /// On error the page stays pending, so the next call fetches it again.
    pub async fn load_page(&mut self, client: &HistoryClient) -> Result<usize, ClientError> {
        if !self.needs_load() {
            return Ok(0);
        }
        let page = client.list(PageRequest::new(self.page, self.limit)).await?;
        Ok(self.apply_page(page))
    }

    /// Append a fetched page to the list. Returns how many entries were added.
    pub fn apply_page(&mut self, page: HistoryPage) -> usize {
        let added = page.data.len();
        self.entries.extend(page.data);
        self.loaded_page = Some(self.page);
        self.total = Some(page.total);

        if added == 0 || self.entries.len() as u64 >= page.total {
            self.has_more = false;
        }
        added
    }

    /// Scroll trigger. `position` is the index of the last visible or
    /// selected row. Advances to the next page when it comes within the
    /// threshold of the end, more entries exist and the current page is
    /// already loaded. Returns whether the page advanced.
    pub fn on_scroll(&mut self, position: usize) -> bool {
        if !self.has_more || self.needs_load() {
            return false;
        }
        if position + self.threshold + 1 >= self.entries.len() {
            self.page += 1;
            true
        } else {
            false
        }
    }
}
