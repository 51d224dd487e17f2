//! Result set and request status observed by callers.

use crate::pagination;
use nvd::{Vulnerability, VulnerabilityPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

/// Snapshot of the engine's results.
///
/// `results` keep the order the service returned them in. Whenever results
/// came from a paged search, `current_page * page_size` is the `startIndex`
/// of the request that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub results: Vec<Vulnerability>,
    pub total_results: u32,
    pub current_page: u32,
    pub page_size: u32,
    pub loading: bool,
    pub error: Option<String>,
}

impl SearchState {
    pub fn new(page_size: u32) -> Self {
        Self {
            results: Vec::new(),
            total_results: 0,
            current_page: 0,
            page_size: pagination::clamp_page_size(page_size).get(),
            loading: false,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else {
            Phase::Idle
        }
    }

    pub fn total_pages(&self) -> u32 {
        pagination::page_count(self.total_results, self.page_size)
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page.saturating_add(1) < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 0
    }

    // ===== Transitions =====

    /// idle → loading, or loading → loading when a newer request supersedes.
    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Commit a page fetched at `start_index` with `page_size` results per page.
    pub(crate) fn apply_page(&mut self, page: VulnerabilityPage, start_index: u32, page_size: u32) {
        let page_size = pagination::clamp_page_size(page_size).get();
        self.results = page.vulnerabilities;
        self.total_results = page.total_results;
        self.page_size = page_size;
        self.current_page = pagination::to_page(start_index, page_size);
        self.loading = false;
        self.error = None;
    }

    /// Commit the records returned by an identifier lookup.
    pub(crate) fn apply_lookup(&mut self, page: VulnerabilityPage) {
        self.total_results = page.total_results.max(page.vulnerabilities.len() as u32);
        self.results = page.vulnerabilities;
        self.current_page = 0;
        self.loading = false;
        self.error = None;
    }

    /// loading → idle with an error. Results on screen stay as they were.
    pub(crate) fn apply_failure(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(crate::filters::DEFAULT_RESULTS_PER_PAGE)
    }
}
