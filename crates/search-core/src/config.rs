//! Engine tunables.

use crate::filters::DEFAULT_RESULTS_PER_PAGE;
use crate::rate_limit::DEFAULT_MIN_INTERVAL;
use std::time::Duration;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_RECENT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Quiet period before a filtered search is dispatched.
    pub search_debounce: Duration,
    /// Quiet period before a recent-items fetch is dispatched.
    pub recent_debounce: Duration,
    /// Minimum spacing between any two outbound calls.
    pub min_request_interval: Duration,
    pub results_per_page: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            recent_debounce: DEFAULT_RECENT_DEBOUNCE,
            min_request_interval: DEFAULT_MIN_INTERVAL,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
        }
    }
}
