//! Recent keyword searches, most recent first.

use serde::{Deserialize, Serialize};

pub const HISTORY_CAPACITY: usize = 10;

/// Bounded, duplicate-free list of search terms.
///
/// Terms compare case-sensitively. Entries never expire; they leave the list
/// only by eviction past [`HISTORY_CAPACITY`], [`SearchHistory::remove`] or
/// [`SearchHistory::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a stored list, given most recent first. Blank and
    /// repeated terms are dropped and the list is cut to capacity.
    pub fn from_entries(entries: impl IntoIterator<Item = String>) -> Self {
        let mut history = Self::new();
        for term in entries {
            let term = term.trim();
            if term.is_empty() || history.contains(term) {
                continue;
            }
            if history.entries.len() == HISTORY_CAPACITY {
                break;
            }
            history.entries.push(term.to_string());
        }
        history
    }

    /// Record `term` as the most recent search. Returns `true` if it was added.
    pub fn add(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() || self.contains(term) {
            return false;
        }
        self.entries.insert(0, term.to_string());
        self.entries.truncate(HISTORY_CAPACITY);
        true
    }

    pub fn remove(&mut self, term: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != term);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.iter().any(|entry| entry == term)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<String>> for SearchHistory {
    fn from(entries: Vec<String>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<SearchHistory> for Vec<String> {
    fn from(history: SearchHistory) -> Self {
        history.entries
    }
}
