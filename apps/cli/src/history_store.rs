//! Search history persisted as a JSON array in the cache directory.

use crate::error::{Result, WrapErr};
use search_core::SearchHistory;
use std::path::{Path, PathBuf};

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(config::constants::HISTORY_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<SearchHistory> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str(&json)
                .wrap_err_with(|| format!("Corrupt history file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SearchHistory::new()),
            Err(e) => Err(e).wrap_err_with(|| format!("Cannot read {}", self.path.display())),
        }
    }

    pub fn save(&self, history: &SearchHistory) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(history)?;
        std::fs::write(&self.path, json)
            .wrap_err_with(|| format!("Cannot write {}", self.path.display()))?;
        tracing::debug!("saved {} history entries to {}", history.len(), self.path.display());
        Ok(())
    }
}
