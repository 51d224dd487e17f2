pub mod get;
pub mod history;
pub mod recent;
pub mod search;
pub mod shell;

use crate::config::Config;
use crate::error::{Result, WrapErr, error};
use crate::history_store::HistoryStore;
use crate::render;
use nvd::NvdClient;
use search_core::{SearchCoordinator, SearchOutcome};
use std::sync::Arc;

pub use get::GetCommand;
pub use history::HistoryCommand;
pub use recent::RecentCommand;
pub use search::SearchCommand;
pub use shell::ShellCommand;

#[async_trait::async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Coordinator talking to the configured service, seeded with the stored
/// history.
fn open_session(cfg: &Config) -> Result<(SearchCoordinator, HistoryStore)> {
    let client = NvdClient::new(cfg.client_options()).wrap_err("Cannot create API client")?;
    let store = HistoryStore::new(&cfg.cache_dir);
    let history = store.load()?;
    let coordinator =
        SearchCoordinator::new(Arc::new(client), cfg.engine_config()).with_history(history);
    Ok((coordinator, store))
}

/// Print a finished one-shot request; failures become the command's error.
fn report(outcome: SearchOutcome, coordinator: &SearchCoordinator) -> Result<()> {
    match outcome {
        SearchOutcome::Applied => {
            print!("{}", render::results(&coordinator.state()));
            Ok(())
        }
        SearchOutcome::Failed(message) => Err(error!(message)),
        SearchOutcome::Superseded => Err(error!("request was cancelled")),
    }
}
