use super::Command;
use crate::cli::HistoryAction;
use crate::config::Config;
use crate::error::Result;
use crate::history_store::HistoryStore;

pub struct HistoryCommand {
    store: HistoryStore,
    action: HistoryAction,
}

impl HistoryCommand {
    pub fn new(config: Config, action: Option<HistoryAction>) -> Self {
        Self {
            store: HistoryStore::new(&config.cache_dir),
            action: action.unwrap_or(HistoryAction::List),
        }
    }
}

#[async_trait::async_trait]
impl Command for HistoryCommand {
    async fn execute(&self) -> Result<()> {
        let mut history = self.store.load()?;

        match &self.action {
            HistoryAction::List => {
                for (i, term) in history.entries().iter().enumerate() {
                    println!("{:>2}  {}", i + 1, term);
                }
            }
            HistoryAction::Remove { term } => {
                if history.remove(term) {
                    self.store.save(&history)?;
                } else {
                    println!("'{term}' is not in the history");
                }
            }
            HistoryAction::Clear => {
                history.clear();
                self.store.save(&history)?;
            }
        }

        Ok(())
    }
}
