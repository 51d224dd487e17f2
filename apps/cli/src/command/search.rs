use super::{Command, open_session, report};
use crate::cli::SearchArgs;
use crate::config::Config;
use crate::error::Result;

pub struct SearchCommand {
    config: Config,
    args: SearchArgs,
}

impl SearchCommand {
    pub fn new(config: Config, args: SearchArgs) -> Self {
        Self { config, args }
    }
}

#[async_trait::async_trait]
impl Command for SearchCommand {
    async fn execute(&self) -> Result<()> {
        let filters = self.args.to_filters(self.config.results_per_page)?;
        let (coordinator, store) = open_session(&self.config)?;

        let outcome = coordinator.search(filters).wait().await;
        store.save(&coordinator.history())?;
        report(outcome, &coordinator)
    }
}
