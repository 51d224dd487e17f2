use super::{Command, open_session};
use crate::config::Config;
use crate::error::{Result, error};
use crate::render;
use search_core::SearchOutcome;

pub struct GetCommand {
    config: Config,
    id: String,
}

impl GetCommand {
    pub fn new(config: Config, id: String) -> Self {
        Self { config, id }
    }
}

#[async_trait::async_trait]
impl Command for GetCommand {
    async fn execute(&self) -> Result<()> {
        let (coordinator, _) = open_session(&self.config)?;

        match coordinator.search_by_id(&self.id).wait().await {
            SearchOutcome::Applied => {
                for vuln in coordinator.state().results {
                    print!("{}", render::detail(&vuln.cve));
                }
                Ok(())
            }
            SearchOutcome::Failed(message) => Err(error!(message)),
            SearchOutcome::Superseded => Err(error!("request was cancelled")),
        }
    }
}
