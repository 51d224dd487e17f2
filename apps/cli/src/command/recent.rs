use super::{Command, open_session, report};
use crate::config::Config;
use crate::error::Result;
use nvd::client::MAX_RECENT_DAYS;
use tracing::warn;

pub struct RecentCommand {
    config: Config,
    days: Option<u32>,
}

impl RecentCommand {
    pub fn new(config: Config, days: Option<u32>) -> Self {
        Self { config, days }
    }

    fn window(&self) -> u32 {
        let days = self.days.unwrap_or(self.config.recent_days);
        if days > MAX_RECENT_DAYS {
            warn!("{} days is wider than the service allows, using {}", days, MAX_RECENT_DAYS);
        }
        days.clamp(1, MAX_RECENT_DAYS)
    }
}

#[async_trait::async_trait]
impl Command for RecentCommand {
    async fn execute(&self) -> Result<()> {
        let (coordinator, _) = open_session(&self.config)?;
        let outcome = coordinator.get_recent(self.window()).wait().await;
        report(outcome, &coordinator)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 7)]
    #[case(Some(30), 30)]
    #[case(Some(0), 1)]
    #[case(Some(365), MAX_RECENT_DAYS)]
    fn test_window(#[case] days: Option<u32>, #[case] expected: u32) {
        let cmd = RecentCommand::new(Config::default(), days);
        assert_eq!(cmd.window(), expected);
    }
}
