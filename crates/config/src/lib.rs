pub mod constants;

pub use etcetera::AppStrategy;
use etcetera::{AppStrategyArgs, choose_app_strategy};

use std::env;
use std::path::PathBuf;

pub fn create_strategy() -> std::result::Result<impl AppStrategy, etcetera::HomeDirError> {
    choose_app_strategy(AppStrategyArgs {
        top_level_domain: constants::TOP_LEVEL_DOMAIN.to_string(),
        author: constants::AUTHOR.to_string(),
        app_name: constants::APP_NAME.to_string(),
    })
}

/// Resolve a directory from `env_key` first, then the platform strategy, then the temp dir.
pub fn resolve_dir<S, F>(env_key: &str, strategy: &S, strategy_fn: F) -> PathBuf
where
    S: AppStrategy,
    F: FnOnce(&S) -> Option<PathBuf>,
{
    env::var_os(env_key)
        .map(PathBuf::from)
        .or_else(|| strategy_fn(strategy))
        .unwrap_or_else(|| env::temp_dir().join(constants::APP_NAME))
}

/// Location of the CLI configuration file inside the platform config dir.
pub fn config_file_path<S: AppStrategy>(strategy: &S) -> PathBuf {
    strategy.config_dir().join(constants::CLI_CONFIG_FILE_NAME)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_file_lives_in_config_dir() {
        let strategy = create_strategy().expect("home dir");
        let path = config_file_path(&strategy);
        assert!(path.starts_with(strategy.config_dir()));
        assert!(path.ends_with(constants::CLI_CONFIG_FILE_NAME));
    }

    #[test]
    fn test_resolve_dir_falls_back_to_strategy() {
        let strategy = create_strategy().expect("home dir");
        let dir = resolve_dir("VULNWATCH_TEST_UNSET_DIRECTORY", &strategy, |s| {
            Some(s.cache_dir())
        });
        assert_eq!(dir, strategy.cache_dir());
    }
}
