use crate::error::{Result, WrapErr};
use config::{AppStrategy, create_strategy, resolve_dir};
use nvd::ClientOptions;
use search_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default = "default_config", deny_unknown_fields)]
pub struct Config {
    pub api_base_url: String,
    /// Sent as the `apiKey` header when set.
    pub api_key: Option<String>,
    /// 0 disables the transport timeout.
    pub request_timeout_secs: u64,
    pub cache_dir: PathBuf,
    pub min_request_interval_ms: u64,
    pub search_debounce_ms: u64,
    pub recent_debounce_ms: u64,
    pub results_per_page: u32,
    pub recent_days: u32,
}

fn default_cache_dir() -> PathBuf {
    match create_strategy() {
        Ok(strategy) => resolve_dir("CACHE_DIRECTORY", &strategy, |s| Some(s.cache_dir())),
        Err(_) => std::env::temp_dir().join(config::constants::APP_NAME),
    }
}

fn default_config() -> Config {
    let engine = EngineConfig::default();

    Config {
        api_base_url: nvd::client::DEFAULT_BASE_URL.to_string(),
        api_key: None,
        request_timeout_secs: 30,
        cache_dir: default_cache_dir(),
        min_request_interval_ms: engine.min_request_interval.as_millis() as u64,
        search_debounce_ms: engine.search_debounce.as_millis() as u64,
        recent_debounce_ms: engine.recent_debounce.as_millis() as u64,
        results_per_page: engine.results_per_page,
        recent_days: 7,
    }
}

impl Default for Config {
    fn default() -> Self {
        default_config()
    }
}

impl Config {
    fn load_str(user_config_str: &str) -> Result<Config> {
        let user_config: Config = toml::from_str(user_config_str)?;
        Ok(user_config)
    }

    /// Load `path`, or the platform config file when `path` is `None`.
    ///
    /// A missing default file is created with commented-out examples.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => config::config_file_path(&create_strategy()?),
        };

        match std::fs::read_to_string(&config_path) {
            Ok(user_config_str) => Self::load_str(&user_config_str)
                .wrap_err_with(|| format!("Invalid configuration in {}", config_path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && path.is_none() => {
                Self::create_example_config(&config_path)?;
                Self::load_str("")
            }
            Err(e) => Err(e)
                .wrap_err_with(|| format!("Cannot read {}", config_path.display())),
        }
    }

    fn create_example_config(config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let example_config = r#"# vulnwatch configuration
#
# Created on first run. Every key is optional.

# api-base-url = "https://services.nvd.nist.gov/rest/json/cves/2.0"

# An API key raises the service's request quota.
# api-key = "00000000-0000-0000-0000-000000000000"

# request-timeout-secs = 30

# Minimum spacing between two requests to the service.
# min-request-interval-ms = 1000

# Quiet period before a search or a recent-items fetch is sent.
# search-debounce-ms = 300
# recent-debounce-ms = 500

# results-per-page = 20
# recent-days = 7

# Where the search history is stored.
# cache-dir = "/custom/cache/path"
"#;

        std::fs::write(config_path, example_config)?;
        eprintln!("Created configuration file {}", config_path.display());

        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            recent_debounce: Duration::from_millis(self.recent_debounce_ms),
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
            results_per_page: self.results_per_page,
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = Config::load_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_keys_are_kebab_case() {
        let cfg = Config::load_str(
            r#"
            api-key = "secret"
            results-per-page = 50
            search-debounce-ms = 100
            request-timeout-secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.results_per_page, 50);
        assert_eq!(cfg.engine_config().search_debounce, Duration::from_millis(100));
        assert_eq!(cfg.client_options().api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.client_options().timeout, None);
        assert_eq!(cfg.recent_days, 7);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::load_str("watch-paths = []").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
        assert!(!missing.exists());
    }
}
