pub const TOP_LEVEL_DOMAIN: &str = "org";
pub const AUTHOR: &str = "vulnwatch";
pub const APP_NAME: &str = "vulnwatch";

pub const CLI_CONFIG_FILE_NAME: &str = "vulnwatch.toml";
pub const HISTORY_FILE_NAME: &str = "search-history.json";
