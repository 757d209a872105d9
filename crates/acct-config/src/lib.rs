mod config;
mod error;
mod log_level;
mod logging_config;
mod monitor_config;
mod paths_config;
mod swap_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use monitor_config::MonitorConfig;
pub use paths_config::PathsConfig;
pub use swap_config::SwapConfig;

const CONFIG_DIR_ENV: &str = "ACCT_CONFIG_DIR";
const CONFIG_DIR_NAME: &str = ".acct";
const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_CREDENTIAL_FILE: &str = "~/.claude/.credentials.json";
const DEFAULT_CONFIG_FILE: &str = "~/.claude/.claude.json";
const DEFAULT_FALLBACK_CONFIG_FILE: &str = "~/.claude.json";
const DEFAULT_BACKUP_DIR: &str = "~/.claude-swap-backup";

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Warn;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const MIN_POLL_INTERVAL_SECS: u64 = 5;
const MAX_POLL_INTERVAL_SECS: u64 = 3600;

const DEFAULT_USE_LOCK: bool = true;
