use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "campus-health";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_DATABASE_PATH: &str = "HEALTH_STORE_DB";
pub const ENV_OPERATION_TIMEOUT_MS: &str = "HEALTH_STORE_TIMEOUT_MS";
pub const ENV_WATCH_INTERVAL_MS: &str = "HEALTH_STORE_WATCH_INTERVAL_MS";

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot determine a data directory; set HEALTH_STORE_DB")]
    NoDataDir,

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "info,campus_health_store=debug".to_string()
}

/// Get the application data directory
/// `<platform data dir>/campus-health/`
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or(ConfigError::NoDataDir)
}

/// Runtime settings of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    /// Upper bound on lock waits for any single store operation.
    pub operation_timeout: Duration,
    /// How often the configs watcher polls for writes by other processes.
    pub config_watch_interval: Duration,
}

impl StoreConfig {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            database_path,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            config_watch_interval: DEFAULT_WATCH_INTERVAL,
        }
    }

    /// Defaults overridden by the `HEALTH_STORE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_path = match lookup(ENV_DATABASE_PATH) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            Some(path) => {
                return Err(ConfigError::InvalidValue {
                    name: ENV_DATABASE_PATH,
                    value: path,
                    reason: "empty path".into(),
                })
            }
            None => app_data_dir()?.join("health.db"),
        };
        let mut config = Self::new(database_path);
        if let Some(raw) = lookup(ENV_OPERATION_TIMEOUT_MS) {
            config.operation_timeout = parse_millis(ENV_OPERATION_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_WATCH_INTERVAL_MS) {
            config.config_watch_interval = parse_millis(ENV_WATCH_INTERVAL_MS, &raw)?;
        }
        Ok(config)
    }
}

fn parse_millis(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let millis: u64 = raw.trim().parse().map_err(|_| invalid("not a whole number of milliseconds"))?;
    if millis == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_millis(millis))
}
