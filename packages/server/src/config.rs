//! Server configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use feed_log_database::db::ConnectionSettings;

use crate::rate_limit::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Errors in server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Database connection settings are missing or invalid.
    #[error(transparent)]
    Database(#[from] feed_log_database::DbError),

    /// A variable was set to something unparseable.
    #[error("Invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// The value found.
        value: String,
    },
}

/// Everything the server reads from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Document store connection settings.
    pub connection: ConnectionSettings,
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Directory holding the built UI, if it should be served.
    pub static_dir: Option<PathBuf>,
    /// Chat requests allowed per client per window.
    pub rate_limit_max: usize,
    /// Chat rate limit window.
    pub rate_limit_window: Duration,
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `MONGO_URI` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let connection = ConnectionSettings::from_lookup(&lookup)?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let port = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let static_dir = lookup("STATIC_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        let rate_limit_max =
            parse_var(&lookup, "CHAT_RATE_LIMIT_MAX")?.unwrap_or(DEFAULT_MAX_REQUESTS);
        let rate_limit_window = parse_var(&lookup, "CHAT_RATE_LIMIT_WINDOW_SECS")?
            .map_or(DEFAULT_WINDOW, Duration::from_secs);

        Ok(Self {
            connection,
            bind_addr,
            port,
            static_dir,
            rate_limit_max,
            rate_limit_window,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}
