//! Server configuration loaded from environment variables.
//!
//! - `LIFTLOG_HOST` - bind address (default `127.0.0.1`)
//! - `LIFTLOG_PORT` - HTTP port (default `3000`)
//! - `LIFTLOG_DATABASE` - SQLite file path (default: the platform data directory)
//! - `LIFTLOG_SEED` - replace all lifts with sample data on startup (`1`/`true`)
//! - `LIFTLOG_REQUEST_TIMEOUT_SECS` - per-request timeout (default `30`)
//!
//! Command-line flags take precedence over these.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `None` means the platform default location.
    pub database_path: Option<PathBuf>,
    pub seed: bool,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("LIFTLOG_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = lookup("LIFTLOG_PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let database_path = lookup("LIFTLOG_DATABASE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let seed = lookup("LIFTLOG_SEED")
            .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let request_timeout = lookup("LIFTLOG_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self {
            host,
            port,
            database_path,
            seed,
            request_timeout,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
