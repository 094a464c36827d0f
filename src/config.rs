//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the Telegram API retry constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Music search endpoint
    #[serde(default = "default_search_api_url")]
    pub search_api_url: String,
    /// Maximum number of results shown per search
    #[serde(default = "default_search_result_limit")]
    pub search_result_limit: usize,

    /// Maximum number of sessions kept in a result store
    #[serde(default = "default_session_cache_capacity")]
    pub session_cache_capacity: u64,
    /// Seconds of inactivity after which a session's results are dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Timeout for outbound HTTP requests
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Scratch directory for downloads
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Path or name of the yt-dlp executable
    #[serde(default = "default_ytdlp_bin")]
    pub ytdlp_bin: String,
    /// Upper bound for a single download
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Files above this size are not uploaded to Telegram
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_search_api_url() -> String {
    "https://api.deezer.com/search".to_string()
}

const fn default_search_result_limit() -> usize {
    10
}

const fn default_session_cache_capacity() -> u64 {
    SESSION_CACHE_MAX_SIZE
}

const fn default_session_idle_secs() -> u64 {
    SESSION_IDLE_SECS
}

const fn default_http_timeout_secs() -> u64 {
    30
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("/tmp/downloads")
}

fn default_ytdlp_bin() -> String {
    "yt-dlp".to_string()
}

const fn default_download_timeout_secs() -> u64 {
    600
}

const fn default_max_upload_bytes() -> u64 {
    MAX_UPLOAD_BYTES
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_relay_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__SEARCH_RESULT_LIMIT=5` sets `search_result_limit`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain UPPER_SNAKE_CASE variables; empty values count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Idle TTL for result store sessions
    #[must_use]
    pub const fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Timeout for search requests
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Timeout for a single yt-dlp run
    #[must_use]
    pub const fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Default capacity of a session result store.
pub const SESSION_CACHE_MAX_SIZE: u64 = 10_000;
/// Default idle TTL (seconds) of a session result set.
/// Default: 1 hour.
pub const SESSION_IDLE_SECS: u64 = 3600;
/// Telegram bots may upload up to 50 MB; keep a margin.
pub const MAX_UPLOAD_BYTES: u64 = 49 * 1024 * 1024;

// Telegram API retry configuration
/// Initial backoff for Telegram API retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Backoff ceiling for Telegram API retries
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 5_000;
/// Maximum retries for a single Telegram API call
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Single test: environment variables are process-global
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("SEARCH_RESULT_LIMIT", "5");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.search_result_limit, 5);
        assert_eq!(settings.search_api_url, "https://api.deezer.com/search");
        assert_eq!(settings.max_upload_bytes, MAX_UPLOAD_BYTES);
        assert_eq!(settings.session_idle(), Duration::from_secs(3600));

        env::remove_var("SEARCH_RESULT_LIMIT");

        // Empty env var falls back to the default
        env::set_var("YTDLP_BIN", "");
        let settings = Settings::new()?;
        assert_eq!(settings.ytdlp_bin, "yt-dlp");
        assert_eq!(settings.search_result_limit, 10);

        env::remove_var("YTDLP_BIN");
        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }
}
