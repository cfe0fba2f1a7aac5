//! Configuration types for the clanker engine.
//!
//! Covers where the conversation service lives, which wire contract to
//! speak, and the pacing of the business-cycling animation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the configured API base URL.
pub const BASE_URL_ENV: &str = "CLANKER_API_BASE_URL";

/// Path of the create-conversation endpoint.
pub const CREATE_CONVERSATION_ENDPOINT_PATH: &str = "/v1/conversation";

/// Path of the continue-conversation endpoint.
pub const CONTINUE_CONVERSATION_ENDPOINT_PATH: &str = "/v1/conversation/continue";

/// Path of the historical echo endpoint.
pub const SEND_MESSAGE_ENDPOINT_PATH: &str = "/api/mock";

/// Main configuration for clanker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL that endpoint paths are resolved against.
    ///
    /// A blank value read from a file or override means the default.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Path of the create-conversation endpoint.
    #[serde(default = "default_create_path")]
    pub create_path: String,

    /// Path of the continue-conversation endpoint.
    #[serde(default = "default_continue_path")]
    pub continue_path: String,

    /// Path of the legacy echo endpoint.
    #[serde(default = "default_legacy_path")]
    pub legacy_path: String,

    /// Which wire contract to speak.
    #[serde(default)]
    pub transport: Transport,

    /// Timeout in seconds for a single request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Animation pacing.
    #[serde(default)]
    pub timings: Timings,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".into()
}

fn default_create_path() -> String {
    CREATE_CONVERSATION_ENDPOINT_PATH.into()
}

fn default_continue_path() -> String {
    CONTINUE_CONVERSATION_ENDPOINT_PATH.into()
}

fn default_legacy_path() -> String {
    SEND_MESSAGE_ENDPOINT_PATH.into()
}

fn default_request_timeout() -> u64 {
    60
}

/// Wire contract used to reach the conversation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Structured create/continue conversation API.
    #[default]
    Conversation,
    /// Historical `{message}` → `{reply}` echo API.
    LegacyMock,
}

/// Delays that pace the cycling animation and the UI tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Delay between the count announcement and the cycling message.
    #[serde(default = "default_announce_delay")]
    pub announce_delay_ms: u64,

    /// Interval between cycling updates.
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_ms: u64,

    /// Delay between finalizing the cycling message and the confirmation.
    #[serde(default = "default_confirmation_delay")]
    pub confirmation_delay_ms: u64,

    /// UI tick rate.
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
}

fn default_announce_delay() -> u64 {
    1500
}

fn default_cycle_interval() -> u64 {
    2000
}

fn default_confirmation_delay() -> u64 {
    10_000
}

fn default_tick_rate() -> u64 {
    250
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            announce_delay_ms: default_announce_delay(),
            cycle_interval_ms: default_cycle_interval(),
            confirmation_delay_ms: default_confirmation_delay(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Timings {
    /// Announcement delay as a `Duration`.
    pub fn announce_delay(&self) -> Duration {
        Duration::from_millis(self.announce_delay_ms)
    }

    /// Cycling interval as a `Duration`.
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    /// Confirmation delay as a `Duration`.
    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_delay_ms)
    }

    /// UI tick rate as a `Duration`.
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            create_path: default_create_path(),
            continue_path: default_continue_path(),
            legacy_path: default_legacy_path(),
            transport: Transport::default(),
            request_timeout_secs: default_request_timeout(),
            timings: Timings::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let mut config: Self = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        let base = std::mem::take(&mut config.api_base_url);
        let config = config.with_base_url(base);
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Apply the `CLANKER_API_BASE_URL` environment override, if set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) => self.with_base_url(url),
            Err(_) => self,
        }
    }

    /// Replace the API base URL. A blank URL restores the default.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = if url.trim().is_empty() {
            default_api_base_url()
        } else {
            url
        };
        self
    }

    /// Check that the base URL is an absolute URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        reqwest::Url::parse(&self.api_base_url)
            .map(|_| ())
            .map_err(|_| ConfigError::InvalidBaseUrl(self.api_base_url.clone()))
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clanker")
            .join("config.json")
    }

    /// Directory for runtime files such as logs.
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clanker")
    }
}

/// Resolve an endpoint path against a base URL.
///
/// An empty base, or one that cannot be joined, leaves the path as-is.
pub fn resolve_api_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    reqwest::Url::parse(base)
        .and_then(|url| url.join(path))
        .map_or_else(|_| path.to_string(), |url| url.to_string())
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The base URL is not a valid absolute URL.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.create_path, "/v1/conversation");
        assert_eq!(config.continue_path, "/v1/conversation/continue");
        assert_eq!(config.transport, Transport::Conversation);
        assert_eq!(config.timings.announce_delay_ms, 1500);
        assert_eq!(config.timings.cycle_interval_ms, 2000);
        assert_eq!(config.timings.confirmation_delay_ms, 10_000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"api_base_url": "http://example.test", "transport": "legacy_mock"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_base_url, "http://example.test");
        assert_eq!(config.transport, Transport::LegacyMock);
        assert_eq!(config.legacy_path, "/api/mock");
        assert_eq!(config.timings, Timings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::default().with_base_url("http://127.0.0.1:9000");
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_rejects_invalid_base_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "not a url"}"#).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_blank_base_url_means_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "", "request_timeout_secs": 5}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout_secs, 5);

        let config = Config::default()
            .with_base_url("http://example.test")
            .with_base_url("  ");
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(
            resolve_api_url(&config.api_base_url, &config.create_path),
            "http://localhost:8000/v1/conversation"
        );
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let config = Config {
            api_base_url: String::new(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_resolve_api_url() {
        assert_eq!(
            resolve_api_url("http://localhost:8000", "/v1/conversation"),
            "http://localhost:8000/v1/conversation"
        );
        assert_eq!(resolve_api_url("", "/api/mock"), "/api/mock");
        assert_eq!(resolve_api_url("::bad::", "/api/mock"), "/api/mock");
    }
}
