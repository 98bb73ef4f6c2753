//! Configuration Management
//!
//! Handles persistent configuration storage for armcore. Values come from
//! `<config dir>/armcore/config.json`; a missing or unreadable file yields
//! the defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Public cloud Resource Manager endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Resource Manager endpoint ids are appended to
    pub endpoint: String,
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: format!("armcore/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 60,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Long-running operation polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Interval used when the server suggests none
    pub default_interval_ms: u64,
    /// Lower bound applied to every interval
    pub min_interval_ms: u64,
    /// Upper bound applied to every interval
    pub max_interval_ms: u64,
    /// Overall polling deadline; `None` polls until cancelled
    pub timeout_secs: Option<u64>,
    /// Transient failures tolerated in a row before giving up
    pub max_transport_retries: u32,
    /// First backoff delay after a transient failure, doubled per attempt
    pub retry_backoff_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: 10_000,
            min_interval_ms: 1_000,
            max_interval_ms: 60_000,
            timeout_secs: Some(3 * 60 * 60),
            max_transport_retries: 3,
            retry_backoff_ms: 2_000,
        }
    }
}

impl PollerConfig {
    pub fn default_interval(&self) -> Duration {
        Duration::from_millis(self.default_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Clamp a suggested interval into the configured bounds
    pub fn clamp_interval(&self, suggested: Option<Duration>) -> Duration {
        let min = Duration::from_millis(self.min_interval_ms);
        let max = Duration::from_millis(self.max_interval_ms.max(self.min_interval_ms));
        suggested.unwrap_or_else(|| self.default_interval()).clamp(min, max)
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay = Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor));
        delay.min(Duration::from_millis(self.max_interval_ms))
    }
}

/// Pagination wire format settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Field holding the page items
    pub items_field: String,
    /// Field holding the continuation link
    pub next_link_field: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            items_field: "value".to_string(),
            next_link_field: "nextLink".to_string(),
        }
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armcore").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        Self::load_from(&path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"poller": {"default_interval_ms": 500}}"#).unwrap();
        assert_eq!(config.poller.default_interval_ms, 500);
        assert_eq!(config.poller.max_transport_retries, 3);
        assert_eq!(config.http.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.pagination.next_link_field, "nextLink");
    }

    #[test]
    fn test_clamp_interval() {
        let poller = PollerConfig {
            default_interval_ms: 10_000,
            min_interval_ms: 1_000,
            max_interval_ms: 30_000,
            ..PollerConfig::default()
        };
        assert_eq!(poller.clamp_interval(None), Duration::from_secs(10));
        assert_eq!(
            poller.clamp_interval(Some(Duration::ZERO)),
            Duration::from_secs(1)
        );
        assert_eq!(
            poller.clamp_interval(Some(Duration::from_secs(600))),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let poller = PollerConfig {
            retry_backoff_ms: 100,
            max_interval_ms: 350,
            ..PollerConfig::default()
        };
        assert_eq!(poller.backoff(1), Duration::from_millis(100));
        assert_eq!(poller.backoff(2), Duration::from_millis(200));
        assert_eq!(poller.backoff(3), Duration::from_millis(350));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_from(std::path::Path::new("/nonexistent/armcore.json"));
        assert_eq!(config.http.request_timeout_secs, 60);
    }
}
