//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Production Pocket host. Every endpoint path is appended to this.
pub const DEFAULT_BASE_URL: &str = "https://getpocket.com";

/// Settings shared by every call a client makes.
///
/// Deserializable so hosts can embed it in their own config files; missing
/// fields fall back to [`ClientConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Upper bound for one whole call (connect, send, read). `None` keeps
    /// ureq's defaults.
    pub timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_production() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://getpocket.com");
        assert!(config.timeout().is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_ms":15000}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn builders_override_fields() {
        let config = ClientConfig::default()
            .with_base_url("http://127.0.0.1:3000")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.timeout_ms, Some(5000));
    }

    #[test]
    fn sub_second_timeout_keeps_precision() {
        let config = ClientConfig::default().with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));
    }
}
