//! Client configuration.

/// Default base URL for the postcodes.io API.
pub const DEFAULT_BASE_URL: &str = "https://api.postcodes.io";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default `User-Agent` header sent by [`crate::transport::ReqwestTransport`].
const DEFAULT_USER_AGENT: &str = concat!("postcodes-client/", env!("CARGO_PKG_VERSION"));

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "POSTCODES_BASE_URL";

/// Environment variable overriding the timeout (whole seconds).
pub const TIMEOUT_ENV: &str = "POSTCODES_TIMEOUT_SECS";

/// Configuration for the postcodes client and its HTTP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the API, without a trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at the public API.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `POSTCODES_BASE_URL` and `POSTCODES_TIMEOUT_SECS`,
    /// falling back to the defaults for unset or unparseable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url);
        }
        if let Some(secs) = lookup(TIMEOUT_ENV).and_then(|s| s.trim().parse().ok()) {
            config = config.with_timeout(secs);
        }
        config
    }

    /// Set a custom base URL (for testing or a self-hosted instance).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ClientConfig::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.starts_with("postcodes-client/"));
    }

    #[test]
    fn config_builder() {
        let config = ClientConfig::new()
            .with_base_url("http://localhost:8000/")
            .with_timeout(5)
            .with_user_agent("test-agent");

        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn config_from_lookup() {
        let config = ClientConfig::from_lookup(|name| match name {
            BASE_URL_ENV => Some("http://mirror.local/".to_string()),
            TIMEOUT_ENV => Some("7".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "http://mirror.local");
        assert_eq!(config.timeout_secs, 7);
    }

    #[test]
    fn config_from_lookup_ignores_garbage() {
        let config = ClientConfig::from_lookup(|name| match name {
            BASE_URL_ENV => Some("  ".to_string()),
            TIMEOUT_ENV => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }
}
