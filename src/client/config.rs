//! Client configuration options.

use std::time::Duration;

use url::Url;

use crate::rate_limit::RateLimitConfig;
use crate::Result;

/// Default host for authenticated API calls.
pub const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com";

/// Default host for the token and authorize endpoints.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://www.reddit.com";

/// Configuration for the Reddit client.
///
/// # Example
///
/// ```
/// use reddit_rs::{ClientConfig, RateLimitConfig};
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("linux:my-bot:v1.0 (by /u/someone)")
///     .with_rate_limit(RateLimitConfig::default().with_permit_limit(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL that command paths are resolved against
    pub api_base_url: String,
    /// Base URL of the token and authorize endpoints
    pub auth_base_url: String,
    /// User-Agent header value
    pub user_agent: String,
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter settings; `None` disables limiting
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            user_agent: format!("reddit-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            rate_limit: Some(RateLimitConfig::default()),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the token endpoint base URL.
    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = url.into();
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the rate limiter configuration.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Disable client-side rate limiting.
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }

    pub(crate) fn api_base(&self) -> Result<Url> {
        parse_base(&self.api_base_url)
    }

    pub(crate) fn auth_base(&self) -> Result<Url> {
        parse_base(&self.auth_base_url)
    }
}

/// Paths are joined relative to the base, so it must end with `/`.
fn parse_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_base_url, "https://oauth.reddit.com");
        assert!(config.user_agent.starts_with("reddit-rs/"));

        let limits = config.rate_limit.unwrap();
        assert_eq!(limits.permit_limit, 60);
        assert_eq!(limits.queue_limit, 60);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::default().with_api_base_url("http://127.0.0.1:9000/proxy");
        let base = config.api_base().unwrap();

        assert_eq!(base.as_str(), "http://127.0.0.1:9000/proxy/");
        assert_eq!(
            base.join("r/rust/hot").unwrap().as_str(),
            "http://127.0.0.1:9000/proxy/r/rust/hot"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig::default().with_auth_base_url("not a url");
        assert!(config.auth_base().is_err());
    }
}
