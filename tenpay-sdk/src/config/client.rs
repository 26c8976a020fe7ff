//! HTTP client settings.

use std::time::Duration;

use url::Url;

/// Production endpoint of the V3 API.
pub const DEFAULT_BASE_URL: &str = "https://api.mch.weixin.qq.com/";

/// Timeout applied when a call does not pass its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Settings shared by every call made through one executor.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL that relative endpoint paths are joined onto.
    pub base_url: Url,
    /// Default per-call timeout.
    pub timeout: Duration,
    /// Reject success responses whose signature does not verify instead of
    /// returning them with `signed == Some(false)`.
    pub require_valid_signature: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("valid default base url"),
            timeout: DEFAULT_TIMEOUT,
            require_valid_signature: false,
        }
    }
}

impl ClientConfig {
    /// Use a different base URL, e.g. a sandbox or a local mock server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Change the default per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Turn failed response verification into an error.
    pub fn require_valid_signature(mut self, required: bool) -> Self {
        self.require_valid_signature = required;
        self
    }
}
