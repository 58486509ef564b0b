//! Session configuration options.

use std::time::Duration;

/// Configuration for a Visier [`Session`](crate::Session).
///
/// # Example
///
/// ```
/// use visier_rs::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_request_timeout(Duration::from_secs(60))
///     .with_user_agent("my-app/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeout for each individual HTTP request.
    pub request_timeout: Duration,
    /// Timeout for the interactive OAuth2 authorization-code flow.
    pub auth_code_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            auth_code_timeout: Duration::from_secs(120),
            user_agent: format!("visier-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the bound on the OAuth2 authorization-code flow.
    pub fn with_auth_code_timeout(mut self, timeout: Duration) -> Self {
        self.auth_code_timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
