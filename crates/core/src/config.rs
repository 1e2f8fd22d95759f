//! Connection settings for the Kubernetes client.

use std::time::Duration;
use url::Url;

/// How the client authenticates to the API server.
#[derive(Clone, Default)]
pub enum Auth {
    /// No credentials (e.g. behind `kubectl proxy`).
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    BearerToken(String),
    /// Mutual TLS with a PEM client certificate and key.
    ClientCertificate { cert_pem: Vec<u8>, key_pem: Vec<u8> },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::BearerToken(_) => write!(f, "BearerToken(<redacted>)"),
            Self::ClientCertificate { .. } => write!(f, "ClientCertificate(<redacted>)"),
        }
    }
}

/// Configuration for the Kubernetes client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API server.
    pub server: Url,
    /// Credentials.
    pub auth: Auth,
    /// PEM bundle of additional trusted CA certificates.
    pub ca_pem: Option<Vec<u8>>,
    /// Skip server certificate verification.
    pub insecure_skip_tls_verify: bool,
    /// Request timeout.
    pub timeout: Duration,
    /// Retries for throttled or unavailable API servers.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Create a new configuration for the given API server.
    pub fn new(server: Url) -> Self {
        Self {
            server,
            auth: Auth::None,
            ca_pem: None,
            insecure_skip_tls_verify: false,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Retries for requests the API server may accept on a second try.
///
/// Which failures qualify is decided by [`ClientError::is_retryable`];
/// this only bounds how often and how long to wait.
///
/// [`ClientError::is_retryable`]: crate::ClientError::is_retryable
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each following one.
    pub base_delay: Duration,
    /// Upper bound for any delay, including a server `Retry-After`.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (zero based). A `Retry-After`
    /// sent by the API server replaces the computed backoff.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = retry_after.unwrap_or_else(|| {
            let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
            self.base_delay.saturating_mul(factor)
        });
        backoff.min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0, None), Duration::from_millis(100));
        assert_eq!(policy.delay(2, None), Duration::from_millis(400));
        assert_eq!(policy.delay(20, None), Duration::from_secs(10));
        assert_eq!(policy.delay(40, None), Duration::from_secs(10));
    }

    #[test]
    fn test_auth_debug_redacts_secrets() {
        let auth = Auth::BearerToken("super-secret".to_string());
        assert!(!format!("{:?}", auth).contains("super-secret"));
    }

    #[test]
    fn test_retry_after_replaces_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0, Some(Duration::from_secs(2))), Duration::from_secs(2));
        assert_eq!(policy.delay(0, Some(Duration::from_secs(120))), Duration::from_secs(10));
    }
}
