//! Error types for the Kubernetes client.

use serde::Deserialize;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while building or using the Kubernetes client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API server returned an error response.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        reason: Option<String>,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The kubeconfig file could not be resolved into a cluster connection.
    #[error("Kubeconfig error: {0}")]
    Kubeconfig(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Kubeconfig parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem error while reading credentials.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Whether sending the same request again may succeed: connection
    /// failures, timeouts, throttling and an unavailable API server. Other
    /// `Status` failures (forbidden, not found, internal errors) are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, reason, .. } => {
                matches!(status, 429 | 502 | 503 | 504)
                    || matches!(
                        reason.as_deref(),
                        Some("ServerTimeout" | "Timeout" | "TooManyRequests")
                    )
            }
            _ => false,
        }
    }

    /// Create an API error from a status code and response body.
    ///
    /// The API server answers failures with a `Status` object; when the body
    /// is not one, the raw text becomes the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<StatusBody>(body) {
            Ok(status_body) if status_body.message.is_some() => Self::Api {
                status,
                message: status_body.message.unwrap_or_default(),
                reason: status_body.reason,
            },
            _ => Self::Api {
                status,
                message: body.to_string(),
                reason: None,
            },
        }
    }
}

/// Subset of the Kubernetes `Status` object.
#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}
