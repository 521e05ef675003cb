//! Transport types
//!
//! Error taxonomy and the transport seam shared by every adapter.

/// Adapter errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    /// Network error (connection refused, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP error (non-2xx status)
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limited
    #[error("Rate limited{retry_after}")]
    RateLimited { retry_after: String },

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(String),
}

impl AdapterError {
    /// Whether retrying the same request may succeed
    ///
    /// Network failures, rate limiting and 5xx responses are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            AdapterError::Network(_) | AdapterError::RateLimited { .. } => true,
            AdapterError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Json(err.to_string())
    }
}

impl From<ureq::Error> for AdapterError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(401, _) | ureq::Error::Status(403, _) => {
                AdapterError::Authentication("Invalid API key".to_string())
            }
            ureq::Error::Status(429, response) => AdapterError::RateLimited {
                retry_after: response
                    .header("retry-after")
                    .map(|s| format!(" (retry after {}s)", s))
                    .unwrap_or_default(),
            },
            ureq::Error::Status(code, response) => AdapterError::Http {
                status: code,
                message: response
                    .into_string()
                    .unwrap_or_else(|_| format!("HTTP {}", code)),
            },
            ureq::Error::Transport(err) => AdapterError::Network(err.to_string()),
        }
    }
}

/// Synchronous HTTP transport
///
/// Abstraction over HTTP client to enable testing with FakeTransport.
pub trait SyncTransport: Send + Sync {
    /// POST JSON request and return response body
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError>;
}
