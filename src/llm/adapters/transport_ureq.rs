//! Real HTTP transport using ureq
//!
//! Synchronous blocking HTTP client for the chat and embedding adapters.

use crate::llm::adapters::transport_types::{AdapterError, SyncTransport};
use std::time::Duration;
use tracing::debug;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Real HTTP transport using ureq
#[derive(Debug)]
pub struct UreqTransport {
    /// Timeout in seconds for requests
    timeout: u64,
}

impl UreqTransport {
    /// Create new transport with default timeout (60s)
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create transport with custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            timeout: timeout_secs,
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTransport for UreqTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError> {
        debug!(
            "POST {} (timeout={}s, body_len={})",
            url,
            self.timeout,
            body.len()
        );
        let mut request = ureq::request("POST", url).timeout(Duration::from_secs(self.timeout));

        for (key, value) in headers {
            request = request.set(key, value);
        }

        // ureq reports every status >= 400 as ureq::Error::Status
        let response = request.send_string(body)?;
        debug!("Response status={}", response.status());

        Ok(response.into_string()?)
    }
}
