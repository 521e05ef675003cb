//! Fake transport for testing
//!
//! Uses fixture strings instead of real HTTP calls. Outcomes can be scripted
//! per call; every request is recorded for assertions.

use crate::llm::adapters::transport_types::{AdapterError, SyncTransport};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Request seen by a [`FakeTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Fake transport for testing (uses fixture strings)
///
/// Scripted outcomes are consumed first, one per call; once exhausted every
/// call returns the fixture response (or the fixture error, if set).
#[derive(Debug)]
pub struct FakeTransport {
    /// Response body to return
    pub response_body: String,
    /// Error message to return (if set)
    pub error_message: Option<String>,
    script: Mutex<VecDeque<Result<String, AdapterError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    /// Create fake transport with given response
    pub fn new(response: &str) -> Self {
        Self {
            response_body: response.to_string(),
            error_message: None,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create fake transport that returns a network error
    pub fn with_error(msg: &str) -> Self {
        Self {
            error_message: Some(msg.to_string()),
            ..Self::new("")
        }
    }

    /// Create fake transport that plays `outcomes` in order
    pub fn scripted(outcomes: Vec<Result<String, AdapterError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            ..Self::new("")
        }
    }

    /// Wrap `content` in a chat completion response body
    pub fn chat_completion(content: &str) -> Self {
        Self::new(&chat_completion_body(content))
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    fn next_scripted(&self) -> Option<Result<String, AdapterError>> {
        match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}

/// Minimal OpenAI-style chat completion body carrying `content`
pub fn chat_completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

impl SyncTransport for FakeTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError> {
        let recorded = RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        };
        match self.requests.lock() {
            Ok(mut requests) => requests.push(recorded),
            Err(poisoned) => poisoned.into_inner().push(recorded),
        }

        if let Some(outcome) = self.next_scripted() {
            return outcome;
        }
        if let Some(ref msg) = self.error_message {
            return Err(AdapterError::Network(msg.clone()));
        }
        Ok(self.response_body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_transport_basic() {
        let transport = FakeTransport::new("test response");
        let result = transport.post_json("http://test", &[], "{}");
        assert_eq!(result.unwrap(), "test response");
    }

    #[test]
    fn test_fake_transport_with_error() {
        let transport = FakeTransport::with_error("connection refused");
        let result = transport.post_json("http://test", &[], "{}");
        assert_eq!(
            result.unwrap_err(),
            AdapterError::Network("connection refused".to_string())
        );
    }

    #[test]
    fn test_scripted_outcomes_then_fixture() {
        let transport = FakeTransport::scripted(vec![
            Err(AdapterError::Http {
                status: 502,
                message: "bad gateway".to_string(),
            }),
            Ok("second".to_string()),
        ]);
        assert!(transport.post_json("http://test", &[], "{}").is_err());
        assert_eq!(transport.post_json("http://test", &[], "{}").unwrap(), "second");
        assert_eq!(transport.post_json("http://test", &[], "{}").unwrap(), "");
    }

    #[test]
    fn test_requests_recorded() {
        let transport = FakeTransport::new("ok");
        transport
            .post_json("http://test/a", &[("Authorization", "Bearer k")], "{\"x\":1}")
            .unwrap();
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://test/a");
        assert_eq!(requests[0].headers[0].1, "Bearer k");
        assert_eq!(requests[0].body, "{\"x\":1}");
    }

    #[test]
    fn test_chat_completion_fixture() {
        let body = chat_completion_body("{\"error_summary\":\"x\"}");
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["choices"][0]["message"]["content"], "{\"error_summary\":\"x\"}");
    }
}
