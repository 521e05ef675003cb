//! Stub Adapter
//!
//! Offline adapter that returns canned responses without network calls.
//! Used for integration tests and when no model endpoint is configured.

use crate::llm::adapters::{AdapterError, ChatRequest, LlmAdapter};

/// Stub adapter (returns canned responses)
#[derive(Debug, Clone)]
pub struct StubAdapter {
    /// Response returned for JSON requests
    response: String,
    /// Response returned for free-text requests
    text_response: String,
}

impl StubAdapter {
    /// Create new stub adapter with default canned responses
    pub fn new() -> Self {
        Self {
            response: Self::default_response(),
            text_response: Self::default_text_response(),
        }
    }

    /// Create stub adapter that returns `response` for every request
    pub fn with_response(response: String) -> Self {
        Self {
            text_response: response.clone(),
            response,
        }
    }

    /// Default canned analysis
    fn default_response() -> String {
        serde_json::json!({
            "error_summary": "Offline analysis: no model endpoint configured",
            "error_type": "other",
            "root_cause": "The stub provider does not inspect the log. Configure [llm] provider = \"openai\" for a real diagnosis.",
            "confidence": 0.3,
            "fix_steps": [
                {"step": 1, "action": "Review the extracted error snippets", "command": ""}
            ],
            "verification": "Re-run the build",
            "prevention": ""
        })
        .to_string()
    }

    /// Default canned knowledge document
    fn default_text_response() -> String {
        "Problem: build failure (offline summary)\nSolution:\n1. Review the extracted error snippets\nVerification: re-run the build\nCaveats: generated without a model".to_string()
    }
}

impl Default for StubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmAdapter for StubAdapter {
    fn complete(&self, request: &ChatRequest) -> Result<String, AdapterError> {
        if request.json_response {
            Ok(self.response.clone())
        } else {
            Ok(self.text_response.clone())
        }
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}
