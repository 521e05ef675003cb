//! OpenAI Adapter
//!
//! OpenAI-compatible chat-completion adapter (`POST {base_url}/chat/completions`).
//! Works against OpenAI, DeepSeek and any other compatible endpoint.

use crate::llm::adapters::retry::RetryPolicy;
use crate::llm::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::llm::adapters::{AdapterError, ChatRequest, LlmAdapter};
use serde_json::Value as JsonValue;
use tracing::debug;

// Public parsing module (re-exported for testing)
pub use crate::llm::adapters::openai_parse::parse_chat_completion;

/// OpenAI-compatible adapter
#[derive(Debug)]
pub struct OpenAiAdapter {
    /// Base URL (e.g., https://api.deepseek.com)
    base_url: String,
    /// Model name (e.g., deepseek-chat)
    model: String,
    /// API key
    api_key: String,
    /// HTTP transport
    transport: Transport,
    /// Retry policy for transient failures
    retry: RetryPolicy,
}

impl OpenAiAdapter {
    /// Create new OpenAI adapter
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self::with_transport(
            base_url,
            model,
            api_key,
            Transport::Real(UreqTransport::new()),
        )
    }

    /// Create adapter with custom transport (for testing)
    pub fn with_transport(
        base_url: String,
        model: String,
        api_key: String,
        transport: Transport,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            transport,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Chat completions endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build chat request body
    pub fn build_request(&self, request: &ChatRequest) -> String {
        let messages: Vec<JsonValue> = request
            .messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false
        });
        if request.json_response {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        body.to_string()
    }
}

impl LlmAdapter for OpenAiAdapter {
    fn complete(&self, request: &ChatRequest) -> Result<String, AdapterError> {
        let url = self.endpoint();
        let body = self.build_request(request);
        let auth = format!("Bearer {}", self.api_key);
        let headers = [
            ("Content-Type", "application/json"),
            ("Authorization", auth.as_str()),
        ];

        debug!(
            "Chat completion: model={}, messages={}",
            self.model,
            request.messages.len()
        );
        let response = self
            .retry
            .run(|| self.transport.post_json(&url, &headers, &body))?;
        parse_chat_completion(&response)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
