//! LLM Adapters
//!
//! Provider-agnostic interface for chat-completion and embedding HTTP APIs.
//! Supports any OpenAI-compatible endpoint (OpenAI, DeepSeek, ...) plus an
//! offline stub.

pub mod embeddings;
pub mod factory;
pub mod openai;
pub mod openai_parse;
pub mod retry;
pub mod stub;
pub mod transport;
pub mod transport_fake;
pub mod transport_types;
pub mod transport_ureq;

// Re-export common types
pub use embeddings::OpenAiEmbedder;
pub use factory::{create_adapter, resolve_env_var};
pub use retry::RetryPolicy;
pub use transport::{AdapterError, SyncTransport};

/// LLM message role (universal subset across providers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmRole {
    /// System message (sets behavior/context)
    System,
    /// User message (human input)
    User,
}

impl LlmRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::System => "system",
            LlmRole::User => "user",
        }
    }
}

/// Single LLM message (provider-agnostic)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmMessage {
    /// Message role
    pub role: LlmRole,
    /// Message content
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }
}

/// One chat-completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<LlmMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask the provider for a JSON object (`response_format`)
    pub json_response: bool,
}

/// LLM adapter trait
///
/// All providers implement this trait.
/// The pipeline calls adapters through this uniform interface.
pub trait LlmAdapter: Send + Sync {
    /// Run a chat completion and return the first choice's content
    fn complete(&self, request: &ChatRequest) -> Result<String, AdapterError>;

    /// Get provider name for logging
    fn provider_name(&self) -> &str;
}

impl<A: LlmAdapter + ?Sized> LlmAdapter for &A {
    fn complete(&self, request: &ChatRequest) -> Result<String, AdapterError> {
        (**self).complete(request)
    }

    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }
}

/// Adapter enum: concrete type for all providers
///
/// Wraps all adapter types, implementing LlmAdapter via delegation, so the
/// provider can be picked from configuration at runtime.
#[derive(Debug)]
pub enum Adapter {
    OpenAi(openai::OpenAiAdapter),
    Stub(stub::StubAdapter),
}

impl LlmAdapter for Adapter {
    fn complete(&self, request: &ChatRequest) -> Result<String, AdapterError> {
        match self {
            Adapter::OpenAi(a) => a.complete(request),
            Adapter::Stub(a) => a.complete(request),
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            Adapter::OpenAi(a) => a.provider_name(),
            Adapter::Stub(a) => a.provider_name(),
        }
    }
}
