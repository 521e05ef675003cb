//! LLM Integration: adapter layer + analysis invoker
//!
//! - `adapters`: provider-agnostic chat/embedding clients over blocking HTTP
//! - `invoker`: the pipeline's single model call, with degraded fallback

pub mod adapters;
pub mod invoker;

// Re-export main types
pub use adapters::{
    create_adapter, Adapter, AdapterError, ChatRequest, LlmAdapter, LlmMessage, LlmRole,
    OpenAiEmbedder, RetryPolicy,
};
pub use invoker::{degraded_analysis, AnalysisInvoker, Invocation, DEGRADED_SUMMARY};
