//! Analysis Invoker
//!
//! Sends the analysis prompt to the chat adapter and parses the JSON answer.
//!
//! The invoker never fails: adapter errors, malformed JSON and non-object
//! answers become [`Invocation::Degraded`] carrying a fallback analysis, so
//! the pipeline always produces a result. Any JSON object is `Parsed`;
//! mistyped fields inside it are read leniently by [`RawAnalysis`].

use crate::analysis::types::{AnalysisCategory, RawAnalysis};
use crate::config::LlmSettings;
use crate::llm::adapters::{AdapterError, ChatRequest, LlmAdapter, LlmMessage};
use crate::prompts::SYSTEM_PROMPT;
use serde_json::Value;
use tracing::{debug, warn};

/// `error_summary` of a degraded analysis
pub const DEGRADED_SUMMARY: &str = "analysis failed";

/// Outcome of one model call
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Model answered with parseable JSON
    Parsed(RawAnalysis),
    /// Model call or parsing failed; `analysis` is the fallback
    Degraded { analysis: RawAnalysis, reason: String },
}

impl Invocation {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Invocation::Degraded { .. })
    }

    pub fn analysis(&self) -> &RawAnalysis {
        match self {
            Invocation::Parsed(analysis) | Invocation::Degraded { analysis, .. } => analysis,
        }
    }

    pub fn into_analysis(self) -> RawAnalysis {
        match self {
            Invocation::Parsed(analysis) | Invocation::Degraded { analysis, .. } => analysis,
        }
    }
}

/// Why an invocation degraded
#[derive(Debug, thiserror::Error)]
enum InvocationFailure {
    #[error("{0}")]
    Adapter(#[from] AdapterError),
    #[error("model returned invalid analysis JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model returned a JSON {0} instead of an analysis object")]
    NotAnObject(&'static str),
}

/// Fallback analysis for a failed invocation
pub fn degraded_analysis(reason: &str) -> RawAnalysis {
    RawAnalysis {
        error_summary: DEGRADED_SUMMARY.to_string(),
        error_type: AnalysisCategory::Other,
        root_cause: format!("Error during analysis: {}", reason),
        confidence: Some(0.0),
        ..Default::default()
    }
}

/// Chat-completion caller for the analysis pipeline
#[derive(Debug)]
pub struct AnalysisInvoker<A> {
    adapter: A,
    temperature: f64,
    max_tokens: u32,
}

impl<A: LlmAdapter> AnalysisInvoker<A> {
    pub fn new(adapter: A, temperature: f64, max_tokens: u32) -> Self {
        Self {
            adapter,
            temperature,
            max_tokens,
        }
    }

    /// Sampling parameters from `[llm]`
    pub fn from_settings(adapter: A, settings: &LlmSettings) -> Self {
        Self::new(adapter, settings.temperature, settings.max_tokens)
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Request a JSON analysis for `prompt`
    pub fn invoke(&self, prompt: &str) -> Invocation {
        match self.try_invoke(prompt) {
            Ok(analysis) => {
                debug!(
                    "Model analysis parsed: type={}, confidence={:?}",
                    analysis.error_type, analysis.confidence
                );
                Invocation::Parsed(analysis)
            }
            Err(failure) => {
                let reason = failure.to_string();
                warn!(
                    "Analysis via {} failed, returning degraded result: {}",
                    self.adapter.provider_name(),
                    reason
                );
                Invocation::Degraded {
                    analysis: degraded_analysis(&reason),
                    reason,
                }
            }
        }
    }

    /// Request free text for `prompt` (no JSON mode)
    pub fn complete_text(&self, prompt: &str) -> Result<String, AdapterError> {
        self.adapter.complete(&self.request(prompt, false))
    }

    fn try_invoke(&self, prompt: &str) -> Result<RawAnalysis, InvocationFailure> {
        let content = self.adapter.complete(&self.request(prompt, true))?;
        let value: Value = serde_json::from_str(&content)?;
        match value {
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            Value::Array(_) => Err(InvocationFailure::NotAnObject("array")),
            Value::String(_) => Err(InvocationFailure::NotAnObject("string")),
            Value::Number(_) => Err(InvocationFailure::NotAnObject("number")),
            Value::Bool(_) => Err(InvocationFailure::NotAnObject("boolean")),
            Value::Null => Err(InvocationFailure::NotAnObject("null")),
        }
    }

    fn request(&self, prompt: &str, json_response: bool) -> ChatRequest {
        ChatRequest {
            messages: vec![LlmMessage::system(SYSTEM_PROMPT), LlmMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_response,
        }
    }
}
