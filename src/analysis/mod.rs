//! Build-log analysis
//!
//! Deterministic stages (pattern matching, query synthesis, enhancement) plus
//! the [`Analyzer`] that chains them around retrieval and the model call.

pub mod enhance;
pub mod patterns;
pub mod pipeline;
pub mod query;
pub mod types;

pub use enhance::{enhance, DEFAULT_CONFIDENCE, MAX_CONFIDENCE_BOOST};
pub use patterns::{PatternMatcher, MAX_SNIPPETS};
pub use pipeline::{AnalyzeError, Analyzer, ScanEntry, DEFAULT_TOP_K, LEARNED_SOURCE};
pub use query::{build_query, FALLBACK_QUERY};
pub use types::{
    AnalysisCategory, AnalysisResult, ErrorCategory, ErrorSnippet, FixStep, KnowledgeReference,
    RawAnalysis,
};
