//! BuildSense: build-failure log diagnosis
//!
//! Extracts error snippets from a build log, retrieves similar known
//! solutions from a vector knowledge base, asks an LLM for a structured
//! diagnosis and persists a record of every analysis.
//!
//! The library entry points are [`analysis::Analyzer::analyze`] and
//! [`analysis::Analyzer::diagnose`].

pub mod analysis;
pub mod cli;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod records;

// Re-export the pipeline surface
pub use analysis::{
    AnalysisCategory, AnalysisResult, AnalyzeError, Analyzer, ErrorCategory, ErrorSnippet,
    FixStep, KnowledgeReference, PatternMatcher, RawAnalysis,
};
pub use config::{ConfigError, Settings};
pub use llm::{Adapter, AdapterError, AnalysisInvoker, Invocation, LlmAdapter};
pub use records::{AnalysisRecord, RecordError, RecordStore};

// Re-export the knowledge crate
pub use buildsense_knowledge as knowledge;
