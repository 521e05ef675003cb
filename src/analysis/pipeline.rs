//! Analysis pipeline
//!
//! One synchronous pass per log:
//!
//! ```text
//! extract snippets → build query → retrieve → render prompt
//!   → invoke model → enhance → persist record
//! ```
//!
//! Retrieval and persistence failures are returned to the caller. A failed
//! model call is not an error: the result comes back degraded.

use crate::analysis::enhance::enhance;
use crate::analysis::patterns::PatternMatcher;
use crate::analysis::query::build_query;
use crate::analysis::types::AnalysisResult;
use crate::config::LogsSettings;
use crate::llm::adapters::LlmAdapter;
use crate::llm::invoker::{AnalysisInvoker, Invocation};
use crate::prompts::{render_analysis_prompt, render_knowledge_summary_prompt};
use crate::records::{RecordError, RecordStore};
use buildsense_knowledge::{Embedder, KnowledgeBase, KnowledgeError, Metadata, VectorStore};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default number of knowledge hits per analysis
pub const DEFAULT_TOP_K: usize = 3;

/// Metadata `source` of documents learned from analyses
pub const LEARNED_SOURCE: &str = "analysis";

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    /// Pattern table failed to compile
    #[error("Pattern table error: {0}")]
    Patterns(#[from] regex::Error),

    /// Embedding or vector store failure
    #[error("Knowledge retrieval failed: {0}")]
    Retrieval(#[from] KnowledgeError),

    /// Record could not be written; the computed result is kept
    #[error("Failed to persist analysis record: {source}")]
    Persistence {
        result: Box<AnalysisResult>,
        #[source]
        source: RecordError,
    },

    /// Log file could not be read
    #[error("Failed to read log {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;

/// Outcome for one file of a batch scan
#[derive(Debug)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub outcome: Result<AnalysisResult>,
}

/// Build-log analyzer
///
/// Owns the injected collaborators; construct once and reuse across logs.
#[derive(Debug)]
pub struct Analyzer<E, S, A> {
    matcher: PatternMatcher,
    knowledge: KnowledgeBase<E, S>,
    invoker: AnalysisInvoker<A>,
    records: RecordStore,
    top_k: usize,
}

impl<E: Embedder, S: VectorStore, A: LlmAdapter> Analyzer<E, S, A> {
    pub fn new(
        knowledge: KnowledgeBase<E, S>,
        invoker: AnalysisInvoker<A>,
        records: RecordStore,
    ) -> Result<Self> {
        Ok(Self {
            matcher: PatternMatcher::new()?,
            knowledge,
            invoker,
            records,
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Number of knowledge hits requested per analysis (at least 1)
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase<E, S> {
        &self.knowledge
    }

    pub fn knowledge_mut(&mut self) -> &mut KnowledgeBase<E, S> {
        &mut self.knowledge
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn invoker(&self) -> &AnalysisInvoker<A> {
        &self.invoker
    }

    /// Analyze a log and persist its record
    pub fn analyze(&self, log: &str, log_source: &str) -> Result<AnalysisResult> {
        self.analyze_at(log, log_source, Local::now().naive_local())
    }

    /// [`Analyzer::analyze`] with an explicit timestamp
    pub fn analyze_at(
        &self,
        log: &str,
        log_source: &str,
        analyzed_at: NaiveDateTime,
    ) -> Result<AnalysisResult> {
        info!("Analyzing build log: {}", log_source);
        let result = self.diagnose_at(log, analyzed_at)?;

        match self.records.persist(&result, log_source) {
            Ok(_) => Ok(result),
            Err(source) => Err(AnalyzeError::Persistence {
                result: Box::new(result),
                source,
            }),
        }
    }

    /// Analyze a log without persisting a record
    pub fn diagnose(&self, log: &str) -> Result<AnalysisResult> {
        self.diagnose_at(log, Local::now().naive_local())
    }

    /// [`Analyzer::diagnose`] with an explicit timestamp
    pub fn diagnose_at(&self, log: &str, analyzed_at: NaiveDateTime) -> Result<AnalysisResult> {
        let snippets = self.matcher.extract(log);
        info!("Extracted {} error snippets", snippets.len());

        let query = build_query(&snippets);
        debug!("Retrieval query: {}", query);
        let hits = self.knowledge.search(&query, self.top_k)?;
        info!("Retrieved {} knowledge hits", hits.len());

        let prompt = render_analysis_prompt(log, &hits);
        let invocation = self.invoker.invoke(&prompt);
        let degraded = invocation.is_degraded();
        if let Invocation::Degraded { reason, .. } = &invocation {
            warn!("Model analysis degraded: {}", reason);
        }

        let mut result = enhance(invocation.into_analysis(), snippets, &hits, analyzed_at);
        result.degraded = degraded;
        info!(
            "Analysis complete: type={}, confidence={:.2}",
            result.error_type, result.confidence
        );
        Ok(result)
    }

    /// Condense a finished analysis into a knowledge document and ingest it
    ///
    /// Returns the new document id, or `None` when the result is degraded, the
    /// model call fails, or the model returns nothing.
    pub fn learn(&mut self, result: &AnalysisResult) -> Result<Option<String>> {
        if result.is_degraded() {
            debug!("Not learning from a degraded analysis");
            return Ok(None);
        }

        let prompt = render_knowledge_summary_prompt(result);
        let document = match self.invoker.complete_text(&prompt) {
            Ok(text) => text,
            Err(e) => {
                warn!("Knowledge summary failed, nothing learned: {}", e);
                return Ok(None);
            }
        };
        let document = document.trim();
        if document.is_empty() {
            debug!("Model returned an empty knowledge summary");
            return Ok(None);
        }

        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), LEARNED_SOURCE.to_string());
        metadata.insert("error_type".to_string(), result.error_type.to_string());
        let id = self.knowledge.ingest(document, metadata)?;
        info!("Learned knowledge document {}", id);
        Ok(Some(id))
    }

    /// Analyze every supported log file in `dir`, sorted by file name
    ///
    /// Each file is analyzed independently with its file name as the log
    /// source; per-file failures are reported in its [`ScanEntry`].
    pub fn scan(&self, dir: &Path, logs: &LogsSettings) -> Result<Vec<ScanEntry>> {
        let input_error = |source| AnalyzeError::Input {
            path: dir.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(input_error)? {
            let path = entry.map_err(input_error)?.path();
            if path.is_file() && logs.is_supported(&path) {
                files.push(path);
            }
        }
        files.sort();
        info!("Scanning {} log files in {}", files.len(), dir.display());

        Ok(files
            .into_iter()
            .map(|path| {
                let outcome = self.analyze_file(&path);
                ScanEntry { path, outcome }
            })
            .collect())
    }

    /// Analyze one log file, named by its file name
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisResult> {
        let bytes = fs::read(path).map_err(|source| AnalyzeError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        let log = String::from_utf8_lossy(&bytes);
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.analyze(&log, &source)
    }
}
