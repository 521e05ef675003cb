//! Bootstrap
//!
//! Ensures the home layout exists and builds the collaborators commands need.
//!
//! ## What Bootstrap Does
//!
//! - Creates the home, knowledge, logs and reports directories
//! - Opens the configured knowledge collection
//! - Seeds built-in knowledge when the collection is empty (analysis only)
//! - Refuses to build an analyzer when the provider needs an API key and
//!   none is configured
//!
//! ## What Bootstrap Does NOT Do
//!
//! - Write config.toml (defaults apply when it is missing)
//! - Contact the LLM provider

use crate::analysis::Analyzer;
use crate::cli::{Error, Result};
use crate::config::Settings;
use crate::llm::adapters::embeddings::ConfiguredEmbedder;
use crate::llm::adapters::factory::create_embedder;
use crate::llm::{create_adapter, Adapter, AnalysisInvoker};
use crate::records::RecordStore;
use buildsense_knowledge::{seed_if_empty, KnowledgeBase, LocalCollection};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Knowledge base as opened by the CLI
pub type LocalKnowledgeBase = KnowledgeBase<ConfiguredEmbedder, LocalCollection>;

/// Analyzer as built by the CLI
pub type CliAnalyzer = Analyzer<ConfiguredEmbedder, LocalCollection, Adapter>;

/// Bootstrap status result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapStatus {
    /// Directories that did not exist before
    pub created: Vec<PathBuf>,
}

impl BootstrapStatus {
    /// True when nothing had to be created
    pub fn was_ready(&self) -> bool {
        self.created.is_empty()
    }
}

/// Ensure the home directory layout exists
pub fn ensure_infrastructure(home: &Path, settings: &Settings) -> Result<BootstrapStatus> {
    let mut status = BootstrapStatus::default();
    for dir in [
        home.to_path_buf(),
        settings.knowledge_dir(home),
        settings.logs_dir(home),
        settings.reports_dir(home),
    ] {
        if dir.is_dir() {
            continue;
        }
        fs::create_dir_all(&dir).map_err(|e| {
            Error::Bootstrap(format!("cannot create directory {}: {}", dir.display(), e))
        })?;
        info!("Created directory {}", dir.display());
        status.created.push(dir);
    }
    Ok(status)
}

/// Open the configured knowledge collection with the configured embedder
pub fn open_knowledge_base(home: &Path, settings: &Settings) -> Result<LocalKnowledgeBase> {
    let embedder = create_embedder(&settings.knowledge.embedder, &settings.llm)?;
    let collection =
        LocalCollection::open(settings.knowledge_dir(home), &settings.knowledge.collection)?;
    debug!("Knowledge collection at {}", collection.path().display());
    Ok(KnowledgeBase::new(embedder, collection))
}

/// Build the analyzer: adapter, seeded knowledge base, record store
pub fn build_analyzer(home: &Path, settings: &Settings) -> Result<CliAnalyzer> {
    let adapter = create_adapter(&settings.llm)
        .map_err(|e| Error::Bootstrap(format!("cannot run analysis: {}", e)))?;

    let mut knowledge = open_knowledge_base(home, settings)?;
    let seeded = seed_if_empty(&mut knowledge)?;
    if seeded > 0 {
        info!("Seeded knowledge base with {} documents", seeded);
    }

    let records = RecordStore::create(settings.reports_dir(home))?;
    let invoker = AnalysisInvoker::from_settings(adapter, &settings.llm);
    let analyzer = Analyzer::new(knowledge, invoker, records)
        .map_err(|e| Error::Bootstrap(e.to_string()))?
        .with_top_k(settings.knowledge.top_k);
    Ok(analyzer)
}
