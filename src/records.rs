//! Record Store
//!
//! Persists a projection of every analysis as one pretty-printed JSON file:
//! `<reports_dir>/analysis_YYYYMMDD_HHMMSS.json`.
//!
//! The name has second resolution, taken from the result's `analyzed_at`.
//! Two analyses finishing within the same second write the same file and the
//! later one wins.

use crate::analysis::types::{AnalysisCategory, AnalysisResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const RECORD_PREFIX: &str = "analysis_";
const RECORD_EXTENSION: &str = "json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Record store errors
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Failed to write record {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read record {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// Persisted projection of an [`AnalysisResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub log_source: String,
    pub analyzed_at: NaiveDateTime,
    pub error_summary: String,
    pub error_type: AnalysisCategory,
    pub confidence: f64,
}

impl AnalysisRecord {
    pub fn from_result(result: &AnalysisResult, log_source: &str) -> Self {
        Self {
            log_source: log_source.to_string(),
            analyzed_at: result.analyzed_at,
            error_summary: result.error_summary.clone(),
            error_type: result.error_type,
            confidence: result.confidence,
        }
    }
}

/// File name of the record for an analysis finished at `analyzed_at`
pub fn record_file_name(analyzed_at: &NaiveDateTime) -> String {
    format!(
        "{}{}.{}",
        RECORD_PREFIX,
        analyzed_at.format(TIMESTAMP_FORMAT),
        RECORD_EXTENSION
    )
}

/// Directory of analysis records
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Store over an existing directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store over `dir`, creating it if missing
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| RecordError::Write {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the record for `result`, returning its path
    pub fn persist(&self, result: &AnalysisResult, log_source: &str) -> Result<PathBuf> {
        let record = AnalysisRecord::from_result(result, log_source);
        let path = self.dir.join(record_file_name(&result.analyzed_at));
        let json = serde_json::to_string_pretty(&record)?;

        fs::write(&path, json).map_err(|source| RecordError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Analysis record saved: {}", path.display());
        Ok(path)
    }

    /// Record files, sorted by name (oldest first)
    ///
    /// A missing directory has no records.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RecordError::Read {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RecordError::Read {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if is_record_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Read one record back
    pub fn load(&self, path: &Path) -> Result<AnalysisRecord> {
        let content = fs::read_to_string(path).map_err(|source| RecordError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn is_record_file(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };
    path.is_file()
        && name.starts_with(RECORD_PREFIX)
        && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
}
