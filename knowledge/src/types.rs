//! Knowledge data types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document metadata (string keys to string values)
pub type Metadata = BTreeMap<String, String>;

/// One retrieved knowledge document
///
/// Hits are returned in store order: `rank` starts at 1 and the first hit is
/// the closest neighbour the store found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeHit {
    pub content: String,
    pub metadata: Metadata,
    /// `1 - distance`; not clamped, so non-cosine stores may leave [0, 1]
    pub similarity: f64,
    pub rank: usize,
}

/// Document as held by a vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

/// Batched nearest-neighbour answer
///
/// Each field is a list of lists: outer index is the query in the batch,
/// inner index is the neighbour, closest first. Fields that were not
/// requested through [`crate::Include`] are left empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<Metadata>>,
    pub distances: Vec<Vec<f64>>,
}
