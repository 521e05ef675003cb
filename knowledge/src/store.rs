//! Vector stores
//!
//! [`VectorStore`] mirrors the add / query / count surface of a document
//! collection. Two implementations share one exact-search engine:
//! - [`MemoryCollection`]: process-local, nothing persisted
//! - [`LocalCollection`]: same engine, persisted as one JSON file per collection
//!
//! Distances are cosine distances (`1 - cos`), so `1 - distance` is the cosine
//! similarity of the pair.

use crate::error::{KnowledgeError, Result};
use crate::types::{Metadata, QueryResult, StoredDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fields to fill in a [`QueryResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Include {
    Documents,
    Metadatas,
    Distances,
}

/// Document collection with nearest-neighbour search
pub trait VectorStore: Send + Sync {
    /// Add documents; all four vectors must have the same length
    fn add(
        &mut self,
        ids: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> Result<()>;

    /// Return up to `n_results` neighbours for every query embedding
    fn query(
        &self,
        embeddings: &[Vec<f32>],
        n_results: usize,
        include: &[Include],
    ) -> Result<QueryResult>;

    /// Number of stored documents
    fn count(&self) -> Result<usize>;
}

/// In-memory exact-search collection
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    documents: Vec<StoredDocument>,
    ids: HashSet<String>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_documents(documents: Vec<StoredDocument>) -> Self {
        let ids = documents.iter().map(|d| d.id.clone()).collect();
        Self { documents, ids }
    }

    /// Vector length of the collection (fixed by the first document)
    pub fn dimension(&self) -> Option<usize> {
        self.documents.first().map(|d| d.embedding.len())
    }

    /// Stored documents in insertion order
    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    /// Insert documents, skipping ids that already exist
    ///
    /// Returns the number of documents actually inserted.
    fn insert(
        &mut self,
        ids: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> Result<usize> {
        let len = ids.len();
        if embeddings.len() != len || documents.len() != len || metadatas.len() != len {
            return Err(KnowledgeError::InvalidArgument(format!(
                "add() needs equal lengths: ids={}, embeddings={}, documents={}, metadatas={}",
                len,
                embeddings.len(),
                documents.len(),
                metadatas.len()
            )));
        }

        let mut expected = self.dimension();
        for embedding in &embeddings {
            match expected {
                Some(dim) if dim != embedding.len() => {
                    return Err(KnowledgeError::InvalidDimension {
                        expected: dim,
                        actual: embedding.len(),
                    });
                }
                None => expected = Some(embedding.len()),
                _ => {}
            }
        }

        let mut inserted = 0;
        for (((id, embedding), content), metadata) in ids
            .into_iter()
            .zip(embeddings)
            .zip(documents)
            .zip(metadatas)
        {
            if !self.ids.insert(id.clone()) {
                warn!("Document {} already exists, skipping", id);
                continue;
            }
            self.documents.push(StoredDocument {
                id,
                content,
                embedding,
                metadata,
            });
            inserted += 1;
        }
        Ok(inserted)
    }
}

impl VectorStore for MemoryCollection {
    fn add(
        &mut self,
        ids: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> Result<()> {
        self.insert(ids, embeddings, documents, metadatas)?;
        Ok(())
    }

    fn query(
        &self,
        embeddings: &[Vec<f32>],
        n_results: usize,
        include: &[Include],
    ) -> Result<QueryResult> {
        let mut result = QueryResult::default();

        for query in embeddings {
            if let Some(dim) = self.dimension() {
                if dim != query.len() {
                    return Err(KnowledgeError::InvalidDimension {
                        expected: dim,
                        actual: query.len(),
                    });
                }
            }

            let mut scored: Vec<(f64, &StoredDocument)> = self
                .documents
                .iter()
                .map(|doc| (cosine_distance(query, &doc.embedding), doc))
                .collect();
            // Stable sort: equal distances keep insertion order
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            scored.truncate(n_results);

            result
                .ids
                .push(scored.iter().map(|(_, d)| d.id.clone()).collect());
            result.documents.push(if include.contains(&Include::Documents) {
                scored.iter().map(|(_, d)| d.content.clone()).collect()
            } else {
                Vec::new()
            });
            result.metadatas.push(if include.contains(&Include::Metadatas) {
                scored.iter().map(|(_, d)| d.metadata.clone()).collect()
            } else {
                Vec::new()
            });
            result.distances.push(if include.contains(&Include::Distances) {
                scored.iter().map(|(distance, _)| *distance).collect()
            } else {
                Vec::new()
            });
        }

        debug!(
            "Queried {} embeddings against {} documents",
            embeddings.len(),
            self.documents.len()
        );
        Ok(result)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.documents.len())
    }
}

/// On-disk layout of a collection file
#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    documents: Vec<StoredDocument>,
}

/// JSON-file-backed collection
///
/// Stored at `<dir>/<name>.json`. The file is rewritten after every `add`
/// through a temporary file in the same directory and an atomic rename.
#[derive(Debug)]
pub struct LocalCollection {
    name: String,
    path: PathBuf,
    inner: MemoryCollection,
}

impl LocalCollection {
    /// Open collection `name` under `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", name));

        let inner = if path.exists() {
            let data = fs::read_to_string(&path)?;
            let file: CollectionFile = serde_json::from_str(&data)?;
            info!(
                "Loaded collection '{}' with {} documents",
                name,
                file.documents.len()
            );
            MemoryCollection::from_documents(file.documents)
        } else {
            info!("Created new collection '{}' at {:?}", name, path);
            MemoryCollection::new()
        };

        Ok(Self {
            name: name.to_string(),
            path,
            inner,
        })
    }

    /// Collection file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored documents in insertion order
    pub fn documents(&self) -> &[StoredDocument] {
        self.inner.documents()
    }

    fn save(&self) -> Result<()> {
        let file = CollectionFile {
            name: self.name.clone(),
            documents: self.inner.documents().to_vec(),
        };
        let data = serde_json::to_string_pretty(&file)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Saved collection '{}' to {:?}", self.name, self.path);
        Ok(())
    }
}

impl VectorStore for LocalCollection {
    fn add(
        &mut self,
        ids: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> Result<()> {
        let inserted = self.inner.insert(ids, embeddings, documents, metadatas)?;
        if inserted > 0 {
            self.save()?;
        }
        Ok(())
    }

    fn query(
        &self,
        embeddings: &[Vec<f32>],
        n_results: usize,
        include: &[Include],
    ) -> Result<QueryResult> {
        self.inner.query(embeddings, n_results, include)
    }

    fn count(&self) -> Result<usize> {
        self.inner.count()
    }
}

/// Cosine distance; a zero vector is at distance 1 from everything
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}
