//! Knowledge retriever
//!
//! Deterministic glue around an [`Embedder`] and a [`VectorStore`]:
//! - document ids are `doc_` + the first 16 hex chars of the content's SHA-256
//! - similarity is `1 - distance`, passed through without clamping
//! - hits are ranked from 1 in the order the store returned them

use crate::embedder::Embedder;
use crate::error::{KnowledgeError, Result};
use crate::store::{Include, VectorStore};
use crate::types::{KnowledgeHit, Metadata};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Prefix of every generated document id
pub const DOC_ID_PREFIX: &str = "doc_";

/// Metadata key holding the content digest
pub const CONTENT_HASH_KEY: &str = "content_hash";

const DIGEST_HEX_LEN: usize = 16;

/// First 16 hex characters of SHA-256(content)
pub fn content_digest(content: &str) -> String {
    let digest = hex::encode(Sha256::digest(content.as_bytes()));
    digest[..DIGEST_HEX_LEN].to_string()
}

/// Knowledge base over an embedder and a vector store
#[derive(Debug)]
pub struct KnowledgeBase<E, S> {
    embedder: E,
    store: S,
}

impl<E: Embedder, S: VectorStore> KnowledgeBase<E, S> {
    pub fn new(embedder: E, store: S) -> Self {
        Self { embedder, store }
    }

    /// Embed and store a document, returning its id
    ///
    /// Identical content always maps to the same id; whether a second
    /// ingestion replaces, duplicates or is ignored is up to the store.
    pub fn ingest(&mut self, content: &str, metadata: Metadata) -> Result<String> {
        let digest = content_digest(content);
        let id = format!("{}{}", DOC_ID_PREFIX, digest);

        let embedding = self.embedder.encode(content)?;

        let mut full_metadata = metadata;
        full_metadata.insert(CONTENT_HASH_KEY.to_string(), digest);

        self.store.add(
            vec![id.clone()],
            vec![embedding],
            vec![content.to_string()],
            vec![full_metadata],
        )?;

        info!("Document added: {}", id);
        Ok(id)
    }

    /// Find the `top_k` documents closest to `query`
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<KnowledgeHit>> {
        if top_k == 0 {
            return Err(KnowledgeError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }

        let query_embedding = self.embedder.encode(query)?;
        let result = self.store.query(
            &[query_embedding],
            top_k,
            &[Include::Documents, Include::Metadatas, Include::Distances],
        )?;

        let documents = result.documents.into_iter().next().unwrap_or_default();
        let mut metadatas = result
            .metadatas
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter();
        let mut distances = result
            .distances
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter();

        let mut hits = Vec::with_capacity(documents.len());
        for (i, content) in documents.into_iter().enumerate() {
            let distance = distances.next().ok_or_else(|| {
                KnowledgeError::Store(format!("missing distance for neighbour {}", i))
            })?;
            hits.push(KnowledgeHit {
                content,
                metadata: metadatas.next().unwrap_or_default(),
                similarity: 1.0 - distance,
                rank: i + 1,
            });
        }

        debug!("Search '{}' returned {} hits", query, hits.len());
        Ok(hits)
    }

    /// Number of stored documents
    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashingEmbedder;
    use crate::store::MemoryCollection;
    use crate::types::QueryResult;

    #[test]
    fn test_content_digest_is_16_hex() {
        let digest = content_digest("npm cache clean --force");
        assert_eq!(digest.len(), 16);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, content_digest("npm cache clean --force"));
        assert_ne!(digest, content_digest("npm cache verify"));
    }

    #[test]
    fn test_ingest_id_and_metadata() {
        let mut kb = KnowledgeBase::new(HashingEmbedder::new(32).unwrap(), MemoryCollection::new());
        let mut meta = Metadata::new();
        meta.insert("source".to_string(), "manual".to_string());

        let id = kb.ingest("Docker permission denied fix", meta).unwrap();
        assert_eq!(id, format!("doc_{}", content_digest("Docker permission denied fix")));

        let stored = &kb.store().documents()[0];
        assert_eq!(stored.metadata["source"], "manual");
        assert_eq!(
            stored.metadata[CONTENT_HASH_KEY],
            content_digest("Docker permission denied fix")
        );
    }

    #[test]
    fn test_reingest_same_id() {
        let mut kb = KnowledgeBase::new(HashingEmbedder::new(32).unwrap(), MemoryCollection::new());
        let a = kb.ingest("same content", Metadata::new()).unwrap();
        let b = kb.ingest("same content", Metadata::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(kb.count().unwrap(), 1);
    }

    #[test]
    fn test_search_zero_top_k_rejected() {
        let kb = KnowledgeBase::new(HashingEmbedder::new(32).unwrap(), MemoryCollection::new());
        assert!(matches!(
            kb.search("anything", 0),
            Err(KnowledgeError::InvalidArgument(_))
        ));
    }

    struct FixedDistances(Vec<f64>);

    impl VectorStore for FixedDistances {
        fn add(
            &mut self,
            _ids: Vec<String>,
            _embeddings: Vec<Vec<f32>>,
            _documents: Vec<String>,
            _metadatas: Vec<Metadata>,
        ) -> Result<()> {
            Ok(())
        }

        fn query(
            &self,
            _embeddings: &[Vec<f32>],
            n_results: usize,
            _include: &[Include],
        ) -> Result<QueryResult> {
            let n = n_results.min(self.0.len());
            Ok(QueryResult {
                ids: vec![(0..n).map(|i| format!("id{}", i)).collect()],
                documents: vec![(0..n).map(|i| format!("doc {}", i)).collect()],
                metadatas: vec![vec![Metadata::new(); n]],
                distances: vec![self.0[..n].to_vec()],
            })
        }

        fn count(&self) -> Result<usize> {
            Ok(self.0.len())
        }
    }

    #[test]
    fn test_search_similarity_and_rank() {
        let kb = KnowledgeBase::new(
            HashingEmbedder::new(8).unwrap(),
            FixedDistances(vec![0.1, 0.25, 1.5]),
        );
        let hits = kb.search("query", 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!((hits[0].similarity - 0.9).abs() < 1e-9);
        assert!((hits[1].similarity - 0.75).abs() < 1e-9);
        // Out-of-range distances pass through uncapped
        assert!((hits[2].similarity + 0.5).abs() < 1e-9);
    }

    struct BrokenStore;

    impl VectorStore for BrokenStore {
        fn add(
            &mut self,
            _ids: Vec<String>,
            _embeddings: Vec<Vec<f32>>,
            _documents: Vec<String>,
            _metadatas: Vec<Metadata>,
        ) -> Result<()> {
            Err(KnowledgeError::Store("disk unavailable".to_string()))
        }

        fn query(
            &self,
            _embeddings: &[Vec<f32>],
            _n_results: usize,
            _include: &[Include],
        ) -> Result<QueryResult> {
            Err(KnowledgeError::Store("index unavailable".to_string()))
        }

        fn count(&self) -> Result<usize> {
            Err(KnowledgeError::Store("index unavailable".to_string()))
        }
    }

    #[test]
    fn test_store_failures_propagate() {
        let mut kb = KnowledgeBase::new(HashingEmbedder::new(8).unwrap(), BrokenStore);
        assert!(matches!(kb.search("q", 3), Err(KnowledgeError::Store(_))));
        assert!(matches!(
            kb.ingest("doc", Metadata::new()),
            Err(KnowledgeError::Store(_))
        ));
        assert!(kb.count().is_err());
    }
}
