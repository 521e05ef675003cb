//! BuildSense Knowledge Module
//!
//! Vector-similarity retrieval over a corpus of known build-failure solutions.
//!
//! The module is split along the seams where external services plug in:
//! - [`Embedder`] turns text into a fixed-length vector
//! - [`VectorStore`] holds embedded documents and answers nearest-neighbour queries
//! - [`KnowledgeBase`] is the deterministic glue (ids, digests, similarity, ranks)
//!
//! Embedding and store failures are never swallowed here. A retrieval that
//! cannot run is an error for the caller, not an empty result.

pub mod embedder;
pub mod error;
pub mod knowledge_base;
pub mod seed;
pub mod store;
pub mod types;

pub use embedder::{Embedder, HashingEmbedder, DEFAULT_DIMENSION};
pub use error::{KnowledgeError, Result};
pub use knowledge_base::{content_digest, KnowledgeBase, CONTENT_HASH_KEY, DOC_ID_PREFIX};
pub use seed::{seed_documents, seed_if_empty, SeedDocument};
pub use store::{Include, LocalCollection, MemoryCollection, VectorStore};
pub use types::{KnowledgeHit, Metadata, QueryResult, StoredDocument};
