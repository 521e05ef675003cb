//! Knowledge retrieval errors

/// Result type for knowledge operations
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Retrieval failures (embedding provider or vector store)
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// Embedding provider failed to encode text
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store rejected an operation
    #[error("Store error: {0}")]
    Store(String),

    /// Vector length does not match the collection
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Caller passed an argument outside the accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error while reading or writing the collection file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collection file could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
