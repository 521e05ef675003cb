//! Embedding Adapter
//!
//! OpenAI-compatible embeddings client (`POST {base_url}/embeddings`) that
//! plugs into the knowledge base as an [`Embedder`].

use crate::llm::adapters::openai_parse::parse_embedding;
use crate::llm::adapters::retry::RetryPolicy;
use crate::llm::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::llm::adapters::AdapterError;
use buildsense_knowledge::{Embedder, HashingEmbedder, KnowledgeError};
use tracing::debug;

/// OpenAI-compatible embedder
#[derive(Debug)]
pub struct OpenAiEmbedder {
    base_url: String,
    model: String,
    api_key: String,
    /// Expected vector length
    dimension: usize,
    transport: Transport,
    retry: RetryPolicy,
}

impl OpenAiEmbedder {
    pub fn new(base_url: String, model: String, api_key: String, dimension: usize) -> Self {
        Self::with_transport(
            base_url,
            model,
            api_key,
            dimension,
            Transport::Real(UreqTransport::new()),
        )
    }

    /// Create embedder with custom transport (for testing)
    pub fn with_transport(
        base_url: String,
        model: String,
        api_key: String,
        dimension: usize,
        transport: Transport,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            dimension,
            transport,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Embeddings endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    fn request_embedding(&self, text: &str) -> Result<Vec<f32>, AdapterError> {
        let url = self.endpoint();
        let body = serde_json::json!({
            "model": self.model,
            "input": text
        })
        .to_string();
        let auth = format!("Bearer {}", self.api_key);
        let headers = [
            ("Content-Type", "application/json"),
            ("Authorization", auth.as_str()),
        ];

        debug!("Embedding request: model={}, chars={}", self.model, text.chars().count());
        let response = self
            .retry
            .run(|| self.transport.post_json(&url, &headers, &body))?;
        parse_embedding(&response)
    }
}

impl Embedder for OpenAiEmbedder {
    fn encode(&self, text: &str) -> buildsense_knowledge::Result<Vec<f32>> {
        let vector = self
            .request_embedding(text)
            .map_err(|e| KnowledgeError::Embedding(e.to_string()))?;
        if vector.len() != self.dimension {
            return Err(KnowledgeError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Embedder picked from configuration
#[derive(Debug)]
pub enum ConfiguredEmbedder {
    Hashing(HashingEmbedder),
    OpenAi(OpenAiEmbedder),
}

impl Embedder for ConfiguredEmbedder {
    fn encode(&self, text: &str) -> buildsense_knowledge::Result<Vec<f32>> {
        match self {
            ConfiguredEmbedder::Hashing(e) => e.encode(text),
            ConfiguredEmbedder::OpenAi(e) => e.encode(text),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            ConfiguredEmbedder::Hashing(e) => e.dimension(),
            ConfiguredEmbedder::OpenAi(e) => e.dimension(),
        }
    }
}
