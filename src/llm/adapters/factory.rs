//! Adapter Factory
//!
//! Creates chat adapters and embedders from configuration.

use crate::config::{resolve_secret, EmbedderKind, EmbedderSettings, LlmSettings, Provider, ENV_PREFIX};
use crate::llm::adapters::embeddings::{ConfiguredEmbedder, OpenAiEmbedder};
use crate::llm::adapters::openai::OpenAiAdapter;
use crate::llm::adapters::retry::RetryPolicy;
use crate::llm::adapters::stub::StubAdapter;
use crate::llm::adapters::transport::{Transport, UreqTransport};
use crate::llm::adapters::{Adapter, AdapterError};
use buildsense_knowledge::HashingEmbedder;
use std::time::Duration;
use tracing::info;

/// Create the chat adapter selected by `[llm]`
///
/// Fails with [`AdapterError::Configuration`] when an OpenAI-compatible
/// provider is selected but the API key resolves to an empty string.
pub fn create_adapter(settings: &LlmSettings) -> Result<Adapter, AdapterError> {
    match settings.provider {
        Provider::Stub => {
            info!("Using stub LLM adapter (offline)");
            Ok(Adapter::Stub(StubAdapter::new()))
        }
        Provider::OpenAi => {
            let api_key = require_key(&settings.api_key, "llm.api_key")?;
            info!(
                "Using OpenAI-compatible adapter: {} ({})",
                settings.base_url, settings.model
            );
            let adapter = OpenAiAdapter::with_transport(
                settings.base_url.clone(),
                settings.model.clone(),
                api_key,
                Transport::Real(UreqTransport::with_timeout(settings.timeout_seconds)),
            )
            .with_retry(retry_policy(settings));
            Ok(Adapter::OpenAi(adapter))
        }
    }
}

/// Create the embedder selected by `[knowledge.embedder]`
pub fn create_embedder(
    settings: &EmbedderSettings,
    llm: &LlmSettings,
) -> Result<ConfiguredEmbedder, AdapterError> {
    match settings.kind {
        EmbedderKind::Hashing => {
            let embedder = HashingEmbedder::new(settings.dimension)
                .map_err(|e| AdapterError::Configuration(e.to_string()))?;
            Ok(ConfiguredEmbedder::Hashing(embedder))
        }
        EmbedderKind::OpenAi => {
            let api_key = require_key(&settings.api_key, "knowledge.embedder.api_key")?;
            info!(
                "Using OpenAI-compatible embedder: {} ({})",
                settings.base_url, settings.model
            );
            let embedder = OpenAiEmbedder::with_transport(
                settings.base_url.clone(),
                settings.model.clone(),
                api_key,
                settings.dimension,
                Transport::Real(UreqTransport::with_timeout(llm.timeout_seconds)),
            )
            .with_retry(retry_policy(llm));
            Ok(ConfiguredEmbedder::OpenAi(embedder))
        }
    }
}

/// Retry policy from `[llm]`
pub fn retry_policy(settings: &LlmSettings) -> RetryPolicy {
    RetryPolicy::new(
        settings.max_retries,
        Duration::from_millis(settings.retry_backoff_ms),
    )
}

/// Resolve environment variable reference
///
/// If value starts with "env:", read from environment (empty when unset).
/// Otherwise return value as-is.
pub fn resolve_env_var(value: &str) -> String {
    resolve_secret(value, |name| std::env::var(name).ok())
}

fn require_key(value: &str, field: &str) -> Result<String, AdapterError> {
    let key = resolve_env_var(value);
    if key.trim().is_empty() {
        let hint = match value.strip_prefix(ENV_PREFIX) {
            Some(var) => format!("set {} or BUILDSENSE_API_KEY", var),
            None => format!("set {} in config.toml", field),
        };
        return Err(AdapterError::Configuration(format!(
            "API key is empty ({})",
            hint
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::adapters::LlmAdapter;

    #[test]
    fn test_stub_provider() {
        let settings = LlmSettings {
            provider: Provider::Stub,
            ..Default::default()
        };
        let adapter = create_adapter(&settings).unwrap();
        assert_eq!(adapter.provider_name(), "stub");
    }

    #[test]
    fn test_openai_provider_with_literal_key() {
        let settings = LlmSettings {
            api_key: "sk-literal".to_string(),
            max_retries: 4,
            ..Default::default()
        };
        match create_adapter(&settings).unwrap() {
            Adapter::OpenAi(a) => {
                assert_eq!(a.endpoint(), "https://api.deepseek.com/chat/completions");
                assert_eq!(a.model(), "deepseek-chat");
                assert_eq!(a.retry_policy().max_retries, 4);
            }
            other => panic!("expected OpenAI adapter, got {:?}", other),
        }
    }

    #[test]
    fn test_openai_provider_missing_key() {
        let settings = LlmSettings {
            api_key: "env:BUILDSENSE_TEST_UNSET_KEY_7f3a".to_string(),
            ..Default::default()
        };
        let err = create_adapter(&settings).unwrap_err();
        assert!(matches!(err, AdapterError::Configuration(_)));
        assert!(err.to_string().contains("BUILDSENSE_TEST_UNSET_KEY_7f3a"));
    }

    #[test]
    fn test_hashing_embedder() {
        let settings = EmbedderSettings {
            dimension: 64,
            ..Default::default()
        };
        let embedder = create_embedder(&settings, &LlmSettings::default()).unwrap();
        assert!(matches!(embedder, ConfiguredEmbedder::Hashing(_)));
    }
}
