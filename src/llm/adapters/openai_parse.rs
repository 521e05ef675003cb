//! OpenAI response parsing
//!
//! Public functions for parsing OpenAI-compatible JSON responses.

use crate::llm::adapters::AdapterError;
use serde_json::Value as JsonValue;

/// Parse OpenAI chat completion JSON response
///
/// Returns `choices[0].message.content`.
pub fn parse_chat_completion(response: &str) -> Result<String, AdapterError> {
    let json: JsonValue = serde_json::from_str(response)?;

    let content = json["choices"]
        .get(0)
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            AdapterError::InvalidResponse("Missing choices[0].message.content".to_string())
        })?;

    Ok(content.to_string())
}

/// Parse OpenAI embeddings JSON response
///
/// Returns `data[0].embedding`.
pub fn parse_embedding(response: &str) -> Result<Vec<f32>, AdapterError> {
    let json: JsonValue = serde_json::from_str(response)?;

    let values = json["data"]
        .get(0)
        .and_then(|d| d.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            AdapterError::InvalidResponse("Missing data[0].embedding".to_string())
        })?;

    values
        .iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                AdapterError::InvalidResponse("Non-numeric embedding component".to_string())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_completion_valid() {
        let json = r#"{"choices":[{"message":{"content":"test content"}}]}"#;
        let result = parse_chat_completion(json);
        assert_eq!(result.unwrap(), "test content");
    }

    #[test]
    fn test_parse_chat_completion_missing_choices() {
        let json = r#"{"model":"deepseek-chat"}"#;
        assert!(matches!(
            parse_chat_completion(json),
            Err(AdapterError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_chat_completion_not_json() {
        assert!(matches!(
            parse_chat_completion("<html>502</html>"),
            Err(AdapterError::Json(_))
        ));
    }

    #[test]
    fn test_parse_embedding() {
        let json = r#"{"data":[{"index":0,"embedding":[0.5,-0.25,1]}],"model":"m"}"#;
        assert_eq!(parse_embedding(json).unwrap(), vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_parse_embedding_invalid() {
        assert!(parse_embedding(r#"{"data":[]}"#).is_err());
        assert!(parse_embedding(r#"{"data":[{"embedding":["a"]}]}"#).is_err());
    }
}
