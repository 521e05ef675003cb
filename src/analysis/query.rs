//! Query Builder
//!
//! Turns extracted snippets into a single retrieval query string.

use crate::analysis::types::ErrorSnippet;
use std::collections::BTreeSet;

/// Query used when no snippet was extracted
pub const FALLBACK_QUERY: &str = "build error";

/// Snippets whose content contributes to the query
const PREVIEW_SNIPPETS: usize = 2;
/// Characters taken from each previewed snippet
const PREVIEW_CHARS: usize = 50;

/// Build the retrieval query for a set of snippets
///
/// Format: distinct categories (sorted, space-separated), then the first 50
/// characters of the first two snippets with newlines flattened to spaces.
pub fn build_query(snippets: &[ErrorSnippet]) -> String {
    if snippets.is_empty() {
        return FALLBACK_QUERY.to_string();
    }

    let categories: BTreeSet<&'static str> = snippets
        .iter()
        .map(|s| s.error_type.as_str())
        .collect();

    let mut parts = vec![categories.into_iter().collect::<Vec<_>>().join(" ")];
    for snippet in snippets.iter().take(PREVIEW_SNIPPETS) {
        let preview: String = snippet.content.chars().take(PREVIEW_CHARS).collect();
        parts.push(preview.replace('\n', " "));
    }
    parts.join(" ")
}
