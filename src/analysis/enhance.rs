//! Result Enhancer
//!
//! Merges the model payload with the deterministic pipeline outputs and
//! adjusts confidence by retrieval strength.

use crate::analysis::types::{AnalysisResult, ErrorSnippet, KnowledgeReference, RawAnalysis};
use buildsense_knowledge::KnowledgeHit;
use chrono::NaiveDateTime;

/// Confidence assumed when the model did not report one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Upper bound of the retrieval boost
pub const MAX_CONFIDENCE_BOOST: f64 = 0.2;

/// Boost per unit of best similarity
const BOOST_FACTOR: f64 = 0.3;

/// Characters of a hit kept in a knowledge reference
const REFERENCE_PREVIEW_CHARS: usize = 100;

/// Keys owned by the enhancer; same-named model fields are dropped
const RESERVED_KEYS: &[&str] = &[
    "error_snippets",
    "knowledge_references",
    "analyzed_at",
    "degraded",
];

/// Build the final result
///
/// - `confidence` without hits: the model's value, or [`DEFAULT_CONFIDENCE`]
///   when it is missing or not finite
/// - `confidence` with hits: `min(1, base + min(0.2, max_similarity * 0.3))`,
///   floored at 0
/// - `confidence` always lies in [0, 1]
/// - every knowledge reference is the first 100 characters plus `...`
pub fn enhance(
    raw: RawAnalysis,
    snippets: Vec<ErrorSnippet>,
    hits: &[KnowledgeHit],
    analyzed_at: NaiveDateTime,
) -> AnalysisResult {
    let base = raw
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE);

    let boost = max_similarity(hits)
        .map(|best| (best * BOOST_FACTOR).min(MAX_CONFIDENCE_BOOST))
        .unwrap_or(0.0);
    let confidence = (base + boost).clamp(0.0, 1.0);

    let knowledge_references = hits
        .iter()
        .map(|hit| KnowledgeReference {
            content: reference_preview(&hit.content),
            similarity: hit.similarity,
        })
        .collect();

    let mut extra = raw.extra;
    for key in RESERVED_KEYS {
        extra.remove(*key);
    }

    AnalysisResult {
        error_summary: raw.error_summary,
        error_type: raw.error_type,
        root_cause: raw.root_cause,
        confidence,
        fix_steps: raw.fix_steps,
        verification: raw.verification,
        prevention: raw.prevention,
        error_snippets: snippets,
        knowledge_references,
        analyzed_at,
        extra,
        degraded: false,
    }
}

fn max_similarity(hits: &[KnowledgeHit]) -> Option<f64> {
    hits.iter()
        .map(|h| h.similarity)
        .filter(|s| !s.is_nan())
        .reduce(f64::max)
}

fn reference_preview(content: &str) -> String {
    let mut preview: String = content.chars().take(REFERENCE_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{AnalysisCategory, ErrorCategory};
    use buildsense_knowledge::Metadata;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    fn hit(content: &str, similarity: f64) -> KnowledgeHit {
        KnowledgeHit {
            content: content.to_string(),
            metadata: Metadata::new(),
            similarity,
            rank: 1,
        }
    }

    fn raw(confidence: Option<f64>) -> RawAnalysis {
        RawAnalysis {
            error_summary: "registry timeout".to_string(),
            error_type: AnalysisCategory::Network,
            confidence,
            ..Default::default()
        }
    }

    #[test]
    fn test_boost_from_single_hit_without_model_confidence() {
        let result = enhance(raw(None), vec![], &[hit("doc", 0.9)], at());
        assert!((result.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_boost_uses_best_hit_and_is_capped() {
        let hits = [hit("a", 0.2), hit("b", 0.5)];
        let result = enhance(raw(Some(0.6)), vec![], &hits, at());
        assert!((result.confidence - 0.75).abs() < 1e-9);

        let result = enhance(raw(Some(0.95)), vec![], &[hit("a", 1.0)], at());
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_no_hits_keeps_model_confidence() {
        let result = enhance(raw(Some(0.3)), vec![], &[], at());
        assert_eq!(result.confidence, 0.3);
        let result = enhance(raw(None), vec![], &[], at());
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_negative_similarity_never_drops_below_zero() {
        let result = enhance(raw(Some(0.0)), vec![], &[hit("a", -3.0)], at());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_references_always_end_with_ellipsis() {
        let long = "x".repeat(250);
        let result = enhance(raw(None), vec![], &[hit("short", 0.4), hit(&long, 0.3)], at());
        assert_eq!(result.knowledge_references[0].content, "short...");
        assert_eq!(result.knowledge_references[1].content.chars().count(), 103);
        assert!(result
            .knowledge_references
            .iter()
            .all(|r| r.content.ends_with("...")));
        assert_eq!(result.knowledge_references[1].similarity, 0.3);
    }

    #[test]
    fn test_snippets_timestamp_and_fields_carried() {
        let snippets = vec![ErrorSnippet {
            content: "Timeout".to_string(),
            error_type: ErrorCategory::Network,
            line_number: 2,
        }];
        let result = enhance(raw(Some(0.4)), snippets.clone(), &[], at());
        assert_eq!(result.error_snippets, snippets);
        assert_eq!(result.analyzed_at, at());
        assert_eq!(result.error_summary, "registry timeout");
        assert_eq!(result.error_type, AnalysisCategory::Network);
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_extra_fields_survive_but_reserved_keys_do_not() {
        let mut model = raw(None);
        model.extra.insert("affected_module".to_string(), "web".into());
        model.extra.insert("analyzed_at".to_string(), "yesterday".into());
        let result = enhance(model, vec![], &[], at());
        assert_eq!(result.extra["affected_module"], "web");
        assert!(!result.extra.contains_key("analyzed_at"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["affected_module"], "web");
        assert_eq!(json["analyzed_at"], "2024-03-09T14:05:07");
    }

    #[test]
    fn test_out_of_range_model_confidence_is_clamped() {
        assert_eq!(enhance(raw(Some(5.0)), vec![], &[], at()).confidence, 1.0);
        assert_eq!(enhance(raw(Some(-1.0)), vec![], &[], at()).confidence, 0.0);
        let result = enhance(raw(Some(f64::NAN)), vec![], &[], at());
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    proptest! {
        #[test]
        fn proptest_confidence_stays_in_unit_range(
            confidence in proptest::option::of(proptest::num::f64::ANY),
            similarities in proptest::collection::vec(-2.0f64..2.0, 0..6),
        ) {
            let hits: Vec<KnowledgeHit> = similarities.iter().map(|s| hit("doc", *s)).collect();
            let result = enhance(raw(confidence), vec![], &hits, at());
            prop_assert!((0.0..=1.0).contains(&result.confidence));
        }

        #[test]
        fn proptest_references_end_with_ellipsis(
            contents in proptest::collection::vec(".{0,250}", 0..5),
        ) {
            let hits: Vec<KnowledgeHit> = contents.iter().map(|c| hit(c, 0.5)).collect();
            let result = enhance(raw(None), vec![], &hits, at());
            prop_assert_eq!(result.knowledge_references.len(), hits.len());
            for (reference, source) in result.knowledge_references.iter().zip(&contents) {
                prop_assert!(reference.content.ends_with("..."));
                prop_assert!(reference.content.chars().count() <= 103);
                let kept: String = source.chars().take(100).collect();
                prop_assert!(reference.content.starts_with(&kept));
            }
        }
    }
}
