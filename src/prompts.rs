//! Prompt templates
//!
//! Fixed contract between the pipeline and the model. Every function here is
//! pure string substitution; nothing is inferred.
//!
//! - [`render_analysis_prompt`]: build-log diagnosis request (JSON answer)
//! - [`format_knowledge_context`]: retrieved solutions as prompt context
//! - [`render_knowledge_summary_prompt`]: turn a finished analysis into a
//!   knowledge document

use crate::analysis::types::AnalysisResult;
use buildsense_knowledge::KnowledgeHit;

/// Characters of the log embedded in the analysis prompt
pub const MAX_LOG_CHARS: usize = 2000;

/// Context used when retrieval found nothing
pub const NO_KNOWLEDGE_PLACEHOLDER: &str = "No related knowledge available.";

/// First line of a non-empty knowledge context
const KNOWLEDGE_CONTEXT_HEADER: &str = "Found the following related solutions:";

/// System message sent with every analysis request
pub const SYSTEM_PROMPT: &str = "You are an expert in cloud compilation and build systems.";

const ANALYSIS_TEMPLATE: &str = r#"You are an expert in cloud compilation and build systems. Analyze the following build error log and provide a professional solution.

Error log:
{error_log}
Related knowledge:
{context}

Return the analysis as JSON in exactly this format:
{
    "error_summary": "one-sentence summary of the error",
    "error_type": "error category",
    "root_cause": "detailed root cause analysis",
    "confidence": 0.8,
    "fix_steps": [
        {"step": 1, "action": "what to do", "command": "exact command"}
    ],
    "verification": "how to verify the fix worked",
    "prevention": "how to prevent this in future"
}

Requirements:
1. error_type must be one of: dependency, permission, resource, configuration, network, code, other
2. Fix steps must be concrete and executable
3. Cite the effective methods from the related knowledge
4. If the information is insufficient, say so explicitly instead of guessing
"#;

const SUMMARY_TEMPLATE: &str = r#"Summarize the following solution as a knowledge base document:

Original error: {error_summary}
Root cause: {root_cause}
Solution steps: {fix_steps}

Produce a standardized solution document containing:
1. Problem description
2. Solution (step by step)
3. Verification method
4. Caveats

Output format:
Problem: [problem description]
Solution:
1. [step 1]
2. [step 2]
...
Verification: [verification method]
Caveats: [caveats]"#;

/// Replace `{name}` placeholders in a single pass
///
/// Substituted values are never rescanned, so logs containing placeholder
/// text are embedded verbatim.
fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while let Some(start) = rest.find('{') {
        for (name, value) in vars {
            let placeholder = format!("{{{}}}", name);
            if rest[start..].starts_with(&placeholder) {
                out.push_str(&rest[..start]);
                out.push_str(value);
                rest = &rest[start + placeholder.len()..];
                continue 'scan;
            }
        }
        out.push_str(&rest[..=start]);
        rest = &rest[start + 1..];
    }
    out.push_str(rest);
    out
}

/// Truncate a log to [`MAX_LOG_CHARS`] characters, without a marker
pub fn truncate_log(log: &str) -> &str {
    match log.char_indices().nth(MAX_LOG_CHARS) {
        Some((byte_idx, _)) => &log[..byte_idx],
        None => log,
    }
}

/// Render retrieved hits as prompt context
///
/// Each hit becomes a `【Solution N - similarity: X.XX】` heading followed by
/// its content, numbered from 1 in retrieval order.
pub fn format_knowledge_context(hits: &[KnowledgeHit]) -> String {
    if hits.is_empty() {
        return NO_KNOWLEDGE_PLACEHOLDER.to_string();
    }

    let mut parts = vec![KNOWLEDGE_CONTEXT_HEADER.to_string()];
    for (i, hit) in hits.iter().enumerate() {
        parts.push(format!(
            "\n【Solution {} - similarity: {:.2}】\n{}",
            i + 1,
            hit.similarity,
            hit.content
        ));
    }
    parts.join("\n")
}

/// Build the analysis prompt for a log and its retrieved knowledge
pub fn render_analysis_prompt(log: &str, hits: &[KnowledgeHit]) -> String {
    let context = format_knowledge_context(hits);
    substitute(
        ANALYSIS_TEMPLATE,
        &[("error_log", truncate_log(log)), ("context", context.as_str())],
    )
}

/// Build the prompt that condenses an analysis into a knowledge document
pub fn render_knowledge_summary_prompt(result: &AnalysisResult) -> String {
    // Vec<FixStep> always serializes
    let fix_steps = serde_json::to_string(&result.fix_steps).unwrap_or_else(|_| "[]".to_string());
    substitute(
        SUMMARY_TEMPLATE,
        &[
            ("error_summary", result.error_summary.as_str()),
            ("root_cause", result.root_cause.as_str()),
            ("fix_steps", fix_steps.as_str()),
        ],
    )
}
