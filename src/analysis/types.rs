//! Analysis data model
//!
//! - [`ErrorSnippet`]: log window around a pattern match (Pattern Matcher output)
//! - [`RawAnalysis`]: model payload before enhancement (Invoker output)
//! - [`AnalysisResult`]: final, enhanced report returned to the caller

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Closed set of categories the Pattern Matcher can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Dependency,
    Permission,
    Resource,
    Configuration,
    Network,
    Code,
}

impl ErrorCategory {
    /// All categories in matching order
    pub const ALL: [ErrorCategory; 6] = [
        ErrorCategory::Dependency,
        ErrorCategory::Permission,
        ErrorCategory::Resource,
        ErrorCategory::Configuration,
        ErrorCategory::Network,
        ErrorCategory::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Dependency => "dependency",
            ErrorCategory::Permission => "permission",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Network => "network",
            ErrorCategory::Code => "code",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category reported by the model: the closed set plus `other`
///
/// Any unrecognized string the model returns is read as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisCategory {
    Dependency,
    Permission,
    Resource,
    Configuration,
    Network,
    Code,
    #[default]
    #[serde(other)]
    Other,
}

impl AnalysisCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisCategory::Dependency => "dependency",
            AnalysisCategory::Permission => "permission",
            AnalysisCategory::Resource => "resource",
            AnalysisCategory::Configuration => "configuration",
            AnalysisCategory::Network => "network",
            AnalysisCategory::Code => "code",
            AnalysisCategory::Other => "other",
        }
    }

    /// Read a model-supplied label; case and surrounding space are ignored
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "dependency" => AnalysisCategory::Dependency,
            "permission" => AnalysisCategory::Permission,
            "resource" => AnalysisCategory::Resource,
            "configuration" => AnalysisCategory::Configuration,
            "network" => AnalysisCategory::Network,
            "code" => AnalysisCategory::Code,
            _ => AnalysisCategory::Other,
        }
    }
}

impl From<ErrorCategory> for AnalysisCategory {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Dependency => AnalysisCategory::Dependency,
            ErrorCategory::Permission => AnalysisCategory::Permission,
            ErrorCategory::Resource => AnalysisCategory::Resource,
            ErrorCategory::Configuration => AnalysisCategory::Configuration,
            ErrorCategory::Network => AnalysisCategory::Network,
            ErrorCategory::Code => AnalysisCategory::Code,
        }
    }
}

impl fmt::Display for AnalysisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log window around a matched line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSnippet {
    /// Matched line with up to two lines of context on each side
    pub content: String,
    pub error_type: ErrorCategory,
    /// 1-based line number of the matched line
    pub line_number: usize,
}

/// One remediation step
///
/// `step` accepts numbers and numeric strings; anything else reads as 0.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FixStep {
    #[serde(default, deserialize_with = "lenient_step")]
    pub step: u32,
    #[serde(default, deserialize_with = "lenient_text")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub command: String,
}

/// Model payload before enhancement
///
/// Any JSON object reads as a `RawAnalysis`. Missing, null or mistyped fields
/// fall back to empty values; `confidence` stays `None` when the model
/// omitted it or returned something non-numeric. A bare string `fix_steps`
/// becomes a single step. Fields outside the schema are kept in `extra` and
/// carried into the final result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawAnalysis {
    #[serde(default, deserialize_with = "lenient_text")]
    pub error_summary: String,
    #[serde(default, deserialize_with = "lenient_category")]
    pub error_type: AnalysisCategory,
    #[serde(default, deserialize_with = "lenient_text")]
    pub root_cause: String,
    #[serde(
        default,
        deserialize_with = "lenient_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_fix_steps")]
    pub fix_steps: Vec<FixStep>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub verification: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub prevention: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shortened knowledge citation attached to a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeReference {
    /// First 100 characters of the document followed by `...`
    pub content: String,
    pub similarity: f64,
}

/// Final analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub error_summary: String,
    pub error_type: AnalysisCategory,
    pub root_cause: String,
    pub confidence: f64,
    pub fix_steps: Vec<FixStep>,
    pub verification: String,
    pub prevention: String,
    pub error_snippets: Vec<ErrorSnippet>,
    pub knowledge_references: Vec<KnowledgeReference>,
    pub analyzed_at: NaiveDateTime,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Set when the model call failed and the report is a fallback
    #[serde(skip)]
    pub degraded: bool,
}

impl AnalysisResult {
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// Strings as-is, numbers and booleans as text, everything else empty
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?))
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn lenient_step<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let step = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(step.and_then(|s| u32::try_from(s).ok()).unwrap_or(0))
}

fn lenient_category<'de, D>(deserializer: D) -> Result<AnalysisCategory, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(label) => AnalysisCategory::from_label(&label),
        _ => AnalysisCategory::Other,
    })
}

/// Arrays of step objects or plain strings; a lone string is one step
fn lenient_fix_steps<'de, D>(deserializer: D) -> Result<Vec<FixStep>, D::Error>
where
    D: Deserializer<'de>,
{
    let steps = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| fix_step_of(item, i + 1))
            .collect(),
        Value::String(text) if !text.trim().is_empty() => vec![FixStep {
            step: 1,
            action: text,
            command: String::new(),
        }],
        _ => Vec::new(),
    };
    Ok(steps)
}

fn fix_step_of(item: Value, position: usize) -> Option<FixStep> {
    match item {
        Value::Object(_) => serde_json::from_value(item).ok(),
        Value::String(action) => Some(FixStep {
            step: u32::try_from(position).unwrap_or(u32::MAX),
            action,
            command: String::new(),
        }),
        _ => None,
    }
}

/// Accepts numbers and numeric strings, clamped to [0, 1]
fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|c| c.is_finite()).map(|c| c.clamp(0.0, 1.0)))
}
