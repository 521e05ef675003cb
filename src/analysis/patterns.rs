//! Pattern Matcher
//!
//! Classifies log lines into [`ErrorCategory`] values and cuts a context
//! window around every match.
//!
//! ## Matching rules
//!
//! - Lines are scanned in order; for each line every category is tested in
//!   [`ErrorCategory::ALL`] order
//! - Within a category the first matching pattern wins; the other patterns of
//!   that category are skipped for that line, other categories still run
//! - A snippet is the matched line plus up to two lines before and after
//! - Snippets are deduplicated by an 8-hex-char content digest (first
//!   occurrence wins) and capped at [`MAX_SNIPPETS`]

use crate::analysis::types::{ErrorCategory, ErrorSnippet};
use regex::{Regex, RegexBuilder};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Maximum snippets returned by [`PatternMatcher::extract`]
pub const MAX_SNIPPETS: usize = 5;

/// Lines of context kept before a matched line
const CONTEXT_BEFORE: usize = 2;
/// Lines of context kept after a matched line
const CONTEXT_AFTER: usize = 2;

const DEDUP_DIGEST_LEN: usize = 8;

impl ErrorCategory {
    /// Source patterns for this category, in matching order
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            ErrorCategory::Dependency => &[
                r"npm ERR!",
                r"yarn error",
                r"pip install failed",
                r"Could not resolve dependency",
                r"Package.*not found",
                r"依赖.*失败",
                r"下载.*失败",
            ],
            ErrorCategory::Permission => &[
                r"Permission denied",
                r"EACCES",
                r"权限不够",
                r"access denied",
                r"无权访问",
                r"Forbidden",
            ],
            ErrorCategory::Resource => &[
                r"No space left",
                r"内存不足",
                r"disk full",
                r"OutOfMemoryError",
                r"内存溢出",
                r"资源不足",
            ],
            ErrorCategory::Configuration => &[
                r"Configuration error",
                r"配置错误",
                r"Invalid configuration",
                r"Missing.*property",
                r"参数错误",
                r"配置文件",
            ],
            ErrorCategory::Network => &[
                r"Connection refused",
                r"Timeout",
                r"网络错误",
                r"Failed to connect",
                r"连接失败",
                r"请求超时",
            ],
            ErrorCategory::Code => &[
                r"SyntaxError",
                r"编译错误",
                r"syntax error",
                r"undefined variable",
                r"类型错误",
                r"编译失败",
            ],
        }
    }
}

/// Compiled pattern table
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    table: Vec<(ErrorCategory, Vec<Regex>)>,
}

impl PatternMatcher {
    /// Compile the built-in pattern table (case-insensitive)
    pub fn new() -> Result<Self, regex::Error> {
        let mut table = Vec::with_capacity(ErrorCategory::ALL.len());
        for category in ErrorCategory::ALL {
            let compiled = category
                .patterns()
                .iter()
                .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
                .collect::<Result<Vec<_>, _>>()?;
            table.push((category, compiled));
        }
        Ok(Self { table })
    }

    /// Categories that match a single line, in table order
    pub fn classify_line(&self, line: &str) -> Vec<ErrorCategory> {
        self.table
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|re| re.is_match(line)))
            .map(|(category, _)| *category)
            .collect()
    }

    /// Extract at most [`MAX_SNIPPETS`] deduplicated snippets from a log
    pub fn extract(&self, log: &str) -> Vec<ErrorSnippet> {
        let lines: Vec<&str> = log.split('\n').collect();
        let mut snippets = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            for category in self.classify_line(line) {
                let start = i.saturating_sub(CONTEXT_BEFORE);
                let end = (i + CONTEXT_AFTER + 1).min(lines.len());
                snippets.push(ErrorSnippet {
                    content: lines[start..end].join("\n"),
                    error_type: category,
                    line_number: i + 1,
                });
            }
        }

        let mut seen = HashSet::new();
        snippets
            .into_iter()
            .filter(|s| seen.insert(snippet_digest(&s.content)))
            .take(MAX_SNIPPETS)
            .collect()
    }
}

/// Dedup key: first 8 hex chars of SHA-256(content)
fn snippet_digest(content: &str) -> String {
    let digest = hex::encode(Sha256::digest(content.as_bytes()));
    digest[..DEDUP_DIGEST_LEN].to_string()
}
