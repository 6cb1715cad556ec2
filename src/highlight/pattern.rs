//! PatternCompiler - Keyword normalization and regex compilation
//!
//! Turns caller keyword input (one string or an ordered list) into compiled
//! matchers:
//! - Entries are trimmed, blank entries dropped, duplicates kept
//! - With escaping on, metacharacters are escaped so keywords match literally
//! - Otherwise each entry is used as a regex expression as-is
//! - Matching is case-insensitive unless asked otherwise
//!
//! One malformed expression never suppresses the others: it is skipped,
//! logged and reported back in `CompiledPatterns::rejected`.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::error::PatternError;
use super::log;

// ==================== TYPE DEFINITIONS ====================

/// Keyword input: a single string or an ordered list of strings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum KeywordSpec {
    One(String),
    Many(Vec<String>),
}

impl Default for KeywordSpec {
    fn default() -> Self {
        KeywordSpec::One(String::new())
    }
}

impl KeywordSpec {
    /// Trimmed, non-empty entries in input order
    pub fn normalize(&self) -> Vec<String> {
        let raw: &[String] = match self {
            KeywordSpec::One(keyword) => std::slice::from_ref(keyword),
            KeywordSpec::Many(keywords) => keywords,
        };
        raw.iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// True if nothing survives normalization
    pub fn is_blank(&self) -> bool {
        self.normalize().is_empty()
    }
}

impl From<&str> for KeywordSpec {
    fn from(keyword: &str) -> Self {
        KeywordSpec::One(keyword.to_string())
    }
}

impl From<String> for KeywordSpec {
    fn from(keyword: String) -> Self {
        KeywordSpec::One(keyword)
    }
}

impl From<Vec<String>> for KeywordSpec {
    fn from(keywords: Vec<String>) -> Self {
        KeywordSpec::Many(keywords)
    }
}

impl From<Vec<&str>> for KeywordSpec {
    fn from(keywords: Vec<&str>) -> Self {
        KeywordSpec::Many(keywords.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeywordSpec {
    fn from(keywords: [&str; N]) -> Self {
        KeywordSpec::Many(keywords.iter().map(|k| k.to_string()).collect())
    }
}

/// Escape regex metacharacters so the keyword only matches its literal text
pub fn escape_keyword(keyword: &str) -> String {
    regex::escape(keyword)
}

// ==================== COMPILED PATTERN ====================

/// Immutable matcher derived from one normalized keyword
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    keyword: String,
    regex: Regex,
    case_sensitive: bool,
    escaped: bool,
}

impl CompiledPattern {
    pub fn compile(keyword: &str, case_sensitive: bool, escape: bool) -> Result<Self, PatternError> {
        let source = if escape {
            escape_keyword(keyword)
        } else {
            keyword.to_string()
        };

        let regex = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| PatternError {
                keyword: keyword.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            keyword: keyword.to_string(),
            regex,
            case_sensitive,
            escaped: escape,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    /// Non-empty match spans as byte offsets, in ascending order.
    ///
    /// Each search resumes at the previous match's end. A zero-length match
    /// is discarded and the cursor steps one character past it, so
    /// empty-matching expressions terminate.
    pub fn match_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut cursor = 0;

        while cursor <= text.len() {
            let Some(m) = self.regex.find_at(text, cursor) else {
                break;
            };

            if m.start() == m.end() {
                match text[m.end()..].chars().next() {
                    Some(c) => cursor = m.end() + c.len_utf8(),
                    None => break,
                }
                continue;
            }

            spans.push((m.start(), m.end()));
            cursor = m.end();
        }

        spans
    }
}

/// Output of `compile_patterns`: usable matchers plus rejected keywords
#[derive(Clone, Debug, Default)]
pub struct CompiledPatterns {
    pub patterns: Vec<CompiledPattern>,
    pub rejected: Vec<PatternError>,
}

/// Compile keyword input into matchers, skipping (and logging) bad entries
pub fn compile_patterns(keywords: &KeywordSpec, case_sensitive: bool, escape: bool) -> CompiledPatterns {
    let mut compiled = CompiledPatterns::default();

    for keyword in keywords.normalize() {
        match CompiledPattern::compile(&keyword, case_sensitive, escape) {
            Ok(pattern) => compiled.patterns.push(pattern),
            Err(e) => {
                log::warn("PatternCompiler", &format!("Skipping keyword: {}", e));
                compiled.rejected.push(e);
            }
        }
    }

    compiled
}

// ==================== TESTS ====================
