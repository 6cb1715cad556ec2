//! Error types for pattern compilation and highlight passes

use wasm_bindgen::JsValue;

/// A keyword that could not be compiled into a matcher.
///
/// Only reachable when escaping is off and the caller supplied malformed
/// expression syntax. The keyword is skipped; the others still highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    pub keyword: String,
    pub message: String,
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid pattern '{}': {}", self.keyword, self.message)
    }
}

impl std::error::Error for PatternError {}

/// Highlight-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    InvalidOptions(String),
    Dom(String),
    Style(String),
}

impl std::fmt::Display for HighlightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HighlightError::InvalidOptions(msg) => write!(f, "Invalid options: {}", msg),
            HighlightError::Dom(msg) => write!(f, "DOM error: {}", msg),
            HighlightError::Style(msg) => write!(f, "Style error: {}", msg),
        }
    }
}

impl std::error::Error for HighlightError {}

impl From<HighlightError> for JsValue {
    fn from(err: HighlightError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
