//! Highlight configuration
//!
//! Options arrive from JS as a plain object (camelCase keys). Every field
//! has a default, so `{}` / `null` / `undefined` are all valid.

use serde::{Deserialize, Serialize};

use super::error::HighlightError;
use super::pattern::KeywordSpec;
use super::style::HighlightStyle;

/// Highlight name used when the caller does not pick one
pub const DEFAULT_HIGHLIGHT_NAME: &str = "highlight-dom";

fn default_highlight_name() -> String {
    DEFAULT_HIGHLIGHT_NAME.to_string()
}

/// Options for one highlight layer.
///
/// The custom chunk callback is not part of this struct; it is supplied
/// separately because it cannot be serialized.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct HighlightOptions {
    /// Keyword or keyword list (default: empty, which clears the highlight)
    #[serde(default)]
    pub keywords: KeywordSpec,
    /// Registry key and `::highlight(<name>)` selector
    #[serde(default = "default_highlight_name", alias = "highlightClassName")]
    pub highlight_name: String,
    /// Default: false
    #[serde(default, alias = "highlightCaseSensitive")]
    pub case_sensitive: bool,
    /// Match keywords literally. Default: false
    #[serde(default, alias = "highlightEscape")]
    pub escape: bool,
    /// Optional style injected once for `highlight_name`
    #[serde(default, alias = "highlightStyle", skip_serializing_if = "Option::is_none")]
    pub style: Option<HighlightStyle>,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            keywords: KeywordSpec::default(),
            highlight_name: default_highlight_name(),
            case_sensitive: false,
            escape: false,
            style: None,
        }
    }
}

impl HighlightOptions {
    pub fn new(keywords: impl Into<KeywordSpec>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.highlight_name = name.into();
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_escape(mut self, escape: bool) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_style(mut self, style: HighlightStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> Result<Self, HighlightError> {
        serde_json::from_str(json).map_err(|e| HighlightError::InvalidOptions(e.to_string()))
    }
}
