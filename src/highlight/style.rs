//! Highlight styles
//!
//! `::highlight()` only honours a handful of properties, so `HighlightStyle`
//! carries exactly those. Unknown keys in incoming JSON are ignored.
//!
//! `StyleRegistrar` injects one `::highlight(<name>)` rule per name for the
//! lifetime of the registrar; later registrations of the same name are
//! no-ops even if the style differs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::HighlightError;
use super::log;

// ==================== STYLE ====================

/// Properties supported by the `::highlight()` pseudo-element
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct HighlightStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration_thickness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_shadow: Option<String>,
}

impl HighlightStyle {
    /// CSS property names paired with their values, in declaration order
    fn properties(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("color", self.color.as_deref()),
            ("background-color", self.background_color.as_deref()),
            ("text-decoration", self.text_decoration.as_deref()),
            ("text-decoration-color", self.text_decoration_color.as_deref()),
            ("text-decoration-line", self.text_decoration_line.as_deref()),
            ("text-decoration-style", self.text_decoration_style.as_deref()),
            ("text-decoration-thickness", self.text_decoration_thickness.as_deref()),
            ("text-shadow", self.text_shadow.as_deref()),
        ]
    }

    /// `prop: value;` pairs separated by spaces.
    ///
    /// Blank values are skipped, and so are values containing `;`, `{` or
    /// `}`, which would escape the declaration block.
    pub fn declarations(&self) -> String {
        let mut out = Vec::new();
        for (property, value) in self.properties() {
            let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            if value.contains([';', '{', '}']) {
                log::warn("StyleRegistrar", &format!("Ignoring unsafe value for {}: {:?}", property, value));
                continue;
            }
            out.push(format!("{}: {};", property, value));
        }
        out.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.declarations().is_empty()
    }

    /// Full `::highlight(<name>) { ... }` rule, or `None` when there is
    /// nothing to declare
    pub fn css_rule(&self, name: &str) -> Option<String> {
        let declarations = self.declarations();
        if declarations.is_empty() {
            return None;
        }
        Some(format!("::highlight({}) {{ {} }}", name, declarations))
    }
}

// ==================== SINKS ====================

/// Where rendered rules end up
pub trait StyleSink {
    fn inject(&mut self, css: &str) -> Result<(), HighlightError>;
}

/// Sink that just records rules
#[derive(Clone, Debug, Default)]
pub struct StyleSheetLog {
    pub rules: Vec<String>,
}

impl StyleSheetLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StyleSink for StyleSheetLog {
    fn inject(&mut self, css: &str) -> Result<(), HighlightError> {
        self.rules.push(css.to_string());
        Ok(())
    }
}

// ==================== REGISTRAR ====================

/// Remembers which highlight names already had a rule injected
#[derive(Clone, Debug, Default)]
pub struct StyleRegistrar {
    registered: HashSet<String>,
}

impl StyleRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject the rule for `name` unless one was injected before.
    ///
    /// Returns `Ok(true)` only when a rule was injected. Without a style
    /// (or with nothing to declare) nothing happens and `name` stays
    /// unregistered, so a later call that carries a style still applies.
    pub fn register_once<S: StyleSink + ?Sized>(
        &mut self,
        name: &str,
        style: Option<&HighlightStyle>,
        sink: &mut S,
    ) -> Result<bool, HighlightError> {
        if self.registered.contains(name) {
            return Ok(false);
        }
        let Some(rule) = style.and_then(|style| style.css_rule(name)) else {
            return Ok(false);
        };

        sink.inject(&rule)?;
        self.registered.insert(name.to_string());
        log::debug("StyleRegistrar", &format!("Registered style for '{}'", name));
        Ok(true)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.contains(name)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

// ==================== TESTS ====================
