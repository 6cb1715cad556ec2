//! ChangeDetector: decides when a highlight pass has to re-run
//!
//! A pass is a pure function of its inputs plus the current DOM text. The
//! inputs (keywords, name, case and escape flags) are kept and compared
//! exactly, together with the root node and the identity of the custom
//! chunk function. The fingerprint in `ChangeResult` is informational only.
//! Style is not an input: it is registered separately.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::config::HighlightOptions;
use super::locator::FindChunksFn;
use super::pattern::KeywordSpec;

// =============================================================================
// Types
// =============================================================================

/// Result of a dependency check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeResult {
    /// True if any input changed since the last check
    pub has_changed: bool,
    /// Fingerprint of the current options
    pub options_hash: u64,
    /// Fingerprint from the previous check (if any)
    pub previous_hash: Option<u64>,
}

/// The option fields that decide which ranges a pass builds
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PassInputs {
    keywords: KeywordSpec,
    highlight_name: String,
    case_sensitive: bool,
    escape: bool,
}

impl PassInputs {
    pub(crate) fn from_options(options: &HighlightOptions) -> Self {
        Self {
            keywords: options.keywords.clone(),
            highlight_name: options.highlight_name.clone(),
            case_sensitive: options.case_sensitive,
            escape: options.escape,
        }
    }
}

/// Inputs seen at the last check. The callback is held (not just its
/// address) so a freed closure's address cannot be reused by a new one.
#[derive(Clone)]
struct Snapshot<R> {
    root: R,
    inputs: PassInputs,
    options_hash: u64,
    callback: Option<FindChunksFn>,
}

// =============================================================================
// ChangeDetector
// =============================================================================

/// Tracks pass inputs between calls
#[derive(Clone)]
pub struct ChangeDetector<R> {
    last: Option<Snapshot<R>>,
    /// Number of checks performed
    check_count: u64,
    /// Number of checks where nothing changed
    skip_count: u64,
}

impl<R> Default for ChangeDetector<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ChangeDetector<R> {
    pub fn new() -> Self {
        Self {
            last: None,
            check_count: 0,
            skip_count: 0,
        }
    }

    /// Skip rate as percentage
    pub fn skip_rate(&self) -> f64 {
        if self.check_count == 0 {
            return 0.0;
        }
        (self.skip_count as f64 / self.check_count as f64) * 100.0
    }

    pub fn check_count(&self) -> u64 {
        self.check_count
    }

    pub fn skip_count(&self) -> u64 {
        self.skip_count
    }

    /// Forget the last inputs; the next check reports a change
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Reset the detector state
    pub fn reset(&mut self) {
        self.last = None;
        self.check_count = 0;
        self.skip_count = 0;
    }

    /// Fingerprint of the options that affect which ranges a pass builds
    pub fn options_hash(options: &HighlightOptions) -> u64 {
        let mut hasher = DefaultHasher::new();
        PassInputs::from_options(options).hash(&mut hasher);
        hasher.finish()
    }

    fn same_callback(a: Option<&FindChunksFn>, b: Option<&FindChunksFn>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const (),
            _ => false,
        }
    }
}

impl<R: Clone + PartialEq> ChangeDetector<R> {
    /// Check if any input changed; records the inputs either way
    pub fn has_changed(
        &mut self,
        root: &R,
        options: &HighlightOptions,
        find_chunks: Option<&FindChunksFn>,
    ) -> bool {
        self.check(root, options, find_chunks).has_changed
    }

    /// Check and return detailed result
    pub fn check(
        &mut self,
        root: &R,
        options: &HighlightOptions,
        find_chunks: Option<&FindChunksFn>,
    ) -> ChangeResult {
        self.check_count += 1;

        let current = Snapshot {
            root: root.clone(),
            inputs: PassInputs::from_options(options),
            options_hash: Self::options_hash(options),
            callback: find_chunks.cloned(),
        };
        let previous_hash = self.last.as_ref().map(|last| last.options_hash);

        let has_changed = match &self.last {
            None => true,
            Some(last) => {
                last.root != current.root
                    || last.inputs != current.inputs
                    || !Self::same_callback(last.callback.as_ref(), current.callback.as_ref())
            }
        };

        if !has_changed {
            self.skip_count += 1;
        }

        let options_hash = current.options_hash;
        self.last = Some(current);

        ChangeResult {
            has_changed,
            options_hash,
            previous_hash,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::locator::{FindChunksOptions, TextChunk};
    use crate::highlight::style::HighlightStyle;

    fn noop() -> FindChunksFn {
        Rc::new(|_: &FindChunksOptions<'_>| Vec::<TextChunk>::new())
    }

    #[test]
    fn test_first_check_returns_changed() {
        let mut detector = ChangeDetector::new();
        assert!(detector.has_changed(&1u32, &HighlightOptions::new("a"), None));
    }

    #[test]
    fn test_same_inputs_unchanged() {
        let mut detector = ChangeDetector::new();
        let options = HighlightOptions::new(["a", "b"]);

        detector.has_changed(&1u32, &options, None);
        assert!(!detector.has_changed(&1u32, &options.clone(), None));
    }

    #[test]
    fn test_each_input_triggers_change() {
        let mut detector = ChangeDetector::new();
        let base = HighlightOptions::new("a");
        detector.has_changed(&1u32, &base, None);

        assert!(detector.has_changed(&2u32, &base, None));
        assert!(detector.has_changed(&2u32, &HighlightOptions::new("b"), None));
        assert!(detector.has_changed(&2u32, &HighlightOptions::new("b").with_case_sensitive(true), None));
        assert!(detector.has_changed(
            &2u32,
            &HighlightOptions::new("b").with_case_sensitive(true).with_escape(true),
            None
        ));
        assert!(detector.has_changed(
            &2u32,
            &HighlightOptions::new("b")
                .with_case_sensitive(true)
                .with_escape(true)
                .with_name("other"),
            None
        ));
    }

    #[test]
    fn test_style_is_not_a_pass_input() {
        let mut detector = ChangeDetector::new();
        let plain = HighlightOptions::new("a");
        let styled = plain.clone().with_style(HighlightStyle {
            color: Some("red".into()),
            ..Default::default()
        });

        detector.has_changed(&1u32, &plain, None);
        assert!(!detector.has_changed(&1u32, &styled, None));
    }

    #[test]
    fn test_change_follows_exact_inputs() {
        let variants = [
            HighlightOptions::new("a"),
            HighlightOptions::new(["a"]),
            HighlightOptions::new(["a", "b"]),
            HighlightOptions::new(["b", "a"]),
            HighlightOptions::new("a").with_escape(true),
        ];

        for previous in &variants {
            for next in &variants {
                let mut detector = ChangeDetector::new();
                detector.has_changed(&1u32, previous, None);
                let expected = PassInputs::from_options(previous) != PassInputs::from_options(next);
                assert_eq!(detector.has_changed(&1u32, next, None), expected, "{:?} -> {:?}", previous.keywords, next.keywords);
            }
        }
    }

    #[test]
    fn test_pass_inputs_ignore_style() {
        let plain = HighlightOptions::new("a");
        let styled = plain.clone().with_style(HighlightStyle {
            text_shadow: Some("none".into()),
            ..Default::default()
        });
        assert_eq!(PassInputs::from_options(&plain), PassInputs::from_options(&styled));
    }

    #[test]
    fn test_callback_identity() {
        let mut detector = ChangeDetector::new();
        let options = HighlightOptions::default();
        let first = noop();
        let second = noop();

        assert!(detector.has_changed(&1u32, &options, Some(&first)));
        assert!(!detector.has_changed(&1u32, &options, Some(&Rc::clone(&first))));
        assert!(detector.has_changed(&1u32, &options, Some(&second)));
        assert!(detector.has_changed(&1u32, &options, None));
    }

    #[test]
    fn test_skip_count_and_reset() {
        let mut detector = ChangeDetector::new();
        let options = HighlightOptions::new("a");

        detector.has_changed(&1u32, &options, None);
        detector.has_changed(&1u32, &options, None);
        detector.has_changed(&1u32, &options, None);

        assert_eq!(detector.check_count(), 3);
        assert_eq!(detector.skip_count(), 2);
        assert!((detector.skip_rate() - 66.666).abs() < 0.01);

        detector.invalidate();
        assert!(detector.has_changed(&1u32, &options, None));

        detector.reset();
        assert_eq!(detector.check_count(), 0);
        assert_eq!(detector.skip_rate(), 0.0);
    }

    #[test]
    fn test_check_reports_hashes() {
        let mut detector = ChangeDetector::new();
        let options = HighlightOptions::new("a");

        let first = detector.check(&1u32, &options, None);
        assert!(first.previous_hash.is_none());

        let second = detector.check(&1u32, &options, None);
        assert_eq!(second.previous_hash, Some(first.options_hash));
        assert!(!second.has_changed);
    }
}
