//! Highlighter - A highlight layer that re-runs only when its inputs change
//!
//! Holds the options, optional custom chunk function and completion callback
//! for one highlight name. `sync` runs a pass when the root, keywords,
//! flags, name or chunk function changed since the last run; `refresh`
//! forces one (for DOM text edits that the inputs cannot see).
//!
//! Generic over the tree: `R` is the root type, `N` the text-node handle.

use super::change::ChangeDetector;
use super::config::HighlightOptions;
use super::dom::TextTree;
use super::engine::{highlight_text_in_dom, PassStats};
use super::error::{HighlightError, PatternError};
use super::locator::{ChunkLocator, FindChunksFn};
use super::log;
use super::range::StaticRange;
use super::registry::HighlightRegistry;
use super::style::{StyleRegistrar, StyleSink};

/// Completion callback, called with the ranges applied by each pass
pub type OnHighlightFn<N> = Box<dyn FnMut(&[StaticRange<N>])>;

pub struct Highlighter<R, N> {
    options: HighlightOptions,
    find_chunks: Option<FindChunksFn>,
    on_highlight: Option<OnHighlightFn<N>>,
    detector: ChangeDetector<R>,
    /// Built lazily, dropped whenever options or the chunk function change
    locator: Option<ChunkLocator>,
    rejected: Vec<PatternError>,
    ranges: Vec<StaticRange<N>>,
    stats: PassStats,
}

impl<R, N> Highlighter<R, N>
where
    R: Clone + PartialEq,
    N: Clone,
{
    pub fn new(options: HighlightOptions) -> Self {
        Self {
            options,
            find_chunks: None,
            on_highlight: None,
            detector: ChangeDetector::new(),
            locator: None,
            rejected: Vec::new(),
            ranges: Vec::new(),
            stats: PassStats::default(),
        }
    }

    pub fn options(&self) -> &HighlightOptions {
        &self.options
    }

    pub fn highlight_name(&self) -> &str {
        &self.options.highlight_name
    }

    pub fn set_options(&mut self, options: HighlightOptions) {
        if options != self.options {
            self.options = options;
            self.locator = None;
        }
    }

    /// Install or remove the custom chunk function. When present it takes
    /// precedence over keywords.
    pub fn set_find_chunks(&mut self, find_chunks: Option<FindChunksFn>) {
        self.find_chunks = find_chunks;
        self.locator = None;
    }

    pub fn set_on_highlight(&mut self, on_highlight: Option<OnHighlightFn<N>>) {
        self.on_highlight = on_highlight;
    }

    /// Inject this layer's style rule if the registrar has not seen the name
    pub fn register_style<S: StyleSink + ?Sized>(
        &self,
        styles: &mut StyleRegistrar,
        sink: &mut S,
    ) -> Result<bool, HighlightError> {
        styles.register_once(&self.options.highlight_name, self.options.style.as_ref(), sink)
    }

    /// `register_style` for callers about to run a pass: a sink failure is
    /// logged and reported as "nothing injected", never as an error.
    pub fn ensure_style<S: StyleSink + ?Sized>(&self, styles: &mut StyleRegistrar, sink: &mut S) -> bool {
        match self.register_style(styles, sink) {
            Ok(injected) => injected,
            Err(e) => {
                log::warn(
                    "StyleRegistrar",
                    &format!("Style for '{}' not applied: {}", self.options.highlight_name, e),
                );
                false
            }
        }
    }

    /// Run a pass if any input changed since the last one.
    ///
    /// Returns `true` if a pass ran.
    pub fn sync<T, G>(&mut self, tree: &T, root: &R, registry: Option<&mut G>) -> bool
    where
        T: TextTree<Root = R, Text = N>,
        G: HighlightRegistry<N> + ?Sized,
    {
        if !self.detector.has_changed(root, &self.options, self.find_chunks.as_ref()) {
            return false;
        }
        self.run(tree, root, registry);
        true
    }

    /// Run a pass unconditionally and return the applied ranges
    pub fn refresh<T, G>(&mut self, tree: &T, root: &R, registry: Option<&mut G>) -> &[StaticRange<N>]
    where
        T: TextTree<Root = R, Text = N>,
        G: HighlightRegistry<N> + ?Sized,
    {
        self.detector.has_changed(root, &self.options, self.find_chunks.as_ref());
        self.run(tree, root, registry);
        &self.ranges
    }

    /// Remove this layer from the registry and forget the last pass
    pub fn clear<G>(&mut self, registry: Option<&mut G>)
    where
        G: HighlightRegistry<N> + ?Sized,
    {
        if let Some(registry) = registry {
            if let Err(e) = registry.delete(&self.options.highlight_name) {
                log::warn("Highlighter", &format!("Failed to clear '{}': {}", self.options.highlight_name, e));
            }
        }
        self.ranges.clear();
        self.stats = PassStats::default();
        self.detector.invalidate();
    }

    /// Ranges the registry accepted in the last pass
    pub fn ranges(&self) -> &[StaticRange<N>] {
        &self.ranges
    }

    pub fn last_stats(&self) -> &PassStats {
        &self.stats
    }

    /// Keywords that failed to compile for the current options
    pub fn rejected_patterns(&self) -> &[PatternError] {
        &self.rejected
    }

    pub fn detector(&self) -> &ChangeDetector<R> {
        &self.detector
    }

    fn run<T, G>(&mut self, tree: &T, root: &R, registry: Option<&mut G>)
    where
        T: TextTree<Root = R, Text = N>,
        G: HighlightRegistry<N> + ?Sized,
    {
        let options = &self.options;
        let find_chunks = &self.find_chunks;
        let rejected = &mut self.rejected;
        let locator = self.locator.get_or_insert_with(|| {
            let (locator, errors) = ChunkLocator::for_options(options, find_chunks.clone());
            *rejected = errors;
            locator
        });

        let pass = highlight_text_in_dom(tree, root, locator, &options.highlight_name, registry);
        self.ranges = pass.ranges;
        self.stats = pass.stats;

        if let Some(on_highlight) = self.on_highlight.as_mut() {
            on_highlight(&self.ranges);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::dom::{Document, NodeId, TextHandle};
    use crate::highlight::locator::{FindChunksOptions, TextChunk};
    use crate::highlight::registry::MemoryRegistry;
    use crate::highlight::style::{HighlightStyle, StyleSheetLog};
    use std::cell::RefCell;
    use std::rc::Rc;

    type DocHighlighter = Highlighter<NodeId, TextHandle>;

    fn doc_with(text: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let node = doc.append_text(doc.root(), text).unwrap();
        (doc, node)
    }

    #[test]
    fn test_sync_runs_once_for_same_inputs() {
        let (doc, _) = doc_with("Rust rust RUST");
        let mut registry: MemoryRegistry<TextHandle> = MemoryRegistry::new();
        let mut highlighter = DocHighlighter::new(HighlightOptions::new("rust"));

        assert!(highlighter.sync(&doc, &doc.root(), Some(&mut registry)));
        assert!(!highlighter.sync(&doc, &doc.root(), Some(&mut registry)));
        assert_eq!(highlighter.ranges().len(), 3);
        assert_eq!(highlighter.detector().skip_count(), 1);
    }

    #[test]
    fn test_option_change_reruns() {
        let (doc, _) = doc_with("Rust rust RUST");
        let mut registry: MemoryRegistry<TextHandle> = MemoryRegistry::new();
        let mut highlighter = DocHighlighter::new(HighlightOptions::new("rust"));
        highlighter.sync(&doc, &doc.root(), Some(&mut registry));

        highlighter.set_options(HighlightOptions::new("rust").with_case_sensitive(true));
        assert!(highlighter.sync(&doc, &doc.root(), Some(&mut registry)));
        assert_eq!(highlighter.ranges().len(), 1);
        assert_eq!(registry.get("highlight-dom").unwrap().len(), 1);
    }

    #[test]
    fn test_refresh_sees_text_edits() {
        let (mut doc, node) = doc_with("one rust");
        let mut registry: MemoryRegistry<TextHandle> = MemoryRegistry::new();
        let mut highlighter = DocHighlighter::new(HighlightOptions::new("rust"));
        highlighter.sync(&doc, &doc.root(), Some(&mut registry));

        doc.set_text(node, "rust, two rust").unwrap();
        assert!(!doc.is_range_valid(&highlighter.ranges()[0]));
        assert!(!highlighter.sync(&doc, &doc.root(), Some(&mut registry)));

        let ranges = highlighter.refresh(&doc, &doc.root(), Some(&mut registry));
        assert_eq!(ranges.len(), 2);
        assert!(ranges.iter().all(|r| doc.is_range_valid(r)));
    }

    #[test]
    fn test_on_highlight_receives_ranges() {
        let (doc, _) = doc_with("a b a");
        let mut registry: MemoryRegistry<TextHandle> = MemoryRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in = Rc::clone(&seen);

        let mut highlighter = DocHighlighter::new(HighlightOptions::new("a"));
        highlighter.set_on_highlight(Some(Box::new(move |ranges: &[StaticRange<TextHandle>]| {
            seen_in.borrow_mut().push(ranges.len());
        })));

        highlighter.sync(&doc, &doc.root(), Some(&mut registry));
        highlighter.set_options(HighlightOptions::new(""));
        highlighter.sync(&doc, &doc.root(), Some(&mut registry));

        assert_eq!(*seen.borrow(), vec![2, 0]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_custom_chunks_replace_keywords() {
        let (doc, _) = doc_with("hello");
        let mut registry: MemoryRegistry<TextHandle> = MemoryRegistry::new();
        let mut highlighter = DocHighlighter::new(HighlightOptions::new("hello"));
        highlighter.sync(&doc, &doc.root(), Some(&mut registry));
        assert_eq!(highlighter.ranges()[0].chunk().len(), 5);

        let first_char: FindChunksFn = Rc::new(|_: &FindChunksOptions<'_>| vec![TextChunk::new(0, 1)]);
        highlighter.set_find_chunks(Some(first_char));
        assert!(highlighter.sync(&doc, &doc.root(), Some(&mut registry)));
        assert_eq!(doc.range_text(&highlighter.ranges()[0]).as_deref(), Some("h"));
    }

    #[test]
    fn test_rejected_patterns_reported() {
        let (doc, _) = doc_with("abc");
        let mut registry: MemoryRegistry<TextHandle> = MemoryRegistry::new();
        let mut highlighter = DocHighlighter::new(HighlightOptions::new(["(", "b"]));
        highlighter.sync(&doc, &doc.root(), Some(&mut registry));

        assert_eq!(highlighter.rejected_patterns().len(), 1);
        assert_eq!(highlighter.ranges().len(), 1);
    }

    #[test]
    fn test_clear_removes_entry_and_allows_rerun() {
        let (doc, _) = doc_with("rust");
        let mut registry: MemoryRegistry<TextHandle> = MemoryRegistry::new();
        let mut highlighter = DocHighlighter::new(HighlightOptions::new("rust").with_name("hit"));
        highlighter.sync(&doc, &doc.root(), Some(&mut registry));

        highlighter.clear(Some(&mut registry));
        assert!(!registry.has("hit"));
        assert!(highlighter.ranges().is_empty());
        assert!(highlighter.sync(&doc, &doc.root(), Some(&mut registry)));
        assert!(registry.has("hit"));
    }

    #[test]
    fn test_register_style_once_per_name() {
        let style = HighlightStyle {
            background_color: Some("yellow".into()),
            ..Default::default()
        };
        let first = DocHighlighter::new(HighlightOptions::new("a").with_name("hit").with_style(style.clone()));
        let second = DocHighlighter::new(HighlightOptions::new("b").with_name("hit").with_style(style));

        let mut styles = StyleRegistrar::new();
        let mut sink = StyleSheetLog::new();
        assert!(first.register_style(&mut styles, &mut sink).unwrap());
        assert!(!second.register_style(&mut styles, &mut sink).unwrap());
        assert_eq!(sink.rules, vec!["::highlight(hit) { background-color: yellow; }".to_string()]);
    }
}
