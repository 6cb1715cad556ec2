//! HighlightEngine - One highlight pass over a DOM subtree
//!
//! walk text nodes → locate chunks → build ranges → commit to the registry
//!
//! The commit is the only registry mutation of a pass: a non-empty result
//! replaces the entry for the highlight name, an empty one deletes it.
//! Without a registry (the host lacks `CSS.highlights`) the pass returns
//! nothing and touches nothing. A pass only reports ranges the registry
//! accepted.

use instant::Instant;
use serde::{Deserialize, Serialize};

use super::dom::TextTree;
use super::locator::ChunkLocator;
use super::log;
use super::range::{build_ranges, StaticRange};
use super::registry::HighlightRegistry;

// ==================== TYPE DEFINITIONS ====================

/// Counters for one pass
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PassStats {
    pub text_nodes: usize,
    pub chunks: usize,
    pub ranges: usize,
    /// Custom-locator chunks rejected for falling outside their node
    pub dropped_chunks: usize,
    /// The registry refused the update; `ranges` is then 0
    pub commit_failed: bool,
    pub elapsed_ms: f64,
}

/// Ranges applied by a pass, in document order
#[derive(Clone, Debug)]
pub struct HighlightPass<N> {
    pub ranges: Vec<StaticRange<N>>,
    pub stats: PassStats,
}

impl<N> Default for HighlightPass<N> {
    fn default() -> Self {
        Self {
            ranges: Vec::new(),
            stats: PassStats::default(),
        }
    }
}

// ==================== MAIN IMPLEMENTATION ====================

/// Walk `root` and build every range the locator asks for, without touching
/// any registry.
///
/// Ranges come out in document order, then in the locator's emission order
/// within a node. Overlapping ranges are kept.
pub fn collect_ranges<T: TextTree>(
    tree: &T,
    root: &T::Root,
    locator: &ChunkLocator,
) -> HighlightPass<T::Text> {
    let started = Instant::now();
    let mut pass = HighlightPass::default();

    for node in tree.text_nodes(root) {
        pass.stats.text_nodes += 1;
        let text = tree.text_content(&node);
        let (chunks, dropped) = locator.locate(&text);
        pass.stats.chunks += chunks.len();
        pass.stats.dropped_chunks += dropped;
        pass.ranges.extend(build_ranges(&node, &chunks));
    }

    pass.stats.ranges = pass.ranges.len();
    pass.stats.elapsed_ms = elapsed_ms(started);
    pass
}

/// Run a full pass for `name` and commit the result.
///
/// - `registry` is `None`: no-op, empty result.
/// - Locator has nothing to look for: the tree is not walked and the entry
///   for `name` is removed.
/// - Otherwise every text node under `root` is scanned once, and the entry
///   is set to the ranges found (or removed if there are none).
/// - If the registry rejects the update, the pass reports no ranges and
///   sets `stats.commit_failed`.
pub fn highlight_text_in_dom<T, R>(
    tree: &T,
    root: &T::Root,
    locator: &ChunkLocator,
    name: &str,
    registry: Option<&mut R>,
) -> HighlightPass<T::Text>
where
    T: TextTree,
    R: HighlightRegistry<T::Text> + ?Sized,
{
    let Some(registry) = registry else {
        log::debug("HighlightEngine", "Highlight registry unavailable, skipping pass");
        return HighlightPass::default();
    };

    if locator.is_empty() {
        let mut pass = HighlightPass::default();
        pass.stats.commit_failed = !commit::<T::Text, R>(registry, name, &[]);
        return pass;
    }

    let mut pass = collect_ranges(tree, root, locator);
    if !commit(registry, name, &pass.ranges) {
        pass.ranges.clear();
        pass.stats.ranges = 0;
        pass.stats.commit_failed = true;
    }
    pass
}

/// Returns false if the registry rejected the update
fn commit<N, R>(registry: &mut R, name: &str, ranges: &[StaticRange<N>]) -> bool
where
    R: HighlightRegistry<N> + ?Sized,
{
    let result = if ranges.is_empty() {
        registry.delete(name)
    } else {
        registry.set(name, ranges)
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn("HighlightEngine", &format!("Failed to update '{}': {}", name, e));
            false
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

// ==================== TESTS ====================
