//! StaticRange and the range builder
//!
//! A range pins one text node plus `[start, end)` UTF-16 offsets. It holds a
//! node *handle*, never ownership of the node; whether the handle is still
//! good is the tree's call (see `Document::is_range_valid`).

use serde::{Deserialize, Serialize};

use super::locator::TextChunk;

/// Immutable, non-live span within one text node
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StaticRange<N> {
    pub node: N,
    pub start: u32,
    pub end: u32,
}

impl<N> StaticRange<N> {
    pub fn new(node: N, chunk: TextChunk) -> Self {
        Self {
            node,
            start: chunk.start,
            end: chunk.end,
        }
    }

    pub fn chunk(&self) -> TextChunk {
        TextChunk::new(self.start, self.end)
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anchor every chunk of one node, keeping emission order
pub fn build_ranges<N: Clone>(node: &N, chunks: &[TextChunk]) -> Vec<StaticRange<N>> {
    chunks
        .iter()
        .map(|chunk| StaticRange::new(node.clone(), *chunk))
        .collect()
}
