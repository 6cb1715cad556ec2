//! ChunkLocator - Finds the spans to highlight inside one text node
//!
//! Two strategies behind one enum, picked once per pass:
//! - `Patterns`: runs every compiled keyword pattern over the text
//! - `Custom`: delegates to a caller-supplied function
//!
//! Chunk offsets are UTF-16 code units, the unit DOM ranges use.
//! Chunks from different patterns are neither merged nor deduplicated;
//! overlapping chunks are expected downstream.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::config::HighlightOptions;
use super::error::PatternError;
use super::log;
use super::pattern::{compile_patterns, CompiledPattern};
use super::text::{utf16_len, Utf16Cursor};

// ==================== TYPE DEFINITIONS ====================

/// `{start, end}` offsets (end exclusive) within one text node
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextChunk {
    pub start: u32,
    pub end: u32,
}

impl TextChunk {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `start < end <= len`
    pub fn fits(&self, len: u32) -> bool {
        self.start < self.end && self.end <= len
    }
}

/// Arguments handed to a custom chunk function
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FindChunksOptions<'a> {
    /// Normalized keywords the caller supplied alongside the function
    pub patterns: &'a [String],
    /// Full text of the node being scanned
    pub text_content: &'a str,
}

/// Caller-supplied chunk finder. `Rc` so its identity can be compared
/// between passes.
pub type FindChunksFn = Rc<dyn Fn(&FindChunksOptions<'_>) -> Vec<TextChunk>>;

// ==================== MAIN IMPLEMENTATION ====================

pub enum ChunkLocator {
    Patterns(Vec<CompiledPattern>),
    Custom {
        find_chunks: FindChunksFn,
        patterns: Vec<String>,
    },
}

impl std::fmt::Debug for ChunkLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkLocator::Patterns(patterns) => f.debug_tuple("Patterns").field(patterns).finish(),
            ChunkLocator::Custom { patterns, .. } => f
                .debug_struct("Custom")
                .field("patterns", patterns)
                .finish_non_exhaustive(),
        }
    }
}

impl ChunkLocator {
    /// Select the strategy for a pass.
    ///
    /// A custom function wins over keywords when both are present; the
    /// keywords are then only forwarded to it as `patterns`.
    pub fn for_options(
        options: &HighlightOptions,
        find_chunks: Option<FindChunksFn>,
    ) -> (Self, Vec<PatternError>) {
        match find_chunks {
            Some(find_chunks) => (
                ChunkLocator::Custom {
                    find_chunks,
                    patterns: options.keywords.normalize(),
                },
                Vec::new(),
            ),
            None => {
                let compiled = compile_patterns(&options.keywords, options.case_sensitive, options.escape);
                (ChunkLocator::Patterns(compiled.patterns), compiled.rejected)
            }
        }
    }

    /// Nothing to look for: no usable patterns and no custom function
    pub fn is_empty(&self) -> bool {
        match self {
            ChunkLocator::Patterns(patterns) => patterns.is_empty(),
            ChunkLocator::Custom { .. } => false,
        }
    }

    pub fn find_chunks(&self, text: &str) -> Vec<TextChunk> {
        self.locate(text).0
    }

    /// Chunks for `text` plus the number of out-of-bounds chunks dropped
    pub(crate) fn locate(&self, text: &str) -> (Vec<TextChunk>, usize) {
        match self {
            ChunkLocator::Patterns(patterns) => (pattern_chunks(patterns, text), 0),
            ChunkLocator::Custom { find_chunks, patterns } => {
                let raw = find_chunks(&FindChunksOptions {
                    patterns,
                    text_content: text,
                });
                let len = utf16_len(text);
                let total = raw.len();
                let chunks: Vec<TextChunk> = raw.into_iter().filter(|chunk| chunk.fits(len)).collect();
                let dropped = total - chunks.len();
                if dropped > 0 {
                    log::warn(
                        "ChunkLocator",
                        &format!("Dropped {} chunk(s) outside 0..{} from custom findChunks", dropped, len),
                    );
                }
                (chunks, dropped)
            }
        }
    }
}

fn pattern_chunks(patterns: &[CompiledPattern], text: &str) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    for pattern in patterns {
        let mut cursor = Utf16Cursor::new(text);
        for (start, end) in pattern.match_spans(text) {
            let start = cursor.offset_at(start);
            let end = cursor.offset_at(end);
            chunks.push(TextChunk::new(start, end));
        }
    }
    chunks
}

// ==================== TESTS ====================
