//! HighlightCore: DOM keyword highlighting engine
//!
//! A Rust/WASM implementation of keyword highlighting on top of the CSS
//! Custom Highlight API. Matched text is never wrapped in elements; the
//! engine only produces static ranges and hands them to the named
//! highlight registry (`CSS.highlights` in the browser).
//!
//! # Architecture
//!
//! ## Matching
//! - `pattern.rs` - Pattern compiler: keyword normalization, escaping, regex build
//! - `locator.rs` - ChunkLocator: pattern-based or callback-based chunk finding
//! - `text.rs` - UTF-16 offset helpers (DOM offsets are UTF-16 code units)
//!
//! ## Ranges & Registries
//! - `dom.rs` - TextTree abstraction + in-memory Document
//! - `range.rs` - StaticRange and the range builder
//! - `engine.rs` - The highlight pass (walk, locate, build, commit)
//! - `registry.rs` - HighlightRegistry trait + in-memory registry
//! - `style.rs` - Allow-listed highlight styles and the StyleRegistrar
//!
//! ## Bindings
//! - `highlighter.rs` - Highlighter: re-runs a pass when its inputs change
//! - `wasm.rs` - Browser binding (TreeWalker, `CSS.highlights`, adoptedStyleSheets)
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { DomHighlighter, highlightTextInDom } from 'highlightcore';
//!
//! await init();
//!
//! // One-shot pass
//! const ranges = highlightTextInDom(element, { keywords: ['react', 'rust'] });
//!
//! // Tracked highlighter: re-runs only when inputs change
//! const highlighter = new DomHighlighter({
//!   keywords: 'React',
//!   highlightName: 'search-hit',
//!   style: { backgroundColor: 'yellow', color: 'black' },
//! });
//! highlighter.onHighlight((ranges) => console.log(ranges.length));
//! highlighter.sync(element);
//! ```

pub mod highlight;

pub use highlight::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("highlightcore v{}", env!("CARGO_PKG_VERSION"))
}
