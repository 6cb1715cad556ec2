//! Browser binding
//!
//! - `WebDom`: `TextTree` over `web_sys` via a `SHOW_TEXT` TreeWalker
//! - `CssHighlights`: `HighlightRegistry` over `CSS.highlights`
//! - `AdoptedStyleSheets`: `StyleSink` that appends a constructed sheet
//! - `highlightTextInDom`, `registerHighlightStyle`, `DomHighlighter`: JS API
//!
//! `CSS.highlights` and the `Highlight` constructor are reached through
//! `js_sys::Reflect` so a missing API is detected instead of throwing.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Reflect};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CssStyleSheet, Document, Node, Text};

use super::config::HighlightOptions;
use super::dom::TextTree;
use super::engine::highlight_text_in_dom;
use super::error::HighlightError;
use super::highlighter::Highlighter;
use super::locator::{ChunkLocator, FindChunksFn, FindChunksOptions, TextChunk};
use super::log;
use super::range::StaticRange;
use super::registry::HighlightRegistry;
use super::style::{HighlightStyle, StyleRegistrar, StyleSink};

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 0x4;

thread_local! {
    /// Names with an injected style rule, for the lifetime of the module
    static STYLES: RefCell<StyleRegistrar> = RefCell::new(StyleRegistrar::new());
}

fn js_error(context: &str, err: JsValue) -> HighlightError {
    HighlightError::Dom(format!("{}: {:?}", context, err))
}

// ==================== TEXT TREE ====================

/// The live document, walked with a TreeWalker
pub struct WebDom;

impl WebDom {
    fn document_for(root: &Node) -> Option<Document> {
        root.owner_document()
            .or_else(|| root.clone().dyn_into::<Document>().ok())
            .or_else(|| web_sys::window().and_then(|w| w.document()))
    }
}

impl TextTree for WebDom {
    type Root = Node;
    type Text = Text;

    fn text_nodes(&self, root: &Node) -> Vec<Text> {
        let mut out = Vec::new();
        let Some(document) = Self::document_for(root) else {
            log::warn("HighlightEngine", "No document available for root node");
            return out;
        };
        let walker = match document.create_tree_walker_with_what_to_show(root, SHOW_TEXT) {
            Ok(walker) => walker,
            Err(e) => {
                log::warn("HighlightEngine", &js_error("createTreeWalker failed", e).to_string());
                return out;
            }
        };

        loop {
            match walker.next_node() {
                Ok(Some(node)) => {
                    if let Ok(text) = node.dyn_into::<Text>() {
                        out.push(text);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn("HighlightEngine", &js_error("TreeWalker.nextNode failed", e).to_string());
                    break;
                }
            }
        }
        out
    }

    fn text_content<'a>(&'a self, node: &'a Text) -> Cow<'a, str> {
        Cow::Owned(node.data())
    }
}

/// Materialize ranges as DOM `StaticRange` objects
pub fn to_js_ranges(ranges: &[StaticRange<Text>]) -> Result<Array, HighlightError> {
    let out = Array::new();
    for range in ranges {
        let init = web_sys::StaticRangeInit::new(&range.node, range.end, &range.node, range.start);
        let js_range = web_sys::StaticRange::new(&init).map_err(|e| js_error("new StaticRange failed", e))?;
        out.push(&js_range);
    }
    Ok(out)
}

// ==================== REGISTRY ====================

/// `CSS.highlights`
///
/// Keeps the `StaticRange` objects of its last update so callers hand the
/// registered objects back to JS instead of building copies.
pub struct CssHighlights {
    registry: JsValue,
    applied: Array,
}

impl CssHighlights {
    /// `None` when the host has no CSS Custom Highlight API
    pub fn detect() -> Option<Self> {
        let global = js_sys::global();
        let css = Reflect::get(&global, &JsValue::from_str("CSS")).ok()?;
        if css.is_undefined() || css.is_null() {
            return None;
        }
        let registry = Reflect::get(&css, &JsValue::from_str("highlights")).ok()?;
        if registry.is_undefined() || registry.is_null() {
            return None;
        }
        Some(Self {
            registry,
            applied: Array::new(),
        })
    }

    /// Range objects registered by the last successful `set` (empty after
    /// `delete` or a failed update)
    pub fn applied(&self) -> &Array {
        &self.applied
    }

    fn method(target: &JsValue, name: &str) -> Result<Function, HighlightError> {
        Reflect::get(target, &JsValue::from_str(name))
            .map_err(|e| js_error(name, e))?
            .dyn_into()
            .map_err(|_| HighlightError::Dom(format!("{} is not callable", name)))
    }

    fn call(&self, method: &str, args: &Array) -> Result<JsValue, HighlightError> {
        let func = Self::method(&self.registry, method)?;
        Reflect::apply(&func, &self.registry, args).map_err(|e| js_error(method, e))
    }

    /// Empty `Highlight` filled one `add` call per range; constructor
    /// arguments are capped by the engine's argument limit.
    fn new_highlight(ranges: &Array) -> Result<JsValue, HighlightError> {
        let ctor: Function = Reflect::get(&js_sys::global(), &JsValue::from_str("Highlight"))
            .map_err(|e| js_error("Highlight", e))?
            .dyn_into()
            .map_err(|_| HighlightError::Dom("Highlight constructor unavailable".to_string()))?;
        let highlight = Reflect::construct(&ctor, &Array::new()).map_err(|e| js_error("new Highlight failed", e))?;

        let add = Self::method(&highlight, "add")?;
        for range in ranges.iter() {
            add.call1(&highlight, &range).map_err(|e| js_error("Highlight.add failed", e))?;
        }
        Ok(highlight)
    }
}

impl HighlightRegistry<Text> for CssHighlights {
    fn set(&mut self, name: &str, ranges: &[StaticRange<Text>]) -> Result<(), HighlightError> {
        self.applied = Array::new();
        let js_ranges = to_js_ranges(ranges)?;
        let highlight = Self::new_highlight(&js_ranges)?;
        self.call("set", &Array::of2(&JsValue::from_str(name), &highlight))?;
        self.applied = js_ranges;
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), HighlightError> {
        self.applied = Array::new();
        self.call("delete", &Array::of1(&JsValue::from_str(name)))?;
        Ok(())
    }

    fn has(&self, name: &str) -> bool {
        self.call("has", &Array::of1(&JsValue::from_str(name)))
            .map(|v| v.as_bool().unwrap_or(false))
            .unwrap_or(false)
    }
}

// ==================== STYLE SINK ====================

/// Appends one constructed `CSSStyleSheet` per rule to
/// `document.adoptedStyleSheets`
pub struct AdoptedStyleSheets {
    document: Document,
}

impl AdoptedStyleSheets {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn for_window() -> Option<Self> {
        web_sys::window().and_then(|w| w.document()).map(Self::new)
    }
}

impl StyleSink for AdoptedStyleSheets {
    fn inject(&mut self, css: &str) -> Result<(), HighlightError> {
        let style_err = |context: &str, e: JsValue| HighlightError::Style(format!("{}: {:?}", context, e));

        let sheet = CssStyleSheet::new().map_err(|e| style_err("new CSSStyleSheet failed", e))?;
        sheet.replace_sync(css).map_err(|e| style_err("replaceSync failed", e))?;

        let sheets: Array = Reflect::get(&self.document, &JsValue::from_str("adoptedStyleSheets"))
            .map_err(|e| style_err("adoptedStyleSheets", e))?
            .dyn_into()
            .map_err(|_| HighlightError::Style("adoptedStyleSheets unsupported".to_string()))?;
        sheets.push(&sheet);
        Ok(())
    }
}

// ==================== JS CALLBACKS ====================

/// Chunk as returned from JS; numbers may be fractional or negative
#[derive(Deserialize)]
struct JsChunk {
    start: f64,
    end: f64,
}

impl JsChunk {
    fn to_chunk(&self) -> Option<TextChunk> {
        let valid = |n: f64| n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64;
        (valid(self.start) && valid(self.end)).then(|| TextChunk::new(self.start as u32, self.end as u32))
    }
}

fn js_find_chunks(func: Function) -> FindChunksFn {
    Rc::new(move |options: &FindChunksOptions<'_>| {
        let args = match serde_wasm_bindgen::to_value(options) {
            Ok(args) => args,
            Err(e) => {
                log::warn("ChunkLocator", &format!("Failed to serialize findChunks options: {}", e));
                return Vec::new();
            }
        };
        let result = match func.call1(&JsValue::NULL, &args) {
            Ok(result) => result,
            Err(e) => {
                log::warn("ChunkLocator", &format!("findChunks threw: {:?}", e));
                return Vec::new();
            }
        };
        match serde_wasm_bindgen::from_value::<Vec<JsChunk>>(result) {
            Ok(chunks) => chunks.iter().filter_map(JsChunk::to_chunk).collect(),
            Err(e) => {
                log::warn("ChunkLocator", &format!("findChunks returned malformed chunks: {}", e));
                Vec::new()
            }
        }
    })
}

fn parse_options(options: JsValue) -> Result<HighlightOptions, HighlightError> {
    if options.is_null() || options.is_undefined() {
        return Ok(HighlightOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| HighlightError::InvalidOptions(e.to_string()))
}

fn parse_style(style: JsValue) -> Result<Option<HighlightStyle>, HighlightError> {
    if style.is_null() || style.is_undefined() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(style)
        .map(Some)
        .map_err(|e| HighlightError::InvalidOptions(format!("style: {}", e)))
}

fn register_style(name: &str, style: Option<&HighlightStyle>) -> Result<bool, HighlightError> {
    let Some(mut sink) = AdoptedStyleSheets::for_window() else {
        return Ok(false);
    };
    STYLES.with(|styles| styles.borrow_mut().register_once(name, style, &mut sink))
}

// ==================== JS API ====================

/// True if the host supports the CSS Custom Highlight API
#[wasm_bindgen(js_name = isHighlightSupported)]
pub fn is_highlight_supported() -> bool {
    CssHighlights::detect().is_some()
}

/// Highlight keyword matches (or custom chunks) under `root`.
///
/// Returns the applied `StaticRange`s. An empty array means nothing was
/// highlighted, including when the API is unsupported.
#[wasm_bindgen(js_name = highlightTextInDom)]
pub fn js_highlight_text_in_dom(
    root: &Node,
    options: JsValue,
    find_chunks: Option<Function>,
) -> Result<Array, JsValue> {
    let options = parse_options(options)?;
    let (locator, _) = ChunkLocator::for_options(&options, find_chunks.map(js_find_chunks));
    let Some(mut registry) = CssHighlights::detect() else {
        return Ok(Array::new());
    };
    highlight_text_in_dom(&WebDom, root, &locator, &options.highlight_name, Some(&mut registry));
    Ok(registry.applied().clone())
}

/// Inject `::highlight(name)` styling once per name.
///
/// Returns true if a rule was injected by this call.
#[wasm_bindgen(js_name = registerHighlightStyle)]
pub fn js_register_highlight_style(name: &str, style: JsValue) -> Result<bool, JsValue> {
    let style = parse_style(style)?;
    Ok(register_style(name, style.as_ref())?)
}

/// One tracked highlight layer
#[wasm_bindgen]
pub struct DomHighlighter {
    inner: Highlighter<Node, Text>,
    on_highlight: Option<Function>,
    /// `StaticRange` objects registered by the last pass
    applied: Array,
}

#[wasm_bindgen]
impl DomHighlighter {
    /// # Arguments
    /// * `options` - `{ keywords, highlightName, caseSensitive, escape, style }`, all optional
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<DomHighlighter, JsValue> {
        Ok(Self {
            inner: Highlighter::new(parse_options(options)?),
            on_highlight: None,
            applied: Array::new(),
        })
    }

    #[wasm_bindgen(js_name = setOptions)]
    pub fn set_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        self.inner.set_options(parse_options(options)?);
        Ok(())
    }

    /// Custom `({ patterns, textContent }) => [{ start, end }]`; overrides keywords
    #[wasm_bindgen(js_name = setFindChunks)]
    pub fn set_find_chunks(&mut self, find_chunks: Option<Function>) {
        self.inner.set_find_chunks(find_chunks.map(js_find_chunks));
    }

    /// Called with the applied `StaticRange[]` after every pass
    #[wasm_bindgen(js_name = onHighlight)]
    pub fn on_highlight(&mut self, callback: Option<Function>) {
        self.on_highlight = callback;
    }

    /// Register the style (once per name) and run a pass if inputs changed.
    /// Returns true if a pass ran. A style that cannot be injected is
    /// logged; the pass still runs.
    pub fn sync(&mut self, root: &Node) -> bool {
        self.ensure_style();
        let mut registry = CssHighlights::detect();
        let ran = self.inner.sync(&WebDom, root, registry.as_mut());
        if ran {
            self.finish_pass(registry.as_ref());
        }
        ran
    }

    /// Force a pass, e.g. after the text under `root` changed
    pub fn refresh(&mut self, root: &Node) -> Array {
        self.ensure_style();
        let mut registry = CssHighlights::detect();
        self.inner.refresh(&WebDom, root, registry.as_mut());
        self.finish_pass(registry.as_ref());
        self.applied.clone()
    }

    /// Remove this layer from `CSS.highlights`
    pub fn clear(&mut self) {
        let mut registry = CssHighlights::detect();
        self.inner.clear(registry.as_mut());
        self.applied = Array::new();
    }

    /// Ranges applied by the last pass (the objects held by `CSS.highlights`)
    pub fn ranges(&self) -> Array {
        self.applied.clone()
    }

    /// Keywords rejected as invalid expressions
    #[wasm_bindgen(js_name = getRejectedPatterns)]
    pub fn get_rejected_patterns(&self) -> Array {
        self.inner
            .rejected_patterns()
            .iter()
            .map(|e| JsValue::from_str(&e.to_string()))
            .collect()
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.last_stats())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

impl DomHighlighter {
    fn ensure_style(&self) {
        let Some(mut sink) = AdoptedStyleSheets::for_window() else {
            return;
        };
        STYLES.with(|styles| {
            self.inner.ensure_style(&mut styles.borrow_mut(), &mut sink);
        });
    }

    fn finish_pass(&mut self, registry: Option<&CssHighlights>) {
        self.applied = registry.map(|r| r.applied().clone()).unwrap_or_else(Array::new);
        if let Some(callback) = &self.on_highlight {
            if let Err(e) = callback.call1(&JsValue::NULL, &self.applied) {
                log::warn("Highlighter", &format!("onHighlight failed: {:?}", e));
            }
        }
    }
}
