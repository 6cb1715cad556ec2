//! Text trees: what the highlight pass walks
//!
//! `TextTree` is the seam between the engine and a concrete DOM. The browser
//! binding implements it over `web_sys` (see `wasm.rs`); `Document` is an
//! arena-backed tree used natively and in tests.
//!
//! `Document` hands out `TextHandle`s (node index + revision) instead of
//! references. Detaching a node or changing its text invalidates every
//! handle taken before, and with it every range built on those handles.

use std::borrow::Cow;

use super::error::HighlightError;
use super::range::StaticRange;
use super::text::utf16_slice;

// ==================== TRAIT ====================

pub trait TextTree {
    /// Node a pass starts from
    type Root;
    /// Handle to a text node; ranges anchor to it
    type Text: Clone;

    /// Text descendants of `root` in document order. `root` itself is not
    /// visited, matching a `SHOW_TEXT` tree walker.
    fn text_nodes(&self, root: &Self::Root) -> Vec<Self::Text>;

    /// Character data of a text node
    fn text_content<'a>(&'a self, node: &'a Self::Text) -> Cow<'a, str>;
}

// ==================== IN-MEMORY DOCUMENT ====================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A text node as seen at a specific revision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextHandle {
    pub id: NodeId,
    pub revision: u32,
}

#[derive(Clone, Debug)]
enum NodeKind {
    Element(String),
    Text(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    revision: u32,
}

/// Arena-backed DOM subset: elements and text nodes
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// New document with an empty `body` root
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Element("body".to_string()),
                parent: None,
                children: Vec::new(),
                revision: 0,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            revision: 0,
        });
        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, HighlightError> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| HighlightError::Dom(format!("Unknown node {}", id.0)))
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(tag.to_string()))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(NodeKind::Text(content.to_string()))
    }

    /// Create an element under `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, HighlightError> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Create a text node under `parent`
    pub fn append_text(&mut self, parent: NodeId, content: &str) -> Result<NodeId, HighlightError> {
        let id = self.create_text(content);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Move `child` to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HighlightError> {
        if let NodeKind::Text(_) = self.node(parent)?.kind {
            return Err(HighlightError::Dom("Text nodes cannot have children".to_string()));
        }
        self.node(child)?;
        if child == self.root() {
            return Err(HighlightError::Dom("The root cannot be re-parented".to_string()));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(HighlightError::Dom("A node cannot be appended inside itself".to_string()));
        }

        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        self.bump(child);
        Ok(())
    }

    /// Detach `node` (and its subtree) from the document
    pub fn remove(&mut self, node: NodeId) -> Result<(), HighlightError> {
        self.node(node)?;
        if node == self.root() {
            return Err(HighlightError::Dom("The root cannot be removed".to_string()));
        }
        self.detach(node);
        self.bump(node);
        Ok(())
    }

    /// Replace a text node's content
    pub fn set_text(&mut self, node: NodeId, content: &str) -> Result<(), HighlightError> {
        let data = self
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| HighlightError::Dom(format!("Unknown node {}", node.0)))?;
        match &mut data.kind {
            NodeKind::Text(text) => *text = content.to_string(),
            NodeKind::Element(_) => {
                return Err(HighlightError::Dom(format!("Node {} is not a text node", node.0)));
            }
        }
        data.revision += 1;
        Ok(())
    }

    /// Current content of a text node
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node.0).map(|data| data.children.as_slice()).unwrap_or(&[])
    }

    /// True if `node` hangs off the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root(), node)
    }

    /// Handle to a text node at its current revision
    pub fn handle(&self, node: NodeId) -> Option<TextHandle> {
        let data = self.nodes.get(node.0)?;
        match data.kind {
            NodeKind::Text(_) => Some(TextHandle {
                id: node,
                revision: data.revision,
            }),
            NodeKind::Element(_) => None,
        }
    }

    /// Text behind a handle, or `None` once the handle went stale
    pub fn resolve(&self, handle: &TextHandle) -> Option<&str> {
        let data = self.nodes.get(handle.id.0)?;
        if data.revision != handle.revision || !self.is_connected(handle.id) {
            return None;
        }
        self.text(handle.id)
    }

    pub fn is_range_valid(&self, range: &StaticRange<TextHandle>) -> bool {
        self.range_text(range).is_some()
    }

    /// Text covered by a range, if the range is still valid
    pub fn range_text(&self, range: &StaticRange<TextHandle>) -> Option<String> {
        let text = self.resolve(&range.node)?;
        utf16_slice(text, range.start, range.end)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|data| data.parent);
        }
        false
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != node);
        }
    }

    /// Invalidate handles into `node`'s subtree
    fn bump(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            self.nodes[id.0].revision += 1;
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
    }
}

impl TextTree for Document {
    type Root = NodeId;
    type Text = TextHandle;

    fn text_nodes(&self, root: &NodeId) -> Vec<TextHandle> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(*root).iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if let Some(handle) = self.handle(id) {
                out.push(handle);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }

        out
    }

    fn text_content<'a>(&'a self, node: &'a TextHandle) -> Cow<'a, str> {
        Cow::Borrowed(self.text(node.id).unwrap_or_default())
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::locator::TextChunk;

    fn sample() -> (Document, NodeId, Vec<NodeId>) {
        // <body><div>one<p>two<b>three</b></p>four</div></body>
        let mut doc = Document::new();
        let div = doc.append_element(doc.root(), "div").unwrap();
        let one = doc.append_text(div, "one").unwrap();
        let p = doc.append_element(div, "p").unwrap();
        let two = doc.append_text(p, "two").unwrap();
        let b = doc.append_element(p, "b").unwrap();
        let three = doc.append_text(b, "three").unwrap();
        let four = doc.append_text(div, "four").unwrap();
        (doc, div, vec![one, two, three, four])
    }

    #[test]
    fn test_text_nodes_document_order() {
        let (doc, div, texts) = sample();
        let found: Vec<NodeId> = doc.text_nodes(&div).iter().map(|h| h.id).collect();
        assert_eq!(found, texts);

        let contents: Vec<String> = doc
            .text_nodes(&doc.root())
            .iter()
            .map(|h| doc.text_content(h).into_owned())
            .collect();
        assert_eq!(contents, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_text_root_has_no_descendants() {
        let (doc, _, texts) = sample();
        assert!(doc.text_nodes(&texts[0]).is_empty());
    }

    #[test]
    fn test_append_rules() {
        let (mut doc, div, texts) = sample();
        assert!(doc.append_child(texts[0], div).is_err());
        assert!(doc.append_child(div, div).is_err());
        let p = doc.children(div)[1];
        assert!(doc.append_child(p, div).is_err());
        assert!(doc.append_child(div, doc.root()).is_err());
    }

    #[test]
    fn test_set_text_invalidates_handles() {
        let (mut doc, _, texts) = sample();
        let handle = doc.handle(texts[0]).unwrap();
        let range = StaticRange::new(handle, TextChunk::new(0, 3));
        assert_eq!(doc.range_text(&range).as_deref(), Some("one"));

        doc.set_text(texts[0], "uno").unwrap();
        assert!(doc.resolve(&handle).is_none());
        assert!(!doc.is_range_valid(&range));
        assert_eq!(doc.resolve(&doc.handle(texts[0]).unwrap()), Some("uno"));
    }

    #[test]
    fn test_remove_invalidates_subtree() {
        let (mut doc, div, texts) = sample();
        let p = doc.children(div)[1];
        let three = doc.handle(texts[2]).unwrap();
        let four = doc.handle(texts[3]).unwrap();

        doc.remove(p).unwrap();
        assert!(!doc.is_connected(texts[2]));
        assert!(doc.resolve(&three).is_none());
        assert_eq!(doc.resolve(&four), Some("four"));

        let found: Vec<NodeId> = doc.text_nodes(&div).iter().map(|h| h.id).collect();
        assert_eq!(found, vec![texts[0], texts[3]]);
    }

    #[test]
    fn test_set_text_on_element_fails() {
        let (mut doc, div, _) = sample();
        assert!(doc.set_text(div, "x").is_err());
        assert_eq!(doc.tag(div), Some("div"));
    }
}
