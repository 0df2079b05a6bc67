//! Document tree for the quire HTML parser.
//!
//! This crate provides an arena-based tree structure following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/), restricted to the
//! node kinds an HTML parser produces.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships,
//! providing O(1) access and traversal without borrow checker issues.
//!
//! While the tree constructor runs, ids are arena slots in allocation order
//! and some slots may end up detached (for example a `<body>` replaced by a
//! `<frameset>`). [`DomTree::into_preorder`] then rebuilds the arena so that
//! the root is id 1 and every attached descendant gets the next integer in
//! document pre-order. Finished trees are never renumbered again.

mod span;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use span::Span;

/// A type-safe index into the tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// Ids start at 1. In a finished tree they follow document pre-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document (or fragment) node is always id 1.
    pub const ROOT: Self = Self(1);

    const fn slot(self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// [§ 1.5 Namespaces](https://infra.spec.whatwg.org/#namespaces)
///
/// The element namespaces an HTML parser can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    /// "The HTML namespace is "http://www.w3.org/1999/xhtml"."
    #[default]
    Html,
    /// "The SVG namespace is "http://www.w3.org/2000/svg"."
    Svg,
    /// "The MathML namespace is "http://www.w3.org/1998/Math/MathML"."
    MathMl,
}

impl Namespace {
    /// The namespace URL.
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::Html => "http://www.w3.org/1999/xhtml",
            Self::Svg => "http://www.w3.org/2000/svg",
            Self::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }

    /// Short prefix used in normalized tree dumps (`svg path`, `math mi`).
    #[must_use]
    pub const fn dump_prefix(self) -> Option<&'static str> {
        match self {
            Self::Html => None,
            Self::Svg => Some("svg"),
            Self::MathMl => Some("math"),
        }
    }
}

/// Namespaces a foreign attribute can be adjusted into.
///
/// [§ 13.2.6.1 Adjust foreign attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-foreign-attributes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrNamespace {
    /// `http://www.w3.org/1999/xlink`
    XLink,
    /// `http://www.w3.org/XML/1998/namespace`
    Xml,
    /// `http://www.w3.org/2000/xmlns/`
    Xmlns,
}

impl AttrNamespace {
    /// Conventional prefix for the namespace.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::XLink => "xlink",
            Self::Xml => "xml",
            Self::Xmlns => "xmlns",
        }
    }
}

/// [§ 7.2 Quirks mode](https://dom.spec.whatwg.org/#concept-document-mode)
///
/// "Each document has an associated mode: "no-quirks", "quirks", or "limited-quirks"."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuirksMode {
    /// Standards mode.
    #[default]
    NoQuirks,
    /// Almost-standards mode.
    LimitedQuirks,
    /// Quirks mode.
    Quirks,
}

/// One attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local name (already lowercased or case-adjusted by the parser).
    pub name: String,
    /// Attribute value with character references resolved.
    pub value: String,
    /// Namespace for adjusted foreign attributes such as `xlink:href`.
    pub namespace: Option<AttrNamespace>,
    /// Source range from the first name byte to the end of the value.
    pub span: Option<Span>,
}

impl Attribute {
    /// An un-namespaced attribute without span.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            namespace: None,
            span: None,
        }
    }

    /// Qualified name as it appears in markup (`xlink:href`, `xmlns`).
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.namespace {
            None => self.name.clone(),
            Some(AttrNamespace::Xmlns) if self.name == "xmlns" => self.name.clone(),
            Some(ns) => format!("{}:{}", ns.prefix(), self.name),
        }
    }
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element):
/// "Elements have an associated namespace, namespace prefix, local name, ..."
///
/// Attributes are kept sorted by qualified name so that snapshots of
/// the same input are byte-stable regardless of source attribute order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// "An element's local name"
    pub tag_name: String,
    /// "An element's namespace"
    pub namespace: Namespace,
    /// "An element has an associated attribute list"
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    /// Build element data, normalizing attributes to sorted order.
    #[must_use]
    pub fn new(tag_name: impl Into<String>, namespace: Namespace, attrs: Vec<Attribute>) -> Self {
        let mut data = Self {
            tag_name: tag_name.into(),
            namespace,
            attrs,
        };
        data.normalize_attributes();
        data
    }

    /// An HTML element without attributes.
    #[must_use]
    pub fn html(tag_name: impl Into<String>) -> Self {
        Self::new(tag_name, Namespace::Html, Vec::new())
    }

    /// Sort attributes by qualified name.
    pub fn normalize_attributes(&mut self) {
        self.attrs.sort_by_cached_key(Attribute::qualified_name);
    }

    /// Whether this is the HTML element `name`.
    #[must_use]
    pub fn is_html(&self, name: &str) -> bool {
        self.namespace == Namespace::Html && self.tag_name == name
    }

    /// Look up an un-namespaced attribute value.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.namespace.is_none() && attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Whether an un-namespaced attribute `name` is present.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Add `attr` unless an attribute with the same qualified name exists.
    ///
    /// Returns whether the attribute was added.
    pub fn add_attribute_if_missing(&mut self, attr: Attribute) -> bool {
        let qualified = attr.qualified_name();
        if self.attrs.iter().any(|a| a.qualified_name() == qualified) {
            return false;
        }
        self.attrs.push(attr);
        self.normalize_attributes();
        true
    }
}

/// Data of a `<!DOCTYPE>` node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DoctypeData {
    /// Doctype name, lowercased.
    pub name: String,
    /// Public identifier, when one was given.
    pub public_id: Option<String>,
    /// System identifier, when one was given.
    pub system_id: Option<String>,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.7 Interface DocumentFragment](https://dom.spec.whatwg.org/#interface-documentfragment)
    ///
    /// Root of a fragment parse, and the contents of a `<template>`.
    Fragment,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.14 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
    /// [§ 4.6 Interface DocumentType](https://dom.spec.whatwg.org/#interface-documenttype)
    Doctype(DoctypeData),
}

/// A node: its payload, its links and its optional source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    pub children: Vec<NodeId>,

    /// Source range this node was built from; `None` for synthesized nodes.
    pub span: Option<Span>,
}

impl Node {
    const fn new(node_type: NodeType, span: Option<Span>) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
            span,
        }
    }
}

/// Arena-based tree with O(1) node access.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomTree {
    /// All nodes, slot `i` holding id `i + 1`.
    nodes: Vec<Node>,
    quirks_mode: QuirksMode,
}

impl DomTree {
    /// Create a new tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(NodeType::Document)
    }

    /// Create a new tree whose root is a Fragment node.
    #[must_use]
    pub fn new_fragment() -> Self {
        Self::with_root(NodeType::Fragment)
    }

    fn with_root(node_type: NodeType) -> Self {
        Self {
            nodes: vec![Node::new(node_type, None)],
            quirks_mode: QuirksMode::NoQuirks,
        }
    }

    /// Get the root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Children of the root.
    #[must_use]
    pub fn root_children(&self) -> &[NodeId] {
        self.children(NodeId::ROOT)
    }

    /// Whether the root is a Fragment.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        matches!(
            self.get(NodeId::ROOT).map(|n| &n.node_type),
            Some(NodeType::Fragment)
        )
    }

    /// The document's quirks mode flag.
    #[must_use]
    pub const fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    /// Set the document's quirks mode flag.
    pub const fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot()?)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.slot()?)
    }

    /// Number of allocated nodes (attached or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        self.alloc_with_span(node_type, None)
    }

    /// Allocate a new node carrying `span`.
    pub fn alloc_with_span(&mut self, node_type: NodeType, span: Option<Span>) -> NodeId {
        self.nodes.push(Node::new(node_type, span));
        NodeId(self.nodes.len())
    }

    /// The span recorded for `id`.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.get(id).and_then(|n| n.span)
    }

    /// Replace the span recorded for `id`.
    pub fn set_span(&mut self, id: NodeId, span: Option<Span>) {
        if let Some(node) = self.get_mut(id) {
            node.span = span;
        }
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// [§ 4.2.3 Pre-insert](https://dom.spec.whatwg.org/#concept-node-pre-insert)
    ///
    /// Inserts `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None` or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.detach(child);
        let Some(parent_node) = self.get_mut(parent) else {
            return;
        };
        let position = reference
            .and_then(|r| parent_node.children.iter().position(|&c| c == r))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(position, child);
        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = Some(parent);
        }
    }

    /// [§ 4.2.5 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Removes `child` from `parent`. Does nothing if `child` is not a child
    /// of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) == Some(parent) {
            self.detach(child);
        }
    }

    /// Detach `id` from its parent, if it has one.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = self
            .get_mut(from)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for child in &children {
            if let Some(node) = self.get_mut(*child) {
                node.parent = Some(to);
            }
        }
        if let Some(target) = self.get_mut(to) {
            target.children.extend(children);
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over `id` and its attached descendants in document pre-order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> PreorderIterator<'_> {
        PreorderIterator {
            tree: self,
            stack: vec![id],
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|n| self.as_text(n))
            .collect()
    }

    /// The contents fragment of a `<template>` element.
    #[must_use]
    pub fn template_contents(&self, id: NodeId) -> Option<NodeId> {
        let element = self.as_element(id)?;
        if !element.is_html("template") {
            return None;
        }
        self.children(id).iter().copied().find(|&child| {
            matches!(self.get(child).map(|n| &n.node_type), Some(NodeType::Fragment))
        })
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.root_children()
            .iter()
            .copied()
            .find(|&id| self.as_element(id).is_some())
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// "The body element of a document is the first of the html element's children
    /// that is either a body element or a frameset element, or null if there is
    /// no such element."
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html).iter().copied().find(|&id| {
            self.as_element(id)
                .is_some_and(|e| e.is_html("body") || e.is_html("frameset"))
        })
    }

    /// Rebuild the arena in document pre-order.
    ///
    /// The root becomes id 1 and every node reachable from it gets the next
    /// integer in depth-first, child-order traversal. Nodes that are no
    /// longer attached are dropped.
    #[must_use]
    pub fn into_preorder(self) -> Self {
        let order: Vec<NodeId> = self.descendants(NodeId::ROOT).collect();
        let mut remap = vec![None; self.nodes.len()];
        for (index, old) in order.iter().enumerate() {
            if let Some(slot) = old.slot() {
                remap[slot] = Some(NodeId(index + 1));
            }
        }
        let lookup = |id: NodeId| id.slot().and_then(|slot| remap.get(slot).copied().flatten());

        let mut old_nodes: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for old in order {
            let Some(mut node) = old.slot().and_then(|slot| old_nodes[slot].take()) else {
                continue;
            };
            node.parent = node.parent.and_then(lookup);
            node.children = node.children.into_iter().filter_map(lookup).collect();
            nodes.push(node);
        }
        Self {
            nodes,
            quirks_mode: self.quirks_mode,
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Depth-first, child-order iterator over a subtree.
pub struct PreorderIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for PreorderIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
