//! Node creation and insertion.
//!
//! [§ 13.2.6.1 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#creating-and-inserting-nodes)

use quire_dom::{Attribute as DomAttribute, DoctypeData, ElementData, Namespace, NodeId, NodeType, Span};

use super::core::TreeBuilder;
use crate::tokenizer::{Attribute, Token};

/// Where a node goes: a parent and the child to insert before (`None` means
/// "at the end").
pub(super) type InsertionLocation = (NodeId, Option<NodeId>);

/// Tags whose presence as the target turns on foster parenting.
const FOSTER_TARGETS: &[&str] = &["table", "tbody", "tfoot", "thead", "tr"];

impl TreeBuilder {
    /// Allocate a node, counting it against the node budget.
    pub(super) fn alloc_node(&mut self, node_type: NodeType, span: Option<Span>) -> NodeId {
        self.record_node();
        self.tree.alloc_with_span(node_type, span)
    }

    /// Copy a token's attributes into DOM attributes. Spans are only kept
    /// when the element itself has one.
    pub(super) fn dom_attributes(attributes: &[Attribute], keep_spans: bool) -> Vec<DomAttribute> {
        attributes
            .iter()
            .map(|attr| DomAttribute {
                name: attr.name.clone(),
                value: attr.value.clone(),
                namespace: None,
                span: keep_spans.then_some(attr.span),
            })
            .collect()
    }

    /// [§ 13.2.6.1 Create an element for a token](https://html.spec.whatwg.org/multipage/parsing.html#create-an-element-for-the-token)
    ///
    /// `attributes` are already adjusted for foreign content. A `template`
    /// element gets its contents fragment as a child.
    pub(super) fn create_element(
        &mut self,
        name: &str,
        namespace: Namespace,
        attributes: Vec<DomAttribute>,
        span: Option<Span>,
    ) -> NodeId {
        let is_template = namespace == Namespace::Html && name == "template";
        let id = self.alloc_node(
            NodeType::Element(ElementData::new(name, namespace, attributes)),
            span,
        );
        if is_template {
            // [§ 4.12.3](https://html.spec.whatwg.org/multipage/scripting.html#template-contents)
            let contents = self.alloc_node(NodeType::Fragment, None);
            self.tree.append_child(id, contents);
        }
        id
    }

    /// "Create an element for the token", with the span of the token being
    /// processed.
    pub(super) fn create_element_for_token(&mut self, token: &Token, namespace: Namespace) -> NodeId {
        let span = self.token_span;
        self.create_element_with_span(token, namespace, span)
    }

    /// Create an element from a stored start tag. Elements recreated from the
    /// list of active formatting elements pass `None`: they have no source.
    pub(super) fn create_element_with_span(
        &mut self,
        token: &Token,
        namespace: Namespace,
        span: Option<Span>,
    ) -> NodeId {
        let (name, attributes) = match token {
            Token::StartTag {
                name, attributes, ..
            }
            | Token::EndTag {
                name, attributes, ..
            } => (name.as_str(), Self::dom_attributes(attributes, span.is_some())),
            _ => ("", Vec::new()),
        };
        self.create_element(name, namespace, attributes, span)
    }

    /// [§ 13.2.6.1 Appropriate place for inserting a node](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-place-for-inserting-a-node)
    pub(super) fn appropriate_place_for_inserting(
        &self,
        override_target: Option<NodeId>,
    ) -> InsertionLocation {
        // STEP 1: "If there was an override target specified, then let target
        //          be the override target. Otherwise, let target be the current node."
        let target = override_target
            .or_else(|| self.current_node())
            .unwrap_or(NodeId::ROOT);

        // STEP 2: "Determine the adjusted insertion location"
        let location = if self.foster_parenting
            && self
                .tree
                .as_element(target)
                .is_some_and(|e| e.namespace == Namespace::Html && FOSTER_TARGETS.contains(&e.tag_name.as_str()))
        {
            self.foster_parent_location()
        } else {
            // "Otherwise: Let adjusted insertion location be inside target,
            //  after its last child (if any)."
            (target, None)
        };

        // STEP 3: "If the adjusted insertion location is inside a template
        //          element, let it instead be inside the template element's
        //          template contents, after its last child (if any)."
        match self.tree.template_contents(location.0) {
            Some(contents) => (contents, None),
            None => location,
        }
    }

    /// [§ 13.2.6.1 Foster parenting](https://html.spec.whatwg.org/multipage/parsing.html#foster-parent)
    fn foster_parent_location(&self) -> InsertionLocation {
        // STEP 2.1: "Let last template be the last template element in the
        //            stack of open elements, if any."
        let last_template = self.last_open_element_index("template");
        // STEP 2.2: "Let last table be the last table element in the stack of
        //            open elements, if any."
        let last_table = self.last_open_element_index("table");

        // STEP 2.3: "If there is a last template and either there is no last
        //            table, or there is one, but last template is lower (more
        //            recently added) than last table in the stack of open
        //            elements, then: let adjusted insertion location be inside
        //            last template's template contents"
        if let Some(template) = last_template
            && last_table.is_none_or(|table| template > table)
        {
            return (self.stack_of_open_elements[template], None);
        }

        // STEP 2.4: "If there is no last table, then let adjusted insertion
        //            location be inside the first element in the stack of open
        //            elements (the html element), after its last child (if any)"
        let Some(table_index) = last_table else {
            let html = self
                .stack_of_open_elements
                .first()
                .copied()
                .unwrap_or(NodeId::ROOT);
            return (html, None);
        };
        let table = self.stack_of_open_elements[table_index];

        // STEP 2.5: "If last table has a parent node, then let adjusted
        //            insertion location be inside last table's parent node,
        //            immediately before last table"
        if let Some(parent) = self.tree.parent(table) {
            return (parent, Some(table));
        }

        // STEP 2.6-2.7: "Let previous element be the element immediately above
        //                last table in the stack of open elements" and insert
        //                "inside previous element, after its last child"
        let previous = table_index
            .checked_sub(1)
            .map_or(NodeId::ROOT, |i| self.stack_of_open_elements[i]);
        (previous, None)
    }

    fn last_open_element_index(&self, name: &str) -> Option<usize> {
        self.stack_of_open_elements
            .iter()
            .rposition(|&id| self.is_html_element(id, name))
    }

    /// Place `child` at `location`.
    pub(super) fn insert_at(&mut self, location: InsertionLocation, child: NodeId) {
        let (parent, before) = location;
        self.tree.insert_before(parent, child, before);
    }

    /// [§ 13.2.6.1 Insert a foreign element](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-foreign-element)
    ///
    /// Creates the element at the appropriate place and pushes it onto the
    /// stack of open elements.
    pub(super) fn insert_element(
        &mut self,
        name: &str,
        namespace: Namespace,
        attributes: Vec<DomAttribute>,
    ) -> NodeId {
        // STEP 1: "Let the adjusted insertion location be the appropriate
        //          place for inserting a node."
        let location = self.appropriate_place_for_inserting(None);
        // STEP 2: "Let element be the result of creating an element for the token"
        let span = self.token_span;
        let id = self.create_element(name, namespace, attributes, span);
        // STEP 3: "If it is possible to insert element at the adjusted
        //          insertion location, then insert element"
        self.insert_at(location, id);
        // STEP 4: "Push element onto the stack of open elements so that it is
        //          the new current node."
        self.push_open_element(id);
        id
    }

    /// [§ 13.2.6.1 Insert an HTML element](https://html.spec.whatwg.org/multipage/parsing.html#insert-an-html-element)
    pub(super) fn insert_html_element(&mut self, token: &Token) -> NodeId {
        let (name, attributes) = match token {
            Token::StartTag {
                name, attributes, ..
            } => (name.as_str(), attributes.as_slice()),
            _ => ("", [].as_slice()),
        };
        let attributes = Self::dom_attributes(attributes, self.token_span.is_some());
        self.insert_element(name, Namespace::Html, attributes)
    }

    /// Insert an HTML element for a tag the parser synthesizes ("insert an
    /// HTML element for a "body" start tag token with no attributes").
    pub(super) fn insert_synthesized_element(&mut self, name: &str) -> NodeId {
        let span = std::mem::take(&mut self.token_span);
        let id = self.insert_element(name, Namespace::Html, Vec::new());
        self.token_span = span;
        id
    }

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character)
    pub(super) fn insert_characters(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        // STEP 2: "Let the adjusted insertion location be the appropriate
        //          place for inserting a node."
        let (parent, before) = self.appropriate_place_for_inserting(None);

        // STEP 3: "If the adjusted insertion location is in a Document node,
        //          then return."
        if matches!(
            self.tree.get(parent).map(|n| &n.node_type),
            Some(NodeType::Document)
        ) {
            return;
        }

        // STEP 4: "If there is a Text node immediately before the adjusted
        //          insertion location, then append data to that Text node's data."
        let previous = match before {
            Some(reference) => self.tree.prev_sibling(reference),
            None => self.tree.last_child(parent),
        };
        let span = self.token_span;
        if let Some(previous) = previous
            && let Some(node) = self.tree.get_mut(previous)
            && let NodeType::Text(text) = &mut node.node_type
        {
            text.push_str(data);
            node.span = match (node.span, span) {
                (Some(existing), Some(next)) if existing.end == next.start => {
                    Some(Span::new(existing.start, next.end))
                }
                _ => None,
            };
            return;
        }

        // "Otherwise, create a new Text node whose data is data ... and insert
        //  the newly created node at the adjusted insertion location."
        let text = self.alloc_node(NodeType::Text(data.to_string()), span);
        self.tree.insert_before(parent, text, before);
    }

    /// [§ 13.2.6.1 Insert a comment](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-comment)
    ///
    /// `position` overrides the appropriate place ("as the last child of the
    /// Document object", "as the last child of the first element in the
    /// stack of open elements").
    pub(super) fn insert_comment(&mut self, data: &str, position: Option<NodeId>) {
        let location = match position {
            Some(parent) => (parent, None),
            None => self.appropriate_place_for_inserting(None),
        };
        let span = self.token_span;
        let comment = self.alloc_node(NodeType::Comment(data.to_string()), span);
        self.insert_at(location, comment);
    }

    /// Append a DocumentType node to the Document.
    pub(super) fn insert_doctype(&mut self, data: DoctypeData) {
        let span = self.token_span;
        let doctype = self.alloc_node(NodeType::Doctype(data), span);
        self.tree.append_child(NodeId::ROOT, doctype);
    }

    /// Whether `id` is an HTML element named `name`.
    pub(super) fn is_html_element(&self, id: NodeId, name: &str) -> bool {
        self.tree.as_element(id).is_some_and(|e| e.is_html(name))
    }

    /// Whether `id` is an HTML element named any of `names`.
    pub(super) fn is_html_element_in(&self, id: NodeId, names: &[&str]) -> bool {
        self.tree
            .as_element(id)
            .is_some_and(|e| e.namespace == Namespace::Html && names.contains(&e.tag_name.as_str()))
    }

    /// "Add the attribute and its corresponding value to that element" for
    /// every attribute the element does not already have.
    pub(super) fn merge_attributes(&mut self, id: NodeId, attributes: &[Attribute]) {
        let keep_spans = self.capture_spans;
        let Some(element) = self.tree.as_element_mut(id) else {
            return;
        };
        for attr in Self::dom_attributes(attributes, keep_spans) {
            let _ = element.add_attribute_if_missing(attr);
        }
    }
}
