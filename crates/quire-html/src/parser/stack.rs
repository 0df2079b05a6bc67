//! The stack of open elements and the operations defined over it.
//!
//! [§ 13.2.4.2 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)

use quire_dom::{ElementData, Namespace, NodeId};

use super::core::{InsertionMode, TreeBuilder};
use crate::tokenizer::TokenKind;

/// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#special)
///
/// HTML elements in the special category.
const SPECIAL_HTML: &[&str] = &[
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound", "blockquote",
    "body", "br", "button", "caption", "center", "col", "colgroup", "dd", "details", "dir", "div",
    "dl", "dt", "embed", "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "iframe", "img",
    "input", "keygen", "li", "link", "listing", "main", "marquee", "menu", "meta", "nav",
    "noembed", "noframes", "noscript", "object", "ol", "p", "param", "plaintext", "pre", "script",
    "search", "section", "select", "source", "style", "summary", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "title", "tr", "track", "ul", "wbr", "xmp",
];

/// [§ 13.2.6.3](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
const IMPLIED_END_TAGS: &[&str] = &[
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
];

/// [§ 13.2.6.3](https://html.spec.whatwg.org/multipage/parsing.html#generate-all-implied-end-tags-thoroughly)
const IMPLIED_END_TAGS_THOROUGH: &[&str] = &[
    "caption", "colgroup", "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
    "tbody", "td", "tfoot", "th", "thead", "tr",
];

/// [§ 13.2.4.2 Has an element in scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    /// "has an element in scope"
    Default,
    /// "has an element in list item scope"
    ListItem,
    /// "has an element in button scope"
    Button,
    /// "has an element in table scope"
    Table,
    /// "has an element in select scope"
    Select,
}

impl Scope {
    /// Whether `element` terminates the search in this scope.
    fn is_boundary(self, element: &ElementData) -> bool {
        let name = element.tag_name.as_str();
        match (self, element.namespace) {
            (Self::Table, Namespace::Html) => matches!(name, "html" | "table" | "template"),
            (Self::Table, _) => false,
            // "all element types except the following: optgroup, option"
            (Self::Select, Namespace::Html) => !matches!(name, "optgroup" | "option"),
            (Self::Select, _) => true,
            (Self::ListItem, Namespace::Html) if matches!(name, "ol" | "ul") => true,
            (Self::Button, Namespace::Html) if name == "button" => true,
            (_, Namespace::Html) => matches!(
                name,
                "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object" | "template"
            ),
            (_, Namespace::MathMl) => {
                matches!(name, "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml")
            }
            (_, Namespace::Svg) => matches!(name, "foreignObject" | "desc" | "title"),
        }
    }
}

impl TreeBuilder {
    /// "The current node is the bottommost node in this stack of open elements."
    pub(super) fn current_node(&self) -> Option<NodeId> {
        self.stack_of_open_elements.last().copied()
    }

    /// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#adjusted-current-node)
    ///
    /// "The adjusted current node is the context element if the parser was
    /// created as part of the HTML fragment parsing algorithm and the stack of
    /// open elements has only one element in it; otherwise, the adjusted
    /// current node is the current node."
    pub(super) fn adjusted_current_node(&self) -> Option<NodeId> {
        match self.context_element {
            Some(context) if self.stack_of_open_elements.len() == 1 => Some(context),
            _ => self.current_node(),
        }
    }

    /// Whether the current node is an HTML element named `name`.
    pub(super) fn current_node_is(&self, name: &str) -> bool {
        self.current_node()
            .is_some_and(|id| self.is_html_element(id, name))
    }

    /// Whether the current node is an HTML element named any of `names`.
    pub(super) fn current_node_is_one_of(&self, names: &[&str]) -> bool {
        self.current_node()
            .is_some_and(|id| self.is_html_element_in(id, names))
    }

    /// Push onto the stack of open elements, checking the depth budget.
    pub(super) fn push_open_element(&mut self, id: NodeId) {
        self.stack_of_open_elements.push(id);
        self.check_depth();
    }

    /// Pop the current node. An element closed by an end tag of its own name
    /// remembers where that end tag finished; any other element remembers
    /// where the token that closed it began.
    pub(super) fn pop_current_node(&mut self) -> Option<NodeId> {
        let id = self.stack_of_open_elements.pop()?;
        if !self.capture_spans {
            return Some(id);
        }
        if self.token_kind == TokenKind::EndTag
            && let Some(name) = self.token_tag.as_deref()
            && self
                .tree
                .as_element(id)
                .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(name))
        {
            let _ = self.explicit_ends.insert(id, self.token_source.end);
        } else {
            let _ = self.closed_at.insert(id, self.token_source.start);
        }
        Some(id)
    }

    /// "Pop elements from the stack of open elements until an HTML element
    /// with the tag name `name` has been popped from the stack."
    pub(super) fn pop_until(&mut self, name: &str) {
        while let Some(id) = self.pop_current_node() {
            if self.is_html_element(id, name) {
                break;
            }
        }
    }

    /// Pop until an HTML element named any of `names` has been popped.
    pub(super) fn pop_until_one_of(&mut self, names: &[&str]) {
        while let Some(id) = self.pop_current_node() {
            if self.is_html_element_in(id, names) {
                break;
            }
        }
    }

    /// Pop until `target` has been popped.
    pub(super) fn pop_until_node(&mut self, target: NodeId) {
        while let Some(id) = self.pop_current_node() {
            if id == target {
                break;
            }
        }
    }

    /// Remove `id` from anywhere in the stack.
    pub(super) fn remove_from_stack(&mut self, id: NodeId) {
        self.stack_of_open_elements.retain(|&open| open != id);
    }

    /// Whether `id` is on the stack of open elements.
    pub(super) fn is_open(&self, id: NodeId) -> bool {
        self.stack_of_open_elements.contains(&id)
    }

    /// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#special)
    pub(super) fn is_special(&self, id: NodeId) -> bool {
        let Some(element) = self.tree.as_element(id) else {
            return false;
        };
        let name = element.tag_name.as_str();
        match element.namespace {
            Namespace::Html => SPECIAL_HTML.contains(&name),
            Namespace::MathMl => {
                matches!(name, "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml")
            }
            Namespace::Svg => matches!(name, "foreignObject" | "desc" | "title"),
        }
    }

    /// [§ 13.2.4.2 Has an element in the specific scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
    ///
    /// Walks from the current node towards the root: a match wins, a scope
    /// boundary loses.
    fn has_in_scope(&self, scope: Scope, matches: impl Fn(NodeId, &ElementData) -> bool) -> bool {
        for &id in self.stack_of_open_elements.iter().rev() {
            let Some(element) = self.tree.as_element(id) else {
                continue;
            };
            // STEP 2: "If node is the target node, terminate in a match state."
            if matches(id, element) {
                return true;
            }
            // STEP 3: "Otherwise, if node is one of the element types in list,
            //          terminate in a failure state."
            if scope.is_boundary(element) {
                return false;
            }
        }
        false
    }

    /// Whether an HTML element named `name` is in `scope`.
    pub(super) fn has_element_in(&self, scope: Scope, name: &str) -> bool {
        self.has_in_scope(scope, |_, e| e.is_html(name))
    }

    /// Whether an HTML element named any of `names` is in `scope`.
    pub(super) fn has_any_element_in(&self, scope: Scope, names: &[&str]) -> bool {
        self.has_in_scope(scope, |_, e| {
            e.namespace == Namespace::Html && names.contains(&e.tag_name.as_str())
        })
    }

    /// Whether the element `target` is in scope.
    pub(super) fn has_node_in_scope(&self, target: NodeId) -> bool {
        self.has_in_scope(Scope::Default, |id, _| id == target)
    }

    /// [§ 13.2.6.3 Generate implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
    ///
    /// "while the current node is a dd element, a dt element, an li element,
    /// an optgroup element, an option element, a p element, an rb element, an
    /// rp element, an rt element, or an rtc element, the UA must pop the
    /// current node off the stack of open elements."
    ///
    /// "If a step requires the UA to generate implied end tags but lists an
    /// element to exclude from the process, then the UA must perform the above
    /// steps as if that element was not in the above list."
    pub(super) fn generate_implied_end_tags(&mut self, excluding: Option<&str>) {
        while let Some(id) = self.current_node()
            && self.is_html_element_in(id, IMPLIED_END_TAGS)
            && !excluding.is_some_and(|name| self.is_html_element(id, name))
        {
            let _ = self.pop_current_node();
        }
    }

    /// [§ 13.2.6.3](https://html.spec.whatwg.org/multipage/parsing.html#generate-all-implied-end-tags-thoroughly)
    pub(super) fn generate_all_implied_end_tags_thoroughly(&mut self) {
        while self.current_node_is_one_of(IMPLIED_END_TAGS_THOROUGH) {
            let _ = self.pop_current_node();
        }
    }

    /// Pop until the current node is one of `names` (or the stack is empty).
    fn clear_stack_back_to(&mut self, names: &[&str]) {
        while let Some(id) = self.current_node()
            && !self.is_html_element_in(id, names)
        {
            let _ = self.pop_current_node();
        }
    }

    /// [§ 13.2.6.4.9](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-stack-back-to-a-table-context)
    pub(super) fn clear_stack_back_to_table_context(&mut self) {
        self.clear_stack_back_to(&["table", "template", "html"]);
    }

    /// [§ 13.2.6.4.13](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-stack-back-to-a-table-body-context)
    pub(super) fn clear_stack_back_to_table_body_context(&mut self) {
        self.clear_stack_back_to(&["tbody", "tfoot", "thead", "template", "html"]);
    }

    /// [§ 13.2.6.4.14](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-stack-back-to-a-table-row-context)
    pub(super) fn clear_stack_back_to_table_row_context(&mut self) {
        self.clear_stack_back_to(&["tr", "template", "html"]);
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#close-a-p-element)
    ///
    /// "Generate implied end tags, except for p elements. If the current node
    /// is not a p element, then this is a parse error. Pop elements from the
    /// stack of open elements until a p element has been popped from the stack."
    pub(super) fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some("p"));
        if !self.current_node_is("p") {
            self.parse_error(crate::error::ParseErrorCode::UnclosedElements);
        }
        self.pop_until("p");
    }

    /// Close a `p` element if one is in button scope, as many start tags in
    /// "in body" require.
    pub(super) fn close_p_if_in_button_scope(&mut self) {
        if self.has_element_in(Scope::Button, "p") {
            self.close_p_element();
        }
    }

    /// [§ 13.2.6.4.15](https://html.spec.whatwg.org/multipage/parsing.html#close-the-cell)
    pub(super) fn close_the_cell(&mut self) {
        // STEP 1: "Generate implied end tags."
        self.generate_implied_end_tags(None);
        // STEP 2: "If the current node is not now a td element or a th element,
        //          then this is a parse error."
        if !self.current_node_is_one_of(&["td", "th"]) {
            self.parse_error(crate::error::ParseErrorCode::UnclosedElements);
        }
        // STEP 3: "Pop elements from the stack of open elements until a td
        //          element or a th element has been popped from the stack."
        self.pop_until_one_of(&["td", "th"]);
        // STEP 4: "Clear the list of active formatting elements up to the last marker."
        self.clear_active_formatting_elements_to_last_marker();
        // STEP 5: "Switch the insertion mode to "in row"."
        self.switch_mode(InsertionMode::InRow);
    }

    /// [§ 13.2.4.1 Reset the insertion mode appropriately](https://html.spec.whatwg.org/multipage/parsing.html#reset-the-insertion-mode-appropriately)
    pub(super) fn reset_insertion_mode_appropriately(&mut self) {
        let mode = self.appropriate_insertion_mode();
        self.switch_mode(mode);
    }

    fn appropriate_insertion_mode(&self) -> InsertionMode {
        let len = self.stack_of_open_elements.len();
        // STEP 3: "Loop: If node is the first node in the stack of open
        //          elements, then set last to true, and, if the parser was
        //          created as part of the HTML fragment parsing algorithm, set
        //          node to the context element."
        for index in (0..len).rev() {
            let last = index == 0;
            let node = match self.context_element {
                Some(context) if last => context,
                _ => self.stack_of_open_elements[index],
            };
            let Some(element) = self.tree.as_element(node) else {
                continue;
            };
            if element.namespace != Namespace::Html {
                if last {
                    return InsertionMode::InBody;
                }
                continue;
            }
            match element.tag_name.as_str() {
                // STEP 4: "If node is a select element"
                "select" => {
                    if !last {
                        for &ancestor in self.stack_of_open_elements[..index].iter().rev() {
                            if self.is_html_element(ancestor, "template") {
                                break;
                            }
                            if self.is_html_element(ancestor, "table") {
                                return InsertionMode::InSelectInTable;
                            }
                        }
                    }
                    return InsertionMode::InSelect;
                }
                // STEP 5: "If node is a td or th element and last is false"
                "td" | "th" if !last => return InsertionMode::InCell,
                "tr" => return InsertionMode::InRow,
                "tbody" | "thead" | "tfoot" => return InsertionMode::InTableBody,
                "caption" => return InsertionMode::InCaption,
                "colgroup" => return InsertionMode::InColumnGroup,
                "table" => return InsertionMode::InTable,
                // STEP 11: "If node is a template element, then switch the
                //           insertion mode to the current template insertion mode"
                "template" => {
                    return self
                        .template_insertion_modes
                        .last()
                        .copied()
                        .unwrap_or(InsertionMode::InTemplate);
                }
                "head" if !last => return InsertionMode::InHead,
                "body" => return InsertionMode::InBody,
                "frameset" => return InsertionMode::InFrameset,
                // STEP 15: "If node is an html element"
                "html" => {
                    return if self.head_element_pointer.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    };
                }
                _ if last => return InsertionMode::InBody,
                _ => {}
            }
        }
        InsertionMode::InBody
    }
}
