//! Tree to markup.
//!
//! [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
//!
//! The tree is first flattened into a stream of start/end/leaf events. In
//! the fixture-accurate form ([`SerializeOptions::omit_optional_tags`]),
//! each start and end tag is then checked against the
//! [§ 13.1.2.4 optional tags](https://html.spec.whatwg.org/multipage/syntax.html#optional-tags)
//! table, looking at the event right after it (and, for `tbody`, the one
//! right before it).

use quire_dom::{DomTree, ElementData, Namespace, NodeId, NodeType};

use crate::options::SerializeOptions;

/// "If current node is an area, base, basefont, bgsound, br, col, embed,
/// frame, hr, img, input, keygen, link, meta, param, source, track or wbr
/// element, then continue on to the next child node at this point."
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// "If the parent of current node is a style, script, xmp, iframe, noembed,
/// noframes, or plaintext element, or if the parent of current node is a
/// noscript element and scripting is enabled for the node, then append the
/// value of current node's data literally."
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Start tags that make an omitted `</p>` safe.
const P_CLOSERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dialog", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "search", "section", "table", "ul",
];

/// "...if there is no more content in the parent element and the parent
/// element is an HTML element that is not an a, audio, del, ins, map,
/// noscript, or video element"
const P_TRANSPARENT_PARENTS: &[&str] = &["a", "audio", "del", "ins", "map", "noscript", "video"];

/// Elements an omitted `<body>` start tag must not be followed by, since
/// they would be parsed into the head instead.
const HEAD_CONTENT: &[&str] = &[
    "base", "basefont", "bgsound", "link", "meta", "noframes", "script", "style", "template",
    "title",
];

/// Serialize every child of the tree's root.
#[must_use]
pub fn serialize_tree(tree: &DomTree, options: &SerializeOptions) -> String {
    serialize_node(tree, tree.root(), options)
}

/// Serialize one node. Elements include their own tags; a document or
/// fragment serializes its children.
#[must_use]
pub fn serialize_node(tree: &DomTree, id: NodeId, options: &SerializeOptions) -> String {
    let mut serializer = Serializer {
        tree,
        options,
        events: Vec::new(),
        out: String::new(),
    };
    serializer.flatten(id);
    serializer.write_events();
    serializer.out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Start(NodeId),
    End(NodeId),
    Leaf(NodeId),
}

/// Pending work while flattening.
#[derive(Debug, Clone, Copy)]
enum Visit {
    Enter(NodeId),
    Exit(NodeId),
}

/// The event following (or preceding) a tag, as the omission table sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Adjacent<'a> {
    Start(&'a str),
    End(&'a str),
    Comment,
    /// Text starting with ASCII whitespace.
    Space,
    Text,
    Nothing,
}

struct Serializer<'a> {
    tree: &'a DomTree,
    options: &'a SerializeOptions,
    events: Vec<Event>,
    out: String,
}

impl<'a> Serializer<'a> {
    /// Walk the subtree at `root` into start/end/leaf events, using an
    /// explicit stack so deep trees cannot exhaust the call stack.
    fn flatten(&mut self, root: NodeId) {
        let tree = self.tree;
        let mut stack = vec![Visit::Enter(root)];
        while let Some(visit) = stack.pop() {
            let id = match visit {
                Visit::Enter(id) => id,
                Visit::Exit(id) => {
                    self.events.push(Event::End(id));
                    continue;
                }
            };
            let Some(node) = tree.get(id) else {
                continue;
            };
            match &node.node_type {
                NodeType::Document | NodeType::Fragment => {
                    stack.extend(node.children.iter().rev().map(|&child| Visit::Enter(child)));
                }
                NodeType::Element(element) => {
                    self.events.push(Event::Start(id));
                    if is_void(element) {
                        continue;
                    }
                    // A template's children are its contents fragment, which
                    // flattens to the fragment's children.
                    stack.push(Visit::Exit(id));
                    stack.extend(node.children.iter().rev().map(|&child| Visit::Enter(child)));
                }
                NodeType::Text(_) | NodeType::Comment(_) | NodeType::Doctype(_) => {
                    self.events.push(Event::Leaf(id));
                }
            }
        }
    }

    fn write_events(&mut self) {
        for index in 0..self.events.len() {
            match self.events[index] {
                Event::Start(id) => {
                    if !(self.options.omit_optional_tags && self.start_tag_optional(index, id)) {
                        self.write_start_tag(id);
                    }
                }
                Event::End(id) => {
                    if !(self.options.omit_optional_tags && self.end_tag_optional(index, id)) {
                        self.write_end_tag(id);
                    }
                }
                Event::Leaf(id) => self.write_leaf(id),
            }
        }
    }

    fn element(&self, id: NodeId) -> Option<&'a ElementData> {
        self.tree.as_element(id)
    }

    fn adjacent(&self, index: Option<usize>) -> Adjacent<'a> {
        let Some(event) = index.and_then(|index| self.events.get(index)) else {
            return Adjacent::Nothing;
        };
        let tree: &'a DomTree = self.tree;
        match *event {
            Event::Start(id) => Adjacent::Start(tree.as_element(id).map_or("", |e| e.tag_name.as_str())),
            Event::End(id) => Adjacent::End(tree.as_element(id).map_or("", |e| e.tag_name.as_str())),
            Event::Leaf(id) => match tree.get(id).map(|node| &node.node_type) {
                Some(NodeType::Comment(_)) => Adjacent::Comment,
                Some(NodeType::Text(text)) if text.starts_with(is_ascii_space) => Adjacent::Space,
                _ => Adjacent::Text,
            },
        }
    }

    /// [§ 13.1.2.4 Optional tags](https://html.spec.whatwg.org/multipage/syntax.html#optional-tags),
    /// start tags. A start tag carrying attributes is never omitted.
    fn start_tag_optional(&self, index: usize, id: NodeId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        if element.namespace != Namespace::Html || !element.attrs.is_empty() {
            return false;
        }
        let next = self.adjacent(Some(index + 1));
        match element.tag_name.as_str() {
            // "An html element's start tag may be omitted if the first thing
            // inside the html element is not a comment."
            "html" => !matches!(next, Adjacent::Comment | Adjacent::Space),
            // "A head element's start tag may be omitted if the element is
            // empty, or if the first thing inside the head element is an
            // element."
            "head" => matches!(next, Adjacent::Start(_) | Adjacent::End(_)),
            // "A body element's start tag may be omitted if the element is
            // empty, or if the first thing inside the body element is not
            // ASCII whitespace or a comment, except if the first thing inside
            // the body element is a meta, noscript, link, script, style, or
            // template element."
            "body" => match next {
                Adjacent::Comment | Adjacent::Space => false,
                Adjacent::Start(name) => !HEAD_CONTENT.contains(&name),
                _ => true,
            },
            // "A colgroup element's start tag may be omitted if the first
            // thing inside the colgroup element is a col element"
            "colgroup" => next == Adjacent::Start("col"),
            // "A tbody element's start tag may be omitted if the first thing
            // inside the tbody element is a tr element, and if the element is
            // not immediately preceded by a tbody, thead, or tfoot element
            // whose end tag has been omitted."
            "tbody" => {
                let previous = self.adjacent(index.checked_sub(1));
                next == Adjacent::Start("tr")
                    && !matches!(previous, Adjacent::End("tbody" | "thead" | "tfoot"))
            }
            _ => false,
        }
    }

    /// [§ 13.1.2.4 Optional tags](https://html.spec.whatwg.org/multipage/syntax.html#optional-tags),
    /// end tags.
    fn end_tag_optional(&self, index: usize, id: NodeId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        if element.namespace != Namespace::Html {
            return false;
        }
        let next = self.adjacent(Some(index + 1));
        let closes_parent = matches!(next, Adjacent::End(_) | Adjacent::Nothing);
        let name = element.tag_name.as_str();
        match name {
            // "An html element's end tag may be omitted if the html element
            // is not immediately followed by a comment." (head and body
            // likewise, plus ASCII whitespace.)
            "html" | "head" | "body" => !matches!(next, Adjacent::Comment | Adjacent::Space),
            // "An li element's end tag may be omitted if the li element is
            // immediately followed by another li element or if there is no
            // more content in the parent element."
            "li" | "tr" => match next {
                Adjacent::Start(other) => other == name,
                _ => closes_parent,
            },
            // "An optgroup element's end tag may be omitted if the optgroup
            // element is immediately followed by another optgroup element, if
            // it is immediately followed by an hr element, or if there is no
            // more content in the parent element."
            "optgroup" => match next {
                Adjacent::Start(other) => matches!(other, "optgroup" | "hr"),
                _ => closes_parent,
            },
            // "A dt element's end tag may be omitted if the dt element is
            // immediately followed by another dt element or a dd element."
            "dt" => matches!(next, Adjacent::Start("dt" | "dd")),
            "dd" => match next {
                Adjacent::Start(other) => matches!(other, "dt" | "dd"),
                _ => closes_parent,
            },
            "p" => match next {
                Adjacent::Start(other) => P_CLOSERS.contains(&other),
                _ => closes_parent && self.p_parent_allows_omission(id),
            },
            // "An option element's end tag may be omitted if the option
            // element is immediately followed by another option element, if
            // it is immediately followed by an optgroup element, if it is
            // immediately followed by an hr element, or if there is no more
            // content in the parent element."
            "option" => match next {
                Adjacent::Start(other) => matches!(other, "option" | "optgroup" | "hr"),
                _ => closes_parent,
            },
            "rt" | "rp" => match next {
                Adjacent::Start(other) => matches!(other, "rt" | "rp"),
                _ => closes_parent,
            },
            // "A colgroup element's end tag may be omitted if the colgroup
            // element is not immediately followed by ASCII whitespace or a
            // comment." A following colgroup keeps it, so the next start
            // tag is not mistaken for a continuation.
            "colgroup" => match next {
                Adjacent::Comment | Adjacent::Space => false,
                Adjacent::Start(other) => other != "colgroup",
                _ => true,
            },
            // "A caption element's end tag may be omitted if the caption
            // element is not immediately followed by ASCII whitespace or a
            // comment."
            "caption" => !matches!(next, Adjacent::Comment | Adjacent::Space),
            // A following tbody keeps the end tag; see the tbody start tag.
            "thead" => next == Adjacent::Start("tfoot"),
            "tbody" => match next {
                Adjacent::Start(other) => other == "tfoot",
                _ => closes_parent,
            },
            "tfoot" => closes_parent,
            "td" | "th" => match next {
                Adjacent::Start(other) => matches!(other, "td" | "th"),
                _ => closes_parent,
            },
            _ => false,
        }
    }

    fn p_parent_allows_omission(&self, id: NodeId) -> bool {
        self.tree
            .parent(id)
            .and_then(|parent| self.element(parent))
            .is_none_or(|parent| {
                parent.namespace == Namespace::Html
                    && !P_TRANSPARENT_PARENTS.contains(&parent.tag_name.as_str())
            })
    }

    fn write_start_tag(&mut self, id: NodeId) {
        let Some(element) = self.element(id) else {
            return;
        };
        self.out.push('<');
        self.out.push_str(&element.tag_name);
        for attr in &element.attrs {
            self.out.push(' ');
            self.out.push_str(&attr.qualified_name());
            self.out.push('=');
            write_attribute_value(&mut self.out, &attr.value, self.options.quote_char);
        }
        self.out.push('>');
        // "If current node is a pre, textarea, or listing element, and the
        // first child node of the element, if any, is a Text node whose
        // character data has as its first character a U+000A LINE FEED (LF)
        // character, then append a U+000A LINE FEED (LF) character."
        if element.namespace == Namespace::Html
            && matches!(element.tag_name.as_str(), "pre" | "textarea" | "listing")
            && self
                .tree
                .first_child(id)
                .and_then(|child| self.tree.as_text(child))
                .is_some_and(|text| text.starts_with('\n'))
        {
            self.out.push('\n');
        }
    }

    fn write_end_tag(&mut self, id: NodeId) {
        let Some(element) = self.element(id) else {
            return;
        };
        self.out.push_str("</");
        self.out.push_str(&element.tag_name);
        self.out.push('>');
    }

    fn write_leaf(&mut self, id: NodeId) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        match &node.node_type {
            NodeType::Text(text) => {
                if self.is_raw_text_parent(node.parent) {
                    self.out.push_str(text);
                } else {
                    escape_text(&mut self.out, text);
                }
            }
            NodeType::Comment(data) => {
                self.out.push_str("<!--");
                self.out.push_str(data);
                self.out.push_str("-->");
            }
            NodeType::Doctype(doctype) => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(&doctype.name);
                match (&doctype.public_id, &doctype.system_id) {
                    (Some(public), system) => {
                        self.out.push_str(" PUBLIC ");
                        write_identifier(&mut self.out, public);
                        if let Some(system) = system {
                            self.out.push(' ');
                            write_identifier(&mut self.out, system);
                        }
                    }
                    (None, Some(system)) => {
                        self.out.push_str(" SYSTEM ");
                        write_identifier(&mut self.out, system);
                    }
                    (None, None) => {}
                }
                self.out.push('>');
            }
            NodeType::Document | NodeType::Fragment | NodeType::Element(_) => {}
        }
    }

    fn is_raw_text_parent(&self, parent: Option<NodeId>) -> bool {
        parent.and_then(|parent| self.element(parent)).is_some_and(|element| {
            element.namespace == Namespace::Html
                && (RAW_TEXT_ELEMENTS.contains(&element.tag_name.as_str())
                    || (self.options.scripting && element.tag_name == "noscript"))
        })
    }
}

fn is_void(element: &ElementData) -> bool {
    element.namespace == Namespace::Html && VOID_ELEMENTS.contains(&element.tag_name.as_str())
}

const fn is_ascii_space(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

/// [§ 13.3 Escaping a string](https://html.spec.whatwg.org/multipage/parsing.html#escapingString)
///
/// Text mode: `&`, `<` and `>`.
pub fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Attribute mode: `&` and the quote in use. The preferred quote is used
/// unless the value contains it and not the other one.
pub fn write_attribute_value(out: &mut String, value: &str, preferred: char) {
    let (preferred, other) = if preferred == '\'' { ('\'', '"') } else { ('"', '\'') };
    let quote = if value.contains(preferred) && !value.contains(other) {
        other
    } else {
        preferred
    };
    out.push(quote);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if quote == '"' => out.push_str("&quot;"),
            '\'' if quote == '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// DOCTYPE identifiers cannot contain escapes, so the quote is picked to
/// avoid the identifier's own quotes.
fn write_identifier(out: &mut String, identifier: &str) {
    let quote = if identifier.contains('"') { '\'' } else { '"' };
    out.push(quote);
    out.push_str(identifier);
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        let mut out = String::new();
        escape_text(&mut out, "a < b && c > \"d\"");
        assert_eq!(out, "a &lt; b &amp;&amp; c &gt; \"d\"");
    }

    #[test]
    fn test_attribute_quote_choice() {
        let mut out = String::new();
        write_attribute_value(&mut out, "plain", '"');
        assert_eq!(out, "\"plain\"");

        out.clear();
        write_attribute_value(&mut out, "say \"hi\"", '"');
        assert_eq!(out, "'say \"hi\"'");

        out.clear();
        write_attribute_value(&mut out, "both \" and '", '"');
        assert_eq!(out, "\"both &quot; and '\"");

        out.clear();
        write_attribute_value(&mut out, "it's & that", '\'');
        assert_eq!(out, "\"it's &amp; that\"");
    }
}
