//! Normalized tree dump in the html5lib tree-construction test format.
//!
//! ```text
//! | <!DOCTYPE html>
//! | <html>
//! |   <head>
//! |   <body>
//! |     <p>
//! |       class="x"
//! |       "Hi"
//! ```
//!
//! Foreign elements carry their namespace (`<svg svg>`, `<math mi>`),
//! namespaced attributes their prefix (`xlink href="#a"`), and template
//! contents appear under a `content` line.

use std::fmt::Write as _;

use quire_dom::{DomTree, NodeId, NodeType};

/// Render the whole tree.
#[must_use]
pub fn to_test_format(tree: &DomTree) -> String {
    let mut out = String::new();
    for &child in tree.root_children() {
        write_node(tree, child, 0, &mut out);
    }
    out
}

/// Render one subtree (the node itself at depth 0).
#[must_use]
pub fn node_to_test_format(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, 0, &mut out);
    out
}

fn indent(out: &mut String, depth: usize) {
    out.push_str("| ");
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Write the subtree at `root`, iteratively: each stack entry is a node and
/// its indentation depth.
fn write_node(tree: &DomTree, root: NodeId, depth: usize, out: &mut String) {
    let mut stack = vec![(root, depth)];
    while let Some((id, depth)) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        match &node.node_type {
            NodeType::Document | NodeType::Fragment => {
                push_children(&mut stack, &node.children, depth);
            }
            NodeType::Doctype(doctype) => {
                indent(out, depth);
                let _ = write!(out, "<!DOCTYPE {}", doctype.name);
                if doctype.public_id.is_some() || doctype.system_id.is_some() {
                    let _ = write!(
                        out,
                        " \"{}\" \"{}\"",
                        doctype.public_id.as_deref().unwrap_or_default(),
                        doctype.system_id.as_deref().unwrap_or_default()
                    );
                }
                out.push_str(">\n");
            }
            NodeType::Comment(data) => {
                indent(out, depth);
                let _ = writeln!(out, "<!-- {data} -->");
            }
            NodeType::Text(text) => {
                indent(out, depth);
                let _ = writeln!(out, "\"{text}\"");
            }
            NodeType::Element(element) => {
                indent(out, depth);
                match element.namespace.dump_prefix() {
                    Some(prefix) => {
                        let _ = writeln!(out, "<{prefix} {}>", element.tag_name);
                    }
                    None => {
                        let _ = writeln!(out, "<{}>", element.tag_name);
                    }
                }

                let mut attrs: Vec<(String, &str)> = element
                    .attrs
                    .iter()
                    .map(|attr| {
                        let name = attr.namespace.map_or_else(
                            || attr.name.clone(),
                            |namespace| format!("{} {}", namespace.prefix(), attr.name),
                        );
                        (name, attr.value.as_str())
                    })
                    .collect();
                attrs.sort();
                for (name, value) in attrs {
                    indent(out, depth + 1);
                    let _ = writeln!(out, "{name}=\"{value}\"");
                }

                if let Some(contents) = tree.template_contents(id) {
                    indent(out, depth + 1);
                    out.push_str("content\n");
                    push_children(&mut stack, tree.children(contents), depth + 2);
                } else {
                    push_children(&mut stack, &node.children, depth + 1);
                }
            }
        }
    }
}

/// Queue `children` so the first child is written next.
fn push_children(stack: &mut Vec<(NodeId, usize)>, children: &[NodeId], depth: usize) {
    stack.extend(children.iter().rev().map(|&child| (child, depth)));
}

#[cfg(test)]
mod tests {
    use quire_dom::{Attribute, AttrNamespace, ElementData, Namespace};

    use super::*;

    #[test]
    fn test_dump_shapes() {
        let mut tree = DomTree::new();
        let html = tree.alloc(NodeType::Element(ElementData::html("html")));
        tree.append_child(NodeId::ROOT, html);
        let mut href = Attribute::new("href", "#a");
        href.namespace = Some(AttrNamespace::XLink);
        let svg = tree.alloc(NodeType::Element(ElementData::new(
            "svg",
            Namespace::Svg,
            vec![href, Attribute::new("class", "x")],
        )));
        tree.append_child(html, svg);
        let text = tree.alloc(NodeType::Text("hi".to_string()));
        tree.append_child(svg, text);

        assert_eq!(
            to_test_format(&tree),
            "| <html>\n|   <svg svg>\n|     class=\"x\"\n|     xlink href=\"#a\"\n|     \"hi\"\n"
        );
    }
}
