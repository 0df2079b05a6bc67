//! Tests for tree mutation, traversal and pre-order renumbering.

use quire_dom::{
    AttrNamespace, Attribute, DomTree, ElementData, Namespace, NodeId, NodeType, Span,
};

/// Helper to create an element node and return its NodeId.
fn alloc_element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.alloc(NodeType::Element(ElementData::html(tag)))
}

fn tag(tree: &DomTree, id: NodeId) -> &str {
    tree.as_element(id).map_or("#text", |e| e.tag_name.as_str())
}

// ========== ids ==========

#[test]
fn test_root_is_id_one() {
    let tree = DomTree::new();
    assert_eq!(tree.root(), NodeId(1));
    assert!(tree.get(NodeId(0)).is_none());
    assert!(matches!(tree.get(NodeId::ROOT).unwrap().node_type, NodeType::Document));
}

#[test]
fn test_alloc_hands_out_increasing_ids() {
    let mut tree = DomTree::new();
    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    assert_eq!(a, NodeId(2));
    assert_eq!(b, NodeId(3));
}

// ========== remove_child ==========

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    let c = alloc_element(&mut tree, "c");
    tree.append_child(parent, a);
    tree.append_child(parent, b);
    tree.append_child(parent, c);

    tree.remove_child(parent, b);

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.parent(b), None);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
}

#[test]
fn test_remove_child_of_wrong_parent_is_noop() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    let other = alloc_element(&mut tree, "p");
    let child = alloc_element(&mut tree, "span");
    tree.append_child(parent, child);

    tree.remove_child(other, child);

    assert_eq!(tree.parent(child), Some(parent));
}

// ========== insert_before ==========

#[test]
fn test_insert_before_first_child() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    let b = alloc_element(&mut tree, "b");
    tree.append_child(parent, b);

    let a = alloc_element(&mut tree, "a");
    tree.insert_before(parent, a, Some(b));

    assert_eq!(tree.children(parent), &[a, b]);
    assert_eq!(tree.prev_sibling(a), None);
    assert_eq!(tree.next_sibling(a), Some(b));
}

#[test]
fn test_insert_before_none_appends() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    tree.append_child(parent, a);
    tree.insert_before(parent, b, None);
    assert_eq!(tree.children(parent), &[a, b]);
}

#[test]
fn test_append_moves_from_previous_parent() {
    let mut tree = DomTree::new();
    let first = alloc_element(&mut tree, "div");
    let second = alloc_element(&mut tree, "section");
    let child = alloc_element(&mut tree, "p");
    tree.append_child(first, child);
    tree.append_child(second, child);

    assert!(tree.children(first).is_empty());
    assert_eq!(tree.children(second), &[child]);
    assert_eq!(tree.parent(child), Some(second));
}

// ========== move_children ==========

#[test]
fn test_move_children_appends_to_existing() {
    let mut tree = DomTree::new();
    let source = alloc_element(&mut tree, "div");
    let target = alloc_element(&mut tree, "div");

    let existing = alloc_element(&mut tree, "existing");
    tree.append_child(target, existing);

    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    tree.append_child(source, a);
    tree.append_child(source, b);

    tree.move_children(source, target);

    assert!(tree.children(source).is_empty());
    assert_eq!(tree.children(target), &[existing, a, b]);
    assert_eq!(tree.parent(a), Some(target));
    assert_eq!(tree.parent(b), Some(target));
}

// ========== traversal ==========

#[test]
fn test_descendants_are_preorder() {
    let mut tree = DomTree::new();
    let html = alloc_element(&mut tree, "html");
    let head = alloc_element(&mut tree, "head");
    let body = alloc_element(&mut tree, "body");
    let p = alloc_element(&mut tree, "p");
    tree.append_child(NodeId::ROOT, html);
    tree.append_child(html, head);
    tree.append_child(html, body);
    tree.append_child(body, p);

    let order: Vec<_> = tree.descendants(NodeId::ROOT).skip(1).collect();
    assert_eq!(order, [html, head, body, p]);
    assert_eq!(tree.document_element(), Some(html));
    assert_eq!(tree.body(), Some(body));
    assert!(tree.is_descendant_of(p, html));
    assert_eq!(tree.ancestors(p).collect::<Vec<_>>(), [body, html, NodeId::ROOT]);
}

#[test]
fn test_text_content_concatenates() {
    let mut tree = DomTree::new();
    let div = alloc_element(&mut tree, "div");
    let hello = tree.alloc(NodeType::Text("Hello, ".to_string()));
    let em = alloc_element(&mut tree, "em");
    let world = tree.alloc(NodeType::Text("world".to_string()));
    tree.append_child(div, hello);
    tree.append_child(div, em);
    tree.append_child(em, world);
    assert_eq!(tree.text_content(div), "Hello, world");
}

// ========== renumbering ==========

#[test]
fn test_into_preorder_renumbers_and_drops_detached() {
    let mut tree = DomTree::new();
    // Allocated out of document order on purpose.
    let p = alloc_element(&mut tree, "p");
    let body = alloc_element(&mut tree, "body");
    let orphan = alloc_element(&mut tree, "orphan");
    let html = alloc_element(&mut tree, "html");
    tree.append_child(NodeId::ROOT, html);
    tree.append_child(html, body);
    tree.append_child(body, p);
    tree.append_child(html, orphan);
    tree.detach(orphan);
    tree.set_span(p, Some(Span::new(0, 7)));

    let tree = tree.into_preorder();

    assert_eq!(tree.len(), 4);
    let names: Vec<_> = tree
        .descendants(NodeId::ROOT)
        .skip(1)
        .map(|id| (id, tag(&tree, id).to_string()))
        .collect();
    assert_eq!(
        names,
        [
            (NodeId(2), "html".to_string()),
            (NodeId(3), "body".to_string()),
            (NodeId(4), "p".to_string()),
        ]
    );
    assert_eq!(tree.parent(NodeId(4)), Some(NodeId(3)));
    assert_eq!(tree.span(NodeId(4)), Some(Span::new(0, 7)));
}

// ========== attributes ==========

#[test]
fn test_attributes_sorted_by_qualified_name() {
    let data = ElementData::new(
        "a",
        Namespace::Svg,
        vec![
            Attribute::new("z", "1"),
            Attribute {
                name: "href".to_string(),
                value: "#x".to_string(),
                namespace: Some(AttrNamespace::XLink),
                span: None,
            },
            Attribute::new("class", "k"),
        ],
    );
    let names: Vec<_> = data.attrs.iter().map(Attribute::qualified_name).collect();
    assert_eq!(names, ["class", "xlink:href", "z"]);
    assert_eq!(data.get_attribute("href"), None);
    assert_eq!(data.get_attribute("class"), Some("k"));
}

#[test]
fn test_add_attribute_if_missing_keeps_existing() {
    let mut data = ElementData::new("html", Namespace::Html, vec![Attribute::new("lang", "en")]);
    assert!(!data.add_attribute_if_missing(Attribute::new("lang", "fr")));
    assert!(data.add_attribute_if_missing(Attribute::new("dir", "ltr")));
    assert_eq!(data.get_attribute("lang"), Some("en"));
    assert_eq!(data.attrs[0].name, "dir");
}
