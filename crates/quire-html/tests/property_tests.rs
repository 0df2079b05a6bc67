//! Property tests over generated markup.

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use quire_dom::{DomTree, NodeId, NodeType};
use quire_html::{
    ParseOptions, PatchEdit, apply_patch_plan, compute_patch, dump::node_to_test_format, parse,
    serialize, to_test_format,
};

/// Markup pieces without formatting elements or tables, so that nodes are
/// never reparented and a serialized tree parses back to itself.
const PIECES: &[&str] = &[
    "<p>",
    "</p>",
    "<div>",
    "<div class=x>",
    "</div>",
    "<span>",
    "</span>",
    "<br>",
    "<ul>",
    "<li>",
    "</ul>",
    "<!--c-->",
    "text",
    " ",
    "\n",
    "\r\n",
    "&amp;",
    "caf\u{e9}",
];

fn markup(choices: &[u8]) -> String {
    choices
        .iter()
        .map(|&choice| PIECES[usize::from(choice) % PIECES.len()])
        .collect()
}

/// Like [`markup`] but without end tags, so no text is split around an
/// ignored tag and no element is implied.
fn open_markup(choices: &[u8]) -> String {
    let pieces: Vec<&str> = PIECES
        .iter()
        .copied()
        .filter(|piece| !piece.starts_with("</"))
        .collect();
    choices
        .iter()
        .map(|&choice| pieces[usize::from(choice) % pieces.len()])
        .collect()
}

#[quickcheck]
fn prop_parse_is_deterministic(choices: Vec<u8>) -> bool {
    let source = markup(&choices);
    let options = ParseOptions::default().with_spans();
    let first = parse(&source, &options).unwrap();
    let second = parse(&source, &options).unwrap();
    to_test_format(&first.tree) == to_test_format(&second.tree)
        && first.errors == second.errors
        && first.tree.descendants(NodeId::ROOT).map(|id| first.tree.span(id)).eq(second
            .tree
            .descendants(NodeId::ROOT)
            .map(|id| second.tree.span(id)))
}

#[quickcheck]
fn prop_ids_follow_document_order(choices: Vec<u8>) -> bool {
    let tree = parse(&markup(&choices), &ParseOptions::default()).unwrap().tree;
    tree.descendants(NodeId::ROOT)
        .enumerate()
        .all(|(index, id)| id == NodeId(index + 1))
        && tree.descendants(NodeId::ROOT).count() == tree.len()
}

#[quickcheck]
fn prop_serialization_round_trips(choices: Vec<u8>) -> bool {
    let first = parse(&markup(&choices), &ParseOptions::default()).unwrap();
    let second = parse(&serialize(&first.tree), &ParseOptions::default()).unwrap();
    to_test_format(&first.tree) == to_test_format(&second.tree)
}

/// Children of `parent` that carry a span, tagged with their replacement.
fn edits_for(tree: &DomTree, parent: NodeId) -> Vec<PatchEdit> {
    tree.children(parent)
        .iter()
        .filter(|&&child| tree.span(child).is_some())
        .map(|&child| PatchEdit::new(child, format!("[{}]", child.0)))
        .collect()
}

#[quickcheck]
fn prop_patch_replaces_exactly_the_spans(choices: Vec<u8>) -> TestResult {
    let source = markup(&choices);
    let tree = parse(&source, &ParseOptions::default().with_spans()).unwrap().tree;
    let Some(body) = tree.body() else {
        return TestResult::discard();
    };
    let edits = edits_for(&tree, body);

    let plan = compute_patch(&source, &tree, &edits).unwrap();
    let patched = apply_patch_plan(&source, &plan).unwrap();

    let mut expected = String::new();
    let mut cursor = 0;
    for edit in &edits {
        let Some(span) = tree.span(edit.node_id) else {
            return TestResult::failed();
        };
        expected.push_str(&source[cursor..span.start]);
        expected.push_str(&edit.replacement_html);
        cursor = span.end;
    }
    expected.push_str(&source[cursor..]);
    TestResult::from_bool(patched == expected)
}

#[quickcheck]
fn prop_empty_patch_is_identity(choices: Vec<u8>) -> bool {
    let source = markup(&choices);
    let tree = parse(&source, &ParseOptions::default().with_spans()).unwrap().tree;
    let plan = compute_patch(&source, &tree, &[]).unwrap();
    apply_patch_plan(&source, &plan).is_ok_and(|patched| patched == source)
}

#[quickcheck]
fn prop_body_children_carry_spans(choices: Vec<u8>) -> TestResult {
    let source = open_markup(&choices);
    let tree = parse(&source, &ParseOptions::default().with_spans()).unwrap().tree;
    let Some(body) = tree.body() else {
        return TestResult::discard();
    };
    let covered = tree.children(body).iter().all(|&child| {
        let raw = tree.span(child).and_then(|span| span.slice(&source));
        match tree.get(child).map(|node| &node.node_type) {
            Some(NodeType::Text(_)) => raw.is_some_and(|raw| !raw.is_empty() && !raw.contains('<')),
            Some(NodeType::Element(_)) => raw.is_some_and(|raw| raw.starts_with('<')),
            _ => true,
        }
    });
    TestResult::from_bool(covered)
}

#[quickcheck]
fn prop_patch_leaves_other_siblings_alone(choices: Vec<u8>) -> TestResult {
    let source = markup(&choices);
    let options = ParseOptions::default().with_spans();
    let tree = parse(&source, &options).unwrap().tree;
    let Some(body) = tree.body() else {
        return TestResult::discard();
    };
    let children = tree.children(body);
    // Every other element child with a span gets replaced.
    let edited: Vec<bool> = children
        .iter()
        .enumerate()
        .map(|(index, &child)| {
            index % 2 == 0 && tree.as_element(child).is_some() && tree.span(child).is_some()
        })
        .collect();
    let edits: Vec<PatchEdit> = children
        .iter()
        .zip(&edited)
        .filter(|&(_, &edit)| edit)
        .map(|(&child, _)| PatchEdit::new(child, format!("<mark>[{}]</mark>", child.0)))
        .collect();
    if edits.is_empty() {
        return TestResult::discard();
    }

    let plan = compute_patch(&source, &tree, &edits).unwrap();
    let patched = apply_patch_plan(&source, &plan).unwrap();
    let reparsed = parse(&patched, &options).unwrap().tree;
    let Some(new_body) = reparsed.body() else {
        return TestResult::failed();
    };
    let new_children = reparsed.children(new_body);
    if new_children.len() != children.len() {
        return TestResult::failed();
    }
    let kept = children
        .iter()
        .zip(new_children)
        .zip(&edited)
        .all(|((&old, &new), &edit)| {
            let expected = if edit {
                format!("| <mark>\n|   \"[{}]\"\n", old.0)
            } else {
                node_to_test_format(&tree, old)
            };
            node_to_test_format(&reparsed, new) == expected
        });
    TestResult::from_bool(kept)
}
