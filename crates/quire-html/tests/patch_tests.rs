//! Integration tests for source patch planning.

use quire_dom::{DomTree, NodeId};
use quire_html::{
    ParseOptions, PatchEdit, PatchPlan, PatchStep, apply_patch_plan, compute_patch, parse,
};

fn parse_with_spans(source: &str) -> DomTree {
    parse(source, &ParseOptions::default().with_spans()).unwrap().tree
}

/// Elements with this tag name, in document order.
fn elements(tree: &DomTree, tag: &str) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .filter(|&id| tree.as_element(id).is_some_and(|e| e.tag_name == tag))
        .collect()
}

#[test]
fn test_replace_one_element() {
    let source = "<!DOCTYPE html>\n<p id=a>one</p>\n<p>two</p>\n";
    let tree = parse_with_spans(source);
    let first = elements(&tree, "p")[0];

    let plan = compute_patch(source, &tree, &[PatchEdit::new(first, "<p>1</p>")]).unwrap();
    assert_eq!(
        apply_patch_plan(source, &plan).unwrap(),
        "<!DOCTYPE html>\n<p>1</p>\n<p>two</p>\n"
    );
}

#[test]
fn test_replace_text_and_element() {
    let source = "<div>keep <b>old</b> tail</div>";
    let tree = parse_with_spans(source);
    let b = elements(&tree, "b")[0];
    let div = elements(&tree, "div")[0];
    let tail = tree.last_child(div).unwrap();
    assert_eq!(tree.as_text(tail), Some(" tail"));

    let edits = [PatchEdit::new(tail, " end"), PatchEdit::new(b, "<i>new</i>")];
    let plan = compute_patch(source, &tree, &edits).unwrap();
    assert_eq!(
        apply_patch_plan(source, &plan).unwrap(),
        "<div>keep <i>new</i> end</div>"
    );
}

#[test]
fn test_no_edits_reproduces_source() {
    let source = "<ul><li>a<li>b</ul>";
    let tree = parse_with_spans(source);
    let plan = compute_patch(source, &tree, &[]).unwrap();
    assert_eq!(plan.steps, vec![PatchStep::Slice { start: 0, end: source.len() }]);
    assert_eq!(apply_patch_plan(source, &plan).unwrap(), source);
}

#[test]
fn test_empty_source_gives_empty_plan() {
    let tree = parse_with_spans("");
    let plan = compute_patch("", &tree, &[]).unwrap();
    assert!(plan.is_empty());
    assert_eq!(apply_patch_plan("", &plan).unwrap(), "");
}

#[test]
fn test_implied_element_is_rejected() {
    let source = "<table><tr><td>x</td></tr></table>";
    let tree = parse_with_spans(source);
    let tbody = elements(&tree, "tbody")[0];
    let error = compute_patch(source, &tree, &[PatchEdit::new(tbody, "")]).unwrap_err();
    assert_eq!(error.code(), "NON_INPUT_SPAN_PROVENANCE");
}

#[test]
fn test_spans_required() {
    let source = "<p>x</p>";
    let tree = parse(source, &ParseOptions::default()).unwrap().tree;
    let p = elements(&tree, "p")[0];
    let error = compute_patch(source, &tree, &[PatchEdit::new(p, "")]).unwrap_err();
    assert_eq!(error.code(), "NON_INPUT_SPAN_PROVENANCE");
}

#[test]
fn test_nested_edits_overlap() {
    let source = "<p>x</p>";
    let tree = parse_with_spans(source);
    let p = elements(&tree, "p")[0];
    let text = tree.first_child(p).unwrap();
    let error = compute_patch(source, &tree, &[PatchEdit::new(p, "a"), PatchEdit::new(text, "b")])
        .unwrap_err();
    assert_eq!(error.code(), "OVERLAPPING_PATCH_EDITS");
}

#[test]
fn test_plan_against_other_source() {
    let tree = parse_with_spans("<p>a long paragraph</p>");
    let p = elements(&tree, "p")[0];
    let error = compute_patch("<p>", &tree, &[PatchEdit::new(p, "")]).unwrap_err();
    assert_eq!(error.code(), "SPAN_OUT_OF_RANGE");
}

#[test]
fn test_plan_json_shape() {
    let plan = PatchPlan {
        steps: vec![
            PatchStep::Slice { start: 0, end: 3 },
            PatchStep::Insert {
                at: 3,
                text: "x".to_string(),
            },
        ],
    };
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "steps": [
                {"kind": "slice", "start": 0, "end": 3},
                {"kind": "insert", "at": 3, "text": "x"},
            ]
        })
    );
    let edit: PatchEdit = serde_json::from_str(r#"{"nodeId": 5, "replacementHtml": "<b>"}"#).unwrap();
    assert_eq!(edit, PatchEdit::new(NodeId(5), "<b>"));
}

#[test]
fn test_text_span_covers_crlf_and_references() {
    for (source, raw, decoded) in [
        ("<p>line one\r\nline two</p>", "line one\r\nline two", "line one\nline two"),
        ("<p>fish &amp; chips</p>", "fish &amp; chips", "fish & chips"),
        ("<p>a\r\n&lt;\r\nb</p>", "a\r\n&lt;\r\nb", "a\n<\nb"),
    ] {
        let tree = parse_with_spans(source);
        let p = elements(&tree, "p")[0];
        assert_eq!(tree.children(p).len(), 1, "{source}");
        let text = tree.first_child(p).unwrap();
        assert_eq!(tree.as_text(text), Some(decoded));
        assert_eq!(tree.span(text).unwrap().slice(source), Some(raw));

        let plan = compute_patch(source, &tree, &[PatchEdit::new(text, "new")]).unwrap();
        assert_eq!(apply_patch_plan(source, &plan).unwrap(), "<p>new</p>");
    }
}

#[test]
fn test_element_span_reaches_the_token_that_closed_it() {
    // A stray end tag builds no node but still belongs to the open element.
    let source = "<p>a</div>b<ul>";
    let tree = parse_with_spans(source);
    let p = elements(&tree, "p")[0];
    assert_eq!(tree.text_content(p), "ab");
    assert_eq!(tree.span(p).unwrap().slice(source), Some("<p>a</div>b"));
    let plan = compute_patch(source, &tree, &[PatchEdit::new(p, "<p>x</p>")]).unwrap();
    assert_eq!(apply_patch_plan(source, &plan).unwrap(), "<p>x</p><ul>");

    // Closed by end of input.
    let source = "<li>one</span>";
    let tree = parse_with_spans(source);
    let li = elements(&tree, "li")[0];
    assert_eq!(tree.span(li).unwrap().slice(source), Some(source));
}
