//! Integration tests for tree construction.

use std::{io, thread, time::Duration};

use quire_common::{BudgetKind, Budgets, Phase, TraceEvent};
use quire_dom::{DomTree, Namespace, NodeId, NodeType, QuirksMode, Span};
use quire_html::{
    ChunkSource, ParseOptions, ParseResult, parse, parse_fragment, parse_stream, serialize,
    to_test_format,
};

/// Route parser logs to the test output (`RUST_LOG=quire_html=trace`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parse with default options.
fn parse_default(html: &str) -> ParseResult {
    parse(html, &ParseOptions::default()).unwrap()
}

/// html5lib dump of a document.
fn dump(html: &str) -> String {
    to_test_format(&parse_default(html).tree)
}

/// First element with this tag name, depth-first from `from`.
fn find_element(tree: &DomTree, from: NodeId, tag: &str) -> Option<NodeId> {
    if let Some(data) = tree.as_element(from)
        && data.tag_name == tag
    {
        return Some(from);
    }
    for &child_id in tree.children(from) {
        if let Some(found) = find_element(tree, child_id, tag) {
            return Some(found);
        }
    }
    None
}

#[test]
fn test_document_structure() {
    let result = parse_default("<!DOCTYPE html><html><head></head><body></body></html>");
    let tree = &result.tree;

    let root = tree.get(NodeId::ROOT).unwrap();
    assert!(matches!(root.node_type, NodeType::Document));

    let html_id = find_element(tree, NodeId::ROOT, "html").unwrap();
    assert!(find_element(tree, html_id, "head").is_some());
    assert!(find_element(tree, html_id, "body").is_some());
    assert_eq!(result.quirks_mode(), QuirksMode::NoQuirks);
    assert!(result.errors.is_empty());
}

#[test]
fn test_implied_structure() {
    assert_eq!(
        dump("Hello"),
        "| <html>\n|   <head>\n|   <body>\n|     \"Hello\"\n"
    );
}

#[test]
fn test_missing_doctype_is_quirks() {
    let result = parse_default("<p>x");
    assert_eq!(result.quirks_mode(), QuirksMode::Quirks);
    assert!(!result.errors.is_empty());
}

#[test]
fn test_comment_and_doctype_dump() {
    assert_eq!(
        dump("<!DOCTYPE html><!--a--><p>b</p>"),
        "| <!DOCTYPE html>\n| <!-- a -->\n| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"b\"\n"
    );
}

#[test]
fn test_attributes_are_sorted_in_dump() {
    assert_eq!(
        dump("<!DOCTYPE html><div id=\"x\" class=\"y\"></div>"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <div>\n|       class=\"y\"\n|       id=\"x\"\n"
    );
}

#[test]
fn test_adoption_agency_misnested_formatting() {
    assert_eq!(
        dump("<!DOCTYPE html><b>1<p>2</b>3</p>"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <b>\n|       \"1\"\n|     <p>\n|       <b>\n|         \"2\"\n|       \"3\"\n"
    );
}

#[test]
fn test_paragraph_closed_by_block() {
    assert_eq!(
        dump("<!DOCTYPE html><p>a<div>b</div>"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"a\"\n|     <div>\n|       \"b\"\n"
    );
}

#[test]
fn test_table_foster_parenting() {
    assert_eq!(
        dump("<!DOCTYPE html><table>a<tr><td>b</td></tr></table>"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     \"a\"\n|     <table>\n|       <tbody>\n|         <tr>\n|           <td>\n|             \"b\"\n"
    );
}

#[test]
fn test_svg_names_are_adjusted() {
    assert_eq!(
        dump("<!DOCTYPE html><svg viewBox=\"0 0 1 1\"><foreignObject><p>x</p></foreignObject></svg>"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <svg svg>\n|       viewBox=\"0 0 1 1\"\n|       <svg foreignObject>\n|         <p>\n|           \"x\"\n"
    );
}

#[test]
fn test_mathml_content() {
    let result = parse_default("<!DOCTYPE html><math><mi>x</mi></math>");
    let mi = find_element(&result.tree, NodeId::ROOT, "mi").unwrap();
    assert_eq!(result.tree.as_element(mi).unwrap().namespace, Namespace::MathMl);
    assert_eq!(result.tree.text_content(mi), "x");
}

#[test]
fn test_html_breaks_out_of_svg() {
    assert_eq!(
        dump("<!DOCTYPE html><svg><p>x"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <svg svg>\n|     <p>\n|       \"x\"\n"
    );
}

#[test]
fn test_template_contents() {
    assert_eq!(
        dump("<!DOCTYPE html><template><b>x</b></template>"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|     <template>\n|       content\n|         <b>\n|           \"x\"\n|   <body>\n"
    );
}

#[test]
fn test_select_option_carries_formatting() {
    assert_eq!(
        dump("<!DOCTYPE html><b><select><option>x"),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <b>\n|       <select>\n|         <b>\n|           <option>\n|             \"x\"\n"
    );
}

#[test]
fn test_select_option_compat_can_be_disabled() {
    let options = ParseOptions {
        select_option_compat: false,
        ..ParseOptions::default()
    };
    let result = parse("<!DOCTYPE html><b><select><option>x", &options).unwrap();
    assert_eq!(
        to_test_format(&result.tree),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <b>\n|       <select>\n|         <option>\n|           \"x\"\n"
    );
}

#[test]
fn test_select_option_with_attributes_is_untouched() {
    let result = parse_default("<!DOCTYPE html><b><select><option value=\"1\">x");
    let select = find_element(&result.tree, NodeId::ROOT, "select").unwrap();
    let option = find_element(&result.tree, select, "option").unwrap();
    assert_eq!(result.tree.parent(option), Some(select));
}

#[test]
fn test_fragment_in_row_context() {
    let result = parse_fragment("<td>x</td>", "tr", &ParseOptions::default()).unwrap();
    assert!(result.tree.is_fragment());
    assert_eq!(to_test_format(&result.tree), "| <td>\n|   \"x\"\n");
}

#[test]
fn test_fragment_in_rcdata_context() {
    let result = parse_fragment("<b>x</b>", "textarea", &ParseOptions::default()).unwrap();
    assert_eq!(to_test_format(&result.tree), "| \"<b>x</b>\"\n");
}

#[test]
fn test_fragment_in_svg_context() {
    let result = parse_fragment("<path/>", "svg svg", &ParseOptions::default()).unwrap();
    assert_eq!(to_test_format(&result.tree), "| <svg path>\n");
}

#[test]
fn test_fragment_ids_start_at_root() {
    let result = parse_fragment("<p>a</p><p>b</p>", "div", &ParseOptions::default()).unwrap();
    assert_eq!(result.root_children(), &[NodeId(2), NodeId(4)]);
}

#[test]
fn test_invalid_fragment_context() {
    let error = parse_fragment("x", "", &ParseOptions::default()).unwrap_err();
    assert_eq!(error.code(), "INVALID_FRAGMENT_CONTEXT");
}

#[test]
fn test_ids_are_preorder() {
    let result = parse_default("<!DOCTYPE html><p>a<b>c</b></p><p>d</p>");
    let ids: Vec<NodeId> = result.tree.descendants(NodeId::ROOT).collect();
    let expected: Vec<NodeId> = (1..=ids.len()).map(NodeId).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_spans_cover_source() {
    let source = "<p class=\"a\">hi</p>";
    let result = parse(source, &ParseOptions::default().with_spans()).unwrap();
    let tree = &result.tree;

    let p = find_element(tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(tree.span(p).and_then(|s| s.slice(source)), Some(source));

    let text = tree.first_child(p).unwrap();
    assert_eq!(tree.span(text).and_then(|s| s.slice(source)), Some("hi"));

    let attr = &tree.as_element(p).unwrap().attrs[0];
    let attr_source = attr.span.and_then(|s| s.slice(source)).unwrap();
    assert!(attr_source.starts_with("class"));

    // Implied elements have no source.
    let body = find_element(tree, NodeId::ROOT, "body").unwrap();
    assert_eq!(tree.span(body), None);
}

#[test]
fn test_spans_off_by_default() {
    let result = parse_default("<p>x</p>");
    let p = find_element(&result.tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(result.tree.span(p), None);
}

#[test]
fn test_max_input_bytes() {
    let options = ParseOptions::default().with_budgets(Budgets::default().with_max_input_bytes(5));
    let error = parse("abcdef", &options).unwrap_err();
    let exceeded = error.as_budget().unwrap();
    assert_eq!(exceeded.budget, BudgetKind::MaxInputBytes);
    assert_eq!(exceeded.limit, 5);
    assert_eq!(exceeded.actual, 6);
    assert_eq!(error.code(), "BUDGET_EXCEEDED");
}

#[test]
fn test_max_nodes() {
    let options = ParseOptions::default().with_budgets(Budgets::default().with_max_nodes(3));
    let error = parse("<p>a</p>", &options).unwrap_err();
    assert_eq!(error.as_budget().unwrap().budget, BudgetKind::MaxNodes);
}

#[test]
fn test_max_depth_boundary() {
    // html and body are on the stack under the divs.
    let options = ParseOptions::default().with_budgets(Budgets::default().with_max_depth(4));
    assert!(parse("<div><div></div></div>", &options).is_ok());

    let error = parse("<div><div><div></div></div></div>", &options).unwrap_err();
    let exceeded = error.as_budget().unwrap();
    assert_eq!(exceeded.budget, BudgetKind::MaxDepth);
    assert_eq!(exceeded.limit, 4);
    assert_eq!(exceeded.actual, 5);
}

/// A stream that stalls before its only chunk.
struct SlowSource {
    chunk: Option<Vec<u8>>,
}

impl ChunkSource for SlowSource {
    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        thread::sleep(Duration::from_millis(5));
        Ok(self.chunk.take())
    }
}

#[test]
fn test_max_time_ms() {
    let source = SlowSource {
        chunk: Some(b"<p>late</p>".to_vec()),
    };
    let options = ParseOptions::default().with_budgets(Budgets::default().with_max_time_ms(2));
    let error = parse_stream(source, &options).unwrap_err();
    let exceeded = error.as_budget().unwrap();
    assert_eq!(exceeded.budget, BudgetKind::MaxTimeMs);
    assert_eq!(exceeded.limit, 2);
    assert!(exceeded.actual >= 5, "{}", exceeded.actual);
}

#[test]
fn test_deep_nesting_with_spans() {
    let depth = 50_000;
    let source = "<span>".repeat(depth);
    let result = parse(&source, &ParseOptions::default().with_spans()).unwrap();
    let tree = &result.tree;
    // document, html, head, body, then the spans.
    assert_eq!(tree.len(), depth + 4);

    let body = tree.body().unwrap();
    let outer = tree.first_child(body).unwrap();
    assert_eq!(tree.span(outer), Some(Span::new(0, source.len())));
    let inner = tree.descendants(outer).last().unwrap();
    assert_eq!(tree.span(inner), Some(Span::new(source.len() - 6, source.len())));

    let html = serialize(tree);
    assert!(html.starts_with("<html><head></head><body><span><span>"));
    assert!(html.ends_with("</span></span></body></html>"));
}

#[test]
fn test_trace_records_phases_and_modes() {
    init_tracing();
    let result = parse("<p>x</p>", &ParseOptions::default().with_trace()).unwrap();
    let trace = result.trace.unwrap();
    assert_eq!(
        trace.first(),
        Some(&TraceEvent::PhaseStart {
            phase: Phase::TreeConstruction
        })
    );
    assert_eq!(trace.last(), Some(&TraceEvent::PhaseEnd { phase: Phase::Assign }));
    assert!(trace.iter().any(|event| matches!(
        event,
        TraceEvent::ModeTransition { to_mode: "in-body", .. }
    )));
}

#[test]
fn test_trace_off_by_default() {
    assert!(parse_default("<p>x</p>").trace.is_none());
}

#[test]
fn test_trace_budget() {
    let options = ParseOptions::default()
        .with_trace()
        .with_budgets(Budgets::default().with_max_trace_events(2));
    let error = parse("<p>x</p>", &options).unwrap_err();
    assert_eq!(error.as_budget().unwrap().budget, BudgetKind::MaxTraceEvents);
}

#[test]
fn test_tracing_does_not_change_tree() {
    init_tracing();
    let source = "<table><tr><td>a<b>b</table>c";
    let plain = parse_default(source);
    let traced = parse(source, &ParseOptions::default().with_trace()).unwrap();
    assert_eq!(to_test_format(&plain.tree), to_test_format(&traced.tree));
}

#[test]
fn test_line_feed_after_pre_is_dropped() {
    let result = parse_default("<pre>\nx</pre>");
    let pre = find_element(&result.tree, NodeId::ROOT, "pre").unwrap();
    assert_eq!(result.tree.text_content(pre), "x");
}
