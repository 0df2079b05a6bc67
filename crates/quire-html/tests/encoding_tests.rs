//! Integration tests for byte and streaming input.

use std::io::Cursor;

use quire_common::{BudgetKind, Budgets, Phase, TraceEvent};
use quire_dom::NodeId;
use quire_html::{
    EncodingSource, IterSource, ParseOptions, ReaderSource, parse, parse_bytes, parse_stream,
    to_test_format,
};

fn body_text(result: &quire_html::ParseResult) -> String {
    result
        .tree
        .body()
        .map(|body| result.tree.text_content(body))
        .unwrap_or_default()
}

#[test]
fn test_utf8_bom() {
    let result = parse_bytes(b"\xEF\xBB\xBFcaf\xC3\xA9", &ParseOptions::default()).unwrap();
    let encoding = result.encoding.unwrap();
    assert_eq!(encoding.name(), "utf-8");
    assert_eq!(encoding.source, EncodingSource::Bom);
    assert_eq!(body_text(&result), "caf\u{e9}");
}

#[test]
fn test_utf16le_bom() {
    let result = parse_bytes(b"\xFF\xFEh\x00i\x00", &ParseOptions::default()).unwrap();
    assert_eq!(result.encoding.unwrap().name(), "utf-16le");
    assert_eq!(body_text(&result), "hi");
}

#[test]
fn test_bom_beats_transport_label() {
    let options = ParseOptions::default().with_transport_encoding("windows-1252");
    let result = parse_bytes(b"\xEF\xBB\xBF\xC3\xA9", &options).unwrap();
    assert_eq!(result.encoding.unwrap().source, EncodingSource::Bom);
    assert_eq!(body_text(&result), "\u{e9}");
}

#[test]
fn test_transport_label_beats_meta() {
    let options = ParseOptions::default().with_transport_encoding("utf-8");
    let result = parse_bytes(b"<meta charset=windows-1252>\xC3\xA9", &options).unwrap();
    let encoding = result.encoding.unwrap();
    assert_eq!(encoding.source, EncodingSource::Transport);
    assert_eq!(body_text(&result), "\u{e9}");
}

#[test]
fn test_meta_charset() {
    let result = parse_bytes(b"<meta charset=\"utf-8\"><p>\xC3\xA9", &ParseOptions::default()).unwrap();
    let encoding = result.encoding.unwrap();
    assert_eq!(encoding.name(), "utf-8");
    assert_eq!(encoding.source, EncodingSource::Meta);
    assert_eq!(body_text(&result), "\u{e9}");
}

#[test]
fn test_meta_latin1_alias() {
    let result = parse_bytes(b"<meta charset=latin1><p>\xE9", &ParseOptions::default()).unwrap();
    assert_eq!(result.encoding.unwrap().name(), "windows-1252");
    assert_eq!(body_text(&result), "\u{e9}");
}

#[test]
fn test_unknown_transport_label_falls_through() {
    let options = ParseOptions::default().with_transport_encoding("no-such-encoding");
    let result = parse_bytes(b"<p>x", &options).unwrap();
    let encoding = result.encoding.unwrap();
    assert_eq!(encoding.source, EncodingSource::Default);
    assert_eq!(encoding.name(), "windows-1252");
}

#[test]
fn test_configured_default() {
    let options = ParseOptions {
        default_encoding_label: Some("utf-8".to_string()),
        ..ParseOptions::default()
    };
    let result = parse_bytes(b"\xC3\xA9", &options).unwrap();
    assert_eq!(result.encoding.unwrap().name(), "utf-8");
    assert_eq!(body_text(&result), "\u{e9}");
}

#[test]
fn test_invalid_bytes_are_replaced() {
    let options = ParseOptions::default().with_transport_encoding("utf-8");
    let result = parse_bytes(b"a\xFFb", &options).unwrap();
    assert_eq!(body_text(&result), "a\u{FFFD}b");
}

#[test]
fn test_bytes_trace_phases() {
    let result = parse_bytes(b"<p>x", &ParseOptions::default().with_trace()).unwrap();
    let trace = result.trace.unwrap();
    assert_eq!(trace[0], TraceEvent::PhaseStart { phase: Phase::Sniff });
    assert_eq!(
        trace[1],
        TraceEvent::EncodingResolved {
            encoding: "windows-1252",
            source: "default",
        }
    );
    assert_eq!(trace[2], TraceEvent::PhaseEnd { phase: Phase::Sniff });
    assert_eq!(trace[3], TraceEvent::PhaseStart { phase: Phase::Decode });
    assert_eq!(trace[4], TraceEvent::PhaseEnd { phase: Phase::Decode });
}

#[test]
fn test_bytes_input_budget() {
    let options = ParseOptions::default().with_budgets(Budgets::default().with_max_input_bytes(3));
    let error = parse_bytes(b"<p>x", &options).unwrap_err();
    assert_eq!(error.as_budget().unwrap().budget, BudgetKind::MaxInputBytes);
}

#[test]
fn test_stream_matches_bytes() {
    let bytes = "<!DOCTYPE html><meta charset=utf-8><p>caf\u{e9} <b>bold</b>".as_bytes();
    let options = ParseOptions::default();
    let whole = parse_bytes(bytes, &options).unwrap();
    for chunk_size in [1, 2, 7, 64] {
        let source = ReaderSource::with_chunk_size(Cursor::new(bytes), chunk_size);
        let streamed = parse_stream(source, &options).unwrap();
        assert_eq!(
            to_test_format(&streamed.tree),
            to_test_format(&whole.tree),
            "chunk size {chunk_size}"
        );
        assert_eq!(streamed.encoding, whole.encoding);
    }
}

#[test]
fn test_stream_from_iterator() {
    let chunks = vec!["<p>a".as_bytes().to_vec(), "</p><p>b".as_bytes().to_vec()];
    let options = ParseOptions::default().with_transport_encoding("utf-8");
    let result = parse_stream(IterSource::new(chunks), &options).unwrap();
    assert_eq!(body_text(&result), "ab");
}

#[test]
fn test_empty_stream() {
    let result = parse_stream(IterSource::new(Vec::<Vec<u8>>::new()), &ParseOptions::default()).unwrap();
    assert_eq!(result.root_children(), &[NodeId(2)]);
    assert_eq!(result.encoding.unwrap().source, EncodingSource::Default);
}

#[test]
fn test_stream_input_budget() {
    let chunks = vec![b"<p>".to_vec(), b"abc".to_vec(), b"def".to_vec()];
    let options = ParseOptions::default().with_budgets(Budgets::default().with_max_input_bytes(5));
    let error = parse_stream(IterSource::new(chunks), &options).unwrap_err();
    let exceeded = error.as_budget().unwrap();
    assert_eq!(exceeded.budget, BudgetKind::MaxInputBytes);
    assert_eq!(exceeded.actual, 6);
}

#[test]
fn test_stream_trace_matches_bytes_trace() {
    let bytes = b"<p>x</p>";
    let options = ParseOptions::default().with_trace();
    let whole = parse_bytes(bytes, &options).unwrap();
    let streamed = parse_stream(IterSource::new([&bytes[..4], &bytes[4..]]), &options).unwrap();
    assert_eq!(whole.trace, streamed.trace);
}

#[test]
fn test_text_and_bytes_agree() {
    let text = "<!DOCTYPE html><table><td>x</table>";
    let from_text = parse(text, &ParseOptions::default()).unwrap();
    let options = ParseOptions::default().with_transport_encoding("utf-8");
    let from_bytes = parse_bytes(text.as_bytes(), &options).unwrap();
    assert_eq!(to_test_format(&from_text.tree), to_test_format(&from_bytes.tree));
    assert!(from_text.encoding.is_none());
}
