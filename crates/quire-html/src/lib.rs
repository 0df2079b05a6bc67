//! Bounded, span-preserving HTML parsing engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **Encoding sniffing** ([WHATWG § 13.2.3](https://html.spec.whatwg.org/multipage/parsing.html#determining-the-character-encoding))
//!   - BOM, transport label, bounded `<meta>` prescan, configured default
//!   - Total decoding through `encoding_rs`
//!
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Every tokenizer state, character references, source spans
//!   - Soft per-token and cumulative text limits
//!
//! - **Tree Construction** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - All insertion modes, foster parenting, the adoption agency algorithm
//!   - Foreign content (SVG, MathML), templates, fragment parsing
//!   - Insertion-mode transitions recorded as trace events
//!
//! - **Serialization** ([WHATWG § 13.3](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments))
//!   - Optional-tag omission for fixture-accurate output
//!   - The html5lib tree dump used for normalized comparison
//!
//! - **Patch planning**: rewriting the original source by node span.
//!
//! Every call owns its own budgets meter, trace log and node counter, so
//! independent parses can run concurrently.
//!
//! ```
//! use quire_html::{ParseOptions, parse, serialize};
//!
//! let result = parse("<p>alpha</p>", &ParseOptions::default()).unwrap();
//! assert_eq!(serialize(&result.tree), "<html><head></head><body><p>alpha</p></body></html>");
//! ```

/// Encoding sniffing and decoding.
pub mod encoding;
/// Error codes and the failure type.
pub mod error;
/// html5lib-format tree dump.
pub mod dump;
/// Options records.
pub mod options;
/// HTML parser and tree construction.
pub mod parser;
/// Source patch planning.
pub mod patch;
/// Tree serialization.
pub mod serializer;
/// Streaming byte sources.
pub mod stream;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;

use quire_common::{BudgetMeter, Budgets, Phase, TraceEvent, TraceLog, Warnings};
use quire_dom::{DomTree, NodeId, QuirksMode};

pub use dump::to_test_format;
pub use encoding::{EncodingSource, Sniffed};
pub use error::{HtmlError, ParseError, ParseErrorCode};
pub use options::{ParseOptions, SerializeOptions};
pub use parser::{FragmentContext, InsertionMode};
pub use patch::{PatchEdit, PatchPlan, PatchStep, apply_patch_plan, compute_patch};
pub use stream::{ChunkSource, IterSource, ReaderSource};
pub use tokenizer::{
    Attribute, EmittedToken, HTMLTokenizer, Token, TokenKind, TokenizerOptions, TokenizerState,
};

use parser::{BuildOutput, TreeBuilder};

/// A finished parse: the tree, the recoverable errors found on the way, and
/// (when requested) the trace.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The document or fragment tree, numbered in pre-order.
    pub tree: DomTree,
    /// Recoverable parse errors in order of occurrence.
    pub errors: Vec<ParseError>,
    /// Trace events, when [`ParseOptions::trace`] was set.
    pub trace: Option<Vec<TraceEvent>>,
    /// How the bytes were decoded, for byte and stream input.
    pub encoding: Option<Sniffed>,
}

impl ParseResult {
    /// Children of the document (or fragment) root.
    #[must_use]
    pub fn root_children(&self) -> &[NodeId] {
        self.tree.root_children()
    }

    /// Document mode chosen from the DOCTYPE.
    #[must_use]
    pub const fn quirks_mode(&self) -> QuirksMode {
        self.tree.quirks_mode()
    }

    /// Serialize the tree with default options.
    #[must_use]
    pub fn serialize(&self) -> String {
        serialize(&self.tree)
    }

    /// html5lib-format dump of the tree.
    #[must_use]
    pub fn to_test_format(&self) -> String {
        to_test_format(&self.tree)
    }
}

/// Output of [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeResult {
    /// Tokens with their source spans, ending with `EndOfFile`.
    pub tokens: Vec<EmittedToken>,
    /// Tokenizer parse errors in order of occurrence.
    pub errors: Vec<ParseError>,
}

/// Parse a complete document from text.
///
/// # Errors
/// [`HtmlError::Budget`] when a budget checkpoint fails.
pub fn parse(text: &str, options: &ParseOptions) -> Result<ParseResult, HtmlError> {
    let meter = BudgetMeter::new(options.budgets);
    meter.check_input_bytes(text.len())?;
    let trace = new_trace(options);
    let builder = TreeBuilder::new(text.to_string(), options, meter, trace);
    finish(builder, None)
}

/// Parse a complete document from bytes, sniffing the encoding first.
///
/// # Errors
/// [`HtmlError::Budget`] when a budget checkpoint fails.
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<ParseResult, HtmlError> {
    let meter = BudgetMeter::new(options.budgets);
    meter.check_input_bytes(bytes.len())?;
    let mut trace = new_trace(options);
    let mut warnings = Warnings::new();

    record_trace(&mut trace, TraceEvent::PhaseStart { phase: Phase::Sniff })?;
    let sniffed = encoding::sniff(bytes, options.into(), &mut warnings);
    tracing::debug!(encoding = sniffed.name(), source = %sniffed.source, "encoding resolved");
    record_trace(
        &mut trace,
        TraceEvent::EncodingResolved {
            encoding: sniffed.name(),
            source: sniffed.source.into(),
        },
    )?;
    record_trace(&mut trace, TraceEvent::PhaseEnd { phase: Phase::Sniff })?;

    record_trace(&mut trace, TraceEvent::PhaseStart { phase: Phase::Decode })?;
    let text = sniffed.decode(bytes).into_owned();
    record_trace(&mut trace, TraceEvent::PhaseEnd { phase: Phase::Decode })?;

    let builder = TreeBuilder::new(text, options, meter, trace);
    finish(builder, Some(sniffed))
}

/// Parse `text` as the children of a `context` element.
///
/// `context` is an HTML tag name (`"td"`), or `"svg <name>"` /
/// `"math <name>"` for a foreign context.
///
/// # Errors
/// [`HtmlError::InvalidFragmentContext`] for an empty or malformed context
/// name, [`HtmlError::Budget`] when a budget checkpoint fails.
pub fn parse_fragment(
    text: &str,
    context: &str,
    options: &ParseOptions,
) -> Result<ParseResult, HtmlError> {
    let context = FragmentContext::parse(context)?;
    let meter = BudgetMeter::new(options.budgets);
    meter.check_input_bytes(text.len())?;
    let trace = new_trace(options);
    let builder = TreeBuilder::new_fragment(text.to_string(), &context, options, meter, trace);
    finish(builder, None)
}

/// Parse a document pulled chunk by chunk from `source`.
///
/// # Errors
/// [`HtmlError::Stream`] when the source fails to read,
/// [`HtmlError::Budget`] when a budget checkpoint fails.
pub fn parse_stream<S: ChunkSource>(
    source: S,
    options: &ParseOptions,
) -> Result<ParseResult, HtmlError> {
    let meter = BudgetMeter::new(options.budgets);
    let mut trace = new_trace(options);
    let mut warnings = Warnings::new();
    let decoded = stream::read_and_decode(source, options, &meter, &mut trace, &mut warnings)?;
    let builder = TreeBuilder::new(decoded.text, options, meter, trace);
    finish(builder, Some(decoded.sniffed))
}

/// Tokenize `text` without building a tree.
///
/// # Errors
/// Never fails without budgets; see [`tokenize_with_budgets`].
pub fn tokenize(text: &str, options: &TokenizerOptions) -> Result<TokenizeResult, HtmlError> {
    tokenize_with_budgets(text, options, Budgets::default())
}

/// Tokenize `text`, enforcing `maxInputBytes` up front and `maxTimeMs`
/// between tokens.
///
/// # Errors
/// [`HtmlError::Budget`] when a budget checkpoint fails.
pub fn tokenize_with_budgets(
    text: &str,
    options: &TokenizerOptions,
    budgets: Budgets,
) -> Result<TokenizeResult, HtmlError> {
    let meter = BudgetMeter::new(budgets);
    meter.check_input_bytes(text.len())?;
    let mut tokenizer = HTMLTokenizer::with_options(text, options.clone());
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token() {
        meter.check_time()?;
        tokens.push(token);
    }
    let errors = tokenizer.take_errors();
    tracing::debug!(tokens = tokens.len(), errors = errors.len(), "tokenized");
    Ok(TokenizeResult { tokens, errors })
}

/// Serialize a tree (its root's children) with default options.
#[must_use]
pub fn serialize(tree: &DomTree) -> String {
    serializer::serialize_tree(tree, &SerializeOptions::default())
}

/// Serialize a tree with explicit options.
#[must_use]
pub fn serialize_with(tree: &DomTree, options: &SerializeOptions) -> String {
    serializer::serialize_tree(tree, options)
}

/// Serialize one node: an element with its tags, or a document or
/// fragment's children.
#[must_use]
pub fn serialize_node(tree: &DomTree, id: NodeId, options: &SerializeOptions) -> String {
    serializer::serialize_node(tree, id, options)
}

fn new_trace(options: &ParseOptions) -> Option<TraceLog> {
    options.trace.then(|| TraceLog::new(options.budgets))
}

/// Append to the trace when tracing is on.
pub(crate) fn record_trace(trace: &mut Option<TraceLog>, event: TraceEvent) -> Result<(), HtmlError> {
    if let Some(trace) = trace {
        trace.push(event)?;
    }
    Ok(())
}

/// Run tree construction, then the assign phase: pre-order renumbering.
fn finish(builder: TreeBuilder, encoding: Option<Sniffed>) -> Result<ParseResult, HtmlError> {
    let BuildOutput {
        tree,
        errors,
        mut trace,
    } = builder.run()?;

    record_trace(&mut trace, TraceEvent::PhaseStart { phase: Phase::Assign })?;
    let tree = tree.into_preorder();
    record_trace(&mut trace, TraceEvent::PhaseEnd { phase: Phase::Assign })?;

    tracing::debug!(nodes = tree.len(), errors = errors.len(), "parse finished");
    Ok(ParseResult {
        tree,
        errors,
        trace: trace.map(TraceLog::into_events),
        encoding,
    })
}
