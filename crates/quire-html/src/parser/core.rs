use std::collections::HashMap;

use quire_common::{BudgetExceeded, BudgetMeter, Phase, TraceEvent, TraceLog};
use quire_dom::{DomTree, ElementData, Namespace, NodeId, NodeType, Span};
use strum_macros::{Display, IntoStaticStr};

use super::foreign_content::mathml;
use crate::error::{HtmlError, ParseError, ParseErrorCode};
use crate::options::ParseOptions;
use crate::tokenizer::{
    EmittedToken, HTMLTokenizer, TextOffsets, Token, TokenKind, TokenizerState,
};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary operation
/// of the tree construction stage."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.5 The "in head noscript" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inheadnoscript)
    InHeadNoscript,
    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    Text,
    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    InTable,
    /// [§ 13.2.6.4.10 The "in table text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intabletext)
    InTableText,
    /// [§ 13.2.6.4.11 The "in caption" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incaption)
    InCaption,
    /// [§ 13.2.6.4.12 The "in column group" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incolumngroup)
    InColumnGroup,
    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intablebody)
    InTableBody,
    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inrow)
    InRow,
    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incell)
    InCell,
    /// [§ 13.2.6.4.16 The "in select" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselect)
    InSelect,
    /// [§ 13.2.6.4.17 The "in select in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselectintable)
    InSelectInTable,
    /// [§ 13.2.6.4.18 The "in template" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intemplate)
    InTemplate,
    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    AfterBody,
    /// [§ 13.2.6.4.20 The "in frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inframeset)
    InFrameset,
    /// [§ 13.2.6.4.21 The "after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterframeset)
    AfterFrameset,
    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    AfterAfterBody,
    /// [§ 13.2.6.4.23 The "after after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-frameset-insertion-mode)
    AfterAfterFrameset,
}

/// [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
///
/// The list contains entries that are either elements or markers.
#[derive(Debug, Clone)]
pub(crate) enum ActiveFormattingElement {
    /// A formatting element entry.
    Element {
        /// The element in the tree.
        node_id: NodeId,
        /// The start tag that created it, kept to recreate the element when
        /// reconstructing or during the adoption agency algorithm.
        token: Token,
    },
    /// "A marker is an entry in the list of active formatting elements that is
    /// distinct from any element."
    ///
    /// Pushed when entering applet, object, marquee, template, td, th and
    /// caption.
    Marker,
}

/// The context element of a fragment parse, e.g. `div`, `svg path`, `math mi`.
///
/// [§ 13.4 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentContext {
    /// Local name of the context element.
    pub tag_name: String,
    /// Namespace of the context element.
    pub namespace: Namespace,
}

impl FragmentContext {
    /// Parse a context name. An `svg ` or `math ` prefix selects a foreign
    /// namespace; HTML names are lowercased.
    ///
    /// # Errors
    /// Returns [`HtmlError::InvalidFragmentContext`] for an empty name or a
    /// name with whitespace beyond the namespace prefix.
    pub fn parse(name: &str) -> Result<Self, HtmlError> {
        let invalid = || HtmlError::InvalidFragmentContext(name.to_string());
        let trimmed = name.trim_start();
        let (namespace, local) = match trimmed.split_once(' ') {
            Some(("svg", local)) => (Namespace::Svg, local.to_string()),
            Some(("math", local)) => (Namespace::MathMl, local.to_string()),
            Some(_) => return Err(invalid()),
            None => (Namespace::Html, trimmed.to_ascii_lowercase()),
        };
        if local.is_empty() || local.contains(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self {
            tag_name: local,
            namespace,
        })
    }
}

/// Everything a finished tree construction hands back.
pub(crate) struct BuildOutput {
    pub tree: DomTree,
    pub errors: Vec<ParseError>,
    pub trace: Option<TraceLog>,
}

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// Pulls tokens from an [`HTMLTokenizer`] and runs them through the
/// insertion-mode automaton.
pub(crate) struct TreeBuilder {
    pub(super) tokenizer: HTMLTokenizer,

    /// `NodeId::ROOT` is the Document (or, for fragments, the Fragment) node.
    pub(super) tree: DomTree,

    /// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
    pub(super) insertion_mode: InsertionMode,

    /// [§ 13.2.4.1](https://html.spec.whatwg.org/multipage/parsing.html#original-insertion-mode)
    pub(super) original_insertion_mode: InsertionMode,

    /// [§ 13.2.4.1](https://html.spec.whatwg.org/multipage/parsing.html#stack-of-template-insertion-modes)
    pub(super) template_insertion_modes: Vec<InsertionMode>,

    /// [§ 13.2.4.2 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    pub(super) stack_of_open_elements: Vec<NodeId>,

    /// [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
    pub(super) active_formatting_elements: Vec<ActiveFormattingElement>,

    /// [§ 13.2.4.4 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    pub(super) head_element_pointer: Option<NodeId>,
    pub(super) form_element_pointer: Option<NodeId>,

    /// [§ 13.4](https://html.spec.whatwg.org/multipage/parsing.html#concept-frag-parse-context)
    pub(super) context_element: Option<NodeId>,
    /// The `html` element a fragment is built under.
    fragment_root: Option<NodeId>,

    /// [§ 13.2.4.5 Other parsing state flags](https://html.spec.whatwg.org/multipage/parsing.html#frameset-ok-flag)
    pub(super) frameset_ok: bool,
    /// [§ 13.2.4.5](https://html.spec.whatwg.org/multipage/parsing.html#scripting-flag)
    pub(super) scripting: bool,

    /// [§ 13.2.6.1](https://html.spec.whatwg.org/multipage/parsing.html#foster-parent)
    pub(super) foster_parenting: bool,

    /// [§ 13.2.6.4.10](https://html.spec.whatwg.org/multipage/parsing.html#concept-pending-table-char-tokens)
    pub(super) pending_table_character_tokens: Vec<(String, Option<Span>)>,

    /// "If the next token is a U+000A LINE FEED (LF) character token, then
    /// ignore that token and move on to the next one."
    pub(super) ignore_next_line_feed: bool,

    /// [§ 13.2.5.40](https://html.spec.whatwg.org/multipage/parsing.html#acknowledge-self-closing-flag)
    pub(super) self_closing_acknowledged: bool,

    /// The previous token was an attribute-free `<select>` start tag.
    pub(super) after_bare_select: bool,
    pub(super) select_option_compat: bool,

    pub(super) capture_spans: bool,
    /// Span given to nodes created for the token being processed.
    pub(super) token_span: Option<Span>,
    /// Full source range of the token being processed.
    pub(super) token_source: Span,
    pub(super) token_kind: TokenKind,
    pub(super) token_tag: Option<String>,
    /// End offsets of elements closed by their own end tag.
    pub(super) explicit_ends: HashMap<NodeId, usize>,
    /// Elements popped by some other token: where that token started.
    pub(super) closed_at: HashMap<NodeId, usize>,

    pub(super) errors: Vec<ParseError>,
    pub(super) stopped: bool,
    meter: BudgetMeter,
    trace: Option<TraceLog>,
    failure: Option<BudgetExceeded>,
}

impl TreeBuilder {
    /// A builder for a full document.
    pub(crate) fn new(
        input: String,
        options: &ParseOptions,
        meter: BudgetMeter,
        trace: Option<TraceLog>,
    ) -> Self {
        let tokenizer = HTMLTokenizer::with_options(input, options.tokenizer_options());
        Self::with_tree(tokenizer, DomTree::new(), options, meter, trace)
    }

    fn with_tree(
        tokenizer: HTMLTokenizer,
        tree: DomTree,
        options: &ParseOptions,
        meter: BudgetMeter,
        trace: Option<TraceLog>,
    ) -> Self {
        Self {
            tokenizer,
            tree,
            insertion_mode: InsertionMode::Initial,
            original_insertion_mode: InsertionMode::Initial,
            template_insertion_modes: Vec::new(),
            stack_of_open_elements: Vec::new(),
            active_formatting_elements: Vec::new(),
            head_element_pointer: None,
            form_element_pointer: None,
            context_element: None,
            fragment_root: None,
            frameset_ok: true,
            scripting: options.scripting,
            foster_parenting: false,
            pending_table_character_tokens: Vec::new(),
            ignore_next_line_feed: false,
            self_closing_acknowledged: false,
            after_bare_select: false,
            select_option_compat: options.select_option_compat,
            capture_spans: options.capture_spans,
            token_span: None,
            token_source: Span::default(),
            token_kind: TokenKind::EndOfFile,
            token_tag: None,
            explicit_ends: HashMap::new(),
            closed_at: HashMap::new(),
            errors: Vec::new(),
            stopped: false,
            meter,
            trace,
            failure: None,
        }
    }

    /// [§ 13.4 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
    pub(crate) fn new_fragment(
        input: String,
        context: &FragmentContext,
        options: &ParseOptions,
        meter: BudgetMeter,
        trace: Option<TraceLog>,
    ) -> Self {
        let mut tokenizer_options = options.tokenizer_options();

        // STEP 4: "Set the state of the HTML parser's tokenization stage as
        //          follows, switching on the context element"
        if context.namespace == Namespace::Html {
            tokenizer_options.initial_state = match context.tag_name.as_str() {
                "title" | "textarea" => TokenizerState::RCDATA,
                "style" | "xmp" | "iframe" | "noembed" | "noframes" => TokenizerState::RAWTEXT,
                "noscript" if options.scripting => TokenizerState::RAWTEXT,
                "script" => TokenizerState::ScriptData,
                "plaintext" => TokenizerState::PLAINTEXT,
                _ => TokenizerState::Data,
            };
            tokenizer_options.last_start_tag = Some(context.tag_name.clone());
        }

        let tokenizer = HTMLTokenizer::with_options(input, tokenizer_options);
        let mut builder = Self::with_tree(tokenizer, DomTree::new_fragment(), options, meter, trace);

        // The context element is never attached, so it is dropped when the
        // tree is renumbered.
        let context_element = builder.tree.alloc(NodeType::Element(ElementData::new(
            context.tag_name.clone(),
            context.namespace,
            Vec::new(),
        )));
        builder.context_element = Some(context_element);

        // STEP 5: "Let root be a new html element with no attributes."
        let root = builder.tree.alloc(NodeType::Element(ElementData::html("html")));
        // STEP 6: "Append the element root to the Document node created above."
        builder.tree.append_child(NodeId::ROOT, root);
        builder.fragment_root = Some(root);

        // STEP 7: "Set up the parser's stack of open elements so that it
        //          contains just the single element root."
        builder.push_open_element(root);

        // STEP 8: "If the context element is a template element, push "in
        //          template" onto the stack of template insertion modes"
        if context.namespace == Namespace::Html && context.tag_name == "template" {
            builder.template_insertion_modes.push(InsertionMode::InTemplate);
        }

        // STEP 10: "Reset the parser's insertion mode appropriately."
        builder.reset_insertion_mode_appropriately();

        // STEP 11: "Set the parser's form element pointer to the nearest node
        //           to the context element that is a form element"
        if context.namespace == Namespace::Html && context.tag_name == "form" {
            builder.form_element_pointer = Some(context_element);
        }

        builder.update_tokenizer_cdata();
        builder
    }

    /// Run tree construction to completion.
    ///
    /// # Errors
    /// Fails when a budget checkpoint or the trace log reports a breach.
    pub(crate) fn run(mut self) -> Result<BuildOutput, HtmlError> {
        self.trace_event(TraceEvent::PhaseStart {
            phase: Phase::TreeConstruction,
        });
        self.check_failure()?;

        while !self.stopped {
            let Some(emitted) = self.tokenizer.next_token() else {
                break;
            };
            self.errors.extend(self.tokenizer.take_errors());
            if let Err(exceeded) = self.meter.check_time() {
                self.fail(exceeded);
            }
            self.check_failure()?;
            self.process_emitted(emitted);
            self.check_failure()?;
        }
        self.errors.extend(self.tokenizer.take_errors());

        if self.capture_spans {
            self.finalize_spans();
        }
        self.detach_fragment_root();

        self.trace_event(TraceEvent::PhaseEnd {
            phase: Phase::TreeConstruction,
        });
        self.check_failure()?;

        tracing::debug!(
            nodes = self.meter.nodes(),
            errors = self.errors.len(),
            "tree construction finished"
        );
        Ok(BuildOutput {
            tree: self.tree,
            errors: self.errors,
            trace: self.trace,
        })
    }

    fn process_emitted(&mut self, emitted: EmittedToken) {
        let EmittedToken { token, span } = emitted;
        self.token_source = span;
        self.token_span = self.capture_spans.then_some(span);
        self.token_kind = token.kind();
        self.token_tag = token.tag_name().map(str::to_string);
        self.self_closing_acknowledged = false;
        let ignore_line_feed = std::mem::take(&mut self.ignore_next_line_feed);

        tracing::trace!(mode = %self.insertion_mode, token = %token, "tree construction");

        match token {
            Token::Character { mut data } => {
                let offsets = self.tokenizer.take_text_offsets();
                let mut text = TokenText {
                    span,
                    offsets: &offsets,
                    skipped: 0,
                };
                if ignore_line_feed && data.starts_with('\n') {
                    let _ = data.remove(0);
                    text.skipped = 1;
                }
                self.process_characters(&data, &text);
                self.after_bare_select = false;
            }
            token => {
                self.process_token(&token);
                if let Token::StartTag {
                    name,
                    self_closing,
                    attributes,
                } = &token
                {
                    // "When a start tag token is emitted with its self-closing
                    // flag set, if the flag is not acknowledged when it is
                    // processed by the tree construction stage, that is a
                    // non-void-html-element-start-tag-with-trailing-solidus
                    // parse error."
                    if *self_closing && !self.self_closing_acknowledged {
                        self.parse_error(ParseErrorCode::NonVoidHtmlElementStartTagWithTrailingSolidus);
                    }
                    self.after_bare_select = name == "select" && attributes.is_empty();
                } else {
                    self.after_bare_select = false;
                }
            }
        }
        self.update_tokenizer_cdata();
    }

    /// Split a character token into whitespace, NUL and other runs and
    /// process each run as its own token.
    ///
    /// Each run gets the source range its text was decoded from, so runs
    /// that land in the same text node merge back into one span.
    fn process_characters(&mut self, data: &str, text: &TokenText<'_>) {
        if data.is_empty() {
            return;
        }
        for (start, end) in character_runs(data) {
            self.token_span = if self.capture_spans {
                text.source_range(start, end, data.len())
            } else {
                None
            };
            let token = Token::Character {
                data: data[start..end].to_string(),
            };
            self.process_token(&token);
            if self.failure.is_some() {
                return;
            }
        }
    }

    /// [§ 13.2.6 Tree construction dispatcher](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    pub(super) fn process_token(&mut self, token: &Token) {
        if self.failure.is_some() {
            return;
        }
        if self.should_use_current_mode(token) {
            self.process_using_rules_for(self.insertion_mode, token);
        } else {
            self.handle_foreign_content(token);
        }
    }

    /// "As each token is emitted from the tokenizer, the user agent must
    /// follow the appropriate steps from the following list, known as the
    /// tree construction dispatcher"
    fn should_use_current_mode(&self, token: &Token) -> bool {
        let Some(node) = self.adjusted_current_node() else {
            // "If the stack of open elements is empty"
            return true;
        };
        let Some(element) = self.tree.as_element(node) else {
            return true;
        };
        // "If the adjusted current node is an element in the HTML namespace"
        if element.namespace == Namespace::Html || token.is_eof() {
            return true;
        }
        let mathml_text_integration_point = element.namespace == Namespace::MathMl
            && mathml::is_text_integration_point(&element.tag_name);
        match token {
            Token::StartTag { name, .. } => {
                // "If the adjusted current node is a MathML text integration
                // point and the token is a start tag whose tag name is neither
                // "mglyph" nor "malignmark""
                (mathml_text_integration_point && name != "mglyph" && name != "malignmark")
                    // "If the adjusted current node is a MathML annotation-xml
                    // element and the token is a start tag whose tag name is "svg""
                    || (element.namespace == Namespace::MathMl
                        && element.tag_name == "annotation-xml"
                        && name == "svg")
                    // "If the adjusted current node is an HTML integration
                    // point and the token is a start tag"
                    || self.is_html_integration_point(node)
            }
            Token::Character { .. } => {
                mathml_text_integration_point || self.is_html_integration_point(node)
            }
            _ => false,
        }
    }

    /// "Process the token using the rules for the X insertion mode."
    pub(super) fn process_using_rules_for(&mut self, mode: InsertionMode, token: &Token) {
        match mode {
            InsertionMode::Initial => self.handle_initial_mode(token),
            InsertionMode::BeforeHtml => self.handle_before_html_mode(token),
            InsertionMode::BeforeHead => self.handle_before_head_mode(token),
            InsertionMode::InHead => self.handle_in_head_mode(token),
            InsertionMode::InHeadNoscript => self.handle_in_head_noscript_mode(token),
            InsertionMode::AfterHead => self.handle_after_head_mode(token),
            InsertionMode::InBody => self.handle_in_body_mode(token),
            InsertionMode::Text => self.handle_text_mode(token),
            InsertionMode::InTable => self.handle_in_table_mode(token),
            InsertionMode::InTableText => self.handle_in_table_text_mode(token),
            InsertionMode::InCaption => self.handle_in_caption_mode(token),
            InsertionMode::InColumnGroup => self.handle_in_column_group_mode(token),
            InsertionMode::InTableBody => self.handle_in_table_body_mode(token),
            InsertionMode::InRow => self.handle_in_row_mode(token),
            InsertionMode::InCell => self.handle_in_cell_mode(token),
            InsertionMode::InSelect => self.handle_in_select_mode(token),
            InsertionMode::InSelectInTable => self.handle_in_select_in_table_mode(token),
            InsertionMode::InTemplate => self.handle_in_template_mode(token),
            InsertionMode::AfterBody => self.handle_after_body_mode(token),
            InsertionMode::InFrameset => self.handle_in_frameset_mode(token),
            InsertionMode::AfterFrameset => self.handle_after_frameset_mode(token),
            InsertionMode::AfterAfterBody => self.handle_after_after_body_mode(token),
            InsertionMode::AfterAfterFrameset => self.handle_after_after_frameset_mode(token),
        }
    }

    /// "Switch the insertion mode to X". Recorded in the trace when enabled.
    pub(super) fn switch_mode(&mut self, mode: InsertionMode) {
        let from = self.insertion_mode;
        self.insertion_mode = mode;
        if from == mode || self.trace.is_none() {
            return;
        }
        self.trace_event(TraceEvent::ModeTransition {
            from_mode: from.into(),
            to_mode: mode.into(),
            token_kind: self.token_kind.into(),
            tag: self.token_tag.clone(),
            offset: Some(self.token_source.start),
        });
    }

    /// Record a tree-construction parse error at the current token.
    pub(super) fn parse_error(&mut self, code: ParseErrorCode) {
        tracing::trace!(%code, offset = self.token_source.start, "parse error");
        self.errors
            .push(ParseError::new(code, Some(self.token_source)));
    }

    /// [§ 13.2.5.40](https://html.spec.whatwg.org/multipage/parsing.html#acknowledge-self-closing-flag)
    pub(super) const fn acknowledge_self_closing_flag(&mut self) {
        self.self_closing_acknowledged = true;
    }

    /// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#stop-parsing)
    ///
    /// "Pop all the nodes off the stack of open elements."
    pub(super) fn stop_parsing(&mut self) {
        while self.pop_current_node().is_some() {}
        self.stopped = true;
    }

    /// Switch the tokenizer between tokens.
    pub(super) const fn switch_tokenizer(&mut self, state: TokenizerState) {
        self.tokenizer.set_state(state);
    }

    /// [§ 13.2.5.42](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    ///
    /// CDATA sections are only recognized when "there is an adjusted current
    /// node and it is not an element in the HTML namespace".
    fn update_tokenizer_cdata(&mut self) {
        let foreign = self
            .adjusted_current_node()
            .and_then(|id| self.tree.as_element(id))
            .is_some_and(|e| e.namespace != Namespace::Html);
        self.tokenizer.set_allow_cdata(foreign);
    }

    /// Remember the first budget breach; the run loop aborts on it.
    pub(super) fn fail(&mut self, exceeded: BudgetExceeded) {
        if self.failure.is_none() {
            tracing::debug!(%exceeded, "budget exceeded during tree construction");
            self.failure = Some(exceeded);
        }
    }

    fn check_failure(&mut self) -> Result<(), HtmlError> {
        match self.failure.take() {
            Some(exceeded) => Err(exceeded.into()),
            None => Ok(()),
        }
    }

    fn trace_event(&mut self, event: TraceEvent) {
        let Some(log) = self.trace.as_mut() else {
            return;
        };
        if let Err(exceeded) = log.push(event) {
            self.fail(exceeded);
        }
    }

    /// Checkpoint: one more node exists.
    pub(super) fn record_node(&mut self) {
        if let Err(exceeded) = self.meter.record_node() {
            self.fail(exceeded);
        }
    }

    /// Checkpoint: the stack of open elements grew.
    pub(super) fn check_depth(&mut self) {
        if let Err(exceeded) = self.meter.check_depth(self.stack_of_open_elements.len()) {
            self.fail(exceeded);
        }
    }

    /// Stretch every element span over its descendants and up to whatever
    /// closed it: its own end tag, or the start of the token that popped it.
    /// Source that built no node of its own (a stray end tag, say) stays
    /// inside the element it was seen in.
    ///
    /// Walks the tree in reverse pre-order so children are settled before
    /// their parent, without recursion.
    fn finalize_spans(&mut self) {
        let order: Vec<NodeId> = self.tree.descendants(NodeId::ROOT).collect();
        // Furthest source offset reached inside each subtree.
        let mut subtree_ends: HashMap<NodeId, usize> = HashMap::with_capacity(order.len());
        for &id in order.iter().rev() {
            let children_end = self
                .tree
                .children(id)
                .iter()
                .filter_map(|child| subtree_ends.get(child).copied())
                .max();
            let end = match (self.tree.as_element(id).is_some(), self.tree.span(id)) {
                (true, Some(span)) => {
                    let end = [
                        Some(span.end),
                        self.explicit_ends.get(&id).copied(),
                        self.closed_at.get(&id).copied(),
                        children_end,
                    ]
                    .into_iter()
                    .flatten()
                    .max()
                    .unwrap_or(span.end);
                    self.tree.set_span(id, Some(Span::new(span.start, end)));
                    Some(end)
                }
                (_, Some(span)) => Some(span.end.max(children_end.unwrap_or(0))),
                (_, None) => children_end,
            };
            if let Some(end) = end {
                let _ = subtree_ends.insert(id, end);
            }
        }
    }

    /// A fragment's result is the children of its `html` element.
    fn detach_fragment_root(&mut self) {
        let Some(html) = self.fragment_root else {
            return;
        };
        let strays: Vec<NodeId> = self.tree.root_children().to_vec();
        for stray in strays {
            self.tree.detach(stray);
        }
        self.tree.move_children(html, NodeId::ROOT);
    }
}

/// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
pub(super) const fn is_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

/// Whether a character run is entirely ASCII whitespace.
pub(super) fn is_whitespace_run(data: &str) -> bool {
    !data.is_empty() && data.chars().all(is_whitespace)
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum RunClass {
    Whitespace,
    Null,
    Other,
}

fn classify(c: char) -> RunClass {
    if is_whitespace(c) {
        RunClass::Whitespace
    } else if c == '\0' {
        RunClass::Null
    } else {
        RunClass::Other
    }
}

/// A character token's source range and the decoded-to-source offsets of
/// its text. `skipped` counts decoded bytes dropped from the front (the LF
/// after `<pre>`).
struct TokenText<'a> {
    span: Span,
    offsets: &'a TextOffsets,
    skipped: usize,
}

impl TokenText<'_> {
    /// Source range of the decoded bytes `start..end` of a text `len` long.
    fn source_range(&self, start: usize, end: usize, len: usize) -> Option<Span> {
        let source_start = self.offsets.source_offset(start + self.skipped)?;
        let source_end = if end == len {
            self.span.end
        } else {
            self.offsets.source_offset(end + self.skipped)?
        };
        let inside = self.span.start <= source_start
            && source_start <= source_end
            && source_end <= self.span.end;
        inside.then_some(Span::new(source_start, source_end))
    }
}

/// Byte ranges of maximal runs of one character class.
fn character_runs(data: &str) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut class = None;
    for (offset, c) in data.char_indices() {
        let current = classify(c);
        if class.is_some_and(|previous| previous != current) {
            runs.push((start, offset));
            start = offset;
        }
        class = Some(current);
    }
    if start < data.len() {
        runs.push((start, data.len()));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_runs_split_by_class() {
        assert_eq!(character_runs("ab  c"), vec![(0, 2), (2, 4), (4, 5)]);
        assert_eq!(character_runs("\0\0x"), vec![(0, 2), (2, 3)]);
        assert_eq!(character_runs("\n"), vec![(0, 1)]);
    }

    #[test]
    fn test_fragment_context_names() {
        let ctx = FragmentContext::parse("svg path").unwrap();
        assert_eq!(ctx.namespace, Namespace::Svg);
        assert_eq!(ctx.tag_name, "path");
        let ctx = FragmentContext::parse("TD").unwrap();
        assert_eq!(ctx.tag_name, "td");
        assert!(FragmentContext::parse("").is_err());
        assert!(FragmentContext::parse("   ").is_err());
        assert!(FragmentContext::parse("svg ").is_err());
    }

    #[test]
    fn test_mode_names_are_kebab_case() {
        let name: &'static str = InsertionMode::InSelectInTable.into();
        assert_eq!(name, "in-select-in-table");
        assert_eq!(InsertionMode::AfterAfterBody.to_string(), "after-after-body");
    }
}
