//! Error types.
//!
//! [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
//!
//! Two very different things live here:
//! - [`ParseError`] values are recoverable findings about malformed markup.
//!   They are returned as data in the parse result and never abort a parse.
//! - [`HtmlError`] is the failure channel of the public operations: budget
//!   breaches, API misuse and stream read failures.

use quire_common::BudgetExceeded;
use quire_dom::{NodeId, Span};
use strum_macros::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Stable identifier of a recoverable parse error.
///
/// Tokenizer codes are the names defined in
/// [§ 13.2.2](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors);
/// tree-construction codes name the rule that rejected the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ParseErrorCode {
    // ----- tokenizer -----
    /// `<!-->` or `<!--->`.
    AbruptClosingOfEmptyComment,
    /// `>` inside a DOCTYPE public identifier.
    AbruptDoctypePublicIdentifier,
    /// `>` inside a DOCTYPE system identifier.
    AbruptDoctypeSystemIdentifier,
    /// `&#` or `&#x` without digits.
    AbsenceOfDigitsInNumericCharacterReference,
    /// CDATA section outside foreign content.
    CdataInHtmlContent,
    /// Numeric reference above U+10FFFF.
    CharacterReferenceOutsideUnicodeRange,
    /// Control character in the input stream.
    ControlCharacterInInputStream,
    /// Numeric reference to a control character.
    ControlCharacterReference,
    /// Attribute name repeated on one tag.
    DuplicateAttribute,
    /// End tag carrying attributes.
    EndTagWithAttributes,
    /// End tag with a trailing `/`.
    EndTagWithTrailingSolidus,
    /// Input ended right after `<` or `</`.
    EofBeforeTagName,
    /// Input ended inside a CDATA section.
    EofInCdata,
    /// Input ended inside a comment.
    EofInComment,
    /// Input ended inside a DOCTYPE.
    EofInDoctype,
    /// Input ended inside `<!--` in script data.
    EofInScriptHtmlCommentLikeText,
    /// Input ended inside a tag.
    EofInTag,
    /// Comment closed with `--!>`.
    IncorrectlyClosedComment,
    /// `<!` not followed by `--`, `DOCTYPE` or `[CDATA[`.
    IncorrectlyOpenedComment,
    /// Garbage after the DOCTYPE name.
    InvalidCharacterSequenceAfterDoctypeName,
    /// `<` followed by a non-letter.
    InvalidFirstCharacterOfTagName,
    /// `name=` followed by `>`.
    MissingAttributeValue,
    /// `<!DOCTYPE>` without a name.
    MissingDoctypeName,
    /// `PUBLIC` keyword without identifier.
    MissingDoctypePublicIdentifier,
    /// `SYSTEM` keyword without identifier.
    MissingDoctypeSystemIdentifier,
    /// `</>`.
    MissingEndTagName,
    /// Unquoted DOCTYPE public identifier.
    MissingQuoteBeforeDoctypePublicIdentifier,
    /// Unquoted DOCTYPE system identifier.
    MissingQuoteBeforeDoctypeSystemIdentifier,
    /// Named reference not terminated by `;`.
    MissingSemicolonAfterCharacterReference,
    /// `PUBLIC"`.
    MissingWhitespaceAfterDoctypePublicKeyword,
    /// `SYSTEM"`.
    MissingWhitespaceAfterDoctypeSystemKeyword,
    /// `<!DOCTYPEhtml>`.
    MissingWhitespaceBeforeDoctypeName,
    /// `a="1"b="2"`.
    MissingWhitespaceBetweenAttributes,
    /// Public and system identifiers not separated.
    MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers,
    /// `<!--` inside a comment.
    NestedComment,
    /// Numeric reference to a noncharacter.
    NoncharacterCharacterReference,
    /// Noncharacter in the input stream.
    NoncharacterInInputStream,
    /// `<div/>` on a non-void HTML element.
    NonVoidHtmlElementStartTagWithTrailingSolidus,
    /// `&#0;`.
    NullCharacterReference,
    /// Numeric reference to a surrogate.
    SurrogateCharacterReference,
    /// Lone surrogate in the input stream.
    SurrogateInInputStream,
    /// Garbage after the DOCTYPE system identifier.
    UnexpectedCharacterAfterDoctypeSystemIdentifier,
    /// `"`, `'` or `<` in an attribute name.
    UnexpectedCharacterInAttributeName,
    /// `"`, `'`, `<`, `=` or `` ` `` in an unquoted value.
    UnexpectedCharacterInUnquotedAttributeValue,
    /// `=` starting an attribute name.
    UnexpectedEqualsSignBeforeAttributeName,
    /// U+0000 in the input.
    UnexpectedNullCharacter,
    /// `<?`.
    UnexpectedQuestionMarkInsteadOfTagName,
    /// `/` in a tag not followed by `>`.
    UnexpectedSolidusInTag,
    /// `&name;` not in the table.
    UnknownNamedCharacterReference,

    // ----- tree construction -----
    /// Content before the DOCTYPE, or no DOCTYPE at all.
    MissingDoctype,
    /// DOCTYPE that is not `<!DOCTYPE html>`.
    NonConformingDoctype,
    /// DOCTYPE after the first token.
    UnexpectedDoctype,
    /// Start tag not allowed in the current insertion mode.
    UnexpectedStartTag,
    /// End tag without a matching open element.
    UnexpectedEndTag,
    /// Non-whitespace text where none is allowed.
    UnexpectedCharacter,
    /// End of input with elements still open.
    UnexpectedEof,
    /// Elements implicitly closed by an end tag.
    UnclosedElements,
    /// Formatting elements reconciled by the adoption agency algorithm.
    MisnestedFormattingElement,
    /// Content relocated out of a table.
    FosterParentedContent,
    /// `<image>` rewritten to `<img>`.
    ImageTagRenamed,

    // ----- soft tokenizer limits -----
    /// A single token exceeded the per-token byte ceiling and was dropped.
    TokenSizeLimitExceeded,
    /// Cumulative character data exceeded its ceiling; later text was dropped.
    TextLimitExceeded,
}

impl ParseErrorCode {
    /// Whether the code is one of the tokenizer errors named by the standard.
    #[must_use]
    pub const fn is_tokenizer_error(self) -> bool {
        (self as u8) <= (Self::UnknownNamedCharacterReference as u8)
    }

    /// Fixed reference into the WHATWG standard for this code.
    #[must_use]
    pub fn spec_reference(self) -> String {
        const BASE: &str = "https://html.spec.whatwg.org/multipage/parsing.html";
        if self.is_tokenizer_error() {
            format!("{BASE}#parse-error-{self}")
        } else if matches!(self, Self::TokenSizeLimitExceeded | Self::TextLimitExceeded) {
            format!("{BASE}#parse-errors")
        } else {
            format!("{BASE}#tree-construction")
        }
    }
}

/// A recoverable parse error: a code and where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseError {
    /// What went wrong.
    pub code: ParseErrorCode,
    /// The offending source range, when one is known.
    pub span: Option<Span>,
}

impl ParseError {
    /// Build a parse error.
    #[must_use]
    pub const fn new(code: ParseErrorCode, span: Option<Span>) -> Self {
        Self { code, span }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} at {span}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Failure of a public operation.
#[derive(Debug, Error)]
pub enum HtmlError {
    /// A budget checkpoint observed a value above its ceiling.
    #[error(transparent)]
    Budget(#[from] BudgetExceeded),

    /// `parse_fragment` was given an empty or malformed context name.
    #[error("INVALID_FRAGMENT_CONTEXT: {0:?} is not a valid context element name")]
    InvalidFragmentContext(String),

    /// Two edits target the same node.
    #[error("DUPLICATE_PATCH_EDIT: node {0} is edited more than once")]
    DuplicatePatchEdit(NodeId),

    /// Two edits target overlapping source ranges.
    #[error("OVERLAPPING_PATCH_EDITS: node {first} ({first_span}) overlaps node {second} ({second_span})")]
    OverlappingPatchEdits {
        /// Earlier edit in source order.
        first: NodeId,
        /// Its span.
        first_span: Span,
        /// Later edit in source order.
        second: NodeId,
        /// Its span.
        second_span: Span,
    },

    /// An edit names a node that does not exist in the tree.
    #[error("UNKNOWN_PATCH_TARGET: node {0} does not exist")]
    UnknownPatchTarget(NodeId),

    /// An edit targets a node without a span traceable to the input.
    #[error("NON_INPUT_SPAN_PROVENANCE: node {0} has no span from the input")]
    NonInputSpanProvenance(NodeId),

    /// A span does not fit the source text it is applied to.
    #[error("SPAN_OUT_OF_RANGE: span {span} does not fit a source of {source_len} bytes")]
    SpanOutOfRange {
        /// The offending span.
        span: Span,
        /// Length of the source text.
        source_len: usize,
    },

    /// A patch plan step is out of order, out of range, or not at the cursor.
    #[error("PATCH_PLAN_BOUNDS: step {step}: {reason}")]
    PatchPlanBounds {
        /// Index of the offending step.
        step: usize,
        /// What was violated.
        reason: String,
    },

    /// The byte source of a streaming parse failed.
    #[error("STREAM_READ_FAILED: {0}")]
    Stream(#[source] std::io::Error),
}

impl HtmlError {
    /// Stable uppercase identifier of the failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Budget(_) => BudgetExceeded::CODE,
            Self::InvalidFragmentContext(_) => "INVALID_FRAGMENT_CONTEXT",
            Self::DuplicatePatchEdit(_) => "DUPLICATE_PATCH_EDIT",
            Self::OverlappingPatchEdits { .. } => "OVERLAPPING_PATCH_EDITS",
            Self::UnknownPatchTarget(_) => "UNKNOWN_PATCH_TARGET",
            Self::NonInputSpanProvenance(_) => "NON_INPUT_SPAN_PROVENANCE",
            Self::SpanOutOfRange { .. } => "SPAN_OUT_OF_RANGE",
            Self::PatchPlanBounds { .. } => "PATCH_PLAN_BOUNDS",
            Self::Stream(_) => "STREAM_READ_FAILED",
        }
    }

    /// The budget breach, if this is one.
    #[must_use]
    pub const fn as_budget(&self) -> Option<&BudgetExceeded> {
        match self {
            Self::Budget(exceeded) => Some(exceeded),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_render_kebab_case() {
        assert_eq!(ParseErrorCode::EofInComment.to_string(), "eof-in-comment");
        assert_eq!(
            ParseErrorCode::NonVoidHtmlElementStartTagWithTrailingSolidus.to_string(),
            "non-void-html-element-start-tag-with-trailing-solidus"
        );
        assert_eq!(ParseErrorCode::CdataInHtmlContent.to_string(), "cdata-in-html-content");
    }

    #[test]
    fn test_spec_reference() {
        assert_eq!(
            ParseErrorCode::MissingEndTagName.spec_reference(),
            "https://html.spec.whatwg.org/multipage/parsing.html#parse-error-missing-end-tag-name"
        );
        assert!(!ParseErrorCode::UnexpectedEndTag.is_tokenizer_error());
        assert!(
            ParseErrorCode::UnexpectedEndTag
                .spec_reference()
                .ends_with("#tree-construction")
        );
    }

    #[test]
    fn test_code_parses_back() {
        let code: ParseErrorCode = "duplicate-attribute".parse().unwrap();
        assert_eq!(code, ParseErrorCode::DuplicateAttribute);
    }
}
