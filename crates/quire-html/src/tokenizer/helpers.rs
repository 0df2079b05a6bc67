//! Helper functions for the HTML tokenizer.
//!
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//!
//! This module contains utility functions used throughout the tokenizer:
//! - State transitions ("Switch to", "Reconsume in")
//! - Input/character handling ("Consume the next input character")
//! - Token emission ("Emit the current token"), with source spans
//! - Attribute helpers for duplicate detection

use quire_dom::Span;

use super::DuplicateAttributes;
use super::core::{HTMLTokenizer, TokenizerState};
use super::token::{EmittedToken, Token};
use crate::error::{ParseError, ParseErrorCode};

// =============================================================================
// State Transition Helpers
// =============================================================================

impl HTMLTokenizer {
    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
    ///
    /// "Switch to the X state"
    pub(super) const fn switch_to(&mut self, new_state: TokenizerState) {
        self.state = new_state;
    }

    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
    ///
    /// "Reconsume in the X state"
    ///
    /// The same character will be processed again in the new state.
    pub(super) const fn reconsume_in(&mut self, new_state: TokenizerState) {
        self.reconsume = true;
        self.state = new_state;
    }

    /// Record a parse error at the current input character.
    pub(super) fn parse_error(&mut self, code: ParseErrorCode) {
        let span = Span::new(self.current_char_start, self.pos);
        self.errors.push(ParseError::new(code, Some(span)));
    }

    /// Whether the state that will receive a character reference's output is
    /// an attribute value state.
    pub(super) const fn return_state_is_attribute_value(&self) -> bool {
        matches!(
            self.return_state,
            TokenizerState::AttributeValueDoubleQuoted
                | TokenizerState::AttributeValueSingleQuoted
                | TokenizerState::AttributeValueUnquoted
        )
    }
}

// =============================================================================
// Input/Character Helpers
// =============================================================================

impl HTMLTokenizer {
    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
    ///
    /// "Consume the next input character"
    ///
    /// [§ 13.2.3.5 Preprocessing the input stream](https://html.spec.whatwg.org/multipage/parsing.html#preprocessing-the-input-stream):
    /// "the user agent must normalize newlines by replacing every U+000D CR U+000A LF
    /// code point pair with a single U+000A LF code point, and then replacing every
    /// remaining U+000D CR code point with a U+000A LF code point."
    ///
    /// Offsets keep pointing into the original input, so a CR LF pair
    /// consumes two bytes and yields one LF.
    pub(super) fn consume(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        if c == '\r' {
            if self.input[self.pos..].starts_with('\n') {
                self.pos += 1;
            }
            return Some('\n');
        }
        self.check_input_stream_character(c);
        Some(c)
    }

    /// [§ 13.2.3.5 Preprocessing the input stream](https://html.spec.whatwg.org/multipage/parsing.html#preprocessing-the-input-stream)
    ///
    /// "Any occurrences of noncharacters in the input stream are
    /// noncharacter-in-input-stream parse errors and any occurrences of controls
    /// other than ASCII whitespace and U+0000 NULL characters are
    /// control-character-in-input-stream parse errors."
    fn check_input_stream_character(&mut self, c: char) {
        if is_noncharacter(u32::from(c)) {
            self.parse_error(ParseErrorCode::NoncharacterInInputStream);
        } else if is_control(u32::from(c)) && !Self::is_whitespace_char(c) && c != '\0' {
            self.parse_error(ParseErrorCode::ControlCharacterInInputStream);
        }
    }

    /// Peek at a character at the given offset from the current position
    /// without consuming it.
    #[must_use]
    pub(super) fn peek_codepoint(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    /// Consume the given ASCII string from the input.
    /// Caller must have already verified the characters are present.
    pub(super) const fn consume_string(&mut self, target: &str) {
        self.pos += target.len();
    }

    /// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
    ///
    /// NOTE: CR never reaches the states, it is normalized in [`Self::consume`].
    pub(super) const fn is_whitespace_char(input_char: char) -> bool {
        matches!(input_char, ' ' | '\t' | '\n' | '\x0C')
    }
}

/// [Noncharacter](https://infra.spec.whatwg.org/#noncharacter):
/// "U+FDD0 to U+FDEF, inclusive, or U+FFFE, U+FFFF, U+1FFFE, U+1FFFF, ..., U+10FFFE, or U+10FFFF."
pub(super) const fn is_noncharacter(code: u32) -> bool {
    matches!(code, 0xFDD0..=0xFDEF) || (code & 0xFFFE == 0xFFFE && code <= 0x10_FFFF)
}

/// [Control](https://infra.spec.whatwg.org/#control): "a C0 control or a code
/// point in the range U+007F DELETE to U+009F APPLICATION PROGRAM COMMAND, inclusive."
pub(super) const fn is_control(code: u32) -> bool {
    code <= 0x1F || matches!(code, 0x7F..=0x9F)
}

// =============================================================================
// Token Emission Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Emit the current input character as a character token."
    pub(super) fn emit_char(&mut self, c: char) {
        self.emit_char_from(c, self.current_char_start);
    }

    /// Append character data that came from source starting at `start`.
    pub(super) fn emit_char_from(&mut self, c: char, start: usize) {
        if self.pending_text_start.is_none() {
            self.pending_text_start = Some(start);
        }
        self.pending_offsets.push(self.pending_text.len(), start);
        self.pending_text.push(c);
    }

    /// Append a run of character data that came from source starting at `start`.
    pub(super) fn emit_str_from(&mut self, s: &str, start: usize) {
        if s.is_empty() {
            return;
        }
        if self.pending_text_start.is_none() {
            self.pending_text_start = Some(start);
        }
        self.pending_offsets.push(self.pending_text.len(), start);
        self.pending_text.push_str(s);
    }

    /// Turn buffered character data into one character token ending at `end`.
    pub(super) fn flush_text(&mut self, end: usize) {
        let Some(start) = self.pending_text_start.take() else {
            return;
        };
        let mut data = std::mem::take(&mut self.pending_text);
        let mut offsets = std::mem::take(&mut self.pending_offsets);
        if data.is_empty() {
            return;
        }
        if let Some(limit) = self.options.limits.max_text_bytes {
            if self.text_limit_hit {
                return;
            }
            let remaining = limit.saturating_sub(self.text_bytes_emitted);
            if data.len() > remaining {
                let mut cut = remaining;
                while !data.is_char_boundary(cut) {
                    cut -= 1;
                }
                data.truncate(cut);
                offsets.truncate(cut);
                self.text_limit_hit = true;
                self.errors.push(ParseError::new(
                    ParseErrorCode::TextLimitExceeded,
                    Some(Span::new(start, end)),
                ));
                tracing::warn!(limit, "character data limit reached, dropping further text");
                if data.is_empty() {
                    return;
                }
            }
        }
        self.text_bytes_emitted += data.len();
        if self.options.xml_violation_mode {
            data = coerce_text_for_xml(&data);
        }
        self.queued_offsets.push_back(offsets);
        self.queue.push_back(EmittedToken {
            token: Token::Character { data },
            span: Span::new(start, end),
        });
    }

    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
    ///
    /// "Emit the current token" - the tag, comment or DOCTYPE that started at
    /// the last `<` and ends at the current position.
    pub(super) fn emit_current_token(&mut self) {
        self.discard_dropped_attribute();
        let Some(mut token) = self.current_token.take() else {
            return;
        };
        self.flush_text(self.markup_start);
        let span = Span::new(self.markup_start, self.pos);

        match &mut token {
            Token::StartTag { name, .. } => {
                // "The last start tag token emitted"
                self.last_start_tag_name = Some(name.clone());
            }
            Token::EndTag {
                attributes,
                self_closing,
                ..
            } => {
                // [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
                // "When an end tag token is emitted with attributes, that is an
                // end-tag-with-attributes parse error. When an end tag token is emitted
                // with its self-closing flag set, that is an end-tag-with-trailing-solidus
                // parse error."
                if !attributes.is_empty() {
                    self.errors.push(ParseError::new(
                        ParseErrorCode::EndTagWithAttributes,
                        Some(span),
                    ));
                }
                if *self_closing {
                    self.errors.push(ParseError::new(
                        ParseErrorCode::EndTagWithTrailingSolidus,
                        Some(span),
                    ));
                }
            }
            Token::Comment { data } if self.options.xml_violation_mode => {
                *data = coerce_comment_for_xml(data);
            }
            _ => {}
        }

        if let Some(limit) = self.options.limits.max_token_bytes
            && span.len() > limit
        {
            self.errors.push(ParseError::new(
                ParseErrorCode::TokenSizeLimitExceeded,
                Some(span),
            ));
            tracing::debug!(limit, size = span.len(), kind = %token.kind(), "dropping oversized token");
            return;
        }

        self.queue.push_back(EmittedToken { token, span });
    }

    /// "Emit an end-of-file token."
    pub(super) fn emit_eof_token(&mut self) {
        let len = self.input.len();
        self.flush_text(len);
        self.queue.push_back(EmittedToken {
            token: Token::EndOfFile,
            span: Span::new(len, len),
        });
        self.finished = true;
    }

    /// Mark the current input character as the start of markup.
    pub(super) const fn begin_markup(&mut self) {
        self.markup_start = self.current_char_start;
    }
}

/// Form feeds become spaces and noncharacters become U+FFFD.
fn coerce_text_for_xml(data: &str) -> String {
    data.chars()
        .map(|c| match c {
            '\x0C' => ' ',
            c if is_noncharacter(u32::from(c)) => '\u{FFFD}',
            c => c,
        })
        .collect()
}

/// `--` cannot appear inside an XML comment.
fn coerce_comment_for_xml(data: &str) -> String {
    let mut data = coerce_text_for_xml(data);
    while data.contains("--") {
        data = data.replace("--", "- -");
    }
    data
}

// =============================================================================
// RCDATA/RAWTEXT Helpers
// =============================================================================

impl HTMLTokenizer {
    /// [§ 13.2.5.11 RCDATA end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-name-state)
    ///
    /// "An appropriate end tag token is an end tag token whose tag name matches
    /// the tag name of the last start tag to have been emitted from this
    /// tokenizer, if any."
    pub(super) fn is_appropriate_end_tag_token(&self) -> bool {
        if let (Some(last_start_tag), Some(Token::EndTag { name, .. })) =
            (&self.last_start_tag_name, &self.current_token)
        {
            return name == last_start_tag;
        }
        false
    }

    /// "Emit a U+003C LESS-THAN SIGN character token, a U+002F SOLIDUS character
    /// token, and a character token for each of the characters in the temporary
    /// buffer (in the order they were added to the buffer)."
    pub(super) fn emit_less_than_solidus_and_buffer(&mut self) {
        self.current_token = None;
        let start = self.markup_start;
        self.emit_str_from("</", start);
        let buffer = std::mem::take(&mut self.temporary_buffer);
        self.emit_str_from(&buffer, start + 2);
    }
}

// =============================================================================
// Attribute Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Start a new attribute in the current tag token. Set that attribute name
    /// and value to the empty string."
    pub(super) fn start_new_attribute(&mut self) {
        self.discard_dropped_attribute();
        let start = self.current_char_start;
        if let Some(token) = self.current_token.as_mut() {
            token.start_new_attribute(start);
        }
    }

    /// Append to the current attribute's name, lowercased by the caller.
    pub(super) fn append_to_attribute_name(&mut self, c: char) {
        let end = self.pos;
        if let Some(attr) = self.current_token.as_mut().and_then(Token::current_attribute_mut) {
            attr.name.push(c);
            attr.span = Span::new(attr.span.start, end);
        }
    }

    /// Append to the current attribute's value.
    pub(super) fn append_to_attribute_value(&mut self, s: &str) {
        if let Some(attr) = self.current_token.as_mut().and_then(Token::current_attribute_mut) {
            attr.value.push_str(s);
        }
    }

    /// Extend the current attribute's span to `end`.
    pub(super) fn set_attribute_end(&mut self, end: usize) {
        if let Some(attr) = self.current_token.as_mut().and_then(Token::current_attribute_mut) {
            attr.span = Span::new(attr.span.start, end);
        }
    }

    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    ///
    /// "When the user agent leaves the attribute name state (and before emitting the
    /// tag token, if appropriate), the complete attribute's name must be compared to
    /// the other attributes on the same token; if there is already an attribute on
    /// the token with the exact same name, then this is a duplicate-attribute parse
    /// error and the new attribute must be removed from the token."
    pub(super) fn check_duplicate_attribute(&mut self) {
        let Some(earlier) = self
            .current_token
            .as_ref()
            .and_then(Token::earlier_attribute_with_current_name)
        else {
            return;
        };
        self.parse_error(ParseErrorCode::DuplicateAttribute);
        match self.options.duplicate_attributes {
            DuplicateAttributes::KeepFirst => self.drop_current_attribute = true,
            DuplicateAttributes::LastWins => {
                if let Some(attributes) = self.current_token.as_mut().and_then(Token::attributes_mut)
                {
                    let _ = attributes.remove(earlier);
                }
            }
        }
    }

    /// Remove a duplicate attribute once it has been fully consumed.
    fn discard_dropped_attribute(&mut self) {
        if !self.drop_current_attribute {
            return;
        }
        self.drop_current_attribute = false;
        if let Some(attributes) = self.current_token.as_mut().and_then(Token::attributes_mut) {
            let _ = attributes.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noncharacters() {
        assert!(is_noncharacter(0xFDD0));
        assert!(is_noncharacter(0xFFFF));
        assert!(is_noncharacter(0x10_FFFE));
        assert!(!is_noncharacter(0xFFFD));
        assert!(!is_noncharacter(0x41));
    }

    #[test]
    fn test_controls() {
        assert!(is_control(0x01));
        assert!(is_control(0x7F));
        assert!(is_control(0x9F));
        assert!(!is_control(0xA0));
    }

    #[test]
    fn test_comment_coercion() {
        assert_eq!(coerce_comment_for_xml("a--b"), "a- -b");
        assert_eq!(coerce_comment_for_xml("---"), "- - -");
    }
}
