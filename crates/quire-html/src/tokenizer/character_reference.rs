//! Character reference states for the HTML tokenizer.
//!
//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//! through [§ 13.2.5.80](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state).

use quire_dom::Span;

use super::core::{HTMLTokenizer, TokenizerState};
use super::helpers::{is_control, is_noncharacter};
use super::named_character_references::longest_match;
use crate::error::{ParseError, ParseErrorCode};

/// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
///
/// "If the number is one of the numbers in the first column of the following
/// table, then find the row with that number in the first column, and set the
/// character reference code to the number in the second column of that row."
const C1_REPLACEMENTS: [(u32, u32); 27] = [
    (0x80, 0x20AC), // EURO SIGN (€)
    (0x82, 0x201A), // SINGLE LOW-9 QUOTATION MARK (‚)
    (0x83, 0x0192), // LATIN SMALL LETTER F WITH HOOK (ƒ)
    (0x84, 0x201E), // DOUBLE LOW-9 QUOTATION MARK („)
    (0x85, 0x2026), // HORIZONTAL ELLIPSIS (…)
    (0x86, 0x2020), // DAGGER (†)
    (0x87, 0x2021), // DOUBLE DAGGER (‡)
    (0x88, 0x02C6), // MODIFIER LETTER CIRCUMFLEX ACCENT (ˆ)
    (0x89, 0x2030), // PER MILLE SIGN (‰)
    (0x8A, 0x0160), // LATIN CAPITAL LETTER S WITH CARON (Š)
    (0x8B, 0x2039), // SINGLE LEFT-POINTING ANGLE QUOTATION MARK (‹)
    (0x8C, 0x0152), // LATIN CAPITAL LIGATURE OE (Œ)
    (0x8E, 0x017D), // LATIN CAPITAL LETTER Z WITH CARON (Ž)
    (0x91, 0x2018), // LEFT SINGLE QUOTATION MARK (‘)
    (0x92, 0x2019), // RIGHT SINGLE QUOTATION MARK (’)
    (0x93, 0x201C), // LEFT DOUBLE QUOTATION MARK (“)
    (0x94, 0x201D), // RIGHT DOUBLE QUOTATION MARK (”)
    (0x95, 0x2022), // BULLET (•)
    (0x96, 0x2013), // EN DASH (–)
    (0x97, 0x2014), // EM DASH (—)
    (0x98, 0x02DC), // SMALL TILDE (˜)
    (0x99, 0x2122), // TRADE MARK SIGN (™)
    (0x9A, 0x0161), // LATIN SMALL LETTER S WITH CARON (š)
    (0x9B, 0x203A), // SINGLE RIGHT-POINTING ANGLE QUOTATION MARK (›)
    (0x9C, 0x0153), // LATIN SMALL LIGATURE OE (œ)
    (0x9E, 0x017E), // LATIN SMALL LETTER Z WITH CARON (ž)
    (0x9F, 0x0178), // LATIN CAPITAL LETTER Y WITH DIAERESIS (Ÿ)
];

impl HTMLTokenizer {
    /// Report an error covering the whole reference consumed so far.
    fn character_reference_error(&mut self, code: ParseErrorCode) {
        let span = Span::new(self.charref_start, self.pos);
        self.errors.push(ParseError::new(code, Some(span)));
    }

    /// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
    ///
    /// "Flush code points consumed as a character reference": "If the
    /// character reference was consumed as part of an attribute, then append
    /// each character to the current attribute's value. Otherwise, emit each
    /// character as a character token."
    pub(super) fn flush_code_points_consumed_as_character_reference(&mut self) {
        let buffer = std::mem::take(&mut self.temporary_buffer);
        if self.return_state_is_attribute_value() {
            self.append_to_attribute_value(&buffer);
        } else {
            self.emit_str_from(&buffer, self.charref_start);
        }
    }

    /// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
    pub(super) fn handle_character_reference_state(&mut self) {
        // "Set the temporary buffer to the empty string. Append a U+0026
        // AMPERSAND (&) character to the temporary buffer."
        self.temporary_buffer.clear();
        self.temporary_buffer.push('&');
        match self.current_input_character {
            // "Reconsume in the named character reference state."
            Some(c) if c.is_ascii_alphanumeric() => {
                self.reconsume_in(TokenizerState::NamedCharacterReference);
            }
            // "Append the current input character to the temporary buffer. Switch to
            // the numeric character reference state."
            Some('#') => {
                self.temporary_buffer.push('#');
                self.switch_to(TokenizerState::NumericCharacterReference);
            }
            // "Flush code points consumed as a character reference. Reconsume in the
            // return state."
            _ => {
                self.flush_code_points_consumed_as_character_reference();
                self.reconsume_in(self.return_state);
            }
        }
    }

    /// [§ 13.2.5.73 Named character reference state](https://html.spec.whatwg.org/multipage/parsing.html#named-character-reference-state)
    pub(super) fn handle_named_character_reference_state(&mut self) {
        // "Consume the maximum number of characters possible, where the consumed
        // characters are one of the identifiers in the first column of the named
        // character references table. Append each character to the temporary
        // buffer when it's consumed."
        let Some((name, value)) = longest_match(&self.input[self.current_char_start..]) else {
            // "Otherwise: Flush code points consumed as a character reference.
            // Switch to the ambiguous ampersand state."
            self.flush_code_points_consumed_as_character_reference();
            self.reconsume_in(TokenizerState::AmbiguousAmpersand);
            return;
        };
        self.pos = self.current_char_start + name.len();
        self.temporary_buffer.push_str(name);

        let ends_with_semicolon = name.ends_with(';');
        // "If the character reference was consumed as part of an attribute, and the
        // last character matched is not a U+003B SEMICOLON character (;), and the
        // next input character is either a U+003D EQUALS SIGN character (=) or an
        // ASCII alphanumeric, then, for historical reasons, flush code points
        // consumed as a character reference and switch to the return state."
        if self.return_state_is_attribute_value()
            && !ends_with_semicolon
            && self
                .peek_codepoint(0)
                .is_some_and(|c| c == '=' || c.is_ascii_alphanumeric())
        {
            self.flush_code_points_consumed_as_character_reference();
            self.switch_to(self.return_state);
            return;
        }

        // "If the last character matched is not a U+003B SEMICOLON character (;),
        // then this is a missing-semicolon-after-character-reference parse error."
        if !ends_with_semicolon {
            self.character_reference_error(ParseErrorCode::MissingSemicolonAfterCharacterReference);
        }

        // "Set the temporary buffer to the empty string. Append one or two
        // characters corresponding to the character reference name (as given by
        // the second column of the named character references table) to the
        // temporary buffer. Flush code points consumed as a character reference.
        // Switch to the return state."
        self.temporary_buffer.clear();
        self.temporary_buffer.push_str(value);
        self.flush_code_points_consumed_as_character_reference();
        self.switch_to(self.return_state);
    }

    /// [§ 13.2.5.74 Ambiguous ampersand state](https://html.spec.whatwg.org/multipage/parsing.html#ambiguous-ampersand-state)
    pub(super) fn handle_ambiguous_ampersand_state(&mut self) {
        match self.current_input_character {
            // "If the character reference was consumed as part of an attribute, then
            // append the current input character to the current attribute's value.
            // Otherwise, emit the current input character as a character token."
            Some(c) if c.is_ascii_alphanumeric() => {
                if self.return_state_is_attribute_value() {
                    self.append_to_attribute_value(c.encode_utf8(&mut [0; 4]));
                } else {
                    self.emit_char(c);
                }
            }
            // "This is an unknown-named-character-reference parse error. Reconsume in
            // the return state."
            Some(';') => {
                self.character_reference_error(ParseErrorCode::UnknownNamedCharacterReference);
                self.reconsume_in(self.return_state);
            }
            _ => self.reconsume_in(self.return_state),
        }
    }

    /// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
    pub(super) fn handle_numeric_character_reference_state(&mut self) {
        // "Set the character reference code to zero (0)."
        self.character_reference_code = 0;
        match self.current_input_character {
            // "Append the current input character to the temporary buffer. Switch to
            // the hexadecimal character reference start state."
            Some(c @ ('x' | 'X')) => {
                self.temporary_buffer.push(c);
                self.switch_to(TokenizerState::HexadecimalCharacterReferenceStart);
            }
            _ => self.reconsume_in(TokenizerState::DecimalCharacterReferenceStart),
        }
    }

    /// [§ 13.2.5.76 Hexadecimal character reference start state](https://html.spec.whatwg.org/multipage/parsing.html#hexadecimal-character-reference-start-state)
    /// [§ 13.2.5.77 Decimal character reference start state](https://html.spec.whatwg.org/multipage/parsing.html#decimal-character-reference-start-state)
    pub(super) fn handle_numeric_character_reference_start_state(&mut self, hex: bool) {
        let radix = if hex { 16 } else { 10 };
        if self
            .current_input_character
            .is_some_and(|c| c.is_digit(radix))
        {
            self.reconsume_in(if hex {
                TokenizerState::HexadecimalCharacterReference
            } else {
                TokenizerState::DecimalCharacterReference
            });
        } else {
            // "This is an absence-of-digits-in-numeric-character-reference parse
            // error. Flush code points consumed as a character reference. Reconsume
            // in the return state."
            self.character_reference_error(
                ParseErrorCode::AbsenceOfDigitsInNumericCharacterReference,
            );
            self.flush_code_points_consumed_as_character_reference();
            self.reconsume_in(self.return_state);
        }
    }

    /// [§ 13.2.5.78 Hexadecimal character reference state](https://html.spec.whatwg.org/multipage/parsing.html#hexadecimal-character-reference-state)
    pub(super) fn handle_hexadecimal_character_reference_state(&mut self) {
        self.handle_numeric_digits(16);
    }

    /// [§ 13.2.5.79 Decimal character reference state](https://html.spec.whatwg.org/multipage/parsing.html#decimal-character-reference-state)
    pub(super) fn handle_decimal_character_reference_state(&mut self) {
        self.handle_numeric_digits(10);
    }

    fn handle_numeric_digits(&mut self, radix: u32) {
        match self.current_input_character {
            // "Multiply the character reference code by 16. Add a numeric version of
            // the current input character to the character reference code."
            Some(c) if c.is_digit(radix) => {
                let digit = c.to_digit(radix).unwrap_or_default();
                self.character_reference_code = self
                    .character_reference_code
                    .saturating_mul(radix)
                    .saturating_add(digit);
            }
            // "Switch to the numeric character reference end state."
            Some(';') => {
                self.finish_numeric_character_reference();
                self.switch_to(self.return_state);
            }
            // "This is a missing-semicolon-after-character-reference parse error.
            // Reconsume in the numeric character reference end state."
            _ => {
                self.character_reference_error(
                    ParseErrorCode::MissingSemicolonAfterCharacterReference,
                );
                self.finish_numeric_character_reference();
                self.reconsume_in(self.return_state);
            }
        }
    }

    /// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
    ///
    /// The digit states run the end state inline, since it consumes nothing.
    pub(super) fn handle_numeric_character_reference_end_state(&mut self) {
        self.finish_numeric_character_reference();
        self.reconsume_in(self.return_state);
    }

    /// "Check the character reference code", then flush the resulting character.
    fn finish_numeric_character_reference(&mut self) {
        let mut code = self.character_reference_code;
        if code == 0 {
            // "If the number is 0x00, then this is a null-character-reference parse
            // error. Set the character reference code to 0xFFFD."
            self.character_reference_error(ParseErrorCode::NullCharacterReference);
            code = 0xFFFD;
        } else if code > 0x10_FFFF {
            // "If the number is greater than 0x10FFFF, then this is a
            // character-reference-outside-unicode-range parse error."
            self.character_reference_error(ParseErrorCode::CharacterReferenceOutsideUnicodeRange);
            code = 0xFFFD;
        } else if (0xD800..=0xDFFF).contains(&code) {
            // "If the number is a surrogate, then this is a
            // surrogate-character-reference parse error."
            self.character_reference_error(ParseErrorCode::SurrogateCharacterReference);
            code = 0xFFFD;
        } else if is_noncharacter(code) {
            // "If the number is a noncharacter, then this is a
            // noncharacter-character-reference parse error."
            self.character_reference_error(ParseErrorCode::NoncharacterCharacterReference);
        } else if code == 0x0D
            || (is_control(code) && !matches!(code, 0x09 | 0x0A | 0x0C | 0x20))
        {
            // "If the number is 0x0D, or a control that's not ASCII whitespace, then
            // this is a control-character-reference parse error."
            self.character_reference_error(ParseErrorCode::ControlCharacterReference);
            if let Some(&(_, replacement)) = C1_REPLACEMENTS.iter().find(|(from, _)| *from == code)
            {
                code = replacement;
            }
        }

        self.temporary_buffer.clear();
        self.temporary_buffer
            .push(char::from_u32(code).unwrap_or('\u{FFFD}'));
        self.flush_code_points_consumed_as_character_reference();
    }
}
