//! HTML tokenizer module.
//!
//! Implements [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//! of the WHATWG HTML Living Standard.

/// Character reference parsing per § 13.2.5.72.
mod character_reference;
/// HTML tokenizer state machine implementation.
pub mod core;
/// Helper methods for tokenizer state transitions.
mod helpers;
/// Named character reference lookup table per § 13.5.
pub mod named_character_references;
/// Data, RCDATA, RAWTEXT, PLAINTEXT and script data states.
mod text_states;
/// Tag and attribute states.
mod tag_states;
/// Comment, DOCTYPE and CDATA states.
mod markup_states;
/// Token types produced by the tokenizer.
pub mod token;

use serde::{Deserialize, Serialize};

pub use self::core::{HTMLTokenizer, TokenizerState};
pub use token::{Attribute, EmittedToken, TextOffsets, Token, TokenKind};

/// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
///
/// What to do with an attribute whose name repeats one already on the tag.
/// Both policies report a `duplicate-attribute` parse error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateAttributes {
    /// The later attribute replaces the earlier one.
    #[default]
    LastWins,
    /// "the attribute must be removed from the token", keeping the first.
    KeepFirst,
}

/// Soft limits: exceeding them drops content and records a parse error
/// instead of failing the parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenizerLimits {
    /// Largest tag, comment or DOCTYPE token (in source bytes) that is kept.
    pub max_token_bytes: Option<usize>,
    /// Total character data emitted; text past the limit is discarded.
    pub max_text_bytes: Option<usize>,
}

/// Knobs for a standalone or parser-driven tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// State to start in. Fragment parsing and fixtures use RCDATA etc.
    pub initial_state: TokenizerState,
    /// Seed for the "appropriate end tag" check.
    pub last_start_tag: Option<String>,
    /// Coerce output to what an XML serializer could represent
    /// (form feeds, noncharacters, `--` in comments).
    pub xml_violation_mode: bool,
    /// Soft size limits.
    pub limits: TokenizerLimits,
    /// Duplicate attribute policy.
    pub duplicate_attributes: DuplicateAttributes,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            initial_state: TokenizerState::Data,
            last_start_tag: None,
            xml_violation_mode: false,
            limits: TokenizerLimits::default(),
            duplicate_attributes: DuplicateAttributes::default(),
        }
    }
}
