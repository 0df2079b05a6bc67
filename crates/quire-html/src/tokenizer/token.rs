use std::fmt;

use quire_dom::Span;
use strum_macros::{Display, IntoStaticStr};

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// An attribute on a start or end tag token.
///
/// Per [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
/// "a list of attributes, each of which has a name and a value"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// "each of which has a name"
    pub name: String,
    /// "and a value"
    pub value: String,
    /// From the first byte of the name to the end of the value (closing
    /// quote included).
    pub span: Span,
}

impl Attribute {
    /// Create a new attribute with the given name and value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            span: Span::default(),
        }
    }
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "The output of the tokenization step is a series of zero or more of the following
/// tokens: DOCTYPE, start tag, end tag, comment, character, end-of-file."
///
/// Adjacent character tokens are merged: one `Character` token carries a
/// whole run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// "DOCTYPE tokens have a name, a public identifier, a system identifier,
    /// and a force-quirks flag. When a DOCTYPE token is created, its name,
    /// public identifier, and system identifier must be marked as missing
    /// (which is a distinct state from the empty string), and the force-quirks
    /// flag must be set to off (its other state is on)."
    Doctype {
        /// "a name"
        name: Option<String>,
        /// "a public identifier"
        public_identifier: Option<String>,
        /// "a system identifier"
        system_identifier: Option<String>,
        /// "a force-quirks flag"
        force_quirks: bool,
    },

    /// "Start and end tag tokens have a tag name, a self-closing flag, and a
    /// list of attributes, each of which has a name and a value."
    StartTag {
        /// "a tag name"
        name: String,
        /// "a self-closing flag"
        self_closing: bool,
        /// "a list of attributes"
        attributes: Vec<Attribute>,
    },

    /// End tag token. Attributes are parsed (and reported) but never used.
    EndTag {
        /// "a tag name"
        name: String,
        /// "a self-closing flag"
        self_closing: bool,
        /// "a list of attributes"
        attributes: Vec<Attribute>,
    },

    /// "Comment and character tokens have data."
    Comment {
        /// "data"
        data: String,
    },

    /// A run of character data.
    Character {
        /// "data"
        data: String,
    },

    /// End-of-file token signals the end of input.
    EndOfFile,
}

/// Variant names used in traces and fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum TokenKind {
    /// [`Token::Doctype`]
    Doctype,
    /// [`Token::StartTag`]
    StartTag,
    /// [`Token::EndTag`]
    EndTag,
    /// [`Token::Comment`]
    Comment,
    /// [`Token::Character`]
    Character,
    /// [`Token::EndOfFile`]
    EndOfFile,
}

impl Token {
    /// "When a DOCTYPE token is created, its name, public identifier, and system
    /// identifier must be marked as missing (which is a distinct state from the
    /// empty string), and the force-quirks flag must be set to off."
    #[must_use]
    pub const fn new_doctype() -> Self {
        Self::Doctype {
            name: None,
            public_identifier: None,
            system_identifier: None,
            force_quirks: false,
        }
    }

    /// "When a start or end tag token is created, its self-closing flag must be
    /// unset (its other state is that it be set), and its attributes list must
    /// be empty."
    #[must_use]
    pub const fn new_start_tag() -> Self {
        Self::StartTag {
            name: String::new(),
            self_closing: false,
            attributes: Vec::new(),
        }
    }

    /// Create a new end tag token per spec.
    #[must_use]
    pub const fn new_end_tag() -> Self {
        Self::EndTag {
            name: String::new(),
            self_closing: false,
            attributes: Vec::new(),
        }
    }

    /// Create a new comment token with the given data.
    #[must_use]
    pub fn new_comment(data: impl Into<String>) -> Self {
        Self::Comment { data: data.into() }
    }

    /// Create a character token.
    #[must_use]
    pub fn new_character(data: impl Into<String>) -> Self {
        Self::Character { data: data.into() }
    }

    /// The variant of this token.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        match self {
            Self::Doctype { .. } => TokenKind::Doctype,
            Self::StartTag { .. } => TokenKind::StartTag,
            Self::EndTag { .. } => TokenKind::EndTag,
            Self::Comment { .. } => TokenKind::Comment,
            Self::Character { .. } => TokenKind::Character,
            Self::EndOfFile => TokenKind::EndOfFile,
        }
    }

    /// Tag name for start and end tags.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Self::StartTag { name, .. } | Self::EndTag { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns true if this is an end-of-file token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::EndOfFile)
    }

    /// [§ 13.2.5.55 DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-name-state)
    ///
    /// "Append the current input character to the current DOCTYPE token's name."
    pub(crate) fn append_to_doctype_name(&mut self, c: char) {
        if let Self::Doctype { name, .. } = self {
            name.get_or_insert_with(String::new).push(c);
        }
    }

    /// "Set the current DOCTYPE token's public identifier to the empty string (not missing)"
    pub(crate) fn begin_public_identifier(&mut self) {
        if let Self::Doctype {
            public_identifier, ..
        } = self
        {
            *public_identifier = Some(String::new());
        }
    }

    /// "Set the current DOCTYPE token's system identifier to the empty string (not missing)"
    pub(crate) fn begin_system_identifier(&mut self) {
        if let Self::Doctype {
            system_identifier, ..
        } = self
        {
            *system_identifier = Some(String::new());
        }
    }

    /// "Append the current input character to the current DOCTYPE token's public identifier."
    pub(crate) fn append_to_public_identifier(&mut self, c: char) {
        if let Self::Doctype {
            public_identifier: Some(id),
            ..
        } = self
        {
            id.push(c);
        }
    }

    /// "Append the current input character to the current DOCTYPE token's system identifier."
    pub(crate) fn append_to_system_identifier(&mut self, c: char) {
        if let Self::Doctype {
            system_identifier: Some(id),
            ..
        } = self
        {
            id.push(c);
        }
    }

    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    ///
    /// "Append the current input character to the current tag token's tag name."
    pub(crate) fn append_to_tag_name(&mut self, c: char) {
        if let Self::StartTag { name, .. } | Self::EndTag { name, .. } = self {
            name.push(c);
        }
    }

    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    ///
    /// "Set the self-closing flag of the current tag token."
    pub(crate) fn set_self_closing(&mut self) {
        if let Self::StartTag { self_closing, .. } | Self::EndTag { self_closing, .. } = self {
            *self_closing = true;
        }
    }

    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    ///
    /// "Append the current input character to the comment token's data."
    pub(crate) fn append_to_comment(&mut self, s: &str) {
        if let Self::Comment { data } = self {
            data.push_str(s);
        }
    }

    /// [§ 13.2.5.54 Before DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-name-state)
    ///
    /// "Set the current DOCTYPE token's force-quirks flag to on."
    pub(crate) fn set_force_quirks(&mut self) {
        if let Self::Doctype { force_quirks, .. } = self {
            *force_quirks = true;
        }
    }

    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    ///
    /// "Start a new attribute in the current tag token."
    pub(crate) fn start_new_attribute(&mut self, start: usize) {
        if let Self::StartTag { attributes, .. } | Self::EndTag { attributes, .. } = self {
            attributes.push(Attribute {
                name: String::new(),
                value: String::new(),
                span: Span::new(start, start),
            });
        }
    }

    pub(crate) fn current_attribute_mut(&mut self) -> Option<&mut Attribute> {
        match self {
            Self::StartTag { attributes, .. } | Self::EndTag { attributes, .. } => {
                attributes.last_mut()
            }
            _ => None,
        }
    }

    pub(crate) fn attributes_mut(&mut self) -> Option<&mut Vec<Attribute>> {
        match self {
            Self::StartTag { attributes, .. } | Self::EndTag { attributes, .. } => {
                Some(attributes)
            }
            _ => None,
        }
    }

    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    ///
    /// "When the user agent leaves the attribute name state (and before emitting the
    /// tag token, if appropriate), the complete attribute's name must be compared to
    /// the other attributes on the same token; if there is already an attribute on
    /// the token with the exact same name, then this is a duplicate-attribute parse
    /// error."
    ///
    /// Returns the index of the earlier attribute with the current name.
    #[must_use]
    pub(crate) fn earlier_attribute_with_current_name(&self) -> Option<usize> {
        match self {
            Self::StartTag { attributes, .. } | Self::EndTag { attributes, .. } => {
                let (current, earlier) = attributes.split_last()?;
                earlier.iter().position(|attr| attr.name == current.name)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doctype {
                name,
                public_identifier,
                system_identifier,
                force_quirks,
            } => {
                write!(f, "DOCTYPE")?;
                if let Some(n) = name {
                    write!(f, " {n}")?;
                }
                if let Some(pub_id) = public_identifier {
                    write!(f, " PUBLIC \"{pub_id}\"")?;
                }
                if let Some(sys_id) = system_identifier {
                    write!(f, " SYSTEM \"{sys_id}\"")?;
                }
                if *force_quirks {
                    write!(f, " (force-quirks)")?;
                }
                Ok(())
            }
            Self::StartTag {
                name,
                self_closing,
                attributes,
            } => {
                write!(f, "<{name}")?;
                for attr in attributes {
                    write!(f, " {}=\"{}\"", attr.name, attr.value)?;
                }
                if *self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Self::EndTag { name, .. } => write!(f, "</{name}>"),
            Self::Comment { data } => write!(f, "<!--{data}-->"),
            Self::Character { data } => write!(f, "Character({})", data.escape_debug()),
            Self::EndOfFile => write!(f, "EOF"),
        }
    }
}

/// A token together with the source range it was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedToken {
    /// The token.
    pub token: Token,
    /// Source range consumed for the token. For character runs this covers
    /// the markup the text came from (character references included).
    pub span: Span,
}

/// Where the decoded text of a character token sits in the source.
///
/// Character references and CRLF normalization make decoded text and
/// source drift apart. Each anchor pairs a decoded byte offset with the
/// source offset it came from; between anchors the text is a verbatim copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextOffsets {
    anchors: Vec<(usize, usize)>,
}

impl TextOffsets {
    /// Record that decoded offset `decoded` came from source offset `source`.
    ///
    /// Anchors the previous anchor already implies are not stored.
    pub(super) fn push(&mut self, decoded: usize, source: usize) {
        if let Some(&(last_decoded, last_source)) = self.anchors.last()
            && decoded.checked_sub(last_decoded) == source.checked_sub(last_source)
        {
            return;
        }
        self.anchors.push((decoded, source));
    }

    /// Drop anchors at or beyond `decoded` (text truncated there).
    pub(super) fn truncate(&mut self, decoded: usize) {
        let keep = self.anchors.partition_point(|&(d, _)| d < decoded);
        self.anchors.truncate(keep);
    }

    /// Source offset of the decoded byte at `decoded`.
    #[must_use]
    pub fn source_offset(&self, decoded: usize) -> Option<usize> {
        let index = self
            .anchors
            .partition_point(|&(d, _)| d <= decoded)
            .checked_sub(1)?;
        let (anchor_decoded, anchor_source) = *self.anchors.get(index)?;
        let offset = anchor_source + (decoded - anchor_decoded);
        match self.anchors.get(index + 1) {
            Some(&(_, next_source)) if offset > next_source => None,
            _ => Some(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_verbatim_text() {
        let mut offsets = TextOffsets::default();
        for i in 0..4 {
            offsets.push(i, 10 + i);
        }
        assert_eq!(offsets.anchors.len(), 1);
        assert_eq!(offsets.source_offset(3), Some(13));
    }

    #[test]
    fn test_offsets_skip_character_reference() {
        // "a&amp;b": 'a' at 0, '&' from "&amp;" at 1, 'b' at 6.
        let mut offsets = TextOffsets::default();
        offsets.push(0, 0);
        offsets.push(1, 1);
        offsets.push(2, 6);
        assert_eq!(offsets.source_offset(1), Some(1));
        assert_eq!(offsets.source_offset(2), Some(6));
        offsets.truncate(2);
        assert_eq!(offsets.source_offset(2), Some(2));
    }
}
