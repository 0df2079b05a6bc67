//! Options accepted by the public operations.

use quire_common::Budgets;
use serde::{Deserialize, Serialize};

use crate::tokenizer::{DuplicateAttributes, TokenizerLimits, TokenizerOptions};

/// Options for [`crate::parse`], [`crate::parse_bytes`],
/// [`crate::parse_fragment`] and [`crate::parse_stream`].
///
/// Deserializes from camelCase JSON, so a config file such as
/// `{"captureSpans": true, "budgets": {"maxDepth": 64}}` maps directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Attach source spans to nodes and attributes.
    pub capture_spans: bool,
    /// Collect [`quire_common::TraceEvent`]s.
    pub trace: bool,
    /// Encoding label supplied by the transport layer (e.g. a
    /// `Content-Type` charset parameter).
    pub transport_encoding_label: Option<String>,
    /// Encoding used when nothing else decides; `windows-1252` when unset.
    pub default_encoding_label: Option<String>,
    /// How many leading bytes the `<meta>` prescan looks at.
    pub max_prescan_bytes: usize,
    /// Resource ceilings.
    pub budgets: Budgets,
    /// [§ 13.2.4.5 The scripting flag](https://html.spec.whatwg.org/multipage/parsing.html#scripting-flag)
    ///
    /// Only changes how `noscript` is parsed; no script is ever run.
    pub scripting: bool,
    /// Carry open formatting elements into an attribute-free `option` that
    /// directly follows an attribute-free `select`.
    pub select_option_compat: bool,
    /// What the tokenizer does with repeated attribute names.
    pub duplicate_attributes: DuplicateAttributes,
    /// Soft tokenizer ceilings that drop content instead of failing.
    pub tokenizer_limits: TokenizerLimits,
}

/// Default number of bytes examined by the `<meta>` prescan.
pub const DEFAULT_PRESCAN_BYTES: usize = 16 * 1024;

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            capture_spans: false,
            trace: false,
            transport_encoding_label: None,
            default_encoding_label: None,
            max_prescan_bytes: DEFAULT_PRESCAN_BYTES,
            budgets: Budgets::default(),
            scripting: false,
            select_option_compat: true,
            duplicate_attributes: DuplicateAttributes::default(),
            tokenizer_limits: TokenizerLimits::default(),
        }
    }
}

impl ParseOptions {
    /// Enable span capture.
    #[must_use]
    pub const fn with_spans(mut self) -> Self {
        self.capture_spans = true;
        self
    }

    /// Enable trace collection.
    #[must_use]
    pub const fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    /// Replace the budgets.
    #[must_use]
    pub const fn with_budgets(mut self, budgets: Budgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Set the transport encoding label.
    #[must_use]
    pub fn with_transport_encoding(mut self, label: impl Into<String>) -> Self {
        self.transport_encoding_label = Some(label.into());
        self
    }

    /// Set the scripting flag.
    #[must_use]
    pub const fn with_scripting(mut self, scripting: bool) -> Self {
        self.scripting = scripting;
        self
    }

    /// The tokenizer configuration a document parse starts with.
    pub(crate) fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions {
            limits: self.tokenizer_limits,
            duplicate_attributes: self.duplicate_attributes,
            ..TokenizerOptions::default()
        }
    }
}

/// Options for [`crate::serialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializeOptions {
    /// [§ 13.1.2.4 Optional tags](https://html.spec.whatwg.org/multipage/syntax.html#optional-tags)
    ///
    /// Leave out start and end tags the standard allows to be omitted.
    pub omit_optional_tags: bool,
    /// Preferred attribute quote, `"` or `'`. The other one is used when it
    /// avoids escaping.
    pub quote_char: char,
    /// Serialize `noscript` children as raw text.
    pub scripting: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            omit_optional_tags: false,
            quote_char: '"',
            scripting: false,
        }
    }
}

impl SerializeOptions {
    /// The fixture-accurate form: optional tags omitted.
    #[must_use]
    pub fn minimized() -> Self {
        Self {
            omit_optional_tags: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(!options.capture_spans);
        assert!(options.select_option_compat);
        assert_eq!(options.max_prescan_bytes, 16 * 1024);
        assert_eq!(options.budgets, Budgets::default());
    }

    #[test]
    fn test_options_from_camel_case_json() {
        let options: ParseOptions = serde_json::from_str(
            r#"{"captureSpans": true, "transportEncodingLabel": "latin1", "budgets": {"maxDepth": 64}}"#,
        )
        .unwrap();
        assert!(options.capture_spans);
        assert_eq!(options.transport_encoding_label.as_deref(), Some("latin1"));
        assert_eq!(options.budgets.max_depth, Some(64));
        assert!(options.select_option_compat);
    }
}
