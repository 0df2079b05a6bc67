//! Encoding sniffing and decoding.
//!
//! [§ 13.2.3 Determining the character encoding](https://html.spec.whatwg.org/multipage/parsing.html#determining-the-character-encoding)
//!
//! Precedence: byte order mark, then the transport label, then a bounded
//! `<meta>` prescan, then the configured default (`windows-1252` unless
//! set). Labels are resolved through the Encoding Standard's label table
//! (`encoding_rs`); a label that does not resolve falls through to the
//! next tier.

use std::borrow::Cow;

use encoding_rs::{Encoding, REPLACEMENT, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252, X_USER_DEFINED};
use quire_common::Warnings;
use strum_macros::{Display, IntoStaticStr};

use crate::options::{DEFAULT_PRESCAN_BYTES, ParseOptions};

/// Which precedence tier decided the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum EncodingSource {
    /// A UTF-8 or UTF-16 byte order mark.
    Bom,
    /// The caller-supplied transport label.
    Transport,
    /// A `<meta charset>` or `<meta http-equiv=content-type>` declaration.
    Meta,
    /// The configured default.
    Default,
}

/// Inputs to [`sniff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffOptions<'a> {
    /// Label from the transport layer.
    pub transport_label: Option<&'a str>,
    /// Label used when nothing else decides.
    pub default_label: Option<&'a str>,
    /// How many leading bytes the `<meta>` prescan examines.
    pub max_prescan_bytes: usize,
}

impl Default for SniffOptions<'_> {
    fn default() -> Self {
        Self {
            transport_label: None,
            default_label: None,
            max_prescan_bytes: DEFAULT_PRESCAN_BYTES,
        }
    }
}

impl<'a> From<&'a ParseOptions> for SniffOptions<'a> {
    fn from(options: &'a ParseOptions) -> Self {
        Self {
            transport_label: options.transport_encoding_label.as_deref(),
            default_label: options.default_encoding_label.as_deref(),
            max_prescan_bytes: options.max_prescan_bytes,
        }
    }
}

/// The outcome of [`sniff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sniffed {
    /// The resolved encoding.
    pub encoding: &'static Encoding,
    /// The tier that decided it.
    pub source: EncodingSource,
    /// Length of the byte order mark to skip (0 without one).
    pub bom_length: usize,
}

impl Sniffed {
    /// Canonical name of the encoding, lowercased (`utf-8`, `windows-1252`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        canonical_name(self.encoding)
    }

    /// Decode `bytes` (the whole input, BOM included) with this result.
    #[must_use]
    pub fn decode<'b>(&self, bytes: &'b [u8]) -> Cow<'b, str> {
        let body = bytes.get(self.bom_length..).unwrap_or_default();
        let (text, _had_errors) = self.encoding.decode_without_bom_handling(body);
        text
    }
}

/// Lowercase canonical name used in traces and results.
#[must_use]
pub fn canonical_name(encoding: &'static Encoding) -> &'static str {
    match encoding.name() {
        "UTF-8" => "utf-8",
        "UTF-16BE" => "utf-16be",
        "UTF-16LE" => "utf-16le",
        "Shift_JIS" => "shift_jis",
        "EUC-JP" => "euc-jp",
        "EUC-KR" => "euc-kr",
        "ISO-2022-JP" => "iso-2022-jp",
        "Big5" => "big5",
        "GBK" => "gbk",
        "gb18030" => "gb18030",
        "KOI8-R" => "koi8-r",
        "KOI8-U" => "koi8-u",
        "IBM866" => "ibm866",
        "macintosh" => "macintosh",
        "x-mac-cyrillic" => "x-mac-cyrillic",
        "x-user-defined" => "x-user-defined",
        name if name.starts_with("ISO-8859-") => iso_8859_name(name),
        // windows-125x names are already lowercase.
        name => name,
    }
}

fn iso_8859_name(name: &'static str) -> &'static str {
    const NAMES: &[&str] = &[
        "iso-8859-2", "iso-8859-3", "iso-8859-4", "iso-8859-5", "iso-8859-6", "iso-8859-7",
        "iso-8859-8", "iso-8859-8-i", "iso-8859-10", "iso-8859-13", "iso-8859-14",
        "iso-8859-15", "iso-8859-16",
    ];
    NAMES
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
        .copied()
        .unwrap_or(name)
}

/// Resolve a label to a supported encoding.
///
/// Matching is ASCII case-insensitive and ignores surrounding whitespace.
/// `iso-8859-1`, `latin1` and `us-ascii` resolve to `windows-1252`. A
/// UTF-16 label resolves to UTF-8: a document that names UTF-16 from
/// inside itself (or through a label applied to bytes that were not
/// UTF-16 BOM-marked) cannot be describing itself accurately. Labels that
/// map to the `replacement` encoding are treated as unknown.
#[must_use]
pub fn canonicalize_label(label: &str) -> Option<&'static Encoding> {
    let encoding = Encoding::for_label(label.trim().as_bytes())?;
    if encoding == REPLACEMENT {
        return None;
    }
    if encoding == UTF_16BE || encoding == UTF_16LE {
        return Some(UTF_8);
    }
    Some(encoding)
}

/// Determine the encoding of `bytes`.
///
/// Never fails: every path ends at the default tier.
pub fn sniff(bytes: &[u8], options: SniffOptions<'_>, warnings: &mut Warnings) -> Sniffed {
    // STEP 1: BOM sniffing.
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        return Sniffed {
            encoding,
            source: EncodingSource::Bom,
            bom_length,
        };
    }

    // STEP 2: transport layer.
    if let Some(label) = options.transport_label {
        if let Some(encoding) = canonicalize_label(label) {
            return resolved(encoding, EncodingSource::Transport);
        }
        warnings.warn_once("encoding", &format!("ignoring unknown transport label {label:?}"));
    }

    // STEP 3: prescan.
    let limit = bytes.len().min(options.max_prescan_bytes);
    if let Some(encoding) = prescan(&bytes[..limit]) {
        return resolved(encoding, EncodingSource::Meta);
    }

    // STEP 4: default.
    let fallback = options.default_label.and_then(|label| {
        let encoding = canonicalize_label(label);
        if encoding.is_none() {
            warnings.warn_once("encoding", &format!("ignoring unknown default label {label:?}"));
        }
        encoding
    });
    resolved(fallback.unwrap_or(WINDOWS_1252), EncodingSource::Default)
}

const fn resolved(encoding: &'static Encoding, source: EncodingSource) -> Sniffed {
    Sniffed {
        encoding,
        source,
        bom_length: 0,
    }
}

/// [§ 13.2.3.2 Prescan a byte stream to determine its encoding](https://html.spec.whatwg.org/multipage/parsing.html#prescan-a-byte-stream-to-determine-its-encoding)
///
/// Bytes are read as Latin-1, so nothing has to be decoded before the
/// encoding is known.
#[must_use]
pub fn prescan(bytes: &[u8]) -> Option<&'static Encoding> {
    let mut position = 0;
    while position < bytes.len() {
        let rest = &bytes[position..];
        // "A sequence of bytes starting with: 0x3C 0x21 0x2D 0x2D (`<!--`)"
        // "Advance the position pointer so that it points at the first 0x3E
        // byte which is preceded by two 0x2D bytes"
        if rest.starts_with(b"<!--") {
            position = find(bytes, position + 2, b"-->").map_or(bytes.len(), |end| end + 3);
            continue;
        }
        // "A sequence of bytes starting with: 0x3C, 0x4D or 0x6D, 0x45 or
        // 0x65, 0x54 or 0x74, 0x41 or 0x61, and one of 0x09, 0x0A, 0x0C,
        // 0x0D, 0x20, 0x2F (case-insensitive ASCII '<meta' followed by a
        // space or slash)"
        if rest.len() > 5
            && rest[..5].eq_ignore_ascii_case(b"<meta")
            && (is_space(rest[5]) || rest[5] == b'/')
        {
            position += 5;
            if let Some(encoding) = meta_declaration(bytes, &mut position) {
                return Some(encoding);
            }
            continue;
        }
        // "A sequence of bytes starting with a 0x3C byte (<), optionally a
        // 0x2F byte (/), and finally a byte in the range 0x41-0x5A or
        // 0x61-0x7A (A-Z or a-z)"
        let tag_start = match rest {
            [b'<', b'/', letter, ..] | [b'<', letter, ..] if letter.is_ascii_alphabetic() => true,
            _ => false,
        };
        if tag_start {
            // "Advance the position pointer so that it points at the next
            // 0x09, 0x0A, 0x0C, 0x0D, 0x20, or 0x3E byte."
            while position < bytes.len() && !is_space(bytes[position]) && bytes[position] != b'>' {
                position += 1;
            }
            // "Repeatedly get an attribute until no further attributes can
            // be found, then jump to the step below labeled next byte."
            while get_attribute(bytes, &mut position).is_some() {}
            position += 1;
            continue;
        }
        // "A sequence of bytes starting with: 0x3C 0x21 (`<!`), 0x3C 0x2F
        // (`</`), 0x3C 0x3F (`<?`)"
        if rest.starts_with(b"<!") || rest.starts_with(b"</") || rest.starts_with(b"<?") {
            position = find(bytes, position, b">").map_or(bytes.len(), |end| end + 1);
            continue;
        }
        position += 1;
    }
    None
}

/// The attribute loop of the `<meta` branch of the prescan.
fn meta_declaration(bytes: &[u8], position: &mut usize) -> Option<&'static Encoding> {
    // STEP 2-5: "Let attribute list be an empty list of strings. Let got
    //           pragma be false. Let need pragma be null. Let charset be
    //           the null value."
    let mut attribute_list: Vec<String> = Vec::new();
    let mut got_pragma = false;
    let mut need_pragma: Option<bool> = None;
    let mut charset: Option<&'static Encoding> = None;

    // STEP 6: "Attributes: Get an attribute and its value. If no attribute
    //          was sniffed, then jump to the processing step below."
    while let Some((name, value)) = get_attribute(bytes, position) {
        // STEP 7: "If the attribute's name is already in attribute list,
        //          then return to the step labeled attributes."
        if attribute_list.contains(&name) {
            continue;
        }
        attribute_list.push(name.clone());
        match name.as_str() {
            "http-equiv" => {
                if value == "content-type" {
                    got_pragma = true;
                }
            }
            "content" => {
                if charset.is_none()
                    && let Some(label) = extract_charset_from_meta(&value)
                    && let Some(encoding) = Encoding::for_label(label.as_bytes())
                {
                    charset = Some(encoding);
                    need_pragma = Some(true);
                }
            }
            "charset" => {
                if charset.is_none()
                    && let Some(encoding) = Encoding::for_label(value.trim().as_bytes())
                {
                    charset = Some(encoding);
                    need_pragma = Some(false);
                }
            }
            _ => {}
        }
    }

    // STEP 11-13: processing.
    let need_pragma = need_pragma?;
    if need_pragma && !got_pragma {
        return None;
    }
    let charset = charset?;
    // STEP 14: "If charset is UTF-16BE/LE, then set charset to UTF-8."
    if charset == UTF_16BE || charset == UTF_16LE {
        return Some(UTF_8);
    }
    // STEP 15: "If charset is x-user-defined, then set charset to windows-1252."
    if charset == X_USER_DEFINED {
        return Some(WINDOWS_1252);
    }
    if charset == REPLACEMENT {
        return None;
    }
    Some(charset)
}

/// [§ 13.2.3.2 Get an attribute](https://html.spec.whatwg.org/multipage/parsing.html#concept-get-attributes-when-sniffing)
///
/// Names and values are ASCII-lowercased; other bytes map to the Latin-1
/// code point of the same value.
fn get_attribute(bytes: &[u8], position: &mut usize) -> Option<(String, String)> {
    let at = |index: usize| bytes.get(index).copied();

    // STEP 1: "If the byte at position is one of 0x09, 0x0A, 0x0C, 0x0D,
    //          0x20, or 0x2F then advance position to the next byte and
    //          redo this step."
    while at(*position).is_some_and(|b| is_space(b) || b == b'/') {
        *position += 1;
    }
    // STEP 2: "If the byte at position is 0x3E (>), then abort the get an
    //          attribute algorithm. There isn't one."
    let first = at(*position)?;
    if first == b'>' {
        return None;
    }

    let mut name = String::new();
    let mut value = String::new();

    // STEP 4-5: attribute name.
    loop {
        let Some(b) = at(*position) else {
            return None;
        };
        if b == b'=' && !name.is_empty() {
            *position += 1;
            break;
        }
        if is_space(b) {
            // STEP 6: "Spaces: If the byte at position is one of 0x09, 0x0A,
            //          0x0C, 0x0D, or 0x20 then advance position to the next
            //          byte, then, repeat this step."
            while at(*position).is_some_and(is_space) {
                *position += 1;
            }
            // STEP 7: "If the byte at position is not 0x3D (=), abort the get
            //          an attribute algorithm. The attribute's name is the
            //          value of attribute name, its value is the empty string."
            if at(*position) != Some(b'=') {
                return Some((name, value));
            }
            *position += 1;
            break;
        }
        if b == b'/' || b == b'>' {
            return Some((name, value));
        }
        name.push(latin1_lower(b));
        *position += 1;
    }

    // STEP 9: "Advance position to the next byte" past whitespace.
    while at(*position).is_some_and(is_space) {
        *position += 1;
    }

    // STEP 10: attribute value.
    let first = at(*position)?;
    if first == b'"' || first == b'\'' {
        // "Process b as follows: If b is quote ... advance position to the
        // next byte and abort the 'get an attribute' algorithm."
        *position += 1;
        loop {
            let b = at(*position)?;
            *position += 1;
            if b == first {
                return Some((name, value));
            }
            value.push(latin1_lower(b));
        }
    }
    if first == b'>' {
        return Some((name, value));
    }
    value.push(latin1_lower(first));
    *position += 1;
    // STEP 11: "Process the byte at position as follows: If it is 0x09,
    //           0x0A, 0x0C, 0x0D, 0x20, or 0x3E then abort"
    while let Some(b) = at(*position) {
        if is_space(b) || b == b'>' {
            break;
        }
        value.push(latin1_lower(b));
        *position += 1;
    }
    Some((name, value))
}

/// [§ 2.6.3 Extracting character encodings from meta elements](https://html.spec.whatwg.org/multipage/urls-and-fetching.html#algorithm-for-extracting-a-character-encoding-from-a-meta-element)
///
/// Expects an already lowercased string.
#[must_use]
pub fn extract_charset_from_meta(content: &str) -> Option<String> {
    let bytes = content.as_bytes();
    let mut position = 0;
    loop {
        // STEP 2: "Loop: Find the first seven characters in s after position
        //          that are an ASCII case-insensitive match for the word
        //          "charset". If no such match is found, return nothing."
        let found = find_ignore_case(bytes, position, b"charset")?;
        position = found + 7;
        // STEP 3: "Skip any ASCII whitespace that immediately follow the
        //          word "charset""
        while bytes.get(position).copied().is_some_and(is_space) {
            position += 1;
        }
        // STEP 4: "If the next character is not a U+003D EQUALS SIGN (=),
        //          then move position to point just before that next
        //          character, and jump back to the step labeled loop."
        if bytes.get(position) == Some(&b'=') {
            position += 1;
            break;
        }
    }
    // STEP 5: "Skip any ASCII whitespace that immediately follow the equals sign."
    while bytes.get(position).copied().is_some_and(is_space) {
        position += 1;
    }
    // STEP 6: "Process the next character as follows:"
    match bytes.get(position).copied() {
        Some(quote @ (b'"' | b'\'')) => {
            // "If it is a U+0022 QUOTATION MARK character (") and there is a
            // later U+0022 QUOTATION MARK character (") in s ... return the
            // result of getting an encoding from the substring that is
            // between this character and the next earliest occurrence of
            // this character."
            let start = position + 1;
            let end = find(bytes, start, &[quote])?;
            Some(content[start..end].to_string())
        }
        None => None,
        Some(_) => {
            // "Otherwise: Return the result of getting an encoding from the
            // substring that consists of this character up to but not
            // including the first ASCII whitespace or U+003B SEMICOLON
            // character (;), or the end of s, whichever comes first."
            let end = bytes[position..]
                .iter()
                .position(|&b| is_space(b) || b == b';')
                .map_or(bytes.len(), |offset| position + offset);
            Some(content[position..end].to_string())
        }
    }
}

const fn is_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn latin1_lower(b: u8) -> char {
    char::from(b.to_ascii_lowercase())
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_ignore_case(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sniff_default(bytes: &[u8]) -> Sniffed {
        sniff(bytes, SniffOptions::default(), &mut Warnings::new())
    }

    #[test]
    fn test_bom_wins_over_everything() {
        let options = SniffOptions {
            transport_label: Some("windows-1251"),
            ..SniffOptions::default()
        };
        let sniffed = sniff(b"\xEF\xBB\xBF<meta charset=koi8-r>", options, &mut Warnings::new());
        assert_eq!(sniffed.name(), "utf-8");
        assert_eq!(sniffed.source, EncodingSource::Bom);
        assert_eq!(sniffed.bom_length, 3);

        let sniffed = sniff_default(b"\xFF\xFEa\x00");
        assert_eq!(sniffed.name(), "utf-16le");
        assert_eq!(sniffed.decode(b"\xFF\xFEa\x00"), "a");
    }

    #[test]
    fn test_label_aliases() {
        assert_eq!(canonicalize_label("ISO-8859-1"), Some(WINDOWS_1252));
        assert_eq!(canonicalize_label(" latin1 "), Some(WINDOWS_1252));
        assert_eq!(canonicalize_label("us-ascii"), Some(WINDOWS_1252));
        assert_eq!(canonicalize_label("utf-16"), Some(UTF_8));
        assert_eq!(canonicalize_label("x-no-such-thing"), None);
    }

    #[test]
    fn test_unknown_transport_falls_through() {
        let options = SniffOptions {
            transport_label: Some("bogus"),
            ..SniffOptions::default()
        };
        let mut warnings = Warnings::new();
        let sniffed = sniff(b"<meta charset=utf-8>", options, &mut warnings);
        assert_eq!(sniffed.source, EncodingSource::Meta);
        assert_eq!(sniffed.name(), "utf-8");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unknown_label_warns_once_per_call() {
        let options = SniffOptions {
            transport_label: Some("bogus"),
            default_label: Some("also-bogus"),
            ..SniffOptions::default()
        };
        let mut warnings = Warnings::new();
        assert!(warnings.is_empty());
        for _ in 0..3 {
            let sniffed = sniff(b"<p>", options, &mut warnings);
            assert_eq!(sniffed.source, EncodingSource::Default);
            assert_eq!(sniffed.name(), "windows-1252");
        }
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_meta_charset() {
        assert_eq!(prescan(b"<!doctype html><META CHARSET='KOI8-R'>"), Encoding::for_label(b"koi8-r"));
        assert_eq!(prescan(b"<meta charset=\"utf-16\">"), Some(UTF_8));
        assert_eq!(prescan(b"<meta charset=x-user-defined>"), Some(WINDOWS_1252));
    }

    #[test]
    fn test_meta_http_equiv_needs_pragma() {
        let declared = b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=iso-8859-2\">";
        assert_eq!(prescan(declared), Encoding::for_label(b"iso-8859-2"));
        let missing_pragma = b"<meta content=\"text/html; charset=iso-8859-2\">";
        assert_eq!(prescan(missing_pragma), None);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(prescan(b"<!-- <meta charset=koi8-r> --><p>"), None);
        assert_eq!(prescan(b"<!----><meta charset=utf-8>"), Some(UTF_8));
    }

    #[test]
    fn test_prescan_limit() {
        let mut bytes = vec![b' '; 64];
        bytes.extend_from_slice(b"<meta charset=utf-8>");
        let options = SniffOptions {
            max_prescan_bytes: 32,
            ..SniffOptions::default()
        };
        let sniffed = sniff(&bytes, options, &mut Warnings::new());
        assert_eq!(sniffed.source, EncodingSource::Default);
        assert_eq!(sniffed.name(), "windows-1252");
    }

    #[test]
    fn test_extract_charset() {
        assert_eq!(extract_charset_from_meta("text/html; charset=utf-8").as_deref(), Some("utf-8"));
        assert_eq!(extract_charset_from_meta("charset = \"big5\"").as_deref(), Some("big5"));
        assert_eq!(extract_charset_from_meta("charset=\"unterminated"), None);
        assert_eq!(extract_charset_from_meta("text/html"), None);
    }

    #[test]
    fn test_decode_is_total() {
        let sniffed = resolved(UTF_8, EncodingSource::Default);
        assert_eq!(sniffed.decode(b"a\xFFb"), "a\u{FFFD}b");
        let sniffed = resolved(WINDOWS_1252, EncodingSource::Default);
        assert_eq!(sniffed.decode(b"\x80"), "\u{20AC}");
    }
}
