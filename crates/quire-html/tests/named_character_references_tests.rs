//! Integration tests for named character reference lookup.

use quire_html::tokenizer::named_character_references::{
    LONGEST_NAME, NAMED_CHARACTER_REFERENCES, any_entity_has_prefix, longest_match, lookup_entity,
};

#[test]
fn test_lookup_common_entities() {
    assert_eq!(lookup_entity("amp;"), Some("&"));
    assert_eq!(lookup_entity("lt;"), Some("<"));
    assert_eq!(lookup_entity("quot;"), Some("\""));
    assert_eq!(lookup_entity("nbsp;"), Some("\u{00A0}"));
}

#[test]
fn test_lookup_multi_code_point_entity() {
    // Some references expand to two code points.
    assert_eq!(lookup_entity("NotEqualTilde;"), Some("\u{2242}\u{338}"));
}

#[test]
fn test_legacy_entities_without_semicolon() {
    assert_eq!(lookup_entity("amp"), Some("&"));
    assert_eq!(lookup_entity("copy"), Some("\u{A9}"));
    // Only the legacy set has a semicolon-free form.
    assert_eq!(lookup_entity("hellip"), None);
}

#[test]
fn test_prefix_matching() {
    assert!(any_entity_has_prefix("am"));
    assert!(any_entity_has_prefix("amp;"));
    assert!(!any_entity_has_prefix("ampx"));
    assert!(!any_entity_has_prefix("xyz"));
}

#[test]
fn test_longest_match_is_bounded() {
    assert!(
        NAMED_CHARACTER_REFERENCES
            .iter()
            .all(|(name, _)| name.len() <= LONGEST_NAME)
    );
    assert_eq!(longest_match("hellip;..."), Some(("hellip;", "\u{2026}")));
    assert_eq!(longest_match(""), None);
}
