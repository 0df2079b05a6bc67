//! Integration tests for the HTML tokenizer.

use quire_common::{BudgetKind, Budgets};
use quire_dom::Span;
use quire_html::tokenizer::{DuplicateAttributes, TokenizerLimits};
use quire_html::{
    ParseErrorCode, Token, TokenizeResult, TokenizerOptions, TokenizerState, tokenize,
    tokenize_with_budgets,
};

/// Tokenize with default options.
fn run(input: &str) -> TokenizeResult {
    tokenize(input, &TokenizerOptions::default()).unwrap()
}

/// Just the tokens.
fn tokens(input: &str) -> Vec<Token> {
    run(input).tokens.into_iter().map(|t| t.token).collect()
}

/// Error codes in order.
fn error_codes(input: &str) -> Vec<ParseErrorCode> {
    run(input).errors.iter().map(|e| e.code).collect()
}

fn text(data: &str) -> Token {
    Token::Character {
        data: data.to_string(),
    }
}

#[test]
fn test_plain_text_is_one_token() {
    assert_eq!(tokens("Hello"), vec![text("Hello"), Token::EndOfFile]);
}

#[test]
fn test_doctype() {
    let tokens = tokens("<!DOCTYPE html>");
    assert_eq!(tokens.len(), 2);
    match &tokens[0] {
        Token::Doctype {
            name, force_quirks, ..
        } => {
            assert_eq!(name.as_deref(), Some("html"));
            assert!(!force_quirks);
        }
        _ => panic!("Expected DOCTYPE token"),
    }
}

#[test]
fn test_doctype_identifiers() {
    let tokens = tokens(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#);
    match &tokens[0] {
        Token::Doctype {
            public_identifier,
            system_identifier,
            ..
        } => {
            assert_eq!(public_identifier.as_deref(), Some("-//W3C//DTD HTML 4.01//EN"));
            assert_eq!(
                system_identifier.as_deref(),
                Some("http://www.w3.org/TR/html4/strict.dtd")
            );
        }
        _ => panic!("Expected DOCTYPE token"),
    }
}

#[test]
fn test_start_and_end_tag() {
    let tokens = tokens("<DIV></div>");
    match &tokens[0] {
        Token::StartTag {
            name,
            self_closing,
            attributes,
        } => {
            assert_eq!(name, "div");
            assert!(!self_closing);
            assert!(attributes.is_empty());
        }
        _ => panic!("Expected StartTag token"),
    }
    assert!(matches!(&tokens[1], Token::EndTag { name, .. } if name == "div"));
}

#[test]
fn test_self_closing_tag() {
    let tokens = tokens("<br/>");
    assert!(matches!(
        &tokens[0],
        Token::StartTag { name, self_closing: true, .. } if name == "br"
    ));
}

#[test]
fn test_comment() {
    assert_eq!(
        tokens("<!-- hello -->"),
        vec![Token::new_comment(" hello "), Token::EndOfFile]
    );
}

#[test]
fn test_attribute_quoting_styles() {
    for input in [r#"<div class="foo">"#, "<div class='foo'>", "<div class=foo>"] {
        match &tokens(input)[0] {
            Token::StartTag { attributes, .. } => {
                assert_eq!(attributes.len(), 1, "{input}");
                assert_eq!(attributes[0].name, "class");
                assert_eq!(attributes[0].value, "foo");
            }
            _ => panic!("Expected StartTag token for {input}"),
        }
    }
}

#[test]
fn test_multiple_attributes() {
    match &tokens(r#"<input type="text" id="name" disabled>"#)[0] {
        Token::StartTag { attributes, .. } => {
            let names: Vec<&str> = attributes.iter().map(|a| a.name.as_str()).collect();
            assert_eq!(names, ["type", "id", "disabled"]);
            assert_eq!(attributes[2].value, "");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_duplicate_attribute_policies() {
    let input = "<p a=1 a=2>";
    let value = |policy| {
        let options = TokenizerOptions {
            duplicate_attributes: policy,
            ..TokenizerOptions::default()
        };
        let result = tokenize(input, &options).unwrap();
        assert_eq!(result.errors[0].code, ParseErrorCode::DuplicateAttribute);
        match &result.tokens[0].token {
            Token::StartTag { attributes, .. } => {
                assert_eq!(attributes.len(), 1);
                attributes[0].value.clone()
            }
            _ => panic!("Expected StartTag token"),
        }
    };
    assert_eq!(value(DuplicateAttributes::LastWins), "2");
    assert_eq!(value(DuplicateAttributes::KeepFirst), "1");
}

#[test]
fn test_token_spans() {
    let result = run("<p>Hi</p>");
    let spans: Vec<Span> = result.tokens.iter().map(|t| t.span).collect();
    assert_eq!(
        spans,
        vec![Span::new(0, 3), Span::new(3, 5), Span::new(5, 9), Span::new(9, 9)]
    );
}

#[test]
fn test_attribute_span_includes_quotes() {
    let source = r#"<a href="x">"#;
    match &run(source).tokens[0].token {
        Token::StartTag { attributes, .. } => {
            assert_eq!(attributes[0].span.slice(source), Some(r#"href="x""#));
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_newlines_are_normalized() {
    let result = run("a\r\nb\rc");
    assert_eq!(result.tokens[0].token, text("a\nb\nc"));
    assert_eq!(result.tokens[0].span, Span::new(0, 6));
}

#[test]
fn test_rawtext_keeps_markup() {
    let options = TokenizerOptions {
        initial_state: TokenizerState::RAWTEXT,
        last_start_tag: Some("style".to_string()),
        ..TokenizerOptions::default()
    };
    let result = tokenize("<div>a</notastyle></style>", &options).unwrap();
    let tokens: Vec<Token> = result.tokens.into_iter().map(|t| t.token).collect();
    assert_eq!(tokens[0], text("<div>a</notastyle>"));
    assert!(matches!(&tokens[1], Token::EndTag { name, .. } if name == "style"));
}

#[test]
fn test_rcdata_decodes_references() {
    let options = TokenizerOptions {
        initial_state: TokenizerState::RCDATA,
        last_start_tag: Some("title".to_string()),
        ..TokenizerOptions::default()
    };
    let result = tokenize("a &lt; b</title>", &options).unwrap();
    assert_eq!(result.tokens[0].token, text("a < b"));
}

#[test]
fn test_fixture_state_names() {
    assert_eq!(
        TokenizerState::from_fixture_name("RCDATA state"),
        Some(TokenizerState::RCDATA)
    );
    assert_eq!(
        TokenizerState::from_fixture_name("Script data state"),
        Some(TokenizerState::ScriptData)
    );
}

#[test]
fn test_character_reference_bare_ampersand() {
    assert_eq!(tokens("a & b")[0], text("a & b"));
    assert!(error_codes("a & b").is_empty());
}

#[test]
fn test_named_character_references() {
    assert_eq!(tokens("a &amp; b")[0], text("a & b"));
    assert_eq!(tokens("&lt;div&gt;")[0], text("<div>"));
}

#[test]
fn test_named_character_reference_without_semicolon() {
    assert_eq!(tokens("&amp is ok")[0], text("& is ok"));
    assert_eq!(
        error_codes("&amp is ok"),
        vec![ParseErrorCode::MissingSemicolonAfterCharacterReference]
    );
    // The longest legacy prefix wins.
    assert_eq!(tokens("&notreal;")[0], text("\u{AC}real;"));
}

#[test]
fn test_unknown_named_character_reference() {
    assert_eq!(tokens("&zzz;")[0], text("&zzz;"));
    assert_eq!(
        error_codes("&zzz;"),
        vec![ParseErrorCode::UnknownNamedCharacterReference]
    );
}

#[test]
fn test_character_reference_in_attribute() {
    match &tokens(r#"<a href="?a=1&amp;b=2&notc=3">"#)[0] {
        Token::StartTag { attributes, .. } => {
            // A legacy reference followed by an alphanumeric is left alone.
            assert_eq!(attributes[0].value, "?a=1&b=2&notc=3");
        }
        _ => panic!("Expected StartTag token"),
    }
}

#[test]
fn test_numeric_character_references() {
    assert_eq!(tokens("&#x41;&#66;")[0], text("AB"));
    assert_eq!(tokens("&#x80;")[0], text("\u{20AC}"));
    assert_eq!(tokens("&#0;")[0], text("\u{FFFD}"));
    assert_eq!(error_codes("&#0;"), vec![ParseErrorCode::NullCharacterReference]);
}

#[test]
fn test_eof_in_tag() {
    assert_eq!(tokens("<div"), vec![Token::EndOfFile]);
    assert_eq!(error_codes("<div"), vec![ParseErrorCode::EofInTag]);
}

#[test]
fn test_token_size_limit_drops_token() {
    let options = TokenizerOptions {
        limits: TokenizerLimits {
            max_token_bytes: Some(8),
            max_text_bytes: None,
        },
        ..TokenizerOptions::default()
    };
    let result = tokenize(r#"<p class="long">x"#, &options).unwrap();
    assert_eq!(result.tokens[0].token, text("x"));
    assert_eq!(result.errors[0].code, ParseErrorCode::TokenSizeLimitExceeded);
}

#[test]
fn test_text_limit_truncates() {
    let options = TokenizerOptions {
        limits: TokenizerLimits {
            max_token_bytes: None,
            max_text_bytes: Some(3),
        },
        ..TokenizerOptions::default()
    };
    let result = tokenize("abcdef<p>gh", &options).unwrap();
    let tokens: Vec<Token> = result.tokens.into_iter().map(|t| t.token).collect();
    assert_eq!(tokens[0], text("abc"));
    assert!(matches!(&tokens[1], Token::StartTag { name, .. } if name == "p"));
    assert_eq!(tokens[2], Token::EndOfFile);
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn test_input_budget() {
    let error = tokenize_with_budgets(
        "<p>hello</p>",
        &TokenizerOptions::default(),
        Budgets::default().with_max_input_bytes(4),
    )
    .unwrap_err();
    assert_eq!(error.as_budget().unwrap().budget, BudgetKind::MaxInputBytes);
}

#[test]
fn test_xml_violation_mode() {
    let options = TokenizerOptions {
        xml_violation_mode: true,
        ..TokenizerOptions::default()
    };
    let result = tokenize("a\u{C}b<!--x--y-->", &options).unwrap();
    assert_eq!(result.tokens[0].token, text("a b"));
    assert_eq!(result.tokens[1].token, Token::new_comment("x- -y"));
}
