//! Integration tests for serialization.

use quire_dom::NodeId;
use quire_html::{
    ParseOptions, SerializeOptions, parse, parse_fragment, serialize, serialize_node,
    serialize_with, to_test_format,
};

fn full(html: &str) -> String {
    serialize(&parse(html, &ParseOptions::default()).unwrap().tree)
}

fn minimized(html: &str) -> String {
    let result = parse(html, &ParseOptions::default()).unwrap();
    serialize_with(&result.tree, &SerializeOptions::minimized())
}

#[test]
fn test_full_form_writes_every_tag() {
    assert_eq!(
        full("<!DOCTYPE html><p>x"),
        "<!DOCTYPE html><html><head></head><body><p>x</p></body></html>"
    );
}

#[test]
fn test_text_and_attribute_escaping() {
    assert_eq!(
        full("<p title='a\"b' data-x=\"1&amp;2\">1 &lt; 2 &amp; 3</p>"),
        "<html><head></head><body><p data-x=\"1&amp;2\" title='a\"b'>1 &lt; 2 &amp; 3</p></body></html>"
    );
}

#[test]
fn test_preferred_quote() {
    let result = parse("<a href=x>", &ParseOptions::default()).unwrap();
    let options = SerializeOptions {
        quote_char: '\'',
        ..SerializeOptions::default()
    };
    assert!(serialize_with(&result.tree, &options).contains("<a href='x'>"));
}

#[test]
fn test_raw_text_is_not_escaped() {
    assert_eq!(
        full("<script>if (a < b && c) {}</script>"),
        "<html><head><script>if (a < b && c) {}</script></head><body></body></html>"
    );
}

#[test]
fn test_void_elements_have_no_end_tag() {
    assert_eq!(
        full("<br><img src=x>"),
        "<html><head></head><body><br><img src=\"x\"></body></html>"
    );
}

#[test]
fn test_leading_newline_in_pre_survives() {
    // The parser drops the first LF, the serializer puts one back.
    assert_eq!(
        full("<pre>\n\nx</pre>"),
        "<html><head></head><body><pre>\n\nx</pre></body></html>"
    );
}

#[test]
fn test_doctype_identifiers() {
    let html = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#;
    assert!(full(html).starts_with(html));
}

#[test]
fn test_foreign_attribute_prefix() {
    assert_eq!(
        full("<svg><use xlink:href=\"#a\"/></svg>"),
        "<html><head></head><body><svg><use xlink:href=\"#a\"></use></svg></body></html>"
    );
}

#[test]
fn test_minimized_paragraphs() {
    assert_eq!(minimized("<!DOCTYPE html><p>a<p>b"), "<!DOCTYPE html><p>a<p>b");
}

#[test]
fn test_minimized_table() {
    assert_eq!(
        minimized("<!DOCTYPE html><table><tr><td>1<td>2</table>"),
        "<!DOCTYPE html><table><tr><td>1<td>2</table>"
    );
}

#[test]
fn test_minimized_keeps_body_before_comment() {
    assert_eq!(
        minimized("<!DOCTYPE html><body><!--c--><p>x"),
        "<!DOCTYPE html><body><!--c--><p>x"
    );
}

#[test]
fn test_minimized_keeps_tags_with_attributes() {
    assert_eq!(
        minimized("<!DOCTYPE html><body class=\"a\"><p>x"),
        "<!DOCTYPE html><body class=\"a\"><p>x"
    );
}

#[test]
fn test_minimized_p_inside_anchor_keeps_end_tag() {
    assert_eq!(
        minimized("<!DOCTYPE html><a><p>x</p></a>"),
        "<!DOCTYPE html><a><p>x</p></a>"
    );
}

#[test]
fn test_minimized_optgroup_before_hr() {
    assert_eq!(
        minimized("<!DOCTYPE html><select><optgroup label=g><option>a</option></optgroup><hr></select>"),
        "<!DOCTYPE html><select><optgroup label=\"g\"><option>a<hr></select>"
    );
}

#[test]
fn test_minimized_caption() {
    assert_eq!(
        minimized("<!DOCTYPE html><table><caption>c</caption><tr><td>1</table>"),
        "<!DOCTYPE html><table><caption>c<tr><td>1</table>"
    );
    // Whitespace after the caption keeps the end tag.
    assert!(
        minimized("<!DOCTYPE html><table><caption>c</caption> <tr><td>1</table>")
            .contains("</caption>")
    );
}

#[test]
fn test_minimized_output_reparses_to_same_tree() {
    for html in [
        "<!DOCTYPE html><ul><li>a<li>b</ul><dl><dt>t<dd>d</dl>",
        "<!DOCTYPE html><table><thead><tr><th>h<tbody><tr><td>1</table>",
        "<!DOCTYPE html><select><option>a<option>b</select>",
        "<!DOCTYPE html><select><optgroup><option>a</optgroup><hr><option>b</select>",
        "<!DOCTYPE html><table><caption>c</caption><tr><td>1</table>",
        "<!DOCTYPE html><table><caption>c</caption><!--x--><tr><td>1</table>",
    ] {
        let first = parse(html, &ParseOptions::default()).unwrap();
        let text = serialize_with(&first.tree, &SerializeOptions::minimized());
        let second = parse(&text, &ParseOptions::default()).unwrap();
        assert_eq!(to_test_format(&first.tree), to_test_format(&second.tree), "{text}");
    }
}

#[test]
fn test_serialize_single_node() {
    let result = parse("<p>a<b>b</b></p>", &ParseOptions::default()).unwrap();
    // document(1) html(2) head(3) body(4) p(5)
    assert_eq!(
        serialize_node(&result.tree, NodeId(5), &SerializeOptions::default()),
        "<p>a<b>b</b></p>"
    );
}

#[test]
fn test_serialize_fragment() {
    let result = parse_fragment("<td>x", "tr", &ParseOptions::default()).unwrap();
    assert_eq!(result.serialize(), "<td>x</td>");
}

#[test]
fn test_template_contents_serialized() {
    assert_eq!(
        full("<template><p>x</p></template>"),
        "<html><head><template><p>x</p></template></head><body></body></html>"
    );
}
