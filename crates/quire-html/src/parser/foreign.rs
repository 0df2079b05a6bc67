//! [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)

use quire_dom::{NodeId, Namespace};

use super::core::{TreeBuilder, is_whitespace_run};
use super::foreign_content::{
    adjust_foreign_attributes, adjust_mathml_attributes, adjust_svg_attributes,
    adjust_svg_tag_name, mathml,
};
use crate::error::ParseErrorCode;
use crate::tokenizer::Token;

/// "A start tag whose tag name is one of: ..." that breaks out of foreign
/// content back into HTML.
const BREAKOUT_START_TAGS: &[&str] = &[
    "b", "big", "blockquote", "body", "br", "center", "code", "dd", "div", "dl", "dt", "em",
    "embed", "h1", "h2", "h3", "h4", "h5", "h6", "head", "hr", "i", "img", "li", "listing",
    "menu", "meta", "nobr", "ol", "p", "pre", "ruby", "s", "small", "span", "strong", "strike",
    "sub", "sup", "table", "tt", "u", "ul", "var",
];

impl TreeBuilder {
    /// [§ 13.2.6.2 HTML integration point](https://html.spec.whatwg.org/multipage/parsing.html#html-integration-point)
    ///
    /// "A node is an HTML integration point if it is one of the following
    /// elements:
    /// - A MathML annotation-xml element whose start tag token had an
    ///   attribute with the name "encoding" whose value was an ASCII
    ///   case-insensitive match for the string "text/html"
    /// - A MathML annotation-xml element whose start tag token had an
    ///   attribute with the name "encoding" whose value was an ASCII
    ///   case-insensitive match for the string "application/xhtml+xml"
    /// - An SVG foreignObject element
    /// - An SVG desc element
    /// - An SVG title element"
    pub(super) fn is_html_integration_point(&self, id: NodeId) -> bool {
        let Some(element) = self.tree.as_element(id) else {
            return false;
        };
        match element.namespace {
            Namespace::MathMl => {
                element.tag_name == "annotation-xml"
                    && element.get_attribute("encoding").is_some_and(|encoding| {
                        encoding.eq_ignore_ascii_case("text/html")
                            || encoding.eq_ignore_ascii_case("application/xhtml+xml")
                    })
            }
            Namespace::Svg => matches!(element.tag_name.as_str(), "foreignObject" | "desc" | "title"),
            Namespace::Html => false,
        }
    }

    /// [§ 13.2.6.1 Insert a foreign element](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-foreign-element)
    ///
    /// Applies the MathML or SVG attribute adjustments, the foreign attribute
    /// adjustments and (for SVG) the tag name adjustment before inserting.
    pub(super) fn insert_foreign_element_for_token(
        &mut self,
        token: &Token,
        namespace: Namespace,
    ) -> NodeId {
        let (name, attributes) = match token {
            Token::StartTag {
                name, attributes, ..
            } => (name.as_str(), attributes.as_slice()),
            _ => ("", [].as_slice()),
        };
        let mut attributes = Self::dom_attributes(attributes, self.token_span.is_some());
        let name = match namespace {
            Namespace::MathMl => {
                // "Adjust MathML attributes for the token."
                adjust_mathml_attributes(&mut attributes);
                name
            }
            Namespace::Svg => {
                // "Adjust SVG attributes for the token."
                adjust_svg_attributes(&mut attributes);
                adjust_svg_tag_name(name).unwrap_or(name)
            }
            Namespace::Html => name,
        };
        // "Adjust foreign attributes for the token."
        adjust_foreign_attributes(&mut attributes);
        let name = name.to_string();
        self.insert_element(&name, namespace, attributes)
    }

    /// [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)
    pub(super) fn handle_foreign_content(&mut self, token: &Token) {
        match token {
            // "A character token that is U+0000 NULL"
            // "Parse error. Insert a U+FFFD REPLACEMENT CHARACTER character."
            Token::Character { data } if data.starts_with('\0') => {
                self.parse_error(ParseErrorCode::UnexpectedNullCharacter);
                let replacement: String = data.chars().map(|_| '\u{FFFD}').collect();
                self.insert_characters(&replacement);
            }

            // "A character token that is one of U+0009 CHARACTER TABULATION,
            // U+000A LINE FEED (LF), U+000C FORM FEED (FF), U+000D CARRIAGE
            // RETURN (CR), or U+0020 SPACE"
            // "Insert the token's character."
            Token::Character { data } if is_whitespace_run(data) => {
                self.insert_characters(data);
            }

            // "Any other character token"
            // "Insert the token's character. Set the frameset-ok flag to "not ok"."
            Token::Character { data } => {
                self.insert_characters(data);
                self.frameset_ok = false;
            }

            // "A comment token"
            Token::Comment { data } => self.insert_comment(data, None),

            // "A DOCTYPE token"
            // "Parse error. Ignore the token."
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            Token::StartTag {
                name, attributes, ..
            } if BREAKOUT_START_TAGS.contains(&name.as_str())
                || (name == "font"
                    && attributes
                        .iter()
                        .any(|attr| matches!(attr.name.as_str(), "color" | "face" | "size"))) =>
            {
                self.break_out_of_foreign_content(token);
            }

            // "Any other start tag"
            Token::StartTag { self_closing, .. } => {
                // "If the adjusted current node is an element in the MathML
                // namespace, adjust MathML attributes for the token. If the
                // adjusted current node is an element in the SVG namespace,
                // and the token's tag name is one of the ones in the first
                // column of the following table, change the tag name to the
                // name given in the corresponding cell in the second column."
                let namespace = self
                    .adjusted_current_node()
                    .and_then(|id| self.tree.as_element(id))
                    .map_or(Namespace::Html, |element| element.namespace);
                // "Insert a foreign element for the token, with adjusted
                // current node's namespace and false."
                let _ = self.insert_foreign_element_for_token(token, namespace);
                // "If the token has its self-closing flag set, then ... pop
                // the current node off the stack of open elements and
                // acknowledge the token's self-closing flag."
                if *self_closing {
                    let _ = self.pop_current_node();
                    self.acknowledge_self_closing_flag();
                }
            }

            // "An end tag whose tag name is "br", "p""
            // "Parse error. ... process the token using the rules for the
            // current insertion mode."
            Token::EndTag { name, .. } if name == "br" || name == "p" => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                self.break_out_of_foreign_content(token);
            }

            // "Any other end tag"
            Token::EndTag { name, .. } => self.foreign_end_tag(token, name),

            Token::EndOfFile => self.process_using_rules_for(self.insertion_mode, token),
        }
    }

    /// "Parse error. While the current node is not a MathML text integration
    /// point, an HTML integration point, or an element in the HTML namespace,
    /// pop elements from the stack of open elements. Reprocess the token
    /// according to the rules given in the section corresponding to the
    /// current insertion mode in HTML content."
    fn break_out_of_foreign_content(&mut self, token: &Token) {
        if matches!(token, Token::StartTag { .. }) {
            self.parse_error(ParseErrorCode::UnexpectedStartTag);
        }
        while let Some(current) = self.current_node() {
            let Some(element) = self.tree.as_element(current) else {
                break;
            };
            let stop = element.namespace == Namespace::Html
                || (element.namespace == Namespace::MathMl
                    && mathml::is_text_integration_point(&element.tag_name))
                || self.is_html_integration_point(current);
            if stop {
                break;
            }
            let _ = self.pop_current_node();
        }
        self.process_using_rules_for(self.insertion_mode, token);
    }

    /// "Any other end tag" in foreign content.
    fn foreign_end_tag(&mut self, token: &Token, name: &str) {
        let Some(mut index) = self.stack_of_open_elements.len().checked_sub(1) else {
            return;
        };
        // STEP 1: "Initialize node to be the current node (the bottommost
        //          node of the stack)."
        // STEP 2: "If node's tag name, converted to ASCII lowercase, is not
        //          the same as the tag name of the token, then this is a
        //          parse error."
        if !self.tag_name_matches(self.stack_of_open_elements[index], name) {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
        }
        loop {
            // STEP 3: "Loop: If node is the topmost element in the stack of
            //          open elements, then return. (fragment case)"
            if index == 0 {
                return;
            }
            let node = self.stack_of_open_elements[index];
            // STEP 4: "If node's tag name, converted to ASCII lowercase, is
            //          the same as the tag name of the token, pop elements
            //          from the stack of open elements until node has been
            //          popped from the stack, and then return."
            if self.tag_name_matches(node, name) {
                self.pop_until_node(node);
                return;
            }
            // STEP 5: "Set node to the previous entry in the stack of open
            //          elements."
            index -= 1;
            let node = self.stack_of_open_elements[index];
            // STEP 6: "If node is not an element in the HTML namespace,
            //          return to the step labeled loop."
            if self
                .tree
                .as_element(node)
                .is_some_and(|element| element.namespace != Namespace::Html)
            {
                continue;
            }
            // STEP 7: "Otherwise, process the token according to the rules
            //          given in the section corresponding to the current
            //          insertion mode in HTML content."
            self.process_using_rules_for(self.insertion_mode, token);
            return;
        }
    }

    fn tag_name_matches(&self, id: NodeId, name: &str) -> bool {
        self.tree
            .as_element(id)
            .is_some_and(|element| element.tag_name.eq_ignore_ascii_case(name))
    }
}
