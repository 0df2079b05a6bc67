//! [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)

use quire_dom::{Namespace, QuirksMode};

use super::core::{InsertionMode, TreeBuilder, is_whitespace_run};
use super::stack::Scope;
use crate::error::ParseErrorCode;
use crate::tokenizer::{Token, TokenizerState};

/// Start tags that close an open `p` and insert a plain block element.
const BLOCK_START_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dialog", "dir", "div",
    "dl", "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "main", "menu", "nav",
    "ol", "p", "search", "section", "summary", "ul",
];

/// End tags closed with "generate implied end tags" then "pop until".
const BLOCK_END_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "button", "center", "details", "dialog", "dir",
    "div", "dl", "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "listing",
    "main", "menu", "nav", "ol", "pre", "search", "section", "summary", "ul",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#formatting)
const FORMATTING_TAGS: &[&str] = &[
    "b", "big", "code", "em", "font", "i", "s", "small", "strike", "strong", "tt", "u",
];

/// Elements that may legitimately still be open at the end of the body.
const CLOSABLE_AT_EOF: &[&str] = &[
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc", "tbody", "td", "tfoot",
    "th", "thead", "tr", "body", "html",
];

/// Start tags that are handled by the "in head" rules even in the body.
const HEAD_START_TAGS: &[&str] = &[
    "base", "basefont", "bgsound", "link", "meta", "noframes", "script", "style", "template",
    "title",
];

/// Table-structure start tags ignored in the body.
const IGNORED_START_TAGS: &[&str] = &[
    "caption", "col", "colgroup", "frame", "head", "tbody", "td", "tfoot", "th", "thead", "tr",
];

impl TreeBuilder {
    fn has_open_template(&self) -> bool {
        self.stack_of_open_elements
            .iter()
            .any(|&id| self.is_html_element(id, "template"))
    }

    /// Whether an element outside the implicitly closable set is still open.
    pub(super) fn has_unclosed_elements(&self) -> bool {
        self.stack_of_open_elements
            .iter()
            .any(|&id| !self.is_html_element_in(id, CLOSABLE_AT_EOF))
    }

    #[allow(clippy::too_many_lines)]
    pub(super) fn handle_in_body_mode(&mut self, token: &Token) {
        match token {
            // "A character token that is U+0000 NULL"
            // "Parse error. Ignore the token."
            Token::Character { data } if data.starts_with('\0') => {
                self.parse_error(ParseErrorCode::UnexpectedNullCharacter);
            }

            // Whitespace: "Reconstruct the active formatting elements, if any."
            // "Insert the token's character."
            Token::Character { data } if is_whitespace_run(data) => {
                self.reconstruct_active_formatting_elements();
                self.insert_characters(data);
            }

            // "Any other character token"
            // "Reconstruct the active formatting elements, if any."
            // "Insert the token's character." "Set the frameset-ok flag to "not ok"."
            Token::Character { data } => {
                self.reconstruct_active_formatting_elements();
                self.insert_characters(data);
                self.frameset_ok = false;
            }

            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            Token::StartTag {
                name, attributes, ..
            } => self.in_body_start_tag(token, name, attributes),

            Token::EndTag { name, .. } => self.in_body_end_tag(token, name),

            // "An end-of-file token"
            Token::EndOfFile => {
                // "If the stack of template insertion modes is not empty, then
                // process the token using the rules for the "in template"
                // insertion mode."
                if !self.template_insertion_modes.is_empty() {
                    self.process_using_rules_for(InsertionMode::InTemplate, token);
                    return;
                }
                // "Otherwise, follow these steps: If there is a node in the
                // stack of open elements that is not either a dd element, ...
                // then this is a parse error." "Stop parsing."
                if self.has_unclosed_elements() {
                    self.parse_error(ParseErrorCode::UnexpectedEof);
                }
                self.stop_parsing();
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn in_body_start_tag(
        &mut self,
        token: &Token,
        name: &str,
        attributes: &[crate::tokenizer::Attribute],
    ) {
        match name {
            // "A start tag whose tag name is "html""
            // "Parse error." "If there is a template element on the stack of
            // open elements, then ignore the token." "Otherwise, for each
            // attribute on the token, check to see if the attribute is already
            // present on the top element of the stack of open elements. If it
            // is not, add the attribute and its corresponding value to that
            // element."
            "html" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                if self.has_open_template() {
                    return;
                }
                if let Some(&html) = self.stack_of_open_elements.first() {
                    self.merge_attributes(html, attributes);
                }
            }

            _ if HEAD_START_TAGS.contains(&name) => {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }

            // "A start tag whose tag name is "body""
            "body" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                let second = self.stack_of_open_elements.get(1).copied();
                let Some(body) = second.filter(|&id| self.is_html_element(id, "body")) else {
                    return;
                };
                if self.has_open_template() {
                    return;
                }
                self.frameset_ok = false;
                self.merge_attributes(body, attributes);
            }

            // "A start tag whose tag name is "frameset""
            "frameset" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                let second = self.stack_of_open_elements.get(1).copied();
                let Some(body) = second.filter(|&id| self.is_html_element(id, "body")) else {
                    return;
                };
                if !self.frameset_ok {
                    return;
                }
                // STEP 1: "Remove the second element on the stack of open
                //          elements from its parent node, if it has one."
                self.tree.detach(body);
                // STEP 2: "Pop all the nodes from the bottom of the stack of
                //          open elements, from the current node up to, but not
                //          including, the root html element."
                while self.stack_of_open_elements.len() > 1 {
                    let _ = self.pop_current_node();
                }
                // STEP 3: "Insert an HTML element for the token."
                let _ = self.insert_html_element(token);
                // STEP 4: "Switch the insertion mode to "in frameset"."
                self.switch_mode(InsertionMode::InFrameset);
            }

            _ if BLOCK_START_TAGS.contains(&name) => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(token);
            }

            // "A start tag whose tag name is one of: "h1", "h2", "h3", "h4",
            // "h5", "h6""
            _ if HEADINGS.contains(&name) => {
                self.close_p_if_in_button_scope();
                // "If the current node is an HTML element whose tag name is
                // one of "h1", "h2", "h3", "h4", "h5", or "h6", then this is a
                // parse error; pop the current node off the stack of open elements."
                if self.current_node_is_one_of(HEADINGS) {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    let _ = self.pop_current_node();
                }
                let _ = self.insert_html_element(token);
            }

            // "A start tag whose tag name is one of: "pre", "listing""
            // "If the next token is a U+000A LINE FEED (LF) character token,
            // then ignore that token and move on to the next one."
            "pre" | "listing" => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(token);
                self.ignore_next_line_feed = true;
                self.frameset_ok = false;
            }

            // "A start tag whose tag name is "form""
            "form" => {
                let has_template = self.has_open_template();
                if self.form_element_pointer.is_some() && !has_template {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    return;
                }
                self.close_p_if_in_button_scope();
                let form = self.insert_html_element(token);
                if !has_template {
                    self.form_element_pointer = Some(form);
                }
            }

            // "A start tag whose tag name is "li"" and
            // "A start tag whose tag name is one of: "dd", "dt""
            "li" | "dd" | "dt" => {
                self.frameset_ok = false;
                let closes: &[&str] = if name == "li" { &["li"] } else { &["dd", "dt"] };
                for index in (0..self.stack_of_open_elements.len()).rev() {
                    let node = self.stack_of_open_elements[index];
                    if self.is_html_element_in(node, closes) {
                        let Some(node_name) = self.tree.as_element(node).map(|e| e.tag_name.clone()) else {
                            break;
                        };
                        self.generate_implied_end_tags(Some(&node_name));
                        if !self.current_node_is(&node_name) {
                            self.parse_error(ParseErrorCode::UnclosedElements);
                        }
                        self.pop_until(&node_name);
                        break;
                    }
                    if self.is_special(node) && !self.is_html_element_in(node, &["address", "div", "p"]) {
                        break;
                    }
                }
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(token);
            }

            // "A start tag whose tag name is "plaintext""
            "plaintext" => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(token);
                self.switch_tokenizer(TokenizerState::PLAINTEXT);
            }

            // "A start tag whose tag name is "button""
            "button" => {
                if self.has_element_in(Scope::Default, "button") {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    self.generate_implied_end_tags(None);
                    self.pop_until("button");
                }
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element(token);
                self.frameset_ok = false;
            }

            // "A start tag whose tag name is "a""
            "a" => {
                // "If the list of active formatting elements contains an a
                // element between the end of the list and the last marker on
                // the list (or the start of the list if there is no marker on
                // the list), then this is a parse error; run the adoption
                // agency algorithm for the token, then remove that element from
                // the list of active formatting elements and the stack of open
                // elements if the adoption agency algorithm didn't already
                // remove it"
                if let Some(existing) = self.active_formatting_element_named("a") {
                    self.parse_error(ParseErrorCode::MisnestedFormattingElement);
                    self.run_adoption_agency("a");
                    self.remove_from_active_formatting(existing);
                    self.remove_from_stack(existing);
                }
                self.reconstruct_active_formatting_elements();
                let element = self.insert_html_element(token);
                self.push_active_formatting_element(element, token.clone());
            }

            _ if FORMATTING_TAGS.contains(&name) => {
                self.reconstruct_active_formatting_elements();
                let element = self.insert_html_element(token);
                self.push_active_formatting_element(element, token.clone());
            }

            // "A start tag whose tag name is "nobr""
            "nobr" => {
                self.reconstruct_active_formatting_elements();
                if self.has_element_in(Scope::Default, "nobr") {
                    self.parse_error(ParseErrorCode::MisnestedFormattingElement);
                    self.run_adoption_agency("nobr");
                    self.reconstruct_active_formatting_elements();
                }
                let element = self.insert_html_element(token);
                self.push_active_formatting_element(element, token.clone());
            }

            // "A start tag whose tag name is one of: "applet", "marquee", "object""
            "applet" | "marquee" | "object" => {
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element(token);
                self.insert_marker();
                self.frameset_ok = false;
            }

            // "A start tag whose tag name is "table""
            "table" => {
                if self.tree.quirks_mode() != QuirksMode::Quirks {
                    self.close_p_if_in_button_scope();
                }
                let _ = self.insert_html_element(token);
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::InTable);
            }

            // "A start tag whose tag name is one of: "area", "br", "embed",
            // "img", "keygen", "wbr""
            "area" | "br" | "embed" | "img" | "keygen" | "wbr" => {
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
                self.frameset_ok = false;
            }

            // "A start tag whose tag name is "input""
            "input" => {
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
                // "If the token does not have an attribute with the name
                // "type", or if it does, but that attribute's value is not an
                // ASCII case-insensitive match for the string "hidden", then:
                // set the frameset-ok flag to "not ok"."
                let hidden = attributes
                    .iter()
                    .any(|a| a.name == "type" && a.value.eq_ignore_ascii_case("hidden"));
                if !hidden {
                    self.frameset_ok = false;
                }
            }

            // "A start tag whose tag name is one of: "param", "source", "track""
            "param" | "source" | "track" => {
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
            }

            // "A start tag whose tag name is "hr""
            "hr" => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
                self.frameset_ok = false;
            }

            // "A start tag whose tag name is "image""
            // "Parse error. Change the token's tag name to "img" and reprocess
            // it. (Don't ask.)"
            "image" => {
                self.parse_error(ParseErrorCode::ImageTagRenamed);
                let Token::StartTag {
                    self_closing,
                    attributes,
                    ..
                } = token
                else {
                    return;
                };
                let renamed = Token::StartTag {
                    name: "img".to_string(),
                    self_closing: *self_closing,
                    attributes: attributes.clone(),
                };
                self.process_token(&renamed);
            }

            // "A start tag whose tag name is "textarea""
            "textarea" => {
                let _ = self.insert_html_element(token);
                self.ignore_next_line_feed = true;
                self.switch_tokenizer(TokenizerState::RCDATA);
                self.original_insertion_mode = self.insertion_mode;
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::Text);
            }

            // "A start tag whose tag name is "xmp""
            "xmp" => {
                self.close_p_if_in_button_scope();
                self.reconstruct_active_formatting_elements();
                self.frameset_ok = false;
                self.parse_generic_text_element(token, TokenizerState::RAWTEXT);
            }

            // "A start tag whose tag name is "iframe""
            "iframe" => {
                self.frameset_ok = false;
                self.parse_generic_text_element(token, TokenizerState::RAWTEXT);
            }

            // "A start tag whose tag name is "noembed"" / "noscript", if the
            // scripting flag is enabled
            "noembed" => self.parse_generic_text_element(token, TokenizerState::RAWTEXT),
            "noscript" if self.scripting => {
                self.parse_generic_text_element(token, TokenizerState::RAWTEXT);
            }

            // "A start tag whose tag name is "select""
            "select" => {
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element(token);
                self.frameset_ok = false;
                let in_table = matches!(
                    self.insertion_mode,
                    InsertionMode::InTable
                        | InsertionMode::InCaption
                        | InsertionMode::InTableBody
                        | InsertionMode::InRow
                        | InsertionMode::InCell
                );
                self.switch_mode(if in_table {
                    InsertionMode::InSelectInTable
                } else {
                    InsertionMode::InSelect
                });
            }

            // "A start tag whose tag name is one of: "optgroup", "option""
            "optgroup" | "option" => {
                if self.current_node_is("option") {
                    let _ = self.pop_current_node();
                }
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element(token);
            }

            // "A start tag whose tag name is one of: "rb", "rtc""
            "rb" | "rtc" => {
                if self.has_element_in(Scope::Default, "ruby") {
                    self.generate_implied_end_tags(None);
                    if !self.current_node_is("ruby") {
                        self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    }
                }
                let _ = self.insert_html_element(token);
            }

            // "A start tag whose tag name is one of: "rp", "rt""
            "rp" | "rt" => {
                if self.has_element_in(Scope::Default, "ruby") {
                    self.generate_implied_end_tags(Some("rtc"));
                    if !self.current_node_is_one_of(&["rtc", "ruby"]) {
                        self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    }
                }
                let _ = self.insert_html_element(token);
            }

            // "A start tag whose tag name is "math"" / "svg""
            // "Reconstruct the active formatting elements, if any." "Adjust
            // MathML (SVG) attributes for the token." "Adjust foreign
            // attributes for the token." "Insert a foreign element for the
            // token, with MathML (SVG) namespace and false." "If the token has
            // its self-closing flag set, pop the current node off the stack of
            // open elements and acknowledge the token's self-closing flag."
            "math" | "svg" => {
                self.reconstruct_active_formatting_elements();
                let namespace = if name == "math" {
                    Namespace::MathMl
                } else {
                    Namespace::Svg
                };
                let _ = self.insert_foreign_element_for_token(token, namespace);
                if matches!(token, Token::StartTag { self_closing: true, .. }) {
                    let _ = self.pop_current_node();
                    self.acknowledge_self_closing_flag();
                }
            }

            _ if IGNORED_START_TAGS.contains(&name) => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
            }

            // "Any other start tag"
            // "Reconstruct the active formatting elements, if any." "Insert an
            // HTML element for the token."
            _ => {
                self.reconstruct_active_formatting_elements();
                let _ = self.insert_html_element(token);
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn in_body_end_tag(&mut self, token: &Token, name: &str) {
        match name {
            "template" => self.process_using_rules_for(InsertionMode::InHead, token),

            // "An end tag whose tag name is "body""
            // "If the stack of open elements does not have a body element in
            // scope, this is a parse error; ignore the token." "Switch the
            // insertion mode to "after body"."
            //
            // "An end tag whose tag name is "html"" does the same, then
            // reprocesses the token.
            "body" | "html" => {
                if !self.has_element_in(Scope::Default, "body") {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                if self.has_unclosed_elements() {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                }
                if name == "body"
                    && let Some(body) = self.stack_of_open_elements.get(1).copied()
                {
                    let _ = self.explicit_ends.insert(body, self.token_source.end);
                }
                self.switch_mode(InsertionMode::AfterBody);
                if name == "html" {
                    self.process_token(token);
                }
            }

            _ if BLOCK_END_TAGS.contains(&name) => {
                if !self.has_element_in(Scope::Default, name) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node_is(name) {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                }
                self.pop_until(name);
            }

            // "An end tag whose tag name is "form""
            "form" => {
                if self.has_open_template() {
                    if !self.has_element_in(Scope::Default, "form") {
                        self.parse_error(ParseErrorCode::UnexpectedEndTag);
                        return;
                    }
                    self.generate_implied_end_tags(None);
                    if !self.current_node_is("form") {
                        self.parse_error(ParseErrorCode::UnclosedElements);
                    }
                    self.pop_until("form");
                    return;
                }
                // STEP 1: "Let node be the element that the form element
                //          pointer is set to, or null if it is not set to an element."
                // STEP 2: "Set the form element pointer to null."
                let node = self.form_element_pointer.take();
                // STEP 3: "If node is null or if the stack of open elements
                //          does not have node in scope, then this is a parse
                //          error; return and ignore the token."
                let Some(node) = node.filter(|&n| self.has_node_in_scope(n)) else {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                };
                // STEP 4: "Generate implied end tags."
                self.generate_implied_end_tags(None);
                // STEP 5: "If the current node is not node, then this is a parse error."
                if self.current_node() != Some(node) {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                } else {
                    let _ = self.explicit_ends.insert(node, self.token_source.end);
                }
                // STEP 6: "Remove node from the stack of open elements."
                self.remove_from_stack(node);
            }

            // "An end tag whose tag name is "p""
            // "If the stack of open elements does not have a p element in
            // button scope, then this is a parse error; insert an HTML element
            // for a "p" start tag token with no attributes." "Close a p element."
            "p" => {
                if !self.has_element_in(Scope::Button, "p") {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    let _ = self.insert_synthesized_element("p");
                }
                self.close_p_element();
            }

            // "An end tag whose tag name is "li""
            "li" => {
                if !self.has_element_in(Scope::ListItem, "li") {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.generate_implied_end_tags(Some("li"));
                if !self.current_node_is("li") {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                }
                self.pop_until("li");
            }

            // "An end tag whose tag name is one of: "dd", "dt""
            "dd" | "dt" => {
                if !self.has_element_in(Scope::Default, name) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.generate_implied_end_tags(Some(name));
                if !self.current_node_is(name) {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                }
                self.pop_until(name);
            }

            // "An end tag whose tag name is one of: "h1", "h2", "h3", "h4", "h5", "h6""
            _ if HEADINGS.contains(&name) => {
                if !self.has_any_element_in(Scope::Default, HEADINGS) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node_is(name) {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                }
                self.pop_until_one_of(HEADINGS);
            }

            // "An end tag whose tag name is one of: "a", "b", "big", "code",
            // "em", "font", "i", "nobr", "s", "small", "strike", "strong",
            // "tt", "u""
            // "Run the adoption agency algorithm for the token."
            _ if name == "a" || name == "nobr" || FORMATTING_TAGS.contains(&name) => {
                self.run_adoption_agency(name);
            }

            // "An end tag token whose tag name is one of: "applet", "marquee", "object""
            "applet" | "marquee" | "object" => {
                if !self.has_element_in(Scope::Default, name) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node_is(name) {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                }
                self.pop_until(name);
                self.clear_active_formatting_elements_to_last_marker();
            }

            // "An end tag whose tag name is "br""
            // "Parse error. Drop the attributes from the token, and act as
            // described in the next entry; i.e. act as if this was a "br"
            // start tag token with no attributes, rather than the end tag token
            // that it actually is."
            "br" => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                let start_tag = Token::StartTag {
                    name: "br".to_string(),
                    self_closing: false,
                    attributes: Vec::new(),
                };
                self.in_body_start_tag(&start_tag, "br", &[]);
            }

            // "Any other end tag"
            _ => self.any_other_end_tag(name),
        }
    }
}
