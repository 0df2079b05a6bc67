//! Select, template, frameset and "after" insertion modes.

use quire_dom::{Namespace, NodeId};

use super::core::{ActiveFormattingElement, InsertionMode, TreeBuilder, is_whitespace_run};
use super::head_modes::unexpected;
use super::stack::Scope;
use crate::error::ParseErrorCode;
use crate::tokenizer::Token;

fn is_start_tag_in(token: &Token, names: &[&str]) -> bool {
    matches!(token, Token::StartTag { name, .. } if names.contains(&name.as_str()))
}

fn is_end_tag_in(token: &Token, names: &[&str]) -> bool {
    matches!(token, Token::EndTag { name, .. } if names.contains(&name.as_str()))
}

impl TreeBuilder {
    /// Leave the select: "Pop elements from the stack of open elements until
    /// a select element has been popped from the stack." "Reset the
    /// insertion mode appropriately."
    fn close_select(&mut self) {
        self.pop_until("select");
        self.reset_insertion_mode_appropriately();
    }

    /// [§ 13.2.6.4.16 The "in select" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselect)
    #[allow(clippy::too_many_lines)]
    pub(super) fn handle_in_select_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if data.starts_with('\0') => {
                self.parse_error(ParseErrorCode::UnexpectedNullCharacter);
            }
            // "Any other character token"
            // "Insert the token's character."
            Token::Character { data } => self.insert_characters(data),
            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "A start tag whose tag name is "option""
            // "If the current node is an option element, pop that node from
            // the stack of open elements." "Insert an HTML element for the token."
            Token::StartTag {
                name, attributes, ..
            } if name == "option" => {
                if self.current_node_is("option") {
                    let _ = self.pop_current_node();
                }
                if self.select_option_compat && self.after_bare_select && attributes.is_empty() {
                    self.carry_formatting_into_select();
                }
                let _ = self.insert_html_element(token);
            }

            // "A start tag whose tag name is "optgroup""
            Token::StartTag { name, .. } if name == "optgroup" => {
                if self.current_node_is("option") {
                    let _ = self.pop_current_node();
                }
                if self.current_node_is("optgroup") {
                    let _ = self.pop_current_node();
                }
                let _ = self.insert_html_element(token);
            }

            // "A start tag whose tag name is "hr""
            Token::StartTag { name, .. } if name == "hr" => {
                if self.current_node_is("option") {
                    let _ = self.pop_current_node();
                }
                if self.current_node_is("optgroup") {
                    let _ = self.pop_current_node();
                }
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
            }

            // "An end tag whose tag name is "optgroup""
            // "First, if the current node is an option element, and the node
            // immediately before it in the stack of open elements is an
            // optgroup element, then pop the current node from the stack of
            // open elements." "If the current node is an optgroup element,
            // then pop that node from the stack of open elements. Otherwise,
            // this is a parse error; ignore the token."
            Token::EndTag { name, .. } if name == "optgroup" => {
                let len = self.stack_of_open_elements.len();
                if self.current_node_is("option")
                    && len >= 2
                    && self.is_html_element(self.stack_of_open_elements[len - 2], "optgroup")
                {
                    let _ = self.pop_current_node();
                }
                if self.current_node_is("optgroup") {
                    let _ = self.pop_current_node();
                } else {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                }
            }

            // "An end tag whose tag name is "option""
            Token::EndTag { name, .. } if name == "option" => {
                if self.current_node_is("option") {
                    let _ = self.pop_current_node();
                } else {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                }
            }

            // "An end tag whose tag name is "select""
            Token::EndTag { name, .. } if name == "select" => {
                if !self.has_element_in(Scope::Select, "select") {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.close_select();
            }

            // "A start tag whose tag name is "select""
            // "Parse error." "If the stack of open elements does not have a
            // select element in select scope, ignore the token. (fragment case)"
            // "Otherwise: Pop elements from the stack of open elements until a
            // select element has been popped from the stack. Reset the
            // insertion mode appropriately."
            Token::StartTag { name, .. } if name == "select" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                if self.has_element_in(Scope::Select, "select") {
                    self.close_select();
                }
            }

            // "A start tag whose tag name is one of: "input", "keygen", "textarea""
            _ if is_start_tag_in(token, &["input", "keygen", "textarea"]) => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                if !self.has_element_in(Scope::Select, "select") {
                    return;
                }
                self.close_select();
                self.process_token(token);
            }

            _ if is_start_tag_in(token, &["script", "template"])
                || is_end_tag_in(token, &["template"]) =>
            {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }

            Token::EndOfFile => self.process_using_rules_for(InsertionMode::InBody, token),

            // "Anything else"
            // "Parse error. Ignore the token."
            _ => self.parse_error(unexpected(token)),
        }
    }

    /// Legacy recovery for `<b><select><option>`: when an attribute-free
    /// option directly follows an attribute-free select, the innermost open
    /// formatting element is recreated inside the select so the option text
    /// keeps its formatting.
    fn carry_formatting_into_select(&mut self) {
        let mut carried = None;
        for entry in self.active_formatting_elements.iter().rev() {
            match entry {
                ActiveFormattingElement::Marker => break,
                ActiveFormattingElement::Element { node_id, token } => {
                    if self.is_open(*node_id) {
                        carried = Some(token.clone());
                        break;
                    }
                }
            }
        }
        let Some(token) = carried else {
            return;
        };
        tracing::trace!(%token, "carrying formatting element into select");
        let location = self.appropriate_place_for_inserting(None);
        let clone = self.create_element_with_span(&token, Namespace::Html, None);
        self.insert_at(location, clone);
        self.push_open_element(clone);
    }

    /// [§ 13.2.6.4.17 The "in select in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselectintable)
    pub(super) fn handle_in_select_in_table_mode(&mut self, token: &Token) {
        const TABLE_TAGS: &[&str] = &["caption", "table", "tbody", "tfoot", "thead", "tr", "td", "th"];

        // "A start tag whose tag name is one of: "caption", "table", "tbody",
        // "tfoot", "thead", "tr", "td", "th""
        // "Parse error." "Pop elements from the stack of open elements until a
        // select element has been popped from the stack." "Reset the insertion
        // mode appropriately." "Reprocess the token."
        if is_start_tag_in(token, TABLE_TAGS) {
            self.parse_error(ParseErrorCode::UnexpectedStartTag);
            self.close_select();
            self.process_token(token);
            return;
        }

        // "An end tag whose tag name is one of: ..."
        // "Parse error." "If the stack of open elements does not have an
        // element in table scope that is an HTML element with the same tag
        // name as that of the token, then ignore the token." "Otherwise: ..."
        if let Token::EndTag { name, .. } = token
            && TABLE_TAGS.contains(&name.as_str())
        {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
            if !self.has_element_in(Scope::Table, name) {
                return;
            }
            self.close_select();
            self.process_token(token);
            return;
        }

        self.process_using_rules_for(InsertionMode::InSelect, token);
    }

    /// Replace the current template insertion mode and reprocess.
    fn switch_template_mode(&mut self, mode: InsertionMode, token: &Token) {
        // "Pop the current template insertion mode off the stack of template
        // insertion modes." "Push X onto the stack of template insertion
        // modes so that it is the new current template insertion mode."
        // "Switch the insertion mode to X, and reprocess the token."
        let _ = self.template_insertion_modes.pop();
        self.template_insertion_modes.push(mode);
        self.switch_mode(mode);
        self.process_token(token);
    }

    /// [§ 13.2.6.4.18 The "in template" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intemplate)
    pub(super) fn handle_in_template_mode(&mut self, token: &Token) {
        match token {
            // "A character token" / "A comment token" / "A DOCTYPE token"
            // "Process the token using the rules for the "in body" insertion mode."
            Token::Character { .. } | Token::Comment { .. } | Token::Doctype { .. } => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            _ if is_start_tag_in(
                token,
                &[
                    "base", "basefont", "bgsound", "link", "meta", "noframes", "script", "style",
                    "template", "title",
                ],
            ) || is_end_tag_in(token, &["template"]) =>
            {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }

            _ if is_start_tag_in(token, &["caption", "colgroup", "tbody", "tfoot", "thead"]) => {
                self.switch_template_mode(InsertionMode::InTable, token);
            }
            _ if is_start_tag_in(token, &["col"]) => {
                self.switch_template_mode(InsertionMode::InColumnGroup, token);
            }
            _ if is_start_tag_in(token, &["tr"]) => {
                self.switch_template_mode(InsertionMode::InTableBody, token);
            }
            _ if is_start_tag_in(token, &["td", "th"]) => {
                self.switch_template_mode(InsertionMode::InRow, token);
            }
            Token::StartTag { .. } => self.switch_template_mode(InsertionMode::InBody, token),

            // "Any other end tag"
            // "Parse error. Ignore the token."
            Token::EndTag { .. } => self.parse_error(ParseErrorCode::UnexpectedEndTag),

            // "An end-of-file token"
            Token::EndOfFile => {
                // "If there is no template element on the stack of open
                // elements, then stop parsing. (fragment case)"
                if !self
                    .stack_of_open_elements
                    .iter()
                    .any(|&id| self.is_html_element(id, "template"))
                {
                    self.stop_parsing();
                    return;
                }
                // "Otherwise, this is a parse error." "Pop elements from the
                // stack of open elements until a template element has been
                // popped from the stack." "Clear the list of active formatting
                // elements up to the last marker." "Pop the current template
                // insertion mode off the stack of template insertion modes."
                // "Reset the insertion mode appropriately." "Reprocess the token."
                self.parse_error(ParseErrorCode::UnexpectedEof);
                self.pop_until("template");
                self.clear_active_formatting_elements_to_last_marker();
                let _ = self.template_insertion_modes.pop();
                self.reset_insertion_mode_appropriately();
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    pub(super) fn handle_after_body_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if is_whitespace_run(data) => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "A comment token"
            // "Insert a comment as the last child of the first element in the
            // stack of open elements (the html element)."
            Token::Comment { data } => {
                let html = self.stack_of_open_elements.first().copied();
                self.insert_comment(data, Some(html.unwrap_or(NodeId::ROOT)));
            }

            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "An end tag whose tag name is "html""
            // "If the parser was created as part of the HTML fragment parsing
            // algorithm, this is a parse error; ignore the token. (fragment
            // case)" "Otherwise, switch the insertion mode to "after after body"."
            Token::EndTag { name, .. } if name == "html" => {
                if self.context_element.is_some() {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                if let Some(&html) = self.stack_of_open_elements.first() {
                    let _ = self.explicit_ends.insert(html, self.token_source.end);
                }
                self.switch_mode(InsertionMode::AfterAfterBody);
            }

            Token::EndOfFile => self.stop_parsing(),

            // "Anything else"
            // "Parse error. Switch the insertion mode to "in body" and
            // reprocess the token."
            _ => {
                self.parse_error(unexpected(token));
                self.switch_mode(InsertionMode::InBody);
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.20 The "in frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inframeset)
    pub(super) fn handle_in_frameset_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if is_whitespace_run(data) => self.insert_characters(data),
            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "A start tag whose tag name is "frameset""
            Token::StartTag { name, .. } if name == "frameset" => {
                let _ = self.insert_html_element(token);
            }

            // "An end tag whose tag name is "frameset""
            // "If the current node is the root html element, then this is a
            // parse error; ignore the token. (fragment case)" "Otherwise, pop
            // the current node from the stack of open elements." "If the
            // parser was not created as part of the HTML fragment parsing
            // algorithm (fragment case), and the current node is no longer a
            // frameset element, then switch the insertion mode to "after frameset"."
            Token::EndTag { name, .. } if name == "frameset" => {
                if self.stack_of_open_elements.len() <= 1 {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                let _ = self.pop_current_node();
                if self.context_element.is_none() && !self.current_node_is("frameset") {
                    self.switch_mode(InsertionMode::AfterFrameset);
                }
            }

            // "A start tag whose tag name is "frame""
            Token::StartTag { name, .. } if name == "frame" => {
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
            }

            Token::StartTag { name, .. } if name == "noframes" => {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }

            // "An end-of-file token"
            // "If the current node is not the root html element, then this is
            // a parse error." "Stop parsing."
            Token::EndOfFile => {
                if self.stack_of_open_elements.len() > 1 {
                    self.parse_error(ParseErrorCode::UnexpectedEof);
                }
                self.stop_parsing();
            }

            _ => self.parse_error(unexpected(token)),
        }
    }

    /// [§ 13.2.6.4.21 The "after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterframeset)
    pub(super) fn handle_after_frameset_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if is_whitespace_run(data) => self.insert_characters(data),
            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }
            Token::EndTag { name, .. } if name == "html" => {
                if let Some(&html) = self.stack_of_open_elements.first() {
                    let _ = self.explicit_ends.insert(html, self.token_source.end);
                }
                self.switch_mode(InsertionMode::AfterAfterFrameset);
            }
            Token::StartTag { name, .. } if name == "noframes" => {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }
            Token::EndOfFile => self.stop_parsing(),
            _ => self.parse_error(unexpected(token)),
        }
    }

    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    pub(super) fn handle_after_after_body_mode(&mut self, token: &Token) {
        match token {
            // "A comment token"
            // "Insert a comment as the last child of the Document object."
            Token::Comment { data } => self.insert_comment(data, Some(NodeId::ROOT)),

            // "A DOCTYPE token" / whitespace / "A start tag whose tag name is "html""
            // "Process the token using the rules for the "in body" insertion mode."
            Token::Doctype { .. } => self.process_using_rules_for(InsertionMode::InBody, token),
            Token::Character { data } if is_whitespace_run(data) => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }
            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            Token::EndOfFile => self.stop_parsing(),

            // "Anything else"
            // "Parse error. Switch the insertion mode to "in body" and
            // reprocess the token."
            _ => {
                self.parse_error(unexpected(token));
                self.switch_mode(InsertionMode::InBody);
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.23 The "after after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-frameset-insertion-mode)
    pub(super) fn handle_after_after_frameset_mode(&mut self, token: &Token) {
        match token {
            Token::Comment { data } => self.insert_comment(data, Some(NodeId::ROOT)),
            Token::Doctype { .. } => self.process_using_rules_for(InsertionMode::InBody, token),
            Token::Character { data } if is_whitespace_run(data) => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }
            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }
            Token::EndOfFile => self.stop_parsing(),
            Token::StartTag { name, .. } if name == "noframes" => {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }
            _ => self.parse_error(unexpected(token)),
        }
    }
}
