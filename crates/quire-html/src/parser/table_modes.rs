//! Table insertion modes: "in table" through "in cell".

use super::core::{InsertionMode, TreeBuilder, is_whitespace_run};
use super::stack::Scope;
use crate::error::ParseErrorCode;
use crate::tokenizer::Token;

const TABLE_SECTIONS: &[&str] = &["tbody", "tfoot", "thead"];

/// Start tags that end a caption or cell implicitly.
const TABLE_STRUCTURE: &[&str] = &[
    "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
];

fn is_start_tag_in(token: &Token, names: &[&str]) -> bool {
    matches!(token, Token::StartTag { name, .. } if names.contains(&name.as_str()))
}

fn is_end_tag_in(token: &Token, names: &[&str]) -> bool {
    matches!(token, Token::EndTag { name, .. } if names.contains(&name.as_str()))
}

impl TreeBuilder {
    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    #[allow(clippy::too_many_lines)]
    pub(super) fn handle_in_table_mode(&mut self, token: &Token) {
        match token {
            // "A character token, if the current node is table, tbody,
            // template, tfoot, thead, or tr element"
            // "Let the pending table character tokens be an empty list of
            // tokens." "Let the original insertion mode be the current
            // insertion mode." "Switch the insertion mode to "in table text"
            // and reprocess the token."
            Token::Character { .. }
                if self.current_node_is_one_of(&[
                    "table", "tbody", "template", "tfoot", "thead", "tr",
                ]) =>
            {
                self.pending_table_character_tokens.clear();
                self.original_insertion_mode = self.insertion_mode;
                self.switch_mode(InsertionMode::InTableText);
                self.process_token(token);
            }

            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            // "A start tag whose tag name is "caption""
            // "Clear the stack back to a table context." "Insert a marker at
            // the end of the list of active formatting elements." "Insert an
            // HTML element for the token, then switch the insertion mode to
            // "in caption"."
            Token::StartTag { name, .. } if name == "caption" => {
                self.clear_stack_back_to_table_context();
                self.insert_marker();
                let _ = self.insert_html_element(token);
                self.switch_mode(InsertionMode::InCaption);
            }

            // "A start tag whose tag name is "colgroup""
            Token::StartTag { name, .. } if name == "colgroup" => {
                self.clear_stack_back_to_table_context();
                let _ = self.insert_html_element(token);
                self.switch_mode(InsertionMode::InColumnGroup);
            }

            // "A start tag whose tag name is "col""
            // "Insert an HTML element for a "colgroup" start tag token with no
            // attributes, then switch the insertion mode to "in column group"."
            // "Reprocess the current token."
            Token::StartTag { name, .. } if name == "col" => {
                self.clear_stack_back_to_table_context();
                let _ = self.insert_synthesized_element("colgroup");
                self.switch_mode(InsertionMode::InColumnGroup);
                self.process_token(token);
            }

            // "A start tag whose tag name is one of: "tbody", "tfoot", "thead""
            _ if is_start_tag_in(token, TABLE_SECTIONS) => {
                self.clear_stack_back_to_table_context();
                let _ = self.insert_html_element(token);
                self.switch_mode(InsertionMode::InTableBody);
            }

            // "A start tag whose tag name is one of: "td", "th", "tr""
            _ if is_start_tag_in(token, &["td", "th", "tr"]) => {
                self.clear_stack_back_to_table_context();
                let _ = self.insert_synthesized_element("tbody");
                self.switch_mode(InsertionMode::InTableBody);
                self.process_token(token);
            }

            // "A start tag whose tag name is "table""
            // "Parse error." "If the stack of open elements does not have a
            // table element in table scope, ignore the token." "Otherwise: Pop
            // elements from this stack until a table element has been popped
            // from the stack." "Reset the insertion mode appropriately."
            // "Reprocess the token."
            Token::StartTag { name, .. } if name == "table" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                if !self.has_element_in(Scope::Table, "table") {
                    return;
                }
                self.pop_until("table");
                self.reset_insertion_mode_appropriately();
                self.process_token(token);
            }

            // "An end tag whose tag name is "table""
            Token::EndTag { name, .. } if name == "table" => {
                if !self.has_element_in(Scope::Table, "table") {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.pop_until("table");
                self.reset_insertion_mode_appropriately();
            }

            // "An end tag whose tag name is one of: "body", "caption", "col",
            // "colgroup", "html", "tbody", "td", "tfoot", "th", "thead", "tr""
            // "Parse error. Ignore the token."
            _ if is_end_tag_in(
                token,
                &[
                    "body", "caption", "col", "colgroup", "html", "tbody", "td", "tfoot", "th",
                    "thead", "tr",
                ],
            ) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            // "A start tag whose tag name is one of: "style", "script",
            // "template"" / "An end tag whose tag name is "template""
            // "Process the token using the rules for the "in head" insertion mode."
            _ if is_start_tag_in(token, &["style", "script", "template"])
                || is_end_tag_in(token, &["template"]) =>
            {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }

            // "A start tag whose tag name is "input""
            // "If the token does not have an attribute with the name "type",
            // or if it does, but that attribute's value is not an ASCII
            // case-insensitive match for the string "hidden", then: act as
            // described in the "anything else" entry below."
            Token::StartTag {
                name, attributes, ..
            } if name == "input"
                && attributes
                    .iter()
                    .any(|a| a.name == "type" && a.value.eq_ignore_ascii_case("hidden")) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
            }

            // "A start tag whose tag name is "form""
            Token::StartTag { name, .. } if name == "form" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                let has_template = self
                    .stack_of_open_elements
                    .iter()
                    .any(|&id| self.is_html_element(id, "template"));
                if has_template || self.form_element_pointer.is_some() {
                    return;
                }
                let form = self.insert_html_element(token);
                self.form_element_pointer = Some(form);
                let _ = self.pop_current_node();
            }

            // "An end-of-file token"
            // "Process the token using the rules for the "in body" insertion mode."
            Token::EndOfFile => self.process_using_rules_for(InsertionMode::InBody, token),

            _ => self.in_table_anything_else(token),
        }
    }

    /// "Anything else": "Parse error. Enable foster parenting, process the
    /// token using the rules for the "in body" insertion mode, and then
    /// disable foster parenting."
    fn in_table_anything_else(&mut self, token: &Token) {
        self.parse_error(ParseErrorCode::FosterParentedContent);
        self.foster_parenting = true;
        self.process_using_rules_for(InsertionMode::InBody, token);
        self.foster_parenting = false;
    }

    /// [§ 13.2.6.4.10 The "in table text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intabletext)
    pub(super) fn handle_in_table_text_mode(&mut self, token: &Token) {
        match token {
            // "A character token that is U+0000 NULL"
            // "Parse error. Ignore the token."
            Token::Character { data } if data.starts_with('\0') => {
                self.parse_error(ParseErrorCode::UnexpectedNullCharacter);
            }

            // "Any other character token"
            // "Append the character token to the pending table character tokens list."
            Token::Character { data } => {
                self.pending_table_character_tokens
                    .push((data.clone(), self.token_span));
            }

            // "Anything else"
            _ => {
                self.flush_pending_table_characters();
                // "Switch the insertion mode to the original insertion mode and
                // reprocess the token."
                self.switch_mode(self.original_insertion_mode);
                self.process_token(token);
            }
        }
    }

    /// "If any of the tokens in the pending table character tokens list are
    /// character tokens that are not ASCII whitespace, then this is a parse
    /// error: reprocess the character tokens in the pending table character
    /// tokens list using the rules given in the "anything else" entry in the
    /// "in table" insertion mode." "Otherwise, insert the characters given by
    /// the pending table character tokens list."
    fn flush_pending_table_characters(&mut self) {
        let pending = std::mem::take(&mut self.pending_table_character_tokens);
        if pending.is_empty() {
            return;
        }
        let token_span = self.token_span;
        let foster = pending.iter().any(|(data, _)| !is_whitespace_run(data));
        if foster {
            self.parse_error(ParseErrorCode::FosterParentedContent);
        }
        for (data, span) in pending {
            self.token_span = span;
            if foster {
                self.foster_parenting = true;
                self.process_using_rules_for(InsertionMode::InBody, &Token::Character { data });
                self.foster_parenting = false;
            } else {
                self.insert_characters(&data);
            }
        }
        self.token_span = token_span;
    }

    /// [§ 13.2.6.4.11 The "in caption" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incaption)
    pub(super) fn handle_in_caption_mode(&mut self, token: &Token) {
        let closes_caption = is_end_tag_in(token, &["caption", "table"])
            || is_start_tag_in(token, TABLE_STRUCTURE);
        if closes_caption {
            // "If the stack of open elements does not have a caption element
            // in table scope, this is a parse error; ignore the token."
            if !self.has_element_in(Scope::Table, "caption") {
                self.parse_error(super::head_modes::unexpected(token));
                return;
            }
            // "Generate implied end tags." "Now, if the current node is not a
            // caption element, then this is a parse error." "Pop elements
            // from this stack until a caption element has been popped from the
            // stack." "Clear the list of active formatting elements up to the
            // last marker." "Switch the insertion mode to "in table"."
            self.generate_implied_end_tags(None);
            if !self.current_node_is("caption") {
                self.parse_error(ParseErrorCode::UnclosedElements);
            }
            self.pop_until("caption");
            self.clear_active_formatting_elements_to_last_marker();
            self.switch_mode(InsertionMode::InTable);
            // Everything but the caption end tag is then reprocessed.
            if !is_end_tag_in(token, &["caption"]) {
                self.process_token(token);
            }
            return;
        }

        if is_end_tag_in(
            token,
            &[
                "body", "col", "colgroup", "html", "tbody", "td", "tfoot", "th", "thead", "tr",
            ],
        ) {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
            return;
        }

        // "Anything else"
        // "Process the token using the rules for the "in body" insertion mode."
        self.process_using_rules_for(InsertionMode::InBody, token);
    }

    /// [§ 13.2.6.4.12 The "in column group" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incolumngroup)
    pub(super) fn handle_in_column_group_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if is_whitespace_run(data) => self.insert_characters(data),
            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "A start tag whose tag name is "col""
            // "Insert an HTML element for the token. Immediately pop the
            // current node off the stack of open elements."
            // "Acknowledge the token's self-closing flag, if it is set."
            Token::StartTag { name, .. } if name == "col" => {
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
            }

            // "An end tag whose tag name is "colgroup""
            Token::EndTag { name, .. } if name == "colgroup" => {
                if !self.current_node_is("colgroup") {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                let _ = self.pop_current_node();
                self.switch_mode(InsertionMode::InTable);
            }

            Token::EndTag { name, .. } if name == "col" => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            _ if is_start_tag_in(token, &["template"]) || is_end_tag_in(token, &["template"]) => {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }

            Token::EndOfFile => self.process_using_rules_for(InsertionMode::InBody, token),

            // "Anything else"
            // "If the current node is not a colgroup element, then this is a
            // parse error; ignore the token." "Otherwise, pop the current node
            // from the stack of open elements." "Switch the insertion mode to
            // "in table"." "Reprocess the token."
            _ => {
                if !self.current_node_is("colgroup") {
                    self.parse_error(super::head_modes::unexpected(token));
                    return;
                }
                let _ = self.pop_current_node();
                self.switch_mode(InsertionMode::InTable);
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intbody)
    pub(super) fn handle_in_table_body_mode(&mut self, token: &Token) {
        match token {
            // "A start tag whose tag name is "tr""
            Token::StartTag { name, .. } if name == "tr" => {
                self.clear_stack_back_to_table_body_context();
                let _ = self.insert_html_element(token);
                self.switch_mode(InsertionMode::InRow);
            }

            // "A start tag whose tag name is one of: "th", "td""
            _ if is_start_tag_in(token, &["th", "td"]) => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                self.clear_stack_back_to_table_body_context();
                let _ = self.insert_synthesized_element("tr");
                self.switch_mode(InsertionMode::InRow);
                self.process_token(token);
            }

            // "An end tag whose tag name is one of: "tbody", "tfoot", "thead""
            Token::EndTag { name, .. } if TABLE_SECTIONS.contains(&name.as_str()) => {
                if !self.has_element_in(Scope::Table, name) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.clear_stack_back_to_table_body_context();
                let _ = self.pop_current_node();
                self.switch_mode(InsertionMode::InTable);
            }

            // "A start tag whose tag name is one of: "caption", "col",
            // "colgroup", "tbody", "tfoot", "thead"" / "An end tag whose tag
            // name is "table""
            _ if is_start_tag_in(
                token,
                &["caption", "col", "colgroup", "tbody", "tfoot", "thead"],
            ) || is_end_tag_in(token, &["table"]) =>
            {
                if !self.has_any_element_in(Scope::Table, TABLE_SECTIONS) {
                    self.parse_error(super::head_modes::unexpected(token));
                    return;
                }
                self.clear_stack_back_to_table_body_context();
                let _ = self.pop_current_node();
                self.switch_mode(InsertionMode::InTable);
                self.process_token(token);
            }

            _ if is_end_tag_in(
                token,
                &["body", "caption", "col", "colgroup", "html", "td", "th", "tr"],
            ) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            // "Anything else"
            // "Process the token using the rules for the "in table" insertion mode."
            _ => self.process_using_rules_for(InsertionMode::InTable, token),
        }
    }

    /// Close the current row: "Clear the stack back to a table row context."
    /// "Pop the current node (which will be a tr element) from the stack of
    /// open elements. Switch the insertion mode to "in table body"."
    fn close_table_row(&mut self) {
        self.clear_stack_back_to_table_row_context();
        let _ = self.pop_current_node();
        self.switch_mode(InsertionMode::InTableBody);
    }

    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intr)
    pub(super) fn handle_in_row_mode(&mut self, token: &Token) {
        match token {
            // "A start tag whose tag name is one of: "th", "td""
            // "Clear the stack back to a table row context." "Insert an HTML
            // element for the token, then switch the insertion mode to "in
            // cell"." "Insert a marker at the end of the list of active
            // formatting elements."
            _ if is_start_tag_in(token, &["th", "td"]) => {
                self.clear_stack_back_to_table_row_context();
                let _ = self.insert_html_element(token);
                self.switch_mode(InsertionMode::InCell);
                self.insert_marker();
            }

            // "An end tag whose tag name is "tr""
            Token::EndTag { name, .. } if name == "tr" => {
                if !self.has_element_in(Scope::Table, "tr") {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.close_table_row();
            }

            // "A start tag whose tag name is one of: "caption", "col",
            // "colgroup", "tbody", "tfoot", "thead", "tr"" / "An end tag whose
            // tag name is "table""
            _ if is_start_tag_in(
                token,
                &["caption", "col", "colgroup", "tbody", "tfoot", "thead", "tr"],
            ) || is_end_tag_in(token, &["table"]) =>
            {
                if !self.has_element_in(Scope::Table, "tr") {
                    self.parse_error(super::head_modes::unexpected(token));
                    return;
                }
                self.close_table_row();
                self.process_token(token);
            }

            // "An end tag whose tag name is one of: "tbody", "tfoot", "thead""
            Token::EndTag { name, .. } if TABLE_SECTIONS.contains(&name.as_str()) => {
                if !self.has_element_in(Scope::Table, name) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                if !self.has_element_in(Scope::Table, "tr") {
                    return;
                }
                self.close_table_row();
                self.process_token(token);
            }

            _ if is_end_tag_in(
                token,
                &["body", "caption", "col", "colgroup", "html", "td", "th"],
            ) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            _ => self.process_using_rules_for(InsertionMode::InTable, token),
        }
    }

    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intd)
    pub(super) fn handle_in_cell_mode(&mut self, token: &Token) {
        match token {
            // "An end tag whose tag name is one of: "td", "th""
            Token::EndTag { name, .. } if name == "td" || name == "th" => {
                if !self.has_element_in(Scope::Table, name) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node_is(name) {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                }
                self.pop_until(name);
                self.clear_active_formatting_elements_to_last_marker();
                self.switch_mode(InsertionMode::InRow);
            }

            // "A start tag whose tag name is one of: "caption", "col",
            // "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr""
            // "Assert: The stack of open elements has a td or th element in
            // table scope." "Close the cell and reprocess the token."
            _ if is_start_tag_in(token, TABLE_STRUCTURE) => {
                if !self.has_any_element_in(Scope::Table, &["td", "th"]) {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    return;
                }
                self.close_the_cell();
                self.process_token(token);
            }

            _ if is_end_tag_in(token, &["body", "caption", "col", "colgroup", "html"]) => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            // "An end tag whose tag name is one of: "table", "tbody",
            // "tfoot", "thead", "tr""
            Token::EndTag { name, .. }
                if matches!(name.as_str(), "table" | "tbody" | "tfoot" | "thead" | "tr") =>
            {
                if !self.has_element_in(Scope::Table, name) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return;
                }
                self.close_the_cell();
                self.process_token(token);
            }

            _ => self.process_using_rules_for(InsertionMode::InBody, token),
        }
    }
}
