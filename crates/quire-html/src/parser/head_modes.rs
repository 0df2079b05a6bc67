//! Insertion modes up to and including "after head", plus "text".

use quire_dom::{DoctypeData, Namespace, NodeId, QuirksMode};

use super::core::{InsertionMode, TreeBuilder, is_whitespace_run};
use super::quirks;
use crate::error::ParseErrorCode;
use crate::tokenizer::{Token, TokenizerState};

impl TreeBuilder {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    pub(super) fn handle_initial_mode(&mut self, token: &Token) {
        match token {
            // "A character token that is one of U+0009 CHARACTER TABULATION,
            // U+000A LINE FEED (LF), U+000C FORM FEED (FF), U+000D CARRIAGE
            // RETURN (CR), or U+0020 SPACE"
            // "Ignore the token."
            Token::Character { data } if is_whitespace_run(data) => {}

            // "A comment token"
            // "Insert a comment as the last child of the Document object."
            Token::Comment { data } => self.insert_comment(data, Some(NodeId::ROOT)),

            // "A DOCTYPE token"
            Token::Doctype {
                name,
                public_identifier,
                system_identifier,
                force_quirks,
            } => {
                // "If the DOCTYPE token's name is not "html", or the token's
                // public identifier is not missing, or the token's system
                // identifier is neither missing nor "about:legacy-compat",
                // then there is a parse error."
                if !quirks::is_conforming_doctype(
                    name.as_deref(),
                    public_identifier.as_deref(),
                    system_identifier.as_deref(),
                ) {
                    self.parse_error(ParseErrorCode::NonConformingDoctype);
                }

                // "Append a DocumentType node to the Document node, with its
                // name set to the name given in the DOCTYPE token, or the
                // empty string if the name was missing"
                self.insert_doctype(DoctypeData {
                    name: name.clone().unwrap_or_default(),
                    public_id: public_identifier.clone(),
                    system_id: system_identifier.clone(),
                });

                let mode = quirks::document_mode(
                    name.as_deref(),
                    public_identifier.as_deref(),
                    system_identifier.as_deref(),
                    *force_quirks,
                );
                self.tree.set_quirks_mode(mode);

                // "Then, switch the insertion mode to "before html"."
                self.switch_mode(InsertionMode::BeforeHtml);
            }

            // "Anything else"
            // "If the document is not an iframe srcdoc document, then this is
            // a parse error; if the parser cannot change the mode flag is
            // false, set the Document to quirks mode."
            // "In any case, switch the insertion mode to "before html", then
            // reprocess the token."
            _ => {
                self.parse_error(ParseErrorCode::MissingDoctype);
                self.tree.set_quirks_mode(QuirksMode::Quirks);
                self.switch_mode(InsertionMode::BeforeHtml);
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    pub(super) fn handle_before_html_mode(&mut self, token: &Token) {
        match token {
            // "A DOCTYPE token"
            // "Parse error. Ignore the token."
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            // "A comment token"
            // "Insert a comment as the last child of the Document object."
            Token::Comment { data } => self.insert_comment(data, Some(NodeId::ROOT)),

            // Whitespace: "Ignore the token."
            Token::Character { data } if is_whitespace_run(data) => {}

            // "A start tag whose tag name is "html""
            // "Create an element for the token in the HTML namespace, with
            // the Document as the intended parent. Append it to the Document
            // object. Put this element in the stack of open elements."
            Token::StartTag { name, .. } if name == "html" => {
                let html = self.create_element_for_token(token, Namespace::Html);
                self.tree.append_child(NodeId::ROOT, html);
                self.push_open_element(html);
                self.switch_mode(InsertionMode::BeforeHead);
            }

            // "Any other end tag"
            // "Parse error. Ignore the token."
            Token::EndTag { name, .. }
                if !matches!(name.as_str(), "head" | "body" | "html" | "br") =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            // "Anything else"
            // "Create an html element whose node document is the Document
            // object. Append it to the Document object. Put this element in
            // the stack of open elements."
            // "Switch the insertion mode to "before head", then reprocess the token."
            _ => {
                let html = self.create_element("html", Namespace::Html, Vec::new(), None);
                self.tree.append_child(NodeId::ROOT, html);
                self.push_open_element(html);
                self.switch_mode(InsertionMode::BeforeHead);
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    pub(super) fn handle_before_head_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if is_whitespace_run(data) => {}
            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            // "A start tag whose tag name is "html""
            // "Process the token using the rules for the "in body" insertion mode."
            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "A start tag whose tag name is "head""
            // "Insert an HTML element for the token."
            // "Set the head element pointer to the newly created head element."
            Token::StartTag { name, .. } if name == "head" => {
                let head = self.insert_html_element(token);
                self.head_element_pointer = Some(head);
                self.switch_mode(InsertionMode::InHead);
            }

            Token::EndTag { name, .. }
                if !matches!(name.as_str(), "head" | "body" | "html" | "br") =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            // "Anything else"
            // "Insert an HTML element for a "head" start tag token with no attributes."
            _ => {
                let head = self.insert_synthesized_element("head");
                self.head_element_pointer = Some(head);
                self.switch_mode(InsertionMode::InHead);
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.2 The generic raw text element parsing algorithm](https://html.spec.whatwg.org/multipage/parsing.html#generic-raw-text-element-parsing-algorithm)
    /// and the generic RCDATA element parsing algorithm.
    pub(super) fn parse_generic_text_element(&mut self, token: &Token, state: TokenizerState) {
        // STEP 1: "Insert an HTML element for the token."
        let _ = self.insert_html_element(token);
        // STEP 2: "Switch the tokenizer to the RAWTEXT (or RCDATA) state."
        self.switch_tokenizer(state);
        // STEP 3: "Let the original insertion mode be the current insertion mode."
        self.original_insertion_mode = self.insertion_mode;
        // STEP 4: "Then, switch the insertion mode to "text"."
        self.switch_mode(InsertionMode::Text);
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    pub(super) fn handle_in_head_mode(&mut self, token: &Token) {
        match token {
            // Whitespace: "Insert the character."
            Token::Character { data } if is_whitespace_run(data) => self.insert_characters(data),
            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "A start tag whose tag name is one of: "base", "basefont",
            // "bgsound", "link""
            // "Insert an HTML element for the token. Immediately pop the
            // current node off the stack of open elements."
            // "Acknowledge the token's self-closing flag, if it is set."
            //
            // "A start tag whose tag name is "meta"" is handled the same way;
            // the character encoding has been settled before tree construction.
            Token::StartTag { name, .. }
                if matches!(name.as_str(), "base" | "basefont" | "bgsound" | "link" | "meta") =>
            {
                let _ = self.insert_html_element(token);
                let _ = self.pop_current_node();
                self.acknowledge_self_closing_flag();
            }

            // "A start tag whose tag name is "title""
            // "Follow the generic RCDATA element parsing algorithm."
            Token::StartTag { name, .. } if name == "title" => {
                self.parse_generic_text_element(token, TokenizerState::RCDATA);
            }

            // "A start tag whose tag name is "noscript", if the scripting flag
            // is enabled"
            // "A start tag whose tag name is one of: "noframes", "style""
            // "Follow the generic raw text element parsing algorithm."
            Token::StartTag { name, .. }
                if (name == "noscript" && self.scripting)
                    || matches!(name.as_str(), "noframes" | "style") =>
            {
                self.parse_generic_text_element(token, TokenizerState::RAWTEXT);
            }

            // "A start tag whose tag name is "noscript", if the scripting flag
            // is disabled"
            // "Insert an HTML element for the token."
            // "Switch the insertion mode to "in head noscript"."
            Token::StartTag { name, .. } if name == "noscript" => {
                let _ = self.insert_html_element(token);
                self.switch_mode(InsertionMode::InHeadNoscript);
            }

            // "A start tag whose tag name is "script""
            // Scripts are never executed: the element is inserted and its
            // content collected in the script data state.
            Token::StartTag { name, .. } if name == "script" => {
                let _ = self.insert_html_element(token);
                self.switch_tokenizer(TokenizerState::ScriptData);
                self.original_insertion_mode = self.insertion_mode;
                self.switch_mode(InsertionMode::Text);
            }

            // "An end tag whose tag name is "head""
            // "Pop the current node (which will be the head element) off the
            // stack of open elements."
            // "Switch the insertion mode to "after head"."
            Token::EndTag { name, .. } if name == "head" => {
                let _ = self.pop_current_node();
                self.switch_mode(InsertionMode::AfterHead);
            }

            // "A start tag whose tag name is "template""
            Token::StartTag { name, .. } if name == "template" => {
                // "Insert an HTML element for the token."
                let _ = self.insert_html_element(token);
                // "Insert a marker at the end of the list of active formatting elements."
                self.insert_marker();
                // "Set the frameset-ok flag to "not ok"."
                self.frameset_ok = false;
                // "Switch the insertion mode to "in template"."
                self.switch_mode(InsertionMode::InTemplate);
                // "Push "in template" onto the stack of template insertion modes"
                self.template_insertion_modes.push(InsertionMode::InTemplate);
            }

            // "An end tag whose tag name is "template""
            Token::EndTag { name, .. } if name == "template" => self.close_template_element(),

            // "An end tag whose tag name is one of: "body", "html", "br""
            // "Act as described in the "anything else" entry below."
            Token::EndTag { name, .. } if matches!(name.as_str(), "body" | "html" | "br") => {
                self.in_head_anything_else(token);
            }

            // "A start tag whose tag name is "head"" / "Any other end tag"
            // "Parse error. Ignore the token."
            Token::StartTag { name, .. } if name == "head" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
            }
            Token::EndTag { .. } => self.parse_error(ParseErrorCode::UnexpectedEndTag),

            _ => self.in_head_anything_else(token),
        }
    }

    /// "Pop the current node (which will be the head element) off the stack
    /// of open elements." "Switch the insertion mode to "after head"."
    /// "Reprocess the token."
    fn in_head_anything_else(&mut self, token: &Token) {
        let _ = self.pop_current_node();
        self.switch_mode(InsertionMode::AfterHead);
        self.process_token(token);
    }

    /// "An end tag whose tag name is "template"" in the "in head" insertion mode.
    pub(super) fn close_template_element(&mut self) {
        // "If there is no template element on the stack of open elements,
        // then this is a parse error; ignore the token."
        if !self
            .stack_of_open_elements
            .iter()
            .any(|&id| self.is_html_element(id, "template"))
        {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
            return;
        }
        // STEP 1: "Generate all implied end tags thoroughly."
        self.generate_all_implied_end_tags_thoroughly();
        // STEP 2: "If the current node is not a template element, then this
        //          is a parse error."
        if !self.current_node_is("template") {
            self.parse_error(ParseErrorCode::UnclosedElements);
        }
        // STEP 3: "Pop elements from the stack of open elements until a
        //          template element has been popped from the stack."
        self.pop_until("template");
        // STEP 4: "Clear the list of active formatting elements up to the last marker."
        self.clear_active_formatting_elements_to_last_marker();
        // STEP 5: "Pop the current template insertion mode off the stack of
        //          template insertion modes."
        let _ = self.template_insertion_modes.pop();
        // STEP 6: "Reset the insertion mode appropriately."
        self.reset_insertion_mode_appropriately();
    }

    /// [§ 13.2.6.4.5 The "in head noscript" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inheadnoscript)
    pub(super) fn handle_in_head_noscript_mode(&mut self, token: &Token) {
        match token {
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "An end tag whose tag name is "noscript""
            // "Pop the current node (which will be a noscript element) from
            // the stack of open elements; the new current node will be a head
            // element." "Switch the insertion mode to "in head"."
            Token::EndTag { name, .. } if name == "noscript" => {
                let _ = self.pop_current_node();
                self.switch_mode(InsertionMode::InHead);
            }

            // Whitespace, comments, and "a start tag whose tag name is one of:
            // "basefont", "bgsound", "link", "meta", "noframes", "style""
            // "Process the token using the rules for the "in head" insertion mode."
            Token::Character { data } if is_whitespace_run(data) => {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }
            Token::Comment { .. } => self.process_using_rules_for(InsertionMode::InHead, token),
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style"
                ) =>
            {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }

            Token::StartTag { name, .. } if matches!(name.as_str(), "head" | "noscript") => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
            }
            Token::EndTag { name, .. } if name != "br" => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            // "Anything else"
            // "Parse error." "Pop the current node (which will be a noscript
            // element) from the stack of open elements" "Switch the insertion
            // mode to "in head"." "Reprocess the token."
            _ => {
                self.parse_error(unexpected(token));
                let _ = self.pop_current_node();
                self.switch_mode(InsertionMode::InHead);
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    pub(super) fn handle_after_head_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data } if is_whitespace_run(data) => self.insert_characters(data),
            Token::Comment { data } => self.insert_comment(data, None),
            Token::Doctype { .. } => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            Token::StartTag { name, .. } if name == "html" => {
                self.process_using_rules_for(InsertionMode::InBody, token);
            }

            // "A start tag whose tag name is "body""
            // "Insert an HTML element for the token."
            // "Set the frameset-ok flag to "not ok"."
            // "Switch the insertion mode to "in body"."
            Token::StartTag { name, .. } if name == "body" => {
                let _ = self.insert_html_element(token);
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::InBody);
            }

            // "A start tag whose tag name is "frameset""
            Token::StartTag { name, .. } if name == "frameset" => {
                let _ = self.insert_html_element(token);
                self.switch_mode(InsertionMode::InFrameset);
            }

            // "A start tag whose tag name is one of: "base", "basefont",
            // "bgsound", "link", "meta", "noframes", "script", "style",
            // "template", "title""
            // "Parse error." "Push the node pointed to by the head element
            // pointer onto the stack of open elements." "Process the token
            // using the rules for the "in head" insertion mode." "Remove the
            // node pointed to by the head element pointer from the stack of
            // open elements. (It might not be the current node at this point.)"
            Token::StartTag { name, .. }
                if matches!(
                    name.as_str(),
                    "base"
                        | "basefont"
                        | "bgsound"
                        | "link"
                        | "meta"
                        | "noframes"
                        | "script"
                        | "style"
                        | "template"
                        | "title"
                ) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                let Some(head) = self.head_element_pointer else {
                    self.process_using_rules_for(InsertionMode::InHead, token);
                    return;
                };
                self.push_open_element(head);
                self.process_using_rules_for(InsertionMode::InHead, token);
                self.remove_from_stack(head);
            }

            // "An end tag whose tag name is "template""
            Token::EndTag { name, .. } if name == "template" => {
                self.process_using_rules_for(InsertionMode::InHead, token);
            }

            Token::StartTag { name, .. } if name == "head" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
            }
            Token::EndTag { name, .. }
                if !matches!(name.as_str(), "body" | "html" | "br") =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }

            // "Anything else"
            // "Insert an HTML element for a "body" start tag token with no attributes."
            // "Switch the insertion mode to "in body"." "Reprocess the current token."
            _ => {
                let _ = self.insert_synthesized_element("body");
                self.switch_mode(InsertionMode::InBody);
                self.process_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    pub(super) fn handle_text_mode(&mut self, token: &Token) {
        match token {
            // "A character token"
            // "Insert the token's character."
            Token::Character { data } => self.insert_characters(data),

            // "An end-of-file token"
            // "Parse error." "Pop the current node off the stack of open
            // elements." "Switch the insertion mode to the original insertion
            // mode and reprocess the token."
            Token::EndOfFile => {
                self.parse_error(ParseErrorCode::UnexpectedEof);
                let _ = self.pop_current_node();
                self.switch_mode(self.original_insertion_mode);
                self.process_token(token);
            }

            // "An end tag whose tag name is "script"" / "Any other end tag"
            // "Pop the current node off the stack of open elements."
            // "Switch the insertion mode to the original insertion mode."
            Token::EndTag { .. } => {
                let _ = self.pop_current_node();
                self.switch_mode(self.original_insertion_mode);
            }

            // The tokenizer never produces other tokens in a text state.
            Token::StartTag { .. } | Token::Comment { .. } | Token::Doctype { .. } => {}
        }
    }
}

/// The parse error for a token no rule accepts.
pub(super) const fn unexpected(token: &Token) -> ParseErrorCode {
    match token {
        Token::StartTag { .. } => ParseErrorCode::UnexpectedStartTag,
        Token::EndTag { .. } => ParseErrorCode::UnexpectedEndTag,
        Token::Doctype { .. } => ParseErrorCode::UnexpectedDoctype,
        Token::EndOfFile => ParseErrorCode::UnexpectedEof,
        Token::Character { .. } | Token::Comment { .. } => ParseErrorCode::UnexpectedCharacter,
    }
}

