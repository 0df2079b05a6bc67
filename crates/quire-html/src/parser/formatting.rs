//! The list of active formatting elements and the adoption agency algorithm.
//!
//! [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)

use quire_dom::{Namespace, NodeId};

use super::core::{ActiveFormattingElement, TreeBuilder};
use crate::error::ParseErrorCode;
use crate::tokenizer::Token;

impl TreeBuilder {
    /// Index of `id` in the list of active formatting elements.
    pub(super) fn active_formatting_index(&self, id: NodeId) -> Option<usize> {
        self.active_formatting_elements.iter().position(|entry| {
            matches!(entry, ActiveFormattingElement::Element { node_id, .. } if *node_id == id)
        })
    }

    /// Remove `id` from the list of active formatting elements, if present.
    pub(super) fn remove_from_active_formatting(&mut self, id: NodeId) {
        if let Some(index) = self.active_formatting_index(id) {
            let _ = self.active_formatting_elements.remove(index);
        }
    }

    /// "Insert a marker at the end of the list of active formatting elements."
    pub(super) fn insert_marker(&mut self) {
        self.active_formatting_elements
            .push(ActiveFormattingElement::Marker);
    }

    /// Whether two elements have the same tag name, namespace and attributes.
    fn same_formatting_element(&self, a: NodeId, b: NodeId) -> bool {
        let (Some(a), Some(b)) = (self.tree.as_element(a), self.tree.as_element(b)) else {
            return false;
        };
        a.tag_name == b.tag_name
            && a.namespace == b.namespace
            && a.attrs.len() == b.attrs.len()
            && a.attrs.iter().zip(&b.attrs).all(|(x, y)| {
                x.name == y.name && x.namespace == y.namespace && x.value == y.value
            })
    }

    /// [§ 13.2.4.3 Push onto the list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#push-onto-the-list-of-active-formatting-elements)
    pub(super) fn push_active_formatting_element(&mut self, id: NodeId, token: Token) {
        // STEP 1: "If there are already three elements in the list of active
        //          formatting elements after the last marker, if any, or
        //          anywhere in the list if there are no markers, that have the
        //          same tag name, namespace, and attributes as element, then
        //          remove the earliest such element from the list"
        let mut matching = Vec::new();
        for (index, entry) in self.active_formatting_elements.iter().enumerate().rev() {
            match entry {
                ActiveFormattingElement::Marker => break,
                ActiveFormattingElement::Element { node_id, .. } => {
                    if self.same_formatting_element(*node_id, id) {
                        matching.push(index);
                    }
                }
            }
        }
        if matching.len() >= 3
            && let Some(&earliest) = matching.last()
        {
            let _ = self.active_formatting_elements.remove(earliest);
        }

        // STEP 2: "Add element to the list of active formatting elements."
        self.active_formatting_elements
            .push(ActiveFormattingElement::Element { node_id: id, token });
    }

    fn is_marker_or_open(&self, index: usize) -> bool {
        match &self.active_formatting_elements[index] {
            ActiveFormattingElement::Marker => true,
            ActiveFormattingElement::Element { node_id, .. } => self.is_open(*node_id),
        }
    }

    /// [§ 13.2.4.3 Reconstruct the active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#reconstruct-the-active-formatting-elements)
    pub(super) fn reconstruct_active_formatting_elements(&mut self) {
        // STEP 1: "If there are no entries in the list of active formatting
        //          elements, then there is nothing to reconstruct; stop this
        //          algorithm."
        let len = self.active_formatting_elements.len();
        if len == 0 {
            return;
        }

        // STEP 2: "If the last (most recently added) entry in the list of
        //          active formatting elements is a marker, or if it is an
        //          element that is in the stack of open elements, then there is
        //          nothing to reconstruct; stop this algorithm."
        if self.is_marker_or_open(len - 1) {
            return;
        }

        // STEP 3-6: Rewind to the entry after the last marker or open element.
        let mut index = len - 1;
        while index > 0 {
            index -= 1;
            if self.is_marker_or_open(index) {
                index += 1;
                break;
            }
        }

        // STEP 7-10: "Create: Insert an HTML element for the token for which
        //             the element entry was created, to obtain new element."
        //             "Replace the entry for entry in the list with an entry
        //             for new element."
        for entry_index in index..len {
            let ActiveFormattingElement::Element { token, .. } =
                &self.active_formatting_elements[entry_index]
            else {
                continue;
            };
            let token = token.clone();
            let location = self.appropriate_place_for_inserting(None);
            let element = self.create_element_with_span(&token, Namespace::Html, None);
            self.insert_at(location, element);
            self.push_open_element(element);
            self.active_formatting_elements[entry_index] = ActiveFormattingElement::Element {
                node_id: element,
                token,
            };
        }
    }

    /// [§ 13.2.4.3 Clear the list of active formatting elements up to the last marker](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker)
    pub(super) fn clear_active_formatting_elements_to_last_marker(&mut self) {
        while let Some(entry) = self.active_formatting_elements.pop() {
            if matches!(entry, ActiveFormattingElement::Marker) {
                break;
            }
        }
    }

    /// The last formatting element after the last marker with tag `name`.
    pub(super) fn active_formatting_element_named(&self, name: &str) -> Option<NodeId> {
        for entry in self.active_formatting_elements.iter().rev() {
            match entry {
                ActiveFormattingElement::Marker => return None,
                ActiveFormattingElement::Element { node_id, .. } => {
                    if self.is_html_element(*node_id, name) {
                        return Some(*node_id);
                    }
                }
            }
        }
        None
    }

    fn stored_token(&self, index: usize) -> Option<Token> {
        match self.active_formatting_elements.get(index)? {
            ActiveFormattingElement::Element { token, .. } => Some(token.clone()),
            ActiveFormattingElement::Marker => None,
        }
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    ///
    /// "Any other end tag"
    pub(super) fn any_other_end_tag(&mut self, name: &str) {
        // STEP 1: "Initialize node to be the current node (the bottommost node
        //          of the stack)."
        for index in (0..self.stack_of_open_elements.len()).rev() {
            let node = self.stack_of_open_elements[index];
            // STEP 2: "Loop: If node is an HTML element with the same tag name
            //          as the token, then:"
            if self.is_html_element(node, name) {
                // STEP 2.1: "Generate implied end tags, except for HTML
                //            elements with the same tag name as the token."
                self.generate_implied_end_tags(Some(name));
                // STEP 2.2: "If node is not the current node, then this is a
                //            parse error."
                if self.current_node() != Some(node) {
                    self.parse_error(ParseErrorCode::UnclosedElements);
                }
                // STEP 2.3: "Pop all the nodes from the current node up to
                //            node, including node, then stop these steps."
                self.pop_until_node(node);
                return;
            }
            // STEP 3: "Otherwise, if node is in the special category, then this
            //          is a parse error; ignore the token, and return."
            if self.is_special(node) {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                return;
            }
        }
    }

    /// [§ 13.2.6.4.7 The adoption agency algorithm](https://html.spec.whatwg.org/multipage/parsing.html#adoption-agency-algorithm)
    pub(super) fn run_adoption_agency(&mut self, subject: &str) {
        // STEP 2: "If the current node is an HTML element whose tag name is
        //          subject, and the current node is not in the list of active
        //          formatting elements, then pop the current node off the stack
        //          of open elements and return."
        if let Some(current) = self.current_node()
            && self.is_html_element(current, subject)
            && self.active_formatting_index(current).is_none()
        {
            let _ = self.pop_current_node();
            return;
        }

        // STEP 3-5: "Let outer loop counter be 0." ... "If outer loop counter
        //           is greater than or equal to 8, then return."
        for _ in 0..8 {
            // STEP 7: "Let formatting element be the last element in the list
            //          of active formatting elements that is between the end of
            //          the list and the last marker in the list, if any, or the
            //          start of the list otherwise, and has the tag name subject."
            let Some(formatting_element) = self.active_formatting_element_named(subject) else {
                // STEP 8: "If there is no such element, then return and instead
                //          act as described in the "any other end tag" entry above."
                self.any_other_end_tag(subject);
                return;
            };

            // STEP 9: "If formatting element is not in the stack of open
            //          elements, then this is a parse error; remove the element
            //          from the list, and return."
            let Some(formatting_index) = self
                .stack_of_open_elements
                .iter()
                .position(|&id| id == formatting_element)
            else {
                self.parse_error(ParseErrorCode::MisnestedFormattingElement);
                self.remove_from_active_formatting(formatting_element);
                return;
            };

            // STEP 10: "If formatting element is in the stack of open elements,
            //           but the element is not in scope, then this is a parse
            //           error; return."
            if !self.has_node_in_scope(formatting_element) {
                self.parse_error(ParseErrorCode::MisnestedFormattingElement);
                return;
            }

            // STEP 11: "If formatting element is not the current node, this is
            //           a parse error. (But do not return.)"
            if self.current_node() != Some(formatting_element) {
                self.parse_error(ParseErrorCode::MisnestedFormattingElement);
            }

            // STEP 12: "Let furthest block be the topmost node in the stack of
            //           open elements that is lower in the stack than formatting
            //           element, and is an element in the special category."
            let furthest_block_index = (formatting_index + 1..self.stack_of_open_elements.len())
                .find(|&i| self.is_special(self.stack_of_open_elements[i]));

            // STEP 13: "If there is no furthest block, then the UA must first
            //           pop all the nodes from the bottom of the stack of open
            //           elements, from the current node up to and including
            //           formatting element, then remove formatting element from
            //           the list of active formatting elements, and finally return."
            let Some(furthest_block_index) = furthest_block_index else {
                self.pop_until_node(formatting_element);
                self.remove_from_active_formatting(formatting_element);
                return;
            };
            let furthest_block = self.stack_of_open_elements[furthest_block_index];

            // STEP 14: "Let common ancestor be the element immediately above
            //           formatting element in the stack of open elements."
            let common_ancestor = formatting_index
                .checked_sub(1)
                .map_or(NodeId::ROOT, |i| self.stack_of_open_elements[i]);

            // STEP 15: "Let a bookmark note the position of formatting element
            //           in the list of active formatting elements relative to
            //           the elements on either side of it in the list."
            let mut bookmark = self.active_formatting_index(formatting_element).unwrap_or(0);

            // STEP 16: "Let node and last node be furthest block."
            let mut node_index = furthest_block_index;
            let mut last_node = furthest_block;

            // STEP 17-18: "Let inner loop counter be 0." "Inner loop:"
            let mut inner_loop_counter = 0;
            loop {
                inner_loop_counter += 1;

                // STEP 18.2: "Let node be the element immediately above node in
                //             the stack of open elements, or if node is no
                //             longer in the stack of open elements, the element
                //             that was immediately above node before node was
                //             removed."
                node_index -= 1;
                let node = self.stack_of_open_elements[node_index];

                // STEP 18.3: "If node is formatting element, then break."
                if node == formatting_element {
                    break;
                }

                // STEP 18.4: "If inner loop counter is greater than 3 and node
                //             is in the list of active formatting elements, then
                //             remove node from the list of active formatting
                //             elements."
                if inner_loop_counter > 3
                    && let Some(index) = self.active_formatting_index(node)
                {
                    let _ = self.active_formatting_elements.remove(index);
                    if index < bookmark {
                        bookmark -= 1;
                    }
                }

                // STEP 18.5: "If node is not in the list of active formatting
                //             elements, then remove node from the stack of open
                //             elements and continue."
                let Some(node_entry) = self.active_formatting_index(node) else {
                    let _ = self.stack_of_open_elements.remove(node_index);
                    continue;
                };

                // STEP 18.6: "Create an element for the token for which the
                //             element node was created, in the HTML namespace,
                //             with common ancestor as the intended parent;
                //             replace the entry for node in the list of active
                //             formatting elements with an entry for the new
                //             element, replace the entry for node in the stack of
                //             open elements with an entry for the new element,
                //             and let node be the new element."
                let Some(token) = self.stored_token(node_entry) else {
                    break;
                };
                let replacement = self.create_element_with_span(&token, Namespace::Html, None);
                self.active_formatting_elements[node_entry] = ActiveFormattingElement::Element {
                    node_id: replacement,
                    token,
                };
                self.stack_of_open_elements[node_index] = replacement;

                // STEP 18.7: "If last node is furthest block, then move the
                //             aforementioned bookmark to be immediately after the
                //             new node in the list of active formatting elements."
                if last_node == furthest_block {
                    bookmark = node_entry + 1;
                }

                // STEP 18.8: "Append last node to node."
                self.tree.append_child(replacement, last_node);

                // STEP 18.9: "Set last node to node."
                last_node = replacement;
            }

            // STEP 19: "Insert whatever last node ended up being in the previous
            //           step at the appropriate place for inserting a node, but
            //           using common ancestor as the override target."
            let location = self.appropriate_place_for_inserting(Some(common_ancestor));
            self.insert_at(location, last_node);

            // STEP 20: "Create an element for the token for which formatting
            //           element was created, in the HTML namespace, with furthest
            //           block as the intended parent."
            let Some(formatting_entry) = self.active_formatting_index(formatting_element) else {
                return;
            };
            let Some(token) = self.stored_token(formatting_entry) else {
                return;
            };
            let new_element = self.create_element_with_span(&token, Namespace::Html, None);

            // STEP 21: "Take all of the child nodes of furthest block and append
            //           them to the element created in the last step."
            //           The contents fragment of a template stays where it is.
            let contents = self.tree.template_contents(furthest_block);
            if let Some(contents) = contents {
                self.tree.detach(contents);
            }
            self.tree.move_children(furthest_block, new_element);
            if let Some(contents) = contents {
                self.tree.append_child(furthest_block, contents);
            }

            // STEP 22: "Append that new element to furthest block."
            self.tree.append_child(furthest_block, new_element);

            // STEP 23: "Remove formatting element from the list of active
            //           formatting elements, and insert the new element into the
            //           list of active formatting elements at the position of
            //           the aforementioned bookmark."
            let _ = self.active_formatting_elements.remove(formatting_entry);
            if formatting_entry < bookmark {
                bookmark -= 1;
            }
            let bookmark = bookmark.min(self.active_formatting_elements.len());
            self.active_formatting_elements.insert(
                bookmark,
                ActiveFormattingElement::Element {
                    node_id: new_element,
                    token,
                },
            );

            // STEP 24: "Remove formatting element from the stack of open
            //           elements, and insert the new element into the stack of
            //           open elements immediately below the position of furthest
            //           block in that stack."
            self.remove_from_stack(formatting_element);
            if let Some(index) = self
                .stack_of_open_elements
                .iter()
                .position(|&id| id == furthest_block)
            {
                self.stack_of_open_elements.insert(index + 1, new_element);
            }
        }
    }
}
