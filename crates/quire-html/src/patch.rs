//! Source-level patch planning.
//!
//! A plan rewrites the *original* source: untouched byte ranges are copied
//! with [`PatchStep::Slice`], replaced nodes become [`PatchStep::Insert`].
//! Only nodes whose span was captured from the input can be targeted, so a
//! node synthesized by recovery rules (an implied `<tbody>`) is rejected
//! rather than guessed at.

use std::collections::HashSet;
use std::fmt;

use quire_dom::{DomTree, NodeId, Span};
use serde::{Deserialize, Serialize};

use crate::error::HtmlError;

/// Replace one node's source range with new markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchEdit {
    /// Target node.
    pub node_id: NodeId,
    /// Markup written in place of the node's span.
    pub replacement_html: String,
}

impl PatchEdit {
    /// An edit replacing `node_id` with `replacement_html`.
    #[must_use]
    pub fn new(node_id: NodeId, replacement_html: impl Into<String>) -> Self {
        Self {
            node_id,
            replacement_html: replacement_html.into(),
        }
    }
}

/// One step of a [`PatchPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PatchStep {
    /// Copy `source[start..end]`.
    Slice {
        /// First byte copied.
        start: usize,
        /// One past the last byte copied.
        end: usize,
    },
    /// Emit `text`, positioned at source offset `at`.
    Insert {
        /// Source offset the replacement starts at.
        at: usize,
        /// Replacement markup.
        text: String,
    },
}

/// Ordered, non-overlapping steps that reproduce the patched document.
///
/// Offsets never decrease along the plan. Source bytes are skipped only
/// right after an `Insert`: those are the bytes the insert replaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchPlan {
    /// The steps, in application order.
    pub steps: Vec<PatchStep>,
}

impl PatchPlan {
    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps (the source was empty and unedited).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for PatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slice { start, end } => write!(f, "slice {start}..{end}"),
            Self::Insert { at, text } => write!(f, "insert @{at} {text:?}"),
        }
    }
}

/// Compute the plan replacing each edit's node span in `source`.
///
/// `tree` must be the span-carrying tree parsed from `source`.
///
/// # Errors
/// - [`HtmlError::DuplicatePatchEdit`] when a node is edited twice.
/// - [`HtmlError::UnknownPatchTarget`] when a node id is not in the tree.
/// - [`HtmlError::NonInputSpanProvenance`] when the node has no span.
/// - [`HtmlError::SpanOutOfRange`] when the span does not fit `source`.
/// - [`HtmlError::OverlappingPatchEdits`] when two spans overlap.
pub fn compute_patch(
    source: &str,
    tree: &DomTree,
    edits: &[PatchEdit],
) -> Result<PatchPlan, HtmlError> {
    let mut seen = HashSet::new();
    let mut targets: Vec<(Span, NodeId, &str)> = Vec::with_capacity(edits.len());
    for edit in edits {
        if !seen.insert(edit.node_id) {
            return Err(HtmlError::DuplicatePatchEdit(edit.node_id));
        }
        if tree.get(edit.node_id).is_none() {
            return Err(HtmlError::UnknownPatchTarget(edit.node_id));
        }
        let span = tree
            .span(edit.node_id)
            .ok_or(HtmlError::NonInputSpanProvenance(edit.node_id))?;
        if span.slice(source).is_none() {
            return Err(HtmlError::SpanOutOfRange {
                span,
                source_len: source.len(),
            });
        }
        targets.push((span, edit.node_id, edit.replacement_html.as_str()));
    }

    targets.sort_by_key(|&(span, node_id, _)| (span.start, span.end, node_id));

    for pair in targets.windows(2) {
        let (first_span, first, _) = pair[0];
        let (second_span, second, _) = pair[1];
        if second_span.start < first_span.end {
            return Err(HtmlError::OverlappingPatchEdits {
                first,
                first_span,
                second,
                second_span,
            });
        }
    }

    let mut steps = Vec::with_capacity(targets.len() * 2 + 1);
    let mut cursor = 0;
    for (span, _, text) in targets {
        if span.start > cursor {
            steps.push(PatchStep::Slice {
                start: cursor,
                end: span.start,
            });
        }
        steps.push(PatchStep::Insert {
            at: span.start,
            text: text.to_string(),
        });
        cursor = span.end;
    }
    if cursor < source.len() {
        steps.push(PatchStep::Slice {
            start: cursor,
            end: source.len(),
        });
    }
    tracing::debug!(steps = steps.len(), edits = edits.len(), "computed patch plan");
    Ok(PatchPlan { steps })
}

/// Apply `plan` to `source` in one linear pass.
///
/// # Errors
/// [`HtmlError::PatchPlanBounds`] when a slice is reversed, out of range or
/// not on a character boundary, when a step moves backwards, or when
/// source bytes are skipped anywhere but right after an insert.
pub fn apply_patch_plan(source: &str, plan: &PatchPlan) -> Result<String, HtmlError> {
    let bounds = |step: usize, reason: String| HtmlError::PatchPlanBounds { step, reason };

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut after_insert = false;
    for (index, step) in plan.steps.iter().enumerate() {
        match step {
            PatchStep::Slice { start, end } => {
                let (start, end) = (*start, *end);
                if start > end {
                    return Err(bounds(index, format!("slice start {start} is after its end {end}")));
                }
                if start < cursor || (!after_insert && start != cursor) {
                    return Err(bounds(
                        index,
                        format!("slice starts at {start} but the cursor is at {cursor}"),
                    ));
                }
                let Some(text) = source.get(start..end) else {
                    return Err(bounds(
                        index,
                        format!("slice {start}..{end} does not fit a source of {} bytes", source.len()),
                    ));
                };
                out.push_str(text);
                cursor = end;
                after_insert = false;
            }
            PatchStep::Insert { at, text } => {
                let at = *at;
                if at < cursor || (!after_insert && at != cursor) {
                    return Err(bounds(
                        index,
                        format!("insert at {at} but the cursor is at {cursor}"),
                    ));
                }
                if at > source.len() {
                    return Err(bounds(
                        index,
                        format!("insert at {at} is past the end of a source of {} bytes", source.len()),
                    ));
                }
                out.push_str(text);
                cursor = at;
                after_insert = true;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use quire_dom::{ElementData, NodeType};

    use super::*;

    /// `<p>a</p><p>b</p>` with hand-set spans on two elements and one
    /// span-less element.
    fn tree() -> DomTree {
        let mut tree = DomTree::new();
        for span in [Some(Span::new(0, 8)), Some(Span::new(8, 16)), None] {
            let id = tree.alloc_with_span(NodeType::Element(ElementData::html("p")), span);
            tree.append_child(NodeId::ROOT, id);
        }
        tree
    }

    const SOURCE: &str = "<p>a</p><p>b</p>";

    #[test]
    fn test_plan_shape() {
        let plan = compute_patch(SOURCE, &tree(), &[PatchEdit::new(NodeId(3), "<hr>")]).unwrap();
        assert_eq!(
            plan.steps,
            vec![
                PatchStep::Slice { start: 0, end: 8 },
                PatchStep::Insert {
                    at: 8,
                    text: "<hr>".to_string()
                },
            ]
        );
        assert_eq!(apply_patch_plan(SOURCE, &plan).unwrap(), "<p>a</p><hr>");
    }

    #[test]
    fn test_adjacent_edits() {
        let edits = [PatchEdit::new(NodeId(3), "Y"), PatchEdit::new(NodeId(2), "X")];
        let plan = compute_patch(SOURCE, &tree(), &edits).unwrap();
        assert_eq!(apply_patch_plan(SOURCE, &plan).unwrap(), "XY");
    }

    #[test]
    fn test_rejections() {
        let tree = tree();
        let duplicate = [PatchEdit::new(NodeId(2), "x"), PatchEdit::new(NodeId(2), "y")];
        assert_eq!(compute_patch(SOURCE, &tree, &duplicate).unwrap_err().code(), "DUPLICATE_PATCH_EDIT");

        let synthesized = [PatchEdit::new(NodeId(4), "x")];
        assert_eq!(
            compute_patch(SOURCE, &tree, &synthesized).unwrap_err().code(),
            "NON_INPUT_SPAN_PROVENANCE"
        );

        let missing = [PatchEdit::new(NodeId(99), "x")];
        assert_eq!(compute_patch(SOURCE, &tree, &missing).unwrap_err().code(), "UNKNOWN_PATCH_TARGET");

        assert_eq!(
            compute_patch("<p>", &tree, &[PatchEdit::new(NodeId(2), "x")]).unwrap_err().code(),
            "SPAN_OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_apply_rejects_bad_plans() {
        let backwards = PatchPlan {
            steps: vec![
                PatchStep::Slice { start: 0, end: 8 },
                PatchStep::Slice { start: 4, end: 10 },
            ],
        };
        assert_eq!(apply_patch_plan(SOURCE, &backwards).unwrap_err().code(), "PATCH_PLAN_BOUNDS");

        let gap = PatchPlan {
            steps: vec![
                PatchStep::Slice { start: 0, end: 3 },
                PatchStep::Slice { start: 8, end: 10 },
            ],
        };
        assert!(apply_patch_plan(SOURCE, &gap).is_err());

        let misplaced_insert = PatchPlan {
            steps: vec![
                PatchStep::Slice { start: 0, end: 3 },
                PatchStep::Insert {
                    at: 5,
                    text: String::new(),
                },
            ],
        };
        assert!(apply_patch_plan(SOURCE, &misplaced_insert).is_err());

        let past_end = PatchPlan {
            steps: vec![PatchStep::Slice { start: 0, end: 99 }],
        };
        assert!(apply_patch_plan(SOURCE, &past_end).is_err());
    }
}
