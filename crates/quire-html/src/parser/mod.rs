//! HTML parser module for tree construction.
//!
//! [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)

/// Tree builder state, the dispatcher and fragment setup.
mod core;
/// Foreign content insertion and the rules for parsing tokens in it.
mod foreign;
/// SVG and MathML name adjustments.
pub mod foreign_content;
/// List of active formatting elements and the adoption agency algorithm.
mod formatting;
/// Initial, before html, head-related and text insertion modes.
mod head_modes;
/// The "in body" insertion mode.
mod in_body;
/// Node creation and the appropriate place for inserting a node.
mod nodes;
/// Select, template, frameset and after-body insertion modes.
mod other_modes;
/// DOCTYPE quirks-mode classification.
pub mod quirks;
/// Stack of open elements and element scopes.
mod stack;
/// Table insertion modes.
mod table_modes;

pub use self::core::{FragmentContext, InsertionMode};
pub(crate) use self::core::{BuildOutput, TreeBuilder};
