//! Common plumbing for the quire parser crates.
//!
//! This crate provides shared infrastructure used by every parsing phase:
//! - **Budgets** - named resource ceilings and the meter that enforces them
//! - **Trace** - the append-only, budgeted log of phase and mode transitions
//! - **Warning System** - per-call deduplicated diagnostics routed through `tracing`

/// Resource ceilings and cooperative checkpoint enforcement.
pub mod budget;
/// Structured, append-only trace of parse phases.
pub mod trace;
/// Deduplicated diagnostic warnings.
pub mod warning;

pub use budget::{BudgetExceeded, BudgetKind, BudgetMeter, Budgets};
pub use trace::{Phase, TraceEvent, TraceLog};
pub use warning::Warnings;
