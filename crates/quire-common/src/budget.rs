//! Named resource ceilings and their cooperative enforcement.
//!
//! Budgets are checked at fixed checkpoints (per chunk, per token, per node,
//! per phase completion), never preemptively. Actual resource use can
//! therefore exceed a ceiling by at most one unit of work between two
//! checkpoints; the checkpoint that observes the excess fails the call with
//! the exact limit and actual values.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// A named ceiling in [`Budgets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
pub enum BudgetKind {
    /// Total bytes of input accepted by one call.
    #[strum(serialize = "maxInputBytes")]
    #[serde(rename = "maxInputBytes")]
    MaxInputBytes,
    /// Bytes buffered by the streaming driver before encoding resolves.
    #[strum(serialize = "maxBufferedBytes")]
    #[serde(rename = "maxBufferedBytes")]
    MaxBufferedBytes,
    /// Nodes created by tree construction (the document root excluded).
    #[strum(serialize = "maxNodes")]
    #[serde(rename = "maxNodes")]
    MaxNodes,
    /// Depth of the stack of open elements.
    #[strum(serialize = "maxDepth")]
    #[serde(rename = "maxDepth")]
    MaxDepth,
    /// Number of trace events recorded.
    #[strum(serialize = "maxTraceEvents")]
    #[serde(rename = "maxTraceEvents")]
    MaxTraceEvents,
    /// Cumulative rendered size of trace events.
    #[strum(serialize = "maxTraceBytes")]
    #[serde(rename = "maxTraceBytes")]
    MaxTraceBytes,
    /// Wall-clock milliseconds since the call started.
    #[strum(serialize = "maxTimeMs")]
    #[serde(rename = "maxTimeMs")]
    MaxTimeMs,
}

/// Configuration record of named ceilings.
///
/// Any field left as `None` imposes no ceiling.
///
/// ```
/// use quire_common::Budgets;
///
/// let budgets = Budgets::default().with_max_depth(64).with_max_nodes(10_000);
/// assert_eq!(budgets.max_depth, Some(64));
/// assert_eq!(budgets.max_time_ms, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Budgets {
    /// See [`BudgetKind::MaxInputBytes`].
    pub max_input_bytes: Option<u64>,
    /// See [`BudgetKind::MaxBufferedBytes`].
    pub max_buffered_bytes: Option<u64>,
    /// See [`BudgetKind::MaxNodes`].
    pub max_nodes: Option<u64>,
    /// See [`BudgetKind::MaxDepth`].
    pub max_depth: Option<u64>,
    /// See [`BudgetKind::MaxTraceEvents`].
    pub max_trace_events: Option<u64>,
    /// See [`BudgetKind::MaxTraceBytes`].
    pub max_trace_bytes: Option<u64>,
    /// See [`BudgetKind::MaxTimeMs`].
    pub max_time_ms: Option<u64>,
}

impl Budgets {
    /// No ceilings at all.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_input_bytes: None,
            max_buffered_bytes: None,
            max_nodes: None,
            max_depth: None,
            max_trace_events: None,
            max_trace_bytes: None,
            max_time_ms: None,
        }
    }

    /// Set the `maxInputBytes` ceiling.
    #[must_use]
    pub const fn with_max_input_bytes(mut self, limit: u64) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }

    /// Set the `maxBufferedBytes` ceiling.
    #[must_use]
    pub const fn with_max_buffered_bytes(mut self, limit: u64) -> Self {
        self.max_buffered_bytes = Some(limit);
        self
    }

    /// Set the `maxNodes` ceiling.
    #[must_use]
    pub const fn with_max_nodes(mut self, limit: u64) -> Self {
        self.max_nodes = Some(limit);
        self
    }

    /// Set the `maxDepth` ceiling.
    #[must_use]
    pub const fn with_max_depth(mut self, limit: u64) -> Self {
        self.max_depth = Some(limit);
        self
    }

    /// Set the `maxTraceEvents` ceiling.
    #[must_use]
    pub const fn with_max_trace_events(mut self, limit: u64) -> Self {
        self.max_trace_events = Some(limit);
        self
    }

    /// Set the `maxTraceBytes` ceiling.
    #[must_use]
    pub const fn with_max_trace_bytes(mut self, limit: u64) -> Self {
        self.max_trace_bytes = Some(limit);
        self
    }

    /// Set the `maxTimeMs` ceiling.
    #[must_use]
    pub const fn with_max_time_ms(mut self, limit: u64) -> Self {
        self.max_time_ms = Some(limit);
        self
    }

    /// The configured ceiling for `kind`, if any.
    #[must_use]
    pub const fn limit(&self, kind: BudgetKind) -> Option<u64> {
        match kind {
            BudgetKind::MaxInputBytes => self.max_input_bytes,
            BudgetKind::MaxBufferedBytes => self.max_buffered_bytes,
            BudgetKind::MaxNodes => self.max_nodes,
            BudgetKind::MaxDepth => self.max_depth,
            BudgetKind::MaxTraceEvents => self.max_trace_events,
            BudgetKind::MaxTraceBytes => self.max_trace_bytes,
            BudgetKind::MaxTimeMs => self.max_time_ms,
        }
    }

    /// Fail if `actual` is above the ceiling for `kind`.
    ///
    /// # Errors
    /// Returns [`BudgetExceeded`] when `actual` exceeds the configured limit.
    pub fn check(&self, kind: BudgetKind, actual: u64) -> Result<(), BudgetExceeded> {
        match self.limit(kind) {
            Some(limit) if actual > limit => Err(BudgetExceeded {
                budget: kind,
                limit,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

/// A checkpoint observed a value above its ceiling.
///
/// This aborts the in-flight call; the caller must retry with adjusted
/// budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("BUDGET_EXCEEDED: {budget} limit={limit} actual={actual}")]
pub struct BudgetExceeded {
    /// Which ceiling was breached.
    pub budget: BudgetKind,
    /// The configured ceiling.
    pub limit: u64,
    /// The value observed at the checkpoint.
    pub actual: u64,
}

impl BudgetExceeded {
    /// Stable identifier for this failure class.
    pub const CODE: &'static str = "BUDGET_EXCEEDED";

    /// See [`Self::CODE`].
    #[must_use]
    pub const fn code(&self) -> &'static str {
        Self::CODE
    }
}

/// Counters for one call, checked against its [`Budgets`].
#[derive(Debug, Clone)]
pub struct BudgetMeter {
    budgets: Budgets,
    started: Instant,
    nodes: u64,
}

impl BudgetMeter {
    /// Start metering now.
    #[must_use]
    pub fn new(budgets: Budgets) -> Self {
        Self::started_at(budgets, Instant::now())
    }

    /// Meter a call that began at `started`; `maxTimeMs` counts from there.
    #[must_use]
    pub const fn started_at(budgets: Budgets, started: Instant) -> Self {
        Self {
            budgets,
            started,
            nodes: 0,
        }
    }

    /// The ceilings this meter enforces.
    #[must_use]
    pub const fn budgets(&self) -> &Budgets {
        &self.budgets
    }

    /// Nodes recorded so far.
    #[must_use]
    pub const fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Time since the meter was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Checkpoint: total input bytes accepted so far.
    ///
    /// # Errors
    /// Fails with `maxInputBytes` when `total` exceeds the ceiling.
    pub fn check_input_bytes(&self, total: usize) -> Result<(), BudgetExceeded> {
        self.budgets.check(BudgetKind::MaxInputBytes, saturating_u64(total))
    }

    /// Checkpoint: bytes currently buffered ahead of encoding resolution.
    ///
    /// # Errors
    /// Fails with `maxBufferedBytes` when `buffered` exceeds the ceiling.
    pub fn check_buffered_bytes(&self, buffered: usize) -> Result<(), BudgetExceeded> {
        self.budgets
            .check(BudgetKind::MaxBufferedBytes, saturating_u64(buffered))
    }

    /// Checkpoint: one more node was created.
    ///
    /// # Errors
    /// Fails with `maxNodes` when the running count exceeds the ceiling.
    pub fn record_node(&mut self) -> Result<(), BudgetExceeded> {
        self.nodes += 1;
        self.budgets.check(BudgetKind::MaxNodes, self.nodes)
    }

    /// Checkpoint: the stack of open elements reached `depth`.
    ///
    /// # Errors
    /// Fails with `maxDepth` when `depth` exceeds the ceiling.
    pub fn check_depth(&self, depth: usize) -> Result<(), BudgetExceeded> {
        self.budgets.check(BudgetKind::MaxDepth, saturating_u64(depth))
    }

    /// Checkpoint: wall-clock time.
    ///
    /// # Errors
    /// Fails with `maxTimeMs` when the elapsed milliseconds exceed the ceiling.
    pub fn check_time(&self) -> Result<(), BudgetExceeded> {
        if self.budgets.max_time_ms.is_none() {
            return Ok(());
        }
        let elapsed = u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.budgets.check(BudgetKind::MaxTimeMs, elapsed)
    }
}

impl Default for BudgetMeter {
    fn default() -> Self {
        Self::new(Budgets::default())
    }
}

fn saturating_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_budget_never_fails() {
        let budgets = Budgets::default();
        assert!(budgets.check(BudgetKind::MaxNodes, u64::MAX).is_ok());
    }

    #[test]
    fn test_limit_is_inclusive() {
        let budgets = Budgets::default().with_max_depth(3);
        assert!(budgets.check(BudgetKind::MaxDepth, 3).is_ok());
        let err = budgets.check(BudgetKind::MaxDepth, 4).unwrap_err();
        assert_eq!(err.budget, BudgetKind::MaxDepth);
        assert_eq!(err.limit, 3);
        assert_eq!(err.actual, 4);
    }

    #[test]
    fn test_record_node_counts_up() {
        let mut meter = BudgetMeter::new(Budgets::default().with_max_nodes(2));
        assert!(meter.record_node().is_ok());
        assert!(meter.record_node().is_ok());
        let err = meter.record_node().unwrap_err();
        assert_eq!(err.actual, 3);
        assert_eq!(meter.nodes(), 3);
    }

    #[test]
    fn test_error_message_names_budget() {
        let err = BudgetExceeded {
            budget: BudgetKind::MaxInputBytes,
            limit: 10,
            actual: 11,
        };
        assert_eq!(
            err.to_string(),
            "BUDGET_EXCEEDED: maxInputBytes limit=10 actual=11"
        );
        assert_eq!(err.code(), "BUDGET_EXCEEDED");
    }

    #[test]
    fn test_budget_kind_parses_from_name() {
        let kind: BudgetKind = "maxTraceBytes".parse().unwrap();
        assert_eq!(kind, BudgetKind::MaxTraceBytes);
    }
}
