//! Ordered, append-only trace of parse phases and insertion-mode transitions.
//!
//! Trace events are data for external observers. Recording them never
//! changes what a parse constructs; it can only fail the call when the
//! trace budgets are exceeded.

use std::fmt;

use serde::Serialize;
use strum_macros::{Display, IntoStaticStr};

use crate::budget::{BudgetExceeded, BudgetKind, Budgets};

/// A pipeline phase bracketed by [`TraceEvent::PhaseStart`] / [`TraceEvent::PhaseEnd`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Encoding detection over raw bytes.
    Sniff,
    /// Byte-to-text decoding.
    Decode,
    /// Standalone tokenization.
    Tokenize,
    /// Tokenizer pulled by the tree constructor.
    TreeConstruction,
    /// Pre-order id and span assignment.
    Assign,
}

/// One observable step of a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TraceEvent {
    /// A phase began.
    PhaseStart {
        /// The phase.
        phase: Phase,
    },
    /// A phase completed.
    PhaseEnd {
        /// The phase.
        phase: Phase,
    },
    /// Encoding sniffing settled on a label.
    #[serde(rename_all = "camelCase")]
    EncodingResolved {
        /// Canonical encoding name.
        encoding: &'static str,
        /// Which precedence tier decided it.
        source: &'static str,
    },
    /// The tree constructor switched insertion mode.
    #[serde(rename_all = "camelCase")]
    ModeTransition {
        /// Mode before the switch.
        from_mode: &'static str,
        /// Mode after the switch.
        to_mode: &'static str,
        /// Kind of the token being processed.
        token_kind: &'static str,
        /// Tag name, for tag tokens.
        tag: Option<String>,
        /// Source offset of the token, when known.
        offset: Option<usize>,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseStart { phase } => write!(f, "phase-start {phase}"),
            Self::PhaseEnd { phase } => write!(f, "phase-end {phase}"),
            Self::EncodingResolved { encoding, source } => {
                write!(f, "encoding {encoding} from {source}")
            }
            Self::ModeTransition {
                from_mode,
                to_mode,
                token_kind,
                tag,
                offset,
            } => {
                write!(f, "mode {from_mode} -> {to_mode} on {token_kind}")?;
                if let Some(tag) = tag {
                    write!(f, " <{tag}>")?;
                }
                if let Some(offset) = offset {
                    write!(f, " @{offset}")?;
                }
                Ok(())
            }
        }
    }
}

/// Append-only trace bounded by `maxTraceEvents` / `maxTraceBytes`.
///
/// The byte size of an event is the UTF-8 length of its `Display` form.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
    bytes: u64,
    budgets: Budgets,
}

impl TraceLog {
    /// An empty log enforcing the trace ceilings in `budgets`.
    #[must_use]
    pub fn new(budgets: Budgets) -> Self {
        Self {
            events: Vec::new(),
            bytes: 0,
            budgets,
        }
    }

    /// Append `event`.
    ///
    /// # Errors
    /// Fails with `maxTraceEvents` or `maxTraceBytes` when the event would
    /// push the log past either ceiling. The event is not recorded.
    pub fn push(&mut self, event: TraceEvent) -> Result<(), BudgetExceeded> {
        let count = u64::try_from(self.events.len() + 1).unwrap_or(u64::MAX);
        self.budgets.check(BudgetKind::MaxTraceEvents, count)?;

        let size = u64::try_from(event.to_string().len()).unwrap_or(u64::MAX);
        let bytes = self.bytes.saturating_add(size);
        self.budgets.check(BudgetKind::MaxTraceBytes, bytes)?;

        self.bytes = bytes;
        self.events.push(event);
        Ok(())
    }

    /// Events recorded so far, in order.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Cumulative rendered size of recorded events.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Consume the log, yielding its events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_count_ceiling() {
        let mut log = TraceLog::new(Budgets::default().with_max_trace_events(1));
        assert!(log.push(TraceEvent::PhaseStart { phase: Phase::Decode }).is_ok());
        let err = log
            .push(TraceEvent::PhaseEnd { phase: Phase::Decode })
            .unwrap_err();
        assert_eq!(err.budget, BudgetKind::MaxTraceEvents);
        assert_eq!(err.actual, 2);
        assert_eq!(log.events().len(), 1);
    }

    #[test]
    fn test_byte_ceiling_uses_display_length() {
        let event = TraceEvent::PhaseStart { phase: Phase::Sniff };
        let size = event.to_string().len() as u64;
        let mut log = TraceLog::new(Budgets::default().with_max_trace_bytes(size));
        assert!(log.push(event.clone()).is_ok());
        assert_eq!(log.bytes(), size);
        assert!(log.push(event).is_err());
    }

    #[test]
    fn test_mode_transition_display() {
        let event = TraceEvent::ModeTransition {
            from_mode: "initial",
            to_mode: "before-html",
            token_kind: "start-tag",
            tag: Some("p".to_string()),
            offset: Some(0),
        };
        assert_eq!(event.to_string(), "mode initial -> before-html on start-tag <p> @0");
    }
}
