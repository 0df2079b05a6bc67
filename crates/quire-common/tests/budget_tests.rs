//! Tests for budget configuration and trace serialization shapes.

use std::time::{Duration, Instant};

use quire_common::{BudgetKind, BudgetMeter, Budgets, Phase, TraceEvent, TraceLog};

#[test]
fn test_budgets_deserialize_from_camel_case() {
    let budgets: Budgets =
        serde_json::from_str(r#"{"maxDepth": 64, "maxTimeMs": 250}"#).unwrap();
    assert_eq!(budgets.max_depth, Some(64));
    assert_eq!(budgets.max_time_ms, Some(250));
    assert_eq!(budgets.max_nodes, None);
}

#[test]
fn test_budgets_serialize_field_names() {
    let json = serde_json::to_value(Budgets::default().with_max_input_bytes(1024)).unwrap();
    assert_eq!(json["maxInputBytes"], 1024);
    assert!(json["maxBufferedBytes"].is_null());
}

#[test]
fn test_budget_kind_display_matches_config_key() {
    assert_eq!(BudgetKind::MaxBufferedBytes.to_string(), "maxBufferedBytes");
    assert_eq!(BudgetKind::MaxDepth.to_string(), "maxDepth");
}

#[test]
fn test_trace_event_json_shape() {
    let event = TraceEvent::ModeTransition {
        from_mode: "in-body",
        to_mode: "in-table",
        token_kind: "start-tag",
        tag: Some("table".to_string()),
        offset: Some(12),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "modeTransition");
    assert_eq!(json["fromMode"], "in-body");
    assert_eq!(json["toMode"], "in-table");
    assert_eq!(json["offset"], 12);
}

#[test]
fn test_trace_log_unbounded_keeps_order() {
    let mut log = TraceLog::new(Budgets::default());
    for phase in [Phase::Sniff, Phase::Decode, Phase::TreeConstruction] {
        log.push(TraceEvent::PhaseStart { phase }).unwrap();
    }
    let phases: Vec<_> = log
        .events()
        .iter()
        .map(|event| match event {
            TraceEvent::PhaseStart { phase } => *phase,
            other => panic!("unexpected event {other}"),
        })
        .collect();
    assert_eq!(phases, [Phase::Sniff, Phase::Decode, Phase::TreeConstruction]);
}

#[test]
fn test_time_budget_breach_reports_elapsed() {
    let started = Instant::now().checked_sub(Duration::from_secs(10)).unwrap();
    let meter = BudgetMeter::started_at(Budgets::default().with_max_time_ms(1000), started);
    let exceeded = meter.check_time().unwrap_err();
    assert_eq!(exceeded.budget, BudgetKind::MaxTimeMs);
    assert_eq!(exceeded.limit, 1000);
    assert!(exceeded.actual >= 10_000, "{}", exceeded.actual);

    // No ceiling, no failure.
    assert!(BudgetMeter::started_at(Budgets::default(), started).check_time().is_ok());
}
