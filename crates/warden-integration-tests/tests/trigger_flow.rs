//! Trigger combinator behavior from raw task descriptions through to
//! audit records, including how the sensitivity presets disagree.

mod common;

use std::sync::Arc;

use common::{call, judgment, workspace_context, StaticReviewer};
use serde_json::json;
use warden_audit::{AuditRecord, MemoryAuditSink};
use warden_config::{Sensitivity, SensitivityProfile};
use warden_core::{Operation, RiskLevel, SessionId};
use warden_guard::Gate;
use warden_triggers::{analyze, DiffStats, ScopeFlags, TaskContext, TriggerEngine};

fn engine(sensitivity: Sensitivity) -> (TriggerEngine, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::new());
    let engine = TriggerEngine::new(
        Arc::new(SensitivityProfile::preset(sensitivity)),
        sink.clone(),
        SessionId::new(),
    );
    (engine, sink)
}

#[test]
fn analyzed_refactor_fires_all_three() {
    let diff = DiffStats {
        files_changed: 8,
        lines_added: 600,
        lines_removed: 200,
    };
    let ctx = analyze(
        "refactor the auth module across the services",
        Some(&diff),
        Some(0.9),
    );

    assert_eq!(ctx.operation, Operation::Refactor);
    assert_eq!(ctx.risk_level, RiskLevel::High);
    assert!(ctx.patterns.contains(&"auth".to_string()));
    assert_eq!(ctx.impact_files, 8);

    let (engine, sink) = engine(Sensitivity::Balanced);
    let decision = engine.evaluate(&ctx, 0);

    assert!(decision.parallelize);
    assert!(decision.guard);
    assert!(decision.review);
    assert!((decision.confidence - 0.9).abs() < 1e-9);
    assert_eq!(sink.len(), 1);
}

#[test]
fn trivial_fix_fires_nothing() {
    let ctx = analyze("fix typo in readme", None, None);
    assert_eq!(ctx.operation, Operation::Fix);
    assert_eq!(ctx.risk_level, RiskLevel::Low);

    let (engine, _) = engine(Sensitivity::Balanced);
    let decision = engine.evaluate(&ctx, 0);

    assert!(!decision.parallelize);
    assert!(!decision.guard);
    assert!(!decision.review);
    assert!(decision.reasoning.is_empty());
}

#[test]
fn presets_disagree_on_parallelization() {
    // Mid-size, fairly certain task: enough for aggressive thresholds,
    // not for conservative ones.
    let ctx = TaskContext {
        complexity: 6,
        impact_files: 4,
        uncertainty: 0.35,
        risk_level: RiskLevel::Low,
        operation: Operation::Other,
        patterns: Vec::new(),
        scope: ScopeFlags::default(),
    };

    let (aggressive, _) = engine(Sensitivity::Aggressive);
    assert!(aggressive.evaluate(&ctx, 0).parallelize);

    let (conservative, _) = engine(Sensitivity::Conservative);
    assert!(!conservative.evaluate(&ctx, 0).parallelize);
}

#[test]
fn conservative_worker_cap_is_tighter() {
    let ctx = TaskContext {
        complexity: 10,
        impact_files: 9,
        uncertainty: 0.4,
        risk_level: RiskLevel::Low,
        operation: Operation::Other,
        patterns: Vec::new(),
        scope: ScopeFlags::default(),
    };

    let (conservative, _) = engine(Sensitivity::Conservative);
    assert!(conservative.evaluate(&ctx, 0).parallelize);

    // Two busy workers saturate the conservative cap.
    let decision = conservative.evaluate(&ctx, 2);
    assert!(!decision.parallelize);
    assert!(decision.reasoning.contains("withheld"));

    let (balanced, _) = engine(Sensitivity::Balanced);
    assert!(balanced.evaluate(&ctx, 2).parallelize);
}

#[test]
fn critical_language_guards_under_every_preset() {
    let ctx = analyze("drop table users and rebuild the schema", None, None);
    assert_eq!(ctx.risk_level, RiskLevel::Critical);

    for sensitivity in [
        Sensitivity::Aggressive,
        Sensitivity::Balanced,
        Sensitivity::Conservative,
    ] {
        let (engine, _) = engine(sensitivity);
        assert!(engine.evaluate(&ctx, 0).guard, "{sensitivity:?} must guard");
    }
}

#[tokio::test]
async fn gate_and_trigger_share_one_audit_trail() {
    let sink = Arc::new(MemoryAuditSink::new());
    let profile = Arc::new(SensitivityProfile::preset(Sensitivity::Balanced));

    let gate = Gate::new(
        profile.clone(),
        Arc::new(StaticReviewer(judgment(true, 0.95))),
        sink.clone(),
        SessionId::new(),
    )
    .expect("gate builds");
    let engine = TriggerEngine::new(profile, sink.clone(), SessionId::new());

    gate.evaluate(
        &call("exec", json!({"command": "git status"})),
        &workspace_context(),
    )
    .await;
    let trigger = engine.evaluate(&analyze("refactor the auth module", None, None), 0);
    assert!(trigger.guard);
    assert!(trigger.review);

    let entries = sink.entries();
    assert_eq!(entries.len(), 2);
    assert!(matches!(entries[0].record, AuditRecord::Gate { .. }));
    assert!(matches!(entries[1].record, AuditRecord::Trigger { .. }));
}
