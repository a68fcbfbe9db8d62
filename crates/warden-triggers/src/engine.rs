//! The trigger combinator.
//!
//! Three independent predicates over one [`TaskContext`]: parallelize,
//! guard, review. Firing one never influences another; the only shared
//! input is the context itself. Each evaluation writes exactly one
//! audit entry.

use std::sync::Arc;

use warden_audit::{AuditEntry, AuditRecord, AuditSink};
use warden_config::{SensitivityProfile, TriggerSettings};
use warden_core::{DecisionId, SessionId};

use crate::context::TaskContext;

/// The combined outcome of one trigger evaluation.
#[derive(Debug, Clone)]
pub struct TriggerDecision {
    /// Unique decision ID.
    pub id: DecisionId,
    /// Recommend splitting the task across parallel workers.
    pub parallelize: bool,
    /// Force the task's tool calls through the guard.
    pub guard: bool,
    /// Force a pre-commit review.
    pub review: bool,
    /// Fragment-joined explanation of every flag that fired.
    pub reasoning: String,
    /// Confidence in the evaluation: `1 - uncertainty`.
    pub confidence: f64,
}

/// Evaluates trigger predicates under one sensitivity profile.
pub struct TriggerEngine {
    profile: Arc<SensitivityProfile>,
    sink: Arc<dyn AuditSink>,
    session_id: SessionId,
}

impl TriggerEngine {
    /// Build an engine over a profile.
    #[must_use]
    pub fn new(
        profile: Arc<SensitivityProfile>,
        sink: Arc<dyn AuditSink>,
        session_id: SessionId,
    ) -> Self {
        Self {
            profile,
            sink,
            session_id,
        }
    }

    /// Evaluate all three predicates for one task.
    ///
    /// `active_workers` is the number of workers currently running;
    /// parallelization is withheld at capacity even when the evidence
    /// supports it.
    #[must_use]
    pub fn evaluate(&self, ctx: &TaskContext, active_workers: usize) -> TriggerDecision {
        let settings = &self.profile.triggers;

        let evidence = parallelize_evidence(ctx, settings);
        let has_capacity = active_workers < settings.max_workers;
        let parallelize = evidence && has_capacity;
        let guard = should_guard(ctx, settings);
        let review = should_review(ctx, settings);

        let mut fragments = Vec::new();
        if parallelize {
            fragments.push(format!(
                "parallelize: complexity={}, files={}, uncertainty={:.2}",
                ctx.complexity, ctx.impact_files, ctx.uncertainty
            ));
        } else if evidence {
            fragments.push(format!(
                "parallelize withheld: {active_workers}/{} workers busy",
                settings.max_workers
            ));
        }
        if guard {
            fragments.push(format!("guard: {}", guard_reasons(ctx, settings)));
        }
        if review {
            fragments.push(format!(
                "review: files={}, operation={}",
                ctx.impact_files, ctx.operation
            ));
        }

        let decision = TriggerDecision {
            id: DecisionId::new(),
            parallelize,
            guard,
            review,
            reasoning: fragments.join(" | "),
            confidence: (1.0 - ctx.uncertainty).clamp(0.0, 1.0),
        };

        tracing::debug!(
            decision = %decision.id,
            parallelize = decision.parallelize,
            guard = decision.guard,
            review = decision.review,
            "trigger evaluation"
        );
        self.record(&decision);
        decision
    }

    fn record(&self, decision: &TriggerDecision) {
        let record = AuditRecord::Trigger {
            decision_id: decision.id.clone(),
            parallelize: decision.parallelize,
            guard: decision.guard,
            review: decision.review,
            reasoning: decision.reasoning.clone(),
            confidence: decision.confidence,
        };
        self.sink
            .append(&AuditEntry::new(self.session_id.clone(), record));
    }
}

impl std::fmt::Debug for TriggerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerEngine")
            .field("sensitivity", &self.profile.sensitivity)
            .finish_non_exhaustive()
    }
}

/// Parallelization needs at least two of: complexity above threshold,
/// file count above threshold, uncertainty below threshold. No single
/// signal is enough.
fn parallelize_evidence(ctx: &TaskContext, settings: &TriggerSettings) -> bool {
    let thresholds = &settings.parallelize;
    let hits = [
        ctx.complexity > thresholds.complexity,
        ctx.impact_files > thresholds.impact_files,
        ctx.uncertainty < thresholds.uncertainty,
    ];
    hits.iter().filter(|hit| **hit).count() >= 2
}

fn pattern_forced(ctx: &TaskContext, settings: &TriggerSettings) -> bool {
    ctx.patterns.iter().any(|pattern| {
        settings
            .guard
            .always_check_patterns
            .iter()
            .any(|check| pattern.contains(check.as_str()))
    })
}

/// Guard fires on a configured risk level, an always-check pattern, or
/// any scope flag.
fn should_guard(ctx: &TaskContext, settings: &TriggerSettings) -> bool {
    settings.guard.risk_levels.contains(&ctx.risk_level)
        || pattern_forced(ctx, settings)
        || ctx.scope.any()
}

/// Review fires on enough touched files or a configured operation kind.
fn should_review(ctx: &TaskContext, settings: &TriggerSettings) -> bool {
    ctx.impact_files >= settings.review.min_files_changed
        || settings.review.operations.contains(&ctx.operation)
}

fn guard_reasons(ctx: &TaskContext, settings: &TriggerSettings) -> String {
    let mut reasons = Vec::new();
    if settings.guard.risk_levels.contains(&ctx.risk_level) {
        reasons.push(format!("risk={}", ctx.risk_level));
    }
    if !ctx.patterns.is_empty() && pattern_forced(ctx, settings) {
        reasons.push(format!("patterns=[{}]", ctx.patterns.join(", ")));
    }
    if ctx.scope.outside_workspace {
        reasons.push("scope:workspace".to_string());
    }
    if ctx.scope.system_paths {
        reasons.push("scope:system".to_string());
    }
    if ctx.scope.credentials {
        reasons.push("scope:credentials".to_string());
    }
    reasons.join(", ")
}
