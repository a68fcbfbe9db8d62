//! The gate: one evaluation pipeline per tool call.
//!
//! Scoring, review, routing, and audit are wired together here. Every
//! path out of [`Gate::evaluate`] produces a [`GuardDecision`] and
//! exactly one audit entry; audit failures are swallowed by the sink and
//! can never change the outcome.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use warden_audit::{AuditEntry, AuditRecord, AuditSink};
use warden_config::SensitivityProfile;
use warden_core::{AmbientContext, SessionId, ToolCall};

use crate::error::GuardResult;
use crate::reviewer::{consult, ReviewRequest, Reviewer};
use crate::router::{self, Escalation, GuardDecision};
use crate::rules::RuleSet;
use crate::scorer;

/// Delivers an escalation prompt to a human and returns the raw reply.
#[async_trait]
pub trait EscalationHandler: Send + Sync {
    /// Present the prompt and wait for a reply.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the gate treats a failed handler like
    /// an expired escalation.
    async fn prompt(&self, prompt: &str) -> GuardResult<String>;
}

/// The risk gate for one session.
pub struct Gate {
    profile: Arc<SensitivityProfile>,
    reviewer: Arc<dyn Reviewer>,
    sink: Arc<dyn AuditSink>,
    rules: RuleSet,
    session_id: SessionId,
}

impl Gate {
    /// Build a gate over a validated profile.
    ///
    /// # Errors
    ///
    /// Fails if the profile is invalid or an auto-rule pattern does not
    /// compile. Both are load-time conditions; a constructed gate never
    /// fails mid-decision.
    pub fn new(
        profile: Arc<SensitivityProfile>,
        reviewer: Arc<dyn Reviewer>,
        sink: Arc<dyn AuditSink>,
        session_id: SessionId,
    ) -> GuardResult<Self> {
        profile.validate()?;
        let rules = RuleSet::compile(&profile.guard.auto_rules)?;
        Ok(Self {
            profile,
            reviewer,
            sink,
            rules,
            session_id,
        })
    }

    /// Evaluate one tool call.
    ///
    /// The pipeline short-circuits in order: operator emergency bypass,
    /// then the per-tool low-risk threshold, then reviewer consultation
    /// and confidence routing. Exactly one audit entry is written.
    pub async fn evaluate(&self, call: &ToolCall, context: &AmbientContext) -> GuardDecision {
        if let Some(reason) = &context.emergency_bypass {
            if reason.trim().is_empty() {
                tracing::warn!(tool = %call.name, "emergency bypass without reason ignored");
            } else {
                let decision = GuardDecision::emergency_bypass(reason.trim());
                self.record(call, &decision);
                return decision;
            }
        }

        let assessment = scorer::assess(call, context, &self.profile.guard.weights);
        let threshold = self.profile.guard.thresholds.for_kind(call.kind());

        if assessment.score < threshold {
            let decision = GuardDecision::below_threshold(&assessment);
            self.record(call, &decision);
            return decision;
        }

        let request = ReviewRequest {
            tool_call: call.clone(),
            risk_score: assessment.score,
            factors: assessment.factors.clone(),
            recent_context: context.recent.iter().map(String::from).collect(),
            goals: context.goals.clone(),
        };
        let timeout = Duration::from_secs(self.profile.guard.reviewer_timeout_secs);
        let judgment = consult(self.reviewer.as_ref(), &request, timeout).await;

        let decision = router::route(call, &assessment, &judgment, &self.rules);
        self.record(call, &decision);
        decision
    }

    /// Evaluate a call and, when it escalates, drive the escalation to
    /// resolution through `handler` under `patience`.
    ///
    /// Unclear replies re-prompt. A handler failure or an expired wait
    /// leaves the decision escalated. Resolution (or timeout) writes its
    /// own audit entry in addition to the evaluation entry.
    pub async fn evaluate_with_handler(
        &self,
        call: &ToolCall,
        context: &AmbientContext,
        handler: &dyn EscalationHandler,
        patience: Duration,
    ) -> GuardDecision {
        let decision = self.evaluate(call, context).await;
        if decision.is_terminal() {
            return decision;
        }

        // An internal bookkeeping failure leaves the already-audited
        // escalation standing; it never upgrades the outcome.
        let mut escalation = match Escalation::new(decision.clone()) {
            Ok(escalation) => escalation,
            Err(error) => {
                tracing::error!(%error, "escalation bookkeeping failed");
                return decision;
            },
        };
        let prompt = escalation
            .decision()
            .escalation_prompt
            .clone()
            .unwrap_or_default();

        let outcome = tokio::time::timeout(patience, async {
            loop {
                let reply = match handler.prompt(&prompt).await {
                    Ok(reply) => reply,
                    Err(error) => {
                        tracing::warn!(%error, "escalation handler failed");
                        return false;
                    },
                };
                match escalation.resolve(&reply) {
                    Ok(updated) if updated.is_terminal() => return true,
                    Ok(_) => {},
                    Err(error) => {
                        // Reasonless bypass: re-prompt with state unchanged.
                        tracing::debug!(%error, "reply not accepted");
                    },
                }
            }
        })
        .await;

        match outcome {
            Ok(true) => {},
            Ok(false) | Err(_) => {
                if let Err(error) = escalation.time_out() {
                    tracing::error!(%error, "escalation bookkeeping failed");
                }
            },
        }

        let resolved = escalation.decision().clone();
        self.record(call, &resolved);
        resolved
    }

    /// Feed a reply into a parked escalation and audit a terminal
    /// outcome.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::GuardError::EmptyBypassReason`] and
    /// [`crate::GuardError::AlreadyResolved`] without writing audit.
    pub fn resolve_escalation(
        &self,
        call: &ToolCall,
        escalation: &mut Escalation,
        reply: &str,
    ) -> GuardResult<GuardDecision> {
        let decision = escalation.resolve(reply)?.clone();
        if decision.is_terminal() {
            self.record(call, &decision);
        }
        Ok(decision)
    }

    /// The profile this gate was built over.
    #[must_use]
    pub fn profile(&self) -> &SensitivityProfile {
        &self.profile
    }

    fn record(&self, call: &ToolCall, decision: &GuardDecision) {
        tracing::info!(
            decision = %decision.id,
            tool = %call.name,
            action = %decision.action,
            risk_score = decision.risk_score,
            "gate decision"
        );

        let target = call.target();
        let record = AuditRecord::Gate {
            decision_id: decision.id.clone(),
            tool: call.name.clone(),
            target: (!target.is_empty()).then(|| target.to_string()),
            action: decision.action.into(),
            reason: decision.reason.clone(),
            risk_score: decision.risk_score,
            factors: decision.factors.clone(),
            reviewer_confidence: decision.reviewer_confidence,
            user_decision: decision.user_decision.map(|d| d.to_string()),
            bypass_reason: decision.bypass_reason.clone(),
        };
        self.sink
            .append(&AuditEntry::new(self.session_id.clone(), record));
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("session_id", &self.session_id)
            .field("sensitivity", &self.profile.sensitivity)
            .finish_non_exhaustive()
    }
}
