//! Audit entry types and records.
//!
//! Every terminal gate decision and every trigger evaluation is recorded
//! as exactly one entry. Entries carry the evidence behind the decision
//! (score, factors, reviewer confidence) alongside the outcome, so the
//! trail can answer "why" without replaying the engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{DecisionId, RiskFactor, SessionId, Timestamp};

/// Unique identifier for an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(pub Uuid);

impl AuditEntryId {
    /// Generate a new random entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "audit:{}", self.0)
    }
}

/// The outcome a gate arrived at for one tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditedAction {
    /// The call was allowed.
    Approve,
    /// The call was blocked.
    Reject,
    /// The call is parked awaiting a human reply.
    Escalate,
    /// A human overrode the engine with a recorded reason.
    Bypass,
}

impl std::fmt::Display for AuditedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
            Self::Escalate => write!(f, "escalate"),
            Self::Bypass => write!(f, "bypass"),
        }
    }
}

/// What was decided, with the evidence behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditRecord {
    /// A gate routed one tool call to a terminal or escalated outcome.
    Gate {
        /// Decision this record belongs to.
        decision_id: DecisionId,
        /// Tool name as submitted.
        tool: String,
        /// Resolved target (path, command, URL), if any.
        target: Option<String>,
        /// The outcome.
        action: AuditedAction,
        /// Human-readable reason for the outcome.
        reason: String,
        /// Bounded risk score in `[0, 1]`.
        risk_score: f64,
        /// Factors that contributed to the score.
        factors: Vec<RiskFactor>,
        /// Reviewer confidence, when a reviewer was consulted.
        reviewer_confidence: Option<f64>,
        /// How the human answered an escalation
        /// (`approved`/`rejected`/`bypassed`/`pending`), when a reply
        /// arrived.
        user_decision: Option<String>,
        /// Mandatory reason attached to a bypass.
        bypass_reason: Option<String>,
    },

    /// A trigger evaluation over one task context.
    Trigger {
        /// Decision this record belongs to.
        decision_id: DecisionId,
        /// Whether parallel execution was recommended.
        parallelize: bool,
        /// Whether a guard check was forced.
        guard: bool,
        /// Whether a pre-commit review was forced.
        review: bool,
        /// Fragment-joined reasoning behind the flags.
        reasoning: String,
        /// Confidence in the evaluation, in `[0, 1]`.
        confidence: f64,
    },
}

impl AuditRecord {
    /// Short human-readable description of the record.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Gate {
                tool,
                action,
                risk_score,
                ..
            } => {
                format!("{action} {tool} (risk {risk_score:.2})")
            },
            Self::Trigger {
                parallelize,
                guard,
                review,
                ..
            } => {
                format!("triggers: parallelize={parallelize} guard={guard} review={review}")
            },
        }
    }
}

/// A single entry in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: AuditEntryId,
    /// When this entry was created.
    pub timestamp: Timestamp,
    /// Session this entry belongs to.
    pub session_id: SessionId,
    /// The decision being recorded.
    pub record: AuditRecord,
}

impl AuditEntry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(session_id: SessionId, record: AuditRecord) -> Self {
        Self {
            id: AuditEntryId::new(),
            timestamp: Timestamp::now(),
            session_id,
            record,
        }
    }

    /// A copy with free-text fields blanked, for export outside the
    /// trust boundary. Scores, factors, and outcomes survive; reasons
    /// and bypass justifications do not.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut entry = self.clone();
        match &mut entry.record {
            AuditRecord::Gate {
                reason,
                bypass_reason,
                ..
            } => {
                *reason = REDACTED.to_string();
                if bypass_reason.is_some() {
                    *bypass_reason = Some(REDACTED.to_string());
                }
            },
            AuditRecord::Trigger { reasoning, .. } => {
                *reasoning = REDACTED.to_string();
            },
        }
        entry
    }
}

const REDACTED: &str = "[redacted]";
