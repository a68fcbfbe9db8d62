//! Decision routing: reviewer confidence bands, escalation, and the
//! human-reply state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_audit::AuditedAction;
use warden_core::{DecisionId, RiskFactor, Timestamp, ToolCall, ToolKind};

use crate::error::{GuardError, GuardResult};
use crate::reviewer::ReviewerJudgment;
use crate::rules::RuleSet;
use crate::scorer::RiskAssessment;

/// Reviewer confidence at or above which its verdict is mirrored
/// directly.
pub const HIGH_CONFIDENCE: f64 = 0.9;

/// Reviewer confidence at or above which an escalation carries the
/// reviewer's own analysis rather than a conservative warning.
pub const MEDIUM_CONFIDENCE: f64 = 0.5;

/// The gate's verdict on one tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardAction {
    /// Allow the call.
    Approve,
    /// Block the call.
    Reject,
    /// Park the call pending a human reply.
    Escalate,
    /// Human override with a recorded reason.
    Bypass,
}

impl fmt::Display for GuardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
            Self::Escalate => write!(f, "escalate"),
            Self::Bypass => write!(f, "bypass"),
        }
    }
}

impl From<GuardAction> for AuditedAction {
    fn from(action: GuardAction) -> Self {
        match action {
            GuardAction::Approve => Self::Approve,
            GuardAction::Reject => Self::Reject,
            GuardAction::Escalate => Self::Escalate,
            GuardAction::Bypass => Self::Bypass,
        }
    }
}

/// How the human answered an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDecision {
    /// Reply approved the operation.
    Approved,
    /// Reply rejected the operation.
    Rejected,
    /// Reply overrode the engine with a reason.
    Bypassed,
    /// Reply was not understood; the escalation stands.
    Pending,
}

impl fmt::Display for UserDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Bypassed => write!(f, "bypassed"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// The full outcome of one gate evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardDecision {
    /// Unique decision ID.
    pub id: DecisionId,
    /// The verdict.
    pub action: GuardAction,
    /// Human-readable reason; replies append to it with ` | `.
    pub reason: String,
    /// Bounded risk score.
    pub risk_score: f64,
    /// Factor occurrences behind the score.
    pub factors: Vec<RiskFactor>,
    /// Reviewer confidence, when a reviewer was consulted.
    pub reviewer_confidence: Option<f64>,
    /// Reviewer analysis, when a reviewer was consulted.
    pub reviewer_reasoning: Option<String>,
    /// Prompt shown to the human on escalation.
    pub escalation_prompt: Option<String>,
    /// How the human answered, once a reply arrived.
    pub user_decision: Option<UserDecision>,
    /// The raw reply as received.
    pub user_reply: Option<String>,
    /// Reason attached to a bypass.
    pub bypass_reason: Option<String>,
    /// When the decision was produced.
    pub logged_at: Timestamp,
}

impl GuardDecision {
    fn new(action: GuardAction, reason: impl Into<String>) -> Self {
        Self {
            id: DecisionId::new(),
            action,
            reason: reason.into(),
            risk_score: 0.0,
            factors: Vec::new(),
            reviewer_confidence: None,
            reviewer_reasoning: None,
            escalation_prompt: None,
            user_decision: None,
            user_reply: None,
            bypass_reason: None,
            logged_at: Timestamp::now(),
        }
    }

    /// An operator emergency bypass. Scoring is skipped entirely.
    #[must_use]
    pub fn emergency_bypass(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut decision = Self::new(
            GuardAction::Bypass,
            format!("emergency bypass: {reason}"),
        );
        decision.bypass_reason = Some(reason);
        decision
    }

    /// A low-risk approval that never reached the reviewer.
    #[must_use]
    pub fn below_threshold(assessment: &RiskAssessment) -> Self {
        let mut decision = Self::new(GuardAction::Approve, "risk score below threshold");
        decision.risk_score = assessment.score;
        decision.factors = assessment.factors.clone();
        decision
    }

    /// Whether the decision is terminal (no reply can change it).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.action != GuardAction::Escalate
    }
}

/// Route a reviewed call to its outcome.
///
/// Order matters: an auto-rule match is consulted first and approves
/// when the reviewer clears the rule's confidence bar. Otherwise the
/// reviewer's confidence band decides: high mirrors the verdict, medium
/// escalates with the reviewer's analysis, low escalates with a
/// conservative warning.
#[must_use]
pub fn route(
    call: &ToolCall,
    assessment: &RiskAssessment,
    judgment: &ReviewerJudgment,
    rules: &RuleSet,
) -> GuardDecision {
    let outcome = if let Some(rule) = rules.first_match(call) {
        if judgment.confidence >= rule.confidence {
            Some(GuardDecision::new(
                GuardAction::Approve,
                format!("auto-approved by pattern: {}", rule.pattern),
            ))
        } else {
            None
        }
    } else {
        None
    };

    let mut decision = outcome.unwrap_or_else(|| {
        if judgment.confidence >= HIGH_CONFIDENCE {
            let (action, verdict) = if judgment.approve {
                (GuardAction::Approve, "approved")
            } else {
                (GuardAction::Reject, "rejected")
            };
            GuardDecision::new(
                action,
                format!(
                    "reviewer {verdict} with high confidence ({:.2}): {}",
                    judgment.confidence, judgment.reasoning
                ),
            )
        } else if judgment.confidence >= MEDIUM_CONFIDENCE {
            let mut decision = GuardDecision::new(
                GuardAction::Escalate,
                format!(
                    "reviewer uncertain ({:.2}): {}",
                    judgment.confidence, judgment.reasoning
                ),
            );
            decision.escalation_prompt = Some(escalation_prompt(call, assessment, judgment));
            decision
        } else {
            let mut decision = GuardDecision::new(
                GuardAction::Escalate,
                format!(
                    "reviewer confidence low ({:.2}); escalating conservatively",
                    judgment.confidence
                ),
            );
            decision.escalation_prompt = Some(escalation_prompt(call, assessment, judgment));
            decision
        }
    });

    decision.risk_score = assessment.score;
    decision.factors = assessment.factors.clone();
    decision.reviewer_confidence = Some(judgment.confidence);
    decision.reviewer_reasoning = Some(judgment.reasoning.clone());
    decision
}

fn prompt_risk_label(score: f64) -> &'static str {
    if score > 0.8 {
        "HIGH"
    } else if score > 0.6 {
        "MEDIUM"
    } else {
        "LOW"
    }
}

/// Build the prompt shown to the human when a call escalates.
#[must_use]
pub fn escalation_prompt(
    call: &ToolCall,
    assessment: &RiskAssessment,
    judgment: &ReviewerJudgment,
) -> String {
    let mut prompt = String::new();
    prompt.push_str("security review required\n\n");
    prompt.push_str(&format!("operation: {}\n", call.name));
    prompt.push_str(&format!(
        "risk level: {} ({:.2})\n\n",
        prompt_risk_label(assessment.score),
        assessment.score
    ));

    prompt.push_str("risk factors:\n");
    let distinct = assessment.distinct_factors();
    if distinct.is_empty() {
        prompt.push_str("- none identified\n");
    } else {
        for factor in distinct {
            prompt.push_str(&format!("- {}\n", factor.label()));
        }
    }

    prompt.push_str(&format!("\nreviewer analysis:\n{}\n\n", judgment.reasoning));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::arithmetic_side_effects
    )]
    let percent = (judgment.confidence * 100.0).round() as u32;
    prompt.push_str(&format!("reviewer confidence: {percent}%\n"));
    prompt.push_str(&format!(
        "recommendation: {}\n",
        if judgment.approve {
            "likely safe"
        } else {
            "likely unsafe"
        }
    ));

    match call.kind() {
        ToolKind::MessageSend => {
            let target = call.param_str("target").unwrap_or("unknown");
            prompt.push_str(&format!("target: {target}\n"));
            if let Some(attachment) = call
                .param_str("file_path")
                .or_else(|| call.param_str("attachment"))
            {
                prompt.push_str(&format!("attachment: {attachment}\n"));
            }
        },
        ToolKind::FileWrite | ToolKind::FileEdit => {
            prompt.push_str(&format!("path: {}\n", call.target()));
        },
        ToolKind::Exec => {
            prompt.push_str(&format!(
                "command: {}\n",
                call.param_str("command").unwrap_or("")
            ));
        },
        ToolKind::Browser => {
            prompt.push_str(&format!("url: {}\n", call.param_str("url").unwrap_or("")));
            prompt.push_str(&format!(
                "action: {}\n",
                call.param_str("action").unwrap_or("")
            ));
        },
        ToolKind::Other => {},
    }

    prompt.push_str(
        "\nproceed? (yes/no/bypass)\n\
         - yes: approve this operation\n\
         - no: reject this operation\n\
         - bypass <reason>: emergency override, recorded in the audit trail\n",
    );
    prompt
}

/// Apply a human reply to an escalated decision, producing the updated
/// decision. The input decision is not mutated.
///
/// `yes`/`y` approves, `no`/`n` rejects, `bypass <reason>` overrides.
/// Anything else leaves the escalation standing with the raw reply
/// recorded.
///
/// # Errors
///
/// Returns [`GuardError::EmptyBypassReason`] for a bypass with no
/// reason; the escalation is unchanged.
pub fn apply_user_reply(decision: &GuardDecision, reply: &str) -> GuardResult<GuardDecision> {
    let normalized = reply.trim().to_lowercase();
    let mut updated = decision.clone();
    updated.user_reply = Some(reply.trim().to_string());

    match normalized.as_str() {
        "yes" | "y" => {
            updated.action = GuardAction::Approve;
            updated.user_decision = Some(UserDecision::Approved);
            updated.reason = format!("{} | user approved escalation", decision.reason);
            return Ok(updated);
        },
        "no" | "n" => {
            updated.action = GuardAction::Reject;
            updated.user_decision = Some(UserDecision::Rejected);
            updated.reason = format!("{} | user rejected escalation", decision.reason);
            return Ok(updated);
        },
        _ => {},
    }

    if let Some(rest) = normalized.strip_prefix("bypass") {
        if rest.trim().is_empty() {
            return Err(GuardError::EmptyBypassReason);
        }
        if rest.starts_with(char::is_whitespace) {
            let bypass_reason = rest.trim().to_string();
            updated.action = GuardAction::Bypass;
            updated.user_decision = Some(UserDecision::Bypassed);
            updated.reason = format!("{} | user bypassed: {bypass_reason}", decision.reason);
            updated.bypass_reason = Some(bypass_reason);
            return Ok(updated);
        }
    }

    updated.user_decision = Some(UserDecision::Pending);
    updated.reason = format!("{} | user reply unclear: \"{}\"", decision.reason, reply.trim());
    Ok(updated)
}

/// Resolution state of a parked escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    /// Waiting for a usable reply.
    Pending,
    /// A reply reached a terminal action.
    Resolved,
    /// The wait expired; the decision remains escalated.
    TimedOut,
}

/// A parked escalation that can be resolved exactly once.
#[derive(Debug, Clone)]
pub struct Escalation {
    decision: GuardDecision,
    state: EscalationState,
}

impl Escalation {
    /// Park an escalated decision.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::NotEscalated`] if the decision already
    /// reached a terminal action.
    pub fn new(decision: GuardDecision) -> GuardResult<Self> {
        if decision.action != GuardAction::Escalate {
            return Err(GuardError::NotEscalated {
                action: decision.action.to_string(),
            });
        }
        Ok(Self {
            decision,
            state: EscalationState::Pending,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EscalationState {
        self.state
    }

    /// The decision in its current form.
    #[must_use]
    pub fn decision(&self) -> &GuardDecision {
        &self.decision
    }

    /// Feed one human reply into the escalation.
    ///
    /// An unclear reply keeps the escalation pending; a usable one makes
    /// it resolved and terminal.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::AlreadyResolved`] after resolution or
    /// timeout, and [`GuardError::EmptyBypassReason`] for a reasonless
    /// bypass (state unchanged).
    pub fn resolve(&mut self, reply: &str) -> GuardResult<&GuardDecision> {
        if self.state != EscalationState::Pending {
            return Err(GuardError::AlreadyResolved);
        }
        let updated = apply_user_reply(&self.decision, reply)?;
        self.decision = updated;
        if self.decision.is_terminal() {
            self.state = EscalationState::Resolved;
        }
        Ok(&self.decision)
    }

    /// Expire the escalation. The decision stays escalated and no later
    /// reply can change it.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::AlreadyResolved`] if already terminal.
    pub fn time_out(&mut self) -> GuardResult<&GuardDecision> {
        if self.state != EscalationState::Pending {
            return Err(GuardError::AlreadyResolved);
        }
        self.state = EscalationState::TimedOut;
        self.decision.reason = format!("{} | escalation timed out", self.decision.reason);
        Ok(&self.decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_config::AutoRule;

    fn call_with(name: &str, params: serde_json::Value) -> ToolCall {
        let serde_json::Value::Object(map) = params else {
            panic!("params must be an object");
        };
        ToolCall::new(name, map)
    }

    fn assessment_for(call: &ToolCall, score: f64, factors: Vec<RiskFactor>) -> RiskAssessment {
        let target = call.target();
        RiskAssessment {
            score,
            factors,
            tool: call.name.clone(),
            target: (!target.is_empty()).then(|| target.to_string()),
        }
    }

    fn judgment(approve: bool, confidence: f64) -> ReviewerJudgment {
        ReviewerJudgment {
            approve,
            confidence,
            reasoning: "test reasoning".to_string(),
        }
    }

    #[test]
    fn test_rule_match_with_sufficient_confidence_approves() {
        let rules = RuleSet::compile(&[AutoRule::new("write /workspace/**", 0.95)]).unwrap();
        let call = call_with("write", json!({"path": "/workspace/out.txt"}));
        let assessment = assessment_for(&call, 0.6, vec![RiskFactor::IrreversibleAction]);

        let decision = route(&call, &assessment, &judgment(true, 0.96), &rules);
        assert_eq!(decision.action, GuardAction::Approve);
        assert!(decision.reason.contains("pattern"));
        assert!(decision.reason.contains("write /workspace/**"));
    }

    #[test]
    fn test_rule_match_without_confidence_falls_through() {
        let rules = RuleSet::compile(&[AutoRule::new("write /workspace/**", 0.95)]).unwrap();
        let call = call_with("write", json!({"path": "/workspace/out.txt"}));
        let assessment = assessment_for(&call, 0.6, vec![RiskFactor::IrreversibleAction]);

        // 0.5 < 0.95: the rule does not apply, and the medium band escalates.
        let decision = route(&call, &assessment, &judgment(true, 0.5), &rules);
        assert_eq!(decision.action, GuardAction::Escalate);
        assert!(!decision.reason.contains("pattern"));
    }

    #[test]
    fn test_high_confidence_mirrors_verdict() {
        let rules = RuleSet::default();
        let call = call_with("exec", json!({"command": "sudo reboot"}));
        let assessment = assessment_for(&call, 0.9, vec![RiskFactor::IrreversibleAction]);

        let approve = route(&call, &assessment, &judgment(true, 0.92), &rules);
        assert_eq!(approve.action, GuardAction::Approve);

        let reject = route(&call, &assessment, &judgment(false, 0.92), &rules);
        assert_eq!(reject.action, GuardAction::Reject);
        assert!(reject.reason.contains("high confidence"));
    }

    #[test]
    fn test_medium_confidence_escalates_with_prompt() {
        let rules = RuleSet::default();
        let call = call_with("exec", json!({"command": "ssh prod"}));
        let assessment = assessment_for(
            &call,
            0.7,
            vec![RiskFactor::DataExfilPattern, RiskFactor::ExternalDestination],
        );

        let decision = route(&call, &assessment, &judgment(false, 0.6), &rules);
        assert_eq!(decision.action, GuardAction::Escalate);
        let prompt = decision.escalation_prompt.unwrap();
        assert!(prompt.contains("ssh prod"));
        assert!(prompt.contains("likely unsafe"));
        assert!(prompt.contains("bypass <reason>"));
    }

    #[test]
    fn test_low_confidence_escalates_conservatively() {
        let rules = RuleSet::default();
        let call = call_with("browser", json!({"url": "https://x/login", "action": "fill"}));
        let assessment = assessment_for(&call, 0.5, vec![RiskFactor::ExternalDestination]);

        let decision = route(&call, &assessment, &judgment(true, 0.3), &rules);
        assert_eq!(decision.action, GuardAction::Escalate);
        assert!(decision.reason.contains("conservatively"));
        assert!(decision.escalation_prompt.is_some());
    }

    #[test]
    fn test_boundary_confidences() {
        let rules = RuleSet::default();
        let call = call_with("exec", json!({"command": "x"}));
        let assessment = assessment_for(&call, 0.6, vec![]);

        assert_eq!(
            route(&call, &assessment, &judgment(true, 0.9), &rules).action,
            GuardAction::Approve
        );
        assert_eq!(
            route(&call, &assessment, &judgment(true, 0.5), &rules).action,
            GuardAction::Escalate
        );
    }

    #[test]
    fn test_prompt_carries_factors_and_details() {
        let call = call_with("write", json!({"path": "/etc/cron.d/job"}));
        let assessment = assessment_for(
            &call,
            0.85,
            vec![
                RiskFactor::ExternalDestination,
                RiskFactor::IrreversibleAction,
            ],
        );
        let prompt = escalation_prompt(&call, &assessment, &judgment(false, 0.6));
        assert!(prompt.contains("HIGH"));
        assert!(prompt.contains("path: /etc/cron.d/job"));
        assert!(prompt.contains("external destination"));
        assert!(prompt.contains("irreversible action"));
    }

    fn escalated() -> GuardDecision {
        let rules = RuleSet::default();
        let call = call_with("exec", json!({"command": "ssh prod"}));
        let assessment = assessment_for(&call, 0.7, vec![RiskFactor::ExternalDestination]);
        route(&call, &assessment, &judgment(false, 0.6), &rules)
    }

    #[test]
    fn test_reply_yes_approves() {
        let decision = apply_user_reply(&escalated(), " YES ").unwrap();
        assert_eq!(decision.action, GuardAction::Approve);
        assert_eq!(decision.user_decision, Some(UserDecision::Approved));
    }

    #[test]
    fn test_reply_n_rejects() {
        let decision = apply_user_reply(&escalated(), "n").unwrap();
        assert_eq!(decision.action, GuardAction::Reject);
        assert_eq!(decision.user_decision, Some(UserDecision::Rejected));
    }

    #[test]
    fn test_reply_bypass_carries_reason() {
        let decision = apply_user_reply(&escalated(), "bypass incident 4821 mitigation").unwrap();
        assert_eq!(decision.action, GuardAction::Bypass);
        assert_eq!(
            decision.bypass_reason.as_deref(),
            Some("incident 4821 mitigation")
        );
        assert!(decision.reason.contains("user bypassed"));
    }

    #[test]
    fn test_reply_bypass_without_reason_is_error() {
        let original = escalated();
        assert!(matches!(
            apply_user_reply(&original, "bypass"),
            Err(GuardError::EmptyBypassReason)
        ));
        assert!(matches!(
            apply_user_reply(&original, "bypass    "),
            Err(GuardError::EmptyBypassReason)
        ));
        // Original untouched.
        assert_eq!(original.action, GuardAction::Escalate);
    }

    #[test]
    fn test_unclear_reply_stays_escalated() {
        let decision = apply_user_reply(&escalated(), "maybe later").unwrap();
        assert_eq!(decision.action, GuardAction::Escalate);
        assert_eq!(decision.user_decision, Some(UserDecision::Pending));
        assert_eq!(decision.user_reply.as_deref(), Some("maybe later"));
        assert!(decision.reason.contains("unclear"));
    }

    #[test]
    fn test_escalation_resolves_exactly_once() {
        let mut escalation = Escalation::new(escalated()).unwrap();
        assert_eq!(escalation.state(), EscalationState::Pending);

        escalation.resolve("yes").unwrap();
        assert_eq!(escalation.state(), EscalationState::Resolved);

        assert!(matches!(
            escalation.resolve("no"),
            Err(GuardError::AlreadyResolved)
        ));
    }

    #[test]
    fn test_unclear_reply_keeps_escalation_pending() {
        let mut escalation = Escalation::new(escalated()).unwrap();
        escalation.resolve("huh").unwrap();
        assert_eq!(escalation.state(), EscalationState::Pending);

        escalation.resolve("no").unwrap();
        assert_eq!(escalation.state(), EscalationState::Resolved);
        assert_eq!(escalation.decision().action, GuardAction::Reject);
    }

    #[test]
    fn test_empty_bypass_keeps_escalation_pending() {
        let mut escalation = Escalation::new(escalated()).unwrap();
        assert!(escalation.resolve("bypass ").is_err());
        assert_eq!(escalation.state(), EscalationState::Pending);
    }

    #[test]
    fn test_timeout_is_terminal() {
        let mut escalation = Escalation::new(escalated()).unwrap();
        escalation.time_out().unwrap();
        assert_eq!(escalation.state(), EscalationState::TimedOut);
        assert_eq!(escalation.decision().action, GuardAction::Escalate);
        assert!(escalation.decision().reason.contains("timed out"));
        assert!(escalation.resolve("yes").is_err());
    }

    #[test]
    fn test_terminal_decision_cannot_be_parked() {
        let decision = GuardDecision::emergency_bypass("incident");
        assert!(matches!(
            Escalation::new(decision),
            Err(GuardError::NotEscalated { .. })
        ));
    }
}
