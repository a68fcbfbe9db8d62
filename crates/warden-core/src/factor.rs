//! The closed risk-factor vocabulary shared by both decision pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete, weighted signal contributing to a risk score.
///
/// Factors are additive and not mutually exclusive; a factor may occur
/// more than once in an assessment when independent cues produce it, and
/// each occurrence contributes weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// The operation reaches a destination outside the agent's sandbox
    /// (external recipient, remote host, sensitive path or domain).
    ExternalDestination,
    /// Shape consistent with moving data out: attachments, bulk
    /// recipients, piped downloads, uploads.
    DataExfilPattern,
    /// Urgency, secrecy, or authority language in the request or the
    /// surrounding conversation.
    SocialEngineeringCue,
    /// Hard or impossible to undo: deletions, privileged commands,
    /// public posts.
    IrreversibleAction,
    /// No keyword overlap with the user's stated goals, or a path outside
    /// every workspace root.
    OutOfScope,
    /// Repetition of near-identical recent requests, or a sudden topic
    /// jump into system/instruction vocabulary.
    ContextAnomaly,
}

impl RiskFactor {
    /// Stable snake_case label, as written to audit records.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalDestination => "external_destination",
            Self::DataExfilPattern => "data_exfil_pattern",
            Self::SocialEngineeringCue => "social_engineering_cue",
            Self::IrreversibleAction => "irreversible_action",
            Self::OutOfScope => "out_of_scope",
            Self::ContextAnomaly => "context_anomaly",
        }
    }

    /// Human-readable label for escalation prompts.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExternalDestination => "external destination",
            Self::DataExfilPattern => "data exfil pattern",
            Self::SocialEngineeringCue => "social engineering cue",
            Self::IrreversibleAction => "irreversible action",
            Self::OutOfScope => "out of scope",
            Self::ContextAnomaly => "context anomaly",
        }
    }

    /// All factors, in weight-table order.
    #[must_use]
    pub fn all() -> [Self; 6] {
        [
            Self::ExternalDestination,
            Self::DataExfilPattern,
            Self::SocialEngineeringCue,
            Self::IrreversibleAction,
            Self::OutOfScope,
            Self::ContextAnomaly,
        ]
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse classification of what a task is doing, detected from its
/// description. Drives the pre-commit review predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Restructuring existing code.
    Refactor,
    /// Adding new functionality.
    Implement,
    /// Repairing a defect.
    Fix,
    /// Removing code or data.
    Delete,
    /// Releasing or publishing.
    Deploy,
    /// Anything else.
    Other,
}

impl Operation {
    /// Stable snake_case label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refactor => "refactor",
            Self::Implement => "implement",
            Self::Fix => "fix",
            Self::Delete => "delete",
            Self::Deploy => "deploy",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
