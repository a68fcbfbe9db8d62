//! Guard error types.

use thiserror::Error;
use warden_config::ConfigError;

/// Errors raised by the gate and its components.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A reviewer returned a judgment outside its contract.
    #[error("invalid reviewer judgment: {reason}")]
    InvalidJudgment {
        /// What the judgment got wrong.
        reason: String,
    },

    /// An auto-approve rule pattern failed to compile.
    #[error("invalid auto-approve pattern '{pattern}': {reason}")]
    InvalidRule {
        /// The offending pattern.
        pattern: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A bypass reply arrived without a reason.
    #[error("bypass requires a reason")]
    EmptyBypassReason,

    /// A reply arrived for an escalation that already reached a terminal
    /// state.
    #[error("escalation already resolved")]
    AlreadyResolved,

    /// An escalation was constructed from a decision that was not
    /// escalated.
    #[error("decision is not escalated (action is {action})")]
    NotEscalated {
        /// The decision's actual action.
        action: String,
    },

    /// The profile handed to the gate failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
