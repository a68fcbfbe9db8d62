//! The secondary reviewer seam.
//!
//! The engine never calls a model directly; it consults whatever
//! implements [`Reviewer`]. Reviewer failure is an expected condition:
//! timeouts, transport errors, and contract violations all collapse to
//! the same conservative synthetic judgment, and the call is never
//! retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use warden_core::{RiskFactor, ToolCall};

use crate::error::{GuardError, GuardResult};

/// Confidence reported by the synthetic judgment used when a reviewer
/// fails. Low enough that the router always escalates.
pub const UNAVAILABLE_CONFIDENCE: f64 = 0.3;

/// What the gate hands a reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// The call under review.
    pub tool_call: ToolCall,
    /// Bounded risk score already computed.
    pub risk_score: f64,
    /// Factor occurrences behind the score.
    pub factors: Vec<RiskFactor>,
    /// Recent conversation turns, oldest-first.
    pub recent_context: Vec<String>,
    /// Stated session goals.
    pub goals: Vec<String>,
}

/// A reviewer's verdict on one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerJudgment {
    /// Whether the reviewer recommends allowing the call.
    pub approve: bool,
    /// Reviewer confidence in `[0, 1]`.
    pub confidence: f64,
    /// Free-text analysis.
    pub reasoning: String,
}

impl ReviewerJudgment {
    /// The synthetic judgment substituted when a reviewer fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            approve: false,
            confidence: UNAVAILABLE_CONFIDENCE,
            reasoning: "reviewer unavailable; conservative default applied".to_string(),
        }
    }

    /// Check the judgment against its contract.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidJudgment`] when confidence is NaN or
    /// outside `[0, 1]`.
    pub fn validate(&self) -> GuardResult<()> {
        if self.confidence.is_nan() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(GuardError::InvalidJudgment {
                reason: format!("confidence {} is outside [0, 1]", self.confidence),
            });
        }
        Ok(())
    }
}

/// A secondary reviewer consulted for calls above the risk threshold.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Review one tool call.
    ///
    /// # Errors
    ///
    /// Implementations may fail freely; the gate maps every failure to
    /// [`ReviewerJudgment::unavailable`].
    async fn review(&self, request: &ReviewRequest) -> GuardResult<ReviewerJudgment>;
}

/// Consult a reviewer under a hard timeout.
///
/// Never fails and never retries: a timeout, an error, or an
/// out-of-contract judgment all yield the conservative synthetic
/// judgment.
pub async fn consult(
    reviewer: &dyn Reviewer,
    request: &ReviewRequest,
    timeout: Duration,
) -> ReviewerJudgment {
    match tokio::time::timeout(timeout, reviewer.review(request)).await {
        Ok(Ok(judgment)) => match judgment.validate() {
            Ok(()) => judgment,
            Err(error) => {
                tracing::warn!(tool = %request.tool_call.name, %error, "reviewer judgment rejected");
                ReviewerJudgment::unavailable()
            },
        },
        Ok(Err(error)) => {
            tracing::warn!(tool = %request.tool_call.name, %error, "reviewer failed");
            ReviewerJudgment::unavailable()
        },
        Err(_) => {
            tracing::warn!(
                tool = %request.tool_call.name,
                timeout_secs = timeout.as_secs(),
                "reviewer timed out"
            );
            ReviewerJudgment::unavailable()
        },
    }
}
