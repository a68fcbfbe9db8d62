//! Risk scoring: weighted factor sum with a hard upper bound.

use serde::{Deserialize, Serialize};
use warden_config::WeightTable;
use warden_core::{AmbientContext, RiskFactor, RiskLevel, ToolCall};

use crate::signals;

/// The scored outcome of signal extraction for one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Bounded score in `[0, 1]`.
    pub score: f64,
    /// Every factor occurrence that contributed weight, in extraction
    /// order.
    pub factors: Vec<RiskFactor>,
    /// Tool name the assessment was computed for.
    pub tool: String,
    /// The call's resolved target, if any.
    pub target: Option<String>,
}

impl RiskAssessment {
    /// The coarse level this score falls into.
    #[must_use]
    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.score)
    }

    /// Factors deduplicated, preserving first-occurrence order.
    #[must_use]
    pub fn distinct_factors(&self) -> Vec<RiskFactor> {
        let mut seen = Vec::new();
        for factor in &self.factors {
            if !seen.contains(factor) {
                seen.push(*factor);
            }
        }
        seen
    }
}

/// Extract signals and fold them into a bounded score.
///
/// Each factor occurrence adds its configured weight; the sum is capped
/// at 1.0. With all weights in `[0, 1]` the score is always in `[0, 1]`.
#[must_use]
pub fn assess(call: &ToolCall, context: &AmbientContext, weights: &WeightTable) -> RiskAssessment {
    let factors = signals::extract(call, context);

    #[allow(clippy::arithmetic_side_effects)]
    let raw: f64 = factors.iter().map(|factor| weights.weight(*factor)).sum();
    let score = raw.min(1.0);

    let target = call.target();
    RiskAssessment {
        score,
        factors,
        tool: call.name.clone(),
        target: (!target.is_empty()).then(|| target.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call_with(name: &str, params: serde_json::Value) -> ToolCall {
        let serde_json::Value::Object(map) = params else {
            panic!("params must be an object");
        };
        ToolCall::new(name, map)
    }

    fn context() -> AmbientContext {
        AmbientContext::new().with_workspace_roots(vec!["/workspace".to_string()])
    }

    #[test]
    fn test_clean_call_scores_zero() {
        let call = call_with("exec", json!({"command": "git status"}));
        let assessment = assess(&call, &context(), &WeightTable::default());
        assert!(assessment.score.abs() < f64::EPSILON);
        assert!(assessment.factors.is_empty());
        assert_eq!(assessment.level(), RiskLevel::Low);
    }

    #[test]
    fn test_weights_accumulate() {
        // ssh: sensitive pattern (0.4 exfil) + remote shell (0.3 external).
        let call = call_with("exec", json!({"command": "ssh deploy@prod"}));
        let assessment = assess(&call, &context(), &WeightTable::default());
        assert!((assessment.score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_score_capped_at_one() {
        // Message with attachment, bulk targets, cue in body, broadcast:
        // 0.3 + 0.4 + 0.4 + 0.5 + 0.2 caps at 1.0.
        let call = call_with(
            "message:send",
            json!({
                "message": "urgent, keep this confidential",
                "attachment": "/workspace/db.sqlite",
                "targets": ["a", "b", "c", "d"],
                "broadcast": true,
            }),
        );
        let assessment = assess(&call, &context(), &WeightTable::default());
        assert!((assessment.score - 1.0).abs() < f64::EPSILON);
        assert_eq!(assessment.level(), RiskLevel::Critical);
    }

    #[test]
    fn test_distinct_factors_preserve_order() {
        let call = call_with(
            "message:send",
            json!({
                "message": "hello",
                "attachment": "/tmp/f",
                "targets": ["a", "b", "c", "d"],
            }),
        );
        let assessment = assess(&call, &context(), &WeightTable::default());
        let distinct = assessment.distinct_factors();
        assert_eq!(
            distinct,
            vec![RiskFactor::ExternalDestination, RiskFactor::DataExfilPattern]
        );
        assert!(assessment.factors.len() > distinct.len());
    }

    #[test]
    fn test_target_recorded() {
        let call = call_with("write", json!({"path": "/etc/hosts"}));
        let assessment = assess(&call, &context(), &WeightTable::default());
        assert_eq!(assessment.target.as_deref(), Some("/etc/hosts"));
        assert_eq!(assessment.tool, "write");
    }

    #[test]
    fn test_determinism() {
        let call = call_with("exec", json!({"command": "sudo mkfs /dev/sda"}));
        let ctx = context();
        let weights = WeightTable::default();
        let a = assess(&call, &ctx, &weights);
        let b = assess(&call, &ctx, &weights);
        assert!((a.score - b.score).abs() < f64::EPSILON);
        assert_eq!(a.factors, b.factors);
    }
}
