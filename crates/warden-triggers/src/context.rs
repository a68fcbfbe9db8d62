//! Task context analysis.
//!
//! A [`TaskContext`] summarizes one unit of work: what kind of operation
//! it is, how big it is, how risky its language looks, and whether it
//! strays outside the workspace. Analysis is pure text heuristics over
//! the task description plus caller-supplied diff stats; nothing here
//! shells out or touches the filesystem.

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use warden_core::{Operation, RiskLevel};

/// Model confidence assumed when the caller supplies none.
const DEFAULT_MODEL_CONFIDENCE: f64 = 0.8;

static CRITICAL_RISK: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\b(delete|drop|remove)\s+(database|table|all|production)",
        r"\brm\s+-rf\s+/",
        r"(?i)\bsudo\s+rm",
        r"(?i)\bdrop\s+table",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static HIGH_RISK: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\b(delete|remove)\s+",
        r"(?i)\b(auth|authentication|password|secret|token|key)\b",
        r"(?i)\b(payment|billing|charge|transaction)\b",
        r"(?i)\bsudo\b",
        r"(?i)\bcurl.*\|\s*(bash|sh)",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static MEDIUM_RISK: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\b(refactor|migrate|update|modify)\b",
        r"(?i)\bexternal\s+api",
        r"(?i)\bnetwork\s+request",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static SYSTEM_PATHS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([r"/etc/", r"/var/", r"/usr/", r"/sys/", r"/proc/", r"/root/"])
        .unwrap_or_else(|_| RegexSet::empty())
});

static CREDENTIAL_PATHS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\.ssh/",
        r"\.aws/",
        r"\.env",
        r"\.npmrc",
        r"(?i)credentials",
        r"(?i)secrets?",
        r"(?i)password",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

/// Risk keywords surfaced verbatim in [`TaskContext::patterns`].
const PATTERN_KEYWORDS: &[&str] = &[
    "delete",
    "drop",
    "remove",
    "rm",
    "sudo",
    "auth",
    "authentication",
    "password",
    "secret",
    "token",
    "payment",
    "billing",
    "charge",
    "external",
    "api",
    "network",
    "database",
    "table",
    "production",
];

static REFACTOR_VOCAB: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\brefactor",
        r"(?i)\brestructure",
        r"(?i)\breorganize",
        r"(?i)\bclean\s+up",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static IMPLEMENT_VOCAB: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bimplement",
        r"(?i)\badd\s+(feature|functionality)",
        r"(?i)\bcreate\s+(new|a)",
        r"(?i)\bbuild",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

static FIX_VOCAB: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([r"(?i)\bfix", r"(?i)\bresolve", r"(?i)\bdebug", r"(?i)\bpatch"])
        .unwrap_or_else(|_| RegexSet::empty())
});

static DELETE_VOCAB: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([r"(?i)\bdelete", r"(?i)\bremove", r"(?i)\bdrop"])
        .unwrap_or_else(|_| RegexSet::empty())
});

static DEPLOY_VOCAB: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bdeploy",
        r"(?i)\brelease",
        r"(?i)\bpublish",
        r"(?i)\bship",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

/// Operation vocabularies in detection order.
static OPERATION_VOCAB: [(Operation, &LazyLock<RegexSet>); 5] = [
    (Operation::Refactor, &REFACTOR_VOCAB),
    (Operation::Implement, &IMPLEMENT_VOCAB),
    (Operation::Fix, &FIX_VOCAB),
    (Operation::Delete, &DELETE_VOCAB),
    (Operation::Deploy, &DEPLOY_VOCAB),
];

/// Caller-supplied working-tree diff statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DiffStats {
    /// Files with changes.
    pub files_changed: usize,
    /// Lines added across the diff.
    pub lines_added: usize,
    /// Lines removed across the diff.
    pub lines_removed: usize,
}

impl DiffStats {
    /// Complexity on the 0-10 scale. Removals weigh double additions,
    /// and every touched file adds half a point.
    #[must_use]
    pub fn complexity(&self) -> u8 {
        #[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
        let raw = self.lines_added as f64 * 0.005
            + self.lines_removed as f64 * 0.01
            + self.files_changed as f64 * 0.5;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            raw.floor().min(10.0) as u8
        }
    }
}

/// Workspace-boundary flags detected in the task description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeFlags {
    /// Mentions paths outside the workspace (`~/` or `../`).
    pub outside_workspace: bool,
    /// Mentions system directories.
    pub system_paths: bool,
    /// Mentions credential files or secret material.
    pub credentials: bool,
}

impl ScopeFlags {
    /// Whether any boundary flag is set.
    #[must_use]
    pub fn any(&self) -> bool {
        self.outside_workspace || self.system_paths || self.credentials
    }
}

/// Summary of one task, consumed by the trigger combinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContext {
    /// Estimated complexity on a 0-10 scale.
    pub complexity: u8,
    /// Number of files the task touches.
    pub impact_files: usize,
    /// Model uncertainty in `[0, 1]` (1 - stated confidence).
    pub uncertainty: f64,
    /// Coarse risk tier detected from the description.
    pub risk_level: RiskLevel,
    /// What kind of work this is.
    pub operation: Operation,
    /// Risk keywords found verbatim in the description.
    pub patterns: Vec<String>,
    /// Workspace-boundary flags.
    pub scope: ScopeFlags,
}

/// Classify the operation from a task description. Categories are
/// checked in a fixed order; the first with any hit wins.
#[must_use]
pub fn detect_operation(message: &str) -> Operation {
    for (operation, vocab) in &OPERATION_VOCAB {
        if vocab.is_match(message) {
            return *operation;
        }
    }
    Operation::Other
}

/// Pull out the risk keywords present in a description, in a fixed
/// order.
#[must_use]
pub fn extract_patterns(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    PATTERN_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(**keyword))
        .map(ToString::to_string)
        .collect()
}

/// Tier the description's language: critical regexes first, then high,
/// then medium, then a high fallback when an extracted pattern names a
/// dangerous keyword.
#[must_use]
pub fn detect_risk_level(message: &str, patterns: &[String]) -> RiskLevel {
    if CRITICAL_RISK.is_match(message) {
        return RiskLevel::Critical;
    }
    if HIGH_RISK.is_match(message) {
        return RiskLevel::High;
    }
    if MEDIUM_RISK.is_match(message) {
        return RiskLevel::Medium;
    }

    let dangerous = ["delete", "drop", "auth", "payment"];
    if patterns
        .iter()
        .any(|p| dangerous.contains(&p.to_lowercase().as_str()))
    {
        return RiskLevel::High;
    }

    RiskLevel::Low
}

/// Detect workspace-boundary mentions in a description.
#[must_use]
pub fn detect_scope(message: &str) -> ScopeFlags {
    ScopeFlags {
        outside_workspace: message.contains("~/") || message.contains("../"),
        system_paths: SYSTEM_PATHS.is_match(message),
        credentials: CREDENTIAL_PATHS.is_match(message),
    }
}

static WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\S+").ok());

/// Fallback complexity when no diff exists: message length plus pattern
/// density, bumped for refactors and implementations.
#[must_use]
pub fn message_complexity(message: &str, patterns: &[String], operation: Operation) -> u8 {
    let words = WORD
        .as_ref()
        .map_or(0, |re| re.find_iter(message).count());
    let bump = match operation {
        Operation::Refactor => 2.0,
        Operation::Implement => 1.0,
        _ => 0.0,
    };
    #[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
    let raw = words as f64 / 20.0 + patterns.len() as f64 * 0.5 + bump;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        raw.floor().min(10.0) as u8
    }
}

/// Build a [`TaskContext`] from a task description.
///
/// `diff` supplies size signals when the caller has a working tree to
/// measure; without one, complexity falls back to the description
/// itself. `model_confidence` is the model's own confidence in `[0, 1]`
/// and defaults to 0.8.
#[must_use]
pub fn analyze(message: &str, diff: Option<&DiffStats>, model_confidence: Option<f64>) -> TaskContext {
    let operation = detect_operation(message);
    let patterns = extract_patterns(message);
    let risk_level = detect_risk_level(message, &patterns);
    let scope = detect_scope(message);

    let diff_complexity = diff.map(DiffStats::complexity).unwrap_or(0);
    let complexity = if diff_complexity == 0 {
        message_complexity(message, &patterns, operation)
    } else {
        diff_complexity
    };

    let confidence = model_confidence
        .unwrap_or(DEFAULT_MODEL_CONFIDENCE)
        .clamp(0.0, 1.0);

    TaskContext {
        complexity,
        impact_files: diff.map_or(0, |d| d.files_changed),
        uncertainty: 1.0 - confidence,
        risk_level,
        operation,
        patterns,
        scope,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_detection() {
        assert_eq!(
            detect_operation("refactor the session module"),
            Operation::Refactor
        );
        assert_eq!(
            detect_operation("implement retry logic"),
            Operation::Implement
        );
        assert_eq!(detect_operation("fix the flaky test"), Operation::Fix);
        assert_eq!(detect_operation("delete stale rows"), Operation::Delete);
        assert_eq!(detect_operation("ship the release"), Operation::Deploy);
        assert_eq!(detect_operation("summarize the thread"), Operation::Other);
    }

    #[test]
    fn test_operation_order_refactor_wins() {
        // Matches both refactor and delete vocab; refactor is checked
        // first.
        assert_eq!(
            detect_operation("refactor and remove dead code"),
            Operation::Refactor
        );
    }

    #[test]
    fn test_risk_tiers() {
        assert_eq!(
            detect_risk_level("drop table users", &[]),
            RiskLevel::Critical
        );
        assert_eq!(
            detect_risk_level("rotate the auth token", &[]),
            RiskLevel::High
        );
        assert_eq!(
            detect_risk_level("refactor the parser", &[]),
            RiskLevel::Medium
        );
        assert_eq!(
            detect_risk_level("format the readme", &[]),
            RiskLevel::Low
        );
    }

    #[test]
    fn test_pattern_fallback_raises_risk() {
        let patterns = vec!["payment".to_string()];
        assert_eq!(
            detect_risk_level("tidy up the checkout page", &patterns),
            RiskLevel::High
        );
    }

    #[test]
    fn test_extract_patterns() {
        let patterns = extract_patterns("delete the production database rows");
        assert!(patterns.contains(&"delete".to_string()));
        assert!(patterns.contains(&"production".to_string()));
        assert!(patterns.contains(&"database".to_string()));
        assert!(!patterns.contains(&"sudo".to_string()));
    }

    #[test]
    fn test_scope_detection() {
        let scope = detect_scope("copy ~/.ssh/id_rsa into /etc/keys");
        assert!(scope.outside_workspace);
        assert!(scope.system_paths);
        assert!(scope.credentials);

        let clean = detect_scope("update src/parser.rs");
        assert!(!clean.any());
    }

    #[test]
    fn test_diff_complexity() {
        let small = DiffStats {
            files_changed: 1,
            lines_added: 10,
            lines_removed: 5,
        };
        assert_eq!(small.complexity(), 0);

        let large = DiffStats {
            files_changed: 12,
            lines_added: 800,
            lines_removed: 400,
        };
        // 4.0 + 4.0 + 6.0 = 14, capped at 10.
        assert_eq!(large.complexity(), 10);

        let medium = DiffStats {
            files_changed: 4,
            lines_added: 200,
            lines_removed: 100,
        };
        // 1.0 + 1.0 + 2.0 = 4.
        assert_eq!(medium.complexity(), 4);
    }

    #[test]
    fn test_analyze_prefers_diff_complexity() {
        let diff = DiffStats {
            files_changed: 4,
            lines_added: 200,
            lines_removed: 100,
        };
        let ctx = analyze("fix the scheduler", Some(&diff), Some(0.9));
        assert_eq!(ctx.complexity, 4);
        assert_eq!(ctx.impact_files, 4);
        assert!((ctx.uncertainty - 0.1).abs() < 1e-9);
        assert_eq!(ctx.operation, Operation::Fix);
    }

    #[test]
    fn test_analyze_falls_back_to_message() {
        let ctx = analyze(
            "refactor the authentication layer to remove the legacy password flow",
            None,
            None,
        );
        // No diff: complexity comes from the message itself.
        assert!(ctx.complexity >= 2);
        assert_eq!(ctx.impact_files, 0);
        assert_eq!(ctx.operation, Operation::Refactor);
        assert_eq!(ctx.risk_level, RiskLevel::High);
        assert!((ctx.uncertainty - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_clamped() {
        let ctx = analyze("fix it", None, Some(7.0));
        assert!(ctx.uncertainty.abs() < f64::EPSILON);
    }

    #[test]
    fn test_task_context_serialization_roundtrip() {
        let diff = DiffStats {
            files_changed: 4,
            lines_added: 200,
            lines_removed: 100,
        };
        let ctx = analyze("refactor the auth module", Some(&diff), Some(0.7));

        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"operation\":\"refactor\""));
        assert!(json.contains("\"risk_level\":\"high\""));

        let back: TaskContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back.operation, ctx.operation);
        assert_eq!(back.risk_level, ctx.risk_level);
        assert_eq!(back.impact_files, 4);
        assert_eq!(back.patterns, ctx.patterns);
        assert!((back.uncertainty - ctx.uncertainty).abs() < f64::EPSILON);
    }
}
