//! Built-in sensitivity presets.
//!
//! Three bundles covering the useful range: `aggressive` intervenes early
//! and often, `balanced` is the production default, `conservative` only
//! acts on the clearest evidence. The factor weights and per-tool risk
//! thresholds are shared across presets; what varies is when the triggers
//! fire and how much the guard distrusts by default.

use warden_core::{Operation, RiskLevel};

use crate::profile::{
    AutoRule, GuardSettings, GuardTriggerSettings, ParallelizeThresholds, ReviewSettings,
    RiskThresholds, Sensitivity, SensitivityProfile, TriggerSettings, WeightTable,
};

/// Default reviewer timeout.
const REVIEWER_TIMEOUT_SECS: u64 = 30;

/// The static factor weight table.
pub(crate) fn default_weights() -> WeightTable {
    WeightTable {
        external_destination: 0.3,
        data_exfil_pattern: 0.4,
        social_engineering_cue: 0.5,
        irreversible_action: 0.2,
        out_of_scope: 0.3,
        context_anomaly: 0.1,
    }
}

fn default_thresholds() -> RiskThresholds {
    RiskThresholds {
        message_send: 0.6,
        file_write: 0.7,
        exec: 0.8,
        default: 0.5,
    }
}

fn default_auto_rules() -> Vec<AutoRule> {
    vec![
        AutoRule::new("write /workspace/**", 0.95),
        AutoRule::new("edit /workspace/**", 0.95),
        AutoRule::new("exec git *", 0.9),
        AutoRule::new("exec npm *", 0.9),
        AutoRule::new("exec pnpm *", 0.9),
    ]
}

/// The `aggressive` preset.
pub(crate) fn aggressive() -> SensitivityProfile {
    SensitivityProfile {
        sensitivity: Sensitivity::Aggressive,
        guard: GuardSettings {
            thresholds: default_thresholds(),
            weights: default_weights(),
            auto_rules: default_auto_rules(),
            reviewer_timeout_secs: REVIEWER_TIMEOUT_SECS,
        },
        triggers: TriggerSettings {
            parallelize: ParallelizeThresholds {
                complexity: 5,
                impact_files: 3,
                uncertainty: 0.7,
            },
            guard: GuardTriggerSettings {
                risk_levels: vec![RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical],
                always_check_patterns: [
                    "delete", "drop", "rm", "auth", "payment", "sudo", "exec",
                ]
                .map(String::from)
                .to_vec(),
            },
            review: ReviewSettings {
                min_files_changed: 2,
                operations: vec![Operation::Refactor, Operation::Implement, Operation::Delete],
            },
            max_workers: 4,
        },
    }
}

/// The `balanced` preset.
pub(crate) fn balanced() -> SensitivityProfile {
    SensitivityProfile {
        sensitivity: Sensitivity::Balanced,
        guard: GuardSettings {
            thresholds: default_thresholds(),
            weights: default_weights(),
            auto_rules: default_auto_rules(),
            reviewer_timeout_secs: REVIEWER_TIMEOUT_SECS,
        },
        triggers: TriggerSettings {
            parallelize: ParallelizeThresholds {
                complexity: 7,
                impact_files: 5,
                uncertainty: 0.6,
            },
            guard: GuardTriggerSettings {
                risk_levels: vec![RiskLevel::High, RiskLevel::Critical],
                always_check_patterns: [
                    "delete", "drop", "rm -rf", "sudo", "auth", "payment",
                ]
                .map(String::from)
                .to_vec(),
            },
            review: ReviewSettings {
                min_files_changed: 3,
                operations: vec![Operation::Refactor, Operation::Implement],
            },
            max_workers: 4,
        },
    }
}

/// The `conservative` preset.
pub(crate) fn conservative() -> SensitivityProfile {
    SensitivityProfile {
        sensitivity: Sensitivity::Conservative,
        guard: GuardSettings {
            thresholds: default_thresholds(),
            weights: default_weights(),
            // Only version-control plumbing is pre-approved.
            auto_rules: vec![AutoRule::new("exec git *", 0.95)],
            reviewer_timeout_secs: REVIEWER_TIMEOUT_SECS,
        },
        triggers: TriggerSettings {
            parallelize: ParallelizeThresholds {
                complexity: 9,
                impact_files: 8,
                uncertainty: 0.5,
            },
            guard: GuardTriggerSettings {
                risk_levels: vec![RiskLevel::Critical],
                always_check_patterns: ["rm -rf /", "drop database", "delete from"]
                    .map(String::from)
                    .to_vec(),
            },
            review: ReviewSettings {
                min_files_changed: 5,
                operations: vec![Operation::Refactor],
            },
            max_workers: 2,
        },
    }
}
