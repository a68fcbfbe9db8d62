//! Profile types: threshold bundles, weight table, auto-rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use warden_core::{Operation, RiskFactor, RiskLevel, ToolKind};

use crate::error::{ConfigError, ConfigResult};
use crate::presets;

/// Named sensitivity level selecting one of the built-in threshold bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    /// Trigger early, guard broadly.
    Aggressive,
    /// Production default.
    Balanced,
    /// Only intervene on the clearest evidence.
    Conservative,
}

impl FromStr for Sensitivity {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Ok(Self::Aggressive),
            "balanced" => Ok(Self::Balanced),
            "conservative" => Ok(Self::Conservative),
            _ => Err(ConfigError::UnknownProfile {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aggressive => write!(f, "aggressive"),
            Self::Balanced => write!(f, "balanced"),
            Self::Conservative => write!(f, "conservative"),
        }
    }
}

/// Static weight per risk factor, in `[0, 1]`.
///
/// Versioned with the profile; never hot-swapped per call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightTable {
    /// Weight of [`RiskFactor::ExternalDestination`].
    pub external_destination: f64,
    /// Weight of [`RiskFactor::DataExfilPattern`].
    pub data_exfil_pattern: f64,
    /// Weight of [`RiskFactor::SocialEngineeringCue`].
    pub social_engineering_cue: f64,
    /// Weight of [`RiskFactor::IrreversibleAction`].
    pub irreversible_action: f64,
    /// Weight of [`RiskFactor::OutOfScope`].
    pub out_of_scope: f64,
    /// Weight of [`RiskFactor::ContextAnomaly`].
    pub context_anomaly: f64,
}

impl WeightTable {
    /// Look up the weight of a factor.
    #[must_use]
    pub fn weight(&self, factor: RiskFactor) -> f64 {
        match factor {
            RiskFactor::ExternalDestination => self.external_destination,
            RiskFactor::DataExfilPattern => self.data_exfil_pattern,
            RiskFactor::SocialEngineeringCue => self.social_engineering_cue,
            RiskFactor::IrreversibleAction => self.irreversible_action,
            RiskFactor::OutOfScope => self.out_of_scope,
            RiskFactor::ContextAnomaly => self.context_anomaly,
        }
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        presets::default_weights()
    }
}

/// Risk thresholds below which a call is approved without a reviewer pass,
/// keyed by tool kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Threshold for outbound messages.
    pub message_send: f64,
    /// Threshold for file writes and edits.
    pub file_write: f64,
    /// Threshold for shell execution.
    pub exec: f64,
    /// Threshold for everything else.
    pub default: f64,
}

impl RiskThresholds {
    /// The threshold that applies to a given tool kind.
    #[must_use]
    pub fn for_kind(&self, kind: ToolKind) -> f64 {
        match kind {
            ToolKind::MessageSend => self.message_send,
            ToolKind::FileWrite | ToolKind::FileEdit => self.file_write,
            ToolKind::Exec => self.exec,
            ToolKind::Browser | ToolKind::Other => self.default,
        }
    }
}

/// A pre-approved operation shape.
///
/// Matching a rule never bypasses audit; it only lowers the reviewer
/// confidence bar the router must clear to approve without escalation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRule {
    /// Glob-style pattern (`**` any segments, `*` non-separator run,
    /// `?` one character) matched against the call's resolved target and
    /// against `"{tool} {target}"`.
    pub pattern: String,
    /// Minimum reviewer confidence required for the rule to apply.
    pub confidence: f64,
}

impl AutoRule {
    /// Create a rule.
    #[must_use]
    pub fn new(pattern: impl Into<String>, confidence: f64) -> Self {
        Self {
            pattern: pattern.into(),
            confidence,
        }
    }
}

/// Settings consumed by the tool-call gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardSettings {
    /// Per-tool-kind low-risk thresholds.
    pub thresholds: RiskThresholds,
    /// Factor weight table.
    pub weights: WeightTable,
    /// Ordered auto-approve rules; first match wins.
    pub auto_rules: Vec<AutoRule>,
    /// Hard timeout on a reviewer invocation, in seconds. On expiry the
    /// conservative synthetic judgment is substituted; the call is not
    /// retried.
    pub reviewer_timeout_secs: u64,
}

/// Thresholds for the parallelization predicate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParallelizeThresholds {
    /// Complexity must exceed this (0-10 scale).
    pub complexity: u8,
    /// Touched-file count must exceed this.
    pub impact_files: usize,
    /// Uncertainty must be below this for the model's own confidence to
    /// count as evidence.
    pub uncertainty: f64,
}

/// Settings for the guard-check predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardTriggerSettings {
    /// Risk levels that always force a guard check.
    pub risk_levels: Vec<RiskLevel>,
    /// Substring patterns that force a guard check whenever detected.
    pub always_check_patterns: Vec<String>,
}

/// Settings for the pre-commit review predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Review is forced once this many files are touched.
    pub min_files_changed: usize,
    /// Operations reviewed regardless of file count.
    pub operations: Vec<Operation>,
}

/// Settings consumed by the trigger combinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerSettings {
    /// Parallelization thresholds.
    pub parallelize: ParallelizeThresholds,
    /// Guard-check settings.
    pub guard: GuardTriggerSettings,
    /// Pre-commit review settings.
    pub review: ReviewSettings,
    /// Maximum concurrent workers. The only externally tunable numeric
    /// knob the capacity check consults.
    pub max_workers: usize,
}

/// The complete, immutable threshold bundle for one sensitivity level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityProfile {
    /// Which sensitivity this bundle encodes.
    pub sensitivity: Sensitivity,
    /// Gate settings.
    pub guard: GuardSettings,
    /// Trigger settings.
    pub triggers: TriggerSettings,
}

impl SensitivityProfile {
    /// Resolve a built-in preset.
    #[must_use]
    pub fn preset(sensitivity: Sensitivity) -> Self {
        match sensitivity {
            Sensitivity::Aggressive => presets::aggressive(),
            Sensitivity::Balanced => presets::balanced(),
            Sensitivity::Conservative => presets::conservative(),
        }
    }

    /// Resolve a preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] for an unrecognized name.
    /// This is fatal at load time by design; it can never occur
    /// mid-decision.
    pub fn from_name(name: &str) -> ConfigResult<Self> {
        Ok(Self::preset(name.parse()?))
    }

    /// Validate every weight, threshold, and rule in the bundle.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> ConfigResult<()> {
        for factor in RiskFactor::all() {
            let weight = self.guard.weights.weight(factor);
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::InvalidValue {
                    field: "guard.weights",
                    reason: format!("weight for {factor} is {weight}, expected [0, 1]"),
                });
            }
        }

        let thresholds = [
            ("guard.thresholds.message_send", self.guard.thresholds.message_send),
            ("guard.thresholds.file_write", self.guard.thresholds.file_write),
            ("guard.thresholds.exec", self.guard.thresholds.exec),
            ("guard.thresholds.default", self.guard.thresholds.default),
            ("triggers.parallelize.uncertainty", self.triggers.parallelize.uncertainty),
        ];
        for (field, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }

        for rule in &self.guard.auto_rules {
            if rule.pattern.trim().is_empty() {
                return Err(ConfigError::InvalidRule {
                    pattern: rule.pattern.clone(),
                    reason: "pattern is empty".to_string(),
                });
            }
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(ConfigError::InvalidRule {
                    pattern: rule.pattern.clone(),
                    reason: format!("confidence {} is outside [0, 1]", rule.confidence),
                });
            }
        }

        if self.triggers.parallelize.complexity > 10 {
            return Err(ConfigError::InvalidValue {
                field: "triggers.parallelize.complexity",
                reason: format!(
                    "{} exceeds the 0-10 complexity scale",
                    self.triggers.parallelize.complexity
                ),
            });
        }

        if self.triggers.max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "triggers.max_workers",
                reason: "must allow at least one worker".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SensitivityProfile {
    fn default() -> Self {
        Self::preset(Sensitivity::Balanced)
    }
}
