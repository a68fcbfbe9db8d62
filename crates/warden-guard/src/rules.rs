//! Auto-approve rule matching.
//!
//! Rules are glob patterns over the call's resolved target and over the
//! combined `"{tool} {target}"` form. `*` never crosses a `/`; `**`
//! matches anything. A match does not approve by itself; it only sets
//! the reviewer-confidence bar the router must clear.

use globset::{GlobBuilder, GlobMatcher};
use warden_config::AutoRule;
use warden_core::ToolCall;

use crate::error::{GuardError, GuardResult};

/// One rule with its compiled matcher.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// The source pattern, verbatim.
    pub pattern: String,
    /// Reviewer confidence the router must see for this rule to apply.
    pub confidence: f64,
    matcher: GlobMatcher,
}

/// An ordered, pre-compiled rule list. First match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every rule up front so evaluation can never hit a pattern
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidRule`] for the first pattern that
    /// fails to compile.
    pub fn compile(rules: &[AutoRule]) -> GuardResult<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let glob = GlobBuilder::new(&rule.pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| GuardError::InvalidRule {
                    pattern: rule.pattern.clone(),
                    reason: e.to_string(),
                })?;
            compiled.push(CompiledRule {
                pattern: rule.pattern.clone(),
                confidence: rule.confidence,
                matcher: glob.compile_matcher(),
            });
        }
        Ok(Self { rules: compiled })
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule matching the call's target or its
    /// `"{tool} {target}"` form.
    #[must_use]
    pub fn first_match(&self, call: &ToolCall) -> Option<&CompiledRule> {
        let target = call.target();
        let combined = format!("{} {target}", call.name);
        self.rules
            .iter()
            .find(|rule| rule.matcher.is_match(target) || rule.matcher.is_match(&combined))
    }
}
