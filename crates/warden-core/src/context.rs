//! Ambient context for gate evaluations.
//!
//! History is modeled as an explicit bounded ring buffer handed to the
//! signal extractor, never as ambient global state. This is the only input
//! through which past turns can influence a decision.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of turns retained.
const DEFAULT_CAPACITY: usize = 10;

/// Bounded ring buffer of recent conversation turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentHistory {
    turns: VecDeque<String>,
    capacity: usize,
}

impl RecentHistory {
    /// Create an empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty history retaining at most `capacity` turns.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Record a turn, evicting the oldest when full.
    pub fn push(&mut self, turn: impl Into<String>) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn.into());
    }

    /// Number of retained turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterate turns oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.turns.iter().map(String::as_str)
    }

    /// The most recent `n` turns, oldest-first.
    #[must_use]
    pub fn last_n(&self, n: usize) -> Vec<&str> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).map(String::as_str).collect()
    }

    /// All turns joined with spaces, for lexical cue scans.
    #[must_use]
    pub fn joined(&self) -> String {
        self.turns
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Into<String>> FromIterator<S> for RecentHistory {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut history = Self::new();
        for turn in iter {
            history.push(turn);
        }
        history
    }
}

/// Everything the gate knows beyond the tool call itself.
///
/// Built once per evaluation and read-only thereafter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmbientContext {
    /// Recent conversation turns.
    pub recent: RecentHistory,
    /// Goals the user has stated for the session.
    pub goals: Vec<String>,
    /// Directory prefixes considered in-workspace. Paths under none of
    /// these roots are out of scope.
    pub workspace_roots: Vec<String>,
    /// Operator-declared incident override. When set, the gate
    /// short-circuits straight to a logged bypass.
    pub emergency_bypass: Option<String>,
}

impl AmbientContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the workspace roots.
    #[must_use]
    pub fn with_workspace_roots(mut self, roots: Vec<String>) -> Self {
        self.workspace_roots = roots;
        self
    }

    /// Set the stated goals.
    #[must_use]
    pub fn with_goals(mut self, goals: Vec<String>) -> Self {
        self.goals = goals;
        self
    }

    /// Set the recent history.
    #[must_use]
    pub fn with_recent(mut self, recent: RecentHistory) -> Self {
        self.recent = recent;
        self
    }

    /// Declare an operator emergency bypass with a justification.
    #[must_use]
    pub fn with_emergency_bypass(mut self, reason: impl Into<String>) -> Self {
        self.emergency_bypass = Some(reason.into());
        self
    }

    /// Check whether a path falls under any configured workspace root.
    #[must_use]
    pub fn in_workspace(&self, path: &str) -> bool {
        self.workspace_roots
            .iter()
            .any(|root| path.starts_with(root.as_str()))
    }
}
