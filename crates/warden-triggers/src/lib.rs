//! Warden Triggers - Task-level trigger combinator.
//!
//! Where the guard inspects individual tool calls, this crate looks at
//! whole tasks: given a [`TaskContext`] distilled from the task
//! description and diff stats, the [`TriggerEngine`] decides whether to
//! parallelize the work, force its tool calls through the guard, and
//! require a pre-commit review. The three predicates are independent;
//! evidence for one never spills into another.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod context;
mod engine;

pub use context::{
    analyze, detect_operation, detect_risk_level, detect_scope, extract_patterns, DiffStats,
    ScopeFlags, TaskContext,
};
pub use engine::{TriggerDecision, TriggerEngine};
