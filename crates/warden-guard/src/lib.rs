//! Warden Guard - The risk-gated decision engine.
//!
//! A [`Gate`] sits between an autonomous agent and its tool runtime.
//! Each requested call is scored from deterministic lexical and
//! structural signals; low-risk calls pass immediately, everything else
//! is routed through a secondary [`Reviewer`] whose confidence decides
//! between mirroring its verdict and escalating to a human. Every path
//! out of the gate is audited.
//!
//! The ordering invariant is strict: signal extraction, scoring,
//! threshold check, reviewer consultation, routing. No step is skipped
//! and no step reorders, so identical inputs always take the identical
//! path.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod gate;
mod reviewer;
mod router;
mod rules;
mod scorer;
pub mod signals;

pub use error::{GuardError, GuardResult};
pub use gate::{EscalationHandler, Gate};
pub use reviewer::{
    consult, ReviewRequest, Reviewer, ReviewerJudgment, UNAVAILABLE_CONFIDENCE,
};
pub use router::{
    apply_user_reply, escalation_prompt, route, Escalation, EscalationState, GuardAction,
    GuardDecision, UserDecision, HIGH_CONFIDENCE, MEDIUM_CONFIDENCE,
};
pub use rules::{CompiledRule, RuleSet};
pub use scorer::{assess, RiskAssessment};
