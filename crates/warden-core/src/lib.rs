//! Warden Core - Foundation types for the risk-gated decision engine.
//!
//! This crate provides:
//! - Identifier and timestamp newtypes used throughout the workspace
//! - [`RiskLevel`] and its fixed score partition
//! - [`RiskFactor`] / [`Operation`] — the shared signal vocabulary
//! - [`ToolCall`] / [`ToolKind`] — the immutable view of a requested operation
//! - [`RecentHistory`] — the bounded ring buffer of recent conversation turns
//! - [`AmbientContext`] — everything the gate knows beyond the call itself

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod context;
pub mod factor;
pub mod prelude;
pub mod tool_call;
pub mod types;

pub use context::{AmbientContext, RecentHistory};
pub use factor::{Operation, RiskFactor};
pub use tool_call::{ToolCall, ToolKind};
pub use types::{DecisionId, RiskLevel, SessionId, Timestamp};
