//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_core::prelude::*;` to import all essential types.

pub use crate::context::{AmbientContext, RecentHistory};
pub use crate::factor::{Operation, RiskFactor};
pub use crate::tool_call::{ToolCall, ToolKind};
pub use crate::types::{DecisionId, RiskLevel, SessionId, Timestamp};
