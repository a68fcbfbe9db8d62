//! Configuration error types.
//!
//! Configuration problems are fatal at load time and never surface
//! mid-decision: a profile is validated before any component sees it.

use thiserror::Error;

/// Errors raised while resolving or validating a sensitivity profile.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The named sensitivity profile does not exist.
    #[error("unknown sensitivity profile: '{name}' (expected aggressive, balanced, or conservative)")]
    UnknownProfile {
        /// The name that failed to resolve.
        name: String,
    },

    /// A threshold or weight is outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// An auto-rule pattern is malformed.
    #[error("invalid auto-rule pattern '{pattern}': {reason}")]
    InvalidRule {
        /// The offending pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
