//! Audit error types.

use thiserror::Error;

/// Errors raised while opening or writing the audit trail.
///
/// Callers of [`crate::AuditSink::append`] never see these; a sink that
/// cannot persist logs the failure and keeps the decision path alive.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The underlying file could not be opened, written, or rotated.
    #[error("audit i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be serialized.
    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
