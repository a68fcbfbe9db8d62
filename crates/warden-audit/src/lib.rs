//! Warden Audit - Append-only decision audit trail.
//!
//! Every terminal gate decision and every trigger evaluation produces
//! exactly one [`AuditEntry`] carrying the outcome plus the evidence
//! behind it (risk score, contributing factors, reviewer confidence,
//! human replies). Entries flow into an [`AuditSink`]; a sink failure
//! is logged and swallowed so persistence problems can never change or
//! block a decision.
//!
//! [`JsonlAuditSink`] writes one JSON object per line with size-capped
//! rotation. [`MemoryAuditSink`] backs tests and embedding scenarios.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod entry;
mod error;
mod sink;

pub use entry::{AuditEntry, AuditEntryId, AuditRecord, AuditedAction};
pub use error::{AuditError, AuditResult};
pub use sink::{AuditSink, JsonlAuditSink, MemoryAuditSink};
