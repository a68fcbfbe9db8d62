//! Warden Config - Sensitivity profiles for the decision engine.
//!
//! A [`SensitivityProfile`] is an immutable bundle of every threshold the
//! engine consults: factor weights, per-tool risk thresholds, the
//! auto-approve rule list, and the trigger thresholds for the
//! parallelize / guard / review predicates. Profiles are loaded once at
//! startup (the file format and discovery are a caller concern) and passed
//! around behind `Arc`; swapping sensitivity replaces the whole structure
//! atomically between decisions, never field by field.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod presets;
pub mod profile;

pub use error::{ConfigError, ConfigResult};
pub use profile::{
    AutoRule, GuardSettings, GuardTriggerSettings, ParallelizeThresholds, ReviewSettings,
    RiskThresholds, Sensitivity, SensitivityProfile, TriggerSettings, WeightTable,
};
