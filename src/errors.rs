//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The profiler's steady-state paths never surface errors: resource
//! exhaustion degrades events to zero-duration contributors, unresolved
//! query results pause stat gathering for a frame cycle, and anomalous
//! timestamps are clamped. The only fallible public surface is
//! configuration loading, covered by [`VesperError`].
//!
//! Contract violations (an unbalanced `begin_frame`/`end_frame` block, or
//! a scope pushed without a matching pop) indicate a bug in the engine's
//! instrumentation and abort with an assertion instead of returning an
//! error value.

use thiserror::Error;

/// The main error type for the Vesper graphics backend.
#[derive(Error, Debug)]
pub enum VesperError {
    /// Profiler settings text was not valid JSON.
    #[error("Failed to parse profiler settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    /// A recognized setting carried a value outside its accepted range.
    #[error("Invalid value for setting `{name}`: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

/// Convenience alias used by all fallible public APIs in this crate.
pub type Result<T> = std::result::Result<T, VesperError>;
