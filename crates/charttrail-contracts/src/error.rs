//! Error types for the CHARTTRAIL audit core.
//!
//! All fallible operations in the core return `TrailResult<T>`.  The ingress
//! facade in `charttrail-events` converts every variant into a boolean
//! failure — audit logging must never abort the business operation it
//! observes — so these variants mostly feed diagnostics and tests.

use thiserror::Error;

/// The unified error type for the CHARTTRAIL crates.
#[derive(Debug, Error)]
pub enum TrailError {
    /// The entry failed validation before anything was written.
    #[error("invalid log entry: {reason}")]
    InvalidEntry { reason: String },

    /// The log writer could not persist an entry.
    #[error("log write failed: {reason}")]
    WriteFailed { reason: String },

    /// The per-file append lock could not be acquired within the bounded wait.
    #[error("lock timeout after {waited_ms}ms on '{path}'")]
    LockTimeout { path: String, waited_ms: u64 },

    /// Segment rotation or compression failed.
    #[error("rotation failed: {reason}")]
    RotationFailed { reason: String },

    /// The integrity verifier found a broken chain.
    ///
    /// Only the explicit verification path produces this; live writes never do.
    #[error("chain broken at entry {index}: {reason}")]
    ChainBroken { index: u64, reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the CHARTTRAIL crates.
pub type TrailResult<T> = Result<T, TrailError>;
