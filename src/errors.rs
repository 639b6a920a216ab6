//! Error types.
//!
//! The simulation core has no recoverable runtime failures: configuration
//! preconditions are checked once at construction, internal invariant
//! violations are programming errors (they panic), and expected no-ops
//! (cancelling an unknown id, ingesting a foreign trade) return silently.

use thiserror::Error;

/// Configuration precondition violations, reported at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },

    #[error("maker size must be non-zero")]
    ZeroMakerSize,
}
