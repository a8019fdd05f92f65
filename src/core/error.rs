//! Engine error types.

use crate::config::ConfigError;

/// Errors surfaced by the cadence engine.
///
/// Cycles that merely lack a confident estimate are not errors; they are
/// reported as [`crate::core::RecordOutcome::NoEstimate`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine cannot be built with the given parameters.
    Configuration(String),
    /// The analysis window contained a slot that was never written.
    ///
    /// This means the ring store's cursor bookkeeping is corrupt.
    InvariantViolation {
        /// First slot of the window being analysed
        window_start: usize,
        /// The unpopulated slot
        slot: usize,
    },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Configuration(e) => write!(f, "Configuration error: {e}"),
            EngineError::InvariantViolation { window_start, slot } => write!(
                f,
                "Invariant violation: unpopulated slot {slot} in window at {window_start}"
            ),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Configuration(e.to_string())
    }
}
