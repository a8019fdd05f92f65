//! Session statistics for the cadence engine.
//!
//! Counters describe what the engine has processed during the current
//! session. They are held in memory only.

pub mod log;
pub mod summary;

// Re-export commonly used types
pub use log::{create_shared_log, SessionLog, SessionStats, SharedSessionLog};
pub use summary::CadenceSummary;
