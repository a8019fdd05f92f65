//! Core functionality for the cadence engine.
//!
//! This module contains:
//! - Fixed-capacity sample storage with overlapping analysis windows
//! - Spectral peak estimation within the cadence band
//! - Per-axis analysis and axis selection
//! - The engine that ties these together, plus a lock-protected handle
//! - A session that anchors the engine on a recorded stream's first sample

pub mod arbiter;
pub mod engine;
pub mod error;
pub mod ring;
pub mod session;
pub mod shared;
pub mod spectral;

// Re-export commonly used types
pub use arbiter::{select_axis, AxisSelection, NoEstimateReason};
pub use engine::{CadenceEngine, CadenceEstimate, RecordOutcome};
pub use error::EngineError;
pub use ring::{AppendOutcome, WindowedRingStore};
pub use session::CadenceSession;
pub use shared::SharedCadenceEngine;
pub use spectral::{CadenceBand, SpectralError, SpectralEstimator, SpectralResult};
