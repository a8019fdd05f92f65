//! Cadence Engine - step-rate estimation from tri-axial accelerometer streams.
//!
//! This library turns a continuous stream of accelerometer samples into a
//! running estimate of the dominant periodic motion (walking or running
//! cadence), using fixed memory and a periodic spectral analysis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Cadence Engine                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Collector  │──▶│ Ring Store  │──▶│  Spectral   │       │
//! │  │  (replay)   │   │ (W x H)     │   │  (per axis) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │  Session    │◀────────────────────│    Axis     │       │
//! │  │   Stats     │                     │   Arbiter   │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cadence_engine::{CadenceEngine, EngineConfig};
//!
//! let mut engine = CadenceEngine::new(EngineConfig::default()).expect("valid config");
//!
//! // Feed samples as they arrive; every `update_frequency` calls may yield Hz.
//! if let Some(hz) = engine.record(0.1, 9.7, 0.3, None).expect("consistent store") {
//!     println!("cadence: {:.1} steps/min", cadence_engine::hz_to_bpm(hz));
//! }
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod stats;

// Re-export key types at crate root for convenience
pub use collector::{Axis, CollectorError, InputStride, ReplayCollector, SampleRecord, StreamFormat};
pub use config::{Config, ConfigError, EngineConfig};
pub use core::{
    CadenceEngine, CadenceEstimate, CadenceSession, EngineError, NoEstimateReason, RecordOutcome,
    SharedCadenceEngine,
};
pub use stats::{CadenceSummary, SessionLog, SessionStats, SharedSessionLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convert a frequency in Hz to events per minute.
pub fn hz_to_bpm(hz: f32) -> f32 {
    hz * 60.0
}

/// Convert events per minute to a frequency in Hz.
pub fn bpm_to_hz(bpm: f32) -> f32 {
    bpm / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bpm_conversion() {
        assert_eq!(hz_to_bpm(2.0), 120.0);
        assert!((bpm_to_hz(40.0) - 0.6667).abs() < 1e-3);
        assert!((bpm_to_hz(hz_to_bpm(3.3)) - 3.3).abs() < 1e-5);
    }
}
