//! Sample ingest for the cadence engine.
//!
//! This module provides the sample record shared by every part of the crate,
//! input decimation, and a collector that replays recorded accelerometer
//! streams over a channel.

pub mod replay;
pub mod stride;
pub mod types;

// Re-export commonly used types
pub use replay::{parse_line, CollectorError, ReplayCollector, StreamFormat};
pub use stride::InputStride;
pub use types::{now_millis, Axis, SampleRecord};
