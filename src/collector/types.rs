//! Accelerometer sample types for the cadence engine.
//!
//! A sample carries the three axis readings and the epoch-millisecond time it
//! was captured. Nothing else about the sensor event is retained.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One tri-axial accelerometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl SampleRecord {
    /// Create a sample stamped with the current time.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self::at(x, y, z, now_millis())
    }

    /// Create a sample with an explicit capture time.
    pub fn at(x: f32, y: f32, z: f32, timestamp: i64) -> Self {
        Self { x, y, z, timestamp }
    }

    /// A zero-valued sample, used to pad the first window.
    pub fn zero(timestamp: i64) -> Self {
        Self::at(0.0, 0.0, 0.0, timestamp)
    }

    /// Create a sample, stamping it with the current time when no timestamp is given.
    pub fn with_optional_timestamp(x: f32, y: f32, z: f32, timestamp: Option<i64>) -> Self {
        match timestamp {
            Some(ts) => Self::at(x, y, z, ts),
            None => Self::new(x, y, z),
        }
    }
}

/// Accelerometer axis.
///
/// The declaration order is also the tie-break priority when two axes carry
/// equally strong peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in priority order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Read this axis' component out of a sample.
    pub fn component(self, sample: &SampleRecord) -> f32 {
        match self {
            Axis::X => sample.x,
            Axis::Y => sample.y,
            Axis::Z => sample.z,
        }
    }

    /// Parse an axis label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_defaults_to_current_time() {
        let before = now_millis();
        let sample = SampleRecord::new(1.0, 2.0, 3.0);
        let after = now_millis();

        assert!(sample.timestamp >= before && sample.timestamp <= after);
        assert_eq!(sample.x, 1.0);
    }

    #[test]
    fn test_optional_timestamp() {
        let sample = SampleRecord::with_optional_timestamp(0.0, 0.0, 0.0, Some(42));
        assert_eq!(sample.timestamp, 42);

        let sample = SampleRecord::with_optional_timestamp(0.0, 0.0, 0.0, None);
        assert!(sample.timestamp > 0);
    }

    #[test]
    fn test_axis_component() {
        let sample = SampleRecord::at(1.0, 2.0, 3.0, 0);
        let values: Vec<f32> = Axis::ALL.iter().map(|a| a.component(&sample)).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_axis_labels() {
        assert_eq!(Axis::from_label("X"), Some(Axis::X));
        assert_eq!(Axis::from_label(" z "), Some(Axis::Z));
        assert_eq!(Axis::from_label("w"), None);
        assert_eq!(Axis::Y.to_string(), "Y");
    }
}
