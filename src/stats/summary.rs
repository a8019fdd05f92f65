//! Descriptive statistics over a run of cadence estimates.

use crate::hz_to_bpm;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

/// Distribution of the estimates emitted during a session, in BPM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceSummary {
    pub count: usize,
    pub mean_bpm: f64,
    /// Sample standard deviation; zero with fewer than two estimates
    pub std_dev_bpm: f64,
    pub median_bpm: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl CadenceSummary {
    /// Summarise estimates given in Hz. Returns `None` for an empty slice.
    pub fn from_estimates(estimates_hz: &[f32]) -> Option<Self> {
        if estimates_hz.is_empty() {
            return None;
        }

        let bpm: Vec<f64> = estimates_hz.iter().map(|&hz| hz_to_bpm(hz) as f64).collect();
        let std_dev_bpm = if bpm.len() < 2 {
            0.0
        } else {
            Statistics::std_dev(bpm.iter())
        };

        Some(Self {
            count: bpm.len(),
            mean_bpm: Statistics::mean(bpm.iter()),
            std_dev_bpm,
            median_bpm: Data::new(bpm.clone()).median(),
            min_bpm: Statistics::min(bpm.iter()),
            max_bpm: Statistics::max(bpm.iter()),
        })
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "Cadence ({} estimates):\n\
             - Mean: {:.1} bpm (sd {:.1})\n\
             - Median: {:.1} bpm\n\
             - Range: {:.1} to {:.1} bpm",
            self.count, self.mean_bpm, self.std_dev_bpm, self.median_bpm, self.min_bpm, self.max_bpm
        )
    }
}
