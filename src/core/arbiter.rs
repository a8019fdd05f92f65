//! Per-axis spectral analysis and axis selection.

use crate::collector::types::{Axis, SampleRecord};
use crate::core::spectral::{
    sample_interval_secs, CadenceBand, SpectralError, SpectralEstimator, SpectralResult,
};
use serde::{Deserialize, Serialize};

/// The axis chosen for a window, with every axis' outcome for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSelection {
    pub axis: Axis,
    pub result: SpectralResult,
    /// Weight per axis in `Axis::ALL` order; `None` where the axis had no estimate
    pub weights: [Option<f32>; 3],
}

impl AxisSelection {
    pub fn frequency(&self) -> f32 {
        self.result.frequency
    }
}

/// Why no axis could be selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NoEstimateReason {
    /// No axis had energy in the cadence band
    DegenerateSpectrum,
    /// The band is not representable at the measured sample interval
    BandOutOfRange,
    /// Window timestamps did not advance
    InvalidSampleInterval,
}

impl std::fmt::Display for NoEstimateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoEstimateReason::DegenerateSpectrum => write!(f, "degenerate spectrum"),
            NoEstimateReason::BandOutOfRange => write!(f, "band out of range"),
            NoEstimateReason::InvalidSampleInterval => write!(f, "invalid sample interval"),
        }
    }
}

/// Analyse each axis of `window` and pick the one with the strongest peak.
///
/// Only a strictly larger weight displaces an earlier axis, so ties resolve
/// X before Y before Z.
pub fn select_axis(
    estimator: &mut SpectralEstimator,
    window: &[SampleRecord],
    band: CadenceBand,
) -> Result<AxisSelection, NoEstimateReason> {
    let interval_secs = sample_interval_secs(window);
    let mut values = Vec::with_capacity(window.len());
    let mut weights = [None; 3];
    let mut best: Option<(Axis, SpectralResult)> = None;

    for (slot, axis) in Axis::ALL.into_iter().enumerate() {
        values.clear();
        values.extend(window.iter().map(|s| axis.component(s)));

        let result = match estimator.analyze(&values, interval_secs, band) {
            Ok(result) => result,
            Err(SpectralError::Degenerate) => continue,
            // Interval and band problems depend only on timestamps, so every
            // axis would fail the same way.
            Err(SpectralError::BandOutOfRange { .. }) => {
                return Err(NoEstimateReason::BandOutOfRange)
            }
            Err(SpectralError::InvalidSampleInterval(_))
            | Err(SpectralError::WindowLength { .. }) => {
                return Err(NoEstimateReason::InvalidSampleInterval)
            }
        };

        weights[slot] = Some(result.weight);
        let displaces = match &best {
            Some((_, current)) => result.weight > current.weight,
            None => true,
        };
        if displaces {
            best = Some((axis, result));
        }
    }

    match best {
        Some((axis, result)) => Ok(AxisSelection {
            axis,
            result,
            weights,
        }),
        None => Err(NoEstimateReason::DegenerateSpectrum),
    }
}
