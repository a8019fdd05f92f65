//! Dominant-frequency estimation over a single axis window.
//!
//! The estimator runs a forward FFT over one window, restricts the peak search
//! to the cadence band and refines the peak when the two strongest bins are
//! neighbours, since the true frequency then most likely lies between them.

use crate::collector::types::SampleRecord;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

/// Peaks at or below this magnitude are treated as no signal at all.
pub const DEGENERATE_MAGNITUDE: f32 = 1e-6;

/// Plausible cadence frequencies, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CadenceBand {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl CadenceBand {
    pub fn new(min_hz: f32, max_hz: f32) -> Self {
        Self { min_hz, max_hz }
    }
}

/// Outcome of one spectral analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralResult {
    /// Estimated dominant frequency in Hz
    pub frequency: f32,
    /// Magnitude of the strongest bin; used as a confidence proxy
    pub weight: f32,
    /// Index of the strongest bin
    pub best_bin: usize,
    /// Index of the runner-up bin
    pub second_bin: usize,
    /// Whether the estimate was interpolated between two adjacent bins
    pub refined: bool,
}

/// Reasons a single analysis produced no estimate.
#[derive(Debug, Clone, PartialEq)]
pub enum SpectralError {
    /// Every bin in the band is (near) zero.
    Degenerate,
    /// The cadence band has no bins at the measured sample interval.
    BandOutOfRange { interval_secs: f32 },
    /// Timestamps across the window do not advance.
    InvalidSampleInterval(f32),
    /// The input slice does not match the planned FFT length.
    WindowLength { expected: usize, actual: usize },
}

impl std::fmt::Display for SpectralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpectralError::Degenerate => write!(f, "no energy in the cadence band"),
            SpectralError::BandOutOfRange { interval_secs } => write!(
                f,
                "cadence band not representable at a sample interval of {interval_secs}s"
            ),
            SpectralError::InvalidSampleInterval(secs) => {
                write!(f, "invalid sample interval {secs}s")
            }
            SpectralError::WindowLength { expected, actual } => {
                write!(f, "window has {actual} values, expected {expected}")
            }
        }
    }
}

impl std::error::Error for SpectralError {}

/// Mean time between samples across a window, in seconds.
///
/// Derived from the capture timestamps of the first and last sample rather
/// than a nominal rate, so delivery jitter is absorbed. Returns 0.0 when the
/// span is not representable, which callers treat as an invalid interval.
pub fn sample_interval_secs(window: &[SampleRecord]) -> f32 {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() > 1 => {
            match last.timestamp.checked_sub(first.timestamp) {
                Some(span_ms) => span_ms as f32 / (window.len() - 1) as f32 / 1000.0,
                None => 0.0,
            }
        }
        _ => 0.0,
    }
}

/// Frequency of bin `index` for a window of `window_size` samples.
pub fn bin_frequency(index: usize, window_size: usize, interval_secs: f32) -> f32 {
    index as f32 / (window_size as f32 * interval_secs)
}

/// Bins `[min_index, max_index)` covering the band.
///
/// `min_index` is the first non-negative bin strictly above the lower edge and
/// `max_index` the first strictly above the upper edge. Returns `None` when
/// either edge lies beyond the sampled spectrum or the range is empty.
pub fn band_bin_range(
    window_size: usize,
    interval_secs: f32,
    band: CadenceBand,
) -> Option<Range<usize>> {
    let half = window_size / 2;
    let first_above = |limit: f32| {
        (0..half).find(|&i| bin_frequency(i, window_size, interval_secs) > limit)
    };

    let min_index = first_above(band.min_hz)?;
    let max_index = first_above(band.max_hz)?;
    (min_index < max_index).then_some(min_index..max_index)
}

/// Reusable FFT plan and buffers for one window length.
pub struct SpectralEstimator {
    window_size: usize,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectralEstimator {
    /// Plan a forward transform for `window_size` samples.
    pub fn new(window_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            window_size,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); window_size],
            scratch,
            magnitudes: vec![0.0; window_size / 2],
        }
    }

    /// Find the dominant frequency of `values` inside `band`.
    pub fn analyze(
        &mut self,
        values: &[f32],
        interval_secs: f32,
        band: CadenceBand,
    ) -> Result<SpectralResult, SpectralError> {
        if values.len() != self.window_size {
            return Err(SpectralError::WindowLength {
                expected: self.window_size,
                actual: values.len(),
            });
        }
        if !(interval_secs > 0.0 && interval_secs.is_finite()) {
            return Err(SpectralError::InvalidSampleInterval(interval_secs));
        }

        let range = band_bin_range(self.window_size, interval_secs, band)
            .ok_or(SpectralError::BandOutOfRange { interval_secs })?;

        self.compute_magnitudes(values);
        let (best, second) = self.peak_bins(range);

        let weight_best = self.magnitudes[best];
        if weight_best <= DEGENERATE_MAGNITUDE {
            return Err(SpectralError::Degenerate);
        }

        let freq_best = bin_frequency(best, self.window_size, interval_secs);
        if best.abs_diff(second) == 1 {
            let weight_second = self.magnitudes[second];
            let freq_second = bin_frequency(second, self.window_size, interval_secs);
            let frequency = (freq_best * weight_best + freq_second * weight_second)
                / (weight_best + weight_second);

            return Ok(SpectralResult {
                frequency,
                weight: weight_best,
                best_bin: best,
                second_bin: second,
                refined: true,
            });
        }

        Ok(SpectralResult {
            frequency: freq_best,
            weight: weight_best,
            best_bin: best,
            second_bin: second,
            refined: false,
        })
    }

    fn compute_magnitudes(&mut self, values: &[f32]) {
        for (slot, &v) in self.buffer.iter_mut().zip(values) {
            *slot = Complex::new(v, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (mag, c) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *mag = c.norm();
        }
    }

    /// Strongest and runner-up bins within `range`.
    ///
    /// Both searches seed from `range.start`, so when nothing other than the
    /// best bin beats the floor bin the runner-up stays at `range.start`.
    fn peak_bins(&self, range: Range<usize>) -> (usize, usize) {
        let mags = &self.magnitudes;

        let mut best = range.start;
        for i in range.clone() {
            if mags[i] > mags[best] {
                best = i;
            }
        }

        let mut second = range.start;
        for i in range {
            if i != best && mags[i] > mags[second] {
                second = i;
            }
        }

        (best, second)
    }
}

impl std::fmt::Debug for SpectralEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralEstimator")
            .field("window_size", &self.window_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE_HZ: f32 = 32.0;
    const W: usize = 64;

    fn band() -> CadenceBand {
        CadenceBand::new(40.0 / 60.0, 200.0 / 60.0)
    }

    fn sine(freq_hz: f32, amplitude: f32) -> Vec<f32> {
        (0..W)
            .map(|i| {
                let t = i as f64 / RATE_HZ as f64;
                (amplitude as f64 * (2.0 * std::f64::consts::PI * freq_hz as f64 * t).sin()) as f32
            })
            .collect()
    }

    #[test]
    fn test_band_bin_range() {
        // 0.5 Hz per bin: 1.0 Hz is the first bin above 0.667, 3.5 Hz above 3.333.
        let range = band_bin_range(W, 1.0 / RATE_HZ, band()).unwrap();
        assert_eq!(range, 2..7);
    }

    #[test]
    fn test_band_beyond_nyquist() {
        assert!(band_bin_range(W, 0.5, band()).is_none());
    }

    #[test]
    fn test_sample_interval_from_timestamps() {
        let window: Vec<SampleRecord> = (0..5)
            .map(|i| SampleRecord::at(0.0, 0.0, 0.0, i * 20))
            .collect();
        assert!((sample_interval_secs(&window) - 0.02).abs() < 1e-6);
        assert_eq!(sample_interval_secs(&window[..1]), 0.0);
    }

    #[test]
    fn test_unrepresentable_span_is_invalid() {
        let window = [
            SampleRecord::at(0.0, 0.0, 0.0, i64::MIN),
            SampleRecord::at(0.0, 0.0, 0.0, i64::MAX),
        ];
        assert_eq!(sample_interval_secs(&window), 0.0);

        let reversed = [window[1], window[0]];
        assert_eq!(sample_interval_secs(&reversed), 0.0);

        let mut estimator = SpectralEstimator::new(W);
        let result = estimator.analyze(&sine(2.0, 1.0), sample_interval_secs(&window), band());
        assert_eq!(result, Err(SpectralError::InvalidSampleInterval(0.0)));
    }

    #[test]
    fn test_pure_sinusoid_on_bin() {
        let mut estimator = SpectralEstimator::new(W);
        let result = estimator
            .analyze(&sine(2.0, 1.0), 1.0 / RATE_HZ, band())
            .unwrap();

        assert_eq!(result.best_bin, 4);
        assert!((result.frequency - 2.0).abs() < 0.5);
        assert!((result.weight - 32.0).abs() < 0.1);
    }

    #[test]
    fn test_between_bins_is_refined() {
        let mut estimator = SpectralEstimator::new(W);
        let result = estimator
            .analyze(&sine(2.25, 1.0), 1.0 / RATE_HZ, band())
            .unwrap();

        assert!(result.refined);
        assert_eq!(result.best_bin.abs_diff(result.second_bin), 1);
        assert!(result.frequency > 2.0 && result.frequency < 2.5);
        assert!((result.frequency - 2.25).abs() < 0.1);
    }

    #[test]
    fn test_all_zero_is_degenerate() {
        let mut estimator = SpectralEstimator::new(W);
        let result = estimator.analyze(&[0.0; W], 1.0 / RATE_HZ, band());
        assert_eq!(result, Err(SpectralError::Degenerate));
    }

    #[test]
    fn test_peak_at_band_floor_keeps_second_at_floor() {
        // Energy sits on bin 2, the first bin of the band. The runner-up search
        // starts from that same bin and nothing beats it, so the runner-up
        // collapses onto the best bin and no refinement happens.
        let mut estimator = SpectralEstimator::new(W);
        let result = estimator
            .analyze(&sine(1.0, 1.0), 1.0 / RATE_HZ, band())
            .unwrap();

        assert_eq!(result.best_bin, 2);
        assert_eq!(result.second_bin, 2);
        assert!(!result.refined);
        assert!((result.frequency - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_interval() {
        let mut estimator = SpectralEstimator::new(W);
        let result = estimator.analyze(&sine(2.0, 1.0), 0.0, band());
        assert_eq!(result, Err(SpectralError::InvalidSampleInterval(0.0)));
    }

    #[test]
    fn test_wrong_window_length() {
        let mut estimator = SpectralEstimator::new(W);
        let result = estimator.analyze(&[1.0; 10], 1.0 / RATE_HZ, band());
        assert!(matches!(result, Err(SpectralError::WindowLength { .. })));
    }
}
