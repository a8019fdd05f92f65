//! The cadence engine: sample ingest, periodic analysis and axis selection.

use crate::collector::types::{now_millis, Axis, SampleRecord};
use crate::config::EngineConfig;
use crate::core::arbiter::{select_axis, NoEstimateReason};
use crate::core::error::EngineError;
use crate::core::ring::{AppendOutcome, WindowedRingStore};
use crate::core::spectral::{CadenceBand, SpectralEstimator};
use crate::hz_to_bpm;
use serde::{Deserialize, Serialize};

/// A cadence estimate produced by one analysis cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CadenceEstimate {
    /// Dominant frequency in Hz
    pub frequency_hz: f32,
    /// Axis the estimate was taken from
    pub axis: Axis,
    /// Peak magnitude on that axis
    pub weight: f32,
    /// Whether the frequency was interpolated between adjacent bins
    pub refined: bool,
    /// Capture time of the newest sample in the analysed window
    pub timestamp: i64,
}

impl CadenceEstimate {
    /// The estimate in events per minute.
    pub fn bpm(&self) -> f32 {
        hz_to_bpm(self.frequency_hz)
    }
}

/// What a single `record` call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Not an analysis cycle.
    Pending,
    /// An analysis cycle that produced an estimate.
    Estimate {
        estimate: CadenceEstimate,
        compacted: bool,
    },
    /// An analysis cycle without a confident estimate.
    NoEstimate {
        reason: NoEstimateReason,
        compacted: bool,
    },
}

impl RecordOutcome {
    pub fn estimate(&self) -> Option<&CadenceEstimate> {
        match self {
            RecordOutcome::Estimate { estimate, .. } => Some(estimate),
            _ => None,
        }
    }

    /// Whether this call ran an analysis cycle.
    pub fn is_cycle(&self) -> bool {
        !matches!(self, RecordOutcome::Pending)
    }

    /// Whether storage was compacted during this call.
    pub fn compacted(&self) -> bool {
        match self {
            RecordOutcome::Pending => false,
            RecordOutcome::Estimate { compacted, .. } => *compacted,
            RecordOutcome::NoEstimate { compacted, .. } => *compacted,
        }
    }
}

/// Estimates step cadence from a stream of accelerometer samples.
///
/// Memory is fixed at construction: `window_size * history_count` sample
/// slots plus one FFT plan.
#[derive(Debug)]
pub struct CadenceEngine {
    config: EngineConfig,
    band: CadenceBand,
    store: WindowedRingStore,
    estimator: SpectralEstimator,
}

impl CadenceEngine {
    /// Create an engine whose seed window is stamped with the current time.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_origin(config, now_millis())
    }

    /// Create an engine whose seed window is stamped `origin` (epoch ms).
    pub fn with_origin(config: EngineConfig, origin: i64) -> Result<Self, EngineError> {
        config.validate()?;

        let store = WindowedRingStore::new(
            config.window_size,
            config.update_frequency,
            config.history_count,
            origin,
        )?;
        let estimator = SpectralEstimator::new(config.window_size);

        tracing::debug!(
            window_size = config.window_size,
            update_frequency = config.update_frequency,
            history_count = config.history_count,
            "cadence engine initialised"
        );

        Ok(Self {
            band: config.band(),
            config,
            store,
            estimator,
        })
    }

    /// Record one sample; returns the dominant frequency in Hz on analysis cycles.
    ///
    /// `Ok(None)` covers both non-analysis calls and cycles without a
    /// confident estimate. Multiply by 60 for events per minute.
    pub fn record(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        timestamp: Option<i64>,
    ) -> Result<Option<f32>, EngineError> {
        let sample = SampleRecord::with_optional_timestamp(x, y, z, timestamp);
        let outcome = self.record_sample(sample)?;
        Ok(outcome.estimate().map(|e| e.frequency_hz))
    }

    /// Record one sample and report the full outcome of the call.
    pub fn record_sample(&mut self, sample: SampleRecord) -> Result<RecordOutcome, EngineError> {
        let compacted = match self.store.append(sample) {
            AppendOutcome::Pending => return Ok(RecordOutcome::Pending),
            AppendOutcome::ReadyForAnalysis { compacted } => compacted,
        };

        let window = self.store.current_window().map_err(|e| {
            tracing::error!(error = %e, "sample store bookkeeping is corrupt");
            e
        })?;
        let timestamp = window.last().map(|s| s.timestamp).unwrap_or(sample.timestamp);
        let selection = select_axis(&mut self.estimator, window, self.band);
        self.store.advance();

        match selection {
            Ok(selection) => {
                tracing::debug!(
                    axis = %selection.axis,
                    frequency_hz = selection.frequency(),
                    weight_x = ?selection.weights[0],
                    weight_y = ?selection.weights[1],
                    weight_z = ?selection.weights[2],
                    refined = selection.result.refined,
                    "analysis cycle"
                );
                Ok(RecordOutcome::Estimate {
                    estimate: CadenceEstimate {
                        frequency_hz: selection.frequency(),
                        axis: selection.axis,
                        weight: selection.result.weight,
                        refined: selection.result.refined,
                        timestamp,
                    },
                    compacted,
                })
            }
            Err(reason) => {
                tracing::warn!(%reason, "analysis cycle produced no estimate");
                Ok(RecordOutcome::NoEstimate { reason, compacted })
            }
        }
    }

    /// Drop all buffered samples and start over from a fresh seed window.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.reset_at(now_millis())
    }

    /// Like [`reset`](Self::reset), with an explicit seed timestamp.
    pub fn reset_at(&mut self, origin: i64) -> Result<(), EngineError> {
        self.store = WindowedRingStore::new(
            self.config.window_size,
            self.config.update_frequency,
            self.config.history_count,
            origin,
        )?;
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn band(&self) -> CadenceBand {
        self.band
    }

    /// Read-only view of the sample store.
    pub fn store(&self) -> &WindowedRingStore {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut WindowedRingStore {
        &mut self.store
    }
}
