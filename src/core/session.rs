//! A cadence session over an externally timestamped stream.
//!
//! Recorded and piped streams carry their own capture times, which need not
//! be anywhere near the wall clock. The session defers building the engine
//! until the first sample arrives and stamps the seed window with that
//! sample's timestamp, so the first analysis cycles see a forward-moving
//! window instead of one that starts in the future.

use crate::collector::types::SampleRecord;
use crate::config::EngineConfig;
use crate::core::engine::{CadenceEngine, CadenceEstimate, RecordOutcome};
use crate::core::error::EngineError;
use crate::core::shared::SharedCadenceEngine;
use crate::stats::{create_shared_log, CadenceSummary, SharedSessionLog};

/// Engine, counters and estimate history for one stream.
pub struct CadenceSession {
    config: EngineConfig,
    engine: Option<SharedCadenceEngine>,
    log: SharedSessionLog,
    estimates: Vec<f32>,
}

impl CadenceSession {
    /// Validate `config` up front; the engine itself is built on the first sample.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            engine: None,
            log: create_shared_log(),
            estimates: Vec::new(),
        })
    }

    /// Record one sample, anchoring the seed window on the first call.
    pub fn record_sample(&mut self, sample: SampleRecord) -> Result<RecordOutcome, EngineError> {
        let engine = match self.engine.clone() {
            Some(engine) => engine,
            None => {
                let engine = SharedCadenceEngine::from_engine(CadenceEngine::with_origin(
                    self.config.clone(),
                    sample.timestamp,
                )?);
                tracing::debug!(origin = sample.timestamp, "seed window anchored");
                self.engine = Some(engine.clone());
                engine
            }
        };

        match engine.record_sample(sample) {
            Ok(outcome) => {
                self.log.record_outcome(&outcome);
                if let Some(estimate) = outcome.estimate() {
                    self.estimates.push(estimate.frequency_hz);
                }
                Ok(outcome)
            }
            Err(e) => {
                self.log.record_invariant_violation();
                Err(e)
            }
        }
    }

    /// The engine handle, once the first sample has been recorded.
    pub fn engine(&self) -> Option<&SharedCadenceEngine> {
        self.engine.as_ref()
    }

    pub fn latest(&self) -> Option<CadenceEstimate> {
        self.engine.as_ref().and_then(|e| e.latest())
    }

    pub fn log(&self) -> &SharedSessionLog {
        &self.log
    }

    /// Every estimate emitted so far, in Hz.
    pub fn estimates(&self) -> &[f32] {
        &self.estimates
    }

    pub fn summary(&self) -> Option<CadenceSummary> {
        CadenceSummary::from_estimates(&self.estimates)
    }
}
