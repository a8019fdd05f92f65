//! Thread-safe handle around a [`CadenceEngine`].
//!
//! One exclusive lock is held for the whole of each `record`, so a reader on
//! another thread never observes a half-compacted store.

use crate::collector::types::SampleRecord;
use crate::core::engine::{CadenceEngine, CadenceEstimate, RecordOutcome};
use crate::core::error::EngineError;
use std::sync::{Arc, Mutex, MutexGuard};

struct EngineState {
    engine: CadenceEngine,
    latest: Option<CadenceEstimate>,
}

/// Cloneable, lock-protected cadence engine.
#[derive(Clone)]
pub struct SharedCadenceEngine {
    inner: Arc<Mutex<EngineState>>,
}

impl SharedCadenceEngine {
    pub fn from_engine(engine: CadenceEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineState {
                engine,
                latest: None,
            })),
        }
    }

    /// Record a sample under the engine lock.
    ///
    /// An invariant violation is logged, the engine is reset to a fresh seed
    /// window, and the error is still returned to the caller.
    pub fn record_sample(&self, sample: SampleRecord) -> Result<RecordOutcome, EngineError> {
        let mut state = self.lock();

        match state.engine.record_sample(sample) {
            Ok(outcome) => {
                if let Some(estimate) = outcome.estimate() {
                    state.latest = Some(*estimate);
                }
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "resetting cadence engine");
                state.engine.reset_at(sample.timestamp)?;
                state.latest = None;
                Err(e)
            }
        }
    }

    /// Record raw axis readings; see [`CadenceEngine::record`].
    pub fn record(
        &self,
        x: f32,
        y: f32,
        z: f32,
        timestamp: Option<i64>,
    ) -> Result<Option<f32>, EngineError> {
        let sample = SampleRecord::with_optional_timestamp(x, y, z, timestamp);
        let outcome = self.record_sample(sample)?;
        Ok(outcome.estimate().map(|e| e.frequency_hz))
    }

    /// The most recent estimate, if any cycle has produced one.
    pub fn latest(&self) -> Option<CadenceEstimate> {
        self.lock().latest
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut CadenceEngine) -> R) -> R {
        f(&mut self.lock().engine)
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use std::thread;

    fn config() -> EngineConfig {
        EngineConfig {
            window_size: 64,
            update_frequency: 16,
            history_count: 4,
            nominal_sample_rate_hz: 40.0,
            ..EngineConfig::default()
        }
    }

    fn sample(i: usize) -> SampleRecord {
        let t = i as f64 * 0.025;
        let v = (2.0 * std::f64::consts::PI * 2.5 * t).sin() as f32;
        SampleRecord::at(0.0, v, 0.0, i as i64 * 25)
    }

    #[test]
    fn test_latest_tracks_estimates() {
        let shared =
            SharedCadenceEngine::from_engine(CadenceEngine::with_origin(config(), 0).unwrap());
        assert!(shared.latest().is_none());

        for i in 0..128 {
            shared.record_sample(sample(i)).unwrap();
        }

        let latest = shared.latest().unwrap();
        assert!((latest.frequency_hz - 2.5).abs() < 0.625);
    }

    #[test]
    fn test_reader_thread_sees_consistent_estimates() {
        let shared =
            SharedCadenceEngine::from_engine(CadenceEngine::with_origin(config(), 0).unwrap());
        let writer = shared.clone();

        let handle = thread::spawn(move || {
            for i in 0..1_000 {
                writer.record_sample(sample(i)).unwrap();
            }
        });

        for _ in 0..100 {
            if let Some(estimate) = shared.latest() {
                assert!(estimate.frequency_hz > 0.0);
            }
            let len = shared.with_engine(|e| e.store().storage_len());
            assert_eq!(len, 256);
        }

        handle.join().unwrap();
        assert!(shared.latest().is_some());
    }

    #[test]
    fn test_invariant_violation_resets_engine() {
        let shared =
            SharedCadenceEngine::from_engine(CadenceEngine::with_origin(config(), 0).unwrap());
        for i in 0..15 {
            shared.record_sample(sample(i)).unwrap();
        }
        shared.with_engine(|e| e.store_mut().clear_slot(20));

        let result = shared.record_sample(sample(15));
        assert!(matches!(result, Err(EngineError::InvariantViolation { .. })));

        shared.with_engine(|e| {
            assert_eq!(e.store().write_cursor(), 64);
            assert_eq!(e.store().retained_window_index(), 1);
        });
        assert!(shared.latest().is_none());
    }
}
