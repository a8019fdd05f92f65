//! Input decimation ahead of the engine.
//!
//! High-rate sensors deliver far more events than cadence estimation needs;
//! keeping every Nth event stretches one analysis window over a longer span
//! of time.

use crate::config::ConfigError;

/// Admits every `every`-th event.
#[derive(Debug, Clone)]
pub struct InputStride {
    every: usize,
    seen: usize,
}

impl InputStride {
    pub fn new(every: usize) -> Result<Self, ConfigError> {
        if every == 0 {
            return Err(ConfigError::Invalid(
                "input stride must be at least 1".to_string(),
            ));
        }
        Ok(Self { every, seen: 0 })
    }

    /// Count one event; true when it should be forwarded.
    pub fn admit(&mut self) -> bool {
        self.seen += 1;
        if self.seen == self.every {
            self.seen = 0;
            true
        } else {
            false
        }
    }

    pub fn every(&self) -> usize {
        self.every
    }
}

impl Default for InputStride {
    fn default() -> Self {
        Self { every: 1, seen: 0 }
    }
}
