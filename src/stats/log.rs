//! Per-session processing counters.

use crate::core::engine::RecordOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Counters for the current session.
#[derive(Debug)]
pub struct SessionLog {
    /// Unique id for this session
    session_id: Uuid,
    /// Number of samples handed to the engine
    samples_recorded: AtomicU64,
    /// Number of analysis cycles run
    analysis_cycles: AtomicU64,
    /// Number of cycles that produced an estimate
    estimates_emitted: AtomicU64,
    /// Number of cycles without a confident estimate
    no_estimate_cycles: AtomicU64,
    /// Number of storage compactions
    compactions: AtomicU64,
    /// Number of invariant violations surfaced by the engine
    invariant_violations: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionLog {
    /// Create a new session log.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            samples_recorded: AtomicU64::new(0),
            analysis_cycles: AtomicU64::new(0),
            estimates_emitted: AtomicU64::new(0),
            no_estimate_cycles: AtomicU64::new(0),
            compactions: AtomicU64::new(0),
            invariant_violations: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Count one recorded sample and whatever its outcome implies.
    pub fn record_outcome(&self, outcome: &RecordOutcome) {
        self.samples_recorded.fetch_add(1, Ordering::Relaxed);

        match outcome {
            RecordOutcome::Pending => return,
            RecordOutcome::Estimate { .. } => {
                self.estimates_emitted.fetch_add(1, Ordering::Relaxed);
            }
            RecordOutcome::NoEstimate { .. } => {
                self.no_estimate_cycles.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.analysis_cycles.fetch_add(1, Ordering::Relaxed);
        if outcome.compacted() {
            self.compactions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a sample whose `record` call failed with an invariant violation.
    pub fn record_invariant_violation(&self) {
        self.samples_recorded.fetch_add(1, Ordering::Relaxed);
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.session_id,
            samples_recorded: self.samples_recorded.load(Ordering::Relaxed),
            analysis_cycles: self.analysis_cycles.load(Ordering::Relaxed),
            estimates_emitted: self.estimates_emitted.load(Ordering::Relaxed),
            no_estimate_cycles: self.no_estimate_cycles.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
            invariant_violations: self.invariant_violations.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics ({}):\n\
             - Samples recorded: {}\n\
             - Analysis cycles: {}\n\
             - Estimates emitted: {}\n\
             - Cycles without estimate: {}\n\
             - Storage compactions: {}\n\
             - Invariant violations: {}\n\
             - Session duration: {} seconds",
            stats.session_id,
            stats.samples_recorded,
            stats.analysis_cycles,
            stats.estimates_emitted,
            stats.no_estimate_cycles,
            stats.compactions,
            stats.invariant_violations,
            stats.session_duration_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.samples_recorded.store(0, Ordering::Relaxed);
        self.analysis_cycles.store(0, Ordering::Relaxed);
        self.estimates_emitted.store(0, Ordering::Relaxed);
        self.no_estimate_cycles.store(0, Ordering::Relaxed);
        self.compactions.store(0, Ordering::Relaxed);
        self.invariant_violations.store(0, Ordering::Relaxed);
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: Uuid,
    pub samples_recorded: u64,
    pub analysis_cycles: u64,
    pub estimates_emitted: u64,
    pub no_estimate_cycles: u64,
    pub compactions: u64,
    pub invariant_violations: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared session log.
pub type SharedSessionLog = Arc<SessionLog>;

/// Create a new shared session log.
pub fn create_shared_log() -> SharedSessionLog {
    Arc::new(SessionLog::new())
}
