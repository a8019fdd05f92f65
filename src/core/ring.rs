//! Fixed-capacity sample storage with overlapping analysis windows.
//!
//! Storage holds `history` blocks of `window_size` samples. Samples are written
//! sequentially at `write_cursor`; every `update_frequency` writes the store
//! signals that a new window can be analysed. The analysed window always ends
//! at the write cursor and begins at `retained_window_index * update_frequency`,
//! so consecutive windows overlap by `window_size - update_frequency` samples.
//!
//! When the cursor reaches the end of storage the most recent window is moved
//! to the front (compaction), which keeps the footprint at exactly
//! `window_size * history` slots for the lifetime of the stream.
//!
//! ```text
//!  [ seed window | ......................................... ]
//!        ^retained_window_index * update_frequency
//!                 ^write_cursor
//! ```

use crate::collector::types::SampleRecord;
use crate::core::error::EngineError;

/// Result of appending one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// More samples are needed before the next analysis.
    Pending,
    /// A full window ending at the write cursor is ready.
    ReadyForAnalysis {
        /// Whether storage was compacted by this append
        compacted: bool,
    },
}

impl AppendOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, AppendOutcome::ReadyForAnalysis { .. })
    }
}

/// Arena of sample slots indexed by a monotonic write cursor.
#[derive(Debug, Clone)]
pub struct WindowedRingStore {
    window_size: usize,
    update_frequency: usize,
    history: usize,
    slots: Vec<SampleRecord>,
    /// Parallel validity bitmap; a slot is readable only once written
    populated: Vec<bool>,
    /// Next slot to write, in `[window_size, capacity]`
    write_cursor: usize,
    /// Start of the analysis window in units of `update_frequency`
    retained_window_index: usize,
}

impl WindowedRingStore {
    /// Allocate the store and seed its first window with zero samples stamped `origin`.
    pub fn new(
        window_size: usize,
        update_frequency: usize,
        history: usize,
        origin: i64,
    ) -> Result<Self, EngineError> {
        if window_size == 0 || update_frequency == 0 || window_size % update_frequency != 0 {
            return Err(EngineError::Configuration(format!(
                "update_frequency {update_frequency} must evenly divide window_size {window_size}"
            )));
        }
        if history < 2 {
            return Err(EngineError::Configuration(format!(
                "history must hold at least 2 windows, got {history}"
            )));
        }

        let capacity = window_size * history;
        let mut slots = vec![SampleRecord::default(); capacity];
        let mut populated = vec![false; capacity];
        for slot in slots.iter_mut().take(window_size) {
            *slot = SampleRecord::zero(origin);
        }
        populated[..window_size].fill(true);

        Ok(Self {
            window_size,
            update_frequency,
            history,
            slots,
            populated,
            write_cursor: window_size,
            // The seed window itself is never analysed; the first analysis
            // reads the window ending at the first real update.
            retained_window_index: 1,
        })
    }

    /// Write a sample at the cursor.
    ///
    /// Compaction happens here, before readiness is reported, so the caller
    /// never sees a half-moved window.
    pub fn append(&mut self, sample: SampleRecord) -> AppendOutcome {
        let slot = self.write_cursor;
        self.slots[slot] = sample;
        self.populated[slot] = true;
        self.write_cursor += 1;

        if self.write_cursor % self.update_frequency != 0 {
            return AppendOutcome::Pending;
        }

        let compacted = self.write_cursor == self.capacity();
        if compacted {
            self.compact();
        }
        AppendOutcome::ReadyForAnalysis { compacted }
    }

    /// Move the last full window to the front of storage and forget the rest.
    pub fn compact(&mut self) {
        let capacity = self.capacity();
        let tail = capacity - self.window_size;

        self.slots.copy_within(tail..capacity, 0);
        self.populated[..self.window_size].fill(true);
        self.populated[self.window_size..].fill(false);

        self.retained_window_index = 0;
        self.write_cursor = self.window_size;

        tracing::trace!(window_size = self.window_size, "compacted sample storage");
    }

    /// First slot of the current analysis window.
    pub fn window_start(&self) -> usize {
        self.retained_window_index * self.update_frequency
    }

    /// The `window_size` samples of the current analysis window.
    pub fn current_window(&self) -> Result<&[SampleRecord], EngineError> {
        let start = self.window_start();
        let end = start + self.window_size;

        if end > self.capacity() {
            return Err(EngineError::InvariantViolation {
                window_start: start,
                slot: self.capacity(),
            });
        }
        if let Some(offset) = self.populated[start..end].iter().position(|p| !p) {
            return Err(EngineError::InvariantViolation {
                window_start: start,
                slot: start + offset,
            });
        }

        Ok(&self.slots[start..end])
    }

    /// Slide the analysis window forward by `update_frequency` samples.
    pub fn advance(&mut self) {
        self.retained_window_index += 1;
    }

    pub fn capacity(&self) -> usize {
        self.window_size * self.history
    }

    /// Number of slots backing the store. Constant for the store's lifetime.
    pub fn storage_len(&self) -> usize {
        self.slots.len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn update_frequency(&self) -> usize {
        self.update_frequency
    }

    pub fn history(&self) -> usize {
        self.history
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn retained_window_index(&self) -> usize {
        self.retained_window_index
    }

    /// Number of slots currently holding a written sample.
    pub fn populated_count(&self) -> usize {
        self.populated.iter().filter(|p| **p).count()
    }

    #[cfg(test)]
    pub(crate) fn clear_slot(&mut self, slot: usize) {
        self.populated[slot] = false;
    }
}
