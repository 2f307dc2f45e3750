//! Debounce window for per-tick match decisions
//!
//! Keeps the last five raw match results in a ring buffer and reports a
//! smoothed decision over whatever is currently stored.

use crate::constants::{MATCH_RATIO_DEN, MATCH_RATIO_NUM, SMOOTHING_WINDOW};

/// Rolling buffer of the most recent match / no-match observations
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    /// Circular storage
    data: [bool; SMOOTHING_WINDOW],

    /// Next slot to write
    write_index: usize,

    /// Number of valid entries, saturates at capacity
    len: usize,
}

impl SmoothingWindow {
    pub fn new() -> Self {
        Self {
            data: [false; SMOOTHING_WINDOW],
            write_index: 0,
            len: 0,
        }
    }

    /// Push one observation, evicting the oldest once full
    pub fn push(&mut self, matched: bool) {
        self.data[self.write_index] = matched;
        self.write_index = (self.write_index + 1) % SMOOTHING_WINDOW;
        if self.len < SMOOTHING_WINDOW {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn true_count(&self) -> usize {
        self.iter().filter(|m| *m).count()
    }

    /// Entries oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        let start = (self.write_index + SMOOTHING_WINDOW - self.len) % SMOOTHING_WINDOW;
        (0..self.len).map(move |i| self.data[(start + i) % SMOOTHING_WINDOW])
    }

    /// True iff at least 60% of the stored entries are true.
    ///
    /// The ratio is applied to the current length, so partial windows need
    /// 1/1, 2/2, 2/3, 3/4 and full windows 3/5. An empty window never matches.
    pub fn decision(&self) -> bool {
        if self.len == 0 {
            return false;
        }
        self.true_count() * MATCH_RATIO_DEN >= self.len * MATCH_RATIO_NUM
    }

    pub fn clear(&mut self) {
        self.data = [false; SMOOTHING_WINDOW];
        self.write_index = 0;
        self.len = 0;
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::new()
    }
}
