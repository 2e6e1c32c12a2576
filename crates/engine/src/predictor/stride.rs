//! Stride Address Predictor.
//!
//! Detects a constant stride between the line addresses of successive flushes
//! that reach learning, whether or not they were learned. Once the last four
//! deltas agree, pattern predictions are redirected to `last + delta` instead
//! of the address their pattern resolved.
//!
//! # Performance
//!
//! - **Time Complexity:** `observe()` and `predict()` are O(1)
//! - **Best Case:** Append-only logs and array fills walking lines in order
//! - **Worst Case:** Tree and hash-table updates with no spatial order

use std::collections::VecDeque;

/// Number of agreeing deltas required before predicting.
const HISTORY: usize = 4;

/// Global stride detector over flushed line addresses.
#[derive(Clone, Debug, Default)]
pub struct StrideAddressPredictor {
    /// The last line address observed.
    last_addr: Option<u64>,
    /// The most recent deltas, oldest first.
    deltas: VecDeque<i64>,
}

impl StrideAddressPredictor {
    /// Creates an empty predictor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the line address of a flush that reached learning.
    pub fn observe(&mut self, line_addr: u64) {
        if let Some(last) = self.last_addr {
            if self.deltas.len() == HISTORY {
                let _ = self.deltas.pop_front();
            }
            self.deltas.push_back(line_addr.wrapping_sub(last) as i64);
        }
        self.last_addr = Some(line_addr);
    }

    /// Returns the stride, if the last deltas all agree and are non-zero.
    pub fn stride(&self) -> Option<i64> {
        let first = *self.deltas.front()?;
        (self.deltas.len() == HISTORY && first != 0 && self.deltas.iter().all(|&d| d == first))
            .then_some(first)
    }

    /// Predicts the next line address.
    pub fn predict(&self) -> Option<u64> {
        let stride = self.stride()?;
        self.last_addr.map(|last| last.wrapping_add(stride as u64))
    }
}
