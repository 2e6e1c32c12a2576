//! Prediction feedback and the confidence tables it drives.
//!
//! This module provides:
//! 1. **Feedback Sink:** The interface match outcomes are reported through.
//! 2. **Hash Confidence:** Per generator hash reliability, consulted by stale purges.
//! 3. **PC Confidence:** Per store PC reliability, consulted by line learning.
//! 4. **Constant Tracker:** Per (hash, slot) repeat counts for constant-value predictions.

use std::collections::HashMap;

use crate::common::confidence::{Confidence, ConfidenceBounds};
use crate::common::data::{PathHash, Pc};
use crate::line::{Chunk, Line};

/// Receiver of prediction outcomes.
///
/// The predictor table implements this; tests substitute a mock.
pub trait FeedbackSink {
    /// Reports whether the address and the data of a prediction were right.
    fn notify_prediction_outcome(
        &mut self,
        hash: PathHash,
        address_correct: bool,
        data_correct: bool,
    );
}

/// Saturating confidence per generator hash.
#[derive(Clone, Debug)]
pub struct HashConfidence {
    counters: HashMap<PathHash, Confidence>,
    bounds: ConfidenceBounds,
}

impl HashConfidence {
    /// Creates an empty table. Unknown hashes read as `max - 1`.
    pub fn new(max: u32) -> Self {
        Self {
            counters: HashMap::new(),
            bounds: ConfidenceBounds::new(max.saturating_sub(1), 0, max),
        }
    }

    /// Returns the confidence of `hash`.
    pub fn get(&self, hash: PathHash) -> u32 {
        self.counters.get(&hash).map_or(self.bounds.init, Confidence::get)
    }

    /// Returns true if `hash` has reached the maximum.
    pub fn is_max(&self, hash: PathHash) -> bool {
        self.get(hash) == self.bounds.max
    }

    /// Raises the confidence of `hash` by one.
    pub fn increment(&mut self, hash: PathHash) {
        let bounds = self.bounds;
        self.counters
            .entry(hash)
            .or_insert_with(|| Confidence::new(bounds))
            .add(1);
    }

    /// Lowers the confidence of `hash` by one.
    pub fn decrement(&mut self, hash: PathHash) {
        let bounds = self.bounds;
        self.counters
            .entry(hash)
            .or_insert_with(|| Confidence::new(bounds))
            .sub(1);
    }
}

/// Saturating confidence per store PC.
#[derive(Clone, Debug)]
pub struct PcConfidence {
    counters: HashMap<Pc, Confidence>,
    bounds: ConfidenceBounds,
    gate: u32,
}

impl PcConfidence {
    /// Creates an empty table. Unknown PCs read as `bounds.init`.
    pub fn new(bounds: ConfidenceBounds, gate: u32) -> Self {
        Self {
            counters: HashMap::new(),
            bounds,
            gate,
        }
    }

    /// Returns the confidence of `pc`.
    pub fn get(&self, pc: Pc) -> u32 {
        self.counters.get(&pc).map_or(self.bounds.init, Confidence::get)
    }

    /// Returns true if writes from `pc` may be used by line learning.
    pub fn passes_gate(&self, pc: Pc) -> bool {
        self.get(pc) >= self.gate
    }

    /// Raises the confidence of `pc` by one.
    pub fn increment(&mut self, pc: Pc) {
        let bounds = self.bounds;
        self.counters
            .entry(pc)
            .or_insert_with(|| Confidence::new(bounds))
            .add(1);
    }

    /// Lowers the confidence of `pc` by one.
    pub fn decrement(&mut self, pc: Pc) {
        let bounds = self.bounds;
        self.counters
            .entry(pc)
            .or_insert_with(|| Confidence::new(bounds))
            .sub(1);
    }
}

#[derive(Clone, Copy, Debug)]
struct ConstantSlot {
    times_found: u32,
    last_data: u32,
}

/// Learns slots whose real value keeps repeating regardless of the pattern.
#[derive(Clone, Debug)]
pub struct ConstantTracker {
    slots: HashMap<(PathHash, usize), ConstantSlot>,
    threshold: u32,
    cap: u32,
}

impl ConstantTracker {
    /// Creates an empty tracker.
    pub fn new(threshold: u32, cap: u32) -> Self {
        Self {
            slots: HashMap::new(),
            threshold,
            cap,
        }
    }

    /// Records the real value written to `slot` under `hash`.
    ///
    /// A repeat of the previous value raises the count; a different value
    /// lowers it and becomes the new candidate. A new slot starts with zero as
    /// its candidate.
    pub fn observe(&mut self, hash: PathHash, slot: usize, real: u32) {
        let cap = self.cap;
        let entry = self.slots.entry((hash, slot)).or_insert(ConstantSlot {
            times_found: 0,
            last_data: 0,
        });
        if entry.last_data == real {
            entry.times_found = (entry.times_found + 1).min(cap);
        } else {
            entry.times_found = entry.times_found.saturating_sub(1);
            entry.last_data = real;
        }
    }

    /// Returns the constant predicted for `slot` under `hash`, if any.
    pub fn prediction(&self, hash: PathHash, slot: usize) -> Option<u32> {
        self.slots
            .get(&(hash, slot))
            .filter(|s| s.times_found >= self.threshold)
            .map(|s| s.last_data)
    }

    /// Overwrites predicted chunks with learned constants.
    ///
    /// Only slots valid in `original` are touched. Returns the number of
    /// substituted chunks.
    pub fn apply(&self, hash: PathHash, line: &mut Line, original: &Line) -> usize {
        let mut applied = 0;
        for slot in 0..original.chunks().len() {
            if original.chunk(slot).is_invalid() {
                continue;
            }
            let Some(value) = self.prediction(hash, slot) else {
                continue;
            };
            if let Chunk::Data {
                value: v, flags, ..
            } = line.chunk_mut(slot)
            {
                *v = value;
                flags.constant = true;
                applied += 1;
            }
        }
        applied
    }

    /// Returns the number of tracked slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
