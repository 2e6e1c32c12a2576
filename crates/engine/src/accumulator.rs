//! Write Accumulator.
//!
//! Coalesces region stores per line. A line that leaves the accumulator dirty
//! (capacity eviction or idle retirement) becomes a free prediction: it was
//! observed directly, so it costs no PC confidence. A flush takes the line out
//! for learning instead.

use std::collections::HashMap;

use tracing::trace;

use crate::common::addr::line_align;
use crate::common::data::{Pc, Tick};
use crate::config::AccumulatorConfig;
use crate::line::{Chunk, Line, Provenance};

/// Per-line store coalescer with a small fixed capacity.
#[derive(Debug)]
pub struct WriteAccumulator {
    lines: HashMap<u64, Line>,
    capacity: usize,
    retire_period: u64,
    retire_threshold: u64,
    last_retire: Tick,
}

impl WriteAccumulator {
    /// Creates an empty accumulator.
    pub fn new(config: &AccumulatorConfig) -> Self {
        Self {
            lines: HashMap::with_capacity(config.capacity),
            capacity: config.capacity.max(1),
            retire_period: config.retire_period.max(1),
            retire_threshold: config.retire_threshold,
            last_retire: 0,
        }
    }

    /// Returns the number of accumulated lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no line is accumulated.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the accumulated line containing `addr`.
    pub fn get(&self, addr: u64) -> Option<&Line> {
        self.lines.get(&line_align(addr))
    }

    /// Returns true if the line containing `addr` is accumulated.
    pub fn contains(&self, addr: u64) -> bool {
        self.lines.contains_key(&line_align(addr))
    }

    /// Removes the line containing `addr`.
    pub fn take(&mut self, addr: u64) -> Option<Line> {
        self.lines.remove(&line_align(addr))
    }

    /// Records a store into the line containing `addr`.
    ///
    /// `values` start at chunk `first_chunk`; chunks past the line end are
    /// dropped. If a new line does not fit, the oldest line is evicted and
    /// returned.
    pub fn record(
        &mut self,
        addr: u64,
        first_chunk: usize,
        values: &[u32],
        pc: Pc,
        now: Tick,
    ) -> Option<Line> {
        let key = line_align(addr);
        let mut evicted = None;
        if !self.lines.contains_key(&key) && self.lines.len() >= self.capacity {
            let oldest = self
                .lines
                .values()
                .min_by_key(|l| (l.created, l.addr))
                .and_then(|l| l.addr);
            if let Some(oldest) = oldest {
                evicted = self.lines.remove(&oldest);
                trace!(target: "wpred::accumulator", line = oldest, "accumulated line evicted");
            }
        }

        let line = self.lines.entry(key).or_insert_with(|| Line::at(key, now));
        line.dirty = true;
        line.updated = now;
        for (i, &value) in values.iter().enumerate() {
            let slot = first_chunk + i;
            if slot >= line.chunks().len() {
                break;
            }
            let prov = Provenance::new(pc, now, i as u8).owned_by(key);
            line.set(slot, Chunk::data(value, prov));
        }
        evicted
    }

    /// Retires dirty lines idle for longer than the threshold.
    ///
    /// Runs at most once per retire period. Returned lines are copies; the
    /// resident lines are marked clean and stay accumulated.
    pub fn retire_expired(&mut self, now: Tick) -> Vec<Line> {
        if now.saturating_sub(self.last_retire) < self.retire_period {
            return Vec::new();
        }
        self.last_retire = now;
        let threshold = self.retire_threshold;
        let mut retired: Vec<Line> = self
            .lines
            .values_mut()
            .filter(|l| l.dirty && now.saturating_sub(l.updated) > threshold)
            .map(|l| {
                l.dirty = false;
                let mut copy = l.clone();
                copy.dirty = true;
                copy
            })
            .collect();
        retired.sort_by_key(|l| l.addr);
        retired
    }

    /// Overlays the accumulated chunks of `line` on the backing line bytes.
    ///
    /// Every chunk of the result is a free chunk; accumulated values win.
    pub fn merge_with_backing(line: &Line, backing: &[u8], now: Tick) -> Line {
        let mut merged = Line::from_bytes(backing, now);
        merged.addr = line.addr;
        merged.created = line.created;
        merged.updated = line.updated;
        for (slot, chunk) in line.iter().enumerate() {
            if let Some(value) = chunk.value() {
                merged.set(slot, Chunk::free(value, chunk.tick().unwrap_or(now)));
            }
        }
        merged
    }
}
