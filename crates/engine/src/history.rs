//! Write History Log.
//!
//! Every observed write is appended to a fixed-capacity ring in arrival order.
//! The log is the search space for line learning and for reverse-search
//! promotion. It provides:
//! 1. **Recording:** Append a write's chunks, placed at their intra-line offset.
//! 2. **Eviction:** Drop the oldest entry once the ring is full.
//! 3. **Scanning:** Oldest-to-newest and newest-to-oldest iteration.
//! 4. **Consumption:** Mark entries used once a flush consumed them.

use crate::common::addr::chunk_index;
use crate::common::data::{PathHash, Pc, Tick};
use crate::line::{Chunk, Line, Provenance};

/// A single entry in the write history log.
#[derive(Clone, Debug, Default)]
pub struct WriteHistoryEntry {
    /// Monotonic identifier, unique for the lifetime of the log.
    pub id: u64,
    /// Instruction address of the write.
    pub pc: Pc,
    /// The written chunks at their intra-line offset.
    pub line: Line,
    /// Path hash at the time the write was recorded.
    pub path_hash: PathHash,
    /// Tick of the write.
    pub tick: Tick,
    /// Number of chunks the write covered.
    pub size: usize,
    /// Set once a flush consumed this entry.
    pub used: bool,
}

/// Write history log, a FIFO ring of recent writes.
#[derive(Debug)]
pub struct WriteHistoryLog {
    entries: Vec<WriteHistoryEntry>,
    /// Index of the oldest entry.
    head: usize,
    /// Number of valid entries.
    count: usize,
    /// Identifier given to the next recorded write.
    next_id: u64,
}

impl WriteHistoryLog {
    /// Creates a new log with the given capacity.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity.max(1));
        entries.resize_with(capacity.max(1), WriteHistoryEntry::default);
        Self {
            entries,
            head: 0,
            count: 0,
            next_id: 0,
        }
    }

    /// Returns the capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of recorded entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the log is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Appends a write, dropping the oldest entry if the log is full.
    ///
    /// `values` are the write's chunks starting at the chunk that holds `addr`.
    /// Returns the identifier of the new entry.
    pub fn record(
        &mut self,
        pc: Pc,
        addr: u64,
        values: &[u32],
        path_hash: PathHash,
        tick: Tick,
    ) -> u64 {
        let first = chunk_index(addr);
        let mut line = Line::at(addr, tick);
        for (i, &value) in values.iter().enumerate() {
            let slot = first + i;
            if slot >= line.chunks().len() {
                break;
            }
            line.set(slot, Chunk::data(value, Provenance::new(pc, tick, i as u8)));
        }

        let id = self.next_id;
        self.next_id += 1;

        let cap = self.entries.len();
        let tail = (self.head + self.count) % cap;
        self.entries[tail] = WriteHistoryEntry {
            id,
            pc,
            line,
            path_hash,
            tick,
            size: values.len(),
            used: false,
        };

        if self.count == cap {
            self.head = (self.head + 1) % cap;
        } else {
            self.count += 1;
        }
        id
    }

    /// Iterates from the oldest entry to the newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &WriteHistoryEntry> + '_ {
        let cap = self.entries.len();
        (0..self.count).map(move |i| &self.entries[(self.head + i) % cap])
    }

    /// Iterates from the newest entry to the oldest.
    ///
    /// Used entries are still yielded; callers filter on `used` where needed.
    pub fn scan_newest_to_oldest(&self) -> impl Iterator<Item = &WriteHistoryEntry> + '_ {
        self.iter().rev()
    }

    /// Returns the entry with the given identifier, if still resident.
    pub fn get(&self, id: u64) -> Option<&WriteHistoryEntry> {
        let oldest = self.next_id - self.count as u64;
        if id < oldest || id >= self.next_id {
            return None;
        }
        let offset = (id - oldest) as usize;
        Some(&self.entries[(self.head + offset) % self.entries.len()])
    }

    /// Marks the given entries used. Identifiers no longer resident are ignored.
    pub fn mark_used(&mut self, ids: &[u64]) {
        let oldest = self.next_id - self.count as u64;
        let cap = self.entries.len();
        for &id in ids {
            if id >= oldest && id < self.next_id {
                let idx = (self.head + (id - oldest) as usize) % cap;
                self.entries[idx].used = true;
            }
        }
    }

    /// Returns the PCs of the `n` newest entries.
    pub fn recent_pcs(&self, n: usize) -> Vec<Pc> {
        self.scan_newest_to_oldest().take(n).map(|e| e.pc).collect()
    }
}
