//! Pending Join Table.
//!
//! Promoted patterns wait here for the stores that supply their chunks. Each
//! waiting chunk is queued behind its generating PC; when that PC stores again
//! the queued chunks take their values from the store's payload and the parent
//! prediction completes once nothing it needs is missing.
//!
//! The table is bounded in two directions: the number of distinct PCs with
//! queued chunks, and the depth of each PC's queue. Overflow drops the oldest
//! queue (or chunk) together with every parent it was feeding.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::common::data::{Pc, Tick};
use crate::config::PendingConfig;
use crate::history::WriteHistoryLog;
use crate::line::Chunk;
use crate::pending::arena::{Arena, Handle};
use crate::pending::parent::{Parent, SlotRef, SlotState};
use crate::predictor::entry::PredictorTableEntry;

/// One chunk waiting on its generating store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingChunk {
    /// Parent the chunk fills.
    pub parent: Handle,
    /// Slot of the parent it fills.
    pub slot: SlotRef,
    /// Chunk offset of the value within the generating store's payload.
    pub field_offset: u8,
    /// Tick the chunk was queued at.
    pub queued: Tick,
}

/// Event counts kept by the pending table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingCounters {
    /// Patterns promoted.
    pub promotions: u64,
    /// Chunks resolved to zero at promotion.
    pub const_zero_resolved: u64,
    /// Chunks resolved by a backward history search.
    pub reverse_search_hits: u64,
    /// Chunks dropped for capacity.
    pub evicted_chunks: u64,
    /// Parents discarded before completing.
    pub abandoned_parents: u64,
}

/// PC-keyed join table of partially resolved predictions.
#[derive(Debug)]
pub struct PendingJoinTable {
    parents: Arena<Parent>,
    queues: HashMap<Pc, VecDeque<PendingChunk>>,
    /// Distinct PCs with a queue, oldest first.
    pc_order: VecDeque<Pc>,
    max_pcs: usize,
    max_chunks_per_pc: usize,
    const_zero: bool,
    counters: PendingCounters,
}

impl PendingJoinTable {
    /// Creates an empty table.
    pub fn new(config: &PendingConfig, const_zero: bool) -> Self {
        Self {
            parents: Arena::new(),
            queues: HashMap::new(),
            pc_order: VecDeque::new(),
            max_pcs: config.max_pcs.max(1),
            max_chunks_per_pc: config.max_chunks_per_pc.max(1),
            const_zero,
            counters: PendingCounters::default(),
        }
    }

    /// Returns the number of PCs with queued chunks.
    pub fn pc_count(&self) -> usize {
        self.queues.len()
    }

    /// Returns the number of live parents.
    pub const fn parent_count(&self) -> usize {
        self.parents.len()
    }

    /// Returns the number of chunks queued behind `pc`.
    pub fn pending_for(&self, pc: Pc) -> usize {
        self.queues.get(&pc).map_or(0, VecDeque::len)
    }

    /// Returns the parent behind `handle`, if it is still live.
    pub fn parent(&self, handle: Handle) -> Option<&Parent> {
        self.parents.get(handle)
    }

    /// Returns the event counts.
    pub const fn counters(&self) -> PendingCounters {
        self.counters
    }

    /// Promotes a matched pattern into the table.
    ///
    /// Constant-zero chunks resolve to zero immediately and reverse-search
    /// chunks are looked up in `log`; every other valid chunk is queued behind
    /// its generating PC. Returns the parent if nothing was left to wait for.
    pub fn promote(
        &mut self,
        entry: &PredictorTableEntry,
        log: &WriteHistoryLog,
        now: Tick,
    ) -> Option<Parent> {
        if entry.address.is_invalid() {
            return None;
        }
        self.counters.promotions += 1;
        let mut parent = Parent::from_entry(entry, now);
        let mut waiting: Vec<(Pc, SlotRef, u8)> = Vec::new();

        if let Some(prov) = entry.address.provenance()
            && let Some(pc) = prov.pc
        {
            let found = if entry.address.is_reverse_search() {
                reverse_lookup(log, pc, prov.field_offset, 2)
            } else {
                None
            };
            if let Some(v) = found {
                parent.resolve_address(v[0], v[1], now);
                self.counters.reverse_search_hits += 1;
            } else {
                waiting.push((pc, SlotRef::Address, prov.field_offset));
            }
        }

        for (slot, chunk) in entry.data.iter().enumerate() {
            let Some(prov) = chunk.provenance() else {
                continue;
            };
            let Some(pc) = prov.pc else {
                continue;
            };
            let slot = slot as u8;
            if self.const_zero && chunk.is_const_zero() {
                parent.resolve_data(slot, 0, now);
                self.counters.const_zero_resolved += 1;
                continue;
            }
            if chunk.is_reverse_search()
                && let Some(v) = reverse_lookup(log, pc, prov.field_offset, 1)
            {
                parent.resolve_data(slot, v[0], now);
                self.counters.reverse_search_hits += 1;
                continue;
            }
            waiting.push((pc, SlotRef::Data(slot), prov.field_offset));
        }

        if parent.is_complete() {
            return Some(parent);
        }

        let handle = self.parents.insert(parent);
        trace!(
            target: "wpred::pending",
            hash = entry.hash,
            chunks = waiting.len(),
            "pattern promoted"
        );
        for (pc, slot, field_offset) in waiting {
            // Overflow of its own PC queue can abandon the parent mid-promotion.
            if !self.parents.contains(handle) {
                break;
            }
            self.enqueue(
                pc,
                PendingChunk {
                    parent: handle,
                    slot,
                    field_offset,
                    queued: now,
                },
            );
        }
        None
    }

    /// Resolves the chunks queued behind `pc` from a store's payload.
    ///
    /// `values` are the store's chunks starting at its first chunk. Chunks
    /// whose offset lies past the payload stay queued. Returns the parents that
    /// completed.
    pub fn resolve(&mut self, pc: Pc, values: &[u32], now: Tick) -> Vec<Parent> {
        let mut completed = Vec::new();
        let Some(queue) = self.queues.remove(&pc) else {
            return completed;
        };
        let mut kept = VecDeque::with_capacity(queue.len());

        for child in queue {
            let Some(parent) = self.parents.get_mut(child.parent) else {
                continue;
            };
            let off = child.field_offset as usize;
            match child.slot {
                SlotRef::Address if off + 1 < values.len() => {
                    parent.resolve_address(values[off], values[off + 1], now);
                }
                SlotRef::Data(slot) if off < values.len() => {
                    parent.resolve_data(slot, values[off], now);
                    #[cfg(feature = "always-trace")]
                    trace!(target: "wpred::pending", pc, slot, value = values[off], "chunk resolved");
                }
                _ => {
                    kept.push_back(child);
                    continue;
                }
            }
            if parent.is_complete()
                && let Some(done) = self.parents.remove(child.parent)
            {
                completed.push(done);
            }
        }

        if kept.is_empty() {
            self.pc_order.retain(|p| *p != pc);
        } else {
            let _ = self.queues.insert(pc, kept);
        }
        completed
    }

    /// Returns a parent queued behind `pc` that has completed, if any.
    pub fn get_completed_parent(&self, pc: Pc) -> Option<Handle> {
        self.queues.get(&pc)?.iter().find_map(|c| {
            self.parents
                .get(c.parent)
                .filter(|p| p.is_complete())
                .map(|_| c.parent)
        })
    }

    /// Removes and returns the parent behind `handle`.
    pub fn take_parent(&mut self, handle: Handle) -> Option<Parent> {
        self.parents.remove(handle)
    }

    fn enqueue(&mut self, pc: Pc, child: PendingChunk) {
        if !self.queues.contains_key(&pc) {
            while self.queues.len() >= self.max_pcs {
                let Some(oldest) = self.pc_order.pop_front() else {
                    break;
                };
                if let Some(evicted) = self.queues.remove(&oldest) {
                    debug!(
                        target: "wpred::pending",
                        pc = oldest,
                        chunks = evicted.len(),
                        "oldest PC queue evicted"
                    );
                    for c in evicted {
                        self.drop_child(c);
                    }
                }
            }
            if !self.parents.contains(child.parent) {
                return;
            }
            self.pc_order.push_back(pc);
        }

        let queue = self.queues.entry(pc).or_default();
        let overflow = if queue.len() >= self.max_chunks_per_pc {
            queue.pop_front()
        } else {
            None
        };
        queue.push_back(child);
        if let Some(c) = overflow {
            self.drop_child(c);
        }
    }

    /// Discards a queued chunk and the parent it can no longer complete.
    ///
    /// The abandoned parent's other chunks are purged from every queue.
    fn drop_child(&mut self, child: PendingChunk) {
        self.counters.evicted_chunks += 1;
        if let Some(parent) = self.parents.remove(child.parent) {
            debug_assert!(parent.state(child.slot) != SlotState::Resolved);
            self.counters.abandoned_parents += 1;
            self.purge_children(child.parent);
        }
    }

    fn purge_children(&mut self, handle: Handle) {
        self.queues.retain(|_, queue| {
            queue.retain(|c| c.parent != handle);
            !queue.is_empty()
        });
        let queues = &self.queues;
        self.pc_order.retain(|pc| queues.contains_key(pc));
    }
}

/// Searches the log newest to oldest for the latest store by `pc` and reads
/// `count` chunks at `field_offset` past its first valid chunk.
fn reverse_lookup(
    log: &WriteHistoryLog,
    pc: Pc,
    field_offset: u8,
    count: usize,
) -> Option<Vec<u32>> {
    log.scan_newest_to_oldest()
        .filter(|e| e.pc == pc)
        .find_map(|e| {
            let first = e.line.first_valid_index()?;
            (0..count)
                .map(|k| {
                    e.line
                        .chunks()
                        .get(first + field_offset as usize + k)
                        .and_then(Chunk::value)
                })
                .collect::<Option<Vec<u32>>>()
        })
}
