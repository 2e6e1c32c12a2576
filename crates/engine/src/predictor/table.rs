//! Predictor Table.
//!
//! Learned line patterns keyed by path hash. The table owns the path history
//! its keys are computed from and provides:
//! 1. **Lookup:** Entries matching the current path, reported as each store PC arrives.
//! 2. **Insertion:** Replacement of weak residents, reinforcement of strong ones.
//! 3. **Eviction:** Confidence or age based victim choice when the table is full.
//! 4. **Housekeeping:** Periodic purge of stale entries whose hash never became reliable.
//! 5. **Feedback:** Confidence and age updates from match outcomes.

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::backend::feedback::{FeedbackSink, HashConfidence};
use crate::common::data::{PathHash, Pc};
use crate::config::TableConfig;
use crate::predictor::entry::PredictorTableEntry;
use crate::predictor::path::PathHistory;

/// Result of inserting a learned entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The hash was new and the table had room.
    Inserted,
    /// A weak resident with the same hash was replaced.
    Replaced,
    /// A confident resident with the same hash was kept and its data confidence lowered.
    Reinforced,
    /// The hash was new and the given victim was evicted to make room.
    InsertedAfterEviction(PathHash),
}

/// Path-hash keyed table of learned patterns.
#[derive(Debug)]
pub struct PredictorTable {
    entries: HashMap<PathHash, PredictorTableEntry>,
    path: PathHistory,
    config: TableConfig,
    use_confidence: bool,
    const_zero: bool,
    /// Order stamped on the next insertion.
    current_order: u64,
    /// Insertions seen by `tick`.
    clock: u64,
    /// Hashes found for the most recent PC.
    last_found: Vec<PathHash>,
    stale_purges: u64,
}

impl PredictorTable {
    /// Creates an empty table.
    pub fn new(config: &TableConfig, use_confidence: bool, const_zero: bool) -> Self {
        Self {
            entries: HashMap::with_capacity(config.max_entries),
            path: PathHistory::new(config.path_history_len),
            config: config.clone(),
            use_confidence,
            const_zero,
            current_order: 0,
            clock: 0,
            last_found: Vec::new(),
            stale_purges: 0,
        }
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.config.max_entries
    }

    /// Returns the entry for `hash`.
    pub fn lookup(&self, hash: PathHash) -> Option<&PredictorTableEntry> {
        self.entries.get(&hash)
    }

    /// Returns the hash of the current path.
    pub fn path_hash(&self) -> PathHash {
        self.path.hash()
    }

    /// Extends the path with a store PC and reports matching entries.
    pub fn observe_pc(&mut self, pc: Pc) -> &[PathHash] {
        self.path.push(pc);
        self.last_found.clear();
        let hash = self.path.hash();
        if self.entries.contains_key(&hash) {
            self.last_found.push(hash);
        }
        &self.last_found
    }

    /// Returns the age of `hash` in insertions.
    pub fn age_of(&self, hash: PathHash) -> Option<u64> {
        self.entries.get(&hash).map(|e| self.age(e))
    }

    /// Returns the number of entries removed by stale purges so far.
    pub const fn stale_purges(&self) -> u64 {
        self.stale_purges
    }

    fn age(&self, entry: &PredictorTableEntry) -> u64 {
        self.current_order.saturating_sub(entry.insertion_order)
    }

    /// Inserts a learned entry.
    ///
    /// # Panics
    ///
    /// Panics if the entry carries no original line or no valid chunk.
    pub fn insert(
        &mut self,
        mut entry: PredictorTableEntry,
        hash_confidence: &HashConfidence,
    ) -> InsertOutcome {
        assert!(
            entry.has_original_line(),
            "predictor entry {:#x} inserted without an original line",
            entry.hash
        );
        assert!(
            entry.address.is_valid() || !entry.data.is_all_invalid(),
            "predictor entry {:#x} inserted with no valid chunk",
            entry.hash
        );

        let _ = self.tick(hash_confidence);
        entry.insertion_order = self.current_order;
        self.current_order += 1;

        let hash = entry.hash;
        let low = self.config.low_confidence;
        let const_zero = self.const_zero;

        if let Some(resident) = self.entries.get_mut(&hash) {
            if resident.addr_confidence.get() <= low || resident.data_confidence.get() <= low {
                debug!(target: "wpred::table", hash, "replacing weak entry");
                *resident = entry;
                return InsertOutcome::Replaced;
            }
            resident.data_confidence.sub(1);
            if const_zero {
                reconcile_const_zero(resident, &entry);
            }
            trace!(
                target: "wpred::table",
                hash,
                data_confidence = resident.data_confidence.get(),
                "reinforced entry"
            );
            return InsertOutcome::Reinforced;
        }

        if self.entries.len() >= self.config.max_entries {
            let victim = self.choose_victim();
            if let Some(victim) = victim {
                let _ = self.entries.remove(&victim);
                debug!(target: "wpred::table", hash, victim, "evicted for capacity");
                let _ = self.entries.insert(hash, entry);
                return InsertOutcome::InsertedAfterEviction(victim);
            }
        }

        let _ = self.entries.insert(hash, entry);
        InsertOutcome::Inserted
    }

    /// Purges stale entries every `tick_period` insertions.
    ///
    /// An entry is stale once its age exceeds `stale_age`; it survives while
    /// its generator hash confidence is at maximum. Returns the number purged.
    pub fn tick(&mut self, hash_confidence: &HashConfidence) -> usize {
        let mut purged = 0;
        if self.clock % self.config.tick_period.max(1) == 0 {
            let before = self.entries.len();
            let now = self.current_order;
            let stale_age = self.config.stale_age;
            self.entries.retain(|hash, e| {
                now.saturating_sub(e.insertion_order) <= stale_age || hash_confidence.is_max(*hash)
            });
            purged = before - self.entries.len();
            if purged > 0 {
                self.stale_purges += purged as u64;
                debug!(target: "wpred::table", purged, "stale entries purged");
            }
        }
        self.clock += 1;
        purged
    }

    fn choose_victim(&self) -> Option<PathHash> {
        let low = self.config.low_confidence;
        let preferred = if self.use_confidence {
            self.entries
                .iter()
                .filter(|(_, e)| e.addr_confidence.get() <= low)
                .min_by_key(|(h, e)| (e.addr_confidence.get(), Reverse(self.age(e)), **h))
                .map(|(h, _)| *h)
        } else {
            self.entries
                .iter()
                .filter(|(_, e)| self.age(e) > self.config.stale_age)
                .min_by_key(|(h, e)| (Reverse(self.age(e)), **h))
                .map(|(h, _)| *h)
        };
        preferred.or_else(|| {
            self.entries
                .iter()
                .min_by_key(|(h, e)| (Reverse(self.age(e)), **h))
                .map(|(h, _)| *h)
        })
    }
}

/// Flags slots that keep arriving as zero and unflags slots that stopped.
fn reconcile_const_zero(resident: &mut PredictorTableEntry, incoming: &PredictorTableEntry) {
    for slot in 0..resident.data.chunks().len() {
        let new = *incoming.data.chunk(slot);
        let old = resident.data.chunk_mut(slot);
        let both_zero = old.value() == Some(0) && new.value() == Some(0);
        if both_zero {
            if let Some(flags) = old.flags_mut() {
                flags.const_zero = true;
            }
        } else if old.is_const_zero() && old.value() != new.value() {
            if let Some(flags) = old.flags_mut() {
                flags.const_zero = false;
            }
        }
    }
}

impl FeedbackSink for PredictorTable {
    fn notify_prediction_outcome(
        &mut self,
        hash: PathHash,
        address_correct: bool,
        data_correct: bool,
    ) {
        let now = self.current_order;
        let addr_reward = self.config.addr_age_reward;
        let data_reward = self.config.data_age_reward;
        let Some(entry) = self.entries.get_mut(&hash) else {
            return;
        };
        if address_correct {
            entry.addr_confidence.add(1);
            entry.insertion_order = (entry.insertion_order + addr_reward).min(now);
        } else {
            entry.addr_confidence.sub(1);
        }
        if data_correct {
            entry.data_confidence.add(1);
            entry.insertion_order = (entry.insertion_order + data_reward).min(now);
        } else {
            entry.data_confidence.sub(1);
        }
        trace!(
            target: "wpred::table",
            hash,
            address_correct,
            data_correct,
            addr_confidence = entry.addr_confidence.get(),
            data_confidence = entry.data_confidence.get(),
            "prediction feedback"
        );
    }
}
