//! Prediction engine.
//!
//! `PredictionEngine` owns every table of the pipeline and drives them from the
//! store stream. The environment it runs in supplies address translation and
//! the backing store through the [`Translator`] and [`BackingStore`] traits.
//!
//! Per write the engine:
//! 1. Appends the write to the history log, keyed by the path hash before its PC.
//! 2. Accumulates region writes; lines pushed out dirty become free predictions.
//! 3. Extends the path and promotes every pattern matching the new path.
//! 4. Resolves chunks waiting on the write's PC and publishes completed parents.
//!
//! Per flush of a region line it learns from the accumulated line, then
//! performs the real write-back and matches it against queued predictions.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::accumulator::WriteAccumulator;
use crate::backend::{CompletedWriteEntry, CompletionMatcher, MatchOutcome};
use crate::common::addr::{PhysAddr, VirtAddr, line_align};
use crate::common::constants::{CHUNK_BYTES, LINE_BYTES};
use crate::common::data::{StoreOp, Tick};
use crate::common::error::ConfigError;
use crate::config::Config;
use crate::history::WriteHistoryLog;
use crate::line::Line;
use crate::metadata::{MetadataCaches, RequestKind};
use crate::pending::{Parent, PendingJoinTable};
use crate::predictor::{
    InsertOutcome, LearnOptions, LearnOutcome, PredictorTable, StrideAddressPredictor,
    learn_from_flush,
};
use crate::stats::PredictorStats;

/// Virtual to physical address translation.
pub trait Translator {
    /// Translates `vaddr`, or returns `None` if it is not mapped.
    fn translate(&self, vaddr: VirtAddr) -> Option<PhysAddr>;
}

/// Physical memory behind the engine.
pub trait BackingStore {
    /// Reads `size` bytes at `paddr`.
    fn read(&mut self, paddr: PhysAddr, size: usize) -> Vec<u8>;

    /// Writes `data` at `paddr`.
    fn write(&mut self, paddr: PhysAddr, data: &[u8]);
}

/// Everything the engine needs from its environment.
pub trait Environment: Translator + BackingStore {}

impl<T: Translator + BackingStore> Environment for T {}

/// What a single operation did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Observation {
    /// Patterns promoted by the operation's PC.
    pub promoted: usize,
    /// Parents completed by the operation.
    pub completed: usize,
    /// Pattern predictions submitted.
    pub submitted: usize,
    /// Free predictions submitted.
    pub free_submitted: usize,
    /// Outcome of learning from a flushed line.
    pub learned: Option<InsertOutcome>,
    /// Outcome of the real write-back of a flushed line.
    pub writeback: Option<MatchOutcome>,
}

/// The write-prediction pipeline.
#[derive(Debug)]
pub struct PredictionEngine {
    config: Config,
    log: WriteHistoryLog,
    table: PredictorTable,
    pending: PendingJoinTable,
    accumulator: WriteAccumulator,
    matcher: CompletionMatcher,
    caches: MetadataCaches,
    stride: StrideAddressPredictor,
    stats: PredictorStats,
    now: Tick,
}

impl PredictionEngine {
    /// Creates an engine with empty tables.
    pub fn new(config: Config) -> Self {
        let f = &config.features;
        Self {
            log: WriteHistoryLog::new(config.history.capacity),
            table: PredictorTable::new(
                &config.table,
                !f.disable_confidence,
                f.const_zero_prediction,
            ),
            pending: PendingJoinTable::new(&config.pending, f.const_zero_prediction),
            accumulator: WriteAccumulator::new(&config.accumulator),
            matcher: CompletionMatcher::new(&config.matcher),
            caches: MetadataCaches::new(&config.metadata),
            stride: StrideAddressPredictor::new(),
            stats: PredictorStats::default(),
            now: 0,
            config,
        }
    }

    /// Validates `config` and creates an engine.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field reported by [`Config::validate`].
    pub fn try_new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the write history log.
    pub const fn log(&self) -> &WriteHistoryLog {
        &self.log
    }

    /// Returns the predictor table.
    pub const fn table(&self) -> &PredictorTable {
        &self.table
    }

    /// Returns the pending join table.
    pub const fn pending(&self) -> &PendingJoinTable {
        &self.pending
    }

    /// Returns the write accumulator.
    pub const fn accumulator(&self) -> &WriteAccumulator {
        &self.accumulator
    }

    /// Returns the completion matcher.
    pub const fn matcher(&self) -> &CompletionMatcher {
        &self.matcher
    }

    /// Returns the metadata caches.
    pub const fn caches(&self) -> &MetadataCaches {
        &self.caches
    }

    /// Returns the stride address predictor.
    pub const fn stride(&self) -> &StrideAddressPredictor {
        &self.stride
    }

    /// Returns the latest tick observed.
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Returns a snapshot of the statistics, component counters included.
    pub fn stats(&self) -> PredictorStats {
        let mut s = self.stats.clone();
        s.table_stale_purges = self.table.stale_purges();

        let p = self.pending.counters();
        s.promotions = p.promotions;
        s.const_zero_predictions = p.const_zero_resolved;
        s.reverse_search_hits = p.reverse_search_hits;
        s.pending_evictions = p.evicted_chunks;
        s.abandoned_parents = p.abandoned_parents;

        let m = self.matcher.counters();
        s.fifo_overflow_evictions = m.overflow_evictions;
        s.sweep_evictions = m.sweep_evictions;
        s.invalidated_entries = m.invalidated;
        s.constants_applied = m.constants_applied;

        let c = self.caches.counter.counters();
        s.counter_hits = c.hits;
        s.counter_misses = c.misses;
        s.counter_fills = c.fills;
        s.counter_writebacks = c.writebacks;
        let v = self.caches.verification.counters();
        s.verification_hits = v.hits;
        s.verification_misses = v.misses;
        s.verification_fills = v.fills;
        s.verification_writebacks = v.writebacks;
        s
    }

    /// Observes one store or flush.
    ///
    /// Operations must arrive in non-decreasing tick order; an earlier tick is
    /// treated as the latest one seen.
    pub fn observe_store<E: Environment + ?Sized>(
        &mut self,
        op: &StoreOp,
        env: &mut E,
    ) -> Observation {
        self.now = self.now.max(op.tick);
        let now = self.now;
        let addr = op.addr.val();
        let in_region = self.config.region.contains(addr);
        let mut obs = Observation::default();

        if op.is_flush() {
            self.stats.flushes += 1;
            if in_region {
                self.handle_flush(addr, env, &mut obs);
            }
            let _ = self.service_metadata(env);
            return obs;
        }

        self.stats.writes_observed += 1;
        let (first, values) = op.chunks();
        if !values.is_empty() {
            let chunk_addr = line_align(addr) + (first * CHUNK_BYTES) as u64;
            let _ = self
                .log
                .record(op.pc, chunk_addr, &values, self.table.path_hash(), now);
            self.stats.history_records += 1;
        }

        for line in self.accumulator.retire_expired(now) {
            self.emit_free(&line, env, &mut obs);
        }
        if in_region {
            self.stats.region_writes += 1;
            // A clean line was already emitted by retirement.
            if !values.is_empty()
                && let Some(evicted) = self.accumulator.record(addr, first, &values, op.pc, now)
                && evicted.dirty
            {
                self.emit_free(&evicted, env, &mut obs);
            }
        }

        let mut completed: Vec<Parent> = Vec::new();
        let hashes = self.table.observe_pc(op.pc).to_vec();
        for hash in hashes {
            if let Some(entry) = self.table.lookup(hash) {
                obs.promoted += 1;
                if let Some(parent) = self.pending.promote(entry, &self.log, now) {
                    completed.push(parent);
                }
            }
        }
        completed.extend(self.pending.resolve(op.pc, &values, now));

        for parent in completed {
            obs.completed += 1;
            self.publish(parent, env, &mut obs);
        }

        let _ = self.service_metadata(env);
        obs
    }

    /// Matches a real write-back of the line at `paddr` whose contents are `bytes`.
    pub fn observe_writeback<E: Environment + ?Sized>(
        &mut self,
        paddr: PhysAddr,
        bytes: &[u8],
        env: &mut E,
    ) -> MatchOutcome {
        let outcome = self.match_writeback(paddr, bytes);
        let _ = self.service_metadata(env);
        outcome
    }

    /// Services queued metadata requests through the backing store.
    ///
    /// Fills read the metadata line; write-backs write zeros. Returns the
    /// number of requests serviced.
    pub fn service_metadata<E: BackingStore + ?Sized>(&mut self, env: &mut E) -> usize {
        let mut serviced = 0;
        while serviced < self.config.metadata.drain_per_op {
            let Some(req) = self.caches.pop_request() else {
                break;
            };
            match req.kind {
                RequestKind::Fill => {
                    let _ = env.read(PhysAddr::new(req.addr), req.size);
                }
                RequestKind::WriteBack => env.write(PhysAddr::new(req.addr), &vec![0; req.size]),
            }
            serviced += 1;
        }
        self.stats.metadata_requests_serviced += serviced as u64;
        serviced
    }

    fn handle_flush<E: Environment + ?Sized>(
        &mut self,
        addr: u64,
        env: &mut E,
        obs: &mut Observation,
    ) {
        let vline = line_align(addr);
        if let Some(line) = self.accumulator.take(vline) {
            obs.learned = self.learn(&line);
        }

        let Some(paddr) = env.translate(VirtAddr::new(vline)) else {
            self.stats.untranslatable += 1;
            debug!(target: "wpred::engine", line = vline, "flushed line has no translation");
            return;
        };
        let bytes = env.read(paddr.line(), LINE_BYTES);
        obs.writeback = Some(self.match_writeback(paddr, &bytes));
    }

    fn learn(&mut self, line: &Line) -> Option<InsertOutcome> {
        self.stats.learning_attempts += 1;
        let options = LearnOptions {
            pc_gating: !self.config.features.disable_pc_confidence,
            reverse_search: self.config.features.reverse_search,
            reverse_search_window: self.config.pending.reverse_search_window,
            bounds: self.config.table.confidence,
        };
        if let Some(target) = line.addr {
            self.stride.observe(target);
        }
        match learn_from_flush(line, &mut self.log, self.matcher.pc_confidence(), &options) {
            LearnOutcome::Learned(entry) => {
                self.stats.entries_learned += 1;
                let outcome = self.table.insert(*entry, self.matcher.hash_confidence());
                match outcome {
                    InsertOutcome::Inserted => self.stats.table_insertions += 1,
                    InsertOutcome::Replaced => self.stats.table_replacements += 1,
                    InsertOutcome::Reinforced => self.stats.table_reinforcements += 1,
                    InsertOutcome::InsertedAfterEviction(_) => {
                        self.stats.table_insertions += 1;
                        self.stats.table_capacity_evictions += 1;
                    }
                }
                Some(outcome)
            }
            LearnOutcome::Incomplete {
                address_found,
                data_found,
            } => {
                if !address_found {
                    self.stats.address_not_found += 1;
                }
                if !data_found {
                    self.stats.data_not_found += 1;
                }
                None
            }
        }
    }

    fn match_writeback(&mut self, paddr: PhysAddr, bytes: &[u8]) -> MatchOutcome {
        let now = self.now;
        let key = paddr.line();
        let real = Line::from_bytes(bytes, now);
        let _ = self.caches.counter.write(key.val());
        let _ = self.caches.verification.write_path(key.val());

        let outcome = self.matcher.match_write(key, &real, now, &mut self.table);
        match outcome {
            MatchOutcome::Full { free: true, .. } => self.stats.full_matches_free += 1,
            MatchOutcome::Full { free: false, .. } => self.stats.full_matches_pattern += 1,
            MatchOutcome::Partial { .. } => self.stats.partial_matches += 1,
            MatchOutcome::Miss { .. } => self.stats.total_misses += 1,
            MatchOutcome::Unpredicted => self.stats.unpredicted_writebacks += 1,
        }
        outcome
    }

    fn publish<E: Environment + ?Sized>(
        &mut self,
        parent: Parent,
        env: &mut E,
        obs: &mut Observation,
    ) {
        let now = self.now;
        self.stats.parents_completed += 1;
        let mut entry = CompletedWriteEntry::from_parent(parent, now);

        if self.config.features.stride_address_prediction
            && let Some(target) = self.stride.predict()
            && target != entry.target
        {
            trace!(target: "wpred::engine", from = entry.target, to = target, "stride override");
            entry.target = target;
            entry.line.addr = Some(target);
            self.stats.stride_overrides += 1;
        }
        let _ = self.matcher.apply_constants(&mut entry);

        let Some(paddr) = env.translate(VirtAddr::new(entry.target)) else {
            self.stats.untranslatable += 1;
            return;
        };
        let _ = self
            .matcher
            .submit(entry, paddr, &mut self.caches, &mut self.table, now);
        self.stats.predictions_submitted += 1;
        obs.submitted += 1;
    }

    fn emit_free<E: Environment + ?Sized>(&mut self, line: &Line, env: &mut E, obs: &mut Observation) {
        if self.config.features.disable_free_prediction {
            return;
        }
        let Some(vline) = line.addr else {
            return;
        };
        let now = self.now;
        let Some(paddr) = env.translate(VirtAddr::new(vline)) else {
            self.stats.untranslatable += 1;
            return;
        };
        let key = paddr.line();
        let backing = env.read(key, LINE_BYTES);
        let merged = WriteAccumulator::merge_with_backing(line, &backing, now);

        let entry = CompletedWriteEntry::free(merged, vline, now);
        let _ = self
            .matcher
            .submit(entry, key, &mut self.caches, &mut self.table, now);
        self.stats.free_predictions_submitted += 1;
        obs.free_submitted += 1;
    }
}

/// Sparse byte-addressed memory with identity translation.
///
/// Used by the replay driver and tests as the environment of an engine.
/// Unwritten bytes read as zero.
#[derive(Clone, Debug, Default)]
pub struct SparseMemory {
    lines: HashMap<u64, [u8; LINE_BYTES]>,
}

impl SparseMemory {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the payload of a write; flushes are ignored.
    pub fn apply(&mut self, op: &StoreOp) {
        if !op.is_flush() {
            self.store(op.addr.val(), &op.data);
        }
    }

    /// Writes `data` at `addr`.
    pub fn store(&mut self, addr: u64, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let a = addr.wrapping_add(i as u64);
            let line = self.lines.entry(line_align(a)).or_insert([0; LINE_BYTES]);
            line[(a - line_align(a)) as usize] = byte;
        }
    }

    /// Reads `size` bytes at `addr`.
    pub fn load(&self, addr: u64, size: usize) -> Vec<u8> {
        (0..size as u64)
            .map(|i| {
                let a = addr.wrapping_add(i);
                self.lines
                    .get(&line_align(a))
                    .map_or(0, |line| line[(a - line_align(a)) as usize])
            })
            .collect()
    }

    /// Returns the number of lines ever written.
    pub fn lines_touched(&self) -> usize {
        self.lines.len()
    }
}

impl Translator for SparseMemory {
    fn translate(&self, vaddr: VirtAddr) -> Option<PhysAddr> {
        Some(PhysAddr::new(vaddr.val()))
    }
}

impl BackingStore for SparseMemory {
    fn read(&mut self, paddr: PhysAddr, size: usize) -> Vec<u8> {
        self.load(paddr.val(), size)
    }

    fn write(&mut self, paddr: PhysAddr, data: &[u8]) {
        self.store(paddr.val(), data);
    }
}
