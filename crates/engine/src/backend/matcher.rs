//! Completion Matcher.
//!
//! Finished predictions wait per physical line until the real write-back of
//! that line arrives. The matcher then decides which prediction, if any, was
//! right, and routes the outcome to the confidence tables:
//! 1. **Full match:** The newest unused prediction agreeing on every valid chunk wins.
//! 2. **Partial match:** Without a full match, the candidate agreeing on the most
//!    chunks feeds constant-value learning. No table feedback is sent.
//! 3. **Total miss:** No candidate agrees on anything; every unused prediction at
//!    the line is dropped as stale.
//!
//! Mismatching chunks of every examined candidate cost their generating PC one
//! step of confidence, unless the chunk came from write coalescing.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::backend::completed::CompletedWriteEntry;
use crate::backend::feedback::{ConstantTracker, FeedbackSink, HashConfidence, PcConfidence};
use crate::common::addr::PhysAddr;
use crate::common::data::{PathHash, Tick};
use crate::config::MatcherConfig;
use crate::line::{Chunk, Line};
use crate::metadata::MetadataCaches;

/// Result of matching a real write-back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A prediction agreed on every valid chunk.
    Full {
        /// Generator hash, `None` for a free prediction.
        hash: Option<PathHash>,
        /// The prediction came from the write accumulator.
        free: bool,
    },
    /// The best candidate agreed on some chunks.
    Partial {
        /// Generator hash of the best candidate.
        hash: Option<PathHash>,
        /// Chunks it agreed on.
        agreeing: usize,
    },
    /// Predictions existed but none agreed on any chunk.
    Miss {
        /// Unused predictions dropped from the line.
        invalidated: usize,
    },
    /// No prediction was waiting for the line.
    Unpredicted,
}

/// Result of submitting a prediction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The line's FIFO was full and its oldest prediction was dropped.
    pub overflowed: bool,
    /// Predictions removed by the global sweep.
    pub swept: usize,
}

/// Event counts kept by the matcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatcherCounters {
    /// Predictions dropped from a full per-line FIFO.
    pub overflow_evictions: u64,
    /// Predictions removed by the global sweep.
    pub sweep_evictions: u64,
    /// Unused predictions dropped by total misses.
    pub invalidated: u64,
    /// Constant values substituted into predictions.
    pub constants_applied: u64,
}

/// Per-line FIFOs of completed predictions and the confidence tables they train.
#[derive(Debug)]
pub struct CompletionMatcher {
    queues: HashMap<PhysAddr, VecDeque<CompletedWriteEntry>>,
    total: usize,
    config: MatcherConfig,
    hash_confidence: HashConfidence,
    pc_confidence: PcConfidence,
    constants: ConstantTracker,
    counters: MatcherCounters,
}

impl CompletionMatcher {
    /// Creates an empty matcher.
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            queues: HashMap::new(),
            total: 0,
            config: config.clone(),
            hash_confidence: HashConfidence::new(config.hash_confidence_max),
            pc_confidence: PcConfidence::new(config.pc_confidence, config.pc_confidence_gate),
            constants: ConstantTracker::new(config.constant_threshold, config.constant_cap),
            counters: MatcherCounters::default(),
        }
    }

    /// Returns the predictions queued for `paddr`, oldest first.
    pub fn queued_at(&self, paddr: PhysAddr) -> Option<&VecDeque<CompletedWriteEntry>> {
        self.queues.get(&paddr.line())
    }

    /// Returns the number of queued predictions across all lines.
    pub const fn total_entries(&self) -> usize {
        self.total
    }

    /// Returns the generator-hash confidence table.
    pub const fn hash_confidence(&self) -> &HashConfidence {
        &self.hash_confidence
    }

    /// Returns the per-PC confidence table.
    pub const fn pc_confidence(&self) -> &PcConfidence {
        &self.pc_confidence
    }

    /// Returns the constant-value tracker.
    pub const fn constants(&self) -> &ConstantTracker {
        &self.constants
    }

    /// Returns the event counts.
    pub const fn counters(&self) -> MatcherCounters {
        self.counters
    }

    /// Substitutes learned constants into a pattern prediction.
    pub fn apply_constants(&mut self, entry: &mut CompletedWriteEntry) -> usize {
        let Some(hash) = entry.hash else {
            return 0;
        };
        let applied = self.constants.apply(hash, &mut entry.line, &entry.original);
        self.counters.constants_applied += applied as u64;
        applied
    }

    /// Queues a prediction for the physical line `paddr`.
    ///
    /// Both metadata caches are consulted and their outcome stamped on the
    /// entry. If the line's FIFO overflows, its oldest prediction is dropped
    /// and, if it was an unused pattern prediction, reported wrong on both
    /// counts.
    pub fn submit(
        &mut self,
        mut entry: CompletedWriteEntry,
        paddr: PhysAddr,
        caches: &mut MetadataCaches,
        sink: &mut dyn FeedbackSink,
        now: Tick,
    ) -> SubmitOutcome {
        let key = paddr.line();
        entry.counter_hit = caches.counter.read(key.val());
        entry.verification_misses = caches.verification.read_path(key.val());
        entry.created = now;

        trace!(
            target: "wpred::matcher",
            line = %key,
            hash = ?entry.hash,
            counter_hit = entry.counter_hit,
            verification_misses = entry.verification_misses,
            "prediction queued"
        );

        let mut outcome = SubmitOutcome::default();
        let queue = self.queues.entry(key).or_default();
        queue.push_back(entry);
        self.total += 1;

        if queue.len() > self.config.max_per_address
            && let Some(old) = queue.pop_front()
        {
            self.total -= 1;
            self.counters.overflow_evictions += 1;
            outcome.overflowed = true;
            if !old.used
                && let Some(hash) = old.hash
            {
                sink.notify_prediction_outcome(hash, false, false);
            }
        }

        if self.total > self.config.result_buffer_max {
            outcome.swept = self.sweep(now);
        }
        outcome
    }

    /// Matches the real write-back `real` of line `paddr` against its predictions.
    pub fn match_write(
        &mut self,
        paddr: PhysAddr,
        real: &Line,
        now: Tick,
        sink: &mut dyn FeedbackSink,
    ) -> MatchOutcome {
        let key = paddr.line();
        let Some(queue) = self.queues.get_mut(&key) else {
            return MatchOutcome::Unpredicted;
        };

        if let Some(entry) = queue
            .iter_mut()
            .rev()
            .find(|e| !e.used && is_full_match(e, real))
        {
            entry.used = true;
            let hash = entry.hash;
            let free = entry.is_free();
            if let Some(hash) = hash {
                sink.notify_prediction_outcome(hash, true, true);
                self.hash_confidence.increment(hash);
                for pc in entry
                    .line
                    .iter()
                    .filter(|c| c.is_valid() && !c.is_free())
                    .filter_map(Chunk::generating_pc)
                {
                    self.pc_confidence.increment(pc);
                }
            }
            debug!(target: "wpred::matcher", line = %key, ?hash, free, age = entry.age(now), "full match");
            return MatchOutcome::Full { hash, free };
        }

        let mut best: Option<(usize, usize)> = None;
        for (idx, entry) in queue.iter().enumerate().rev() {
            if entry.used {
                continue;
            }
            let mut agreeing = 0;
            for (slot, chunk) in entry.line.iter().enumerate() {
                let Some(predicted) = chunk.value() else {
                    continue;
                };
                if real.chunk(slot).value() == Some(predicted) {
                    agreeing += 1;
                } else if !chunk.is_free()
                    && let Some(pc) = chunk.generating_pc()
                {
                    self.pc_confidence.decrement(pc);
                    #[cfg(feature = "always-trace")]
                    trace!(target: "wpred::matcher", slot, pc, predicted, "chunk mismatch");
                }
            }
            if agreeing > 0 && best.is_none_or(|(_, a)| agreeing > a) {
                best = Some((idx, agreeing));
            }
        }

        if let Some((idx, agreeing)) = best {
            let entry = &queue[idx];
            let hash = entry.hash;
            if let Some(hash) = hash {
                for (slot, chunk) in entry.line.iter().enumerate() {
                    if let Some(predicted) = chunk.value()
                        && let Some(value) = real.chunk(slot).value()
                        && predicted != value
                    {
                        self.constants.observe(hash, slot, value);
                    }
                }
            }
            trace!(target: "wpred::matcher", line = %key, ?hash, agreeing, "partial match");
            return MatchOutcome::Partial { hash, agreeing };
        }

        let before = queue.len();
        queue.retain(|e| e.used);
        let invalidated = before - queue.len();
        if queue.is_empty() {
            let _ = self.queues.remove(&key);
        }
        self.total -= invalidated;
        self.counters.invalidated += invalidated as u64;
        debug!(target: "wpred::matcher", line = %key, invalidated, "total miss");
        MatchOutcome::Miss { invalidated }
    }

    /// Brings the total back toward the soft cap.
    ///
    /// Consumed predictions go first. Then the single oldest unused prediction
    /// past its age limit is dropped. Returns the number removed.
    fn sweep(&mut self, now: Tick) -> usize {
        let mut removed = 0;
        self.queues.retain(|_, q| {
            let before = q.len();
            q.retain(|e| !e.used);
            removed += before - q.len();
            !q.is_empty()
        });
        self.total -= removed;

        if self.total > self.config.result_buffer_max {
            let free_limit = self.config.free_age_limit;
            let predicted_limit = self.config.predicted_age_limit;
            let oldest = self
                .queues
                .iter()
                .flat_map(|(k, q)| q.iter().enumerate().map(move |(i, e)| (*k, i, e)))
                .filter(|(_, _, e)| {
                    let limit = if e.is_free() { free_limit } else { predicted_limit };
                    e.age(now) > limit
                })
                .min_by_key(|(k, i, e)| (e.created, *k, *i))
                .map(|(k, i, _)| (k, i));
            if let Some((k, i)) = oldest
                && let Some(q) = self.queues.get_mut(&k)
                && q.remove(i).is_some()
            {
                removed += 1;
                self.total -= 1;
                if q.is_empty() {
                    let _ = self.queues.remove(&k);
                }
            }
        }
        self.counters.sweep_evictions += removed as u64;
        removed
    }
}

/// True if every valid predicted chunk equals the real line.
fn is_full_match(entry: &CompletedWriteEntry, real: &Line) -> bool {
    if entry.original.is_all_invalid() || entry.line.is_all_invalid() {
        return false;
    }
    entry
        .line
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_valid())
        .all(|(slot, c)| c.value().is_some() && real.chunk(slot).value() == c.value())
}
