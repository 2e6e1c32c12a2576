//! Completion Matcher Unit Tests.
//!
//! Verifies full, partial and miss classification, the feedback each outcome
//! sends, per-line FIFO overflow, the global sweep and metadata stamping.

use crate::common::mocks::MockSink;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use wpred_core::backend::{CompletedWriteEntry, CompletionMatcher, MatchOutcome};
use wpred_core::common::{PathHash, PhysAddr};
use wpred_core::config::{MatcherConfig, MetadataConfig};
use wpred_core::line::{Chunk, Line, Provenance};
use wpred_core::metadata::MetadataCaches;

const LINE: u64 = 0x1000_0000_0040;
const PC: u64 = 0x100;

fn paddr(addr: u64) -> PhysAddr {
    PhysAddr::new(addr)
}

/// Pattern prediction of `values` in the first slots of `target`.
fn predicted(hash: PathHash, target: u64, values: &[u32]) -> CompletedWriteEntry {
    let mut line = Line::at(target, 1);
    for (slot, &v) in values.iter().enumerate() {
        line.set(slot, Chunk::data(v, Provenance::new(PC, 1, slot as u8).owned_by(target)));
    }
    CompletedWriteEntry {
        target,
        original: line.clone(),
        line,
        hash: Some(hash),
        addr_tick: 1,
        data_tick: 1,
        created: 1,
        counter_hit: false,
        verification_misses: 0,
        used: false,
    }
}

fn free(target: u64, values: &[u32]) -> CompletedWriteEntry {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let mut line = Line::from_bytes(&bytes, 1);
    line.addr = Some(target);
    CompletedWriteEntry::free(line, target, 1)
}

fn real(values: &[u32]) -> Line {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    Line::from_bytes(&bytes, 10)
}

struct Fixture {
    matcher: CompletionMatcher,
    caches: MetadataCaches,
}

impl Fixture {
    fn new(config: MatcherConfig) -> Self {
        Self {
            matcher: CompletionMatcher::new(&config),
            caches: MetadataCaches::new(&MetadataConfig::default()),
        }
    }

    fn submit(&mut self, entry: CompletedWriteEntry, sink: &mut MockSink, now: u64) -> usize {
        let target = entry.target;
        self.matcher
            .submit(entry, paddr(target), &mut self.caches, sink, now)
            .swept
    }
}

fn silent_sink() -> MockSink {
    let mut sink = MockSink::new();
    let _ = sink.expect_notify_prediction_outcome().never();
    sink
}

// ══════════════════════════════════════════════════════════
// 1. Full matches
// ══════════════════════════════════════════════════════════

/// A line with no queued prediction is unpredicted.
#[test]
fn no_queue_is_unpredicted() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut sink = silent_sink();
    assert_eq!(
        f.matcher.match_write(paddr(LINE), &real(&[1]), 10, &mut sink),
        MatchOutcome::Unpredicted
    );
}

/// A full match reports success once and raises hash and PC confidence by one.
#[test]
fn full_match_feeds_back() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut quiet = silent_sink();
    let _ = f.submit(predicted(7, LINE, &[1, 2, 3, 4]), &mut quiet, 2);

    let mut sink = MockSink::new();
    let _ = sink.expect_notify_prediction_outcome()
        .with(eq(7), eq(true), eq(true))
        .times(1)
        .return_const(());
    let before = f.matcher.hash_confidence().get(7);
    let outcome = f
        .matcher
        .match_write(paddr(LINE), &real(&[1, 2, 3, 4, 9]), 10, &mut sink);

    assert_eq!(outcome, MatchOutcome::Full { hash: Some(7), free: false });
    assert_eq!(f.matcher.hash_confidence().get(7), before + 1);
    assert_eq!(f.matcher.pc_confidence().get(PC), 7);
    assert!(f.matcher.queued_at(paddr(LINE)).unwrap()[0].used);
}

/// The newest unused full match wins; a consumed prediction never matches again.
#[test]
fn newest_unused_match_wins() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut quiet = silent_sink();
    let _ = f.submit(predicted(1, LINE, &[5]), &mut quiet, 2);
    let _ = f.submit(predicted(2, LINE, &[5]), &mut quiet, 3);

    let mut sink = MockSink::new();
    let _ = sink.expect_notify_prediction_outcome().times(2).return_const(());
    let first = f.matcher.match_write(paddr(LINE), &real(&[5]), 10, &mut sink);
    let second = f.matcher.match_write(paddr(LINE), &real(&[5]), 11, &mut sink);
    assert_eq!(first, MatchOutcome::Full { hash: Some(2), free: false });
    assert_eq!(second, MatchOutcome::Full { hash: Some(1), free: false });
}

/// Free predictions match without feedback.
#[test]
fn free_full_match() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut sink = silent_sink();
    let _ = f.submit(free(LINE, &[1, 2]), &mut sink, 2);
    assert_eq!(
        f.matcher.match_write(paddr(LINE), &real(&[1, 2]), 10, &mut sink),
        MatchOutcome::Full { hash: None, free: true }
    );
}

// ══════════════════════════════════════════════════════════
// 2. Partial matches and constants
// ══════════════════════════════════════════════════════════

/// A partial match sends no feedback, costs the mismatching PC and teaches constants.
#[test]
fn partial_match_learns_constants() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut sink = silent_sink();
    let _ = f.submit(predicted(3, LINE, &[1, 2]), &mut sink, 2);

    let outcome = f.matcher.match_write(paddr(LINE), &real(&[1, 5]), 10, &mut sink);
    assert_eq!(outcome, MatchOutcome::Partial { hash: Some(3), agreeing: 1 });
    assert_eq!(f.matcher.pc_confidence().get(PC), 5);
    // One sighting of a non-zero value is not yet a constant.
    assert_eq!(f.matcher.constants().prediction(3, 1), None);

    let _ = f.matcher.match_write(paddr(LINE), &real(&[1, 5]), 11, &mut sink);
    assert_eq!(f.matcher.constants().prediction(3, 1), Some(5));
    // Slot 0 was predicted correctly and is never tracked.
    assert_eq!(f.matcher.constants().prediction(3, 0), None);
    assert_eq!(f.matcher.constants().len(), 1);

    let mut next = predicted(3, LINE, &[1, 2]);
    assert_eq!(f.matcher.apply_constants(&mut next), 1);
    assert_eq!(next.line.chunk(0).value(), Some(1));
    assert_eq!(next.line.chunk(1).value(), Some(5));
    assert!(next.line.chunk(1).flags().unwrap().constant);
    assert_eq!(f.matcher.counters().constants_applied, 1);
}

/// The candidate agreeing on the most chunks is the partial match.
#[test]
fn best_partial_candidate_chosen() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut sink = silent_sink();
    let _ = f.submit(predicted(1, LINE, &[1, 2, 3]), &mut sink, 2);
    let _ = f.submit(predicted(2, LINE, &[1, 9, 9]), &mut sink, 3);
    assert_eq!(
        f.matcher.match_write(paddr(LINE), &real(&[1, 2, 4]), 10, &mut sink),
        MatchOutcome::Partial { hash: Some(1), agreeing: 2 }
    );
}

// ══════════════════════════════════════════════════════════
// 3. Total misses
// ══════════════════════════════════════════════════════════

/// A write no candidate agrees with drops every unused prediction at the line.
#[test]
fn total_miss_invalidates_unused() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut sink = silent_sink();
    let _ = f.submit(predicted(1, LINE, &[1]), &mut sink, 2);
    let _ = f.submit(predicted(2, LINE, &[2]), &mut sink, 3);
    assert_eq!(
        f.matcher.match_write(paddr(LINE), &real(&[3]), 10, &mut sink),
        MatchOutcome::Miss { invalidated: 2 }
    );
    assert_eq!(f.matcher.total_entries(), 0);
    assert!(f.matcher.queued_at(paddr(LINE)).is_none());
    assert_eq!(f.matcher.counters().invalidated, 2);
}

/// Consumed predictions survive a later miss.
#[test]
fn miss_keeps_used_entries() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut quiet = silent_sink();
    let _ = f.submit(free(LINE, &[1]), &mut quiet, 2);
    let _ = f.matcher.match_write(paddr(LINE), &real(&[1]), 10, &mut quiet);
    assert_eq!(
        f.matcher.match_write(paddr(LINE), &real(&[8]), 11, &mut quiet),
        MatchOutcome::Miss { invalidated: 0 }
    );
    assert_eq!(f.matcher.total_entries(), 1);
}

// ══════════════════════════════════════════════════════════
// 4. Capacity
// ══════════════════════════════════════════════════════════

/// Overflowing a line's FIFO drops its oldest prediction, reported wrong.
#[test]
fn fifo_overflow_reports_dropped_prediction() {
    let mut f = Fixture::new(MatcherConfig {
        max_per_address: 2,
        ..MatcherConfig::default()
    });
    let mut sink = MockSink::new();
    let _ = sink.expect_notify_prediction_outcome()
        .with(eq(1), eq(false), eq(false))
        .times(1)
        .return_const(());
    for h in 1..=3 {
        let _ = f.submit(predicted(h, LINE, &[h as u32]), &mut sink, h);
    }
    let queue = f.matcher.queued_at(paddr(LINE)).unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].hash, Some(2));
    assert_eq!(f.matcher.counters().overflow_evictions, 1);
}

/// Free predictions dropped on overflow send no feedback.
#[test]
fn fifo_overflow_of_free_prediction_is_silent() {
    let mut f = Fixture::new(MatcherConfig {
        max_per_address: 1,
        ..MatcherConfig::default()
    });
    let mut sink = silent_sink();
    let _ = f.submit(free(LINE, &[1]), &mut sink, 1);
    let _ = f.submit(free(LINE, &[2]), &mut sink, 2);
    assert_eq!(f.matcher.total_entries(), 1);
}

/// Past the soft cap the sweep drops the oldest prediction past its age limit.
#[test]
fn sweep_drops_oldest_aged_prediction() {
    let mut f = Fixture::new(MatcherConfig {
        result_buffer_max: 2,
        predicted_age_limit: 10,
        ..MatcherConfig::default()
    });
    let mut sink = silent_sink();
    assert_eq!(f.submit(predicted(1, LINE, &[1]), &mut sink, 0), 0);
    assert_eq!(f.submit(predicted(2, LINE + 0x40, &[1]), &mut sink, 5), 0);
    assert_eq!(f.submit(predicted(3, LINE + 0x80, &[1]), &mut sink, 20), 1);
    assert_eq!(f.matcher.total_entries(), 2);
    assert!(f.matcher.queued_at(paddr(LINE)).is_none());
    assert_eq!(f.matcher.counters().sweep_evictions, 1);
}

/// Consumed predictions are swept before anything else.
#[test]
fn sweep_prefers_used_entries() {
    let mut f = Fixture::new(MatcherConfig {
        result_buffer_max: 2,
        ..MatcherConfig::default()
    });
    let mut sink = silent_sink();
    let _ = f.submit(free(LINE, &[1]), &mut sink, 1);
    let _ = f.matcher.match_write(paddr(LINE), &real(&[1]), 2, &mut sink);
    let _ = f.submit(free(LINE + 0x40, &[1]), &mut sink, 3);
    assert_eq!(f.submit(free(LINE + 0x80, &[1]), &mut sink, 4), 1);
    assert!(f.matcher.queued_at(paddr(LINE)).is_none());
    assert_eq!(f.matcher.total_entries(), 2);
}

// ══════════════════════════════════════════════════════════
// 5. Metadata stamping
// ══════════════════════════════════════════════════════════

/// Submission records the metadata cache state seen by the prediction.
#[test]
fn submission_stamps_metadata() {
    let mut f = Fixture::new(MatcherConfig::default());
    let mut sink = silent_sink();
    let _ = f.submit(free(LINE, &[1]), &mut sink, 1);
    let _ = f.submit(free(LINE, &[2]), &mut sink, 2);
    let queue = f.matcher.queued_at(paddr(LINE)).unwrap();
    assert!(!queue[0].counter_hit);
    assert_eq!(queue[0].verification_misses, 12);
    assert!(queue[1].counter_hit);
    assert_eq!(queue[1].verification_misses, 0);
    assert_eq!(queue[1].created, 2);
}
