//! Write Accumulator Unit Tests.
//!
//! Verifies per-line coalescing, capacity eviction, idle retirement and the
//! merge of accumulated chunks over backing memory.

use pretty_assertions::assert_eq;
use wpred_core::accumulator::WriteAccumulator;
use wpred_core::config::AccumulatorConfig;

const LINE: u64 = 0x1000_0000_0000;

fn accumulator(capacity: usize) -> WriteAccumulator {
    WriteAccumulator::new(&AccumulatorConfig {
        capacity,
        retire_period: 10,
        retire_threshold: 100,
    })
}

// ══════════════════════════════════════════════════════════
// 1. Coalescing
// ══════════════════════════════════════════════════════════

/// Stores to one line coalesce; later values win.
#[test]
fn stores_coalesce_per_line() {
    let mut acc = accumulator(4);
    assert!(acc.record(LINE, 0, &[1, 2], 0x10, 1).is_none());
    assert!(acc.record(LINE + 4, 1, &[9], 0x11, 2).is_none());
    assert_eq!(acc.len(), 1);
    let line = acc.get(LINE + 0x20).unwrap();
    assert_eq!(line.chunk(0).value(), Some(1));
    assert_eq!(line.chunk(1).value(), Some(9));
    assert_eq!(line.chunk(1).generating_pc(), Some(0x11));
    assert_eq!((line.created, line.updated), (1, 2));
    assert!(line.dirty);
}

/// A new line beyond capacity evicts the oldest line, dirty.
#[test]
fn capacity_evicts_oldest_line() {
    let mut acc = accumulator(2);
    let _ = acc.record(LINE, 0, &[1], 0x10, 1);
    let _ = acc.record(LINE + 0x40, 0, &[2], 0x10, 2);
    let _ = acc.record(LINE, 1, &[3], 0x10, 3);
    let evicted = acc.record(LINE + 0x80, 0, &[4], 0x10, 4).unwrap();
    assert_eq!(evicted.addr, Some(LINE));
    assert!(evicted.dirty);
    assert_eq!(acc.len(), 2);
    assert!(!acc.contains(LINE));
}

/// Taking a line removes it.
#[test]
fn take_removes_line() {
    let mut acc = accumulator(2);
    let _ = acc.record(LINE, 0, &[1], 0x10, 1);
    assert!(acc.take(LINE + 8).is_some());
    assert!(acc.is_empty());
    assert!(acc.take(LINE).is_none());
}

// ══════════════════════════════════════════════════════════
// 2. Retirement
// ══════════════════════════════════════════════════════════

/// Only lines idle past the threshold retire, and only once.
#[test]
fn idle_lines_retire_once() {
    let mut acc = accumulator(4);
    let _ = acc.record(LINE, 0, &[1], 0x10, 1);
    let _ = acc.record(LINE + 0x40, 0, &[2], 0x10, 150);
    let retired = acc.retire_expired(200);
    assert_eq!(retired.len(), 1);
    assert_eq!(retired[0].addr, Some(LINE));
    assert!(retired[0].dirty);
    assert!(!acc.get(LINE).unwrap().dirty);
    assert!(acc.retire_expired(400).iter().all(|l| l.addr != Some(LINE)));
}

/// Retirement runs at most once per period.
#[test]
fn retirement_is_periodic() {
    let mut acc = accumulator(4);
    let _ = acc.record(LINE, 0, &[1], 0x10, 1);
    let _ = acc.record(LINE + 0x40, 0, &[2], 0x10, 2);
    assert_eq!(acc.retire_expired(102).len(), 1);
    assert!(acc.retire_expired(105).is_empty());
    let retired = acc.retire_expired(112);
    assert_eq!(retired.len(), 1);
    assert_eq!(retired[0].addr, Some(LINE + 0x40));
}

// ══════════════════════════════════════════════════════════
// 3. Merge with backing memory
// ══════════════════════════════════════════════════════════

/// Accumulated chunks override backing bytes; every chunk is free.
#[test]
fn merge_overlays_backing() {
    let mut acc = accumulator(4);
    let _ = acc.record(LINE + 4, 1, &[0xaa], 0x10, 3);
    let line = acc.get(LINE).unwrap().clone();
    let backing = [0x11u8; 64];
    let merged = WriteAccumulator::merge_with_backing(&line, &backing, 9);
    assert_eq!(merged.valid_count(), 16);
    assert!(merged.iter().all(|c| c.is_free()));
    assert_eq!(merged.chunk(0).value(), Some(0x1111_1111));
    assert_eq!(merged.chunk(1).value(), Some(0xaa));
    assert_eq!(merged.chunk(1).tick(), Some(3));
    assert_eq!(merged.addr, Some(LINE));
}
