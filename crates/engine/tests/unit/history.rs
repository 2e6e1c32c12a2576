//! Write History Log Unit Tests.
//!
//! Verifies ring ordering, overwrite of the oldest entry and used marking.

use pretty_assertions::assert_eq;
use wpred_core::history::WriteHistoryLog;

/// Iteration runs oldest to newest; the newest-first scan runs backward.
#[test]
fn iteration_order() {
    let mut log = WriteHistoryLog::new(4);
    for pc in 1..=3 {
        let _ = log.record(pc, 0x1000, &[pc as u32], 0, pc);
    }
    let forward: Vec<u64> = log.iter().map(|e| e.pc).collect();
    let backward: Vec<u64> = log.scan_newest_to_oldest().map(|e| e.pc).collect();
    assert_eq!(forward, vec![1, 2, 3]);
    assert_eq!(backward, vec![3, 2, 1]);
}

/// A full log overwrites its oldest entry and never grows past capacity.
#[test]
fn oldest_entry_overwritten() {
    let mut log = WriteHistoryLog::new(2);
    let first = log.record(1, 0x1000, &[1], 0, 1);
    let _ = log.record(2, 0x1000, &[2], 0, 2);
    let _ = log.record(3, 0x1000, &[3], 0, 3);
    assert_eq!(log.len(), 2);
    assert!(log.get(first).is_none());
    assert_eq!(log.iter().map(|e| e.pc).collect::<Vec<_>>(), vec![2, 3]);
}

/// Entries record the path hash, tick and the store's chunks in place.
#[test]
fn entry_contents() {
    let mut log = WriteHistoryLog::new(8);
    let id = log.record(0x40, 0x1008, &[7, 8], 0xabc, 12);
    let e = log.get(id).unwrap();
    assert_eq!((e.path_hash, e.tick), (0xabc, 12));
    assert_eq!(e.line.chunk(2).value(), Some(7));
    assert_eq!(e.line.chunk(3).value(), Some(8));
    assert!(!e.used);
}

/// Marking is idempotent and ignores ids already overwritten.
#[test]
fn mark_used() {
    let mut log = WriteHistoryLog::new(2);
    let a = log.record(1, 0, &[1], 0, 1);
    let b = log.record(2, 0, &[2], 0, 2);
    let _ = log.record(3, 0, &[3], 0, 3);
    log.mark_used(&[a, b, b]);
    assert!(log.get(b).unwrap().used);
    assert_eq!(log.iter().filter(|e| e.used).count(), 1);
}
