//! Pending Join Table Unit Tests.
//!
//! Verifies promotion, chunk resolution from store payloads, early resolution
//! (constant zero and reverse search), capacity eviction and the generational
//! arena behind parent handles.

use pretty_assertions::assert_eq;
use wpred_core::common::{ConfidenceBounds, Pc};
use wpred_core::config::PendingConfig;
use wpred_core::history::WriteHistoryLog;
use wpred_core::line::{Chunk, Line, Provenance};
use wpred_core::pending::{Arena, PendingJoinTable, SlotRef, SlotState};
use wpred_core::predictor::PredictorTableEntry;

const TARGET: u64 = 0x1000_0000_0040;
const ADDR_PC: Pc = 0x50;
const DATA_PC: Pc = 0x100;

/// Pattern whose address comes from `ADDR_PC` and whose data slots come from
/// `DATA_PC` at the given payload offsets.
fn pattern(slots: &[(usize, u8)]) -> PredictorTableEntry {
    let mut data = Line::at(TARGET, 0);
    for &(slot, off) in slots {
        data.set(slot, Chunk::data(1, Provenance::new(DATA_PC, 0, off).owned_by(TARGET)));
    }
    let original = data.clone();
    PredictorTableEntry::new(
        0xab,
        Chunk::address(TARGET, Provenance::new(ADDR_PC, 0, 0).owned_by(TARGET)),
        data,
        original,
        ConfidenceBounds::new(6, 0, 7),
    )
}

fn table() -> PendingJoinTable {
    PendingJoinTable::new(&PendingConfig::default(), true)
}

fn pointer() -> [u32; 2] {
    [TARGET as u32, (TARGET >> 32) as u32]
}

// ══════════════════════════════════════════════════════════
// 1. Promotion and resolution
// ══════════════════════════════════════════════════════════

/// Every valid chunk waits behind its generating PC.
#[test]
fn promotion_queues_children() {
    let mut t = table();
    let log = WriteHistoryLog::new(8);
    assert!(t.promote(&pattern(&[(0, 0), (1, 1)]), &log, 1).is_none());
    assert_eq!(t.pc_count(), 2);
    assert_eq!(t.pending_for(ADDR_PC), 1);
    assert_eq!(t.pending_for(DATA_PC), 2);
    assert_eq!(t.parent_count(), 1);
    assert_eq!(t.counters().promotions, 1);
}

/// The parent completes once the address and all data have arrived.
#[test]
fn parent_completes_when_all_resolved() {
    let mut t = table();
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&pattern(&[(0, 0), (1, 1)]), &log, 1);
    assert!(t.resolve(ADDR_PC, &pointer(), 2).is_empty());
    let done = t.resolve(DATA_PC, &[7, 8], 3);
    assert_eq!(done.len(), 1);
    let parent = &done[0];
    assert!(parent.is_complete());
    assert_eq!(parent.target(), Some(TARGET));
    assert_eq!(parent.data.chunk(0).value(), Some(7));
    assert_eq!(parent.data.chunk(1).value(), Some(8));
    assert_eq!((parent.addr_tick, parent.data_tick), (2, 3));
    assert_eq!(t.parent_count(), 0);
    assert_eq!(t.pc_count(), 0);
}

/// A store carrying only one pointer half leaves the address pending.
#[test]
fn address_needs_both_halves() {
    let mut t = table();
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&pattern(&[(0, 0)]), &log, 1);
    assert!(t.resolve(ADDR_PC, &pointer()[..1], 2).is_empty());
    assert_eq!(t.pending_for(ADDR_PC), 1);
    let _ = t.resolve(ADDR_PC, &pointer(), 3);
    assert_eq!(t.pending_for(ADDR_PC), 0);
}

/// A data offset past the payload stays queued.
#[test]
fn short_payload_keeps_child() {
    let mut t = table();
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&pattern(&[(4, 1)]), &log, 1);
    assert!(t.resolve(DATA_PC, &[9], 2).is_empty());
    assert_eq!(t.pending_for(DATA_PC), 1);
    assert!(t.get_completed_parent(DATA_PC).is_none());
}

/// A completed parent is handed out once; its handle is dead afterwards.
#[test]
fn completed_parent_leaves_arena() {
    let mut t = table();
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&pattern(&[(0, 0)]), &log, 1);
    let _ = t.resolve(ADDR_PC, &pointer(), 2);
    assert_eq!(t.resolve(DATA_PC, &[5], 3).len(), 1);
    assert!(t.resolve(DATA_PC, &[5], 4).is_empty());
}

// ══════════════════════════════════════════════════════════
// 2. Early resolution
// ══════════════════════════════════════════════════════════

fn const_zero_pattern() -> PredictorTableEntry {
    let mut e = pattern(&[(0, 0)]);
    let chunk = e.data.chunk_mut(0);
    *chunk = Chunk::data(0, Provenance::new(DATA_PC, 0, 0).owned_by(TARGET));
    if let Some(flags) = chunk.flags_mut() {
        flags.const_zero = true;
    }
    e
}

/// Constant-zero chunks resolve at promotion.
#[test]
fn const_zero_resolved_at_promotion() {
    let mut t = table();
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&const_zero_pattern(), &log, 1);
    assert_eq!(t.pending_for(DATA_PC), 0);
    assert_eq!(t.counters().const_zero_resolved, 1);
    let done = t.resolve(ADDR_PC, &pointer(), 2);
    assert_eq!(done[0].data.chunk(0).value(), Some(0));
}

/// With the feature off, constant-zero chunks wait like any other.
#[test]
fn const_zero_disabled_queues() {
    let mut t = PendingJoinTable::new(&PendingConfig::default(), false);
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&const_zero_pattern(), &log, 1);
    assert_eq!(t.pending_for(DATA_PC), 1);
}

fn reverse_pattern() -> PredictorTableEntry {
    let mut e = pattern(&[(0, 0)]);
    if let Some(flags) = e.address.flags_mut() {
        flags.reverse_search = true;
    }
    if let Some(flags) = e.data.chunk_mut(0).flags_mut() {
        flags.reverse_search = true;
    }
    e
}

/// Reverse-search chunks read the latest store of their PC from the log.
#[test]
fn reverse_search_resolves_from_log() {
    let mut t = table();
    let mut log = WriteHistoryLog::new(8);
    let _ = log.record(ADDR_PC, 0x3000, &pointer(), 0, 1);
    let _ = log.record(DATA_PC, 0x4000, &[0x11], 0, 2);
    let _ = log.record(DATA_PC, 0x4000, &[0x22], 0, 3);
    let parent = t.promote(&reverse_pattern(), &log, 4).unwrap();
    assert_eq!(parent.target(), Some(TARGET));
    assert_eq!(parent.data.chunk(0).value(), Some(0x22));
    assert_eq!(t.counters().reverse_search_hits, 2);
    assert_eq!(t.parent_count(), 0);
}

/// A reverse search that finds nothing falls back to queueing.
#[test]
fn reverse_search_miss_queues() {
    let mut t = table();
    let log = WriteHistoryLog::new(8);
    assert!(t.promote(&reverse_pattern(), &log, 1).is_none());
    assert_eq!(t.pending_for(ADDR_PC), 1);
    assert_eq!(t.pending_for(DATA_PC), 1);
}

// ══════════════════════════════════════════════════════════
// 3. Capacity
// ══════════════════════════════════════════════════════════

/// Exceeding the PC limit drops the oldest queue and its parents.
#[test]
fn oldest_pc_queue_evicted() {
    let config = PendingConfig {
        max_pcs: 1,
        ..PendingConfig::default()
    };
    let mut t = PendingJoinTable::new(&config, true);
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&pattern(&[(0, 0)]), &log, 1);
    assert_eq!(t.pc_count(), 0);
    assert_eq!(t.parent_count(), 0);
    assert_eq!(t.counters().abandoned_parents, 1);
    assert!(t.resolve(DATA_PC, &[1], 2).is_empty());
}

/// Overflowing one PC's queue abandons the parent of the dropped chunk.
#[test]
fn per_pc_overflow_abandons_parent() {
    let config = PendingConfig {
        max_chunks_per_pc: 1,
        ..PendingConfig::default()
    };
    let mut t = PendingJoinTable::new(&config, true);
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&pattern(&[(0, 0)]), &log, 1);
    let _ = t.promote(&pattern(&[(0, 0)]), &log, 2);
    assert_eq!(t.counters().abandoned_parents, 1);
    // The abandoned parent's data chunk is purged, not evicted later.
    assert_eq!(t.counters().evicted_chunks, 1);
    assert_eq!(t.pending_for(DATA_PC), 1);
    let _ = t.resolve(ADDR_PC, &pointer(), 3);
    assert_eq!(t.resolve(DATA_PC, &[5], 4).len(), 1);
}

/// Evicting a PC queue purges the abandoned parent's chunks from other queues.
#[test]
fn abandoned_parent_leaves_no_children() {
    let config = PendingConfig {
        max_pcs: 2,
        ..PendingConfig::default()
    };
    let mut t = PendingJoinTable::new(&config, true);
    let log = WriteHistoryLog::new(8);
    let _ = t.promote(&pattern(&[(0, 0)]), &log, 1);
    assert_eq!(t.pending_for(DATA_PC), 1);

    let mut other = pattern(&[(0, 0)]);
    other.address = Chunk::address(TARGET, Provenance::new(0x60, 0, 0).owned_by(TARGET));
    let _ = t.promote(&other, &log, 2);

    assert_eq!(t.counters().abandoned_parents, 1);
    assert_eq!(t.counters().evicted_chunks, 1);
    assert_eq!(t.pending_for(ADDR_PC), 0);
    assert_eq!(t.pending_for(DATA_PC), 1);
    assert_eq!(t.pc_count(), 2);
    assert_eq!(t.parent_count(), 1);

    assert!(t.resolve(0x60, &pointer(), 3).is_empty());
    let done = t.resolve(DATA_PC, &[5], 4);
    assert_eq!(done.len(), 1);
    assert_eq!(t.pc_count(), 0);
}

// ══════════════════════════════════════════════════════════
// 4. Arena and slot state
// ══════════════════════════════════════════════════════════

/// Removing a value invalidates its handle even after the slot is reused.
#[test]
fn arena_handles_are_generational() {
    let mut arena: Arena<u32> = Arena::new();
    let a = arena.insert(1);
    assert_eq!(arena.remove(a), Some(1));
    let b = arena.insert(2);
    assert_eq!(a.index(), b.index());
    assert_ne!(a.generation(), b.generation());
    assert_eq!(arena.get(a), None);
    assert_eq!(arena.get(b), Some(&2));
    assert_eq!(arena.len(), 1);
}

/// Slot states move from waiting to resolved and never back.
#[test]
fn slot_state_progression() {
    let mut parent = wpred_core::pending::Parent::from_entry(&pattern(&[(2, 0)]), 1);
    assert_eq!(parent.state(SlotRef::Address), SlotState::Waiting);
    assert_eq!(parent.state(SlotRef::Data(2)), SlotState::Waiting);
    assert_eq!(parent.state(SlotRef::Data(3)), SlotState::Absent);
    parent.resolve_data(2, 4, 2);
    parent.resolve_address(TARGET as u32, (TARGET >> 32) as u32, 3);
    assert!(parent.is_complete());
    parent.resolve_data(2, 5, 4);
    assert!(parent.is_complete());
    assert_eq!(parent.state(SlotRef::Data(2)), SlotState::Resolved);
}
