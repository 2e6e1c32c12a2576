//! Pending parent records.
//!
//! A parent is the prediction under construction for one promoted pattern. Its
//! address and data slots are filled in as the stores they wait on arrive.

use crate::common::addr::line_align;
use crate::common::constants::{CHUNKS_PER_LINE, POINTER_HALF_BITS};
use crate::common::data::{PathHash, Tick};
use crate::line::{Chunk, Line};
use crate::predictor::entry::PredictorTableEntry;

/// Resolution state of one parent slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SlotState {
    /// Not part of the pattern.
    #[default]
    Absent,
    /// Waiting on its generating store.
    Waiting,
    /// Value known.
    Resolved,
}

/// Which parent slot a pending chunk fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotRef {
    /// The target address.
    Address,
    /// A data slot of the target line.
    Data(u8),
}

/// A prediction being assembled from pending chunks.
#[derive(Clone, Debug)]
pub struct Parent {
    /// Generator hash of the pattern.
    pub hash: PathHash,
    /// Address chunk; carries the source PC until resolved, then the target.
    pub address: Chunk,
    /// Data chunks at their slot in the target line.
    pub data: Line,
    /// Original snapshot of the pattern.
    pub original: Line,
    /// Tick the pattern was promoted at.
    pub created: Tick,
    /// Tick the address was resolved at.
    pub addr_tick: Tick,
    /// Tick the last data chunk was resolved at.
    pub data_tick: Tick,
    addr_state: SlotState,
    data_state: [SlotState; CHUNKS_PER_LINE],
}

impl Parent {
    /// Creates a parent waiting on every valid chunk of `entry`.
    pub fn from_entry(entry: &PredictorTableEntry, now: Tick) -> Self {
        let mut data_state = [SlotState::Absent; CHUNKS_PER_LINE];
        for (state, chunk) in data_state.iter_mut().zip(entry.data.iter()) {
            if chunk.is_valid() {
                *state = SlotState::Waiting;
            }
        }
        Self {
            hash: entry.hash,
            address: entry.address,
            data: entry.data.clone(),
            original: entry.original.clone(),
            created: now,
            addr_tick: 0,
            data_tick: 0,
            addr_state: if entry.address.is_valid() {
                SlotState::Waiting
            } else {
                SlotState::Absent
            },
            data_state,
        }
    }

    /// Returns the state of a slot.
    pub const fn state(&self, slot: SlotRef) -> SlotState {
        match slot {
            SlotRef::Address => self.addr_state,
            SlotRef::Data(i) => self.data_state[i as usize],
        }
    }

    /// Returns true once the address and every waiting data slot are resolved.
    pub fn is_complete(&self) -> bool {
        self.addr_state == SlotState::Resolved
            && self.data_state.iter().all(|s| *s != SlotState::Waiting)
    }

    /// Resolves the address from the two pointer halves.
    pub fn resolve_address(&mut self, lo: u32, hi: u32, now: Tick) {
        let target = line_align(u64::from(lo) | (u64::from(hi) << POINTER_HALF_BITS));
        if let Chunk::Address {
            target: t,
            provenance,
            ..
        } = &mut self.address
        {
            *t = target;
            provenance.tick = now;
        }
        self.addr_state = SlotState::Resolved;
        self.addr_tick = now;
    }

    /// Resolves a data slot.
    pub fn resolve_data(&mut self, slot: u8, value: u32, now: Tick) {
        if let Chunk::Data {
            value: v,
            provenance,
            ..
        } = self.data.chunk_mut(slot as usize)
        {
            *v = value;
            provenance.tick = now;
        }
        self.data_state[slot as usize] = SlotState::Resolved;
        self.data_tick = self.data_tick.max(now);
    }

    /// Returns the resolved target line address.
    pub fn target(&self) -> Option<u64> {
        (self.addr_state == SlotState::Resolved)
            .then(|| self.address.target())
            .flatten()
    }
}
