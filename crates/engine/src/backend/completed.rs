//! Completed write entries.

use crate::common::data::{PathHash, Tick};
use crate::line::Line;
use crate::pending::parent::Parent;

/// A finished prediction waiting for the real write-back of its line.
#[derive(Clone, Debug)]
pub struct CompletedWriteEntry {
    /// Predicted target line (virtual).
    pub target: u64,
    /// Predicted line contents.
    pub line: Line,
    /// Generator hash; `None` for free predictions.
    pub hash: Option<PathHash>,
    /// Tick the address was resolved at.
    pub addr_tick: Tick,
    /// Tick the data was resolved at.
    pub data_tick: Tick,
    /// Tick the entry was created at.
    pub created: Tick,
    /// Original snapshot of the pattern.
    pub original: Line,
    /// Counter cache hit at submission.
    pub counter_hit: bool,
    /// Verification tree levels missed at submission.
    pub verification_misses: u32,
    /// Set once a write-back matched this entry.
    pub used: bool,
}

impl CompletedWriteEntry {
    /// Converts a completed parent into a pattern prediction.
    ///
    /// # Panics
    ///
    /// Panics if the parent is not complete or a published chunk has no
    /// generating PC.
    pub fn from_parent(parent: Parent, now: Tick) -> Self {
        let target = match (parent.is_complete(), parent.target()) {
            (true, Some(target)) => target,
            _ => panic!(
                "incomplete parent {:#x} converted to a completed write",
                parent.hash
            ),
        };
        parent.address.assert_provenance();
        parent.data.iter().for_each(crate::line::Chunk::assert_provenance);
        let mut line = parent.data;
        line.addr = Some(target);
        Self {
            target,
            line,
            hash: Some(parent.hash),
            addr_tick: parent.addr_tick,
            data_tick: parent.data_tick,
            created: now,
            original: parent.original,
            counter_hit: false,
            verification_misses: 0,
            used: false,
        }
    }

    /// Creates a free prediction from a merged accumulator line.
    pub fn free(line: Line, target: u64, now: Tick) -> Self {
        let tick = line.time_of_gen();
        Self {
            target,
            original: line.clone(),
            line,
            hash: None,
            addr_tick: tick,
            data_tick: tick,
            created: now,
            counter_hit: false,
            verification_misses: 0,
            used: false,
        }
    }

    /// Returns true if the entry came from the write accumulator.
    pub const fn is_free(&self) -> bool {
        self.hash.is_none()
    }

    /// Returns the entry's age at `now`.
    pub const fn age(&self, now: Tick) -> Tick {
        now.saturating_sub(self.created)
    }
}
