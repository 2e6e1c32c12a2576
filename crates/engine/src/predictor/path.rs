//! Path history.
//!
//! The predictor table is keyed by a hash of the most recent store PCs. Each PC
//! is shifted left by its position in the path (the oldest PC by zero) and the
//! results are XOR-ed together.

use std::collections::VecDeque;

use crate::common::data::{PathHash, Pc};

/// Bounded history of recent store PCs.
#[derive(Clone, Debug)]
pub struct PathHistory {
    pcs: VecDeque<Pc>,
    len: usize,
}

impl PathHistory {
    /// Creates an empty history holding at most `len` PCs.
    pub fn new(len: usize) -> Self {
        Self {
            pcs: VecDeque::with_capacity(len),
            len: len.max(1),
        }
    }

    /// Appends a PC, dropping the oldest one once the history is full.
    pub fn push(&mut self, pc: Pc) {
        if self.pcs.len() == self.len {
            let _ = self.pcs.pop_front();
        }
        self.pcs.push_back(pc);
    }

    /// Returns the hash of the current path.
    pub fn hash(&self) -> PathHash {
        self.pcs
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &pc)| acc ^ pc.checked_shl(i as u32).unwrap_or(0))
    }

    /// Returns the number of PCs currently held.
    pub fn len(&self) -> usize {
        self.pcs.len()
    }

    /// Returns true if no PC has been observed.
    pub fn is_empty(&self) -> bool {
        self.pcs.is_empty()
    }
}
