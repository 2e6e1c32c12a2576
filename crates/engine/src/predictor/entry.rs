//! Predictor table entry.

use crate::common::confidence::{Confidence, ConfidenceBounds};
use crate::common::data::{PathHash, Pc};
use crate::line::{Chunk, Line};

/// A learned line pattern keyed by the path hash it was seen under.
///
/// The address chunk and every valid data chunk name the store PC that will
/// supply its value the next time the pattern runs.
#[derive(Clone, Debug)]
pub struct PredictorTableEntry {
    /// Path hash key, also the generator hash of predictions made from it.
    pub hash: PathHash,
    /// Source of the target address.
    pub address: Chunk,
    /// Sources of the data chunks, at their slot in the target line.
    pub data: Line,
    /// Snapshot of the flushed line the pattern was learned from.
    pub original: Line,
    /// Confidence that the address source is right.
    pub addr_confidence: Confidence,
    /// Confidence that the data sources are right.
    pub data_confidence: Confidence,
    /// Table insertion order, moved forward by correct predictions.
    pub insertion_order: u64,
    /// Set when the pattern predicts an address but no data.
    pub addr_only: bool,
}

impl PredictorTableEntry {
    /// Creates an entry with both confidences at their initial value.
    pub fn new(
        hash: PathHash,
        address: Chunk,
        data: Line,
        original: Line,
        bounds: ConfidenceBounds,
    ) -> Self {
        let addr_only = data.is_all_invalid();
        Self {
            hash,
            address,
            data,
            original,
            addr_confidence: Confidence::new(bounds),
            data_confidence: Confidence::new(bounds),
            insertion_order: 0,
            addr_only,
        }
    }

    /// Returns true if the entry carries an original snapshot with data.
    pub fn has_original_line(&self) -> bool {
        !self.original.is_all_invalid()
    }

    /// Returns the distinct PCs the pattern waits on, address source first.
    pub fn generating_pcs(&self) -> Vec<Pc> {
        let mut pcs: Vec<Pc> = Vec::new();
        for pc in std::iter::once(&self.address)
            .chain(self.data.iter())
            .filter_map(Chunk::generating_pc)
        {
            if !pcs.contains(&pc) {
                pcs.push(pc);
            }
        }
        pcs
    }
}
