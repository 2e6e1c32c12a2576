//! Line-flush learning.
//!
//! When a line accumulated from region writes is flushed, the write history is
//! searched for the stores that produced its pointer and its data. A complete
//! search yields a predictor table entry that names, per slot, the store PC
//! whose next write will supply the value.

use tracing::trace;

use crate::backend::feedback::PcConfidence;
use crate::common::confidence::ConfidenceBounds;
use crate::common::data::PathHash;
use crate::history::WriteHistoryLog;
use crate::line::{Chunk, Line, Provenance};
use crate::predictor::entry::PredictorTableEntry;

/// Knobs for a learning pass.
#[derive(Clone, Copy, Debug)]
pub struct LearnOptions {
    /// Skip history entries whose PC confidence is below the learning gate.
    pub pc_gating: bool,
    /// Flag chunks produced outside the recent window for reverse search.
    pub reverse_search: bool,
    /// Number of newest history entries forming the recent window.
    pub reverse_search_window: usize,
    /// Confidence window of the learned entry.
    pub bounds: ConfidenceBounds,
}

/// Result of a learning pass.
#[derive(Clone, Debug)]
pub enum LearnOutcome {
    /// Address and every data chunk were found.
    Learned(Box<PredictorTableEntry>),
    /// The search ended with part of the line unexplained.
    Incomplete {
        /// A pointer to the line was found.
        address_found: bool,
        /// Every valid chunk of the line was found.
        data_found: bool,
    },
}

/// Learns a predictor entry for the flushed `line`.
///
/// The history is walked oldest to newest. Entries already consumed by an
/// earlier flush are skipped, as are entries from PCs below the confidence
/// gate. The first entry holding a pointer to the line supplies the address;
/// the first entry holding each chunk's value supplies that chunk. Every
/// entry that contributed is marked used, whether or not learning completes.
pub fn learn_from_flush(
    line: &Line,
    log: &mut WriteHistoryLog,
    pc_confidence: &PcConfidence,
    options: &LearnOptions,
) -> LearnOutcome {
    let Some(target) = line.addr else {
        return LearnOutcome::Incomplete {
            address_found: false,
            data_found: false,
        };
    };

    let mut address = Chunk::Invalid;
    let mut address_source: Option<u64> = None;
    let mut data = Line::at(target, line.created);
    let mut sources: [Option<u64>; 16] = [None; 16];
    let mut hashes: Vec<PathHash> = Vec::new();
    let mut contributors: Vec<u64> = Vec::new();

    for e in log.iter() {
        if e.used || (options.pc_gating && !pc_confidence.passes_gate(e.pc)) {
            continue;
        }
        let Some(first) = e.line.first_valid_index() else {
            continue;
        };
        let mut contributed = false;

        if address.is_invalid()
            && let Some(i) = e.line.find_address(target)
            && let Some(pointer) = e.line.pointer_at(i)
        {
            let prov = Provenance::new(e.pc, e.tick, (i - first) as u8).owned_by(target);
            address = Chunk::address(pointer, prov);
            address_source = Some(e.id);
            hashes.push(e.path_hash);
            contributed = true;
        }

        for (slot, chunk) in line.iter().enumerate() {
            if sources[slot].is_some() {
                continue;
            }
            let Some(value) = chunk.value() else {
                continue;
            };
            let Some(j) = e.line.find_value(value) else {
                continue;
            };
            let prov = Provenance::new(e.pc, e.tick, (j - first) as u8).owned_by(target);
            data.set(slot, Chunk::data(value, prov));
            sources[slot] = Some(e.id);
            if value != 0 {
                hashes.push(e.path_hash);
            }
            contributed = true;
            #[cfg(feature = "always-trace")]
            trace!(target: "wpred::table", slot, pc = e.pc, value, "chunk source found");
        }

        if contributed {
            contributors.push(e.id);
        }
    }

    log.mark_used(&contributors);

    let address_found = address.is_valid();
    let data_found = line
        .iter()
        .zip(sources.iter())
        .all(|(c, s)| c.is_invalid() || s.is_some());

    let Some(&hash) = hashes.first().filter(|_| address_found && data_found) else {
        trace!(
            target: "wpred::table",
            line = target,
            address_found,
            data_found,
            "line not learned"
        );
        return LearnOutcome::Incomplete {
            address_found,
            data_found,
        };
    };

    if options.reverse_search {
        mark_reverse_search(&mut address, address_source, log, options);
        for (slot, source) in sources.iter().enumerate() {
            mark_reverse_search(data.chunk_mut(slot), *source, log, options);
        }
    }

    let mut original = line.clone();
    original.dirty = false;
    LearnOutcome::Learned(Box::new(PredictorTableEntry::new(
        hash,
        address,
        data,
        original,
        options.bounds,
    )))
}

/// Flags `chunk` when its source precedes the recent window and its PC does
/// not appear in that window.
fn mark_reverse_search(
    chunk: &mut Chunk,
    source: Option<u64>,
    log: &WriteHistoryLog,
    options: &LearnOptions,
) {
    let (Some(source), Some(pc)) = (source, chunk.generating_pc()) else {
        return;
    };
    let window: Vec<_> = log
        .scan_newest_to_oldest()
        .take(options.reverse_search_window)
        .collect();
    let Some(oldest_recent) = window.last().map(|e| e.id) else {
        return;
    };
    if source < oldest_recent
        && !window.iter().any(|e| e.pc == pc)
        && let Some(flags) = chunk.flags_mut()
    {
        flags.reverse_search = true;
    }
}
