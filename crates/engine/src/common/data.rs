//! Store Operation Types.
//!
//! This module defines the operations delivered to the engine by its environment.
//! These types are used for the following:
//! 1. **Classification:** Distinguishing data writes from flush (write-back) hints.
//! 2. **Chunking:** Splitting store payloads into the 4-byte chunks every table works on.
//! 3. **Ordering:** Carrying the simulated tick each operation was issued at.

use crate::common::addr::{VirtAddr, line_offset};
use crate::common::constants::{CHUNK_BYTES, CHUNKS_PER_LINE};

/// Instruction address of a store.
pub type Pc = u64;

/// Simulated time.
pub type Tick = u64;

/// Path hash used as the predictor table key.
pub type PathHash = u64;

/// Kind of an observed memory operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Data write carrying a payload.
    #[default]
    Write,

    /// Flush hint: the line containing the address is being written back.
    ///
    /// Carries no payload. Triggers line learning and the real write-back match.
    Flush,
}

/// A single store or flush observed by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct StoreOp {
    /// Simulated tick the operation was issued at.
    pub tick: Tick,
    /// Instruction address of the store.
    pub pc: Pc,
    /// Virtual target address.
    pub addr: VirtAddr,
    /// Little-endian payload bytes (empty for flushes).
    pub data: Vec<u8>,
    /// Operation kind.
    pub kind: StoreKind,
}

impl StoreOp {
    /// Creates a data write.
    pub fn write(tick: Tick, pc: Pc, addr: u64, data: &[u8]) -> Self {
        Self {
            tick,
            pc,
            addr: VirtAddr::new(addr),
            data: data.to_vec(),
            kind: StoreKind::Write,
        }
    }

    /// Creates a data write from 32-bit words laid out little-endian.
    pub fn write_words(tick: Tick, pc: Pc, addr: u64, words: &[u32]) -> Self {
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self::write(tick, pc, addr, &data)
    }

    /// Creates a flush hint for the line containing `addr`.
    pub fn flush(tick: Tick, pc: Pc, addr: u64) -> Self {
        Self {
            tick,
            pc,
            addr: VirtAddr::new(addr),
            data: Vec::new(),
            kind: StoreKind::Flush,
        }
    }

    /// Returns true if this is a flush hint.
    #[inline]
    pub fn is_flush(&self) -> bool {
        self.kind == StoreKind::Flush
    }

    /// Splits the payload into chunks.
    ///
    /// Returns the index of the first chunk touched within the line and the chunk
    /// values. Only whole, aligned chunks covered by the payload are returned;
    /// leading and trailing partial bytes contribute nothing, so a store
    /// narrower than a chunk yields no values. The portion of a payload that
    /// would cross the end of the line is dropped.
    pub fn chunks(&self) -> (usize, Vec<u32>) {
        let offset = line_offset(self.addr.val()) as usize;
        let skip = (CHUNK_BYTES - offset % CHUNK_BYTES) % CHUNK_BYTES;
        let first = (offset + skip) / CHUNK_BYTES;
        let room = CHUNKS_PER_LINE.saturating_sub(first);
        let values = self
            .data
            .get(skip..)
            .unwrap_or_default()
            .chunks_exact(CHUNK_BYTES)
            .take(room)
            .filter_map(|bytes| <[u8; CHUNK_BYTES]>::try_from(bytes).ok())
            .map(u32::from_le_bytes)
            .collect();
        (first, values)
    }
}
