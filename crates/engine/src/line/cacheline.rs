//! Chunk-shaped lines.
//!
//! A `Line` is the fixed array of 16 chunks covering 64 bytes, plus the
//! bookkeeping the accumulator and the prediction tables attach to it.

use crate::common::addr::line_align;
use crate::common::constants::{CHUNK_BYTES, CHUNKS_PER_LINE, LINE_BYTES, POINTER_HALF_BITS};
use crate::common::data::Tick;
use crate::line::chunk::Chunk;

/// A 64-byte line split into 16 typed chunks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    /// Line-aligned address, when the line is bound to one.
    pub addr: Option<u64>,
    chunks: [Chunk; CHUNKS_PER_LINE],
    /// Set when the line holds data not yet emitted downstream.
    pub dirty: bool,
    /// Tick the line was created at.
    pub created: Tick,
    /// Tick of the most recent write into the line.
    pub updated: Tick,
}

impl Line {
    /// Creates an empty, unbound line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty line bound to the line containing `addr`.
    pub fn at(addr: u64, now: Tick) -> Self {
        Self {
            addr: Some(line_align(addr)),
            created: now,
            updated: now,
            ..Self::default()
        }
    }

    /// Builds a line of free chunks from raw little-endian bytes.
    ///
    /// Missing trailing bytes are treated as zero.
    pub fn from_bytes(bytes: &[u8], now: Tick) -> Self {
        let mut line = Self::new();
        for (i, chunk) in line.chunks.iter_mut().enumerate() {
            let mut word = [0u8; CHUNK_BYTES];
            let start = i * CHUNK_BYTES;
            if start < bytes.len() {
                let end = (start + CHUNK_BYTES).min(bytes.len());
                word[..end - start].copy_from_slice(&bytes[start..end]);
            }
            *chunk = Chunk::free(u32::from_le_bytes(word), now);
        }
        line
    }

    /// Serializes the line to little-endian bytes. Invalid chunks read as zero.
    pub fn to_bytes(&self) -> [u8; LINE_BYTES] {
        let mut out = [0u8; LINE_BYTES];
        for (i, chunk) in self.chunks.iter().enumerate() {
            let word = chunk.value().unwrap_or(0).to_le_bytes();
            out[i * CHUNK_BYTES..(i + 1) * CHUNK_BYTES].copy_from_slice(&word);
        }
        out
    }

    /// Returns the chunk at `index`.
    #[inline]
    pub const fn chunk(&self, index: usize) -> &Chunk {
        &self.chunks[index]
    }

    /// Returns the chunk at `index` for modification.
    #[inline]
    pub const fn chunk_mut(&mut self, index: usize) -> &mut Chunk {
        &mut self.chunks[index]
    }

    /// Replaces the chunk at `index`.
    #[inline]
    pub const fn set(&mut self, index: usize, chunk: Chunk) {
        self.chunks[index] = chunk;
    }

    /// Returns all chunks in slot order.
    #[inline]
    pub const fn chunks(&self) -> &[Chunk; CHUNKS_PER_LINE] {
        &self.chunks
    }

    /// Iterates over the chunks in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Counts the valid chunks.
    pub fn valid_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_valid()).count()
    }

    /// Returns true if no chunk is valid.
    pub fn is_all_invalid(&self) -> bool {
        self.chunks.iter().all(Chunk::is_invalid)
    }

    /// Returns true if every valid data chunk holds zero.
    pub fn is_all_zero(&self) -> bool {
        self.chunks.iter().filter_map(Chunk::value).all(|v| v == 0)
    }

    /// Returns the index of the first valid chunk.
    pub fn first_valid_index(&self) -> Option<usize> {
        self.chunks.iter().position(Chunk::is_valid)
    }

    /// Returns the latest generation tick among the valid chunks.
    pub fn time_of_gen(&self) -> Tick {
        self.chunks.iter().filter_map(Chunk::tick).max().unwrap_or(0)
    }

    /// Copies every valid chunk of `src` into this line.
    ///
    /// Returns the number of slots whose content changed (previously empty or
    /// holding a different value).
    pub fn overwrite_from(&mut self, src: &Self) -> usize {
        let mut replaced = 0;
        for (dst, chunk) in self.chunks.iter_mut().zip(src.chunks.iter()) {
            if chunk.is_valid() {
                if dst.is_invalid() || dst.value() != chunk.value() {
                    replaced += 1;
                }
                *dst = *chunk;
            }
        }
        replaced
    }

    /// Locates a little-endian pointer to the line containing `target`.
    ///
    /// Looks for adjacent data chunks `(lo, hi)` where `lo`, aligned to a line,
    /// equals the low half of the aligned target and `hi` equals its high half.
    /// Returns the index of `lo`.
    pub fn find_address(&self, target: u64) -> Option<usize> {
        let aligned = line_align(target);
        let lo = aligned as u32;
        let hi = (aligned >> POINTER_HALF_BITS) as u32;
        self.chunks.windows(2).position(|pair| {
            match (pair[0].value(), pair[1].value()) {
                (Some(a), Some(b)) => line_align(u64::from(a)) as u32 == lo && b == hi,
                _ => false,
            }
        })
    }

    /// Reads the line-aligned pointer stored at `index` and `index + 1`.
    pub fn pointer_at(&self, index: usize) -> Option<u64> {
        let lo = self.chunks.get(index)?.value()?;
        let hi = self.chunks.get(index + 1)?.value()?;
        Some(line_align(
            u64::from(lo) | (u64::from(hi) << POINTER_HALF_BITS),
        ))
    }

    /// Returns the index of the first data chunk holding `value`.
    pub fn find_value(&self, value: u32) -> Option<usize> {
        self.chunks.iter().position(|c| c.value() == Some(value))
    }
}
