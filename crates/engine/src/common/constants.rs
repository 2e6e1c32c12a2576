//! Line and Chunk Geometry Constants.
//!
//! This module defines the fixed geometry shared by every table in the engine:
//! 1. **Chunks:** The 4-byte unit every line is divided into.
//! 2. **Lines:** The 64-byte unit predictions are made for.
//! 3. **Pointers:** The two-chunk little-endian encoding used for address sources.

/// Size of one chunk in bytes.
pub const CHUNK_BYTES: usize = 4;

/// Number of chunks in one line.
pub const CHUNKS_PER_LINE: usize = 16;

/// Size of one line in bytes.
pub const LINE_BYTES: usize = CHUNK_BYTES * CHUNKS_PER_LINE;

/// Number of bits to shift to convert between bytes and lines.
pub const LINE_SHIFT: u64 = 6;

/// Mask for extracting the byte offset within a line.
pub const LINE_OFFSET_MASK: u64 = (LINE_BYTES as u64) - 1;

/// Number of chunks an address source occupies (a 64-bit pointer).
pub const POINTER_CHUNKS: usize = 2;

/// Number of bits in the low half of a pointer.
pub const POINTER_HALF_BITS: u32 = 32;
