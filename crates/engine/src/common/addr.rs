//! Physical and Virtual Address types.
//!
//! This module defines strong types for the two address spaces the engine sees.
//! Stores arrive with virtual addresses; the completion matcher and the metadata
//! caches operate on translated physical addresses. It provides the following:
//! 1. **Type Safety:** Keeps the two spaces apart at compile time.
//! 2. **Line Arithmetic:** Line alignment, intra-line byte offset and chunk index.

use crate::common::constants::{CHUNK_BYTES, LINE_OFFSET_MASK};

/// A virtual address as issued by a store instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u64);

/// A physical address after translation.
///
/// Physical addresses key the completion matcher and the metadata caches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

/// Aligns a raw address down to the start of its line.
#[inline(always)]
pub const fn line_align(addr: u64) -> u64 {
    addr & !LINE_OFFSET_MASK
}

/// Returns the byte offset of a raw address within its line.
#[inline(always)]
pub const fn line_offset(addr: u64) -> u64 {
    addr & LINE_OFFSET_MASK
}

/// Returns the index of the chunk holding a raw address within its line.
#[inline(always)]
pub const fn chunk_index(addr: u64) -> usize {
    (line_offset(addr) as usize) / CHUNK_BYTES
}

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns the line-aligned address containing this one.
    #[inline(always)]
    pub const fn line(&self) -> Self {
        Self(line_align(self.0))
    }

    /// Returns the chunk index of this address within its line.
    #[inline(always)]
    pub const fn chunk(&self) -> usize {
        chunk_index(self.0)
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns the line-aligned address containing this one.
    #[inline(always)]
    pub const fn line(&self) -> Self {
        Self(line_align(self.0))
    }
}

impl std::fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl std::fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
