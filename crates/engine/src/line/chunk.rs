//! Typed line chunks.
//!
//! A chunk is the smallest (4-byte) unit of a line. It is either empty, holds a
//! data value, or holds a resolved target address. Valid chunks always carry the
//! provenance of the store that produced them.

use crate::common::data::{Pc, Tick};

/// Where a chunk's value came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Provenance {
    /// Instruction address of the generating store; `None` for free chunks.
    pub pc: Option<Pc>,
    /// Tick the generating store was observed at.
    pub tick: Tick,
    /// Chunk offset of the value within the generating store's payload.
    pub field_offset: u8,
    /// Line address of the prediction that owns this chunk.
    pub owner: u64,
}

impl Provenance {
    /// Creates a provenance record for a store at `pc`.
    pub const fn new(pc: Pc, tick: Tick, field_offset: u8) -> Self {
        Self {
            pc: Some(pc),
            tick,
            field_offset,
            owner: 0,
        }
    }

    /// Creates a provenance record with no generating store.
    pub const fn unattributed(tick: Tick) -> Self {
        Self {
            pc: None,
            tick,
            field_offset: 0,
            owner: 0,
        }
    }

    /// Sets the owning line address.
    #[must_use]
    pub const fn owned_by(mut self, owner: u64) -> Self {
        self.owner = owner;
        self
    }
}

/// Per-chunk prediction flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkFlags {
    /// Predicted as the constant zero, resolved without waiting for its store.
    pub const_zero: bool,
    /// Produced by coalescing observed writes rather than pattern matching.
    pub free: bool,
    /// Resolve by searching the write history backward at promotion time.
    pub reverse_search: bool,
    /// Value substituted from the constant-value tracker.
    pub constant: bool,
}

/// One 4-byte slot of a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Chunk {
    /// Empty slot with no payload.
    #[default]
    Invalid,
    /// Resolved target address of a prediction.
    Address {
        /// Line-aligned target address.
        target: u64,
        /// Store that produced the address.
        provenance: Provenance,
        /// Prediction flags.
        flags: ChunkFlags,
    },
    /// Data value.
    Data {
        /// The 32-bit value.
        value: u32,
        /// Store that produced the value.
        provenance: Provenance,
        /// Prediction flags.
        flags: ChunkFlags,
    },
}

impl Chunk {
    /// Creates a data chunk with default flags.
    pub const fn data(value: u32, provenance: Provenance) -> Self {
        Self::Data {
            value,
            provenance,
            flags: ChunkFlags {
                const_zero: false,
                free: false,
                reverse_search: false,
                constant: false,
            },
        }
    }

    /// Creates a free data chunk with no generating instruction.
    pub const fn free(value: u32, tick: Tick) -> Self {
        Self::Data {
            value,
            provenance: Provenance::unattributed(tick),
            flags: ChunkFlags {
                const_zero: false,
                free: true,
                reverse_search: false,
                constant: false,
            },
        }
    }

    /// Creates an address chunk with default flags.
    pub const fn address(target: u64, provenance: Provenance) -> Self {
        Self::Address {
            target,
            provenance,
            flags: ChunkFlags {
                const_zero: false,
                free: false,
                reverse_search: false,
                constant: false,
            },
        }
    }

    /// Returns true if the slot holds an address or a value.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Returns true if the slot is empty.
    #[inline]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Returns the data value, if this is a data chunk.
    #[inline]
    pub const fn value(&self) -> Option<u32> {
        match self {
            Self::Data { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Returns the target address, if this is an address chunk.
    #[inline]
    pub const fn target(&self) -> Option<u64> {
        match self {
            Self::Address { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Returns the provenance of a valid chunk.
    pub const fn provenance(&self) -> Option<&Provenance> {
        match self {
            Self::Invalid => None,
            Self::Address { provenance, .. } | Self::Data { provenance, .. } => Some(provenance),
        }
    }

    /// Returns the flags of a valid chunk.
    pub const fn flags(&self) -> Option<ChunkFlags> {
        match self {
            Self::Invalid => None,
            Self::Address { flags, .. } | Self::Data { flags, .. } => Some(*flags),
        }
    }

    /// Returns the flags of a valid chunk for modification.
    pub const fn flags_mut(&mut self) -> Option<&mut ChunkFlags> {
        match self {
            Self::Invalid => None,
            Self::Address { flags, .. } | Self::Data { flags, .. } => Some(flags),
        }
    }

    /// Returns the generating instruction address of a valid chunk.
    #[inline]
    pub fn generating_pc(&self) -> Option<Pc> {
        self.provenance().and_then(|p| p.pc)
    }

    /// Returns the generation tick of a valid chunk.
    #[inline]
    pub fn tick(&self) -> Option<Tick> {
        self.provenance().map(|p| p.tick)
    }

    /// Returns true if this chunk came from write coalescing.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.flags().is_some_and(|f| f.free)
    }

    /// Returns true if this chunk is predicted as the constant zero.
    #[inline]
    pub fn is_const_zero(&self) -> bool {
        self.flags().is_some_and(|f| f.const_zero)
    }

    /// Returns true if this chunk is resolved by a backward history search.
    #[inline]
    pub fn is_reverse_search(&self) -> bool {
        self.flags().is_some_and(|f| f.reverse_search)
    }

    /// Checks that a published chunk names its generating instruction.
    ///
    /// # Panics
    ///
    /// Panics if the chunk is a non-free address or data chunk whose generating
    /// PC is unset. That state can only come from a logic error in learning or
    /// promotion.
    pub fn assert_provenance(&self) {
        if let Some(p) = self.provenance() {
            assert!(
                self.is_free() || p.pc.is_some(),
                "chunk published without a generating PC: {self:?}"
            );
        }
    }
}
