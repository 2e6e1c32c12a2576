//! Line data model.
//!
//! Every table in the engine stores data in the same shape: 64-byte lines of
//! sixteen 4-byte chunks. This module provides:
//! 1. **Chunks:** A sum type over empty, address and data slots with provenance.
//! 2. **Lines:** The fixed chunk array plus search helpers used by learning.

/// Chunk-shaped lines.
pub mod cacheline;

/// Typed line chunks.
pub mod chunk;

pub use cacheline::Line;
pub use chunk::{Chunk, ChunkFlags, Provenance};
