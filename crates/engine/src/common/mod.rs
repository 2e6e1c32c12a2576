//! Common utilities and types used throughout the write-prediction engine.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the engine. It includes:
//! 1. **Address Types:** Strong types for virtual and physical addresses plus line arithmetic.
//! 2. **Constants:** Chunk and line geometry.
//! 3. **Store Operations:** The operations delivered by the environment and their chunking.
//! 4. **Confidence:** Saturating counters used by every learning table.
//! 5. **Error Handling:** Configuration, trace and port error types.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Saturating confidence counters.
pub mod confidence;

/// Line and chunk geometry constants.
pub mod constants;

/// Store operation definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::{PhysAddr, VirtAddr, chunk_index, line_align, line_offset};
pub use confidence::{Confidence, ConfidenceBounds};
pub use constants::{CHUNK_BYTES, CHUNKS_PER_LINE, LINE_BYTES};
pub use data::{PathHash, Pc, StoreKind, StoreOp, Tick};
pub use error::{ConfigError, PortError, TraceError};
