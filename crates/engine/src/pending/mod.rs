//! Pattern materialization.
//!
//! Promoted patterns become parents in a generational arena; their unresolved
//! chunks wait in per-PC queues until the generating stores arrive. It includes:
//! 1. **Arena:** Generation-checked handles that never alias a reused slot.
//! 2. **Parents:** Per-slot resolution state of a prediction under construction.
//! 3. **Join Table:** PC-keyed queues, bounded by PC count and queue depth.

/// Generational arena.
pub mod arena;

/// Pending parent records.
pub mod parent;

/// PC-keyed join table.
pub mod table;

pub use arena::{Arena, Handle};
pub use parent::{Parent, SlotRef, SlotState};
pub use table::{PendingChunk, PendingCounters, PendingJoinTable};
