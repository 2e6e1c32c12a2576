//! Pattern prediction.
//!
//! This module learns which stores produce each flushed line and recognizes
//! when the same control-flow path recurs. It includes:
//! 1. **Path History:** The XOR-shift hash of recent store PCs used as the table key.
//! 2. **Predictor Table:** Learned patterns with confidence, age and eviction policy.
//! 3. **Learning:** Searching the write history for the sources of a flushed line.
//! 4. **Stride Predictor:** Target redirection for flushes that walk memory at a fixed stride.

/// Predictor table entry.
pub mod entry;

/// Line-flush learning.
pub mod learn;

/// Path history and hashing.
pub mod path;

/// Stride address predictor.
pub mod stride;

/// Path-hash keyed pattern table.
pub mod table;

pub use entry::PredictorTableEntry;
pub use learn::{LearnOptions, LearnOutcome, learn_from_flush};
pub use path::PathHistory;
pub use stride::StrideAddressPredictor;
pub use table::{InsertOutcome, PredictorTable};
