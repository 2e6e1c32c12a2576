//! Prediction validation backend.
//!
//! Completed predictions are held here until the real write-back of their line
//! arrives. It includes:
//! 1. **Completed Entries:** Finished pattern and free predictions.
//! 2. **Feedback:** The outcome sink and the hash, PC and constant tables it trains.
//! 3. **Matcher:** Per-line FIFOs, full/partial/miss classification and the global sweep.

/// Completed write entries.
pub mod completed;

/// Outcome feedback and confidence tables.
pub mod feedback;

/// Completion matcher.
pub mod matcher;

pub use completed::CompletedWriteEntry;
pub use feedback::{ConstantTracker, FeedbackSink, HashConfidence, PcConfidence};
pub use matcher::{CompletionMatcher, MatchOutcome, MatcherCounters, SubmitOutcome};
