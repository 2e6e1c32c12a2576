//! Speculative write-prediction engine.
//!
//! This crate predicts the contents and target of upcoming line write-backs to
//! a persistent-memory region from the recent store stream, so that the
//! integrity metadata they need can be fetched ahead of time. It implements:
//! 1. **Learning:** Write history, line-flush learning and the path-hashed predictor table.
//! 2. **Prediction:** The pending join table that assembles predictions as their source stores arrive.
//! 3. **Validation:** The completion matcher and the confidence tables its outcomes train.
//! 4. **Metadata:** True-LRU counter and verification caches with fill/write-back queues.
//! 5. **Integration:** The engine, its credit-based port, trace replay, configuration and statistics.

/// Common types and constants (addresses, geometry, store operations, errors).
pub mod common;
/// Engine configuration (defaults, per-component sections, feature switches).
pub mod config;
/// Chunks and lines.
pub mod line;
/// Bounded write history log.
pub mod history;
/// Path history, predictor table, stride predictor and line learning.
pub mod predictor;
/// Pending join table and its parent arena.
pub mod pending;
/// Write accumulator for free predictions.
pub mod accumulator;
/// Completed predictions, completion matcher and feedback tables.
pub mod backend;
/// Counter and verification metadata caches.
pub mod metadata;
/// Prediction engine and its environment traits.
pub mod engine;
/// Credit-based request/response port.
pub mod port;
/// Replay trace parser.
pub mod trace;
/// Prediction statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or decode with `Config::from_json`.
pub use crate::config::Config;
/// Top-level engine; construct with `PredictionEngine::new`.
pub use crate::engine::{BackingStore, Environment, PredictionEngine, SparseMemory, Translator};
/// Flow-controlled front end of the engine.
pub use crate::port::{PredictorPort, StoreResponse};
/// Operations the engine observes.
pub use crate::common::{StoreKind, StoreOp};
/// Engine statistics.
pub use crate::stats::PredictorStats;
