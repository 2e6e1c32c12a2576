//! # Unit Components
//!
//! Tests grouped by the table or stage they exercise, followed by end-to-end
//! store-stream scenarios and randomized properties.



/// Write history log ring.
pub mod history;


/// Pending join table promotion, resolution and capacity.
pub mod pending;

/// Write accumulator coalescing and retirement.
pub mod accumulator;

/// Completion matcher classification and feedback routing.
pub mod matcher;




/// Randomized bound and ordering properties.
pub mod properties;

/// Statistics snapshot and report.
pub mod stats;
