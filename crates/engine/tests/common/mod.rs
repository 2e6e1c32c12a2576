//! Shared test infrastructure.

/// Engine harness and store-stream helpers.
pub mod harness;

/// `mockall` mocks of the engine's seams.
pub mod mocks;
