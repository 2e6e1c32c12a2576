//! Error definitions.
//!
//! This module defines the recoverable error types of the engine. It provides:
//! 1. **Configuration Errors:** Rejected configuration values and JSON decode failures.
//! 2. **Trace Errors:** Malformed replay records and trace I/O failures.
//! 3. **Port Errors:** Busy signals raised by the credit-based boundary.
//!
//! Capacity exhaustion, translation failures and unresolvable patterns are not
//! errors; they are outcome values counted in the statistics. Contract violations
//! (missing provenance, publishing an incomplete parent) panic.

use thiserror::Error;

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A capacity or size that must be non-zero was zero.
    #[error("`{field}` must be greater than zero")]
    ZeroCapacity {
        /// Dotted path of the offending field.
        field: &'static str,
    },

    /// A confidence window has `init` outside `[min, max]` or `min > max`.
    #[error("`{field}` bounds are inconsistent (init {init}, min {min}, max {max})")]
    ConfidenceBounds {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Configured initial value.
        init: u32,
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },

    /// A size that must be a power of two was not.
    #[error("`{field}` must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Configured value.
        value: u64,
    },

    /// The configuration document could not be decoded.
    #[error("config decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed or unreadable replay trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A record did not follow the `@pc region kind addr size data tick` layout.
    #[error("line {line}: {reason}")]
    Malformed {
        /// One-based line number in the trace.
        line: usize,
        /// What was wrong with the record.
        reason: String,
    },

    /// A hexadecimal field failed to parse.
    #[error("line {line}: bad {field} field `{text}`")]
    BadNumber {
        /// One-based line number in the trace.
        line: usize,
        /// Name of the field.
        field: &'static str,
        /// Offending text.
        text: String,
    },

    /// The trace could not be read.
    #[error("trace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Busy signal from the credit-based boundary.
///
/// A rejected operation has not touched any engine state; the caller retries later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortError {
    /// Every request credit is in use.
    #[error("request credits exhausted ({outstanding} outstanding)")]
    RequestsExhausted {
        /// Requests accepted but not yet serviced.
        outstanding: usize,
    },

    /// Every response credit is in use.
    #[error("response credits exhausted ({outstanding} outstanding)")]
    ResponsesExhausted {
        /// Responses produced or reserved but not yet collected.
        outstanding: usize,
    },
}
