//! Saturating confidence counters.
//!
//! Every confidence value in the engine (predictor entry address/data confidence,
//! per-PC confidence, per-hash confidence) is a small counter clamped to a
//! configured `[min, max]` window. The counter can never leave that window no
//! matter how long an add/sub sequence runs.

use serde::Deserialize;

/// Bounds and initial value for a confidence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConfidenceBounds {
    /// Value a fresh counter starts at.
    pub init: u32,
    /// Lowest value the counter can take.
    pub min: u32,
    /// Highest value the counter can take.
    pub max: u32,
}

impl ConfidenceBounds {
    /// Creates a new set of bounds.
    pub const fn new(init: u32, min: u32, max: u32) -> Self {
        Self { init, min, max }
    }

    /// Returns true if `min <= init <= max`.
    pub const fn is_consistent(&self) -> bool {
        self.min <= self.init && self.init <= self.max
    }
}

/// Saturating counter clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confidence {
    value: u32,
    min: u32,
    max: u32,
}

impl Confidence {
    /// Creates a counter at the initial value of `bounds`.
    pub const fn new(bounds: ConfidenceBounds) -> Self {
        Self::with_value(bounds, bounds.init)
    }

    /// Creates a counter at `value`, clamped to `bounds`.
    pub const fn with_value(bounds: ConfidenceBounds, value: u32) -> Self {
        let value = if value < bounds.min {
            bounds.min
        } else if value > bounds.max {
            bounds.max
        } else {
            value
        };
        Self {
            value,
            min: bounds.min,
            max: bounds.max,
        }
    }

    /// Returns the current value.
    #[inline]
    pub const fn get(&self) -> u32 {
        self.value
    }

    /// Adds `n`, saturating at the maximum.
    #[inline]
    pub fn add(&mut self, n: u32) {
        self.value = self.value.saturating_add(n).min(self.max);
    }

    /// Subtracts `n`, saturating at the minimum.
    #[inline]
    pub fn sub(&mut self, n: u32) {
        self.value = self.value.saturating_sub(n).max(self.min);
    }

    /// Returns true if the counter sits at its maximum.
    #[inline]
    pub const fn is_max(&self) -> bool {
        self.value == self.max
    }

    /// Returns true if the counter sits at its minimum.
    #[inline]
    pub const fn is_min(&self) -> bool {
        self.value == self.min
    }

    /// Returns the upper bound.
    #[inline]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Returns the lower bound.
    #[inline]
    pub const fn min(&self) -> u32 {
        self.min
    }
}
