//! Verification Cache.
//!
//! Fully associative cache of integrity-tree nodes. Validating a data line
//! walks the tree from the leaf level upward and stops at the first node found
//! in the cache: a cached node is already trusted, so nothing above it needs
//! to be fetched.

use crate::config::VerificationCacheConfig;
use crate::metadata::{CacheCounters, MetadataCache, MetadataRequest, RequestQueues};

/// Tree fan-out, as a shift.
const ARITY_SHIFT: u32 = 3;

/// Fully associative presence cache of integrity-tree nodes.
#[derive(Clone, Debug)]
pub struct VerificationCache {
    inner: MetadataCache,
    line_bytes: u64,
    tree_height: u32,
}

impl VerificationCache {
    /// Creates an empty verification cache.
    pub fn new(config: &VerificationCacheConfig) -> Self {
        Self {
            inner: MetadataCache::new(
                "verification",
                1,
                config.entries,
                config.request_bytes,
                config.addr_offset,
            ),
            line_bytes: config.line_bytes.max(1),
            tree_height: config.tree_height,
        }
    }

    /// Returns the key of the tree node covering `addr` at `level`.
    ///
    /// Level zero is the leaf; each level up covers eight times as many data
    /// lines. Each level is offset by `1 << 3(height - level)` so nodes of
    /// different levels never share a key.
    pub fn node_key(&self, addr: u64, level: u32) -> u64 {
        let line = addr / self.line_bytes;
        let base = line.checked_shr(ARITY_SHIFT * level).unwrap_or(0);
        let offset = 1u64
            .checked_shl(ARITY_SHIFT * self.tree_height.saturating_sub(level))
            .unwrap_or(0);
        base.wrapping_add(offset)
    }

    /// Reads the leaf node of `addr`. Returns true on a hit.
    pub fn read(&mut self, addr: u64) -> bool {
        let key = self.node_key(addr, 0);
        self.inner.access(0, key, false)
    }

    /// Updates the leaf node of `addr`, leaving it dirty. Returns true on a hit.
    pub fn write(&mut self, addr: u64) -> bool {
        let key = self.node_key(addr, 0);
        self.inner.access(0, key, true)
    }

    /// Walks the tree above `addr` for a read. Returns the levels missed
    /// before the first hit.
    pub fn read_path(&mut self, addr: u64) -> u32 {
        self.walk(addr, false)
    }

    /// Walks the tree above `addr` for an update, leaving touched nodes
    /// dirty. Returns the levels missed before the first hit.
    pub fn write_path(&mut self, addr: u64) -> u32 {
        self.walk(addr, true)
    }

    fn walk(&mut self, addr: u64, write: bool) -> u32 {
        let mut misses = 0;
        for level in 0..self.tree_height {
            let key = self.node_key(addr, level);
            if self.inner.access(0, key, write) {
                break;
            }
            misses += 1;
        }
        misses
    }

    /// Returns true if the node covering `addr` at `level` is resident.
    pub fn contains(&self, addr: u64, level: u32) -> bool {
        self.inner.contains(0, self.node_key(addr, level))
    }

    /// Returns the number of resident nodes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the capacity.
    pub const fn capacity(&self) -> usize {
        self.inner.ways()
    }

    /// Returns the tree height.
    pub const fn tree_height(&self) -> u32 {
        self.tree_height
    }

    /// Takes the next queued request.
    pub fn pop_request(&mut self) -> Option<MetadataRequest> {
        self.inner.pop_request()
    }

    /// Returns the request queues.
    pub const fn queues(&self) -> &RequestQueues {
        self.inner.queues()
    }

    /// Returns the event counts.
    pub const fn counters(&self) -> CacheCounters {
        self.inner.counters()
    }
}
