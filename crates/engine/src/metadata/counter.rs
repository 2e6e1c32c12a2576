//! Counter Cache.
//!
//! Set-associative; one metadata line covers `line_bytes` (512 by default) of
//! physical data, so neighbouring data lines share an entry.

use crate::config::CounterCacheConfig;
use crate::metadata::{CacheCounters, MetadataCache, MetadataRequest, RequestQueues};

/// Set-associative presence cache of per-line counters.
#[derive(Clone, Debug)]
pub struct CounterCache {
    inner: MetadataCache,
    line_bytes: u64,
}

impl CounterCache {
    /// Creates an empty counter cache.
    pub fn new(config: &CounterCacheConfig) -> Self {
        Self {
            inner: MetadataCache::new(
                "counter",
                config.sets,
                config.ways,
                config.request_bytes,
                config.addr_offset,
            ),
            line_bytes: config.line_bytes.max(1),
        }
    }

    /// Returns the metadata line key covering `addr`.
    pub const fn key_of(&self, addr: u64) -> u64 {
        addr / self.line_bytes * self.line_bytes
    }

    /// Returns the set `addr` maps to.
    pub fn set_of(&self, addr: u64) -> usize {
        ((addr / self.line_bytes) % self.inner.num_sets() as u64) as usize
    }

    /// Reads the counter for `addr`. Returns true on a hit.
    pub fn read(&mut self, addr: u64) -> bool {
        let (set, key) = (self.set_of(addr), self.key_of(addr));
        self.inner.access(set, key, false)
    }

    /// Updates the counter for `addr`, leaving it dirty. Returns true on a hit.
    pub fn write(&mut self, addr: u64) -> bool {
        let (set, key) = (self.set_of(addr), self.key_of(addr));
        self.inner.access(set, key, true)
    }

    /// Returns true if the counter for `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        self.inner.contains(self.set_of(addr), self.key_of(addr))
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of resident entries in `set`.
    pub fn set_len(&self, set: usize) -> usize {
        self.inner.set_len(set)
    }

    /// Returns the number of sets.
    pub fn num_sets(&self) -> usize {
        self.inner.num_sets()
    }

    /// Returns the associativity.
    pub const fn ways(&self) -> usize {
        self.inner.ways()
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
