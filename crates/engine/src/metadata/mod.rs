//! Metadata Caches.
//!
//! Predicted writes can only be validated when the per-line metadata they
//! depend on is at hand. Two presence-only caches model that metadata:
//! 1. **Counter Cache:** Set-associative, one metadata line per 512 bytes of data.
//! 2. **Verification Cache:** Fully associative, nodes of a fixed-height integrity tree.
//!
//! Both share the true-LRU core below. A touched entry's counter drops to zero
//! and every other entry in its set ages by one; the victim is the oldest entry
//! of the set. Misses queue a fill, and evicting a dirty entry queues a
//! write-back before the entry is dropped.
//!
//! # Performance
//!
//! - **Time Complexity:** `read()` / `write()` are O(W) in the ways of a set
//! - **Space Complexity:** O(S × W)

/// Set-associative counter cache.
pub mod counter;

/// Metadata memory requests and queues.
pub mod request;

/// Fully associative integrity-tree cache.
pub mod verification;

pub use counter::CounterCache;
pub use request::{MetadataRequest, RequestKind, RequestQueues};
pub use verification::VerificationCache;

use tracing::trace;

use crate::config::MetadataConfig;

/// One resident metadata line.
#[derive(Clone, Copy, Debug)]
struct MetadataEntry {
    key: u64,
    lru: u64,
    dirty: bool,
}

/// Event counts of one metadata cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheCounters {
    /// Accesses that found their line.
    pub hits: u64,
    /// Accesses that missed.
    pub misses: u64,
    /// Fill requests queued.
    pub fills: u64,
    /// Write-back requests queued.
    pub writebacks: u64,
    /// Entries evicted.
    pub evictions: u64,
}

/// True-LRU presence cache over metadata line keys.
#[derive(Clone, Debug)]
pub struct MetadataCache {
    sets: Vec<Vec<MetadataEntry>>,
    ways: usize,
    request_bytes: usize,
    addr_offset: u64,
    queues: RequestQueues,
    counters: CacheCounters,
    name: &'static str,
}

impl MetadataCache {
    /// Creates an empty cache of `sets` × `ways` entries.
    pub fn new(
        name: &'static str,
        sets: usize,
        ways: usize,
        request_bytes: usize,
        addr_offset: u64,
    ) -> Self {
        let sets = sets.max(1);
        let ways = ways.max(1);
        Self {
            sets: vec![Vec::with_capacity(ways); sets],
            ways,
            request_bytes,
            addr_offset,
            queues: RequestQueues::default(),
            counters: CacheCounters::default(),
            name,
        }
    }

    /// Returns the number of sets.
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// Returns the associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Returns the total number of resident entries.
    pub fn len(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }

    /// Returns true if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(Vec::is_empty)
    }

    /// Returns the number of resident entries in `set`.
    pub fn set_len(&self, set: usize) -> usize {
        self.sets.get(set).map_or(0, Vec::len)
    }

    /// Returns true if `key` is resident in `set`.
    pub fn contains(&self, set: usize, key: u64) -> bool {
        self.sets
            .get(set)
            .is_some_and(|s| s.iter().any(|e| e.key == key))
    }

    /// Returns true if `key` is resident and dirty.
    pub fn is_dirty(&self, set: usize, key: u64) -> bool {
        self.sets
            .get(set)
            .and_then(|s| s.iter().find(|e| e.key == key))
            .is_some_and(|e| e.dirty)
    }

    /// Returns the event counts.
    pub const fn counters(&self) -> CacheCounters {
        self.counters
    }

    /// Returns the request queues.
    pub const fn queues(&self) -> &RequestQueues {
        &self.queues
    }

    /// Takes the next queued request.
    pub fn pop_request(&mut self) -> Option<MetadataRequest> {
        self.queues.pop()
    }

    /// Accesses `key` in `set`; a write leaves the entry dirty. Returns true on a hit.
    pub fn access(&mut self, set: usize, key: u64, write: bool) -> bool {
        let set_idx = set % self.sets.len();
        let entries = &mut self.sets[set_idx];
        let pos = entries.iter().position(|e| e.key == key);

        for e in entries.iter_mut() {
            e.lru = e.lru.saturating_add(1);
        }

        if let Some(pos) = pos {
            let e = &mut entries[pos];
            e.lru = 0;
            e.dirty |= write;
            self.counters.hits += 1;
            return true;
        }

        self.counters.misses += 1;
        self.counters.fills += 1;
        let fill = MetadataRequest {
            kind: RequestKind::Fill,
            addr: self.request_addr(key),
            size: self.request_bytes,
        };
        self.queues.push(fill);

        let entries = &mut self.sets[set_idx];
        entries.push(MetadataEntry {
            key,
            lru: 0,
            dirty: write,
        });

        if entries.len() > self.ways {
            let victim = entries
                .iter()
                .enumerate()
                .max_by_key(|(i, e)| (e.lru, std::cmp::Reverse(*i)))
                .map(|(i, _)| i);
            if let Some(victim) = victim {
                let evicted = entries.remove(victim);
                self.counters.evictions += 1;
                trace!(
                    target: "wpred::metadata",
                    cache = self.name,
                    key = evicted.key,
                    dirty = evicted.dirty,
                    "entry evicted"
                );
                if evicted.dirty {
                    self.counters.writebacks += 1;
                    let wb = MetadataRequest {
                        kind: RequestKind::WriteBack,
                        addr: self.request_addr(evicted.key),
                        size: self.request_bytes,
                    };
                    self.queues.push(wb);
                }
            }
        }
        false
    }

    /// Address of the metadata for `key` in backing memory.
    const fn request_addr(&self, key: u64) -> u64 {
        key / 8 + self.addr_offset
    }
}

/// The counter and verification caches consulted for every prediction.
#[derive(Clone, Debug)]
pub struct MetadataCaches {
    /// Counter cache.
    pub counter: CounterCache,
    /// Verification cache.
    pub verification: VerificationCache,
}

impl MetadataCaches {
    /// Creates both caches.
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            counter: CounterCache::new(&config.counter),
            verification: VerificationCache::new(&config.verification),
        }
    }

    /// Takes the next queued request of either cache, counter cache first.
    pub fn pop_request(&mut self) -> Option<MetadataRequest> {
        self.counter
            .pop_request()
            .or_else(|| self.verification.pop_request())
    }
}
