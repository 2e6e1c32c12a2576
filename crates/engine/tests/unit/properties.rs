//! Property Tests.
//!
//! Random operation streams must never push any bounded structure past its
//! configured capacity, and confidence counters must stay inside their window.

use proptest::prelude::*;
use wpred_core::common::{Confidence, ConfidenceBounds, PhysAddr, StoreOp};
use wpred_core::config::{Config, CounterCacheConfig};
use wpred_core::metadata::CounterCache;
use wpred_core::{PredictionEngine, SparseMemory};

use crate::common::harness::REGION;

const REGION_LINES: u64 = 4;

#[derive(Clone, Debug)]
enum Op {
    Write { pc: u64, addr: u64, words: Vec<u32> },
    Pointer { pc: u64, slot: u64, line: u64 },
    Flush { line: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let pc = (1..8u64).prop_map(|p| p * 0x10);
    prop_oneof![
        4 => (
            pc.clone(),
            prop_oneof![
                (0..REGION_LINES, 0..16u64).prop_map(|(l, c)| REGION + l * 0x40 + c * 4),
                (0..4u64).prop_map(|s| 0x8000 + s * 0x40),
            ],
            prop::collection::vec(0..4u32, 1..5),
        )
            .prop_map(|(pc, addr, words)| Op::Write { pc, addr, words }),
        2 => (pc, 0..4u64, 0..REGION_LINES)
            .prop_map(|(pc, slot, line)| Op::Pointer { pc, slot, line }),
        1 => (0..REGION_LINES).prop_map(|line| Op::Flush { line }),
    ]
}

fn small_config() -> Config {
    let mut config = Config::default();
    config.history.capacity = 32;
    config.table.max_entries = 4;
    config.table.path_history_len = 2;
    config.accumulator.capacity = 2;
    config.accumulator.retire_period = 50;
    config.accumulator.retire_threshold = 200;
    config.matcher.max_per_address = 2;
    config.metadata.counter.sets = 2;
    config.metadata.counter.ways = 2;
    config.metadata.verification.entries = 8;
    config
}

proptest! {
    #[test]
    fn confidence_stays_in_window(
        init in 0..8u32,
        steps in prop::collection::vec((any::<bool>(), 0..4u32), 0..64),
    ) {
        let bounds = ConfidenceBounds::new(init, 1, 7);
        let mut c = Confidence::new(bounds);
        for (up, n) in steps {
            if up { c.add(n) } else { c.sub(n) }
            prop_assert!((1..=7).contains(&c.get()));
        }
    }

    #[test]
    fn counter_cache_keeps_lru_bounds(keys in prop::collection::vec(0..16u64, 1..128)) {
        let mut cache = CounterCache::new(&CounterCacheConfig {
            sets: 1,
            ways: 4,
            ..CounterCacheConfig::default()
        });
        for &k in &keys {
            let _ = cache.read(k * 512);
            prop_assert!(cache.contains(k * 512));
            prop_assert!(cache.set_len(0) <= 4);
        }
        let c = cache.counters();
        prop_assert_eq!(c.hits + c.misses, keys.len() as u64);
        prop_assert_eq!(c.misses - c.evictions, cache.len() as u64);
    }

    #[test]
    fn engine_respects_capacities(
        ops in prop::collection::vec((op_strategy(), 1..120u64), 1..200),
    ) {
        let config = small_config();
        let mut engine = PredictionEngine::try_new(config.clone()).unwrap();
        let mut memory = SparseMemory::new();
        let mut tick = 0;
        let count = ops.len() as u64;

        for (op, gap) in ops {
            tick += gap;
            let op = match op {
                Op::Write { pc, addr, words } => StoreOp::write_words(tick, pc, addr, &words),
                Op::Pointer { pc, slot, line } => {
                    let target = REGION + line * 0x40;
                    StoreOp::write_words(
                        tick,
                        pc,
                        0x9000 + slot * 8,
                        &[target as u32, (target >> 32) as u32],
                    )
                }
                Op::Flush { line } => StoreOp::flush(tick, 0x400, REGION + line * 0x40),
            };
            memory.apply(&op);
            let _ = engine.observe_store(&op, &mut memory);

            prop_assert!(engine.log().len() <= config.history.capacity);
            prop_assert!(engine.table().len() <= config.table.max_entries);
            prop_assert!(engine.accumulator().len() <= config.accumulator.capacity);
            for line in 0..REGION_LINES {
                let queued = engine
                    .matcher()
                    .queued_at(PhysAddr::new(REGION + line * 0x40))
                    .map_or(0, |q| q.len());
                prop_assert!(queued <= config.matcher.max_per_address);
            }
            let counter = &engine.caches().counter;
            for set in 0..counter.num_sets() {
                prop_assert!(counter.set_len(set) <= counter.ways());
            }
            let verification = &engine.caches().verification;
            prop_assert!(verification.len() <= verification.capacity());
        }
        let stats = engine.stats();
        prop_assert_eq!(stats.writes_observed + stats.flushes, count);
    }
}
