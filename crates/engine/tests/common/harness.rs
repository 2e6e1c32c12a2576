use wpred_core::common::{PhysAddr, StoreOp, Tick};
use wpred_core::config::Config;
use wpred_core::engine::{Observation, PredictionEngine, SparseMemory};

/// First address of the default target region.
pub const REGION: u64 = 0x1000_0000_0000;

/// Installs a test-writer subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An engine over sparse memory, driven the way the replay CLI drives it:
/// every write lands in memory before the engine observes it.
pub struct EngineContext {
    pub engine: PredictionEngine,
    pub memory: SparseMemory,
    tick: Tick,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl EngineContext {
    pub fn new(config: Config) -> Self {
        init_tracing();
        Self {
            engine: PredictionEngine::try_new(config).unwrap(),
            memory: SparseMemory::new(),
            tick: 0,
        }
    }

    /// Config with a short path history so patterns recur quickly.
    pub fn short_path_config() -> Config {
        let mut config = Config::default();
        config.table.path_history_len = 2;
        config
    }

    /// Advances the clock to `tick`.
    pub fn at(&mut self, tick: Tick) -> &mut Self {
        self.tick = tick;
        self
    }

    pub fn observe(&mut self, op: &StoreOp) -> Observation {
        self.memory.apply(op);
        self.engine.observe_store(op, &mut self.memory)
    }

    /// Writes 32-bit words at `addr` from `pc`, one tick after the last operation.
    pub fn write(&mut self, pc: u64, addr: u64, words: &[u32]) -> Observation {
        self.tick += 1;
        let op = StoreOp::write_words(self.tick, pc, addr, words);
        self.observe(&op)
    }

    /// Writes a 64-bit pointer to `target` at `addr` from `pc`.
    pub fn write_pointer(&mut self, pc: u64, addr: u64, target: u64) -> Observation {
        self.write(pc, addr, &[target as u32, (target >> 32) as u32])
    }

    pub fn flush(&mut self, pc: u64, addr: u64) -> Observation {
        self.tick += 1;
        let op = StoreOp::flush(self.tick, pc, addr);
        self.observe(&op)
    }

    /// Predictions queued for the physical line at `addr` (identity translation).
    pub fn queued(&self, addr: u64) -> usize {
        self.engine
            .matcher()
            .queued_at(PhysAddr::new(addr))
            .map_or(0, |q| q.len())
    }
}
