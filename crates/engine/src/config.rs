//! Configuration system for the write-prediction engine.
//!
//! This module defines all configuration structures used to parameterize
//! the engine. It provides:
//! 1. **Defaults:** Baseline table sizes, confidence windows and age thresholds.
//! 2. **Structures:** One section per component (history, predictor table, pending
//!    table, accumulator, matcher, metadata caches, port) plus feature toggles.
//! 3. **Validation:** Rejection of zero capacities and inconsistent confidence windows.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built with `Config::default()`.

use std::path::Path;

use serde::Deserialize;

use crate::common::confidence::ConfidenceBounds;
use crate::common::error::ConfigError;

/// Default configuration constants for the engine.
mod defaults {
    use crate::common::confidence::ConfidenceBounds;

    /// Base virtual address of the target (persistent) region.
    pub const REGION_BASE: u64 = 0x1000_0000_0000;

    /// Size of the target region (1 GiB).
    pub const REGION_SIZE: u64 = 1 << 30;

    /// Write history log capacity in entries.
    pub const HISTORY_CAPACITY: usize = 512;

    /// Maximum predictor table entries.
    pub const TABLE_MAX_ENTRIES: usize = 32;

    /// Confidence at or below which a resident entry may be replaced or evicted.
    pub const TABLE_LOW_CONFIDENCE: u32 = 1;

    /// Age (in insertions) past which an entry is stale.
    pub const TABLE_STALE_AGE: u64 = 200;

    /// Number of insertions between stale-entry purges.
    pub const TABLE_TICK_PERIOD: u64 = 2;

    /// Number of store PCs folded into the path hash.
    pub const PATH_HISTORY_LEN: usize = 32;

    /// Address and data confidence window of predictor entries.
    pub const TABLE_CONFIDENCE: ConfidenceBounds = ConfidenceBounds::new(6, 0, 7);

    /// Age reward for a correct address prediction.
    pub const ADDR_AGE_REWARD: u64 = 20;

    /// Age reward for a correct data prediction.
    pub const DATA_AGE_REWARD: u64 = 80;

    /// Maximum distinct PCs with pending chunks.
    pub const PENDING_MAX_PCS: usize = 128;

    /// Maximum pending chunks queued behind one PC.
    pub const PENDING_MAX_CHUNKS_PER_PC: usize = 64;

    /// Number of log entries examined by the reverse-search marker.
    pub const REVERSE_SEARCH_WINDOW: usize = 3;

    /// Write accumulator capacity in lines.
    pub const ACCUMULATOR_CAPACITY: usize = 4;

    /// Ticks between accumulator retirement sweeps.
    pub const ACCUMULATOR_RETIRE_PERIOD: u64 = 10_000;

    /// Idle ticks after which an accumulated line retires.
    pub const ACCUMULATOR_RETIRE_THRESHOLD: u64 = 100_000;

    /// Completed predictions kept per physical line.
    pub const MATCHER_MAX_PER_ADDRESS: usize = 4;

    /// Soft cap on completed predictions across all lines.
    pub const MATCHER_RESULT_BUFFER_MAX: usize = 256;

    /// Age after which an unused free prediction may be swept.
    pub const MATCHER_FREE_AGE_LIMIT: u64 = 25_000_000;

    /// Age after which an unused pattern prediction may be swept.
    pub const MATCHER_PREDICTED_AGE_LIMIT: u64 = 30_000_000;

    /// Per-PC confidence window.
    pub const PC_CONFIDENCE: ConfidenceBounds = ConfidenceBounds::new(6, 0, 7);

    /// Minimum PC confidence for a history entry to be used by learning.
    pub const PC_CONFIDENCE_GATE: u32 = 5;

    /// Maximum generator-hash confidence.
    pub const HASH_CONFIDENCE_MAX: u32 = 3;

    /// Repeat count at which a slot is predicted as a constant.
    pub const CONSTANT_THRESHOLD: u32 = 1;

    /// Saturation limit of the constant repeat count.
    pub const CONSTANT_CAP: u32 = 10;

    /// Counter cache sets.
    pub const COUNTER_SETS: usize = 64;

    /// Counter cache ways per set.
    pub const COUNTER_WAYS: usize = 16;

    /// Bytes of data covered by one counter cache line.
    pub const COUNTER_LINE_BYTES: u64 = 512;

    /// Base of the counter metadata region in backing memory.
    pub const COUNTER_ADDR_OFFSET: u64 = 8192 * 1024 * 1024 + 1;

    /// Verification cache entries.
    pub const VERIFICATION_ENTRIES: usize = 1024;

    /// Bytes of data covered by one verification cache line.
    pub const VERIFICATION_LINE_BYTES: u64 = 64;

    /// Levels of the integrity tree above a data line.
    pub const VERIFICATION_TREE_HEIGHT: u32 = 12;

    /// Base of the verification metadata region in backing memory.
    pub const VERIFICATION_ADDR_OFFSET: u64 = (8192 + 1024) * 1024 * 1024 + 1;

    /// Size of one metadata fill or write-back request in bytes.
    pub const METADATA_REQUEST_BYTES: usize = 8;

    /// Metadata requests serviced per engine operation.
    pub const METADATA_DRAIN_PER_OP: usize = 16;

    /// Request credits at the port boundary.
    pub const PORT_MAX_REQUESTS: usize = 16;

    /// Response credits at the port boundary.
    pub const PORT_MAX_RESPONSES: usize = 16;
}

/// Root configuration structure.
///
/// Every section may be omitted from JSON and falls back to its defaults.
///
/// # Examples
///
/// ```
/// use wpred_core::config::Config;
///
/// let json = r#"{
///     "region": { "base": 4096, "size": 65536 },
///     "table": { "max_entries": 8, "path_history_len": 4 },
///     "features": { "disable_free_prediction": true }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.region.base, 4096);
/// assert_eq!(config.table.max_entries, 8);
/// assert_eq!(config.history.capacity, 512);
/// assert!(config.features.disable_free_prediction);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Target region whose lines are accumulated and predicted
    #[serde(default)]
    pub region: RegionConfig,
    /// Write history log
    #[serde(default)]
    pub history: HistoryConfig,
    /// Predictor table and path history
    #[serde(default)]
    pub table: TableConfig,
    /// Pending join table
    #[serde(default)]
    pub pending: PendingConfig,
    /// Write accumulator
    #[serde(default)]
    pub accumulator: AccumulatorConfig,
    /// Completion matcher
    #[serde(default)]
    pub matcher: MatcherConfig,
    /// Counter and verification caches
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Credit-based port boundary
    #[serde(default)]
    pub port: PortConfig,
    /// Feature toggles
    #[serde(default)]
    pub features: FeatureConfig,
}

impl Config {
    /// Decodes a JSON document and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] for malformed JSON and any error
    /// reported by [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and decodes a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Config::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks every section for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero: [(&'static str, u64); 15] = [
            ("region.size", self.region.size),
            ("history.capacity", self.history.capacity as u64),
            ("table.max_entries", self.table.max_entries as u64),
            ("table.tick_period", self.table.tick_period),
            ("table.path_history_len", self.table.path_history_len as u64),
            ("pending.max_pcs", self.pending.max_pcs as u64),
            ("pending.max_chunks_per_pc", self.pending.max_chunks_per_pc as u64),
            ("accumulator.capacity", self.accumulator.capacity as u64),
            ("matcher.max_per_address", self.matcher.max_per_address as u64),
            ("matcher.result_buffer_max", self.matcher.result_buffer_max as u64),
            ("metadata.counter.sets", self.metadata.counter.sets as u64),
            ("metadata.counter.ways", self.metadata.counter.ways as u64),
            ("metadata.verification.entries", self.metadata.verification.entries as u64),
            ("port.max_requests", self.port.max_requests as u64),
            ("port.max_responses", self.port.max_responses as u64),
        ];
        if let Some((field, _)) = nonzero.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::ZeroCapacity { field });
        }
        if self.metadata.verification.tree_height == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "metadata.verification.tree_height",
            });
        }
        for (field, line) in [
            ("metadata.counter.line_bytes", self.metadata.counter.line_bytes),
            (
                "metadata.verification.line_bytes",
                self.metadata.verification.line_bytes,
            ),
        ] {
            if !line.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo { field, value: line });
            }
        }
        for (field, b) in [
            ("table.confidence", self.table.confidence),
            ("matcher.pc_confidence", self.matcher.pc_confidence),
        ] {
            if !b.is_consistent() {
                return Err(ConfigError::ConfidenceBounds {
                    field,
                    init: b.init,
                    min: b.min,
                    max: b.max,
                });
            }
        }
        Ok(())
    }
}

/// Target region configuration.
///
/// Stores inside the region are accumulated per line and their write-backs are
/// matched against predictions; stores elsewhere only feed the history.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    /// First virtual address of the region
    #[serde(default = "RegionConfig::default_base")]
    pub base: u64,

    /// Region size in bytes
    #[serde(default = "RegionConfig::default_size")]
    pub size: u64,
}

impl RegionConfig {
    /// Returns the default region base.
    fn default_base() -> u64 {
        defaults::REGION_BASE
    }

    /// Returns the default region size.
    fn default_size() -> u64 {
        defaults::REGION_SIZE
    }

    /// Returns true if `addr` lies inside the region.
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr - self.base < self.size
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            base: defaults::REGION_BASE,
            size: defaults::REGION_SIZE,
        }
    }
}

/// Write history log configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum entries held before the oldest is dropped
    #[serde(default = "HistoryConfig::default_capacity")]
    pub capacity: usize,
}

impl HistoryConfig {
    /// Returns the default log capacity.
    fn default_capacity() -> usize {
        defaults::HISTORY_CAPACITY
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::HISTORY_CAPACITY,
        }
    }
}

/// Predictor table configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// Maximum resident entries
    #[serde(default = "TableConfig::default_max_entries")]
    pub max_entries: usize,

    /// Confidence at or below which an entry may be replaced or evicted
    #[serde(default = "TableConfig::default_low_confidence")]
    pub low_confidence: u32,

    /// Age (insertions since the entry was inserted) past which it is stale
    #[serde(default = "TableConfig::default_stale_age")]
    pub stale_age: u64,

    /// Insertions between stale-entry purges
    #[serde(default = "TableConfig::default_tick_period")]
    pub tick_period: u64,

    /// Store PCs folded into the path hash
    #[serde(default = "TableConfig::default_path_history_len")]
    pub path_history_len: usize,

    /// Address and data confidence window
    #[serde(default = "TableConfig::default_confidence")]
    pub confidence: ConfidenceBounds,

    /// Age reduction for a correct address prediction
    #[serde(default = "TableConfig::default_addr_age_reward")]
    pub addr_age_reward: u64,

    /// Age reduction for a correct data prediction
    #[serde(default = "TableConfig::default_data_age_reward")]
    pub data_age_reward: u64,
}

impl TableConfig {
    /// Returns the default table capacity.
    fn default_max_entries() -> usize {
        defaults::TABLE_MAX_ENTRIES
    }

    /// Returns the default low-confidence threshold.
    fn default_low_confidence() -> u32 {
        defaults::TABLE_LOW_CONFIDENCE
    }

    /// Returns the default staleness threshold.
    fn default_stale_age() -> u64 {
        defaults::TABLE_STALE_AGE
    }

    /// Returns the default purge period.
    fn default_tick_period() -> u64 {
        defaults::TABLE_TICK_PERIOD
    }

    /// Returns the default path history length.
    fn default_path_history_len() -> usize {
        defaults::PATH_HISTORY_LEN
    }

    /// Returns the default entry confidence window.
    fn default_confidence() -> ConfidenceBounds {
        defaults::TABLE_CONFIDENCE
    }

    /// Returns the default address age reward.
    fn default_addr_age_reward() -> u64 {
        defaults::ADDR_AGE_REWARD
    }

    /// Returns the default data age reward.
    fn default_data_age_reward() -> u64 {
        defaults::DATA_AGE_REWARD
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_entries: defaults::TABLE_MAX_ENTRIES,
            low_confidence: defaults::TABLE_LOW_CONFIDENCE,
            stale_age: defaults::TABLE_STALE_AGE,
            tick_period: defaults::TABLE_TICK_PERIOD,
            path_history_len: defaults::PATH_HISTORY_LEN,
            confidence: defaults::TABLE_CONFIDENCE,
            addr_age_reward: defaults::ADDR_AGE_REWARD,
            data_age_reward: defaults::DATA_AGE_REWARD,
        }
    }
}

/// Pending join table configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingConfig {
    /// Maximum distinct PCs with queued chunks
    #[serde(default = "PendingConfig::default_max_pcs")]
    pub max_pcs: usize,

    /// Maximum chunks queued behind a single PC
    #[serde(default = "PendingConfig::default_max_chunks_per_pc")]
    pub max_chunks_per_pc: usize,

    /// Newest log entries whose PCs exempt a chunk from reverse search
    #[serde(default = "PendingConfig::default_reverse_search_window")]
    pub reverse_search_window: usize,
}

impl PendingConfig {
    /// Returns the default distinct-PC bound.
    fn default_max_pcs() -> usize {
        defaults::PENDING_MAX_PCS
    }

    /// Returns the default per-PC queue bound.
    fn default_max_chunks_per_pc() -> usize {
        defaults::PENDING_MAX_CHUNKS_PER_PC
    }

    /// Returns the default reverse-search window.
    fn default_reverse_search_window() -> usize {
        defaults::REVERSE_SEARCH_WINDOW
    }
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            max_pcs: defaults::PENDING_MAX_PCS,
            max_chunks_per_pc: defaults::PENDING_MAX_CHUNKS_PER_PC,
            reverse_search_window: defaults::REVERSE_SEARCH_WINDOW,
        }
    }
}

/// Write accumulator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccumulatorConfig {
    /// Maximum lines accumulated at once
    #[serde(default = "AccumulatorConfig::default_capacity")]
    pub capacity: usize,

    /// Ticks between retirement sweeps
    #[serde(default = "AccumulatorConfig::default_retire_period")]
    pub retire_period: u64,

    /// Idle ticks after which a dirty line retires
    #[serde(default = "AccumulatorConfig::default_retire_threshold")]
    pub retire_threshold: u64,
}

impl AccumulatorConfig {
    /// Returns the default accumulator capacity.
    fn default_capacity() -> usize {
        defaults::ACCUMULATOR_CAPACITY
    }

    /// Returns the default retirement sweep period.
    fn default_retire_period() -> u64 {
        defaults::ACCUMULATOR_RETIRE_PERIOD
    }

    /// Returns the default idle threshold.
    fn default_retire_threshold() -> u64 {
        defaults::ACCUMULATOR_RETIRE_THRESHOLD
    }
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::ACCUMULATOR_CAPACITY,
            retire_period: defaults::ACCUMULATOR_RETIRE_PERIOD,
            retire_threshold: defaults::ACCUMULATOR_RETIRE_THRESHOLD,
        }
    }
}

/// Completion matcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    /// Completed predictions kept per physical line
    #[serde(default = "MatcherConfig::default_max_per_address")]
    pub max_per_address: usize,

    /// Soft cap on completed predictions across all lines
    #[serde(default = "MatcherConfig::default_result_buffer_max")]
    pub result_buffer_max: usize,

    /// Age after which an unused free prediction may be swept
    #[serde(default = "MatcherConfig::default_free_age_limit")]
    pub free_age_limit: u64,

    /// Age after which an unused pattern prediction may be swept
    #[serde(default = "MatcherConfig::default_predicted_age_limit")]
    pub predicted_age_limit: u64,

    /// Per-PC confidence window
    #[serde(default = "MatcherConfig::default_pc_confidence")]
    pub pc_confidence: ConfidenceBounds,

    /// Minimum PC confidence for a history entry to be used by learning
    #[serde(default = "MatcherConfig::default_pc_confidence_gate")]
    pub pc_confidence_gate: u32,

    /// Maximum generator-hash confidence; new hashes start one below
    #[serde(default = "MatcherConfig::default_hash_confidence_max")]
    pub hash_confidence_max: u32,

    /// Repeat count at which a slot is predicted as a constant
    #[serde(default = "MatcherConfig::default_constant_threshold")]
    pub constant_threshold: u32,

    /// Saturation limit of the constant repeat count
    #[serde(default = "MatcherConfig::default_constant_cap")]
    pub constant_cap: u32,
}

impl MatcherConfig {
    /// Returns the default per-line FIFO depth.
    fn default_max_per_address() -> usize {
        defaults::MATCHER_MAX_PER_ADDRESS
    }

    /// Returns the default global soft cap.
    fn default_result_buffer_max() -> usize {
        defaults::MATCHER_RESULT_BUFFER_MAX
    }

    /// Returns the default free-prediction age limit.
    fn default_free_age_limit() -> u64 {
        defaults::MATCHER_FREE_AGE_LIMIT
    }

    /// Returns the default pattern-prediction age limit.
    fn default_predicted_age_limit() -> u64 {
        defaults::MATCHER_PREDICTED_AGE_LIMIT
    }

    /// Returns the default per-PC confidence window.
    fn default_pc_confidence() -> ConfidenceBounds {
        defaults::PC_CONFIDENCE
    }

    /// Returns the default learning gate.
    fn default_pc_confidence_gate() -> u32 {
        defaults::PC_CONFIDENCE_GATE
    }

    /// Returns the default generator-hash confidence maximum.
    fn default_hash_confidence_max() -> u32 {
        defaults::HASH_CONFIDENCE_MAX
    }

    /// Returns the default constant-prediction threshold.
    fn default_constant_threshold() -> u32 {
        defaults::CONSTANT_THRESHOLD
    }

    /// Returns the default constant repeat cap.
    fn default_constant_cap() -> u32 {
        defaults::CONSTANT_CAP
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_per_address: defaults::MATCHER_MAX_PER_ADDRESS,
            result_buffer_max: defaults::MATCHER_RESULT_BUFFER_MAX,
            free_age_limit: defaults::MATCHER_FREE_AGE_LIMIT,
            predicted_age_limit: defaults::MATCHER_PREDICTED_AGE_LIMIT,
            pc_confidence: defaults::PC_CONFIDENCE,
            pc_confidence_gate: defaults::PC_CONFIDENCE_GATE,
            hash_confidence_max: defaults::HASH_CONFIDENCE_MAX,
            constant_threshold: defaults::CONSTANT_THRESHOLD,
            constant_cap: defaults::CONSTANT_CAP,
        }
    }
}

/// Metadata cache configuration for both caches.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Set-associative counter cache
    #[serde(default)]
    pub counter: CounterCacheConfig,

    /// Fully associative verification cache
    #[serde(default)]
    pub verification: VerificationCacheConfig,

    /// Metadata requests serviced per engine operation
    #[serde(default = "MetadataConfig::default_drain_per_op")]
    pub drain_per_op: usize,
}

impl MetadataConfig {
    /// Returns the default request drain budget.
    fn default_drain_per_op() -> usize {
        defaults::METADATA_DRAIN_PER_OP
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            counter: CounterCacheConfig::default(),
            verification: VerificationCacheConfig::default(),
            drain_per_op: defaults::METADATA_DRAIN_PER_OP,
        }
    }
}

/// Counter cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CounterCacheConfig {
    /// Number of sets
    #[serde(default = "CounterCacheConfig::default_sets")]
    pub sets: usize,

    /// Ways per set
    #[serde(default = "CounterCacheConfig::default_ways")]
    pub ways: usize,

    /// Bytes of data covered by one metadata line
    #[serde(default = "CounterCacheConfig::default_line_bytes")]
    pub line_bytes: u64,

    /// Base of the counter metadata region in backing memory
    #[serde(default = "CounterCacheConfig::default_addr_offset")]
    pub addr_offset: u64,

    /// Size of one fill or write-back request in bytes
    #[serde(default = "CounterCacheConfig::default_request_bytes")]
    pub request_bytes: usize,
}

impl CounterCacheConfig {
    /// Returns the default number of sets.
    fn default_sets() -> usize {
        defaults::COUNTER_SETS
    }

    /// Returns the default associativity.
    fn default_ways() -> usize {
        defaults::COUNTER_WAYS
    }

    /// Returns the default metadata line coverage.
    fn default_line_bytes() -> u64 {
        defaults::COUNTER_LINE_BYTES
    }

    /// Returns the default metadata region base.
    fn default_addr_offset() -> u64 {
        defaults::COUNTER_ADDR_OFFSET
    }

    /// Returns the default request size.
    fn default_request_bytes() -> usize {
        defaults::METADATA_REQUEST_BYTES
    }
}

impl Default for CounterCacheConfig {
    fn default() -> Self {
        Self {
            sets: defaults::COUNTER_SETS,
            ways: defaults::COUNTER_WAYS,
            line_bytes: defaults::COUNTER_LINE_BYTES,
            addr_offset: defaults::COUNTER_ADDR_OFFSET,
            request_bytes: defaults::METADATA_REQUEST_BYTES,
        }
    }
}

/// Verification cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationCacheConfig {
    /// Total entries (fully associative)
    #[serde(default = "VerificationCacheConfig::default_entries")]
    pub entries: usize,

    /// Bytes of data covered by one metadata line
    #[serde(default = "VerificationCacheConfig::default_line_bytes")]
    pub line_bytes: u64,

    /// Integrity tree levels walked above a data line
    #[serde(default = "VerificationCacheConfig::default_tree_height")]
    pub tree_height: u32,

    /// Base of the verification metadata region in backing memory
    #[serde(default = "VerificationCacheConfig::default_addr_offset")]
    pub addr_offset: u64,

    /// Size of one fill or write-back request in bytes
    #[serde(default = "VerificationCacheConfig::default_request_bytes")]
    pub request_bytes: usize,
}

impl VerificationCacheConfig {
    /// Returns the default number of entries.
    fn default_entries() -> usize {
        defaults::VERIFICATION_ENTRIES
    }

    /// Returns the default metadata line coverage.
    fn default_line_bytes() -> u64 {
        defaults::VERIFICATION_LINE_BYTES
    }

    /// Returns the default tree height.
    fn default_tree_height() -> u32 {
        defaults::VERIFICATION_TREE_HEIGHT
    }

    /// Returns the default metadata region base.
    fn default_addr_offset() -> u64 {
        defaults::VERIFICATION_ADDR_OFFSET
    }

    /// Returns the default request size.
    fn default_request_bytes() -> usize {
        defaults::METADATA_REQUEST_BYTES
    }
}

impl Default for VerificationCacheConfig {
    fn default() -> Self {
        Self {
            entries: defaults::VERIFICATION_ENTRIES,
            line_bytes: defaults::VERIFICATION_LINE_BYTES,
            tree_height: defaults::VERIFICATION_TREE_HEIGHT,
            addr_offset: defaults::VERIFICATION_ADDR_OFFSET,
            request_bytes: defaults::METADATA_REQUEST_BYTES,
        }
    }
}

/// Credit-based port configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PortConfig {
    /// Requests that may be outstanding at once
    #[serde(default = "PortConfig::default_max_requests")]
    pub max_requests: usize,

    /// Responses that may be outstanding at once
    #[serde(default = "PortConfig::default_max_responses")]
    pub max_responses: usize,
}

impl PortConfig {
    /// Returns the default request credit count.
    fn default_max_requests() -> usize {
        defaults::PORT_MAX_REQUESTS
    }

    /// Returns the default response credit count.
    fn default_max_responses() -> usize {
        defaults::PORT_MAX_RESPONSES
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            max_requests: defaults::PORT_MAX_REQUESTS,
            max_responses: defaults::PORT_MAX_RESPONSES,
        }
    }
}

/// Feature toggles.
///
/// All toggles default to the full predictor; set a `disable_*` flag to turn a
/// mechanism off.
#[derive(Debug, Clone, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureConfig {
    /// Evict by age instead of confidence when the predictor table is full
    #[serde(default)]
    pub disable_confidence: bool,

    /// Learn and apply constant-zero chunk predictions
    #[serde(default = "FeatureConfig::enabled")]
    pub const_zero_prediction: bool,

    /// Ignore per-PC confidence when selecting history entries for learning
    #[serde(default)]
    pub disable_pc_confidence: bool,

    /// Do not emit free predictions from the write accumulator
    #[serde(default)]
    pub disable_free_prediction: bool,

    /// Override prediction targets with the stride address predictor
    #[serde(default = "FeatureConfig::enabled")]
    pub stride_address_prediction: bool,

    /// Flag chunks for backward history search during learning
    #[serde(default)]
    pub reverse_search: bool,
}

impl FeatureConfig {
    /// Default for toggles that are on unless disabled.
    fn enabled() -> bool {
        true
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            disable_confidence: false,
            const_zero_prediction: true,
            disable_pc_confidence: false,
            disable_free_prediction: false,
            stride_address_prediction: true,
            reverse_search: false,
        }
    }
}
