//! Prediction statistics collection and reporting.
//!
//! This module tracks event counts for the write-prediction engine. It provides:
//! 1. **Summary:** Observed stores, flushes and the overall prediction hit rate.
//! 2. **Learning:** Line-flush learning results and predictor table churn.
//! 3. **Pending:** Promotions, early resolutions and capacity losses in the join table.
//! 4. **Backend:** Submissions, match outcomes and FIFO/sweep evictions.
//! 5. **Metadata:** Hit/miss, fill and write-back counts of both metadata caches.

use serde::Serialize;

/// Engine statistics.
///
/// Plain counters; every field only ever increases over a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PredictorStats {
    /// Write operations observed.
    pub writes_observed: u64,
    /// Writes that landed in the target region.
    pub region_writes: u64,
    /// Flush hints observed.
    pub flushes: u64,
    /// Entries appended to the write history log.
    pub history_records: u64,

    /// Accumulated lines handed to line learning.
    pub learning_attempts: u64,
    /// Learning passes that produced a predictor entry.
    pub entries_learned: u64,
    /// Learning passes that found no pointer to the line.
    pub address_not_found: u64,
    /// Learning passes that left some chunk unexplained.
    pub data_not_found: u64,
    /// New hashes inserted into the predictor table.
    pub table_insertions: u64,
    /// Weak residents replaced.
    pub table_replacements: u64,
    /// Confident residents reinforced.
    pub table_reinforcements: u64,
    /// Entries evicted to make room.
    pub table_capacity_evictions: u64,
    /// Entries removed by stale purges.
    pub table_stale_purges: u64,

    /// Patterns promoted into the pending table.
    pub promotions: u64,
    /// Chunks resolved to zero at promotion.
    pub const_zero_predictions: u64,
    /// Chunks resolved by backward history search.
    pub reverse_search_hits: u64,
    /// Pending chunks dropped for capacity.
    pub pending_evictions: u64,
    /// Parents discarded before completing.
    pub abandoned_parents: u64,
    /// Parents that completed.
    pub parents_completed: u64,

    /// Pattern predictions submitted to the matcher.
    pub predictions_submitted: u64,
    /// Free predictions submitted to the matcher.
    pub free_predictions_submitted: u64,
    /// Prediction targets replaced by the stride predictor.
    pub stride_overrides: u64,
    /// Chunks replaced by learned constants.
    pub constants_applied: u64,
    /// Predictions or write-backs dropped because translation failed.
    pub untranslatable: u64,
    /// Predictions dropped from full per-line FIFOs.
    pub fifo_overflow_evictions: u64,
    /// Predictions removed by the global sweep.
    pub sweep_evictions: u64,
    /// Write-backs fully matched by a free prediction.
    pub full_matches_free: u64,
    /// Write-backs fully matched by a pattern prediction.
    pub full_matches_pattern: u64,
    /// Write-backs with only a partial match.
    pub partial_matches: u64,
    /// Write-backs no prediction agreed with.
    pub total_misses: u64,
    /// Write-backs with no prediction queued.
    pub unpredicted_writebacks: u64,
    /// Unused predictions dropped by total misses.
    pub invalidated_entries: u64,

    /// Counter cache hits.
    pub counter_hits: u64,
    /// Counter cache misses.
    pub counter_misses: u64,
    /// Counter cache fills queued.
    pub counter_fills: u64,
    /// Counter cache write-backs queued.
    pub counter_writebacks: u64,
    /// Verification cache hits.
    pub verification_hits: u64,
    /// Verification cache misses.
    pub verification_misses: u64,
    /// Verification cache fills queued.
    pub verification_fills: u64,
    /// Verification cache write-backs queued.
    pub verification_writebacks: u64,
    /// Metadata requests serviced through the backing store.
    pub metadata_requests_serviced: u64,

    /// Operations refused at the port for lack of credits.
    pub port_busy_rejections: u64,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"learning"`, `"pending"`, `"backend"`, `"metadata"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "learning", "pending", "backend", "metadata"];

impl PredictorStats {
    /// Write-backs fully matched by any prediction.
    pub const fn full_matches(&self) -> u64 {
        self.full_matches_free + self.full_matches_pattern
    }

    /// Write-backs seen by the matcher.
    pub const fn writebacks(&self) -> u64 {
        self.full_matches()
            + self.partial_matches
            + self.total_misses
            + self.unpredicted_writebacks
    }

    /// Fraction of write-backs fully matched, in percent.
    pub fn hit_rate(&self) -> f64 {
        percent(self.full_matches(), self.writebacks())
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an
    /// empty slice to print all sections.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        if want("summary") {
            println!("\n==========================================================");
            println!("WRITE PREDICTION STATISTICS");
            println!("==========================================================");
            println!("writes                   {}", self.writes_observed);
            println!("writes.region            {}", self.region_writes);
            println!("flushes                  {}", self.flushes);
            println!("writebacks               {}", self.writebacks());
            println!("hit_rate                 {:.2}%", self.hit_rate());
            println!("----------------------------------------------------------");
        }
        if want("learning") {
            println!("LEARNING");
            println!("  learn.attempts         {}", self.learning_attempts);
            println!(
                "  learn.learned          {} ({:.2}%)",
                self.entries_learned,
                percent(self.entries_learned, self.learning_attempts)
            );
            println!("  learn.addr_not_found   {}", self.address_not_found);
            println!("  learn.data_not_found   {}", self.data_not_found);
            println!("  table.insertions       {}", self.table_insertions);
            println!("  table.replacements     {}", self.table_replacements);
            println!("  table.reinforcements   {}", self.table_reinforcements);
            println!("  table.evictions        {}", self.table_capacity_evictions);
            println!("  table.stale_purges     {}", self.table_stale_purges);
            println!("----------------------------------------------------------");
        }
        if want("pending") {
            println!("PENDING");
            println!("  promotions             {}", self.promotions);
            println!(
                "  parents.completed      {} ({:.2}%)",
                self.parents_completed,
                percent(self.parents_completed, self.promotions)
            );
            println!("  parents.abandoned      {}", self.abandoned_parents);
            println!("  chunks.const_zero      {}", self.const_zero_predictions);
            println!("  chunks.reverse_search  {}", self.reverse_search_hits);
            println!("  chunks.evicted         {}", self.pending_evictions);
            println!("----------------------------------------------------------");
        }
        if want("backend") {
            println!("BACKEND");
            println!("  submitted.pattern      {}", self.predictions_submitted);
            println!("  submitted.free         {}", self.free_predictions_submitted);
            println!("  stride_overrides       {}", self.stride_overrides);
            println!("  constants_applied      {}", self.constants_applied);
            println!("  untranslatable         {}", self.untranslatable);
            println!("  match.full.pattern     {}", self.full_matches_pattern);
            println!("  match.full.free        {}", self.full_matches_free);
            println!("  match.partial          {}", self.partial_matches);
            println!("  match.miss             {}", self.total_misses);
            println!("  match.unpredicted      {}", self.unpredicted_writebacks);
            println!("  evict.overflow         {}", self.fifo_overflow_evictions);
            println!("  evict.sweep            {}", self.sweep_evictions);
            println!("  evict.invalidated      {}", self.invalidated_entries);
            println!("  port.busy              {}", self.port_busy_rejections);
            println!("----------------------------------------------------------");
        }
        if want("metadata") {
            let print_cache = |name: &str, hits: u64, misses: u64, fills: u64, wbs: u64| {
                let total = hits + misses;
                println!(
                    "  {:<12} accesses: {:<10} | hits: {:<10} | miss_rate: {:.2}% | fills: {:<8} | writebacks: {}",
                    name,
                    total,
                    hits,
                    percent(misses, total),
                    fills,
                    wbs
                );
            };
            println!("METADATA CACHES");
            print_cache(
                "counter",
                self.counter_hits,
                self.counter_misses,
                self.counter_fills,
                self.counter_writebacks,
            );
            print_cache(
                "verification",
                self.verification_hits,
                self.verification_misses,
                self.verification_fills,
                self.verification_writebacks,
            );
            println!("  requests.serviced      {}", self.metadata_requests_serviced);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}
