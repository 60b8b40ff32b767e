//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! the space currently in use.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
///
/// `hits`, `misses` and `evictions` are cumulative for the process lifetime;
/// `total_entries` and `total_size` mirror the current contents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Sum of the sizes of all current entries, in bytes
    pub total_size: usize,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted to stay within capacity
    pub evictions: u64,
    /// Percentage of reads that hit, rounded to 2 decimals
    pub hit_rate: f64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter and refreshes the hit rate.
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.update_hit_rate();
    }

    // == Record Miss ==
    /// Increments the miss counter and refreshes the hit rate.
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.update_hit_rate();
    }

    // == Record Evictions ==
    /// Adds `count` to the eviction counter.
    pub fn record_evictions(&mut self, count: u64) {
        self.evictions += count;
    }

    // == Update Totals ==
    /// Updates the current entry count and total size.
    pub fn set_totals(&mut self, entries: usize, size: usize) {
        self.total_entries = entries;
        self.total_size = size;
    }

    /// Recomputes `hit_rate` as hits / (hits + misses) * 100, rounded to
    /// 2 decimal places. Zero while no reads have happened.
    fn update_hit_rate(&mut self) {
        let total = self.hits + self.misses;
        self.hit_rate = if total == 0 {
            0.0
        } else {
            let rate = self.hits as f64 / total as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        };
    }
}
