//! Cache Manager Module
//!
//! Main cache engine combining HashMap storage with priority-aware eviction,
//! TTL expiration, access statistics and durable-subset persistence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheEntry, CacheStats, EntryMetadata, Priority};
use crate::clock::Clock;
use crate::config::{CacheConfig, CacheConfigUpdate, CleanupSettings};
use crate::persist::{
    DurableStore, PersistRequest, PersistenceHandle, CONFIG_STORAGE_KEY, ENTRIES_STORAGE_KEY,
    SNAPSHOT_VERSION,
};

// == Persisted Documents ==
/// Snapshot of the durable-tier entries written to storage.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntries {
    version: u32,
    saved_at: String,
    entries: HashMap<String, CacheEntry>,
}

/// Configuration document written to storage.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedConfig {
    version: u32,
    config: CacheConfig,
}

// == Usage Summary ==
/// One row of the most-used report: key, read count and tier.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    /// The entry's key
    pub key: String,
    /// Successful reads since insertion
    pub access_count: u64,
    /// Importance tier
    pub priority: Priority,
}

// == Cache Manager ==
/// Bounded key/value cache with priority-aware eviction and TTL support.
///
/// Every public operation is synchronous and infallible: capacity pressure is
/// resolved by eviction, storage failures are logged and absorbed. Writes to
/// durable storage go through a fire-and-forget queue, so callers observe
/// in-memory state immediately and persistence catches up behind them.
///
/// Intended shared form is `Arc<RwLock<CacheManager>>`; each method runs to
/// completion under the lock, so no entry is ever observed half-updated.
#[derive(Debug)]
pub struct CacheManager {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Live configuration
    config: CacheConfig,
    /// Time source for timestamps and expiry checks
    clock: Arc<dyn Clock>,
    /// Submission side of the persistence queue
    persistence: PersistenceHandle,
    /// Publishes cleanup settings to the background sweep task
    cleanup_tx: watch::Sender<CleanupSettings>,
}

impl CacheManager {
    // == Constructor ==
    /// Creates a cache manager, restoring persisted state from `store`.
    ///
    /// A previously persisted configuration overrides `config`; previously
    /// persisted durable-tier entries are revived, silently dropping any
    /// whose TTL has already elapsed. Unreadable or malformed persisted data
    /// is logged and ignored.
    ///
    /// # Arguments
    /// * `config` - Compiled-in defaults, used when no persisted config exists
    /// * `store` - Durable backend read once at construction
    /// * `clock` - Time source for timestamps and expiry checks
    /// * `persistence` - Submission handle for the write queue
    pub fn new(
        config: CacheConfig,
        store: &dyn DurableStore,
        clock: Arc<dyn Clock>,
        persistence: PersistenceHandle,
    ) -> Self {
        let config = load_persisted_config(store).unwrap_or(config);
        let entries = load_persisted_entries(store, clock.as_ref());
        let (cleanup_tx, _) = watch::channel(config.cleanup_settings());

        let mut manager = Self {
            entries,
            stats: CacheStats::new(),
            config,
            clock,
            persistence,
            cleanup_tx,
        };
        manager.recompute_totals();

        if !manager.entries.is_empty() {
            info!(
                "Restored {} durable entries from storage",
                manager.entries.len()
            );
        }
        manager
    }

    // == Set ==
    /// Stores a payload under `key` with optional TTL and a priority tier.
    ///
    /// If the key already exists the entry is replaced and its metadata
    /// starts over. If the insert would exceed the configured bounds, lower
    /// tiers are evicted first (least recently used within a tier) until it
    /// fits. A payload larger than the whole cache is rejected and logged.
    ///
    /// # Arguments
    /// * `key` - The key to store under
    /// * `data` - The payload
    /// * `ttl_ms` - Optional TTL in milliseconds; None = never expires
    /// * `priority` - Importance tier
    pub fn set(&mut self, key: impl Into<String>, data: Value, ttl_ms: Option<u64>, priority: Priority) {
        let key = key.into();
        let now = self.clock.now_ms();
        let entry = CacheEntry::new(data, ttl_ms, priority, now);

        if entry.size > self.config.max_size {
            warn!(
                "Rejecting '{}': {} bytes exceeds the {} byte cache limit",
                key, entry.size, self.config.max_size
            );
            return;
        }

        // Replacing an entry frees its space before capacity is checked
        self.entries.remove(&key);
        self.make_room_for(entry.size);

        debug!(
            "Cached '{}' ({} bytes, {:?} priority)",
            key, entry.size, priority
        );
        self.entries.insert(key, entry);
        self.recompute_totals();
        self.persist_entries();
    }

    // == Get ==
    /// Retrieves the payload stored under `key`.
    ///
    /// Returns None and records a miss if the key is absent or its TTL has
    /// elapsed; an elapsed entry is deleted on the way out. A successful read
    /// records a hit and refreshes the entry's access metadata.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.drop_expired(key);
            self.stats.record_miss();
            return None;
        }

        if let Some(entry) = self.entries.get_mut(key) {
            entry.touch(now);
            self.stats.record_hit();
            return Some(entry.data.clone());
        }
        self.stats.record_miss();
        None
    }

    // == Has ==
    /// Checks whether `key` holds an unexpired entry.
    ///
    /// Applies the same lazy expiry deletion as `get`, but never touches the
    /// hit/miss counters or the entry's access metadata.
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };

        if expired {
            self.drop_expired(key);
            return false;
        }
        true
    }

    // == Delete ==
    /// Removes the entry under `key`, returning whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.recompute_totals();
            self.persist_entries();
            debug!("Deleted '{}'", key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Removes every entry.
    ///
    /// Current totals drop to zero; the cumulative hit/miss/eviction counters
    /// are untouched. The now-empty durable subset is persisted.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.recompute_totals();
        self.persist_entries();
        info!("Cleared {} entries", removed);
    }

    // == Clear By Priority ==
    /// Removes every entry of the given tier, returning how many were removed.
    pub fn clear_by_priority(&mut self, priority: Priority) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.priority != priority);
        let removed = before - self.entries.len();

        if removed > 0 {
            self.recompute_totals();
            self.persist_entries();
            info!("Cleared {} {:?}-priority entries", removed, priority);
        }
        removed
    }

    // == Clear Expired ==
    /// Removes every entry whose TTL has elapsed as of now.
    ///
    /// Returns the number of entries removed. When nothing has expired this
    /// is a pure no-op: no stats refresh, no persistence write.
    pub fn clear_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();

        if removed > 0 {
            self.recompute_totals();
            self.persist_entries();
            debug!("Swept {} expired entries", removed);
        }
        removed
    }

    // == Keys ==
    /// Returns all current keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Get Metadata ==
    /// Returns everything about the entry under `key` except its payload.
    pub fn get_metadata(&self, key: &str) -> Option<EntryMetadata> {
        self.entries
            .get(key)
            .map(|entry| EntryMetadata::new(key, entry))
    }

    // == Most Used Entries ==
    /// Returns up to `limit` entries ordered by tier (critical first), then
    /// by read count descending.
    pub fn get_most_used_entries(&self, limit: usize) -> Vec<UsageSummary> {
        let mut summaries: Vec<UsageSummary> = self
            .entries
            .iter()
            .map(|(key, entry)| UsageSummary {
                key: key.clone(),
                access_count: entry.access_count,
                priority: entry.priority,
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then(b.access_count.cmp(&a.access_count))
        });
        summaries.truncate(limit);
        summaries
    }

    // == Update Config ==
    /// Merges a partial update into the live configuration.
    ///
    /// The merged configuration is persisted, and the background sweep task
    /// is rescheduled immediately when its settings changed.
    pub fn update_config(&mut self, update: CacheConfigUpdate) {
        let before = self.config.cleanup_settings();
        self.config.apply(&update);
        self.persist_config();

        let after = self.config.cleanup_settings();
        if before != after {
            self.cleanup_tx.send_replace(after);
            info!(
                "Cleanup settings changed: enabled={}, interval={}ms",
                after.enabled, after.interval_ms
            );
        }
    }

    // == Get Config ==
    /// Returns a snapshot copy of the live configuration.
    pub fn get_config(&self) -> CacheConfig {
        self.config.clone()
    }

    // == Stats ==
    /// Returns a snapshot copy of the current statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // == Subscribe Cleanup ==
    /// Receiver for the background sweep task; a new value arrives whenever
    /// `update_config` changes the sweep settings.
    pub fn subscribe_cleanup(&self) -> watch::Receiver<CleanupSettings> {
        self.cleanup_tx.subscribe()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internals ==
    /// Evicts entries until an incoming entry of `incoming` bytes fits both
    /// configured bounds.
    ///
    /// Candidates are taken lowest tier first, least recently used within a
    /// tier. Critical entries sort last, so they are reached only when
    /// removing everything below them was not enough.
    fn make_room_for(&mut self, incoming: usize) {
        let current_size: usize = self.entries.values().map(|entry| entry.size).sum();
        let fits_size = current_size + incoming <= self.config.max_size;
        let fits_count = self.entries.len() < self.config.max_entries;
        if fits_size && fits_count {
            return;
        }

        let mut candidates: Vec<(String, u8, u64, usize)> = self
            .entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    entry.priority.rank(),
                    entry.last_accessed,
                    entry.size,
                )
            })
            .collect();
        candidates.sort_by_key(|(_, rank, last_accessed, _)| (*rank, *last_accessed));

        let entries_before = self.entries.len();
        let mut freed = 0usize;
        let mut evicted = 0usize;

        for (key, _, _, size) in candidates {
            let size_ok = current_size - freed + incoming <= self.config.max_size;
            let count_ok = entries_before - evicted < self.config.max_entries;
            if size_ok && count_ok {
                break;
            }

            self.entries.remove(&key);
            debug!("Evicted '{}' ({} bytes)", key, size);
            freed += size;
            evicted += 1;
        }

        if evicted > 0 {
            self.stats.record_evictions(evicted as u64);
            info!(
                "Evicted {} entries to make room for an incoming {} byte entry",
                evicted, incoming
            );
        }
    }

    /// Removes an entry whose TTL elapsed, found by a read path.
    fn drop_expired(&mut self, key: &str) {
        self.entries.remove(key);
        self.recompute_totals();
        self.persist_entries();
        debug!("Dropped '{}', TTL elapsed", key);
    }

    /// Refreshes the current entry count and total size.
    fn recompute_totals(&mut self) {
        let size = self.entries.values().map(|entry| entry.size).sum();
        self.stats.set_totals(self.entries.len(), size);
    }

    /// Submits the durable-tier subset to the write queue.
    fn persist_entries(&self) {
        let durable: HashMap<String, CacheEntry> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.priority.is_durable())
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();

        let snapshot = PersistedEntries {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            entries: durable,
        };

        match serde_json::to_string(&snapshot) {
            Ok(payload) => self.persistence.submit(PersistRequest {
                storage_key: ENTRIES_STORAGE_KEY,
                payload,
            }),
            Err(e) => error!("Failed to serialize entries snapshot: {}", e),
        }
    }

    /// Submits the live configuration to the write queue.
    fn persist_config(&self) {
        let document = PersistedConfig {
            version: SNAPSHOT_VERSION,
            config: self.config.clone(),
        };

        match serde_json::to_string(&document) {
            Ok(payload) => self.persistence.submit(PersistRequest {
                storage_key: CONFIG_STORAGE_KEY,
                payload,
            }),
            Err(e) => error!("Failed to serialize config: {}", e),
        }
    }
}

// == Restore Helpers ==
/// Loads the persisted configuration, if one exists and decodes cleanly.
fn load_persisted_config(store: &dyn DurableStore) -> Option<CacheConfig> {
    let raw = match store.get_item(CONFIG_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            error!("Failed to read persisted config: {}", e);
            return None;
        }
    };

    match serde_json::from_str::<PersistedConfig>(&raw) {
        Ok(document) if document.version == SNAPSHOT_VERSION => Some(document.config),
        Ok(document) => {
            warn!(
                "Ignoring persisted config with unknown version {}",
                document.version
            );
            None
        }
        Err(e) => {
            error!("Malformed persisted config, using defaults: {}", e);
            None
        }
    }
}

/// Loads the persisted entries snapshot, dropping entries that expired while
/// the process was down.
fn load_persisted_entries(store: &dyn DurableStore, clock: &dyn Clock) -> HashMap<String, CacheEntry> {
    let raw = match store.get_item(ENTRIES_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return HashMap::new(),
        Err(e) => {
            error!("Failed to read persisted entries: {}", e);
            return HashMap::new();
        }
    };

    let snapshot = match serde_json::from_str::<PersistedEntries>(&raw) {
        Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => snapshot,
        Ok(snapshot) => {
            warn!(
                "Ignoring persisted entries with unknown version {}",
                snapshot.version
            );
            return HashMap::new();
        }
        Err(e) => {
            error!("Malformed persisted entries, starting empty: {}", e);
            return HashMap::new();
        }
    };

    let now = clock.now_ms();
    let total = snapshot.entries.len();
    let entries: HashMap<String, CacheEntry> = snapshot
        .entries
        .into_iter()
        .filter(|(_, entry)| !entry.is_expired(now))
        .collect();

    if entries.len() < total {
        debug!(
            "Skipped {} expired entries during restore",
            total - entries.len()
        );
    }
    entries
}
