//! PrioCache - a bounded in-memory cache with priority tiers
//!
//! Provides TTL expiration, least-recently-used eviction within priority
//! tiers, access statistics, and best-effort persistence of high-priority
//! entries across restarts.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod persist;
pub mod tasks;

pub use cache::{CacheEntry, CacheManager, CacheStats, EntryMetadata, Priority, UsageSummary};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheConfigUpdate, CleanupSettings};
pub use error::{CacheError, Result};
pub use persist::{
    flush_pending, spawn_persistence_task, DurableStore, FileStore, MemoryStore, PersistenceHandle,
};
pub use tasks::spawn_cleanup_task;
