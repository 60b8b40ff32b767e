//! Persistence Module
//!
//! Best-effort durability for the cache: a key/value store abstraction, the
//! fire-and-forget write queue in front of it, and the fixed storage keys
//! the cache writes under.

mod store;
mod writer;

pub use store::{DurableStore, FileStore, MemoryStore};
pub use writer::{flush_pending, spawn_persistence_task, PersistRequest, PersistenceHandle};

// == Public Constants ==
/// Storage key holding the persisted entries snapshot
pub const ENTRIES_STORAGE_KEY: &str = "priocache:entries";

/// Storage key holding the persisted configuration
pub const CONFIG_STORAGE_KEY: &str = "priocache:config";

/// Version tag written into persisted documents; a mismatch on load is
/// treated as malformed data and ignored
pub const SNAPSHOT_VERSION: u32 = 1;
