//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support,
//! priority tiers and access metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::Priority;

// == Cache Entry ==
/// Represents a single cache entry with payload and metadata.
///
/// The key lives in the cache map; everything else about an entry is here.
/// Entries serialize so that the durable tiers can be written to storage and
/// revived after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored payload
    pub data: Value,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Importance tier
    pub priority: Priority,
    /// Byte length of the JSON encoding of `data`, fixed at insertion
    pub size: usize,
    /// Number of successful reads since insertion
    pub access_count: u64,
    /// Timestamp of the most recent successful read (Unix milliseconds)
    pub last_accessed: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `data` - The payload to store
    /// * `ttl_ms` - Optional TTL in milliseconds
    /// * `priority` - Importance tier
    /// * `now_ms` - Current time in Unix milliseconds
    pub fn new(data: Value, ttl_ms: Option<u64>, priority: Priority, now_ms: u64) -> Self {
        let size = payload_size(&data);
        Self {
            data,
            timestamp: now_ms,
            expires_at: ttl_ms.map(|ttl| now_ms + ttl),
            priority,
            size,
            access_count: 0,
            last_accessed: now_ms,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now_ms`.
    ///
    /// An entry is expired once the current time is strictly past its
    /// expiration time; entries without a TTL never expire. The lazy read
    /// path and the periodic sweep both use this same test.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => expires < now_ms,
            None => false,
        }
    }

    // == Touch ==
    /// Records a successful read at `now_ms`.
    pub fn touch(&mut self, now_ms: u64) {
        self.access_count += 1;
        self.last_accessed = now_ms;
    }
}

// == Entry Metadata ==
/// Everything about an entry except its payload.
#[derive(Debug, Clone, Serialize)]
pub struct EntryMetadata {
    /// The entry's key
    pub key: String,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Importance tier
    pub priority: Priority,
    /// Byte length of the JSON encoding of the payload
    pub size: usize,
    /// Number of successful reads since insertion
    pub access_count: u64,
    /// Timestamp of the most recent successful read (Unix milliseconds)
    pub last_accessed: u64,
}

impl EntryMetadata {
    /// Builds metadata for `entry` stored under `key`.
    pub fn new(key: &str, entry: &CacheEntry) -> Self {
        Self {
            key: key.to_string(),
            timestamp: entry.timestamp,
            expires_at: entry.expires_at,
            priority: entry.priority,
            size: entry.size,
            access_count: entry.access_count,
            last_accessed: entry.last_accessed,
        }
    }
}

// == Utility Functions ==
/// Approximate byte size of a payload: the length of its JSON encoding.
///
/// Deterministic and monotonic with payload complexity, which is all the
/// capacity accounting needs.
pub fn payload_size(data: &Value) -> usize {
    serde_json::to_vec(data).map_or(0, |bytes| bytes.len())
}
