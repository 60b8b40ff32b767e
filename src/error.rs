//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.
//!
//! These errors never cross the public `CacheManager` surface: the cache is a
//! best-effort layer, so storage and decoding failures are absorbed and logged
//! by the manager. The types below exist for the persistence plumbing
//! underneath it.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the persistence layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Durable store backend failed to read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Durable store I/O failure (file-backed stores)
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted payload could not be decoded
    #[error("Malformed persisted data: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;
