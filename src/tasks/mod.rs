//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - Expired-entry sweep: removes expired entries at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
