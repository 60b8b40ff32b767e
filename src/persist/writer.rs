//! Persistence Writer Module
//!
//! Fire-and-forget write path between the cache and its durable store. The
//! cache submits write intents to an unbounded queue and moves on; a
//! background task drains the queue and applies the writes, logging failures
//! instead of surfacing them.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::persist::DurableStore;

// == Persist Request ==
/// One pending write: a full document destined for a fixed storage key.
#[derive(Debug, Clone)]
pub struct PersistRequest {
    /// Logical storage key to write under
    pub storage_key: &'static str,
    /// Serialized document
    pub payload: String,
}

// == Persistence Handle ==
/// Submission side of the write queue, held by the cache.
#[derive(Debug, Clone)]
pub struct PersistenceHandle {
    tx: UnboundedSender<PersistRequest>,
}

impl PersistenceHandle {
    /// Creates a handle and the receiver end of its queue.
    ///
    /// Hand the receiver to [`spawn_persistence_task`], or drain it directly
    /// with [`flush_pending`].
    pub fn channel() -> (Self, UnboundedReceiver<PersistRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Submits a write intent. Never blocks; a closed queue is logged and
    /// the intent dropped.
    pub fn submit(&self, request: PersistRequest) {
        if self.tx.send(request).is_err() {
            error!("Persistence queue closed, dropping write intent");
        }
    }
}

// == Writer Task ==
/// Spawns the background task that applies queued writes to `store`.
///
/// The task exits when every [`PersistenceHandle`] feeding the queue has
/// been dropped.
///
/// # Arguments
/// * `store` - Durable backend the writes land in
/// * `rx` - Receiver created by [`PersistenceHandle::channel`]
///
/// # Returns
/// A JoinHandle for the spawned task, usable to abort it during shutdown.
pub fn spawn_persistence_task(
    store: Arc<dyn DurableStore>,
    mut rx: UnboundedReceiver<PersistRequest>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Persistence writer task started");

        while let Some(request) = rx.recv().await {
            apply_request(store.as_ref(), &request);
        }

        debug!("Persistence queue closed, writer task exiting");
    })
}

// == Flush Pending ==
/// Drains the queue synchronously, applying every pending write.
///
/// Lets a shutdown path make sure the last snapshot reaches the store
/// without racing the writer task. Returns the number of writes applied.
pub fn flush_pending(store: &dyn DurableStore, rx: &mut UnboundedReceiver<PersistRequest>) -> usize {
    let mut applied = 0;
    while let Ok(request) = rx.try_recv() {
        apply_request(store, &request);
        applied += 1;
    }
    applied
}

/// Applies one write, logging failure. Best-effort by design of the store
/// contract: a lost write costs a restart warm-up, nothing more.
fn apply_request(store: &dyn DurableStore, request: &PersistRequest) {
    match store.set_item(request.storage_key, &request.payload) {
        Ok(()) => debug!(
            "Persisted {} ({} bytes)",
            request.storage_key,
            request.payload.len()
        ),
        Err(e) => error!("Failed to persist {}: {}", request.storage_key, e),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use std::time::Duration;

    #[test]
    fn test_flush_pending_applies_queued_writes() {
        let store = MemoryStore::new();
        let (handle, mut rx) = PersistenceHandle::channel();

        handle.submit(PersistRequest {
            storage_key: "cache:entries",
            payload: "{\"a\":1}".to_string(),
        });
        handle.submit(PersistRequest {
            storage_key: "cache:entries",
            payload: "{\"a\":2}".to_string(),
        });

        let applied = flush_pending(&store, &mut rx);
        assert_eq!(applied, 2);
        // Last write wins
        assert_eq!(
            store.get_item("cache:entries").unwrap().unwrap(),
            "{\"a\":2}"
        );
    }

    #[test]
    fn test_flush_pending_empty_queue() {
        let store = MemoryStore::new();
        let (_handle, mut rx) = PersistenceHandle::channel();
        assert_eq!(flush_pending(&store, &mut rx), 0);
    }

    #[test]
    fn test_submit_after_receiver_dropped_does_not_panic() {
        let (handle, rx) = PersistenceHandle::channel();
        drop(rx);
        handle.submit(PersistRequest {
            storage_key: "cache:entries",
            payload: "{}".to_string(),
        });
    }

    #[tokio::test]
    async fn test_writer_task_applies_writes() {
        let store = Arc::new(MemoryStore::new());
        let (handle, rx) = PersistenceHandle::channel();
        let task = spawn_persistence_task(store.clone(), rx);

        handle.submit(PersistRequest {
            storage_key: "cache:config",
            payload: "{\"version\":1}".to_string(),
        });

        // Closing the queue lets the task finish once it has drained it
        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("writer task should exit")
            .unwrap();

        assert_eq!(
            store.get_item("cache:config").unwrap().unwrap(),
            "{\"version\":1}"
        );
    }
}
