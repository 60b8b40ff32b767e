//! Expired-Entry Sweep Task
//!
//! Background task that periodically removes expired cache entries, with its
//! schedule driven by the live cache configuration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::config::CleanupSettings;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// While sweeping is enabled the task sleeps for the configured interval,
/// then takes the write lock and runs a sweep. While disabled it schedules
/// no timer at all and just waits for a settings change. Settings changes
/// published by `CacheManager::update_config` cancel the pending timer and
/// reschedule immediately.
///
/// The task exits on its own when the cache (and with it the settings
/// channel) is dropped.
///
/// # Arguments
/// * `cache` - Shared cache to sweep
/// * `settings_rx` - Receiver from `CacheManager::subscribe_cleanup`
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(manager));
/// let settings_rx = cache.read().await.subscribe_cleanup();
/// let sweep_handle = spawn_cleanup_task(cache.clone(), settings_rx);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<CacheManager>>,
    mut settings_rx: watch::Receiver<CleanupSettings>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut settings = *settings_rx.borrow_and_update();
        info!(
            "Starting cleanup task: enabled={}, interval={}ms",
            settings.enabled, settings.interval_ms
        );

        loop {
            if settings.enabled {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(settings.interval_ms)) => {
                        let removed = {
                            let mut cache_guard = cache.write().await;
                            cache_guard.clear_expired()
                        };

                        if removed > 0 {
                            info!("Sweep removed {} expired entries", removed);
                        } else {
                            debug!("Sweep found no expired entries");
                        }
                    }
                    changed = settings_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        settings = *settings_rx.borrow_and_update();
                        debug!(
                            "Sweep rescheduled: enabled={}, interval={}ms",
                            settings.enabled, settings.interval_ms
                        );
                    }
                }
            } else {
                // No timer while disabled; wake only on a settings change
                if settings_rx.changed().await.is_err() {
                    break;
                }
                settings = *settings_rx.borrow_and_update();
            }
        }

        debug!("Cleanup settings channel closed, task exiting");
    })
}
