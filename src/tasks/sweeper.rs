//! Expiration Sweeper
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Cache;

// == Sweeper Handle ==
/// Owner-side handle of a running sweeper.
///
/// Cancellation goes through a watch channel, so `cancel` can be called any
/// number of times, including after the task has already stopped.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop after its current pass.
    pub fn cancel(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the sweeper and waits for it to exit.
    pub async fn shutdown(self) {
        self.cancel();
        // A panicked or aborted sweep has nothing left to clean up
        let _ = self.task.await;
    }
}

/// Spawns a task that calls `clear_expired` every `interval`.
///
/// The first sweep runs one interval after spawning.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::new(0));
/// let sweeper = spawn_sweeper(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweeper.shutdown().await;
/// ```
pub fn spawn_sweeper(cache: Arc<Cache>, interval: Duration) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!("Starting expiration sweeper with interval of {:?}", interval);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown_rx.changed() => {
                    // Err means every sender is gone, which also ends the loop
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let removed = cache.clear_expired();
            if removed > 0 {
                info!("Sweep removed {} expired entries", removed);
            } else {
                debug!("Sweep found no expired entries");
            }
        }

        info!("Expiration sweeper stopped");
    });

    SweeperHandle { shutdown_tx, task }
}
