//! Background Expiry Sweeper
//!
//! Reads already treat expired keys as absent, so correctness never depends
//! on this module. What lazy expiry cannot do is reclaim a key that is never
//! read again. The sweeper is an opt-in task that periodically calls
//! [`StorageEngine::cleanup_expired`] to free that memory.
//!
//! The interval adapts: a sweep that removes keys halves the wait (down to
//! `min_interval`), an empty sweep doubles it (up to `max_interval`).

use crate::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Interval used for the first sweep
    pub base_interval: Duration,

    /// Shortest wait between sweeps
    pub min_interval: Duration,

    /// Longest wait between sweeps
    pub max_interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self::with_interval(Duration::from_millis(100))
    }
}

impl ExpiryConfig {
    /// Sweeps every `interval`, adapting between a tenth of it and ten times it.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            base_interval: interval,
            min_interval: (interval / 10).max(Duration::from_millis(1)),
            max_interval: interval * 10,
        }
    }
}

/// Handle to a running sweeper task. Dropping it stops the task.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ExpirySweeper {
    /// Spawns the sweeper on the current Tokio runtime.
    pub fn start(engine: Arc<StorageEngine>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            interval_ms = config.base_interval.as_millis() as u64,
            "Background expiry sweeper started"
        );
        let task = tokio::spawn(sweep_loop(engine, config, shutdown_rx));

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn sweep_loop(
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = config.base_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Background expiry sweeper stopped");
                    return;
                }
            }
        }

        let removed = engine.cleanup_expired();

        if removed > 0 {
            interval = (interval / 2).max(config.min_interval);
            debug!(
                removed,
                keys_remaining = engine.len(),
                next_sweep_ms = interval.as_millis() as u64,
                "Expired keys removed"
            );
        } else {
            interval = (interval * 2).min(config.max_interval);
            trace!(next_sweep_ms = interval.as_millis() as u64, "Nothing to sweep");
        }
    }
}
