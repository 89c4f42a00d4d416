//! Periodic eviction of old staged files.
//!
//! Off unless `staging.retention_secs` is set.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::StagingConfig;
use crate::observability::metrics;
use crate::staging::store::StagingArea;

pub struct RetentionSweeper {
    staging: Arc<StagingArea>,
    max_age: Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(staging: Arc<StagingArea>, max_age: Duration, interval: Duration) -> Self {
        Self {
            staging,
            max_age,
            interval,
        }
    }

    /// Build a sweeper when retention is configured.
    pub fn from_config(staging: Arc<StagingArea>, config: &StagingConfig) -> Option<Self> {
        let max_age = Duration::from_secs(config.retention_secs?);
        Some(Self::new(
            staging,
            max_age,
            Duration::from_secs(config.sweep_interval_secs),
        ))
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            directory = %self.staging.root().display(),
            max_age_secs = self.max_age.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Retention sweeper starting"
        );

        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Retention sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one eviction pass. Returns the number of files removed.
    pub async fn sweep(&self) -> usize {
        match self.staging.evict_older_than(self.max_age).await {
            Ok(0) => 0,
            Ok(count) => {
                tracing::info!(evicted = count, "Evicted expired staged files");
                metrics::record_evictions(count);
                count
            }
            Err(e) => {
                tracing::error!(error = %e, "Retention sweep failed");
                0
            }
        }
    }
}
