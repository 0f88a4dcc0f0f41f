//! Periodic sweep scheduling.
//!
//! The limiter never schedules anything on its own: expired entries are
//! reclaimed by whoever owns the registry calling `sweep` explicitly. The
//! [`Sweeper`] is the stock owner for hosts that want a background cadence
//! with an explicit start and stop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::registry::Registry;

/// Handle to a background task sweeping a registry at a fixed period.
pub struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep task.
    ///
    /// The first pass runs one full period after the spawn. Dropping the
    /// handle without calling [`shutdown`](Self::shutdown) also stops the
    /// task at its next wakeup.
    pub fn spawn(registry: Arc<Registry>, period: Duration) -> Self {
        let (shutdown, mut signal) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // interval's first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => registry.sweep_all(),
                    _ = signal.changed() => break,
                }
            }
        });

        info!(period_secs = period.as_secs(), "Sweeper started");
        Self { shutdown, handle }
    }

    /// Stop the sweep task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
        info!("Sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_sweeper_reclaims_expired_entries() {
        let registry = Arc::new(Registry::from_config(&Config::default()).unwrap());

        // Anchored in the distant past, so expired on any real clock.
        registry.get("api").unwrap().check_at("client", 5);
        assert_eq!(registry.get("api").unwrap().tracked(), 1);

        let sweeper = Sweeper::spawn(Arc::clone(&registry), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(registry.get("api").unwrap().tracked(), 0);
        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_task_promptly() {
        let registry = Arc::new(Registry::from_config(&Config::default()).unwrap());
        let sweeper = Sweeper::spawn(registry, Duration::from_secs(3_600));

        let result = tokio::time::timeout(Duration::from_secs(1), sweeper.shutdown()).await;
        tokio_test::assert_ok!(result);
    }
}
