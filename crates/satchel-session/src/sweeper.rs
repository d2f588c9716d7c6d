//! Background task that periodically sweeps idle sessions.

use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::MAX_CLEANER_INTERVAL;
use crate::registry::SessionRegistry;

/// Periodic expiry sweep over a [`SessionRegistry`].
///
/// ```rust,ignore
/// let registry = SessionRegistry::new(config);
/// let sweeper = Sweeper::new(registry.clone()).spawn();
/// // ...
/// sweeper.shutdown().await;
/// ```
pub struct Sweeper<K = String, V = serde_json::Value> {
    registry: SessionRegistry<K, V>,
    interval: Duration,
}

impl<K, V> Sweeper<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a sweeper using the registry's configured cleaner interval.
    pub fn new(registry: SessionRegistry<K, V>) -> Self {
        let interval = registry.config().cleaner_interval;
        Self { registry, interval }
    }

    /// Override the sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawn the sweep loop with its own cancellation token.
    pub fn spawn(self) -> SweeperHandle {
        self.spawn_with_token(CancellationToken::new())
    }

    /// Spawn the sweep loop, stopping when `token` is cancelled.
    ///
    /// Pass a child of a process-wide token to tie the sweeper to shutdown.
    /// Must be called from within a Tokio runtime.
    pub fn spawn_with_token(self, token: CancellationToken) -> SweeperHandle {
        // tokio's interval panics on a zero period
        let period = self
            .interval
            .clamp(Duration::from_millis(1), MAX_CLEANER_INTERVAL);
        let registry = self.registry;
        let cancel = token.clone();

        let handle = tokio::spawn(async move {
            let now = Instant::now();
            let mut ticker = interval_at(now.checked_add(period).unwrap_or(now), period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_ms = period.as_millis() as u64, "Session sweeper started");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = registry.sweep();
                        debug!(evicted, remaining = registry.count(), "Sweep tick");
                    }
                }
            }
            info!("Session sweeper stopped");
        });

        SweeperHandle { token, handle }
    }
}

/// Handle to a running [`Sweeper`] task.
#[derive(Debug)]
pub struct SweeperHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// The token that stops the sweeper.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the sweep task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the sweeper and wait for the task to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Session sweeper task did not exit cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn registry(max_lifetime: Duration) -> SessionRegistry {
        SessionRegistry::new(SessionConfig::new().with_max_lifetime(max_lifetime))
    }

    #[tokio::test]
    async fn test_sweeper_evicts_in_background() {
        let reg = registry(Duration::from_millis(20));
        reg.create("session-1").unwrap();

        let sweeper = Sweeper::new(reg.clone())
            .with_interval(Duration::from_millis(10))
            .spawn();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!reg.exists("session-1"));

        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_cancel() {
        let reg = registry(Duration::from_secs(60));
        let parent = CancellationToken::new();

        let sweeper = Sweeper::new(reg)
            .with_interval(Duration::from_millis(10))
            .spawn_with_token(parent.child_token());

        parent.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sweeper.is_finished());
    }

    #[tokio::test]
    async fn test_sweeper_survives_huge_interval() {
        let reg = registry(Duration::from_secs(60));

        let sweeper = Sweeper::new(reg).with_interval(Duration::MAX).spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!sweeper.is_finished());

        sweeper.token().cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sweeper.is_finished());
        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_keeps_active_sessions() {
        let reg = registry(Duration::from_secs(60));
        reg.create("session-1").unwrap();

        let sweeper = Sweeper::new(reg.clone())
            .with_interval(Duration::from_millis(10))
            .spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(reg.exists("session-1"));

        sweeper.shutdown().await;
        assert!(reg.exists("session-1"));
    }
}
