//! Periodic eviction of expired sessions.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::observability::metrics;
use crate::session::store::MemorySessionStore;

pub struct SessionSweeper {
    store: MemorySessionStore,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(store: MemorySessionStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Session sweeper starting");

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one eviction pass; returns the number of sessions dropped.
    pub fn sweep(&self) -> usize {
        let evicted = self.store.purge_expired(OffsetDateTime::now_utc());
        let remaining = self.store.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining, "Expired sessions evicted");
        }
        metrics::record_active_sessions(remaining);
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tower_sessions::session::{Id, Record};
    use tower_sessions::session_store::SessionStore;

    fn record(expires_in: time::Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_sweep_drops_only_expired() {
        let store = MemorySessionStore::new();
        store.save(&record(time::Duration::seconds(-1))).await.unwrap();
        store.save(&record(time::Duration::hours(1))).await.unwrap();

        let sweeper = SessionSweeper::new(store.clone(), Duration::from_secs(60));
        assert_eq!(sweeper.sweep(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let sweeper = SessionSweeper::new(MemorySessionStore::new(), Duration::from_secs(3600));
        let (tx, rx) = broadcast::channel(1);

        let task = tokio::spawn(sweeper.run(rx));
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }
}
