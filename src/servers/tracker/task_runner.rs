//! Deduplicates background refreshes: at most one in-flight refresh per
//! info-hash at a time. A refresh requested while one is already running is
//! simply dropped, not queued.
use std::future::Future;
use std::sync::Arc;

use dashmap::DashSet;
use kraken_primitives::info_hash::InfoHash;
use tracing::debug;

#[derive(Default)]
pub struct TaskRunner {
    in_flight: Arc<DashSet<InfoHash>>,
}

impl TaskRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` for `info_hash` unless a refresh for it is already
    /// running. Returns whether a new task was spawned.
    pub fn spawn_deduplicated<F>(&self, info_hash: InfoHash, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.in_flight.insert(info_hash) {
            debug!(%info_hash, "refresh already in flight, skipping");
            return false;
        }

        let in_flight = self.in_flight.clone();
        tokio::spawn(async move {
            task.await;
            in_flight.remove(&info_hash);
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn a_second_refresh_for_the_same_info_hash_is_deduplicated() {
        let runner = TaskRunner::new();
        let info_hash = InfoHash::from([1u8; kraken_primitives::info_hash::BYTE_LEN]);
        let calls = Arc::new(AtomicU32::new(0));

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let calls_clone = calls.clone();
        assert!(runner.spawn_deduplicated(info_hash, async move {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            let _ = rx.await;
        }));

        assert!(!runner.spawn_deduplicated(info_hash, async { unreachable!("deduplicated") }));

        let _ = tx.send(());
        tokio::task::yield_now().await;
    }
}
