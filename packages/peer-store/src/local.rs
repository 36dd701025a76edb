//! In-memory `PeerStore` backend: one [`Bucket`](crate::bucket::Bucket) per
//! `(info_hash, window)` pair in a sharded map, with background jobs that
//! expire old windows and sweep emptied buckets.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use kraken_clock::clock::Time as _;
use kraken_primitives::info_hash::InfoHash;
use kraken_primitives::peer::PeerInfo;
use rand::seq::SliceRandom as _;
use rand::SeedableRng as _;
use tracing::{debug, info};

use crate::bucket::Bucket;
use crate::window::{self, WindowId};
use crate::{CurrentClock, PeerStore};

type Key = (InfoHash, WindowId);

pub struct LocalPeerStore {
    buckets: DashMap<Key, Arc<Bucket>>,
    window_width_secs: u64,
    max_windows: u64,
    /// Bumped by [`Self::sweep`] so tests can assert a sweep ran without
    /// racing on wall-clock time.
    sweeps_run: AtomicU64,
}

impl LocalPeerStore {
    #[must_use]
    pub fn new(window_width_secs: u64, max_windows: u64) -> Self {
        Self {
            buckets: DashMap::new(),
            window_width_secs,
            max_windows,
            sweeps_run: AtomicU64::new(0),
        }
    }

    fn current_window(&self) -> WindowId {
        window::of(CurrentClock::now(), self.window_width_secs)
    }

    /// Removes buckets older than the active range, and any empty bucket
    /// within it. Marks each bucket deleted before removing it from the
    /// map, so a concurrent [`PeerStore::announce`] holding a cloned
    /// `Arc<Bucket>` observes the flag and retries instead of updating a
    /// bucket that is about to vanish.
    pub fn sweep(&self) {
        let current = self.current_window();
        let oldest_kept = window::active_range(current, self.max_windows)
            .into_iter()
            .next()
            .unwrap_or(current);

        let mut stale_keys = Vec::new();
        for entry in &self.buckets {
            let (_, window) = entry.key();
            if *window < oldest_kept || entry.value().is_empty() {
                stale_keys.push(*entry.key());
            }
        }

        for key in stale_keys {
            if let Some((_, bucket)) = self.buckets.remove(&key) {
                bucket.mark_deleted();
            }
        }

        self.sweeps_run.fetch_add(1, Ordering::Relaxed);
        debug!(window = current, "swept stale peer-store buckets");
    }

    #[must_use]
    pub fn sweeps_run(&self) -> u64 {
        self.sweeps_run.load(Ordering::Relaxed)
    }

    /// Spawns the background sweep ticker. Mirrors the tracker's other
    /// periodic jobs: a `tokio::select!` over `ctrl_c` and an interval,
    /// holding only a weak reference so the job exits once the store is
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let period = std::time::Duration::from_secs(self.window_width_secs.max(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("stopping peer-store sweep job");
                        break;
                    }
                    _ = interval.tick() => {
                        match weak.upgrade() {
                            Some(store) => store.sweep(),
                            None => break,
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl PeerStore for LocalPeerStore {
    async fn announce(&self, info_hash: InfoHash, peer: PeerInfo) {
        let now = CurrentClock::now();
        let window = window::of(now, self.window_width_secs);
        let key = (info_hash, window);

        loop {
            let bucket = {
                let mut entry = self.buckets.entry(key).or_insert_with(|| Arc::new(Bucket::new()));
                if entry.is_deleted() {
                    // The cleaner already marked this bucket deleted (it may
                    // not have removed it from the map yet); replace it with
                    // a fresh one rather than upserting into a dead bucket.
                    *entry = Arc::new(Bucket::new());
                }
                entry.clone()
            };

            if bucket.upsert(peer.clone(), now) {
                return;
            }
            // The cleaner deleted this bucket between our lookup and our
            // upsert; loop to get (or recreate) a live one.
        }
    }

    async fn sample(&self, info_hash: InfoHash, limit: usize) -> Vec<PeerInfo> {
        let current = self.current_window();
        let windows = window::active_range(current, self.max_windows);

        let snapshots: Vec<Vec<PeerInfo>> = windows
            .into_iter()
            .filter_map(|window| self.buckets.get(&(info_hash, window)))
            .map(|bucket| bucket.snapshot())
            .collect();

        let mut merged = crate::merge_windows(snapshots);
        if merged.len() > limit {
            let mut rng = rand::rngs::StdRng::from_entropy();
            merged.shuffle(&mut rng);
            merged.truncate(limit);
        }
        merged
    }

    async fn count(&self, info_hash: InfoHash) -> usize {
        let current = self.current_window();
        window::active_range(current, self.max_windows)
            .into_iter()
            .filter_map(|window| self.buckets.get(&(info_hash, window)))
            .map(|bucket| bucket.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use kraken_primitives::peer::{Origin, PeerId};

    use super::*;

    fn peer(seed: u8) -> PeerInfo {
        PeerInfo {
            peer_id: PeerId([seed; kraken_primitives::peer::BYTE_LEN]),
            ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 6881,
            origin: Origin::Peer,
            complete: false,
        }
    }

    fn sample_info_hash() -> InfoHash {
        InfoHash::from([1u8; kraken_primitives::info_hash::BYTE_LEN])
    }

    #[tokio::test]
    async fn it_returns_an_announced_peer_from_sample() {
        let store = LocalPeerStore::new(60, 5);
        let info_hash = sample_info_hash();

        store.announce(info_hash, peer(1)).await;
        let sampled = store.sample(info_hash, 10).await;

        assert_eq!(sampled.len(), 1);
        assert_eq!(sampled[0].peer_id, peer(1).peer_id);
    }

    #[tokio::test]
    async fn it_caps_the_sample_at_the_requested_limit() {
        let store = LocalPeerStore::new(60, 5);
        let info_hash = sample_info_hash();

        for seed in 0..20u8 {
            store.announce(info_hash, peer(seed)).await;
        }

        assert_eq!(store.sample(info_hash, 5).await.len(), 5);
        assert_eq!(store.count(info_hash).await, 20);
    }

    #[tokio::test]
    async fn sweep_drops_buckets_older_than_the_active_range() {
        let store = LocalPeerStore::new(60, 1);
        let info_hash = sample_info_hash();

        store.buckets.insert((info_hash, 0), Arc::new(Bucket::new()));
        store.buckets.get(&(info_hash, 0)).unwrap().upsert(peer(1), std::time::Duration::from_secs(0));

        store.sweep();

        assert_eq!(store.sweeps_run(), 1);
        assert_eq!(store.count(info_hash).await, 0);
    }

    #[tokio::test]
    async fn announce_recreates_a_bucket_marked_deleted_concurrently() {
        let store = LocalPeerStore::new(60, 5);
        let info_hash = sample_info_hash();
        let window = store.current_window();

        let bucket = Arc::new(Bucket::new());
        bucket.mark_deleted();
        store.buckets.insert((info_hash, window), bucket);

        store.announce(info_hash, peer(1)).await;

        assert_eq!(store.count(info_hash).await, 1);
    }
}
