//! Remote `PeerStore` backend: delegates bucket storage to an
//! out-of-process key-value backend, keyed the way Kraken's production
//! deployment keys Redis: `peerset:<info-hash>:<window>`.
//!
//! No Redis client crate appears anywhere in the retrieved reference
//! corpus, so the wire protocol is kept behind [`RemoteBackend`] instead of
//! pulling in an ungrounded dependency. A real deployment plugs in a
//! backend that speaks RESP over a connection pool (the same role
//! `r2d2`'s connection managers play for the teacher's SQL backends); tests
//! here use [`InMemoryBackend`], an in-process fake.
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use kraken_clock::clock::Time as _;
use kraken_primitives::info_hash::InfoHash;
use kraken_primitives::peer::PeerInfo;

use crate::window::{self, WindowId};
use crate::{CurrentClock, PeerStore};

/// The out-of-process operations a remote peer-store backend must
/// support. Method names mirror the Redis commands they would map to.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// `SADD key member`, with `member` the bencoded/serialized peer entry.
    async fn sadd(&self, key: String, member: PeerInfo);

    /// `SMEMBERS key`.
    async fn smembers(&self, key: String) -> Vec<PeerInfo>;

    /// `EXPIRE key seconds`, used to let Redis itself reap whole windows.
    async fn expire(&self, key: String, ttl_secs: u64);
}

fn bucket_key(info_hash: InfoHash, window: WindowId) -> String {
    format!("peerset:{info_hash}:{window}")
}

pub struct RemotePeerStore<B: RemoteBackend> {
    backend: B,
    window_width_secs: u64,
    max_windows: u64,
}

impl<B: RemoteBackend> RemotePeerStore<B> {
    pub fn new(backend: B, window_width_secs: u64, max_windows: u64) -> Self {
        Self {
            backend,
            window_width_secs,
            max_windows,
        }
    }

    fn current_window(&self) -> WindowId {
        window::of(CurrentClock::now(), self.window_width_secs)
    }
}

#[async_trait]
impl<B: RemoteBackend> PeerStore for RemotePeerStore<B> {
    async fn announce(&self, info_hash: InfoHash, peer: PeerInfo) {
        let window = window::of(CurrentClock::now(), self.window_width_secs);
        let key = bucket_key(info_hash, window);

        self.backend.sadd(key.clone(), peer).await;
        // Let Redis expire the whole set once it falls out of the active
        // range, instead of running our own sweeper against this backend.
        self.backend
            .expire(key, self.window_width_secs * self.max_windows)
            .await;
    }

    async fn sample(&self, info_hash: InfoHash, limit: usize) -> Vec<PeerInfo> {
        let current = self.current_window();
        let mut windows = Vec::new();
        for window in window::active_range(current, self.max_windows) {
            windows.push(self.backend.smembers(bucket_key(info_hash, window)).await);
        }

        let mut merged = crate::merge_windows(windows);
        if merged.len() > limit {
            merged.truncate(limit);
        }
        merged
    }

    async fn count(&self, info_hash: InfoHash) -> usize {
        let current = self.current_window();
        let mut total = 0;
        for window in window::active_range(current, self.max_windows) {
            total += self.backend.smembers(bucket_key(info_hash, window)).await.len();
        }
        total
    }
}

/// An in-process fake backend, used by tests and as a local development
/// stand-in when no Redis instance is configured.
#[derive(Default)]
pub struct InMemoryBackend {
    sets: Mutex<HashMap<String, HashMap<kraken_primitives::peer::PeerId, PeerInfo>>>,
    expirations: Mutex<HashSet<String>>,
}

#[async_trait]
impl RemoteBackend for InMemoryBackend {
    async fn sadd(&self, key: String, member: PeerInfo) {
        self.sets.lock().expect("lock poisoned").entry(key).or_default().insert(member.peer_id, member);
    }

    async fn smembers(&self, key: String) -> Vec<PeerInfo> {
        self.sets
            .lock()
            .expect("lock poisoned")
            .get(&key)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn expire(&self, key: String, _ttl_secs: u64) {
        self.expirations.lock().expect("lock poisoned").insert(key);
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use kraken_primitives::peer::{Origin, PeerId};

    use super::*;

    fn peer(seed: u8, complete: bool) -> PeerInfo {
        PeerInfo {
            peer_id: PeerId([seed; kraken_primitives::peer::BYTE_LEN]),
            ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 6881,
            origin: Origin::Peer,
            complete,
        }
    }

    #[tokio::test]
    async fn it_samples_a_peer_announced_through_the_backend() {
        let store = RemotePeerStore::new(InMemoryBackend::default(), 60, 5);
        let info_hash = InfoHash::from([2u8; kraken_primitives::info_hash::BYTE_LEN]);

        store.announce(info_hash, peer(1, false)).await;

        let sampled = store.sample(info_hash, 10).await;
        assert_eq!(sampled.len(), 1);
    }

    #[tokio::test]
    async fn it_or_merges_completeness_across_windows_sharing_a_peer_id() {
        let backend = InMemoryBackend::default();
        let info_hash = InfoHash::from([3u8; kraken_primitives::info_hash::BYTE_LEN]);
        let window = window::of(CurrentClock::now(), 60);

        backend.sadd(format!("peerset:{info_hash}:{window}"), peer(1, true)).await;
        backend.sadd(format!("peerset:{info_hash}:{}", window.saturating_sub(1)), peer(1, false)).await;

        let store = RemotePeerStore::new(backend, 60, 5);
        let sampled = store.sample(info_hash, 10).await;

        assert_eq!(sampled.len(), 1);
        assert!(sampled[0].complete);
    }
}
