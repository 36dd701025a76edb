//! The origin store: an external collaborator that knows which peers hold
//! the origin copy of a blob. Results are cached per-digest for a short TTL
//! so a burst of announces for the same info-hash does not hammer it.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use kraken_primitives::info_hash::InfoHash;
use kraken_primitives::peer::PeerInfo;
use parking_lot::Mutex;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OriginStore: Send + Sync {
    async fn origin_peers(&self, info_hash: InfoHash) -> Vec<PeerInfo>;
}

struct CacheEntry {
    peers: Vec<PeerInfo>,
    fetched_at: Instant,
}

/// Wraps an [`OriginStore`] with a short per-digest TTL cache.
pub struct CachedOriginStore<S> {
    inner: S,
    ttl: Duration,
    cache: Mutex<HashMap<InfoHash, CacheEntry>>,
}

impl<S: OriginStore> CachedOriginStore<S> {
    #[must_use]
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn origin_peers(&self, info_hash: InfoHash) -> Vec<PeerInfo> {
        if let Some(entry) = self.cache.lock().get(&info_hash) {
            if entry.fetched_at.elapsed() < self.ttl {
                return entry.peers.clone();
            }
        }

        let peers = self.inner.origin_peers(info_hash).await;
        self.cache.lock().insert(
            info_hash,
            CacheEntry {
                peers: peers.clone(),
                fetched_at: Instant::now(),
            },
        );
        peers
    }
}
