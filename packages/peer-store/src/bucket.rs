//! A `Bucket` holds the peers that announced for one info-hash during one
//! time window.
//!
//! It carries its own `deleted` flag so the owning map's entry lock can be
//! released before a caller acquires the bucket lock: the background
//! cleaner marks a bucket deleted and removes it from the map under its own
//! short-lived map-entry lock, while a concurrent announce that already
//! holds a clone of the `Arc<Bucket>` either wins the race (bucket not yet
//! marked) or observes `deleted` and retries against a freshly (re)inserted
//! bucket instead of silently updating a bucket nobody can see anymore.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use kraken_primitives::peer::PeerId;
use kraken_primitives::{peer::PeerInfo, DurationSinceUnixEpoch};

struct Record {
    info: PeerInfo,
    updated: DurationSinceUnixEpoch,
}

#[derive(Default)]
pub struct Bucket {
    deleted: AtomicBool,
    peers: Mutex<HashMap<PeerId, Record>>,
}

impl Bucket {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes a peer. Returns `false` if this bucket has
    /// already been marked deleted by the cleaner; the caller should
    /// retry against a fresh bucket.
    pub fn upsert(&self, peer: PeerInfo, now: DurationSinceUnixEpoch) -> bool {
        if self.deleted.load(Ordering::Acquire) {
            return false;
        }

        let mut peers = self.peers.lock().expect("bucket mutex poisoned");

        // Re-check after acquiring the lock: the cleaner marks `deleted`
        // before removing the map entry, but does so without holding this
        // lock, so the flag can flip between the check above and here.
        if self.deleted.load(Ordering::Acquire) {
            return false;
        }

        peers.insert(peer.peer_id, Record { info: peer, updated: now });
        true
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    /// Marks this bucket deleted, returning its peers so the caller can
    /// decide what, if anything, to do with them (bucket contents are
    /// simply expired here, not migrated).
    pub fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.lock().expect("bucket mutex poisoned").is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<PeerInfo> {
        self.peers
            .lock()
            .expect("bucket mutex poisoned")
            .values()
            .map(|record| record.info.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.lock().expect("bucket mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use kraken_primitives::peer::Origin;

    use super::*;

    fn sample_peer(id_seed: u8) -> PeerInfo {
        PeerInfo {
            peer_id: PeerId([id_seed; kraken_primitives::peer::BYTE_LEN]),
            ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 6881,
            origin: Origin::Peer,
            complete: false,
        }
    }

    #[test]
    fn it_upserts_and_snapshots_peers() {
        let bucket = Bucket::new();
        assert!(bucket.upsert(sample_peer(1), Duration::from_secs(1)));
        assert_eq!(bucket.len(), 1);
        assert!(bucket.upsert(sample_peer(1), Duration::from_secs(2)));
        assert_eq!(bucket.len(), 1, "re-announcing the same peer updates in place");
    }

    #[test]
    fn it_refuses_inserts_after_being_marked_deleted() {
        let bucket = Bucket::new();
        bucket.mark_deleted();
        assert!(!bucket.upsert(sample_peer(1), Duration::from_secs(1)));
    }
}
