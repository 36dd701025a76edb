//! A TTL-bucketed store of which peers recently announced for which
//! info-hash.
//!
//! Peers are grouped into fixed-width time windows
//! ([`window`]); a peer is considered active while any of the last
//! `max_windows` windows still holds it. Two backends implement
//! [`PeerStore`]: [`local::LocalPeerStore`] keeps everything in-process
//! behind a sharded map, [`remote::RemotePeerStore`] delegates to an
//! out-of-process key-value backend (Redis in production) behind the
//! [`remote::RemoteBackend`] trait.
use async_trait::async_trait;
use kraken_clock::clock;
use kraken_primitives::info_hash::InfoHash;
use kraken_primitives::peer::PeerInfo;

pub mod bucket;
pub mod local;
pub mod remote;
pub mod window;

/// Working clock in production, fixed clock under test.
#[cfg(not(test))]
pub(crate) type CurrentClock = clock::Working;
#[cfg(test)]
pub(crate) type CurrentClock = clock::Stopped;

/// Shared read/write contract both peer-store backends implement.
#[async_trait]
pub trait PeerStore: Send + Sync {
    /// Records that `peer` is currently serving/downloading `info_hash`.
    async fn announce(&self, info_hash: InfoHash, peer: PeerInfo);

    /// Returns up to `limit` peers currently active for `info_hash`,
    /// merging duplicate peer ids across windows by OR-ing their
    /// `complete` bit: a peer that finished in an older window is still
    /// complete now, even if its newest announce didn't repeat the flag.
    async fn sample(&self, info_hash: InfoHash, limit: usize) -> Vec<PeerInfo>;

    /// Total number of distinct peers currently active for `info_hash`,
    /// across all active windows.
    async fn count(&self, info_hash: InfoHash) -> usize;
}

/// Merges per-window snapshots into one peer list, keeping the most
/// recently seen copy of each peer id but OR-ing `complete` across all of
/// its appearances.
#[must_use]
pub fn merge_windows(windows: Vec<Vec<PeerInfo>>) -> Vec<PeerInfo> {
    use std::collections::HashMap;

    let mut merged: HashMap<_, PeerInfo> = HashMap::new();

    for window in windows {
        for peer in window {
            merged
                .entry(peer.peer_id)
                .and_modify(|existing| {
                    existing.complete |= peer.complete;
                    existing.ip = peer.ip;
                    existing.port = peer.port;
                })
                .or_insert(peer);
        }
    }

    merged.into_values().collect()
}
