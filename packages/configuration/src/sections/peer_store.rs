//! `[peer_store]` section: TTL-bucketed window sizing, and the optional
//! Redis backend.
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct PeerStore {
    /// Width, in seconds, of each active-peer time bucket.
    #[serde(default = "PeerStore::default_window_width_secs")]
    pub window_width_secs: u64,

    /// Maximum number of windows kept active at once; older windows expire.
    #[serde(default = "PeerStore::default_max_windows")]
    pub max_windows: u64,

    /// When set, peers are tracked in Redis instead of in-memory, keyed
    /// `peerset:<info-hash>:<floor(now/window_width_secs)>`.
    #[serde(default)]
    pub redis_addr: Option<String>,
}

impl Default for PeerStore {
    fn default() -> Self {
        Self {
            window_width_secs: Self::default_window_width_secs(),
            max_windows: Self::default_max_windows(),
            redis_addr: None,
        }
    }
}

impl PeerStore {
    fn default_window_width_secs() -> u64 {
        60
    }

    fn default_max_windows() -> u64 {
        5
    }
}
