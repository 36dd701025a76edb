//! `[metainfo_client]` section: the polling ring and backoff schedule used
//! to fetch a `MetaInfo` descriptor from the origin/tracker ring.
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct MetainfoClient {
    /// Addresses polled round-robin; failover moves to the next address on
    /// a network error.
    #[serde(default)]
    pub ring_addrs: Vec<Url>,

    /// Initial backoff delay, in milliseconds.
    #[serde(default = "MetainfoClient::default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    /// Multiplier applied to the backoff delay after each retry.
    #[serde(default = "MetainfoClient::default_backoff_multiplier_permille")]
    pub backoff_multiplier_permille: u64,

    /// Backoff delay cap, in milliseconds.
    #[serde(default = "MetainfoClient::default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Total time budget for one poll, in milliseconds, before giving up.
    #[serde(default = "MetainfoClient::default_poll_budget_ms")]
    pub poll_budget_ms: u64,

    /// Jitter applied to each backoff delay, as a fraction in permille.
    #[serde(default = "MetainfoClient::default_jitter_permille")]
    pub jitter_permille: u64,

    /// Number of ring addresses consulted for a given digest's `Locations`.
    #[serde(default = "MetainfoClient::default_replication_factor")]
    pub replication_factor: usize,
}

impl Default for MetainfoClient {
    fn default() -> Self {
        Self {
            ring_addrs: Vec::new(),
            backoff_initial_ms: Self::default_backoff_initial_ms(),
            backoff_multiplier_permille: Self::default_backoff_multiplier_permille(),
            backoff_max_ms: Self::default_backoff_max_ms(),
            poll_budget_ms: Self::default_poll_budget_ms(),
            jitter_permille: Self::default_jitter_permille(),
            replication_factor: Self::default_replication_factor(),
        }
    }
}

impl MetainfoClient {
    fn default_backoff_initial_ms() -> u64 {
        1_000
    }

    fn default_backoff_multiplier_permille() -> u64 {
        1_300
    }

    fn default_backoff_max_ms() -> u64 {
        5_000
    }

    fn default_poll_budget_ms() -> u64 {
        15 * 60 * 1_000
    }

    fn default_jitter_permille() -> u64 {
        50
    }

    fn default_replication_factor() -> usize {
        3
    }
}
