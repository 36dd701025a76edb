//! `[tracker]` section: the announce/tracker HTTP server.
use serde::{Deserialize, Serialize};

use crate::sections::tls::Tls;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Tracker {
    #[serde(default = "Tracker::default_bind_address")]
    pub bind_address: String,

    /// Suggested interval, in seconds, between a peer's announce calls.
    #[serde(default = "Tracker::default_announce_interval_secs")]
    pub announce_interval_secs: u32,

    #[serde(default)]
    pub tls: Option<Tls>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            bind_address: Self::default_bind_address(),
            announce_interval_secs: Self::default_announce_interval_secs(),
            tls: None,
        }
    }
}

impl Tracker {
    fn default_bind_address() -> String {
        "0.0.0.0:7070".to_owned()
    }

    fn default_announce_interval_secs() -> u32 {
        60
    }
}
