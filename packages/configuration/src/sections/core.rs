//! `[core]` section: identity labels this node presents to peers and
//! trackers, and the process-wide log level.
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Core {
    /// Log level passed to the tracing subscriber filter, e.g. `"info"`.
    #[serde(default = "Core::default_log_level")]
    pub log_level: String,

    /// Availability zone this node runs in, used by the handout policy's
    /// `ipv4netmask`/locality-aware strategies.
    #[serde(default = "Core::default_zone")]
    pub zone: String,

    /// Cluster label this node belongs to.
    #[serde(default = "Core::default_cluster")]
    pub cluster: String,
}

impl Default for Core {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            zone: Self::default_zone(),
            cluster: Self::default_cluster(),
        }
    }
}

impl Core {
    fn default_log_level() -> String {
        "info".to_owned()
    }

    fn default_zone() -> String {
        "zone-default".to_owned()
    }

    fn default_cluster() -> String {
        "cluster-default".to_owned()
    }
}
