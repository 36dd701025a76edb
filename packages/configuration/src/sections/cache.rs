//! `[cache]` section: the in-memory blob cache's admission capacity.
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Cache {
    #[serde(default = "Cache::default_capacity_bytes")]
    pub capacity_bytes: u64,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            capacity_bytes: Self::default_capacity_bytes(),
        }
    }
}

impl Cache {
    fn default_capacity_bytes() -> u64 {
        256 * 1024 * 1024
    }
}
