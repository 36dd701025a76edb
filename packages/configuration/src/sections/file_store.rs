//! `[file_store]` section: where the local file store keeps blobs and
//! their metadata.
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// How blob directories are laid out under `root_dir`.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `root_dir/<digest-hex>`.
    Flat,
    /// `root_dir/<shard-id>/<digest-hex>`, avoiding directories with huge
    /// fan-out on filesystems that degrade past a few thousand entries.
    Sharded,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct FileStore {
    #[serde(default = "FileStore::default_root_dir")]
    pub root_dir: Utf8PathBuf,

    #[serde(default = "FileStore::default_layout")]
    pub layout: Layout,

    /// Number of LRU-evictable bytes the store is allowed to keep. `None`
    /// disables LRU eviction entirely (refcounted-only store).
    #[serde(default)]
    pub lru_capacity_bytes: Option<u64>,
}

impl Default for FileStore {
    fn default() -> Self {
        Self {
            root_dir: Self::default_root_dir(),
            layout: Self::default_layout(),
            lru_capacity_bytes: None,
        }
    }
}

impl FileStore {
    fn default_root_dir() -> Utf8PathBuf {
        Utf8PathBuf::from("./storage/kraken/blobs")
    }

    fn default_layout() -> Layout {
        Layout::Sharded
    }
}
