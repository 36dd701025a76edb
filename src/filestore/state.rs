//! Blob lifecycle states and the directory layout that stores them.
use std::fmt;
use std::str::FromStr;

use kraken_primitives::digest::Digest;

/// Where a blob currently lives on disk.
///
/// `Upload` holds partially-written blobs; `Cache` holds complete,
/// servable blobs; `Trash` holds blobs awaiting best-effort deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Upload,
    Cache,
    Trash,
}

impl State {
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            State::Upload => "upload",
            State::Cache => "cache",
            State::Trash => "trash",
        }
    }

    pub const ALL: [State; 3] = [State::Upload, State::Cache, State::Trash];
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error("\"{0}\" is not a recognized file store state")]
pub struct ParseStateError(&'static str);

impl FromStr for State {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(State::Upload),
            "cache" => Ok(State::Cache),
            "trash" => Ok(State::Trash),
            _ => Err(ParseStateError("unknown")),
        }
    }
}

/// Layout strategy for a blob's directory within a state directory.
#[derive(Debug, Clone, Copy)]
pub enum Layout {
    Flat,
    Sharded,
}

impl From<kraken_configuration::sections::file_store::Layout> for Layout {
    fn from(value: kraken_configuration::sections::file_store::Layout) -> Self {
        match value {
            kraken_configuration::sections::file_store::Layout::Flat => Layout::Flat,
            kraken_configuration::sections::file_store::Layout::Sharded => Layout::Sharded,
        }
    }
}

impl Layout {
    /// Relative path (from the state directory) to `name`'s data file.
    #[must_use]
    pub fn relative_path(self, name: &str) -> String {
        match self {
            Layout::Flat => name.to_owned(),
            Layout::Sharded => {
                let shard = Digest::parse(name).map_or_else(|_| "00".to_owned(), |d| d.shard_id().to_owned());
                format!("{shard}/{name}")
            }
        }
    }
}
