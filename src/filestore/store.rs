//! The local file store: an in-memory `name → entry` map layered over a
//! filesystem layout of state directories.
use std::fs::File;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use dashmap::DashMap;
use tracing::{debug, warn};

use super::entry::Entry;
use super::fileop::FileOp;
use super::metadata::{self, MetadataKind};
use super::state::{Layout, State};
use crate::error::Error;

pub struct LocalFileStore {
    root_dir: Utf8PathBuf,
    layout: Layout,
    lru_capacity_bytes: Option<u64>,
    entries: DashMap<String, Arc<Entry>>,
    bytes_in_cache: AtomicU64,
    access_order: parking_lot::Mutex<Vec<String>>,
}

impl LocalFileStore {
    #[must_use]
    pub fn new(root_dir: Utf8PathBuf, layout: Layout, lru_capacity_bytes: Option<u64>) -> Self {
        Self {
            root_dir,
            layout,
            lru_capacity_bytes,
            entries: DashMap::new(),
            bytes_in_cache: AtomicU64::new(0),
            access_order: parking_lot::Mutex::new(Vec::new()),
        }
    }

    fn data_path(&self, state: State, name: &str) -> Utf8PathBuf {
        self.root_dir.join(state.dir_name()).join(self.layout.relative_path(name))
    }

    /// Finds or re-materializes the entry for `name` among `op`'s accepted
    /// states. Returns not-found if the name is absent from memory and
    /// from every accepted state's directory.
    fn resolve(&self, name: &str, op: &FileOp) -> Result<Arc<Entry>, Error> {
        loop {
            if let Some(existing) = self.entries.get(name) {
                if !existing.is_deleted() {
                    if !op.accepts(existing.state()) {
                        return Err(state_error(name, existing.state(), op));
                    }
                    return Ok(existing.clone());
                }
            }

            // Not resident (or a ghost): probe each acceptable state's directory.
            let found_state = op
                .accepted_states()
                .into_iter()
                .find(|state| self.data_path(*state, name).exists());

            let Some(state) = found_state else {
                return Err(Error::NotFound {
                    digest: kraken_primitives::digest::Digest::parse(name).unwrap_or_else(|_| kraken_primitives::digest::Digest::of_bytes(name.as_bytes())),
                    location: std::panic::Location::caller(),
                });
            };

            let entry = Arc::new(Entry::new(state));
            let mut slot = self.entries.entry(name.to_owned()).or_insert_with(|| entry.clone());
            if slot.is_deleted() {
                *slot = entry;
            }
            let resolved = slot.clone();
            drop(slot);

            if resolved.is_deleted() {
                continue;
            }
            return Ok(resolved);
        }
    }

    /// Creates (or reopens, if already present) `name` in `initial_state`.
    pub fn create(&self, name: &str, initial_state: State) -> Result<(), Error> {
        let path = self.data_path(initial_state, name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        File::create(&path).map_err(io_err)?;
        self.entries.insert(name.to_owned(), Arc::new(Entry::new(initial_state)));
        Ok(())
    }

    pub fn stat(&self, name: &str, op: &FileOp) -> Result<State, Error> {
        Ok(self.resolve(name, op)?.state())
    }

    pub fn open_reader(&self, name: &str, op: &FileOp) -> Result<File, Error> {
        let entry = self.resolve(name, op)?;
        self.touch(name);
        File::open(self.data_path(entry.state(), name)).map_err(io_err)
    }

    pub fn open_writer(&self, name: &str, op: &FileOp) -> Result<File, Error> {
        let entry = self.resolve(name, op)?;
        std::fs::OpenOptions::new()
            .write(true)
            .open(self.data_path(entry.state(), name))
            .map_err(io_err)
    }

    /// Moves `name` from its current (accepted) state to `to`.
    ///
    /// Not atomic against a crash between steps; re-probe on reload always
    /// finds the entry in exactly one state.
    pub fn move_to(&self, name: &str, op: &FileOp, to: State) -> Result<(), Error> {
        let entry = self.resolve(name, op)?;
        let from = entry.state();
        if from == to {
            return Ok(());
        }

        let from_path = self.data_path(from, name);
        let to_path = self.data_path(to, name);
        if let Some(parent) = to_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        for kind in metadata::KNOWN_SUFFIXES {
            metadata::hardlink_if_present(&from_path, &to_path, *kind).map_err(io_err)?;
        }
        std::fs::rename(&from_path, &to_path).map_err(io_err)?;
        for kind in metadata::KNOWN_SUFFIXES {
            let _ = metadata::delete(&from_path, *kind);
        }

        entry.set_state(to);
        debug!(name, from = %from, to = %to, "moved file store entry");

        if to == State::Cache {
            self.reserve_for_lru(name)?;
        }
        Ok(())
    }

    /// Removes the data file, then all metadata (best-effort), then the
    /// in-memory entry. Fails if the caller still holds references.
    pub fn delete(&self, name: &str, op: &FileOp) -> Result<(), Error> {
        let entry = self.resolve(name, op)?;
        if entry.refcount() > 0 {
            return Err(Error::RefCountError {
                digest: digest_of(name),
                location: std::panic::Location::caller(),
            });
        }

        let path = self.data_path(entry.state(), name);
        std::fs::remove_file(&path).map_err(io_err)?;
        for kind in metadata::KNOWN_SUFFIXES {
            let _ = metadata::delete(&path, *kind);
        }

        entry.mark_deleted();
        self.entries.remove(name);
        self.forget_in_lru(name);
        Ok(())
    }

    pub fn inc_ref(&self, name: &str, op: &FileOp) -> Result<i64, Error> {
        let entry = self.resolve(name, op)?;
        Ok(entry.inc_ref())
    }

    pub fn dec_ref(&self, name: &str, op: &FileOp) -> Result<i64, Error> {
        let entry = self.resolve(name, op)?;
        entry.dec_ref().map_err(|_| Error::RefCountError {
            digest: digest_of(name),
            location: std::panic::Location::caller(),
        })
    }

    pub fn get_ref_count(&self, name: &str, op: &FileOp) -> Result<i64, Error> {
        Ok(self.resolve(name, op)?.refcount())
    }

    pub fn read_metadata(&self, name: &str, op: &FileOp, kind: MetadataKind) -> Result<Option<Vec<u8>>, Error> {
        let entry = self.resolve(name, op)?;
        metadata::read(&self.data_path(entry.state(), name), kind).map_err(io_err)
    }

    /// Compare-and-write; returns whether the contents actually changed.
    pub fn write_metadata(&self, name: &str, op: &FileOp, kind: MetadataKind, contents: &[u8]) -> Result<bool, Error> {
        let entry = self.resolve(name, op)?;
        metadata::write(&self.data_path(entry.state(), name), kind, contents).map_err(io_err)
    }

    pub fn get_or_set_metadata(&self, name: &str, op: &FileOp, kind: MetadataKind, default: &[u8]) -> Result<Vec<u8>, Error> {
        let entry = self.resolve(name, op)?;
        let path = self.data_path(entry.state(), name);
        if let Some(existing) = metadata::read(&path, kind).map_err(io_err)? {
            return Ok(existing);
        }
        metadata::write(&path, kind, default).map_err(io_err)?;
        Ok(default.to_vec())
    }

    pub fn delete_metadata(&self, name: &str, op: &FileOp, kind: MetadataKind) -> Result<(), Error> {
        let entry = self.resolve(name, op)?;
        metadata::delete(&self.data_path(entry.state(), name), kind).map_err(io_err)
    }

    /// Resident entries whose accepted state falls in `op`, in no
    /// particular order; a best-effort listing used by batch callers.
    #[must_use]
    pub fn range(&self, op: &FileOp) -> Vec<String> {
        self.entries
            .iter()
            .filter(|kv| !kv.value().is_deleted() && op.accepts(kv.value().state()))
            .map(|kv| kv.key().clone())
            .collect()
    }

    fn touch(&self, name: &str) {
        if self.lru_capacity_bytes.is_none() {
            return;
        }
        let mut order = self.access_order.lock();
        order.retain(|n| n != name);
        order.push(name.to_owned());
    }

    fn forget_in_lru(&self, name: &str) {
        let mut order = self.access_order.lock();
        order.retain(|n| n != name);
    }

    /// On admission into `Cache`, evicts least-recently-used entries until
    /// the configured byte capacity is respected. Entries with a nonzero
    /// refcount are skipped, same as a direct `delete` would refuse them.
    fn reserve_for_lru(&self, name: &str) -> Result<(), Error> {
        let Some(capacity) = self.lru_capacity_bytes else {
            return Ok(());
        };

        let size = self
            .data_path(State::Cache, name)
            .metadata()
            .map(|m| m.len())
            .unwrap_or(0);
        self.bytes_in_cache.fetch_add(size, Ordering::AcqRel);
        self.touch(name);

        while self.bytes_in_cache.load(Ordering::Acquire) > capacity {
            let victim = {
                let mut order = self.access_order.lock();
                order.iter().position(|n| n != name).map(|idx| order.remove(idx))
            };
            let Some(victim) = victim else { break };

            let op = FileOp::accepting([State::Cache]);
            if self.get_ref_count(&victim, &op).unwrap_or(1) > 0 {
                warn!(victim, "skipping lru eviction of referenced entry");
                continue;
            }

            let victim_size = self.data_path(State::Cache, &victim).metadata().map(|m| m.len()).unwrap_or(0);
            if self.delete(&victim, &op).is_ok() {
                self.bytes_in_cache.fetch_sub(victim_size, Ordering::AcqRel);
                debug!(victim, "evicted lru entry from cache");
            }
        }
        Ok(())
    }
}

fn state_error(name: &str, current: State, op: &FileOp) -> Error {
    Error::StateError {
        digest: digest_of(name),
        reason: format!("entry is in state {current}, accepted states are {:?}", op.accepted_states()),
        location: std::panic::Location::caller(),
    }
}

fn digest_of(name: &str) -> kraken_primitives::digest::Digest {
    kraken_primitives::digest::Digest::parse(name).unwrap_or_else(|_| kraken_primitives::digest::Digest::of_bytes(name.as_bytes()))
}

fn io_err(source: std::io::Error) -> Error {
    Error::Integrity {
        digest: kraken_primitives::digest::Digest::of_bytes(source.to_string().as_bytes()),
        reason: source.to_string(),
        location: std::panic::Location::caller(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(lru_capacity_bytes: Option<u64>) -> LocalFileStore {
        let dir = std::env::temp_dir().join(format!("kraken-filestore-test-{}", kraken_test_helpers::random::string(12)));
        let root = Utf8PathBuf::from_path_buf(dir).unwrap();
        std::fs::create_dir_all(&root).unwrap();
        LocalFileStore::new(root, Layout::Flat, lru_capacity_bytes)
    }

    #[test]
    fn create_then_stat_reports_the_initial_state() {
        let store = temp_store(None);
        store.create("blob-a", State::Upload).unwrap();
        let op = FileOp::accepting([State::Upload]);
        assert_eq!(store.stat("blob-a", &op).unwrap(), State::Upload);
    }

    #[test]
    fn stat_rejects_a_state_outside_the_fileops_accepted_set() {
        let store = temp_store(None);
        store.create("blob-a", State::Upload).unwrap();
        let op = FileOp::accepting([State::Cache]);
        assert!(matches!(store.stat("blob-a", &op), Err(Error::StateError { .. })));
    }

    #[test]
    fn stat_on_an_unknown_name_is_not_found() {
        let store = temp_store(None);
        let op = FileOp::accepting([State::Upload]);
        assert!(matches!(store.stat("does-not-exist", &op), Err(Error::NotFound { .. })));
    }

    #[test]
    fn move_to_relocates_the_data_file_and_updates_state() {
        let store = temp_store(None);
        store.create("blob-a", State::Upload).unwrap();
        let op = FileOp::accepting([State::Upload]);
        store.move_to("blob-a", &op, State::Cache).unwrap();

        let op = FileOp::accepting([State::Cache]);
        assert_eq!(store.stat("blob-a", &op).unwrap(), State::Cache);
    }

    #[test]
    fn delete_refuses_while_refcount_is_positive() {
        let store = temp_store(None);
        store.create("blob-a", State::Cache).unwrap();
        let op = FileOp::accepting([State::Cache]);
        store.inc_ref("blob-a", &op).unwrap();
        assert!(matches!(store.delete("blob-a", &op), Err(Error::RefCountError { .. })));
        store.dec_ref("blob-a", &op).unwrap();
        store.delete("blob-a", &op).unwrap();
    }

    #[test]
    fn metadata_write_is_compare_and_swap() {
        let store = temp_store(None);
        store.create("blob-a", State::Cache).unwrap();
        let op = FileOp::accepting([State::Cache]);
        assert!(store.write_metadata("blob-a", &op, metadata::REFCOUNT, b"1").unwrap());
        assert!(!store.write_metadata("blob-a", &op, metadata::REFCOUNT, b"1").unwrap());
    }

    #[test]
    fn reload_probes_accepted_state_directories_when_not_resident() {
        let store = temp_store(None);
        store.create("blob-a", State::Cache).unwrap();
        store.entries.remove("blob-a");

        let op = FileOp::accepting([State::Upload, State::Cache]);
        assert_eq!(store.stat("blob-a", &op).unwrap(), State::Cache);
    }
}
