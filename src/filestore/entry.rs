//! An in-memory entry tracking one blob's on-disk state.
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use parking_lot::RwLock;

use super::state::State;

/// One name's worth of file-store bookkeeping.
///
/// `deleted` is set by the store when the entry is removed from the map.
/// A caller holding a cloned `Arc<Entry>` across the map-lock boundary must
/// check this flag both before and after taking `state` to detect that it
/// is holding a ghost no longer reachable from the map, and retry.
pub struct Entry {
    deleted: AtomicBool,
    state: RwLock<State>,
    refcount: AtomicI64,
}

impl Entry {
    #[must_use]
    pub fn new(state: State) -> Self {
        Self {
            deleted: AtomicBool::new(false),
            state: RwLock::new(state),
            refcount: AtomicI64::new(0),
        }
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    pub fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn state(&self) -> State {
        *self.state.read()
    }

    pub fn set_state(&self, state: State) {
        *self.state.write() = state;
    }

    #[must_use]
    pub fn refcount(&self) -> i64 {
        self.refcount.load(Ordering::Acquire)
    }

    pub fn inc_ref(&self) -> i64 {
        self.refcount.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the refcount; returns an error instead of going negative.
    pub fn dec_ref(&self) -> Result<i64, NegativeRefCount> {
        let mut current = self.refcount.load(Ordering::Acquire);
        loop {
            if current <= 0 {
                return Err(NegativeRefCount);
            }
            match self
                .refcount
                .compare_exchange_weak(current, current - 1, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Ok(current - 1),
                Err(observed) => current = observed,
            }
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error("reference count would go negative")]
pub struct NegativeRefCount;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dec_ref_refuses_to_go_negative() {
        let entry = Entry::new(State::Cache);
        assert!(entry.dec_ref().is_err());
        entry.inc_ref();
        assert_eq!(entry.dec_ref().unwrap(), 0);
    }

    #[test]
    fn state_can_be_read_and_updated() {
        let entry = Entry::new(State::Upload);
        assert_eq!(entry.state(), State::Upload);
        entry.set_state(State::Cache);
        assert_eq!(entry.state(), State::Cache);
    }
}
