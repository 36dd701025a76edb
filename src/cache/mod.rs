//! Bounded in-memory cache of blob entries, keyed by name, with an explicit
//! two-phase reserve/add admission protocol.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::warn;

struct Slot<T> {
    value: T,
    size: u64,
    inserted_at: Instant,
}

/// A bounded cache. `TryReserve` must succeed before `Add`; `Add` without a
/// matching reservation is a caller bug, not handled here (mirrors the
/// two-phase contract of the source system).
pub struct MemoryCache<T> {
    max_size: u64,
    total_size: AtomicU64,
    entries: RwLock<HashMap<String, Slot<T>>>,
}

impl<T: Clone> MemoryCache<T> {
    #[must_use]
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            total_size: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Atomically bumps the reserved-size counter if `size` fits under
    /// `max_size`. Returns `false` without reserving if it would not fit.
    pub fn try_reserve(&self, size: u64) -> bool {
        let mut current = self.total_size.load(Ordering::Acquire);
        loop {
            if current.saturating_add(size) > self.max_size {
                return false;
            }
            match self
                .total_size
                .compare_exchange_weak(current, current + size, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Undoes a reservation the caller is abandoning. Releasing more than
    /// is reserved is logged and clamped to zero rather than panicking or
    /// underflowing.
    pub fn release_reservation(&self, size: u64) {
        let mut current = self.total_size.load(Ordering::Acquire);
        loop {
            let next = current.saturating_sub(size);
            if next == 0 && size > current {
                warn!(size, total_size = current, "release_reservation clamped: releasing more than reserved");
            }
            match self
                .total_size
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn add(&self, name: impl Into<String>, value: T, size: u64) {
        self.entries.write().insert(
            name.into(),
            Slot {
                value,
                size,
                inserted_at: Instant::now(),
            },
        );
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<T> {
        self.entries.read().get(name).map(|slot| slot.value.clone())
    }

    /// A no-op if `name` is absent. Releases the entry's reserved size.
    pub fn remove(&self, name: &str) {
        if let Some(slot) = self.entries.write().remove(name) {
            self.release_reservation(slot.size);
        }
    }

    /// Names older than `ttl` as of `now`. Takes only a read lock, so
    /// concurrent `get`/`add` calls are not blocked while this runs.
    #[must_use]
    pub fn get_expired_entries(&self, now: Instant, ttl: Duration) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .filter(|(_, slot)| now.saturating_duration_since(slot.inserted_at) >= ttl)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Removes every name in `names` under a single write-lock acquisition.
    pub fn remove_batch(&self, names: &[String]) {
        let mut freed = 0u64;
        {
            let mut entries = self.entries.write();
            for name in names {
                if let Some(slot) = entries.remove(name) {
                    freed += slot.size;
                }
            }
        }
        self.release_reservation(freed);
    }

    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.total_size.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use super::*;

    #[test]
    fn reserve_then_add_then_get_round_trips_a_value() {
        let cache: MemoryCache<String> = MemoryCache::new(100);
        assert!(cache.try_reserve(10));
        cache.add("blob-a", "hello".to_owned(), 10);
        assert_eq!(cache.get("blob-a"), Some("hello".to_owned()));
    }

    #[test]
    fn try_reserve_refuses_past_capacity() {
        let cache: MemoryCache<()> = MemoryCache::new(10);
        assert!(cache.try_reserve(10));
        assert!(!cache.try_reserve(1));
    }

    #[test]
    fn release_reservation_is_clamped_not_negative() {
        let cache: MemoryCache<()> = MemoryCache::new(10);
        cache.try_reserve(5);
        cache.release_reservation(100);
        assert_eq!(cache.total_size(), 0);
    }

    #[test]
    fn remove_is_a_no_op_for_an_absent_name() {
        let cache: MemoryCache<()> = MemoryCache::new(10);
        cache.remove("does-not-exist");
        assert_eq!(cache.total_size(), 0);
    }

    #[test]
    fn get_expired_entries_finds_only_stale_names() {
        let cache: MemoryCache<()> = MemoryCache::new(10);
        cache.try_reserve(1);
        cache.add("old", (), 1);
        sleep(Duration::from_millis(5));
        let cutoff = Instant::now();

        cache.try_reserve(1);
        cache.add("new", (), 1);

        let expired = cache.get_expired_entries(cutoff, Duration::from_millis(1));
        assert_eq!(expired, vec!["old".to_owned()]);
    }
}
