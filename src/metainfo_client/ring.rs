//! A passive ring of tracker/origin addresses with round-robin iteration
//! and deterministic, digest-keyed location selection.
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use kraken_primitives::digest::Digest;
use url::Url;

struct Member {
    addr: Url,
    failed: AtomicBool,
}

/// Addresses polled round-robin; a network error marks an address failed so
/// the ring temporarily routes around it without removing it permanently.
pub struct Ring {
    members: Vec<Member>,
    cursor: AtomicUsize,
}

impl Ring {
    #[must_use]
    pub fn new(addrs: Vec<Url>) -> Self {
        Self {
            members: addrs.into_iter().map(|addr| Member { addr, failed: AtomicBool::new(false) }).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn mark_failed(&self, addr: &Url) {
        if let Some(member) = self.members.iter().find(|m| &m.addr == addr) {
            member.failed.store(true, Ordering::Release);
        }
    }

    pub fn mark_healthy(&self, addr: &Url) {
        if let Some(member) = self.members.iter().find(|m| &m.addr == addr) {
            member.failed.store(false, Ordering::Release);
        }
    }

    /// A deterministic, sorted subset of the ring sized by `replication_factor`,
    /// chosen by hashing `digest` to a starting index and walking forward.
    /// The same digest always yields the same ordered subset.
    #[must_use]
    pub fn locations(&self, digest: &Digest, replication_factor: usize) -> Vec<Url> {
        if self.members.is_empty() {
            return Vec::new();
        }

        let mut hasher = DefaultHasher::new();
        digest.string().hash(&mut hasher);
        let start = (hasher.finish() as usize) % self.members.len();

        let take = replication_factor.min(self.members.len());
        let mut selected: Vec<&Url> = (0..self.members.len())
            .map(|offset| &self.members[(start + offset) % self.members.len()].addr)
            .take(take)
            .collect();
        selected.sort();
        selected.into_iter().cloned().collect()
    }

    /// Iterates addresses in round-robin order, skipping those currently
    /// marked failed (unless every address is failed, in which case all are
    /// tried anyway rather than returning nothing).
    #[must_use]
    pub fn iter_round_robin(&self) -> Vec<Url> {
        if self.members.is_empty() {
            return Vec::new();
        }
        let start = self.cursor.fetch_add(1, Ordering::AcqRel) % self.members.len();
        let healthy: Vec<Url> = (0..self.members.len())
            .map(|offset| &self.members[(start + offset) % self.members.len()])
            .filter(|m| !m.failed.load(Ordering::Acquire))
            .map(|m| m.addr.clone())
            .collect();

        if healthy.is_empty() {
            return (0..self.members.len()).map(|offset| self.members[(start + offset) % self.members.len()].addr.clone()).collect();
        }
        healthy
    }
}
