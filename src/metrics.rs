//! Metrics hook points.
//!
//! No concrete backend is wired in (metrics emission is out of scope as a
//! concrete system), but the handout policy and the admission-controlled
//! stores name counters explicitly enough that silently dropping them would
//! leave those operations unimplemented. [`Metrics`] is the seam a real
//! backend plugs into; [`NoopMetrics`] is what the tracker server uses until
//! one is.
use std::sync::atomic::{AtomicI64, Ordering};

/// Counters a concrete backend would forward to its own metrics system.
pub trait Metrics: Send + Sync {
    /// A peer-handout batch assigned `count` candidates the label `label`.
    fn record_handout_label(&self, label: &'static str, count: usize);

    /// The blob memory cache's occupied bytes changed to `bytes`.
    fn record_cache_occupancy(&self, bytes: u64);

    /// A file store entry's refcount changed by `delta`.
    fn record_ref_count_change(&self, delta: i64);
}

/// Drops every recorded counter. The default until a real backend is wired.
#[derive(Debug, Default)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn record_handout_label(&self, _label: &'static str, _count: usize) {}
    fn record_cache_occupancy(&self, _bytes: u64) {}
    fn record_ref_count_change(&self, _delta: i64) {}
}

/// An in-process [`Metrics`] that keeps running totals, for tests that need
/// to assert a counter moved rather than just that nothing panicked.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    pub handouts: AtomicI64,
    pub cache_occupancy: AtomicI64,
    pub ref_count_delta: AtomicI64,
}

impl Metrics for CountingMetrics {
    fn record_handout_label(&self, _label: &'static str, count: usize) {
        self.handouts.fetch_add(i64::try_from(count).unwrap_or(i64::MAX), Ordering::Relaxed);
    }

    fn record_cache_occupancy(&self, bytes: u64) {
        self.cache_occupancy.store(i64::try_from(bytes).unwrap_or(i64::MAX), Ordering::Relaxed);
    }

    fn record_ref_count_change(&self, delta: i64) {
        self.ref_count_delta.fetch_add(delta, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn noop_metrics_accepts_every_call_without_panicking() {
        let metrics = NoopMetrics;
        metrics.record_handout_label("default", 3);
        metrics.record_cache_occupancy(1024);
        metrics.record_ref_count_change(-1);
    }

    #[test]
    fn counting_metrics_accumulates_handouts_and_tracks_latest_occupancy() {
        let metrics = CountingMetrics::default();
        metrics.record_handout_label("default", 2);
        metrics.record_handout_label("completeness", 3);
        metrics.record_cache_occupancy(512);
        metrics.record_ref_count_change(2);
        metrics.record_ref_count_change(-1);

        assert_eq!(metrics.handouts.load(Ordering::Relaxed), 5);
        assert_eq!(metrics.cache_occupancy.load(Ordering::Relaxed), 512);
        assert_eq!(metrics.ref_count_delta.load(Ordering::Relaxed), 1);
    }
}
