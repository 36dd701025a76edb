//! Time-bucket arithmetic.
//!
//! The active window for an instant is `floor(now / width)`. A peer
//! announcing at `t` lands in window `floor(t / width)`; a sample reads the
//! current window plus the `max_windows - 1` windows before it, so a peer
//! stays visible for somewhere between `width` and `width * max_windows`
//! seconds depending on when in its window it last announced.
use kraken_primitives::DurationSinceUnixEpoch;

/// Identifies one time bucket: `floor(unix_seconds / width_secs)`.
pub type WindowId = u64;

#[must_use]
pub fn of(now: DurationSinceUnixEpoch, width_secs: u64) -> WindowId {
    now.as_secs() / width_secs.max(1)
}

/// The `max_windows` window ids ending at (and including) `current`, oldest
/// first.
#[must_use]
pub fn active_range(current: WindowId, max_windows: u64) -> Vec<WindowId> {
    let max_windows = max_windows.max(1);
    let oldest = current.saturating_sub(max_windows - 1);
    (oldest..=current).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_buckets_by_width() {
        assert_eq!(of(DurationSinceUnixEpoch::from_secs(0), 60), 0);
        assert_eq!(of(DurationSinceUnixEpoch::from_secs(59), 60), 0);
        assert_eq!(of(DurationSinceUnixEpoch::from_secs(60), 60), 1);
        assert_eq!(of(DurationSinceUnixEpoch::from_secs(121), 60), 2);
    }

    #[test]
    fn it_computes_the_active_range_ending_at_current() {
        assert_eq!(active_range(10, 3), vec![8, 9, 10]);
    }

    #[test]
    fn it_clamps_the_active_range_at_zero() {
        assert_eq!(active_range(1, 5), vec![0, 1]);
    }
}
