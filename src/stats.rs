//! Stats sink: process-wide counters reset on a per-device radio-stop edge.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Safe for concurrent calls from many machines (spec.md §5).
#[derive(Default)]
pub struct StatsManager {
    clears: AtomicU64,
}

impl StatsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoked exactly once on the RF-TX true→false edge
    /// (spec.md §4.2 `WaitGetTransientParameters`, §8).
    pub fn clear_stats(&self, device_id: &str) {
        self.clears.fetch_add(1, Ordering::Relaxed);
        info!(device_id, "stats cleared on radio-stop edge");
    }

    /// Total radio-stop clears observed so far. Exposed for tests and
    /// operator status queries, not load-bearing for dispatch itself.
    pub fn clear_count(&self) -> u64 {
        self.clears.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_stats_increments_counter() {
        let stats = StatsManager::new();
        stats.clear_stats("enb-1");
        assert_eq!(stats.clear_count(), 1);
    }
}
