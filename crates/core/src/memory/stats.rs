use std::sync::atomic::{AtomicU64, Ordering};

/// Process-lifetime recall correlation counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
}

impl StatsSnapshot {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate as shown to operators: `0%` before any recall, else one decimal.
    pub fn hit_rate_label(&self) -> String {
        match self.total() {
            0 => "0%".to_string(),
            total => format!("{:.1}%", self.hits as f64 / total as f64 * 100.0),
        }
    }
}
