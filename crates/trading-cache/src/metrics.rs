//! Counters for durable cache activity.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache operation metrics (thread-safe counters, cheap to clone).
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    /// Entries served from disk without running the operation
    pub hits: Arc<AtomicU64>,
    /// Lookups that ran the operation
    pub misses: Arc<AtomicU64>,
    /// Entries written to disk
    pub writes: Arc<AtomicU64>,
    /// Existing entries the codec could not decode
    pub decode_failures: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.decode_failures.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics (for reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub decode_failures: u64,
}

impl MetricsSnapshot {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses + self.decode_failures
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }

    /// Format a human-readable report.
    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Durable Cache Report".to_string());
        lines.push("=".repeat(40));
        lines.push(format!("  Hits:            {}", self.hits));
        lines.push(format!("  Misses:          {}", self.misses));
        lines.push(format!("  Writes:          {}", self.writes));
        lines.push(format!("  Decode failures: {}", self.decode_failures));
        lines.push(format!("  Hit Rate:        {:.1}%", self.hit_rate() * 100.0));
        lines.join("\n")
    }
}
