use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Request counters for one client instance.
#[derive(Debug, Default)]
pub struct ClientStats {
    total: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    retries: AtomicU64,
    latency_ms: AtomicU64,
}

/// Point-in-time copy of [`ClientStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub retries: u64,
    /// Mean latency of successful requests, in milliseconds.
    pub average_latency_ms: f64,
}

impl ClientStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_success(&self, latency: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.success.fetch_add(1, Ordering::Relaxed);
        self.latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let success = self.success.load(Ordering::Relaxed);
        let latency = self.latency_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            total_requests: self.total.load(Ordering::Relaxed),
            successful_requests: success,
            failed_requests: self.failure.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            average_latency_ms: if success == 0 {
                0.0
            } else {
                latency as f64 / success as f64
            },
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total,
            &self.success,
            &self.failure,
            &self.retries,
            &self.latency_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
