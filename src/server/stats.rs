// file: src/server/stats.rs
// description: lock free request counters, logged periodically

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Requests between two summary log lines.
pub const REPORT_EVERY: u64 = 1024;

#[derive(Debug, Default)]
pub struct RequestStats {
    success: AtomicU64,
    failure: AtomicU64,
    in_flight: AtomicU64,
    max_latency_us: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub success: u64,
    pub failure: u64,
    pub in_flight: u64,
    pub max_latency: Duration,
}

/// Counts one request until it is dropped. Requests dropped without
/// `finish`, such as cancelled ones, count as failures.
pub struct RequestGuard<'a> {
    stats: &'a RequestStats,
    start: Instant,
    succeeded: bool,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RequestGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            stats: self,
            start: Instant::now(),
            succeeded: false,
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            success: self.success.load(Ordering::SeqCst),
            failure: self.failure.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            max_latency: Duration::from_micros(self.max_latency_us.load(Ordering::SeqCst)),
        }
    }

    fn record(&self, succeeded: bool, latency: Duration) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.max_latency_us.fetch_max(latency_us, Ordering::SeqCst);

        let counter = if succeeded {
            &self.success
        } else {
            &self.failure
        };
        counter.fetch_add(1, Ordering::SeqCst);

        let snapshot = self.snapshot();
        if (snapshot.success + snapshot.failure) % REPORT_EVERY == 0 {
            info!(
                "Requests: {} ok, {} failed, {} in flight, max latency {:?}",
                snapshot.success, snapshot.failure, snapshot.in_flight, snapshot.max_latency
            );
        }
    }
}

impl RequestGuard<'_> {
    pub fn finish(mut self, succeeded: bool) {
        self.succeeded = succeeded;
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.stats.record(self.succeeded, self.start.elapsed());
    }
}
