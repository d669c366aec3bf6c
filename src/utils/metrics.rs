// src/utils/metrics.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Metrics {
    start_time: Instant,
    puts_total: AtomicU64,
    gets_total: AtomicU64,
    requests_rejected: AtomicU64,
    processing_time: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub puts_total: u64,
    pub gets_total: u64,
    pub requests_rejected: u64,
    pub processing_time: Duration,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            puts_total: AtomicU64::new(0),
            gets_total: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            processing_time: AtomicU64::new(0),
        }
    }

    pub fn record_put(&self, duration: Duration) {
        self.puts_total.fetch_add(1, Ordering::Relaxed);
        self.processing_time.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_get(&self, duration: Duration) {
        self.gets_total.fetch_add(1, Ordering::Relaxed);
        self.processing_time.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            puts_total: self.puts_total.load(Ordering::Relaxed),
            gets_total: self.gets_total.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            processing_time: Duration::from_micros(self.processing_time.load(Ordering::Relaxed)),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
