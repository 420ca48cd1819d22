//! Per-store operation counters
//!
//! - Counters are monotonic, except `records` which tracks the table length
//! - Reset only when the store is connected
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one record store.
///
/// Relaxed ordering throughout; values are exact once the store is idle.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Successful appends
    appends: AtomicU64,
    /// Successful full reads
    reads: AtomicU64,
    /// Successful updates
    updates: AtomicU64,
    /// Successful deletes
    deletes: AtomicU64,
    /// Successful reloads (including the initial load)
    reloads: AtomicU64,
    /// Whole-document rewrites completed
    rewrites: AtomicU64,
    /// Total bytes written by rewrites
    bytes_written: AtomicU64,
    /// Operations that returned an error
    failures: AtomicU64,
    /// Current table length as seen by the worker
    records: AtomicU64,
}

impl StoreMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_appends(&self) {
        self.appends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reads(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updates(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reloads(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one completed rewrite of `bytes` bytes
    pub fn record_rewrite(&self, bytes: u64) {
        self.rewrites.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Set the current table length
    pub fn set_records(&self, count: usize) {
        self.records.store(count as u64, Ordering::Relaxed);
    }

    /// Get all counters as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            appends: self.appends.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
            rewrites: self.rewrites.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a store's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub appends: u64,
    pub reads: u64,
    pub updates: u64,
    pub deletes: u64,
    pub reloads: u64,
    pub rewrites: u64,
    pub bytes_written: u64,
    pub failures: u64,
    pub records: u64,
}
