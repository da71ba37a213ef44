//! Pipeline counters
//!
//! - Counters only, monotonic
//! - Reset only on construction
//! - Lock-free; relaxed ordering is enough for counting

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of a validate-and-serialize pipeline.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Requests entering the pipeline
    requests: AtomicU64,
    /// Requests that produced bytes
    encoded: AtomicU64,
    /// Requests rejected before encoding
    rejected: AtomicU64,
    /// Codec failures on validated data
    serialization_failures: AtomicU64,
    /// Requests naming an unregistered schema
    schema_not_found: AtomicU64,
    /// Total encoded bytes returned
    bytes_emitted: AtomicU64,
    /// Root shapes served from the memo
    shape_cache_hits: AtomicU64,
    /// Root shapes compiled
    shape_cache_misses: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful encode of `bytes` bytes
    pub fn record_encoded(&self, bytes: u64) {
        self.encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_emitted.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_serialization_failures(&self) {
        self.serialization_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_not_found(&self) {
        self.schema_not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_shape_cache_hits(&self) {
        self.shape_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_shape_cache_misses(&self) {
        self.shape_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            encoded: self.encoded.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            serialization_failures: self.serialization_failures.load(Ordering::Relaxed),
            schema_not_found: self.schema_not_found.load(Ordering::Relaxed),
            bytes_emitted: self.bytes_emitted.load(Ordering::Relaxed),
            shape_cache_hits: self.shape_cache_hits.load(Ordering::Relaxed),
            shape_cache_misses: self.shape_cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub encoded: u64,
    pub rejected: u64,
    pub serialization_failures: u64,
    pub schema_not_found: u64,
    pub bytes_emitted: u64,
    pub shape_cache_hits: u64,
    pub shape_cache_misses: u64,
}
