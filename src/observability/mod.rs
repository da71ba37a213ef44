//! Observability subsystem
//!
//! - Structured logging through `tracing`, JSON lines on stderr
//! - Lock-free pipeline counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//!
//! ```ignore
//! use avrogate::observability::{init_tracing, PipelineMetrics};
//!
//! init_tracing("warn");
//! let metrics = PipelineMetrics::new();
//! metrics.increment_requests();
//! ```

mod logging;
mod metrics;

pub use logging::{env_filter, init_tracing, LOG_ENV};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
