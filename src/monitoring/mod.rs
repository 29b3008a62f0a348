#![forbid(unsafe_code)]

//! Observability: Prometheus metrics and the read-only HTTP surface.

/// HTTP endpoints (health, chain, metrics).
pub mod http;
/// Prometheus metrics.
pub mod metrics;
