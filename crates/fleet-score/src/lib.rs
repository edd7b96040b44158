//! Read-only scoring engine for field operatives: per-operative metrics and
//! ratings, fleet ranking and peer benchmarks over an injected record store.

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
