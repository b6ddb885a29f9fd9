//! Logging and metrics wiring shared across the `swift-*` crates.

pub mod logging;
pub mod prometheus;
pub mod recorder;

pub use logging::{init_logging, LogArgs};
pub use prometheus::{install_prometheus_recorder, PrometheusConfig, PrometheusRecorder};
pub use recorder::{MetricSnapshot, MetricValue, MetricsRecorder};

/// Re-export of the facade crate so downstream crates can record metrics
/// without depending on it directly.
pub use metrics;
