//! Prometheus recorder installation.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use metrics_util::layers::{PrefixLayer, Stack};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static PROMETHEUS_RECORDER: OnceLock<PrometheusRecorder> = OnceLock::new();

/// Configuration for the global prometheus recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Prefix applied to every metric name, e.g. `"swift"`.
    pub prefix: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            prefix: "swift".to_string(),
        }
    }
}

/// Install (once) and return a handle to the global prometheus recorder.
pub fn install_prometheus_recorder() -> PrometheusRecorder {
    PROMETHEUS_RECORDER
        .get_or_init(|| {
            PrometheusRecorder::install().expect("failed to install prometheus recorder")
        })
        .clone()
}

/// Handle to the installed prometheus metrics recorder.
#[derive(Clone)]
pub struct PrometheusRecorder {
    handle: PrometheusHandle,
}

impl std::fmt::Debug for PrometheusRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusRecorder").finish()
    }
}

impl PrometheusRecorder {
    /// Install the recorder with the default configuration.
    pub fn install() -> eyre::Result<Self> {
        Self::install_with_config(PrometheusConfig::default())
    }

    /// Install the recorder, prefixing every metric name.
    pub fn install_with_config(config: PrometheusConfig) -> eyre::Result<Self> {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        Stack::new(recorder)
            .push(PrefixLayer::new(&config.prefix))
            .install()?;

        Ok(Self { handle })
    }

    /// The underlying prometheus handle, e.g. for rendering `/metrics` text.
    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }
}

/// Metrics recorded by the swift crates, grouped the way they are consumed.
pub mod metrics {
    use metrics::{counter, gauge, histogram};

    /// Bin-arithmetic / tree metrics.
    pub mod tree {
        use super::*;

        /// A hash was offered and passed verification.
        pub fn increment_hashes_verified() {
            counter!("tree.hashes_verified").increment(1);
        }

        /// A hash was offered and failed verification.
        pub fn increment_hashes_rejected() {
            counter!("tree.hashes_rejected").increment(1);
        }

        /// Set the number of chunks sequentially complete from the start.
        pub fn set_seq_complete(chunks: u64) {
            gauge!("tree.seq_complete_chunks").set(chunks as f64);
        }

        /// Record how long a peak derivation took.
        pub fn observe_root_derivation_time(duration_ms: f64) {
            histogram!("tree.root_derivation_time_ms").record(duration_ms);
        }
    }

    /// Swarm lifecycle metrics.
    pub mod swarm {
        use super::*;

        /// Set the number of currently active swarms.
        pub fn set_active_swarms(count: u64) {
            gauge!("swarm.active").set(count as f64);
        }

        /// Set the number of known (active + cached) swarms.
        pub fn set_known_swarms(count: u64) {
            gauge!("swarm.known").set(count as f64);
        }

        /// A swarm was activated.
        pub fn increment_activations() {
            counter!("swarm.activations").increment(1);
        }

        /// A swarm was deactivated.
        pub fn increment_deactivations() {
            counter!("swarm.deactivations").increment(1);
        }
    }

    /// Transfer-surface metrics.
    pub mod transfer {
        use super::*;

        /// Record bytes of content data received.
        pub fn add_bytes_received(bytes: u64) {
            counter!("transfer.bytes_received").increment(bytes);
        }

        /// Set the current download rate in bytes per second.
        pub fn set_download_rate(bytes_per_sec: f64) {
            gauge!("transfer.download_rate_bps").set(bytes_per_sec);
        }

        /// Record a tracker backoff delay being applied.
        pub fn observe_backoff_delay(seconds: f64) {
            histogram!("transfer.backoff_delay_seconds").record(seconds);
        }
    }
}
