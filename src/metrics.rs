//! Prometheus metrics exposition server.
//!
//! Counters are recorded through the `metrics` facade wherever deliveries
//! happen. Without an installed recorder they are no-ops; the server below
//! installs the Prometheus recorder and serves `/metrics`.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Global flag to track if recorder is installed (for tests)
static RECORDER_INSTALLED: OnceLock<()> = OnceLock::new();

/// Register all metric descriptions for Prometheus.
pub fn register_metric_descriptions() {
    use metrics::describe_counter;

    describe_counter!(
        "mailout_emails_sent_total",
        "Total number of emails handed off successfully to the transport"
    );
    describe_counter!(
        "mailout_delivery_failures_total",
        "Total number of failed deliveries, labelled by failure kind"
    );
    describe_counter!(
        "mailout_events_received_total",
        "Total number of events read by the pipeline"
    );
    describe_counter!(
        "mailout_events_skipped_total",
        "Total number of input lines skipped because they were not JSON objects"
    );
}

/// Initialize all known counters to zero so they show up before any event.
pub fn initialize_metrics() {
    use metrics::counter;

    counter!("mailout_emails_sent_total").absolute(0);
    counter!("mailout_events_received_total").absolute(0);
    counter!("mailout_events_skipped_total").absolute(0);
    for kind in ["transport", "attachment", "template", "build"] {
        counter!("mailout_delivery_failures_total", "kind" => kind).absolute(0);
    }
}

/// Metrics server for Prometheus exposition.
pub struct MetricsServer {
    port: u16,
    /// Signalled once the recorder is installed, so callers do not emit
    /// metrics that would be lost.
    ready_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MetricsServer {
    /// Use port 0 to let the OS assign an available port.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ready_tx: None,
        }
    }

    pub fn with_ready_signal(port: u16, ready_tx: tokio::sync::oneshot::Sender<()>) -> Self {
        Self {
            port,
            ready_tx: Some(ready_tx),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Install the global recorder, serve `/metrics`, and wait for
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error if the exporter cannot be installed (port in use,
    /// or a recorder already installed in this process).
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();

        // The recorder can only be installed once per process
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

        let _ = RECORDER_INSTALLED.set(());

        register_metric_descriptions();
        initialize_metrics();

        if let Some(tx) = self.ready_tx {
            let _ = tx.send(());
        }

        info!(port = self.port, "Metrics server started on /metrics");

        cancel.cancelled().await;

        info!("Metrics server shutting down");

        Ok(())
    }
}

/// Check if the metrics recorder has been installed.
pub fn is_recorder_installed() -> bool {
    RECORDER_INSTALLED.get().is_some()
}
