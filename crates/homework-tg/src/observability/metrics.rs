use super::GLOBAL_LABELS;
use crate::prelude::*;
use crate::Result;

/// Histogram buckets to measure the distribution of request durations in seconds
const DEFAULT_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Installs the global metrics recorder and exposes its scrape endpoint
/// on `0.0.0.0:{port}`. Must be called inside of the tokio runtime.
pub fn init_metrics(port: u16) -> Result {
    let mut builder = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .set_buckets(DEFAULT_DURATION_BUCKETS)
        .fatal_ctx(|| "Invalid histogram buckets")?;

    for (key, value) in GLOBAL_LABELS {
        builder = builder.add_global_label(*key, *value);
    }

    builder
        .install()
        .fatal_ctx(|| format!("Failed to start the metrics listener on port {port}"))?;

    info!(port, "Metrics are exported via prometheus endpoint");

    Ok(())
}
