//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "wayfetch_fetches_total",
        "Total number of routed fetches by result and final tier"
    );
    metrics::describe_counter!(
        "wayfetch_tier_attempts_total",
        "Total tier attempts by tier and outcome"
    );
    metrics::describe_histogram!(
        "wayfetch_fetch_duration_seconds",
        "End-to-end fetch duration including cascade backoff"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a completed fetch
pub fn record_fetch(result: &str, tier: &str, duration_secs: f64) {
    metrics::counter!(
        "wayfetch_fetches_total",
        "result" => result.to_string(),
        "tier" => tier.to_string()
    )
    .increment(1);
    metrics::histogram!("wayfetch_fetch_duration_seconds", "result" => result.to_string())
        .record(duration_secs);
}

/// Record one tier attempt
pub fn record_tier_attempt(tier: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "wayfetch_tier_attempts_total",
        "tier" => tier.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
