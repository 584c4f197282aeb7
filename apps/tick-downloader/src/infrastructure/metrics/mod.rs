//! Prometheus Metrics Module
//!
//! Exposes retrieval metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Pages**: Pages fetched and fetch latency by API version
//! - **Ticks**: Normalized ticks handed to consumers by API version
//! - **Errors**: Retrieval failures by error kind
//!
//! Recording is a no-op until `init_metrics` installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::trades::ApiVersion;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Repeated calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "tick_downloader_pages_fetched_total",
        "Total pages fetched and decoded"
    );
    describe_counter!(
        "tick_downloader_ticks_emitted_total",
        "Total normalized ticks handed to consumers"
    );
    describe_counter!(
        "tick_downloader_retrieval_errors_total",
        "Total retrievals ended by an error, by kind"
    );
    describe_histogram!(
        "tick_downloader_page_fetch_seconds",
        "Time to fetch one page, retries included"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a fetched and decoded page.
pub fn record_page_fetched(version: ApiVersion) {
    counter!(
        "tick_downloader_pages_fetched_total",
        "version" => version.as_str()
    )
    .increment(1);
}

/// Record one tick handed to the consumer.
pub fn record_tick_emitted(version: ApiVersion) {
    counter!(
        "tick_downloader_ticks_emitted_total",
        "version" => version.as_str()
    )
    .increment(1);
}

/// Record a retrieval error.
pub fn record_retrieval_error(kind: &'static str) {
    counter!(
        "tick_downloader_retrieval_errors_total",
        "kind" => kind
    )
    .increment(1);
}

/// Record page fetch duration.
pub fn record_page_fetch_duration(version: ApiVersion, duration: Duration) {
    histogram!(
        "tick_downloader_page_fetch_seconds",
        "version" => version.as_str()
    )
    .record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
