//! Metrics for ingest throughput and detection outcomes.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

/// Deltas processed counter metric name.
pub const METRIC_DELTAS_PROCESSED: &str = "deltas_processed_total";
/// Markets discovered counter metric name.
pub const METRIC_MARKETS_DISCOVERED: &str = "markets_discovered_total";
/// Triangles discovered counter metric name.
pub const METRIC_TRIANGLES_DISCOVERED: &str = "triangles_discovered_total";
/// Plans published counter metric name.
pub const METRIC_PLANS_PUBLISHED: &str = "plans_published_total";
/// Publish failures counter metric name.
pub const METRIC_PUBLISH_FAILURES: &str = "publish_failures_total";
/// Symbol parse failures counter metric name.
pub const METRIC_SYMBOL_PARSE_FAILURES: &str = "symbol_parse_failures_total";
/// Detection latency metric name.
pub const METRIC_DETECTION_LATENCY: &str = "detection_latency_ms";

/// Register metric descriptions. Call once at startup.
pub fn init_metrics() {
    describe_counter!(
        METRIC_DELTAS_PROCESSED,
        "Total number of order-book deltas processed"
    );
    describe_counter!(
        METRIC_MARKETS_DISCOVERED,
        "Total number of markets discovered from the feed"
    );
    describe_counter!(
        METRIC_TRIANGLES_DISCOVERED,
        "Total number of triangular cycles discovered"
    );
    describe_counter!(METRIC_PLANS_PUBLISHED, "Total number of plans published");
    describe_counter!(
        METRIC_PUBLISH_FAILURES,
        "Total number of failed publish attempts"
    );
    describe_counter!(
        METRIC_SYMBOL_PARSE_FAILURES,
        "Total number of symbols that could not be split into base/quote"
    );
    describe_histogram!(
        METRIC_DETECTION_LATENCY,
        "Per-update detection latency in milliseconds"
    );

    debug!("metrics initialized");
}

/// Increment the deltas processed counter.
pub fn inc_deltas_processed() {
    counter!(METRIC_DELTAS_PROCESSED).increment(1);
}

/// Increment the markets discovered counter.
pub fn inc_markets_discovered() {
    counter!(METRIC_MARKETS_DISCOVERED).increment(1);
}

/// Record newly discovered triangles.
pub fn inc_triangles_discovered(count: usize) {
    counter!(METRIC_TRIANGLES_DISCOVERED).increment(count as u64);
}

/// Increment the plans published counter.
pub fn inc_plans_published() {
    counter!(METRIC_PLANS_PUBLISHED).increment(1);
}

/// Increment the publish failures counter.
pub fn inc_publish_failures() {
    counter!(METRIC_PUBLISH_FAILURES).increment(1);
}

/// Increment the symbol parse failures counter.
pub fn inc_symbol_parse_failures() {
    counter!(METRIC_SYMBOL_PARSE_FAILURES).increment(1);
}

/// Record detection latency for one update.
pub fn record_detection_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_DETECTION_LATENCY).record(latency_ms);
}
