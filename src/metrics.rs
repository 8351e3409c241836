//! Client-side request metrics.
//!
//! Records through the `metrics` facade; the embedding application decides
//! whether and where a recorder is installed.  Without one, recording is a
//! no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

// -- Metric name constants ----------------------------------------------------

/// Total requests sent (counter). Labels: method, status.
pub const REQUESTS_TOTAL: &str = "swiftstore_requests_total";

/// Request round-trip time in seconds (histogram). Labels: method.
pub const REQUEST_DURATION_SECONDS: &str = "swiftstore_request_duration_seconds";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total storage API requests");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Storage API request duration in seconds"
    );
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    counter!(REQUESTS_TOTAL, "method" => method.to_string(), "status" => status_class(status))
        .increment(1);
    histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

/// Collapse a status code into its class to keep label cardinality low.
fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
