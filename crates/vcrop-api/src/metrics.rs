//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vcrop_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vcrop_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vcrop_http_requests_in_flight";

    // Crop metrics
    pub const CROPS_TOTAL: &str = "vcrop_crops_total";
    pub const UPLOAD_BYTES: &str = "vcrop_upload_bytes";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vcrop_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the outcome of a crop request (`success` or an error code).
pub fn record_crop(mode: &str, outcome: &str) {
    let labels = [("mode", mode.to_string()), ("outcome", outcome.to_string())];
    counter!(names::CROPS_TOTAL, &labels).increment(1);
}

/// Record the size of an accepted upload.
pub fn record_upload_size(bytes: u64) {
    histogram!(names::UPLOAD_BYTES).record(bytes as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static OUTPUT_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/output/.+$").expect("valid output path regex"));

/// Sanitize path for metrics labels so per-file downloads share one series.
fn sanitize_path(path: &str) -> String {
    OUTPUT_FILE.replace(path, "/output/:file").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/output/cropped-1700000000000-1a2b3c4d.mp4"),
            "/output/:file"
        );
        assert_eq!(sanitize_path("/api/crop-video"), "/api/crop-video");
        assert_eq!(sanitize_path("/output"), "/output");
    }
}
