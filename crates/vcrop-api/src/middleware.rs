//! Request middleware for the crop service.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::Json;
use governor::clock::Clock;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::metrics;

/// Clients tracked before idle entries are evicted.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Paths polled by orchestrators and scrapers; not logged.
const QUIET_PATHS: &[&str] = &["/health", "/healthz", "/ready", "/metrics"];

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    // Cropped videos are played and downloaded from the frontend's origin
    ("cross-origin-resource-policy", "cross-origin"),
];

/// Per-client limiter for the crop endpoint, keyed by IP address.
pub struct CropRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    trust_proxy_headers: bool,
}

impl CropRateLimiter {
    /// `requests_per_second` of zero is treated as one.
    pub fn new(requests_per_second: u32, trust_proxy_headers: bool) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_second(rps)),
            trust_proxy_headers,
        }
    }

    /// `Err` carries how long the client has to wait.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        if self.limiter.len() >= MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        self.limiter
            .check_key(&ip)
            .map_err(|not_until| not_until.wait_time_from(self.limiter.clock().now()))
    }

    /// Address the request is accounted to.
    ///
    /// Forwarding headers are only believed when the service is configured to
    /// sit behind a trusted proxy; otherwise any client could pick its own key.
    pub fn client_ip(&self, request: &Request<Body>) -> Option<IpAddr> {
        if self.trust_proxy_headers {
            let forwarded = header_ip(request.headers(), "x-forwarded-for")
                .or_else(|| header_ip(request.headers(), "x-real-ip"));
            if forwarded.is_some() {
                return forwarded;
            }
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    }
}

/// First address listed in an IP header.
fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Reject clients that exceed their crop quota with 429.
pub async fn rate_limit(
    State(limiter): State<Arc<CropRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let Some(ip) = limiter.client_ip(&request) else {
        return next.run(request).await;
    };

    if let Err(wait) = limiter.check(ip) {
        warn!(%ip, "Rate limit exceeded");
        metrics::record_rate_limit_hit(request.uri().path());
        let retry_after = wait.as_secs_f64().ceil().max(1.0) as u64;
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
            Json(json!({
                "error": "Rate limit exceeded. Please try again later.",
                "code": "rate_limited",
            })),
        )
            .into_response();
    }

    next.run(request).await
}

/// CORS for a browser frontend posting multipart forms and fetching results.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::POST, Method::GET])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(600))
}

pub async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for &(name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    response
}

/// One line per completed request. Runs inside the trace span, which carries
/// the request id.
pub async fn log_requests(request: Request<Body>, next: Next) -> Response<Body> {
    if QUIET_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn request_with(headers: &[(&str, &str)], peer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        if let Some(peer) = peer {
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::new(ip(peer), 50000)));
        }
        request
    }

    #[test]
    fn test_limit_is_per_client() {
        let limiter = CropRateLimiter::new(2, false);

        assert!(limiter.check(ip("10.0.0.1")).is_ok());
        assert!(limiter.check(ip("10.0.0.1")).is_ok());
        let wait = limiter.check(ip("10.0.0.1")).unwrap_err();
        assert!(wait <= Duration::from_secs(1));

        assert!(limiter.check(ip("10.0.0.2")).is_ok());
    }

    #[test]
    fn test_zero_rps_still_allows_one() {
        let limiter = CropRateLimiter::new(0, false);
        assert!(limiter.check(ip("10.0.0.1")).is_ok());
        assert!(limiter.check(ip("10.0.0.1")).is_err());
    }

    #[test]
    fn test_forwarded_headers_ignored_by_default() {
        let limiter = CropRateLimiter::new(10, false);
        let request = request_with(
            &[("x-forwarded-for", "203.0.113.7"), ("x-real-ip", "198.51.100.2")],
            Some("192.0.2.10"),
        );
        assert_eq!(limiter.client_ip(&request), Some(ip("192.0.2.10")));

        let request = request_with(&[("x-forwarded-for", "203.0.113.7")], None);
        assert_eq!(limiter.client_ip(&request), None);
    }

    #[test]
    fn test_forwarded_headers_used_behind_trusted_proxy() {
        let limiter = CropRateLimiter::new(10, true);
        let request = request_with(
            &[("x-forwarded-for", "203.0.113.7, 10.0.0.1"), ("x-real-ip", "198.51.100.2")],
            Some("192.0.2.10"),
        );
        assert_eq!(limiter.client_ip(&request), Some(ip("203.0.113.7")));

        let request = request_with(&[("x-real-ip", "198.51.100.2")], Some("192.0.2.10"));
        assert_eq!(limiter.client_ip(&request), Some(ip("198.51.100.2")));

        let request = request_with(&[("x-forwarded-for", "garbage")], Some("192.0.2.10"));
        assert_eq!(limiter.client_ip(&request), Some(ip("192.0.2.10")));
    }
}
