//! API routes.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{crop_video, health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, log_requests, rate_limit, security_headers, CropRateLimiter};
use crate::output::OUTPUT_ROUTE;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = Arc::new(CropRateLimiter::new(
        state.config.rate_limit_rps,
        state.config.trust_proxy_headers,
    ));

    let api_routes = Router::new()
        .route("/crop-video", post(crop_video))
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    // Outermost first: assign the id, open the span that records it, echo it back
    let request_ids = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .nest("/api", api_routes)
        .nest_service(OUTPUT_ROUTE, ServeDir::new(&state.config.output_dir))
        .merge(health_routes)
        .merge(metrics_routes)
        // Uploads are capped by the configured limit instead of axum's 2MB default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(log_requests))
        .layer(request_ids)
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
