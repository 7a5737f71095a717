//! Axum HTTP API server for video cropping.
//!
//! This crate provides:
//! - The multipart `/api/crop-video` endpoint
//! - Static serving of cropped outputs under `/output`
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod output;
pub mod routes;
pub mod security;
pub mod state;
pub mod upload;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use output::OutputStore;
pub use routes::create_router;
pub use state::AppState;
