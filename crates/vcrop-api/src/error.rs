//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vcrop_media::MediaError;
use vcrop_models::ValidationError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("No video file uploaded")]
    MissingVideo,

    #[error("Uploaded video is too large")]
    PayloadTooLarge,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to read video metadata")]
    Probe(#[source] MediaError),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Failed to process video")]
    Processing(#[source] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify a media failure raised while reading the upload.
    pub fn from_probe(err: MediaError) -> Self {
        match err {
            MediaError::InvalidVideo(_) => Self::NoVideoStream,
            other => Self::Probe(other),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MissingVideo | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Probe(_)
            | ApiError::NoVideoStream
            | ApiError::Processing(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::MissingVideo => "missing_video",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::Validation(e) => e.kind().as_str(),
            ApiError::Probe(_) | ApiError::NoVideoStream => "probe_failed",
            ApiError::Processing(_) => "processing_failed",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl ApiError {
    /// Build the JSON error response. In production the text of internal
    /// errors is replaced with a generic message.
    pub fn into_response_for(self, production: bool) -> Response {
        let error = match &self {
            ApiError::Internal(_) if production => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };
        let body = ErrorResponse {
            error,
            code: self.code(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Without access to the configuration, internal details stay hidden.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_for(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcrop_models::{CropRegion, SourceDimensions};

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = ApiError::from(ValidationError::out_of_bounds(
            CropRegion::new(0, 0, 700, 480),
            SourceDimensions::new(640, 480),
        ));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "out_of_bounds");
        assert!(err.to_string().starts_with("Crop region exceeds video boundaries."));
    }

    #[test]
    fn test_probe_classification() {
        let err = ApiError::from_probe(MediaError::invalid_video("No video stream found"));
        assert!(matches!(err, ApiError::NoVideoStream));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from_probe(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: None,
        });
        assert_eq!(err.to_string(), "Failed to read video metadata");
        assert_eq!(err.code(), "probe_failed");
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_details_hidden_in_production() {
        let response = ApiError::internal("disk full").into_response_for(true);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "An internal error occurred");
        assert_eq!(body["code"], "internal_error");

        let body = body_json(ApiError::internal("disk full").into_response()).await;
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_internal_details_shown_outside_production() {
        let body = body_json(ApiError::internal("disk full").into_response_for(false)).await;
        assert_eq!(body["error"], "Internal error: disk full");
    }

    #[tokio::test]
    async fn test_client_errors_never_redacted() {
        let body = body_json(ApiError::MissingVideo.into_response_for(true)).await;
        assert_eq!(body["error"], "No video file uploaded");
        assert_eq!(body["code"], "missing_video");
    }

    #[test]
    fn test_processing_hides_ffmpeg_details() {
        let err = ApiError::Processing(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("width not divisible by 2".to_string()),
            Some(1),
        ));
        assert_eq!(err.to_string(), "Failed to process video");
        assert_eq!(err.code(), "processing_failed");
    }
}
