//! Video crop handler.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info, warn};

use vcrop_media::fs_utils::{move_file, remove_if_exists_blocking};
use vcrop_models::CropRequest;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use crate::upload::read_crop_form;

/// Successful crop response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropResponse {
    pub message: String,
    pub download_url: String,
}

/// Crop an uploaded video.
///
/// POST /api/crop-video (multipart/form-data)
///
/// The `video` part carries the file; the remaining parts select either an
/// edge crop (`top`, `bottom`, `left`, `right`) or a region crop (`cropX`,
/// `cropY`, `cropWidth`, `cropHeight`).
pub async fn crop_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    match handle(&state, &headers, multipart).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response_for(state.config.is_production()),
    }
}

async fn handle(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Multipart,
) -> ApiResult<CropResponse> {
    let start = Instant::now();
    let upload = read_crop_form(multipart, &state.config.upload_dir).await?;
    metrics::record_upload_size(upload.size);

    if upload.fields.has_region_fields() && upload.fields.has_edge_fields() {
        warn!("Both region and edge crop fields supplied; using the region");
    }

    let request = upload.fields.into_request().map_err(|e| {
        warn!(error = %e, "Rejected crop fields");
        metrics::record_crop("unknown", e.kind().as_str());
        ApiError::from(e)
    })?;
    let mode = request.mode();

    let result = process(state, headers, upload.path(), &request).await;
    match &result {
        Ok(_) => {
            metrics::record_crop(mode, "success");
            info!(
                mode,
                file = upload.original_name.as_deref().unwrap_or("-"),
                size = upload.size,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Video cropped"
            );
        }
        Err(e) => {
            if e.status_code().is_server_error() {
                error!(mode, code = e.code(), error = ?e, "Crop failed");
            } else {
                warn!(mode, code = e.code(), error = %e, "Crop rejected");
            }
            metrics::record_crop(mode, e.code());
        }
    }

    // `upload` is dropped here, deleting the buffered source file
    result
}

async fn process(
    state: &AppState,
    headers: &HeaderMap,
    input: &std::path::Path,
    request: &CropRequest,
) -> ApiResult<CropResponse> {
    let info = state.media.probe(input).await.map_err(ApiError::from_probe)?;
    let source = info.dimensions().map_err(ApiError::from_probe)?;

    let rect = request.resolve(source)?;
    info!(
        source = %format!("{}x{}", source.width, source.height),
        crop = %format!("{}x{}+{}+{}", rect.width, rect.height, rect.x, rect.y),
        "Resolved crop rectangle"
    );

    let output = state.outputs.allocate();

    // Remove the partial encode unless it is published
    let work_guard = scopeguard::guard(output.work_path.clone(), |path| {
        remove_if_exists_blocking(&path);
    });

    state
        .media
        .crop(input, &output.work_path, &rect, &info)
        .await
        .map_err(ApiError::Processing)?;

    move_file(&output.work_path, &output.path)
        .await
        .map_err(ApiError::Processing)?;
    scopeguard::ScopeGuard::into_inner(work_guard);

    Ok(CropResponse {
        message: "Video processed successfully".to_string(),
        download_url: state.outputs.download_url(headers, &output.name),
    })
}
