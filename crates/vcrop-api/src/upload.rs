//! Multipart upload handling for the crop endpoint.

use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use vcrop_models::CropFields;

use crate::error::{ApiError, ApiResult};
use crate::security::{sanitize_for_log, upload_suffix};

/// Form field carrying the video file.
pub const VIDEO_FIELD: &str = "video";

/// A parsed crop form: the buffered video plus the raw crop fields.
///
/// The video lives in a temporary file that is deleted when this value is
/// dropped, whichever way the request ends.
#[derive(Debug)]
pub struct CropUpload {
    pub video: NamedTempFile,
    pub original_name: Option<String>,
    pub size: u64,
    pub fields: CropFields,
}

impl CropUpload {
    pub fn path(&self) -> &Path {
        self.video.path()
    }
}

/// Read the whole multipart body, streaming the video into `upload_dir`.
pub async fn read_crop_form(mut multipart: Multipart, upload_dir: &Path) -> ApiResult<CropUpload> {
    let mut video: Option<(NamedTempFile, Option<String>, u64)> = None;
    let mut fields = CropFields::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == VIDEO_FIELD {
            if video.is_some() {
                return Err(ApiError::bad_request("Only one video file may be uploaded"));
            }
            let original_name = field.file_name().map(sanitize_for_log);
            let (file, size) = save_field(field, upload_dir, original_name.as_deref()).await?;
            video = Some((file, original_name, size));
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            if !fields.set(&name, value) {
                debug!(field = %sanitize_for_log(&name), "Ignoring unknown form field");
            }
        }
    }

    let (video, original_name, size) = video.ok_or(ApiError::MissingVideo)?;
    if size == 0 {
        return Err(ApiError::bad_request("Uploaded video is empty"));
    }

    Ok(CropUpload {
        video,
        original_name,
        size,
        fields,
    })
}

/// Stream one file field to a new temporary file in `upload_dir`.
async fn save_field(
    mut field: Field<'_>,
    upload_dir: &Path,
    original_name: Option<&str>,
) -> ApiResult<(NamedTempFile, u64)> {
    let temp = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&upload_suffix(original_name))
        .tempfile_in(upload_dir)
        .map_err(|e| ApiError::internal(format!("Failed to create upload file: {e}")))?;

    let handle = temp
        .as_file()
        .try_clone()
        .map_err(|e| ApiError::internal(format!("Failed to open upload file: {e}")))?;
    let mut file = tokio::fs::File::from_std(handle);

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to write upload: {e}")))?;
        size += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to write upload: {e}")))?;

    debug!(path = %temp.path().display(), size, "Saved upload");
    Ok((temp, size))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(err.body_text())
    }
}
