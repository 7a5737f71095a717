//! Source video inspection with FFprobe.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use vcrop_models::SourceDimensions;

use crate::error::{MediaError, MediaResult};

/// What the crop path needs to know about an upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Seconds, 0 when the container does not report it
    pub duration: f64,
    pub codec: String,
}

impl VideoInfo {
    /// Frame dimensions for crop resolution.
    pub fn dimensions(&self) -> MediaResult<SourceDimensions> {
        SourceDimensions::try_new(self.width, self.height).ok_or_else(|| {
            MediaError::invalid_video(format!(
                "Video stream reports invalid dimensions {}x{}",
                self.width, self.height
            ))
        })
    }
}

/// Only the entries requested with `-show_entries` are present.
#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl ProbeStream {
    fn frame_size(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Read frame size, duration and codec of `path`.
pub async fn probe_video(ffprobe: impl AsRef<Path>, path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let ffprobe = ffprobe.as_ref();
    let path = path.as_ref();

    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=codec_type,codec_name,width,height:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MediaError::FfprobeNotFound(ffprobe.display().to_string()),
            _ => MediaError::Io(e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe exited with non-zero status".to_string(),
            stderr: (!stderr.is_empty()).then_some(stderr),
        });
    }

    parse_report(&output.stdout)
}

fn parse_report(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let report: ProbeReport = serde_json::from_slice(stdout)?;

    // Prefer a video stream, but accept any stream that carries a frame size
    let stream = report
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video") && s.frame_size().is_some())
        .or_else(|| report.streams.iter().find(|s| s.frame_size().is_some()))
        .ok_or_else(|| MediaError::invalid_video("No video stream found"))?;
    let (width, height) = stream.frame_size().unwrap_or_default();

    let duration = report
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(0.0);

    Ok(VideoInfo {
        width,
        height,
        duration,
        codec: stream.codec_name.clone().unwrap_or_default(),
    })
}
