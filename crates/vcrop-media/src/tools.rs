//! Location of the external FFmpeg/FFprobe binaries.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Resolved paths of the binaries the crop pipeline shells out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl MediaTools {
    /// Use the given binaries as-is, without checking that they exist.
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Resolve both binaries, preferring explicit overrides and falling back
    /// to a `PATH` lookup.
    pub fn discover(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> MediaResult<Self> {
        let ffmpeg = which::which(ffmpeg.unwrap_or(Path::new("ffmpeg")))
            .map_err(|e| MediaError::FfmpegNotFound(e.to_string()))?;
        let ffprobe = which::which(ffprobe.unwrap_or(Path::new("ffprobe")))
            .map_err(|e| MediaError::FfprobeNotFound(e.to_string()))?;

        info!("FFmpeg path: {}", ffmpeg.display());
        info!("FFprobe path: {}", ffprobe.display());

        Ok(Self { ffmpeg, ffprobe })
    }

    /// Check that both binaries are still present and executable.
    pub fn check(&self) -> MediaResult<()> {
        which::which(&self.ffmpeg).map_err(|e| MediaError::FfmpegNotFound(e.to_string()))?;
        which::which(&self.ffprobe).map_err(|e| MediaError::FfprobeNotFound(e.to_string()))?;
        Ok(())
    }
}

impl Default for MediaTools {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}
