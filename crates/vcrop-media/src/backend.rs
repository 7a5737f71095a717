//! Media backend abstraction used by the HTTP layer.

use std::path::Path;

use async_trait::async_trait;
use vcrop_models::{CropRectangle, EncodingConfig};

use crate::command::FfmpegRunner;
use crate::crop::crop_video;
use crate::error::MediaResult;
use crate::probe::{probe_video, VideoInfo};
use crate::tools::MediaTools;

/// Probing and cropping operations the crop endpoint needs.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Read the stream information of an uploaded file.
    async fn probe(&self, input: &Path) -> MediaResult<VideoInfo>;

    /// Crop `input` to `rect`, writing an MP4 to `output`.
    async fn crop(
        &self,
        input: &Path,
        output: &Path,
        rect: &CropRectangle,
        info: &VideoInfo,
    ) -> MediaResult<()>;

    /// Verify that the backend is able to process requests.
    async fn check(&self) -> MediaResult<()>;
}

/// [`MediaBackend`] backed by the FFmpeg and FFprobe command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    tools: MediaTools,
    encoding: EncodingConfig,
    runner: FfmpegRunner,
}

impl FfmpegBackend {
    pub fn new(tools: MediaTools, encoding: EncodingConfig, timeout_secs: u64) -> Self {
        let runner = FfmpegRunner::new(tools.ffmpeg.clone()).with_timeout(timeout_secs);
        Self {
            tools,
            encoding,
            runner,
        }
    }

    pub fn tools(&self) -> &MediaTools {
        &self.tools
    }

    pub fn encoding(&self) -> &EncodingConfig {
        &self.encoding
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe(&self, input: &Path) -> MediaResult<VideoInfo> {
        probe_video(&self.tools.ffprobe, input).await
    }

    async fn crop(
        &self,
        input: &Path,
        output: &Path,
        rect: &CropRectangle,
        info: &VideoInfo,
    ) -> MediaResult<()> {
        crop_video(&self.runner, input, output, rect, &self.encoding, info.duration).await
    }

    async fn check(&self) -> MediaResult<()> {
        self.tools.check()
    }
}
