//! Application state.

use std::sync::Arc;

use anyhow::Context;
use vcrop_media::fs_utils::ensure_dir;
use vcrop_media::{FfmpegBackend, MediaBackend, MediaTools};

use crate::config::ApiConfig;
use crate::output::OutputStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub media: Arc<dyn MediaBackend>,
    pub outputs: OutputStore,
}

impl AppState {
    /// Create new application state backed by the FFmpeg CLI tools.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        ensure_dir(&config.upload_dir)
            .await
            .with_context(|| format!("Failed to create upload dir {}", config.upload_dir.display()))?;
        ensure_dir(&config.output_dir)
            .await
            .with_context(|| format!("Failed to create output dir {}", config.output_dir.display()))?;

        let tools = MediaTools::discover(config.ffmpeg_path.as_deref(), config.ffprobe_path.as_deref())
            .context("FFmpeg tools are not available")?;
        let backend = FfmpegBackend::new(tools, config.encoding.clone(), config.ffmpeg_timeout_secs);

        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create state around an existing media backend.
    pub fn with_backend(config: ApiConfig, media: Arc<dyn MediaBackend>) -> Self {
        let outputs = OutputStore::new(
            config.output_dir.clone(),
            config.upload_dir.clone(),
            config.public_base_url.clone(),
        )
        .trust_proxy_headers(config.trust_proxy_headers);
        Self {
            config,
            media,
            outputs,
        }
    }
}
