//! Re-encoding settings for cropped output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Highest CRF libx264 accepts.
pub const MAX_CRF: u8 = 51;

/// H.264/AAC settings applied when writing a cropped MP4.
///
/// Cropping always re-encodes, so these settings decide output quality and
/// encode time. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EncodingConfig {
    pub codec: String,
    pub preset: String,
    /// Constant Rate Factor, lower is better quality
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

impl EncodingConfig {
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf.min(MAX_CRF);
        self
    }

    /// FFmpeg output options, as flag/value pairs in command-line order.
    pub fn output_options(&self) -> Vec<(&'static str, String)> {
        vec![
            ("-c:v", self.codec.clone()),
            ("-preset", self.preset.clone()),
            ("-crf", self.crf.to_string()),
            ("-c:a", self.audio_codec.clone()),
            ("-b:a", self.audio_bitrate.clone()),
            // Browsers can start playing the download before it completes
            ("-movflags", "+faststart".to_string()),
        ]
    }
}
