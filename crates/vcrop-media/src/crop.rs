//! Crop job execution.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};
use vcrop_models::{CropRectangle, EncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::filters::crop_filter;

/// FFmpeg duration histogram name.
pub const FFMPEG_DURATION_SECONDS: &str = "vcrop_ffmpeg_duration_seconds";

/// Build the FFmpeg command that crops `input` to `rect` and re-encodes it
/// as MP4 into `output`.
pub fn build_crop_command(
    input: &Path,
    output: &Path,
    rect: &CropRectangle,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .arg("-vf", crop_filter(rect))
        .args(encoding.output_options())
        .arg("-f", "mp4")
}

/// Crop a video with FFmpeg.
///
/// `duration_secs` is only used to log progress as a percentage.
pub async fn crop_video(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    rect: &CropRectangle,
    encoding: &EncodingConfig,
    duration_secs: f64,
) -> MediaResult<()> {
    let cmd = build_crop_command(input, output, rect, encoding);
    let total_ms = (duration_secs * 1000.0) as i64;

    info!(
        input = %input.display(),
        output = %output.display(),
        "Cropping to {}x{} at ({}, {})",
        rect.width, rect.height, rect.x, rect.y
    );

    let start = Instant::now();
    let result = runner
        .run(&cmd, move |progress| {
            debug!(
                frame = progress.frame,
                speed = progress.speed,
                "Crop progress {:.1}%",
                progress.percentage(total_ms)
            );
        })
        .await;

    let elapsed = start.elapsed().as_secs_f64();
    let outcome = if result.is_ok() { "success" } else { "failed" };
    metrics::histogram!(FFMPEG_DURATION_SECONDS, "outcome" => outcome).record(elapsed);

    if result.is_ok() {
        info!("Crop finished in {:.2}s: {}", elapsed, output.display());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_crop_command() {
        let rect = CropRectangle {
            x: 0,
            y: 100,
            width: 1920,
            height: 880,
        };
        let args = build_crop_command(
            Path::new("uploads/in.mov"),
            Path::new("output/cropped.mp4"),
            &rect,
            &EncodingConfig::default(),
        )
        .to_args();

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "crop=1920:880:0:100");
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));

        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "mp4");
        assert_eq!(args.last().map(String::as_str), Some("output/cropped.mp4"));
    }
}
