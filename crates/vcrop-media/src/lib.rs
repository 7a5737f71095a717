//! FFmpeg CLI wrapper for video cropping.
//!
//! This crate provides:
//! - FFprobe-based source dimension probing
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Timeout and kill-on-drop handling for the FFmpeg child process
//! - The [`MediaBackend`] seam the HTTP layer talks to

pub mod backend;
pub mod command;
pub mod crop;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod tools;

pub use backend::{FfmpegBackend, MediaBackend};
pub use command::{FfmpegCommand, FfmpegRunner};
pub use crop::crop_video;
pub use error::{MediaError, MediaResult};
pub use filters::crop_filter;
pub use probe::{probe_video, VideoInfo};
pub use progress::{FfmpegProgress, ProgressParser};
pub use tools::MediaTools;
