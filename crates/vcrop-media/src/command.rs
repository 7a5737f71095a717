//! FFmpeg invocation.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{FfmpegProgress, ProgressLine, ProgressParser};

/// Non-progress stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Options placed before the input: overwrite, quiet logging and progress
/// blocks on stderr.
const GLOBAL_ARGS: &[&str] = &["-hide_banner", "-nostdin", "-y", "-v", "error", "-progress", "pipe:2"];

/// One FFmpeg transcode from a single input to a single output.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    output_args: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    /// Append an output option and its value.
    pub fn arg(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.output_args.push(flag.to_string());
        self.output_args.push(value.into());
        self
    }

    /// Append several output options.
    pub fn args<S: Into<String>>(self, options: impl IntoIterator<Item = (&'static str, S)>) -> Self {
        options
            .into_iter()
            .fold(self, |cmd, (flag, value)| cmd.arg(flag, value))
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = GLOBAL_ARGS.iter().map(|a| a.to_string()).collect();
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Last lines of FFmpeg diagnostics, for the error report.
#[derive(Debug, Default)]
struct StderrTail(VecDeque<String>);

impl StderrTail {
    fn push(&mut self, line: String) {
        if line.trim().is_empty() {
            return;
        }
        if self.0.len() == STDERR_TAIL_LINES {
            self.0.pop_front();
        }
        self.0.push_back(line);
    }

    fn into_text(self) -> Option<String> {
        (!self.0.is_empty()).then(|| Vec::from(self.0).join("\n"))
    }
}

/// Runs [`FfmpegCommand`]s with an optional wall-clock limit.
///
/// The child is killed when the future driving it is dropped, so an aborted
/// request does not leave an encoder running.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Zero disables the limit.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    /// Run `cmd` to completion, passing each progress report to `on_progress`.
    pub async fn run<F>(&self, cmd: &FfmpegCommand, mut on_progress: F) -> MediaResult<()>
    where
        F: FnMut(&FfmpegProgress) + Send + 'static,
    {
        let args = cmd.to_args();
        debug!("Running FFmpeg: {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    MediaError::FfmpegNotFound(self.binary.display().to_string())
                }
                _ => MediaError::Io(e),
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("FFmpeg stderr not captured", None, None))?;

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut parser = ProgressParser::default();
            let mut tail = StderrTail::default();
            while let Ok(Some(line)) = lines.next_line().await {
                match parser.feed(&line) {
                    ProgressLine::Report(progress) => on_progress(&progress),
                    ProgressLine::Partial => {}
                    ProgressLine::Other => tail.push(line),
                }
            }
            tail
        });

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("FFmpeg timed out after {}s, killing process", limit.as_secs());
                    let _ = child.kill().await;
                    return Err(MediaError::Timeout(limit.as_secs()));
                }
            },
            None => child.wait().await?,
        };

        let tail = reader.await.unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                tail.into_text(),
                status.code(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_order() {
        let args = FfmpegCommand::new("input.mp4", "output.mp4")
            .arg("-vf", "crop=800:600:500:200")
            .args([("-c:v", "libx264")])
            .to_args();

        assert_eq!(&args[..GLOBAL_ARGS.len()], GLOBAL_ARGS);
        assert_eq!(args.last().map(String::as_str), Some("output.mp4"));

        let input = args.iter().position(|a| a == "-i").unwrap();
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[input + 1], "input.mp4");
        assert_eq!(args[vf + 1], "crop=800:600:500:200");
        assert!(input < vf, "filters belong after the input");
        assert_eq!(args[vf + 2..vf + 4], ["-c:v", "libx264"]);
    }

    #[test]
    fn test_zero_timeout_disables() {
        assert!(FfmpegRunner::new("ffmpeg").with_timeout(0).timeout.is_none());
        assert_eq!(
            FfmpegRunner::new("ffmpeg").with_timeout(30).timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let mut tail = StderrTail::default();
        assert!(StderrTail::default().into_text().is_none());
        for i in 0..STDERR_TAIL_LINES + 5 {
            tail.push(format!("line {i}"));
        }
        tail.push("   ".to_string());

        let text = tail.into_text().unwrap();
        assert_eq!(text.lines().count(), STDERR_TAIL_LINES);
        assert!(text.starts_with("line 5\n"));
        assert!(text.ends_with(&format!("line {}", STDERR_TAIL_LINES + 4)));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_found() {
        let runner = FfmpegRunner::new("/nonexistent/vcrop/ffmpeg");
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4");
        let err = runner.run(&cmd, |_| {}).await.unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound(_)));
    }
}
