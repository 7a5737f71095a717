//! Parsing of FFmpeg's `-progress` key=value stream.

/// A progress snapshot, emitted at the end of each `-progress` block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FfmpegProgress {
    pub frame: u64,
    /// Encoded output position in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed relative to realtime, 0 when FFmpeg reports N/A
    pub speed: f64,
    /// FFmpeg wrote `progress=end`
    pub done: bool,
}

impl FfmpegProgress {
    /// Share of `total_ms` encoded so far, capped at 100.
    pub fn percentage(&self, total_ms: i64) -> f64 {
        if total_ms <= 0 {
            return 0.0;
        }
        (self.out_time_ms as f64 * 100.0 / total_ms as f64).min(100.0)
    }
}

/// What a single stderr line turned out to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressLine {
    /// A block finished; carries the accumulated snapshot.
    Report(FfmpegProgress),
    /// A progress key that only updates the pending snapshot.
    Partial,
    /// Regular diagnostic output.
    Other,
}

/// Keys FFmpeg writes inside a progress block.
const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "stream_0_0_q",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// Accumulates `-progress` blocks from FFmpeg's stderr.
#[derive(Debug, Default)]
pub struct ProgressParser {
    pending: FfmpegProgress,
}

impl ProgressParser {
    pub fn feed(&mut self, line: &str) -> ProgressLine {
        let Some((key, value)) = line.trim().split_once('=') else {
            return ProgressLine::Other;
        };
        if !PROGRESS_KEYS.contains(&key) {
            return ProgressLine::Other;
        }

        match key {
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.pending.frame = frame;
                }
            }
            // Both carry microseconds in current FFmpeg releases
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.pending.out_time_ms = us / 1000;
                }
            }
            "speed" => {
                self.pending.speed = value
                    .trim()
                    .strip_suffix('x')
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0.0);
            }
            "progress" => {
                self.pending.done = value == "end";
                return ProgressLine::Report(self.pending);
            }
            _ => {}
        }
        ProgressLine::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_produces_report() {
        let mut parser = ProgressParser::default();
        for line in ["frame=48", "fps=24.0", "out_time_us=2000000", "speed=1.50x"] {
            assert_eq!(parser.feed(line), ProgressLine::Partial);
        }

        let ProgressLine::Report(progress) = parser.feed("progress=continue") else {
            panic!("expected a report");
        };
        assert_eq!(progress.frame, 48);
        assert_eq!(progress.out_time_ms, 2000);
        assert!((progress.speed - 1.5).abs() < 0.01);
        assert!(!progress.done);

        let ProgressLine::Report(progress) = parser.feed("progress=end") else {
            panic!("expected a report");
        };
        assert!(progress.done);
        assert_eq!(progress.frame, 48);
    }

    #[test]
    fn test_unavailable_speed_is_zero() {
        let mut parser = ProgressParser::default();
        parser.feed("speed=2x");
        parser.feed("speed=N/A");
        let ProgressLine::Report(progress) = parser.feed("progress=continue") else {
            panic!("expected a report");
        };
        assert_eq!(progress.speed, 0.0);
    }

    #[test]
    fn test_diagnostics_are_other() {
        let mut parser = ProgressParser::default();
        assert_eq!(
            parser.feed("[libx264 @ 0x55] width not divisible by 2 (641x480)"),
            ProgressLine::Other
        );
        assert_eq!(parser.feed("Error initializing output stream 0:0 --"), ProgressLine::Other);
        assert_eq!(parser.feed("key=value"), ProgressLine::Other);
    }

    #[test]
    fn test_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 5000,
            ..Default::default()
        };
        assert!((progress.percentage(10000) - 50.0).abs() < 0.01);
        assert_eq!(progress.percentage(4000), 100.0);
        assert_eq!(progress.percentage(0), 0.0);
    }
}
