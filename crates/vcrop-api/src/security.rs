//! Input sanitization for uploaded file names.
//!
//! Client-supplied names never reach the filesystem; only a vetted extension
//! is kept so FFprobe can use it as a container hint.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Extensions are short alphanumeric tokens (mp4, mov, webm, ...).
static EXTENSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,10}$").expect("valid extension regex"));

/// File suffix (including the dot) to use for an upload, derived from the
/// client's original file name. Returns an empty string when the name has no
/// usable extension.
pub fn upload_suffix(original_name: Option<&str>) -> String {
    let Some(name) = original_name else {
        return String::new();
    };

    // Browsers on Windows may send full paths
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && EXTENSION_PATTERN.is_match(ext) => {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Strip control characters and cap the length of a client-supplied name
/// before it is written to logs.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control())
        .take(200)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_suffix() {
        assert_eq!(upload_suffix(Some("holiday.MP4")), ".mp4");
        assert_eq!(upload_suffix(Some("clip.final.webm")), ".webm");
        assert_eq!(upload_suffix(Some("C:\\Users\\me\\movie.mov")), ".mov");
        assert_eq!(upload_suffix(Some("../../etc/passwd")), "");
        assert_eq!(upload_suffix(Some(".hidden")), "");
        assert_eq!(upload_suffix(Some("evil.mp4;rm -rf")), "");
        assert_eq!(upload_suffix(Some("noext")), "");
        assert_eq!(upload_suffix(None), "");
    }

    #[test]
    fn test_sanitize_for_log() {
        assert_eq!(sanitize_for_log("a\nb\tc.mp4"), "abc.mp4");
        assert_eq!(sanitize_for_log(&"x".repeat(500)).len(), 200);
    }
}
