//! Naming, publishing and linking of cropped output files.

use std::path::{Path, PathBuf};

use axum::http::HeaderMap;
use chrono::Utc;
use url::Url;
use uuid::Uuid;

/// URL prefix the output directory is served under.
pub const OUTPUT_ROUTE: &str = "/output";

/// A reserved output file: encoded at `work_path`, published at `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// File name, also the last URL segment
    pub name: String,
    /// Where FFmpeg writes while encoding (not publicly served)
    pub work_path: PathBuf,
    /// Final location inside the served output directory
    pub path: PathBuf,
}

/// Allocates output file names and builds their download links.
#[derive(Debug, Clone)]
pub struct OutputStore {
    output_dir: PathBuf,
    work_dir: PathBuf,
    public_base_url: Option<Url>,
    trust_proxy_headers: bool,
}

impl OutputStore {
    pub fn new(output_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, public_base_url: Option<Url>) -> Self {
        Self {
            output_dir: output_dir.into(),
            work_dir: work_dir.into(),
            public_base_url,
            trust_proxy_headers: false,
        }
    }

    /// Derive links from `X-Forwarded-Proto`/`X-Forwarded-Host` when no
    /// public base URL is configured.
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Reserve a fresh, unguessable output name.
    pub fn allocate(&self) -> OutputFile {
        let token = Uuid::new_v4().simple().to_string();
        let name = format!("cropped-{}-{}.mp4", Utc::now().timestamp_millis(), &token[..8]);
        OutputFile {
            work_path: self.work_dir.join(format!(".{name}")),
            path: self.output_dir.join(&name),
            name,
        }
    }

    /// Absolute download URL for a published file.
    ///
    /// Uses the configured public base URL when present, otherwise the
    /// `Host` the client sent. Forwarding headers from a reverse proxy are
    /// only honoured when trusted.
    pub fn download_url(&self, headers: &HeaderMap, name: &str) -> String {
        let relative = format!("{}/{}", OUTPUT_ROUTE.trim_start_matches('/'), name);

        if let Some(base) = &self.public_base_url {
            let mut base = base.clone();
            if !base.path().ends_with('/') {
                let path = format!("{}/", base.path());
                base.set_path(&path);
            }
            if let Ok(url) = base.join(&relative) {
                return url.to_string();
            }
        }

        let forwarded = |name: &'static str| {
            self.trust_proxy_headers
                .then(|| first_header_value(headers, name))
                .flatten()
        };
        let scheme = forwarded("x-forwarded-proto").unwrap_or("http");
        let host = forwarded("x-forwarded-host")
            .or_else(|| first_header_value(headers, "host"))
            .unwrap_or("localhost");

        format!("{scheme}://{host}/{relative}")
    }
}

/// First comma-separated value of a header, trimmed.
fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn store(base: Option<&str>) -> OutputStore {
        OutputStore::new("output", "uploads", base.map(|b| Url::parse(b).unwrap()))
    }

    #[test]
    fn test_allocate_names() {
        let store = store(None);
        let a = store.allocate();
        let b = store.allocate();

        assert_ne!(a.name, b.name);
        assert!(a.name.starts_with("cropped-"));
        assert!(a.name.ends_with(".mp4"));
        assert_eq!(a.path, PathBuf::from("output").join(&a.name));
        assert!(a.work_path.starts_with("uploads"));
    }

    #[test]
    fn test_download_url_from_host() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("localhost:4000"));

        assert_eq!(
            store(None).download_url(&headers, "cropped-1.mp4"),
            "http://localhost:4000/output/cropped-1.mp4"
        );
    }

    fn proxied_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("10.0.0.5:4000"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("media.example.com, proxy"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers
    }

    #[test]
    fn test_download_url_behind_trusted_proxy() {
        assert_eq!(
            store(None)
                .trust_proxy_headers(true)
                .download_url(&proxied_headers(), "cropped-1.mp4"),
            "https://media.example.com/output/cropped-1.mp4"
        );
    }

    #[test]
    fn test_forwarded_headers_ignored_unless_trusted() {
        assert_eq!(
            store(None).download_url(&proxied_headers(), "cropped-1.mp4"),
            "http://10.0.0.5:4000/output/cropped-1.mp4"
        );
    }

    #[test]
    fn test_download_url_with_public_base() {
        let headers = HeaderMap::new();
        assert_eq!(
            store(Some("https://cdn.example.com/vcrop")).download_url(&headers, "cropped-1.mp4"),
            "https://cdn.example.com/vcrop/output/cropped-1.mp4"
        );
        assert_eq!(
            store(Some("https://cdn.example.com/")).download_url(&headers, "cropped-1.mp4"),
            "https://cdn.example.com/output/cropped-1.mp4"
        );
    }
}
