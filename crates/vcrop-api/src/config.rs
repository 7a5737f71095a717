//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;

use url::Url;
use vcrop_models::EncodingConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (per client IP)
    pub rate_limit_rps: u32,
    /// Max request body size (uploads included)
    pub max_body_size: usize,
    /// Where uploads are buffered while a request is in flight
    pub upload_dir: PathBuf,
    /// Where cropped videos are written and served from
    pub output_dir: PathBuf,
    /// Base URL for download links; derived from request headers when unset
    pub public_base_url: Option<Url>,
    /// Believe `X-Forwarded-*` and `X-Real-IP` from a reverse proxy
    pub trust_proxy_headers: bool,
    /// FFmpeg timeout in seconds (0 disables)
    pub ffmpeg_timeout_secs: u64,
    /// Explicit FFmpeg binary
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit FFprobe binary
    pub ffprobe_path: Option<PathBuf>,
    /// Output encoding settings
    pub encoding: EncodingConfig,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024 * 1024, // 1GB
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("output"),
            public_base_url: None,
            trust_proxy_headers: false,
            ffmpeg_timeout_secs: 3600,
            ffmpeg_path: None,
            ffprobe_path: None,
            encoding: EncodingConfig::default(),
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let encoding = EncodingConfig {
            codec: non_empty("VIDEO_CODEC").unwrap_or(defaults.encoding.codec),
            preset: non_empty("VIDEO_PRESET").unwrap_or(defaults.encoding.preset),
            crf: defaults.encoding.crf,
            audio_codec: non_empty("AUDIO_CODEC").unwrap_or(defaults.encoding.audio_codec),
            audio_bitrate: non_empty("AUDIO_BITRATE").unwrap_or(defaults.encoding.audio_bitrate),
        };
        let encoding = match parse_var(&lookup, "VIDEO_CRF") {
            Some(crf) => encoding.with_crf(crf),
            None => encoding,
        };

        Self {
            host: non_empty("API_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")
                .or_else(|| parse_var(&lookup, "API_PORT"))
                .unwrap_or(defaults.port),
            cors_origins: non_empty("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: parse_var(&lookup, "RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: parse_var(&lookup, "MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            upload_dir: non_empty("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            output_dir: non_empty("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            public_base_url: non_empty("PUBLIC_BASE_URL").and_then(|s| Url::parse(s.trim()).ok()),
            trust_proxy_headers: flag(&lookup, "TRUST_PROXY_HEADERS").unwrap_or(defaults.trust_proxy_headers),
            ffmpeg_timeout_secs: parse_var(&lookup, "FFMPEG_TIMEOUT_SECS").unwrap_or(defaults.ffmpeg_timeout_secs),
            ffmpeg_path: non_empty("FFMPEG_PATH").map(PathBuf::from),
            ffprobe_path: non_empty("FFPROBE_PATH").map(PathBuf::from),
            encoding,
            metrics_enabled: flag(&lookup, "METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
            environment: non_empty("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Production hides internal error details from clients.
    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

fn flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ApiConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 4000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.public_base_url.is_none());
        assert!(config.metrics_enabled);
        assert!(!config.trust_proxy_headers);
        assert!(!config.is_production());
    }

    #[test]
    fn test_port_precedence() {
        assert_eq!(config_from(&[("API_PORT", "8080")]).port, 8080);
        assert_eq!(config_from(&[("PORT", "9000"), ("API_PORT", "8080")]).port, 9000);
        assert_eq!(config_from(&[("PORT", "not-a-port")]).port, 4000);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("OUTPUT_DIR", "/srv/vcrop/out"),
            ("PUBLIC_BASE_URL", "https://media.example.com/"),
            ("VIDEO_CRF", "18"),
            ("VIDEO_PRESET", "medium"),
            ("METRICS_ENABLED", "false"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("ENVIRONMENT", "Production"),
            ("TRUST_PROXY_HEADERS", "TRUE"),
        ]);
        assert_eq!(config.output_dir, PathBuf::from("/srv/vcrop/out"));
        assert_eq!(
            config.public_base_url.as_ref().map(Url::as_str),
            Some("https://media.example.com/")
        );
        assert_eq!(config.encoding.crf, 18);
        assert_eq!(config.encoding.preset, "medium");
        assert!(!config.metrics_enabled);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert!(config.is_production());
        assert!(config.trust_proxy_headers);
    }

    #[test]
    fn test_environment_matching() {
        assert!(config_from(&[("ENVIRONMENT", " production ")]).is_production());
        assert!(config_from(&[("ENVIRONMENT", "PRODUCTION")]).is_production());
        assert!(!config_from(&[("ENVIRONMENT", "staging")]).is_production());
    }

    #[test]
    fn test_invalid_base_url_ignored() {
        let config = config_from(&[("PUBLIC_BASE_URL", "not a url")]);
        assert!(config.public_base_url.is_none());
    }
}
