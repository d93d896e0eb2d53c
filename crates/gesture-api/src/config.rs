//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// Where landmark frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSourceKind {
    /// Frames POSTed to `/api/landmarks` by an external estimator
    Push,
    /// JSON-lines file replayed once per session
    Replay(PathBuf),
}

impl FromStr for FrameSourceKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "push" {
            return Ok(FrameSourceKind::Push);
        }
        match s.strip_prefix("replay:") {
            Some(path) if !path.is_empty() => Ok(FrameSourceKind::Replay(PathBuf::from(path))),
            _ => Err(ApiError::config(format!(
                "unknown frame source '{}', expected 'push' or 'replay:<path>'",
                s
            ))),
        }
    }
}

/// Which pointer backend drives the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopBackendKind {
    /// Log actions only
    DryRun,
    /// Inject real pointer events (requires the `enigo` feature)
    Enigo,
}

impl FromStr for DesktopBackendKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dry-run" | "dry_run" | "dryrun" => Ok(DesktopBackendKind::DryRun),
            "enigo" => Ok(DesktopBackendKind::Enigo),
            other => Err(ApiError::config(format!(
                "unknown desktop backend '{}', expected 'dry-run' or 'enigo'",
                other
            ))),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Fixed delay after each detection tick
    pub tick_interval: Duration,
    /// Per-connection bound on queued status messages
    pub status_buffer_size: usize,
    /// Screen size override; otherwise the backend's display size is used
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    /// Landmark frame source
    pub frame_source: FrameSourceKind,
    /// Frames buffered per subscriber for pushed input
    pub push_buffer_size: usize,
    /// Pointer backend
    pub desktop_backend: DesktopBackendKind,
    /// Directory for saved screenshots
    pub screenshot_dir: PathBuf,
    /// External screenshot tool, e.g. `grim` or `screencapture -x`
    pub screenshot_command: Option<String>,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            tick_interval: Duration::from_millis(30),
            status_buffer_size: 32,
            screen_width: None,
            screen_height: None,
            frame_source: FrameSourceKind::Push,
            push_buffer_size: 8,
            desktop_backend: DesktopBackendKind::DryRun,
            screenshot_dir: PathBuf::from("."),
            screenshot_command: None,
            metrics_enabled: true,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// Unparseable numbers fall back to defaults. An unknown frame source or
    /// desktop backend is an error.
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let frame_source = match std::env::var("FRAME_SOURCE") {
            Ok(s) => s.parse()?,
            Err(_) => defaults.frame_source,
        };
        let desktop_backend = match std::env::var("DESKTOP_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => defaults.desktop_backend,
        };

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            tick_interval: env_parse("TICK_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            status_buffer_size: env_parse::<usize>("STATUS_BUFFER_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.status_buffer_size),
            screen_width: env_parse::<u32>("SCREEN_WIDTH").filter(|w| *w > 0),
            screen_height: env_parse::<u32>("SCREEN_HEIGHT").filter(|h| *h > 0),
            frame_source,
            push_buffer_size: env_parse::<usize>("PUSH_BUFFER_SIZE")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.push_buffer_size),
            desktop_backend,
            screenshot_dir: std::env::var("SCREENSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.screenshot_dir),
            screenshot_command: std::env::var("SCREENSHOT_COMMAND")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        })
    }

    /// Bind address string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
