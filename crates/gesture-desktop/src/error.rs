//! Error types for desktop output.

use thiserror::Error;

/// Result type for desktop operations.
pub type DesktopResult<T> = Result<T, DesktopError>;

/// Errors that can occur while driving the desktop.
#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("Pointer backend error: {0}")]
    Backend(String),

    #[error("No screen grabber configured")]
    ScreenshotUnavailable,

    #[error("Screenshot tool not found: {0}")]
    ToolNotFound(String),

    #[error("Screenshot command failed: {message}")]
    CommandFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Desktop actor stopped")]
    ActorStopped,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DesktopError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
