//! Error types for gesture recognition.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors raised by the geometric primitives.
///
/// These signal a programming-contract violation. Callers skip the current
/// frame and carry on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VisionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl VisionError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
