//! Gesture control server.
//!
//! This crate provides:
//! - The WebSocket `start`/`stop` protocol with one status string per tick
//! - Per-connection detection sessions and their lifecycle
//! - Landmark frame sources (pushed over HTTP or replayed from a file)
//! - Health and Prometheus metrics endpoints

pub mod cancel;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod session;
pub mod source;
pub mod state;
pub mod ws;

pub use cancel::{cancel_pair, CancelHandle, CancelReason, CancelSignal};
pub use config::{ApiConfig, DesktopBackendKind, FrameSourceKind};
pub use error::{ApiError, ApiResult, CaptureError, CaptureResult, SessionError};
pub use registry::SessionRegistry;
pub use routes::create_router;
pub use session::{Session, SessionConfig, SessionEnd};
pub use source::{
    FrameSource, FrameSourceFactory, PushHub, PushSource, PushSourceFactory, ReplaySource,
    ReplaySourceFactory,
};
pub use state::AppState;
