//! Shared data models for the gesture control server.
//!
//! This crate provides Serde-serializable types for:
//! - Hand landmarks and per-frame landmark lists
//! - Gesture labels and their status strings
//! - Desktop actions produced by the interaction state machine
//! - WebSocket commands and connection identifiers

pub mod action;
pub mod gesture;
pub mod landmark;
pub mod ws;

// Re-export common types
pub use action::{DesktopAction, MouseButton};
pub use gesture::Gesture;
pub use landmark::{FrameError, HandLandmark, Landmark, LandmarkFrame, HAND_LANDMARK_COUNT};
pub use ws::{ClientCommand, ConnectionId, SessionId};
