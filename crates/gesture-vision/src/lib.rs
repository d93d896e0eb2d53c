//! Gesture recognition core.
//!
//! This crate turns one frame of hand landmarks into a single gesture and
//! turns that gesture into desktop actions:
//! - [`geometry`]: curl angles and scaled distances on normalized points
//! - [`classifier`]: ordered rule list mapping measurements to a [`Gesture`]
//! - [`interaction`]: drag state machine and pointer mapping
//!
//! Everything here is synchronous and free of I/O.
//!
//! [`Gesture`]: gesture_models::Gesture

pub mod classifier;
pub mod error;
pub mod geometry;
pub mod interaction;

pub use classifier::{classify, Classification, Measurements, Rule};
pub use error::{VisionError, VisionResult};
pub use geometry::{angle, distance, DISTANCE_SCALE};
pub use interaction::{DragState, InteractionState, ScreenGeometry, Transition};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
