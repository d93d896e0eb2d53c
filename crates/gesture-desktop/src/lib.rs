//! Desktop output for the gesture control server.
//!
//! This crate provides:
//! - [`PointerBackend`] implementations (dry-run, recording, and OS injection
//!   behind the `enigo` feature)
//! - Screen grabbing through an external tool and PNG persistence
//! - [`DesktopHandle`], a single actor thread that performs every action in
//!   arrival order so concurrent sessions never drive the devices at once

pub mod actor;
pub mod backend;
#[cfg(feature = "enigo")]
pub mod enigo_backend;
pub mod error;
pub mod screenshot;

pub use actor::{Desktop, DesktopHandle};
pub use backend::{DryRunBackend, PointerBackend, PointerOp, RecordingBackend};
#[cfg(feature = "enigo")]
pub use enigo_backend::EnigoBackend;
pub use error::{DesktopError, DesktopResult};
pub use screenshot::{CommandGrabber, ScreenGrabber, ScreenshotService, ScreenshotWriter};
