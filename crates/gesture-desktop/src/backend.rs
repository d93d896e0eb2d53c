//! Pointer injection backends.

use std::sync::{Arc, Mutex, MutexGuard};

use gesture_models::MouseButton;
use tracing::info;

use crate::error::DesktopResult;

/// OS-level pointer control.
///
/// Backends are created and used on the desktop actor thread only, so they
/// need not be `Send`.
pub trait PointerBackend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Move the pointer to absolute screen coordinates.
    fn move_to(&mut self, x: i32, y: i32) -> DesktopResult<()>;

    fn press(&mut self, button: MouseButton) -> DesktopResult<()>;

    fn release(&mut self, button: MouseButton) -> DesktopResult<()>;

    /// Size of the main display, when the backend can tell.
    fn display_size(&self) -> Option<(u32, u32)> {
        None
    }
}

/// Logs every operation instead of touching the OS.
#[derive(Debug, Default)]
pub struct DryRunBackend;

impl PointerBackend for DryRunBackend {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn move_to(&mut self, x: i32, y: i32) -> DesktopResult<()> {
        info!(x, y, "[dry-run] move pointer");
        Ok(())
    }

    fn press(&mut self, button: MouseButton) -> DesktopResult<()> {
        info!(button = button.as_str(), "[dry-run] press");
        Ok(())
    }

    fn release(&mut self, button: MouseButton) -> DesktopResult<()> {
        info!(button = button.as_str(), "[dry-run] release");
        Ok(())
    }
}

/// A primitive pointer operation as seen by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOp {
    MoveTo(i32, i32),
    Press(MouseButton),
    Release(MouseButton),
}

/// Records operations into a shared log. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    ops: Arc<Mutex<Vec<PointerOp>>>,
    display: Option<(u32, u32)>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a display size from [`PointerBackend::display_size`].
    pub fn with_display(mut self, width: u32, height: u32) -> Self {
        self.display = Some((width, height));
        self
    }

    /// Snapshot of everything recorded so far.
    pub fn ops(&self) -> Vec<PointerOp> {
        self.lock().clone()
    }

    /// Number of recorded operations equal to `op`.
    pub fn count(&self, op: PointerOp) -> usize {
        self.lock().iter().filter(|o| **o == op).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PointerOp>> {
        self.ops.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PointerBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn move_to(&mut self, x: i32, y: i32) -> DesktopResult<()> {
        self.lock().push(PointerOp::MoveTo(x, y));
        Ok(())
    }

    fn press(&mut self, button: MouseButton) -> DesktopResult<()> {
        self.lock().push(PointerOp::Press(button));
        Ok(())
    }

    fn release(&mut self, button: MouseButton) -> DesktopResult<()> {
        self.lock().push(PointerOp::Release(button));
        Ok(())
    }

    fn display_size(&self) -> Option<(u32, u32)> {
        self.display
    }
}
