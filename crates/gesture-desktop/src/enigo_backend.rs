//! OS pointer injection via enigo.

use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use gesture_models::MouseButton;

use crate::backend::PointerBackend;
use crate::error::{DesktopError, DesktopResult};

/// Drives the real system pointer.
pub struct EnigoBackend {
    enigo: Enigo,
}

impl EnigoBackend {
    /// Connect to the windowing system.
    pub fn new() -> DesktopResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| DesktopError::backend(format!("failed to initialize enigo: {e:?}")))?;
        Ok(Self { enigo })
    }

    fn button(&mut self, button: MouseButton, direction: Direction) -> DesktopResult<()> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
        };
        self.enigo
            .button(button, direction)
            .map_err(|e| DesktopError::backend(format!("{e:?}")))
    }
}

impl PointerBackend for EnigoBackend {
    fn name(&self) -> &'static str {
        "enigo"
    }

    fn move_to(&mut self, x: i32, y: i32) -> DesktopResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| DesktopError::backend(format!("{e:?}")))
    }

    fn press(&mut self, button: MouseButton) -> DesktopResult<()> {
        self.button(button, Direction::Press)
    }

    fn release(&mut self, button: MouseButton) -> DesktopResult<()> {
        self.button(button, Direction::Release)
    }

    fn display_size(&self) -> Option<(u32, u32)> {
        let (width, height) = self.enigo.main_display().ok()?;
        Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
    }
}
