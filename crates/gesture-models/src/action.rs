//! Desktop actions emitted by the interaction state machine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
        }
    }
}

/// A single effect on the host desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DesktopAction {
    /// Move the pointer to absolute screen coordinates
    MoveTo { x: i32, y: i32 },
    /// Hold a button down
    Press { button: MouseButton },
    /// Let a held button go
    Release { button: MouseButton },
    /// Press and release
    Click { button: MouseButton },
    /// Two left clicks
    DoubleClick,
    /// Capture the screen
    Screenshot,
}

impl DesktopAction {
    pub fn move_to(x: i32, y: i32) -> Self {
        DesktopAction::MoveTo { x, y }
    }

    pub fn press(button: MouseButton) -> Self {
        DesktopAction::Press { button }
    }

    pub fn release(button: MouseButton) -> Self {
        DesktopAction::Release { button }
    }

    pub fn click(button: MouseButton) -> Self {
        DesktopAction::Click { button }
    }

    /// Metric/log label.
    pub fn kind(&self) -> &'static str {
        match self {
            DesktopAction::MoveTo { .. } => "move_to",
            DesktopAction::Press { .. } => "press",
            DesktopAction::Release { .. } => "release",
            DesktopAction::Click { .. } => "click",
            DesktopAction::DoubleClick => "double_click",
            DesktopAction::Screenshot => "screenshot",
        }
    }
}
