//! Gesture labels.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A classified hand gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    /// No recognizable gesture (or no hand)
    #[default]
    None,
    /// Cursor tracking pose
    Move,
    LeftClick,
    RightClick,
    DoubleClick,
    Screenshot,
    /// Pinch detected while no drag is engaged
    DragStart,
    /// Pinch held while a drag is engaged
    Dragging,
    /// Pinch released while a drag is engaged
    Drop,
}

impl Gesture {
    pub const ALL: [Gesture; 9] = [
        Gesture::None,
        Gesture::Move,
        Gesture::LeftClick,
        Gesture::RightClick,
        Gesture::DoubleClick,
        Gesture::Screenshot,
        Gesture::DragStart,
        Gesture::Dragging,
        Gesture::Drop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::None => "none",
            Gesture::Move => "move",
            Gesture::LeftClick => "left_click",
            Gesture::RightClick => "right_click",
            Gesture::DoubleClick => "double_click",
            Gesture::Screenshot => "screenshot",
            Gesture::DragStart => "drag_start",
            Gesture::Dragging => "dragging",
            Gesture::Drop => "drop",
        }
    }

    /// Status string reported to the client for this gesture.
    pub fn status_label(&self) -> &'static str {
        match self {
            Gesture::None => "No gesture detected",
            Gesture::Move => "Moving cursor",
            Gesture::LeftClick => "Left click",
            Gesture::RightClick => "Right click",
            Gesture::DoubleClick => "Double click",
            Gesture::Screenshot => "Screenshot taken",
            Gesture::DragStart | Gesture::Dragging => "Dragging",
            Gesture::Drop => "Dropped",
        }
    }

    /// True for the pinch gestures that keep a drag engaged.
    pub fn is_pinch(&self) -> bool {
        matches!(self, Gesture::DragStart | Gesture::Dragging)
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
