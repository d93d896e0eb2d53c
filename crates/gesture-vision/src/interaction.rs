//! Drag interaction state machine.
//!
//! Turns a classified gesture into desktop actions. The only state carried
//! between frames is whether the left button is currently held for a drag.

use gesture_models::{DesktopAction, Gesture, HandLandmark, Landmark, LandmarkFrame, MouseButton};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::Classification;

/// Target screen size for pointer mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Map a normalized landmark to screen pixels.
    ///
    /// The vertical axis only spans the top half of the screen: `y` is
    /// halved before scaling. Fractions are truncated toward zero.
    pub fn map_pointer(&self, landmark: Landmark) -> (i32, i32) {
        let x = landmark.x * f64::from(self.width);
        let y = landmark.y / 2.0 * f64::from(self.height);
        (x as i32, y as i32)
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// Drag engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// Outcome of feeding one gesture to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub actions: Vec<DesktopAction>,
    pub next: DragState,
}

/// Per-session interaction state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    drag: DragState,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag == DragState::Dragging
    }

    /// Compute the actions and next state for a classified frame without
    /// changing `self`.
    pub fn step(
        &self,
        classification: &Classification,
        frame: &LandmarkFrame,
        screen: ScreenGeometry,
    ) -> Transition {
        let pointer = || {
            frame
                .get(HandLandmark::IndexTip)
                .map(|tip| {
                    let (x, y) = screen.map_pointer(tip);
                    DesktopAction::move_to(x, y)
                })
        };

        let (actions, next): (Vec<DesktopAction>, DragState) =
            match (classification.gesture, self.drag) {
                (Gesture::None, drag) => (Vec::new(), drag),
                (Gesture::Move, drag) => (pointer().into_iter().collect(), drag),
                (Gesture::LeftClick, drag) => (vec![DesktopAction::click(MouseButton::Left)], drag),
                (Gesture::RightClick, drag) => {
                    (vec![DesktopAction::click(MouseButton::Right)], drag)
                }
                (Gesture::DoubleClick, drag) => (vec![DesktopAction::DoubleClick], drag),
                (Gesture::Screenshot, drag) => (vec![DesktopAction::Screenshot], drag),
                (Gesture::DragStart | Gesture::Dragging, DragState::Idle) => {
                    let mut actions = vec![DesktopAction::press(MouseButton::Left)];
                    actions.extend(pointer());
                    (actions, DragState::Dragging)
                }
                (Gesture::DragStart | Gesture::Dragging, DragState::Dragging) => {
                    (pointer().into_iter().collect(), DragState::Dragging)
                }
                (Gesture::Drop, DragState::Dragging) => {
                    (vec![DesktopAction::release(MouseButton::Left)], DragState::Idle)
                }
                (Gesture::Drop, DragState::Idle) => (Vec::new(), DragState::Idle),
            };

        Transition { actions, next }
    }

    /// Feed a classified frame and move to the next state.
    pub fn apply(
        &mut self,
        classification: &Classification,
        frame: &LandmarkFrame,
        screen: ScreenGeometry,
    ) -> Vec<DesktopAction> {
        let transition = self.step(classification, frame, screen);
        if transition.next != self.drag {
            debug!(from = ?self.drag, to = ?transition.next, "Drag state changed");
        }
        self.drag = transition.next;
        transition.actions
    }

    /// End of session. Releases a held drag and returns to idle.
    ///
    /// Returns the forced button-up, if one was needed. Calling this again
    /// afterwards returns `None`.
    pub fn terminate(&mut self) -> Option<DesktopAction> {
        match std::mem::take(&mut self.drag) {
            DragState::Dragging => Some(DesktopAction::release(MouseButton::Left)),
            DragState::Idle => None,
        }
    }
}
