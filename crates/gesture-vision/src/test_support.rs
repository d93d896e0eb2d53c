//! Synthetic hands for tests.

use gesture_models::{HandLandmark, Landmark, HAND_LANDMARK_COUNT};

use crate::geometry::DISTANCE_SCALE;

/// Position of the index fingertip produced by [`synthetic_hand`] for a
/// given index curl angle.
pub fn index_tip(angle_index: f64) -> Landmark {
    finger_tip(Landmark::new(0.5, 0.5), angle_index)
}

fn finger_tip(pip: Landmark, angle_deg: f64) -> Landmark {
    let theta = angle_deg.to_radians();
    Landmark::new(pip.x + 0.1 * theta.sin(), pip.y + 0.1 * theta.cos())
}

/// Build a 21-point hand with the requested curl angles and thumb distance.
///
/// Each finger's MCP sits 0.1 below its PIP, so the PIP angle equals the
/// rotation of the tip away from the MCP ray. The thumb tip is placed
/// `thumb_index_distance` scaled units to the right of the index MCP.
pub fn synthetic_hand(angle_index: f64, angle_middle: f64, thumb_index_distance: f64) -> Vec<Landmark> {
    let mut hand = vec![Landmark::new(0.5, 0.9); HAND_LANDMARK_COUNT];

    let index_mcp = Landmark::new(0.5, 0.6);
    let index_pip = Landmark::new(0.5, 0.5);
    hand[HandLandmark::IndexMcp.index()] = index_mcp;
    hand[HandLandmark::IndexPip.index()] = index_pip;
    hand[HandLandmark::IndexDip.index()] = index_pip;
    hand[HandLandmark::IndexTip.index()] = finger_tip(index_pip, angle_index);

    let middle_pip = Landmark::new(0.3, 0.5);
    hand[HandLandmark::MiddleMcp.index()] = Landmark::new(0.3, 0.6);
    hand[HandLandmark::MiddlePip.index()] = middle_pip;
    hand[HandLandmark::MiddleDip.index()] = middle_pip;
    hand[HandLandmark::MiddleTip.index()] = finger_tip(middle_pip, angle_middle);

    hand[HandLandmark::ThumbTip.index()] = Landmark::new(
        index_mcp.x + thumb_index_distance / DISTANCE_SCALE,
        index_mcp.y,
    );

    hand
}
