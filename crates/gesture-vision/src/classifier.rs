//! Gesture classification.
//!
//! A frame is reduced to three measurements (index curl angle, middle curl
//! angle, thumb-to-index-base distance) and then matched against a fixed,
//! ordered list of rules. The first rule that holds decides the gesture.
//! Several rules can hold at once (a tight pinch with an extended index
//! finger satisfies both [`Rule::Move`] and [`Rule::Pinch`]); the order is
//! what makes the result unambiguous.

use gesture_models::{Gesture, HandLandmark, Landmark, HAND_LANDMARK_COUNT};
use serde::Serialize;

use crate::error::VisionResult;
use crate::geometry::{angle, distance};

/// Decision boundaries. Angles in degrees, distances in scaled units.
pub mod thresholds {
    /// Below this a finger counts as curled.
    pub const CURLED_MAX_DEG: f64 = 50.0;
    /// Above this a finger counts as extended.
    pub const EXTENDED_MIN_DEG: f64 = 90.0;
    /// Boundary between thumb near / far from the index base.
    pub const THUMB_NEAR: f64 = 50.0;
    /// Below this the thumb and index base are pinched together.
    pub const PINCH_MAX: f64 = 30.0;
}

use thresholds::{CURLED_MAX_DEG, EXTENDED_MIN_DEG, PINCH_MAX, THUMB_NEAR};

/// Per-frame hand measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurements {
    /// Angle at the index PIP joint
    pub angle_index: f64,
    /// Angle at the middle PIP joint
    pub angle_middle: f64,
    /// Scaled distance from thumb tip to index MCP
    pub thumb_index_distance: f64,
}

impl Measurements {
    /// Measure a landmark list. Returns `None` unless it holds a full hand.
    pub fn from_landmarks(landmarks: &[Landmark]) -> VisionResult<Option<Self>> {
        if landmarks.len() != HAND_LANDMARK_COUNT {
            return Ok(None);
        }
        let at = |lm: HandLandmark| landmarks[lm.index()];

        let angle_index = angle(
            at(HandLandmark::IndexMcp),
            at(HandLandmark::IndexPip),
            at(HandLandmark::IndexTip),
        );
        let angle_middle = angle(
            at(HandLandmark::MiddleMcp),
            at(HandLandmark::MiddlePip),
            at(HandLandmark::MiddleTip),
        );
        let thumb_index_distance =
            distance(&[at(HandLandmark::ThumbTip), at(HandLandmark::IndexMcp)])?;

        Ok(Some(Self {
            angle_index,
            angle_middle,
            thumb_index_distance,
        }))
    }

    fn index_curled(&self) -> bool {
        self.angle_index < CURLED_MAX_DEG
    }

    fn index_extended(&self) -> bool {
        self.angle_index > EXTENDED_MIN_DEG
    }

    fn middle_curled(&self) -> bool {
        self.angle_middle < CURLED_MAX_DEG
    }

    fn middle_extended(&self) -> bool {
        self.angle_middle > EXTENDED_MIN_DEG
    }

    fn thumb_near(&self) -> bool {
        self.thumb_index_distance < THUMB_NEAR
    }

    fn thumb_far(&self) -> bool {
        self.thumb_index_distance > THUMB_NEAR
    }

    fn pinched(&self) -> bool {
        self.thumb_index_distance < PINCH_MAX
    }
}

/// One guarded classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Move,
    LeftClick,
    RightClick,
    DoubleClick,
    Screenshot,
    Pinch,
    Drop,
}

impl Rule {
    /// Evaluation order. Earlier rules win.
    pub const ORDER: [Rule; 7] = [
        Rule::Move,
        Rule::LeftClick,
        Rule::RightClick,
        Rule::DoubleClick,
        Rule::Screenshot,
        Rule::Pinch,
        Rule::Drop,
    ];

    /// Whether this rule's condition holds for the measurements.
    pub fn holds(self, m: &Measurements, dragging: bool) -> bool {
        match self {
            Rule::Move => m.thumb_near() && m.index_extended(),
            Rule::LeftClick => m.index_curled() && m.middle_extended() && m.thumb_far(),
            Rule::RightClick => m.middle_curled() && m.index_extended() && m.thumb_far(),
            Rule::DoubleClick => m.index_curled() && m.middle_curled() && m.thumb_far(),
            Rule::Screenshot => m.index_curled() && m.middle_curled() && m.thumb_near(),
            Rule::Pinch => m.pinched(),
            Rule::Drop => m.thumb_far() && dragging,
        }
    }

    /// Gesture produced when this rule fires.
    pub fn gesture(self, dragging: bool) -> Gesture {
        match self {
            Rule::Move => Gesture::Move,
            Rule::LeftClick => Gesture::LeftClick,
            Rule::RightClick => Gesture::RightClick,
            Rule::DoubleClick => Gesture::DoubleClick,
            Rule::Screenshot => Gesture::Screenshot,
            Rule::Pinch if dragging => Gesture::Dragging,
            Rule::Pinch => Gesture::DragStart,
            Rule::Drop => Gesture::Drop,
        }
    }

    /// Every rule that holds, in evaluation order. More than one entry means
    /// the order decided the gesture.
    pub fn matching(m: &Measurements, dragging: bool) -> Vec<Rule> {
        Self::ORDER
            .into_iter()
            .filter(|rule| rule.holds(m, dragging))
            .collect()
    }
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub gesture: Gesture,
    /// The rule that fired, if any
    pub rule: Option<Rule>,
    /// Absent when the frame had no hand
    pub measurements: Option<Measurements>,
}

impl Classification {
    /// Classification of a frame without a hand.
    pub fn no_hand() -> Self {
        Self {
            gesture: Gesture::None,
            rule: None,
            measurements: None,
        }
    }

    pub fn thumb_index_distance(&self) -> Option<f64> {
        self.measurements.map(|m| m.thumb_index_distance)
    }
}

/// Classify one landmark list given the current drag state.
///
/// Lists that are not exactly one hand long classify as [`Gesture::None`].
pub fn classify(landmarks: &[Landmark], dragging: bool) -> VisionResult<Classification> {
    let Some(measurements) = Measurements::from_landmarks(landmarks)? else {
        return Ok(Classification::no_hand());
    };

    let rule = Rule::ORDER
        .into_iter()
        .find(|rule| rule.holds(&measurements, dragging));

    Ok(Classification {
        gesture: rule.map_or(Gesture::None, |r| r.gesture(dragging)),
        rule,
        measurements: Some(measurements),
    })
}
