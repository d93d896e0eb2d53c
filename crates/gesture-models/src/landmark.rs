//! Hand landmark types.
//!
//! Landmarks follow the 21-point hand topology used by common hand-pose
//! estimators. Coordinates are normalized to the camera frame, so a point
//! inside the image lies in `[0, 1]` on both axes.
//!
//! # Landmark layout
//!
//! - 0: Wrist
//! - 1-4: Thumb (CMC, MCP, IP, tip)
//! - 5-8: Index finger (MCP, PIP, DIP, tip)
//! - 9-12: Middle finger
//! - 13-16: Ring finger
//! - 17-20: Pinky

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of landmarks in a complete hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// A normalized 2-D landmark position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Landmark {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Anatomical landmark indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Errors raised when validating an externally supplied frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("expected 0 or {expected} landmarks, got {found}")]
    WrongLandmarkCount { expected: usize, found: usize },

    #[error("landmark {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// All landmarks of the tracked hand in one video frame.
///
/// An empty frame means no hand was detected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct LandmarkFrame {
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    /// Create a frame from landmark positions.
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// A frame with no hand in view.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the frame carries a complete hand.
    pub fn has_hand(&self) -> bool {
        self.landmarks.len() == HAND_LANDMARK_COUNT
    }

    /// Look up a landmark by its anatomical name.
    pub fn get(&self, landmark: HandLandmark) -> Option<Landmark> {
        self.landmarks.get(landmark.index()).copied()
    }

    /// Check a frame received from outside the process.
    pub fn validate(&self) -> Result<(), FrameError> {
        let found = self.landmarks.len();
        if found != 0 && found != HAND_LANDMARK_COUNT {
            return Err(FrameError::WrongLandmarkCount {
                expected: HAND_LANDMARK_COUNT,
                found,
            });
        }
        if let Some(index) = self.landmarks.iter().position(|lm| !lm.is_finite()) {
            return Err(FrameError::NonFiniteCoordinate { index });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_deserializes_from_estimator_json() {
        let points: Vec<String> = (0..21)
            .map(|i| format!("{{\"x\":{},\"y\":0.5}}", i as f64 / 100.0))
            .collect();
        let json = format!("{{\"landmarks\":[{}]}}", points.join(","));

        let frame: LandmarkFrame = serde_json::from_str(&json).unwrap();
        assert!(frame.has_hand());
        assert_eq!(frame.get(HandLandmark::IndexTip), Some(Landmark::new(0.08, 0.5)));
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_missing_landmarks_field_is_empty_frame() {
        let frame: LandmarkFrame = serde_json::from_str("{}").unwrap();
        assert!(!frame.has_hand());
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_partial_hand() {
        let frame = LandmarkFrame::new(vec![Landmark::new(0.1, 0.1); 5]);
        assert_eq!(
            frame.validate(),
            Err(FrameError::WrongLandmarkCount { expected: 21, found: 5 })
        );
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut landmarks = vec![Landmark::new(0.5, 0.5); HAND_LANDMARK_COUNT];
        landmarks[7].y = f64::NAN;
        let frame = LandmarkFrame::new(landmarks);
        assert_eq!(frame.validate(), Err(FrameError::NonFiniteCoordinate { index: 7 }));
    }
}
