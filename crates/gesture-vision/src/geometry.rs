//! Geometric primitives on normalized landmark coordinates.

use gesture_models::Landmark;

use crate::error::{VisionError, VisionResult};

/// Factor applied to normalized distances so thresholds read like pixels.
pub const DISTANCE_SCALE: f64 = 1000.0;

/// Angle in degrees at vertex `b` between the rays `b -> a` and `b -> c`.
///
/// The result is always in `[0, 180]`. Coincident points give 0.
pub fn angle(a: Landmark, b: Landmark, c: Landmark) -> f64 {
    let (ux, uy) = (a.x - b.x, a.y - b.y);
    let (vx, vy) = (c.x - b.x, c.y - b.y);

    let cross = ux * vy - uy * vx;
    let dot = ux * vx + uy * vy;

    cross.abs().atan2(dot).to_degrees()
}

/// Scaled Euclidean distance between exactly two points.
///
/// The normalized distance is mapped onto `[0, DISTANCE_SCALE]` and clamped,
/// so points further apart than one frame width saturate at the maximum.
pub fn distance(points: &[Landmark]) -> VisionResult<f64> {
    let [p, q] = points else {
        return Err(VisionError::invalid_input(format!(
            "distance needs exactly 2 points, got {}",
            points.len()
        )));
    };

    let raw = (q.x - p.x).hypot(q.y - p.y);
    Ok((raw * DISTANCE_SCALE).clamp(0.0, DISTANCE_SCALE))
}
