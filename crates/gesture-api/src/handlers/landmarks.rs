//! Landmark push endpoint.
//!
//! An external hand-pose estimator posts one frame per captured image; each
//! frame is fanned out to every running session.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use gesture_models::LandmarkFrame;
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Push response.
#[derive(Debug, Serialize)]
pub struct PushResponse {
    /// Sessions that received the frame
    pub delivered: usize,
}

/// Accept one landmark frame.
pub async fn push_landmarks(
    State(state): State<AppState>,
    Json(frame): Json<LandmarkFrame>,
) -> ApiResult<(StatusCode, Json<PushResponse>)> {
    frame
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let delivered = state.push_hub.publish(frame);
    metrics::record_frame_pushed();
    debug!(delivered, "Landmark frame pushed");

    Ok((StatusCode::ACCEPTED, Json(PushResponse { delivered })))
}
