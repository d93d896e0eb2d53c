//! Prometheus metrics for the gesture server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "gesture_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "gesture_http_request_duration_seconds";

    // WebSocket metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "gesture_ws_connections_total";
    pub const WS_CONNECTIONS_ACTIVE: &str = "gesture_ws_connections_active";
    pub const WS_COMMANDS_RECEIVED: &str = "gesture_ws_commands_received_total";

    // Session metrics
    pub const SESSIONS_STARTED_TOTAL: &str = "gesture_sessions_started_total";
    pub const SESSIONS_ENDED_TOTAL: &str = "gesture_sessions_ended_total";
    pub const SESSION_DURATION_SECONDS: &str = "gesture_session_duration_seconds";

    // Detection metrics
    pub const TICKS_TOTAL: &str = "gesture_ticks_total";
    pub const TICKS_SKIPPED_TOTAL: &str = "gesture_ticks_skipped_total";
    pub const GESTURES_TOTAL: &str = "gesture_gestures_classified_total";
    pub const DESKTOP_ACTIONS_TOTAL: &str = "gesture_desktop_actions_total";
    pub const FRAMES_PUSHED_TOTAL: &str = "gesture_frames_pushed_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record WebSocket connection.
pub fn record_ws_connection() {
    counter!(names::WS_CONNECTIONS_TOTAL).increment(1);
}

/// Update active WebSocket connections gauge.
pub fn set_ws_active_connections(count: i64) {
    gauge!(names::WS_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record a client command (`start`, `stop`, or `unknown`).
pub fn record_ws_command(command: &str) {
    let labels = [("command", command.to_string())];
    counter!(names::WS_COMMANDS_RECEIVED, &labels).increment(1);
}

pub fn record_session_started() {
    counter!(names::SESSIONS_STARTED_TOTAL).increment(1);
}

/// Record session end with its termination reason.
pub fn record_session_ended(reason: &str, duration_secs: f64) {
    let labels = [("reason", reason.to_string())];
    counter!(names::SESSIONS_ENDED_TOTAL, &labels).increment(1);
    histogram!(names::SESSION_DURATION_SECONDS).record(duration_secs);
}

pub fn record_tick() {
    counter!(names::TICKS_TOTAL).increment(1);
}

pub fn record_tick_skipped() {
    counter!(names::TICKS_SKIPPED_TOTAL).increment(1);
}

pub fn record_gesture(gesture: &str) {
    let labels = [("gesture", gesture.to_string())];
    counter!(names::GESTURES_TOTAL, &labels).increment(1);
}

pub fn record_desktop_action(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::DESKTOP_ACTIONS_TOTAL, &labels).increment(1);
}

pub fn record_frame_pushed() {
    counter!(names::FRAMES_PUSHED_TOTAL).increment(1);
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
