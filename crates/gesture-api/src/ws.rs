//! WebSocket gesture protocol.
//!
//! Clients send the plain-text commands `start` and `stop`. While a session
//! runs, the server sends one gesture status string per tick.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use gesture_models::{ClientCommand, ConnectionId};
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::metrics;
use crate::session::Session;
use crate::state::AppState;

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Longest unknown message echoed into logs.
const LOGGED_MESSAGE_MAX: usize = 64;

/// Open WebSocket connections in this process.
pub fn active_connections() -> i64 {
    ACTIVE_WS_CONNECTIONS.load(Ordering::SeqCst)
}

/// Counts one upgraded connection for as long as it is alive.
struct ConnectionGauge;

impl ConnectionGauge {
    fn open() -> Self {
        let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_ws_active_connections(count);
        metrics::record_ws_connection();
        Self
    }
}

impl Drop for ConnectionGauge {
    fn drop(&mut self) {
        let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_ws_active_connections(count);
    }
}

/// WebSocket gesture endpoint.
///
/// The connection is only counted once the upgrade completes, so failed
/// handshakes never touch the gauge.
pub async fn ws_gesture(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| async move {
        let _gauge = ConnectionGauge::open();
        handle_gesture_socket(socket, state).await;
    })
}

async fn handle_gesture_socket(socket: WebSocket, state: AppState) {
    let connection = state.sessions.connect().await;
    let span = info_span!("ws", connection_id = %connection);

    async move {
        info!("Client connected");
        let (ws_sender, mut receiver) = socket.split();

        // Statuses from the running session. Bounded so a slow client slows
        // the session down instead of growing a queue.
        let (tx, mut rx) = mpsc::channel::<String>(state.config.status_buffer_size);

        let send_task = tokio::spawn(async move {
            let mut ws_sender = ws_sender;
            while let Some(status) = rx.recv().await {
                if ws_sender.send(Message::Text(status)).await.is_err() {
                    break;
                }
            }
            let _ = ws_sender.close().await;
        });

        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => handle_command(&state, &connection, &tx, &text).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("WebSocket receive error: {}", e);
                    break;
                }
            }
        }

        state.sessions.disconnect(&connection).await;
        drop(tx);
        let _ = send_task.await;
        info!("Client disconnected");
    }
    .instrument(span)
    .await
}

async fn handle_command(
    state: &AppState,
    connection: &ConnectionId,
    status: &mpsc::Sender<String>,
    text: &str,
) {
    let Some(command) = ClientCommand::parse(text) else {
        metrics::record_ws_command("unknown");
        let shown: String = text.chars().take(LOGGED_MESSAGE_MAX).collect();
        debug!(message = %shown, "Ignoring unknown message");
        return;
    };
    metrics::record_ws_command(command.as_str());

    match command {
        ClientCommand::Start => {
            let desktop = state.desktop.clone();
            let frames = Arc::clone(&state.frames);
            let config = state.session_config();
            let status = status.clone();
            let owner = connection.clone();

            let started = state
                .sessions
                .start(connection, move |id, cancel| {
                    Session::new(id, owner, config, desktop, status).run(frames, cancel)
                })
                .await;

            match started {
                Ok(session_id) => info!(session_id = %session_id, "Gesture detection started"),
                Err(e) => warn!("Failed to start gesture detection: {}", e),
            }
        }
        ClientCommand::Stop => match state.sessions.stop(connection).await {
            Some(end) => info!(outcome = end.as_str(), "Gesture detection stopped"),
            None => debug!("Stop received with no running session"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_tracks_connection_lifetime() {
        let before = active_connections();
        {
            let _first = ConnectionGauge::open();
            let _second = ConnectionGauge::open();
            assert_eq!(active_connections(), before + 2);
        }
        assert_eq!(active_connections(), before);
    }
}
