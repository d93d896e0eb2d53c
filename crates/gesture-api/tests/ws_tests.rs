//! WebSocket protocol tests over a real socket.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use gesture_api::{create_router, ws, ApiConfig, AppState};
use gesture_desktop::{Desktop, DesktopHandle, PointerOp, RecordingBackend};
use gesture_models::{LandmarkFrame, MouseButton};
use gesture_vision::test_support::synthetic_hand;
use gesture_vision::ScreenGeometry;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn serve() -> (AppState, RecordingBackend, SocketAddr) {
    let recorder = RecordingBackend::new();
    let backend = recorder.clone();
    let (desktop, _) = DesktopHandle::spawn(move || Ok(Desktop::new(Box::new(backend))))
        .await
        .unwrap();

    let config = ApiConfig {
        tick_interval: Duration::from_millis(1),
        ..ApiConfig::default()
    };
    let state = AppState::from_parts(config, desktop, ScreenGeometry::new(1000, 1000));
    let app = create_router(state.clone(), None);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (state, recorder, addr)
}

/// Wait until the registry reports the given counts.
async fn wait_for_sessions(state: &AppState, connections: usize, active: usize) {
    tokio::time::timeout(WAIT, async {
        loop {
            if state.sessions.connection_count().await == connections
                && state.sessions.active_session_count().await == active
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("session counts not reached in time");
}

/// Discard statuses still in flight.
async fn drain(client: &mut Client) {
    while let Ok(Some(Ok(_))) =
        tokio::time::timeout(Duration::from_millis(50), client.next()).await
    {}
}

/// Keep pushing `frame` until the client sees `expected`.
async fn push_until_status(
    state: &AppState,
    client: &mut Client,
    frame: &LandmarkFrame,
    expected: &str,
) {
    tokio::time::timeout(WAIT, async {
        loop {
            state.push_hub.publish(frame.clone());
            match tokio::time::timeout(Duration::from_millis(20), client.next()).await {
                Ok(Some(Ok(Message::Text(text)))) if text == expected => return,
                Ok(Some(Ok(_))) | Err(_) => continue,
                Ok(other) => panic!("socket ended early: {:?}", other),
            }
        }
    })
    .await
    .expect("status not received in time");
}

async fn send(client: &mut Client, text: &str) {
    client.send(Message::Text(text.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_socket_command_lifecycle() {
    let (state, recorder, addr) = serve().await;
    let (mut client, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    let pinch = LandmarkFrame::new(synthetic_hand(70.0, 70.0, 10.0));

    // Unknown text is ignored and the connection stays usable.
    send(&mut client, "bogus").await;
    send(&mut client, "start").await;
    send(&mut client, "start").await;

    push_until_status(&state, &mut client, &pinch, "Dragging").await;
    assert_eq!(state.sessions.connection_count().await, 1);
    assert_eq!(state.sessions.active_session_count().await, 1);

    send(&mut client, "stop").await;
    send(&mut client, "stop").await;
    wait_for_sessions(&state, 1, 0).await;
    drain(&mut client).await;

    state.desktop.flush().await.unwrap();
    let pressed = recorder.count(PointerOp::Press(MouseButton::Left));
    assert!(pressed >= 1);
    assert_eq!(recorder.count(PointerOp::Release(MouseButton::Left)), pressed);

    // Closing mid-drag releases the button and forgets the connection.
    send(&mut client, "start").await;
    push_until_status(&state, &mut client, &pinch, "Dragging").await;
    client.close(None).await.unwrap();

    wait_for_sessions(&state, 0, 0).await;
    tokio::time::timeout(WAIT, async {
        while ws::active_connections() != 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("connection gauge did not return to zero");

    state.desktop.flush().await.unwrap();
    let pressed = recorder.count(PointerOp::Press(MouseButton::Left));
    assert!(pressed >= 2);
    assert_eq!(recorder.count(PointerOp::Release(MouseButton::Left)), pressed);
}
