//! Per-connection session lifecycle.
//!
//! Each connection owns at most one running session. Starting a new one
//! cancels the previous session and waits for it to finish, so its drag
//! cleanup always lands before the new session's first action.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gesture_models::{ConnectionId, SessionId};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cancel::{cancel_pair, CancelHandle, CancelReason, CancelSignal};
use crate::error::SessionError;
use crate::session::SessionEnd;

struct ActiveSession {
    id: SessionId,
    cancel: CancelHandle,
    task: JoinHandle<SessionEnd>,
    started_at: DateTime<Utc>,
}

impl ActiveSession {
    fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel and wait for the task to return.
    async fn finish(self, connection: &ConnectionId, reason: CancelReason) -> SessionEnd {
        self.cancel.cancel(reason);
        let end = match self.task.await {
            Ok(end) => end,
            Err(e) => {
                warn!(
                    connection_id = %connection,
                    session_id = %self.id,
                    "Session task failed: {}", e
                );
                SessionEnd::Aborted
            }
        };
        let ran_for = Utc::now().signed_duration_since(self.started_at);
        info!(
            connection_id = %connection,
            session_id = %self.id,
            requested = reason.as_str(),
            outcome = end.as_str(),
            ran_for_ms = ran_for.num_milliseconds(),
            "Session joined"
        );
        end
    }
}

type Slot = Arc<Mutex<Option<ActiveSession>>>;

/// Tracks connections and their running sessions.
#[derive(Default)]
pub struct SessionRegistry {
    connections: RwLock<HashMap<ConnectionId, Slot>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection with no session.
    pub async fn connect(&self) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(None)));
        id
    }

    async fn slot(&self, connection: &ConnectionId) -> Option<Slot> {
        self.connections.read().await.get(connection).cloned()
    }

    /// Start a session on `connection`, replacing any running one.
    ///
    /// `launch` builds the session future from its id and cancel signal; it
    /// is spawned only after the previous session has fully finished.
    pub async fn start<F, Fut>(
        &self,
        connection: &ConnectionId,
        launch: F,
    ) -> Result<SessionId, SessionError>
    where
        F: FnOnce(SessionId, CancelSignal) -> Fut,
        Fut: Future<Output = SessionEnd> + Send + 'static,
    {
        let slot = self
            .slot(connection)
            .await
            .ok_or_else(|| SessionError::UnknownConnection(connection.clone()))?;
        let mut current = slot.lock().await;

        if let Some(previous) = current.take() {
            previous.finish(connection, CancelReason::NewStart).await;
        }

        let id = SessionId::new();
        let (cancel, signal) = cancel_pair();
        let task = tokio::spawn(launch(id.clone(), signal));

        *current = Some(ActiveSession {
            id: id.clone(),
            cancel,
            task,
            started_at: Utc::now(),
        });
        Ok(id)
    }

    /// Stop the connection's session, if any. Idempotent.
    pub async fn stop(&self, connection: &ConnectionId) -> Option<SessionEnd> {
        let slot = self.slot(connection).await?;
        let previous = slot.lock().await.take()?;
        Some(previous.finish(connection, CancelReason::Stop).await)
    }

    /// Forget the connection and end its session.
    pub async fn disconnect(&self, connection: &ConnectionId) {
        let Some(slot) = self.connections.write().await.remove(connection) else {
            return;
        };
        let previous = slot.lock().await.take();
        if let Some(previous) = previous {
            previous.finish(connection, CancelReason::Disconnect).await;
        }
    }

    /// End every session on every connection and wait for all of them.
    pub async fn shutdown(&self) {
        let connections: Vec<(ConnectionId, Slot)> =
            self.connections.write().await.drain().collect();

        let mut running = Vec::new();
        for (connection, slot) in connections {
            if let Some(active) = slot.lock().await.take() {
                active.cancel.cancel(CancelReason::Shutdown);
                running.push((connection, active));
            }
        }

        info!(sessions = running.len(), "Shutting down sessions");
        for (connection, active) in running {
            active.finish(&connection, CancelReason::Shutdown).await;
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Sessions whose task is still running.
    pub async fn active_session_count(&self) -> usize {
        let slots: Vec<Slot> = self.connections.read().await.values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.as_ref().is_some_and(ActiveSession::is_running) {
                count += 1;
            }
        }
        count
    }

    pub async fn is_active(&self, connection: &ConnectionId) -> bool {
        match self.slot(connection).await {
            Some(slot) => slot.lock().await.as_ref().is_some_and(ActiveSession::is_running),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{move_hand, pinch_hand, recording_desktop, ScriptedFactory};
    use crate::session::{Session, SessionConfig};
    use gesture_desktop::PointerOp;
    use gesture_models::MouseButton;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// A session that waits for cancellation and logs when it ends.
    fn waiting_session(
        name: &'static str,
        log: Arc<StdMutex<Vec<String>>>,
    ) -> impl FnOnce(SessionId, CancelSignal) -> std::pin::Pin<Box<dyn Future<Output = SessionEnd> + Send>>
    {
        move |_, mut signal| {
            Box::pin(async move {
                log.lock().unwrap().push(format!("{} started", name));
                let reason = signal.cancelled().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
                log.lock().unwrap().push(format!("{} ended", name));
                SessionEnd::Cancelled(reason)
            })
        }
    }

    #[tokio::test]
    async fn test_restart_finishes_old_session_first() {
        let registry = SessionRegistry::new();
        let conn = registry.connect().await;
        let log = Arc::new(StdMutex::new(Vec::new()));

        let first = registry
            .start(&conn, waiting_session("first", Arc::clone(&log)))
            .await
            .unwrap();
        tokio::task::yield_now().await;
        let second = registry
            .start(&conn, waiting_session("second", Arc::clone(&log)))
            .await
            .unwrap();
        assert_ne!(first, second);

        assert_eq!(
            registry.stop(&conn).await,
            Some(SessionEnd::Cancelled(CancelReason::Stop))
        );
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first started", "first ended", "second started", "second ended"]
        );
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let registry = SessionRegistry::new();
        let conn = registry.connect().await;
        let log = Arc::new(StdMutex::new(Vec::new()));

        assert_eq!(registry.stop(&conn).await, None);
        registry
            .start(&conn, waiting_session("only", log))
            .await
            .unwrap();
        assert!(registry.is_active(&conn).await);

        assert!(registry.stop(&conn).await.is_some());
        assert_eq!(registry.stop(&conn).await, None);
        assert!(!registry.is_active(&conn).await);
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_start_on_unknown_connection() {
        let registry = SessionRegistry::new();
        let conn = ConnectionId::new();
        let log = Arc::new(StdMutex::new(Vec::new()));

        let result = registry.start(&conn, waiting_session("never", log.clone())).await;
        assert_eq!(result, Err(SessionError::UnknownConnection(conn)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_cancels_and_forgets() {
        let registry = SessionRegistry::new();
        let conn = registry.connect().await;
        let other = registry.connect().await;
        let log = Arc::new(StdMutex::new(Vec::new()));

        registry
            .start(&conn, waiting_session("a", Arc::clone(&log)))
            .await
            .unwrap();
        assert_eq!(registry.active_session_count().await, 1);

        registry.disconnect(&conn).await;
        assert_eq!(registry.connection_count().await, 1);
        assert_eq!(registry.active_session_count().await, 0);
        assert!(log.lock().unwrap().contains(&"a ended".to_string()));

        registry.disconnect(&other).await;
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_joins_everything() {
        let registry = SessionRegistry::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        for name in ["a", "b"] {
            let conn = registry.connect().await;
            registry
                .start(&conn, waiting_session(name, Arc::clone(&log)))
                .await
                .unwrap();
        }

        registry.shutdown().await;

        assert_eq!(registry.connection_count().await, 0);
        let log = log.lock().unwrap();
        assert!(log.contains(&"a ended".to_string()));
        assert!(log.contains(&"b ended".to_string()));
    }

    #[tokio::test]
    async fn test_restart_while_dragging_releases_before_new_actions() {
        let registry = SessionRegistry::new();
        let conn = registry.connect().await;
        let (desktop, recorder) = recording_desktop().await;
        let (tx, mut rx) = mpsc::channel(16);

        let launch = |frames: Arc<ScriptedFactory>| {
            let desktop = desktop.clone();
            let tx = tx.clone();
            let conn = conn.clone();
            move |id, cancel| {
                Session::new(id, conn, SessionConfig::default(), desktop, tx).run(frames, cancel)
            }
        };

        registry
            .start(&conn, launch(ScriptedFactory::holding(vec![pinch_hand()])))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("Dragging"));

        registry
            .start(&conn, launch(ScriptedFactory::holding(vec![move_hand()])))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("Moving cursor"));
        registry.stop(&conn).await;

        desktop.flush().await.unwrap();
        let ops = recorder.ops();
        assert_eq!(ops[0], PointerOp::Press(MouseButton::Left));
        assert_eq!(ops[2], PointerOp::Release(MouseButton::Left));
        assert!(matches!(ops[3], PointerOp::MoveTo(_, _)));
        assert_eq!(ops.len(), 4);
    }
}
