//! Detection session.
//!
//! One session runs per `start` command. Each tick it pulls a frame,
//! classifies it, performs the resulting desktop actions and reports the
//! gesture's status string to the client. A drag still held when the
//! session ends for any reason is released exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gesture_desktop::DesktopHandle;
use gesture_models::{ConnectionId, LandmarkFrame, SessionId};
use gesture_vision::{classify, InteractionState, Rule, ScreenGeometry};
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn, Instrument, Level};

use crate::cancel::{CancelReason, CancelSignal};
use crate::metrics;
use crate::source::FrameSourceFactory;

/// Per-session tuning.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Delay after each tick
    pub tick_interval: Duration,
    /// Pointer mapping target
    pub screen: ScreenGeometry,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(30),
            screen: ScreenGeometry::default(),
        }
    }
}

/// How a session finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Frame source ran dry
    EndOfStream,
    /// Status could not be delivered to the client
    TransportClosed,
    Cancelled(CancelReason),
    /// Frame source failed to open or to produce a frame
    CaptureFailed(String),
    /// Task panicked or was aborted before finishing
    Aborted,
}

impl SessionEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEnd::EndOfStream => "end_of_stream",
            SessionEnd::TransportClosed => "transport_closed",
            SessionEnd::Cancelled(reason) => reason.as_str(),
            SessionEnd::CaptureFailed(_) => "capture_failed",
            SessionEnd::Aborted => "aborted",
        }
    }
}

/// A single detection run bound to one connection.
pub struct Session {
    id: SessionId,
    connection: ConnectionId,
    config: SessionConfig,
    desktop: DesktopHandle,
    status: mpsc::Sender<String>,
}

impl Session {
    pub fn new(
        id: SessionId,
        connection: ConnectionId,
        config: SessionConfig,
        desktop: DesktopHandle,
        status: mpsc::Sender<String>,
    ) -> Self {
        Self {
            id,
            connection,
            config,
            desktop,
            status,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Run until the frames end, the client goes away or `cancel` fires.
    pub async fn run(
        self,
        frames: Arc<dyn FrameSourceFactory>,
        mut cancel: CancelSignal,
    ) -> SessionEnd {
        let span = info_span!(
            "session",
            session_id = %self.id,
            connection_id = %self.connection,
        );

        async move {
            let started = Instant::now();
            info!("Detection session started");
            metrics::record_session_started();

            let end = self.detect(frames.as_ref(), &mut cancel).await;

            match &end {
                SessionEnd::CaptureFailed(message) => {
                    warn!(reason = end.as_str(), "Detection session failed: {}", message)
                }
                _ => info!(reason = end.as_str(), "Detection session ended"),
            }
            metrics::record_session_ended(end.as_str(), started.elapsed().as_secs_f64());
            end
        }
        .instrument(span)
        .await
    }

    async fn detect(
        &self,
        frames: &dyn FrameSourceFactory,
        cancel: &mut CancelSignal,
    ) -> SessionEnd {
        let mut source = tokio::select! {
            biased;
            reason = cancel.cancelled() => return SessionEnd::Cancelled(reason),
            opened = frames.open() => match opened {
                Ok(source) => source,
                Err(e) => return SessionEnd::CaptureFailed(e.to_string()),
            },
        };

        // Runs on return and when the task is dropped mid-await.
        let desktop = self.desktop.clone();
        let mut interaction = scopeguard::guard(InteractionState::new(), move |mut state| {
            if let Some(release) = state.terminate() {
                debug!("Releasing held drag");
                metrics::record_desktop_action(release.kind());
                if let Err(e) = desktop.dispatch(release) {
                    warn!("Failed to release drag: {}", e);
                }
            }
        });

        loop {
            let frame = tokio::select! {
                biased;
                reason = cancel.cancelled() => return SessionEnd::Cancelled(reason),
                next = source.next_frame() => match next {
                    Ok(Some(frame)) => frame,
                    Ok(None) => return SessionEnd::EndOfStream,
                    Err(e) => return SessionEnd::CaptureFailed(e.to_string()),
                },
            };

            if let Some(status) = self.tick(&mut interaction, &frame) {
                tokio::select! {
                    biased;
                    reason = cancel.cancelled() => return SessionEnd::Cancelled(reason),
                    sent = self.status.send(status) => {
                        if sent.is_err() {
                            return SessionEnd::TransportClosed;
                        }
                    }
                }
            }

            tokio::select! {
                biased;
                reason = cancel.cancelled() => return SessionEnd::Cancelled(reason),
                _ = tokio::time::sleep(self.config.tick_interval) => {}
            }
        }
    }

    /// Process one frame. Returns the status to report, or `None` when the
    /// frame could not be measured.
    fn tick(&self, interaction: &mut InteractionState, frame: &LandmarkFrame) -> Option<String> {
        metrics::record_tick();

        let dragging = interaction.is_dragging();
        let classification = match classify(&frame.landmarks, dragging) {
            Ok(classification) => classification,
            Err(e) => {
                metrics::record_tick_skipped();
                warn!("Skipping frame: {}", e);
                return None;
            }
        };

        let gesture = classification.gesture;
        metrics::record_gesture(gesture.as_str());

        if tracing::enabled!(Level::DEBUG) {
            if let Some(measurements) = classification.measurements {
                let matched = Rule::matching(&measurements, dragging);
                if matched.len() > 1 {
                    debug!(gesture = %gesture, rules = ?matched, "Overlapping rules, first one wins");
                }
            }
        }

        for action in interaction.apply(&classification, frame, self.config.screen) {
            debug!(gesture = %gesture, action = action.kind(), "Dispatching action");
            metrics::record_desktop_action(action.kind());
            if let Err(e) = self.desktop.dispatch(action) {
                warn!(action = action.kind(), "Failed to dispatch action: {}", e);
            }
        }

        Some(gesture.status_label().to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::error::CaptureResult;
    use crate::source::FrameSource;
    use async_trait::async_trait;
    use gesture_desktop::{Desktop, PointerOp, RecordingBackend};
    use gesture_models::MouseButton;
    use gesture_vision::test_support::synthetic_hand;
    use std::collections::VecDeque;

    pub(crate) fn move_hand() -> LandmarkFrame {
        LandmarkFrame::new(synthetic_hand(170.0, 170.0, 40.0))
    }

    pub(crate) fn pinch_hand() -> LandmarkFrame {
        LandmarkFrame::new(synthetic_hand(70.0, 70.0, 10.0))
    }

    pub(crate) fn open_hand() -> LandmarkFrame {
        LandmarkFrame::new(synthetic_hand(70.0, 70.0, 100.0))
    }

    /// Plays fixed frames, then either ends or blocks forever.
    pub(crate) struct ScriptedFactory {
        frames: Vec<LandmarkFrame>,
        hold_open: bool,
    }

    impl ScriptedFactory {
        pub(crate) fn ending(frames: Vec<LandmarkFrame>) -> Arc<Self> {
            Arc::new(Self {
                frames,
                hold_open: false,
            })
        }

        pub(crate) fn holding(frames: Vec<LandmarkFrame>) -> Arc<Self> {
            Arc::new(Self {
                frames,
                hold_open: true,
            })
        }
    }

    struct ScriptedSource {
        frames: VecDeque<LandmarkFrame>,
        hold_open: bool,
    }

    #[async_trait]
    impl FrameSource for ScriptedSource {
        async fn next_frame(&mut self) -> CaptureResult<Option<LandmarkFrame>> {
            match self.frames.pop_front() {
                Some(frame) => Ok(Some(frame)),
                None if self.hold_open => std::future::pending().await,
                None => Ok(None),
            }
        }
    }

    #[async_trait]
    impl FrameSourceFactory for ScriptedFactory {
        async fn open(&self) -> CaptureResult<Box<dyn FrameSource>> {
            Ok(Box::new(ScriptedSource {
                frames: self.frames.iter().cloned().collect(),
                hold_open: self.hold_open,
            }))
        }
    }

    pub(crate) async fn recording_desktop() -> (DesktopHandle, RecordingBackend) {
        let recorder = RecordingBackend::new();
        let backend = recorder.clone();
        let (desktop, _) = DesktopHandle::spawn(move || Ok(Desktop::new(Box::new(backend))))
            .await
            .unwrap();
        (desktop, recorder)
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            tick_interval: Duration::from_millis(1),
            screen: ScreenGeometry::new(1000, 1000),
        }
    }

    fn session(desktop: DesktopHandle, status: mpsc::Sender<String>) -> Session {
        Session::new(
            SessionId::new(),
            ConnectionId::new(),
            test_config(),
            desktop,
            status,
        )
    }

    async fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(status) = rx.recv().await {
            out.push(status);
        }
        out
    }

    #[tokio::test]
    async fn test_reports_one_status_per_frame() {
        let (desktop, recorder) = recording_desktop().await;
        let (tx, mut rx) = mpsc::channel(16);
        let (_handle, signal) = cancel_pair();

        let frames = ScriptedFactory::ending(vec![
            move_hand(),
            LandmarkFrame::empty(),
            pinch_hand(),
            pinch_hand(),
            open_hand(),
        ]);
        let end = session(desktop.clone(), tx).run(frames, signal).await;

        assert_eq!(end, SessionEnd::EndOfStream);
        assert_eq!(
            drain(&mut rx).await,
            vec![
                "Moving cursor",
                "No gesture detected",
                "Dragging",
                "Dragging",
                "Dropped"
            ]
        );

        desktop.flush().await.unwrap();
        assert_eq!(recorder.count(PointerOp::Press(MouseButton::Left)), 1);
        assert_eq!(recorder.count(PointerOp::Release(MouseButton::Left)), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_dragging_releases_once() {
        let (desktop, recorder) = recording_desktop().await;
        let (tx, mut rx) = mpsc::channel(16);
        let (handle, signal) = cancel_pair();

        let frames = ScriptedFactory::holding(vec![pinch_hand()]);
        let task = tokio::spawn(session(desktop.clone(), tx).run(frames, signal));

        assert_eq!(rx.recv().await.as_deref(), Some("Dragging"));
        handle.cancel(CancelReason::Stop);

        assert_eq!(task.await.unwrap(), SessionEnd::Cancelled(CancelReason::Stop));
        desktop.flush().await.unwrap();
        assert_eq!(recorder.count(PointerOp::Press(MouseButton::Left)), 1);
        assert_eq!(recorder.count(PointerOp::Release(MouseButton::Left)), 1);
    }

    #[tokio::test]
    async fn test_abort_while_dragging_releases_once() {
        let (desktop, recorder) = recording_desktop().await;
        let (tx, mut rx) = mpsc::channel(16);
        let (_handle, signal) = cancel_pair();

        let frames = ScriptedFactory::holding(vec![pinch_hand()]);
        let task = tokio::spawn(session(desktop.clone(), tx).run(frames, signal));

        assert_eq!(rx.recv().await.as_deref(), Some("Dragging"));
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        desktop.flush().await.unwrap();
        assert_eq!(recorder.count(PointerOp::Release(MouseButton::Left)), 1);
    }

    #[tokio::test]
    async fn test_closed_transport_ends_session() {
        let (desktop, recorder) = recording_desktop().await;
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let (_handle, signal) = cancel_pair();

        let frames = ScriptedFactory::holding(vec![pinch_hand()]);
        let end = session(desktop.clone(), tx).run(frames, signal).await;

        assert_eq!(end, SessionEnd::TransportClosed);
        desktop.flush().await.unwrap();
        assert_eq!(recorder.count(PointerOp::Release(MouseButton::Left)), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_first_frame() {
        let (desktop, recorder) = recording_desktop().await;
        let (tx, mut rx) = mpsc::channel(16);
        let (handle, signal) = cancel_pair();
        handle.cancel(CancelReason::Shutdown);

        let frames = ScriptedFactory::holding(vec![move_hand()]);
        let end = session(desktop.clone(), tx).run(frames, signal).await;

        assert_eq!(end, SessionEnd::Cancelled(CancelReason::Shutdown));
        assert!(drain(&mut rx).await.is_empty());
        desktop.flush().await.unwrap();
        assert!(recorder.ops().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_pose_reports_first_rule() {
        // Extended index with a tight pinch satisfies both Move and Pinch.
        let _log = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_max_level(Level::DEBUG)
                .with_test_writer()
                .finish(),
        );

        let (desktop, recorder) = recording_desktop().await;
        let (tx, mut rx) = mpsc::channel(16);
        let (_handle, signal) = cancel_pair();

        let overlap = LandmarkFrame::new(synthetic_hand(170.0, 170.0, 20.0));
        let frames = ScriptedFactory::ending(vec![overlap]);
        let end = session(desktop.clone(), tx).run(frames, signal).await;

        assert_eq!(end, SessionEnd::EndOfStream);
        assert_eq!(drain(&mut rx).await, vec!["Moving cursor"]);
        desktop.flush().await.unwrap();
        assert_eq!(recorder.count(PointerOp::Press(MouseButton::Left)), 0);
        assert_eq!(recorder.ops().len(), 1);
    }

    #[tokio::test]
    async fn test_move_maps_index_tip() {
        let (desktop, recorder) = recording_desktop().await;
        let (tx, _rx) = mpsc::channel(16);
        let (_handle, signal) = cancel_pair();

        let frame = move_hand();
        let tip = frame.landmarks[8];
        let frames = ScriptedFactory::ending(vec![frame]);
        session(desktop.clone(), tx).run(frames, signal).await;

        desktop.flush().await.unwrap();
        let expected = PointerOp::MoveTo((tip.x * 1000.0) as i32, (tip.y / 2.0 * 1000.0) as i32);
        assert_eq!(recorder.ops(), vec![expected]);
    }
}
