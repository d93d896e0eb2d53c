//! Landmark frame sources.
//!
//! Every session opens its own [`FrameSource`] through a shared
//! [`FrameSourceFactory`] and drops it when the session ends.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use gesture_models::LandmarkFrame;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{CaptureError, CaptureResult};

/// One stream of landmark frames, owned by a single session.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` at end of stream.
    async fn next_frame(&mut self) -> CaptureResult<Option<LandmarkFrame>>;
}

/// Opens a fresh [`FrameSource`] per session.
#[async_trait]
pub trait FrameSourceFactory: Send + Sync {
    async fn open(&self) -> CaptureResult<Box<dyn FrameSource>>;
}

/// Fan-out point for frames pushed over HTTP.
#[derive(Debug, Clone)]
pub struct PushHub {
    tx: broadcast::Sender<Arc<LandmarkFrame>>,
}

impl PushHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Deliver a frame to every subscribed session.
    ///
    /// Returns how many sessions received it.
    pub fn publish(&self, frame: LandmarkFrame) -> usize {
        self.tx.send(Arc::new(frame)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> PushSource {
        PushSource {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Session-side subscription to a [`PushHub`].
pub struct PushSource {
    rx: broadcast::Receiver<Arc<LandmarkFrame>>,
}

#[async_trait]
impl FrameSource for PushSource {
    async fn next_frame(&mut self) -> CaptureResult<Option<LandmarkFrame>> {
        let mut latest = loop {
            match self.rx.recv().await {
                Ok(frame) => break frame,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Push source lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        };

        // Detection runs on the freshest frame; older queued frames are stale.
        loop {
            match self.rx.try_recv() {
                Ok(frame) => latest = frame,
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }

        Ok(Some(Arc::unwrap_or_clone(latest)))
    }
}

/// Opens a [`PushSource`] on a shared hub.
pub struct PushSourceFactory {
    hub: Arc<PushHub>,
}

impl PushSourceFactory {
    pub fn new(hub: Arc<PushHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl FrameSourceFactory for PushSourceFactory {
    async fn open(&self) -> CaptureResult<Box<dyn FrameSource>> {
        Ok(Box::new(self.hub.subscribe()))
    }
}

/// Replays a JSON-lines file of frames.
pub struct ReplaySource {
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl ReplaySource {
    pub async fn open(path: impl Into<PathBuf>) -> CaptureResult<Self> {
        let path = path.into();
        let file = File::open(&path).await.map_err(|e| {
            CaptureError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

#[async_trait]
impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> CaptureResult<Option<LandmarkFrame>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let frame: LandmarkFrame =
                serde_json::from_str(line).map_err(|e| CaptureError::Malformed {
                    line: self.line_no,
                    message: e.to_string(),
                })?;
            frame.validate().map_err(|e| CaptureError::Malformed {
                line: self.line_no,
                message: e.to_string(),
            })?;
            return Ok(Some(frame));
        }
        Ok(None)
    }
}

/// Opens a new [`ReplaySource`] from the start of the file for each session.
pub struct ReplaySourceFactory {
    path: PathBuf,
}

impl ReplaySourceFactory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FrameSourceFactory for ReplaySourceFactory {
    async fn open(&self) -> CaptureResult<Box<dyn FrameSource>> {
        let source = ReplaySource::open(&self.path).await;
        if let Err(e) = &source {
            warn!(path = %self.path.display(), "Replay source unavailable: {}", e);
        }
        Ok(Box::new(source?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_models::{Landmark, HAND_LANDMARK_COUNT};
    use std::io::Write;

    fn hand(x: f64) -> LandmarkFrame {
        LandmarkFrame::new(vec![Landmark::new(x, 0.5); HAND_LANDMARK_COUNT])
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub = PushHub::new(4);
        assert_eq!(hub.publish(hand(0.1)), 0);
    }

    #[tokio::test]
    async fn test_push_source_returns_latest_frame() {
        let hub = Arc::new(PushHub::new(4));
        let factory = PushSourceFactory::new(Arc::clone(&hub));
        let mut source = factory.open().await.unwrap();

        assert_eq!(hub.publish(hand(0.1)), 1);
        assert_eq!(hub.publish(hand(0.2)), 1);

        let frame = source.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.landmarks[0].x, 0.2);
    }

    #[tokio::test]
    async fn test_push_source_survives_lag() {
        let hub = PushHub::new(2);
        let mut source = hub.subscribe();

        for i in 0..10 {
            hub.publish(hand(f64::from(i) / 10.0));
        }

        let frame = source.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.landmarks[0].x, 0.9);
    }

    #[tokio::test]
    async fn test_push_source_ends_when_hub_dropped() {
        let hub = PushHub::new(2);
        let mut source = hub.subscribe();
        drop(hub);
        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replay_skips_blank_lines_and_ends() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", serde_json::to_string(&hand(0.3)).unwrap()).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{{\"landmarks\":[]}}").unwrap();
        file.flush().unwrap();

        let factory = ReplaySourceFactory::new(file.path());
        let mut source = factory.open().await.unwrap();

        let first = source.next_frame().await.unwrap().unwrap();
        assert!(first.has_hand());
        let second = source.next_frame().await.unwrap().unwrap();
        assert!(!second.has_hand());
        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replay_reports_malformed_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"landmarks\":[]}}").unwrap();
        writeln!(file, "not json").unwrap();
        file.flush().unwrap();

        let mut source = ReplaySource::open(file.path()).await.unwrap();
        source.next_frame().await.unwrap();

        match source.next_frame().await {
            Err(CaptureError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed frame, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_replay_rejects_partial_hand() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"landmarks\":[{{\"x\":0.1,\"y\":0.2}}]}}").unwrap();
        file.flush().unwrap();

        let mut source = ReplaySource::open(file.path()).await.unwrap();
        assert!(matches!(
            source.next_frame().await,
            Err(CaptureError::Malformed { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_replay_missing_file() {
        let factory = ReplaySourceFactory::new("/nonexistent/frames.jsonl");
        assert!(matches!(
            factory.open().await,
            Err(CaptureError::Unavailable(_))
        ));
    }
}
