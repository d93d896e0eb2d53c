//! Cooperative session cancellation.
//!
//! A [`CancelHandle`] / [`CancelSignal`] pair wraps a watch channel. The
//! first reason sent wins and later cancellations are no-ops.

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;

/// Why a session was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Superseded by a new `start` on the same connection
    NewStart,
    /// Client sent `stop`
    Stop,
    /// Client went away
    Disconnect,
    /// Server is shutting down
    Shutdown,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::NewStart => "new_start",
            CancelReason::Stop => "stop",
            CancelReason::Disconnect => "disconnect",
            CancelReason::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sending side, held by the registry.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<Option<CancelReason>>,
}

impl CancelHandle {
    /// Request cancellation. Returns false if it was already requested.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        })
    }
}

/// Receiving side, polled by the session task.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<Option<CancelReason>>,
}

impl CancelSignal {
    /// Reason if cancellation has been requested.
    pub fn reason(&self) -> Option<CancelReason> {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// A dropped handle counts as a disconnect.
    pub async fn cancelled(&mut self) -> CancelReason {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                return self.reason().unwrap_or(CancelReason::Disconnect);
            }
        }
    }
}

/// Create a linked handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(None);
    (CancelHandle { tx }, CancelSignal { rx })
}
