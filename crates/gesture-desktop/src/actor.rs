//! Serialized desktop actor.
//!
//! Pointer injection and screen capture are process-wide resources. All
//! sessions hand their actions to one [`DesktopHandle`]; a dedicated thread
//! performs them strictly in arrival order.

use std::thread;

use gesture_models::{DesktopAction, MouseButton};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::backend::PointerBackend;
use crate::error::{DesktopError, DesktopResult};
use crate::screenshot::ScreenshotService;

/// Backends owned by the actor thread.
pub struct Desktop {
    pointer: Box<dyn PointerBackend>,
    screenshots: Option<ScreenshotService>,
}

impl Desktop {
    pub fn new(pointer: Box<dyn PointerBackend>) -> Self {
        Self {
            pointer,
            screenshots: None,
        }
    }

    pub fn with_screenshots(mut self, screenshots: ScreenshotService) -> Self {
        self.screenshots = Some(screenshots);
        self
    }

    pub fn display_size(&self) -> Option<(u32, u32)> {
        self.pointer.display_size()
    }

    /// Perform one action synchronously.
    pub fn perform(&mut self, action: DesktopAction) -> DesktopResult<()> {
        match action {
            DesktopAction::MoveTo { x, y } => self.pointer.move_to(x, y),
            DesktopAction::Press { button } => self.pointer.press(button),
            DesktopAction::Release { button } => self.pointer.release(button),
            DesktopAction::Click { button } => self.click(button),
            DesktopAction::DoubleClick => {
                self.click(MouseButton::Left)?;
                self.click(MouseButton::Left)
            }
            DesktopAction::Screenshot => match self.screenshots.as_mut() {
                Some(service) => service.capture().map(|_| ()),
                None => Err(DesktopError::ScreenshotUnavailable),
            },
        }
    }

    fn click(&mut self, button: MouseButton) -> DesktopResult<()> {
        self.pointer.press(button)?;
        self.pointer.release(button)
    }
}

enum Command {
    Perform(DesktopAction),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle to the desktop actor.
#[derive(Clone)]
pub struct DesktopHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl DesktopHandle {
    /// Start the actor thread.
    ///
    /// `factory` runs on the new thread, so backends that are not `Send`
    /// can be built there. Returns the handle and the display size the
    /// backend reported, if any.
    pub async fn spawn<F>(factory: F) -> DesktopResult<(Self, Option<(u32, u32)>)>
    where
        F: FnOnce() -> DesktopResult<Desktop> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        let (ready_tx, ready_rx) = oneshot::channel();

        thread::Builder::new()
            .name("desktop-actor".to_string())
            .spawn(move || {
                let mut desktop = match factory() {
                    Ok(desktop) => desktop,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                info!(backend = desktop.pointer.name(), "Desktop actor started");
                let _ = ready_tx.send(Ok(desktop.display_size()));

                while let Some(command) = rx.blocking_recv() {
                    match command {
                        Command::Perform(action) => {
                            if let Err(e) = desktop.perform(action) {
                                warn!(action = action.kind(), "Desktop action failed: {}", e);
                            }
                        }
                        Command::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                debug!("Desktop actor stopped");
            })?;

        let display = ready_rx.await.map_err(|_| DesktopError::ActorStopped)??;
        Ok((Self { tx }, display))
    }

    /// Queue an action. Never blocks, so it is safe from `Drop` impls.
    pub fn dispatch(&self, action: DesktopAction) -> DesktopResult<()> {
        self.tx
            .send(Command::Perform(action))
            .map_err(|_| DesktopError::ActorStopped)
    }

    /// Wait until every previously dispatched action has been performed.
    pub async fn flush(&self) -> DesktopResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(done_tx))
            .map_err(|_| DesktopError::ActorStopped)?;
        done_rx.await.map_err(|_| DesktopError::ActorStopped)
    }
}
