//! Application state.

use std::sync::Arc;

use gesture_desktop::{
    CommandGrabber, Desktop, DesktopHandle, DesktopResult, DryRunBackend,
    PointerBackend, ScreenshotService, ScreenshotWriter,
};
use gesture_vision::ScreenGeometry;
use tracing::{info, warn};

use crate::config::{ApiConfig, DesktopBackendKind, FrameSourceKind};
use crate::error::ApiResult;
use crate::registry::SessionRegistry;
use crate::session::SessionConfig;
use crate::source::{FrameSourceFactory, PushHub, PushSourceFactory, ReplaySourceFactory};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub sessions: Arc<SessionRegistry>,
    pub desktop: DesktopHandle,
    pub frames: Arc<dyn FrameSourceFactory>,
    pub push_hub: Arc<PushHub>,
    pub screen: ScreenGeometry,
}

impl AppState {
    /// Create new application state, starting the desktop actor.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let backend = config.desktop_backend;
        let screenshot_command = config.screenshot_command.clone();
        let screenshot_dir = config.screenshot_dir.clone();

        let (desktop, display) = DesktopHandle::spawn(move || {
            let mut desktop = Desktop::new(pointer_backend(backend)?);
            match screenshot_command {
                Some(command) => {
                    let grabber = CommandGrabber::from_command_line(&command)?;
                    info!(
                        program = %grabber.program().display(),
                        dir = %screenshot_dir.display(),
                        "Screenshots enabled"
                    );
                    desktop = desktop.with_screenshots(ScreenshotService::new(
                        Box::new(grabber),
                        ScreenshotWriter::new(screenshot_dir),
                    ));
                }
                None => warn!("SCREENSHOT_COMMAND not set, screenshot gestures will be ignored"),
            }
            Ok(desktop)
        })
        .await?;

        let fallback = ScreenGeometry::default();
        let screen = ScreenGeometry::new(
            config
                .screen_width
                .or(display.map(|(w, _)| w))
                .unwrap_or(fallback.width),
            config
                .screen_height
                .or(display.map(|(_, h)| h))
                .unwrap_or(fallback.height),
        );
        info!(width = screen.width, height = screen.height, "Pointer mapping target");

        Ok(Self::from_parts(config, desktop, screen))
    }

    /// Assemble state around an already running desktop actor.
    pub fn from_parts(config: ApiConfig, desktop: DesktopHandle, screen: ScreenGeometry) -> Self {
        let push_hub = Arc::new(PushHub::new(config.push_buffer_size));
        let frames: Arc<dyn FrameSourceFactory> = match &config.frame_source {
            FrameSourceKind::Push => Arc::new(PushSourceFactory::new(Arc::clone(&push_hub))),
            FrameSourceKind::Replay(path) => Arc::new(ReplaySourceFactory::new(path.clone())),
        };

        Self {
            config: Arc::new(config),
            sessions: Arc::new(SessionRegistry::new()),
            desktop,
            frames,
            push_hub,
            screen,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tick_interval: self.config.tick_interval,
            screen: self.screen,
        }
    }
}

fn pointer_backend(kind: DesktopBackendKind) -> DesktopResult<Box<dyn PointerBackend>> {
    match kind {
        DesktopBackendKind::DryRun => Ok(Box::new(DryRunBackend)),
        #[cfg(feature = "enigo")]
        DesktopBackendKind::Enigo => Ok(Box::new(gesture_desktop::EnigoBackend::new()?)),
        #[cfg(not(feature = "enigo"))]
        DesktopBackendKind::Enigo => Err(gesture_desktop::DesktopError::config(
            "DESKTOP_BACKEND=enigo requires building with the `enigo` feature",
        )),
    }
}
