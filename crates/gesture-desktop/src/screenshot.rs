//! Screen capture and persistence.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{ImageFormat, RgbaImage};
use rand::Rng;
use tracing::{debug, info};

use crate::error::{DesktopError, DesktopResult};

/// Grabs the current screen contents.
pub trait ScreenGrabber {
    fn grab(&mut self) -> DesktopResult<RgbaImage>;
}

/// Runs an external screenshot tool (`grim`, `scrot`, `screencapture -x`, ...)
/// that takes the output path as its last argument.
#[derive(Debug, Clone)]
pub struct CommandGrabber {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandGrabber {
    /// Parse a command line such as `"screencapture -x"` and locate the
    /// program on `PATH`.
    pub fn from_command_line(command_line: &str) -> DesktopResult<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| DesktopError::config("empty screenshot command"))?;
        let program =
            which::which(program).map_err(|_| DesktopError::ToolNotFound(program.to_string()))?;

        Ok(Self {
            program,
            args: parts.map(str::to_string).collect(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ScreenGrabber for CommandGrabber {
    fn grab(&mut self) -> DesktopResult<RgbaImage> {
        let temp_dir = tempfile::tempdir()?;
        let capture_path = temp_dir.path().join("capture.png");

        debug!(program = %self.program.display(), "Running screenshot tool");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&capture_path)
            .output()?;

        if !output.status.success() {
            return Err(DesktopError::CommandFailed {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                exit_code: output.status.code(),
            });
        }

        Ok(image::open(&capture_path)?.to_rgba8())
    }
}

/// Saves screenshots as `my_screenshot_<n>.png` with `n` drawn from 1..=1000.
#[derive(Debug, Clone)]
pub struct ScreenshotWriter {
    dir: PathBuf,
}

impl ScreenshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the image and return where it went.
    pub fn save(&self, image: &RgbaImage) -> DesktopResult<PathBuf> {
        let label: u32 = rand::rng().random_range(1..=1000);
        let path = self.dir.join(format!("my_screenshot_{label}.png"));
        image.save_with_format(&path, ImageFormat::Png)?;
        Ok(path)
    }
}

/// Grabber plus writer, as used by the desktop actor.
pub struct ScreenshotService {
    grabber: Box<dyn ScreenGrabber>,
    writer: ScreenshotWriter,
}

impl ScreenshotService {
    pub fn new(grabber: Box<dyn ScreenGrabber>, writer: ScreenshotWriter) -> Self {
        Self { grabber, writer }
    }

    /// Grab the screen and persist it.
    pub fn capture(&mut self) -> DesktopResult<PathBuf> {
        let image = self.grabber.grab()?;
        let path = self.writer.save(&image)?;
        info!(path = %path.display(), width = image.width(), height = image.height(), "Screenshot saved");
        Ok(path)
    }
}
