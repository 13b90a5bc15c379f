//! Frame capture through an external grabber (`fswebcam` by default).

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;

use crate::common::utils::{ProcessOutcome, run_with_timeout};

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no camera at {}", .0.display())]
    DeviceAbsent(PathBuf),
    #[error("capture from {} failed: {reason}", .device.display())]
    CaptureFailed { device: PathBuf, reason: String },
    #[error("capture from {} timed out", .0.display())]
    Timeout(PathBuf),
}

#[cfg_attr(test, mockall::automock)]
pub trait FrameGrabber {
    /// Whether a camera answers at `device`.
    fn probe(&self, device: &Path) -> bool;

    /// Capture one frame from `device` into `output`.
    fn capture(&self, device: &Path, output: &Path) -> Result<(), CameraError>;
}

pub struct CommandGrabber {
    program: String,
    width: u32,
    height: u32,
    timeout: Duration,
}

impl CommandGrabber {
    pub fn new(program: &str, width: u32, height: u32, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            width,
            height,
            timeout,
        }
    }

    fn command(&self, device: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--quiet")
            .arg("--no-banner")
            .arg("--device")
            .arg(device)
            .arg("--resolution")
            .arg(format!("{}x{}", self.width, self.height))
            .arg("--jpeg")
            .arg("90")
            .arg(output);
        command
    }
}

impl FrameGrabber for CommandGrabber {
    fn probe(&self, device: &Path) -> bool {
        device.exists()
    }

    fn capture(&self, device: &Path, output: &Path) -> Result<(), CameraError> {
        if !self.probe(device) {
            return Err(CameraError::DeviceAbsent(device.to_path_buf()));
        }

        let outcome = run_with_timeout(self.command(device, output), None, self.timeout)
            .map_err(|e| CameraError::CaptureFailed {
                device: device.to_path_buf(),
                reason: format!("could not run {}: {e}", self.program),
            })?;

        match outcome {
            ProcessOutcome::TimedOut => Err(CameraError::Timeout(device.to_path_buf())),
            ProcessOutcome::Finished(result) if !result.status.success() => {
                Err(CameraError::CaptureFailed {
                    device: device.to_path_buf(),
                    reason: String::from_utf8_lossy(&result.stderr).trim().to_string(),
                })
            }
            ProcessOutcome::Finished(_) if !output.exists() => Err(CameraError::CaptureFailed {
                device: device.to_path_buf(),
                reason: "no image written".to_string(),
            }),
            ProcessOutcome::Finished(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_device_is_reported() {
        let grabber = CommandGrabber::new("fswebcam", 640, 480, Duration::from_secs(1));
        let err = grabber
            .capture(Path::new("/dev/video-none"), Path::new("/tmp/unused.jpg"))
            .unwrap_err();
        assert!(matches!(err, CameraError::DeviceAbsent(_)));
    }

    #[test]
    fn test_command_line() {
        let grabber = CommandGrabber::new("fswebcam", 1280, 1024, Duration::from_secs(1));
        let command = grabber.command(Path::new("/dev/video0"), Path::new("/tmp/a.jpg"));
        let args: Vec<_> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.windows(2).any(|w| w == ["--device", "/dev/video0"]));
        assert!(args.windows(2).any(|w| w == ["--resolution", "1280x1024"]));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/a.jpg"));
    }
}
