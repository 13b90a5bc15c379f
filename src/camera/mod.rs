//! Coop cameras: discovery, capture, upload and public links.
//!
//! Video devices are probed once when the rig is built. Each photo round
//! switches the camera light on, grabs one frame per camera, uploads the set
//! and removes the local copies. Failures are per camera or per round: a dead
//! camera skips its frame, a failed upload yields no links for that round.

pub mod capture;
pub mod upload;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::config::Config;
use crate::hardware::Lamp;
pub use capture::{CameraError, CommandGrabber, FrameGrabber};
pub use upload::{SftpUploader, Uploader};

pub struct CameraRig {
    grabber: Box<dyn FrameGrabber>,
    uploader: Option<Box<dyn Uploader>>,
    lamp: Box<dyn Lamp>,
    devices: Vec<PathBuf>,
    image_dir: PathBuf,
    url_base: String,
    settle: Duration,
}

impl CameraRig {
    /// Build the rig from configuration and probe `/dev/video*`.
    pub fn new(config: &Config, lamp: Box<dyn Lamp>) -> Result<Self> {
        let grabber = CommandGrabber::new(
            config
                .capture_command
                .as_deref()
                .unwrap_or(DEFAULT_CAPTURE_COMMAND),
            config.image_width.unwrap_or(DEFAULT_IMAGE_WIDTH),
            config.image_height.unwrap_or(DEFAULT_IMAGE_HEIGHT),
            Duration::from_secs(CAPTURE_TIMEOUT_SECS),
        );
        let uploader = SftpUploader::from_config(config)
            .map(|uploader| Box::new(uploader) as Box<dyn Uploader>);
        if uploader.is_none() {
            log_indented!("SFTP uploads not configured, photos will not be sent");
        }

        let candidates = (0..config.max_cameras.unwrap_or(DEFAULT_MAX_CAMERAS))
            .map(|n| PathBuf::from(format!("/dev/video{n}")))
            .collect();

        Ok(Self::with_parts(
            Box::new(grabber),
            uploader,
            lamp,
            candidates,
            config.image_dir_path()?,
            config.image_url_base().to_string(),
        )
        .with_settle_time(Duration::from_millis(CAMLIGHT_SETTLE_MS)))
    }

    /// Rig that never probes or captures, for dry runs.
    pub fn without_cameras(config: &Config, lamp: Box<dyn Lamp>) -> Result<Self> {
        Ok(Self::with_parts(
            Box::new(CommandGrabber::new(
                DEFAULT_CAPTURE_COMMAND,
                DEFAULT_IMAGE_WIDTH,
                DEFAULT_IMAGE_HEIGHT,
                Duration::from_secs(CAPTURE_TIMEOUT_SECS),
            )),
            None,
            lamp,
            Vec::new(),
            config.image_dir_path()?,
            config.image_url_base().to_string(),
        ))
    }

    /// Assemble a rig from its collaborators, keeping only the candidate
    /// devices that answer a probe.
    pub fn with_parts(
        grabber: Box<dyn FrameGrabber>,
        uploader: Option<Box<dyn Uploader>>,
        lamp: Box<dyn Lamp>,
        candidates: Vec<PathBuf>,
        image_dir: PathBuf,
        url_base: String,
    ) -> Self {
        let devices: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|device| {
                let found = grabber.probe(device);
                log_debug!(
                    "Camera {} {}",
                    device.display(),
                    if found { "found" } else { "not found" }
                );
                found
            })
            .collect();
        log_indented!("Active cameras: {}", devices.len());

        Self {
            grabber,
            uploader,
            lamp,
            devices,
            image_dir,
            url_base,
            settle: Duration::ZERO,
        }
    }

    pub fn with_settle_time(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn active_cameras(&self) -> usize {
        self.devices.len()
    }

    pub fn report(&self) -> String {
        match self.devices.len() {
            0 => "I have no camera watching. ".to_string(),
            1 => "I have one camera watching. ".to_string(),
            n => format!("I have {n} cameras watching. "),
        }
    }

    /// Capture from every camera, upload, and return the public image URLs.
    ///
    /// Returns an empty list when nothing could be captured or uploaded.
    pub fn take_and_upload(&mut self) -> Vec<String> {
        if self.devices.is_empty() {
            return Vec::new();
        }

        log_block_start!("Taking photos");
        let files = self.capture_all();
        if files.is_empty() {
            log_warning!("No camera produced an image");
            return Vec::new();
        }

        let uploaded = match &self.uploader {
            Some(uploader) => match uploader.upload(&files) {
                Ok(()) => true,
                Err(e) => {
                    log_warning!("Failed to upload photos: {e:#}");
                    false
                }
            },
            None => {
                log_indented!("Uploads not configured, discarding {} image(s)", files.len());
                false
            }
        };

        self.cleanup(&files);

        if !uploaded {
            return Vec::new();
        }
        files
            .iter()
            .filter_map(|file| file.file_name())
            .map(|name| format!("{}{}", self.url_base, name.to_string_lossy()))
            .collect()
    }

    fn capture_all(&mut self) -> Vec<PathBuf> {
        if let Err(e) = self.prepare_image_dir() {
            log_warning!("{e:#}");
            return Vec::new();
        }

        self.switch_light(true);
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }

        let batch = uuid::Uuid::new_v4();
        let mut files = Vec::new();
        for (n, device) in self.devices.iter().enumerate() {
            let output = self.image_dir.join(format!(
                "{IMAGE_FILE_STEM}.{batch}.{n}.{IMAGE_FILE_EXTENSION}"
            ));
            match self.grabber.capture(device, &output) {
                Ok(()) => {
                    log_indented!("Captured {}", private_path(&output));
                    files.push(output);
                }
                Err(e) => log_warning!("Skipping camera: {e}"),
            }
        }

        self.switch_light(false);
        files
    }

    fn prepare_image_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.image_dir).with_context(|| {
            format!(
                "Failed to create image directory {}",
                private_path(&self.image_dir)
            )
        })
    }

    fn switch_light(&mut self, lit: bool) {
        if let Err(e) = self.lamp.set_camlight(lit) {
            log_debug!("Camera light: {e}");
        }
    }

    fn cleanup(&self, files: &[PathBuf]) {
        for file in files {
            if let Err(e) = fs::remove_file(file)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                log_warning!("Failed to remove {}: {e}", private_path(file));
            }
        }
    }
}
