//! Configuration for coopbot.
//!
//! Settings live in a single TOML file, `coopbot.toml`, looked up in
//! `$XDG_CONFIG_HOME/coopbot/` unless a directory is given with `--config`.
//! A commented default file is written on first run.
//!
//! ```toml
//! #[Location]
//! location = "Felton, CA"
//! latitude = 37.0513
//! longitude = -122.0733
//! timezone = "America/Los_Angeles"   # optional, detected from the system when absent
//! sunrise_delay = 0                  # minutes after sunrise to open the door
//! sunset_delay = 60                  # minutes after sunset to close the door
//!
//! #[Door]
//! steps_per_revolution = 200
//! revolutions = 10
//! state_file = "door.state"          # relative paths live under $XDG_STATE_HOME/coopbot
//!
//! #[Messaging]
//! origin_number = "+15551230000"
//! recipients = ["+15551230001"]
//! ```
//!
//! The loaded [`Config`] is immutable for the life of the process and handed
//! by reference to every component that needs it. Secrets (the Twilio account
//! SID and auth token) are read from the environment, never from the file.

pub mod builder;
pub mod loading;
pub mod validation;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::constants::*;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// All coopbot settings. Every field is optional in the file; accessors
/// below fill in the defaults.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Location and light
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub sunrise_delay: Option<i64>, // minutes
    pub sunset_delay: Option<i64>,  // minutes
    pub time_format: Option<String>,

    // Control loop
    pub poll_interval: Option<u64>, // seconds

    // Door
    pub state_file: Option<String>,
    pub steps_per_revolution: Option<u32>,
    pub revolutions: Option<u32>,

    // GPIO (BCM numbering)
    pub dir_pin: Option<u8>,
    pub step_pin: Option<u8>,
    pub indicator_pin: Option<u8>,
    pub camlight_pin: Option<u8>,

    // Cameras
    pub max_cameras: Option<u8>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub image_dir: Option<String>,
    pub capture_command: Option<String>,
    pub image_url_base: Option<String>,

    // Uploads
    pub sftp_server: Option<String>,
    pub sftp_user: Option<String>,
    pub sftp_remote_dir: Option<String>,
    pub sftp_identity: Option<String>,

    // Messaging
    pub origin_number: Option<String>,
    pub recipients: Option<Vec<String>>,
    pub message_prefix: Option<String>,
    pub message_postfix: Option<String>,
    pub api_base: Option<String>,
    pub api_timeout: Option<u64>, // seconds
}

impl Config {
    pub fn load() -> Result<Self> {
        load()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        load_from_path(path)
    }

    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (
            self.latitude.unwrap_or(DEFAULT_LATITUDE),
            self.longitude.unwrap_or(DEFAULT_LONGITUDE),
        )
    }

    /// Observer timezone: the configured IANA name, or the zone containing
    /// the coop's coordinates.
    pub fn observer_timezone(&self) -> Result<Tz> {
        match self.timezone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Unknown timezone '{name}': {e}")),
            None => {
                let (latitude, longitude) = self.coordinates();
                Ok(crate::solar::timezone::timezone_for_coordinates(
                    latitude, longitude,
                ))
            }
        }
    }

    pub fn sunrise_delay(&self) -> i64 {
        self.sunrise_delay.unwrap_or(DEFAULT_SUNRISE_DELAY)
    }

    pub fn sunset_delay(&self) -> i64 {
        self.sunset_delay.unwrap_or(DEFAULT_SUNSET_DELAY)
    }

    pub fn time_format(&self) -> &str {
        self.time_format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL))
    }

    pub fn steps_per_revolution(&self) -> u32 {
        self.steps_per_revolution
            .unwrap_or(DEFAULT_STEPS_PER_REVOLUTION)
    }

    pub fn revolutions(&self) -> u32 {
        self.revolutions.unwrap_or(DEFAULT_REVOLUTIONS)
    }

    /// Door record location; relative paths resolve under the state directory.
    pub fn state_file_path(&self) -> Result<PathBuf> {
        resolve_state_path(self.state_file.as_deref().unwrap_or(DEFAULT_STATE_FILE))
    }

    /// Local image directory; relative paths resolve under the state directory.
    pub fn image_dir_path(&self) -> Result<PathBuf> {
        resolve_state_path(self.image_dir.as_deref().unwrap_or(DEFAULT_IMAGE_DIR))
    }

    pub fn image_url_base(&self) -> &str {
        self.image_url_base
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_URL_BASE)
    }

    pub fn recipients(&self) -> &[String] {
        self.recipients.as_deref().unwrap_or(&[])
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout.unwrap_or(DEFAULT_API_TIMEOUT))
    }

    /// True when every SFTP field needed for uploads is present.
    pub fn uploads_configured(&self) -> bool {
        self.sftp_server.is_some() && self.sftp_user.is_some() && self.sftp_remote_dir.is_some()
    }

    /// Log a short summary of the active configuration.
    pub fn log_config(&self, path: Option<&Path>) {
        if let Some(path) = path {
            log_block_start!(
                "Loaded configuration from {}",
                crate::common::utils::private_path(path)
            );
        }
        let (lat, lon) = self.coordinates();
        log_indented!("Location: {} ({lat:.4}°, {lon:.4}°)", self.location());
        log_indented!(
            "Door delays: sunrise {:+} min, sunset {:+} min",
            self.sunrise_delay(),
            self.sunset_delay()
        );
        log_indented!(
            "Stepper: {} revolutions × {} steps",
            self.revolutions(),
            self.steps_per_revolution()
        );
        log_indented!("Poll interval: {}s", self.poll_interval().as_secs());
        log_indented!("Recipients: {}", self.recipients().len());
    }
}

/// Directory for runtime state: `$XDG_STATE_HOME/coopbot`.
pub fn get_state_dir() -> Result<PathBuf> {
    let state_home = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            dirs::home_dir()
                .map(|home| home.join(".local/state"))
                .context("Could not determine home directory for state files")
        })?;
    Ok(state_home.join(APP_DIR_NAME))
}

fn resolve_state_path(value: &str) -> Result<PathBuf> {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(get_state_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests;
