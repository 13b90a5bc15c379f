//! Default configuration file generation.
//!
//! The generated file documents every setting inline with aligned comments.
//! Settings that have no sensible default (phone numbers, upload target) are
//! written commented out so the file loads cleanly before it is edited.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;

/// Write a fresh, commented `coopbot.toml` at `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let content = default_config_content();
    fs::write(path, content)
        .with_context(|| format!("Failed to write default config to {}", path.display()))
}

pub(crate) fn default_config_content() -> String {
    ConfigBuilder::new()
        .add_section("Location")
        .add_setting(
            "location",
            &format!("\"{DEFAULT_LOCATION}\""),
            "Place name used in status texts",
        )
        .add_setting(
            "latitude",
            &format!("{DEFAULT_LATITUDE}"),
            &format!("Geographic latitude (-{MAXIMUM_LATITUDE} to {MAXIMUM_LATITUDE})"),
        )
        .add_setting(
            "longitude",
            &format!("{DEFAULT_LONGITUDE}"),
            "Geographic longitude (-180 to 180)",
        )
        .add_commented(
            "timezone",
            "\"America/Los_Angeles\"",
            "IANA timezone; looked up from the coordinates when unset",
        )
        .add_setting(
            "sunrise_delay",
            &DEFAULT_SUNRISE_DELAY.to_string(),
            "Minutes after sunrise to open the door",
        )
        .add_setting(
            "sunset_delay",
            &DEFAULT_SUNSET_DELAY.to_string(),
            "Minutes after sunset to close the door",
        )
        .add_setting(
            "time_format",
            &format!("\"{DEFAULT_TIME_FORMAT}\""),
            "strftime pattern for times in texts",
        )
        .add_section("Control loop")
        .add_setting(
            "poll_interval",
            &DEFAULT_POLL_INTERVAL.to_string(),
            &format!(
                "Seconds between checks ({MINIMUM_POLL_INTERVAL}-{MAXIMUM_POLL_INTERVAL})"
            ),
        )
        .add_section("Door")
        .add_setting(
            "state_file",
            &format!("\"{DEFAULT_STATE_FILE}\""),
            "Door position record (relative to $XDG_STATE_HOME/coopbot)",
        )
        .add_setting(
            "steps_per_revolution",
            &DEFAULT_STEPS_PER_REVOLUTION.to_string(),
            "Steps per revolution from the stepper datasheet",
        )
        .add_setting(
            "revolutions",
            &DEFAULT_REVOLUTIONS.to_string(),
            "Revolutions to raise or lower the door",
        )
        .add_section("GPIO (BCM numbering)")
        .add_setting("dir_pin", &DEFAULT_DIR_PIN.to_string(), "Stepper direction")
        .add_setting("step_pin", &DEFAULT_STEP_PIN.to_string(), "Stepper step pulse")
        .add_setting(
            "indicator_pin",
            &DEFAULT_INDICATOR_PIN.to_string(),
            "Indicator LED, lit while the door is closed",
        )
        .add_setting(
            "camlight_pin",
            &DEFAULT_CAMLIGHT_PIN.to_string(),
            "Camera light, lit during capture",
        )
        .add_section("Cameras")
        .add_setting(
            "max_cameras",
            &DEFAULT_MAX_CAMERAS.to_string(),
            "Video devices to probe (/dev/video0..)",
        )
        .add_setting(
            "image_width",
            &DEFAULT_IMAGE_WIDTH.to_string(),
            "Capture width in pixels",
        )
        .add_setting(
            "image_height",
            &DEFAULT_IMAGE_HEIGHT.to_string(),
            "Capture height in pixels",
        )
        .add_setting(
            "image_dir",
            &format!("\"{DEFAULT_IMAGE_DIR}\""),
            "Local directory for captured frames",
        )
        .add_setting(
            "capture_command",
            &format!("\"{DEFAULT_CAPTURE_COMMAND}\""),
            "Frame grabber executable (fswebcam compatible)",
        )
        .add_commented(
            "image_url_base",
            "\"https://example.org/coop/images/\"",
            "Public URL prefix for uploaded images",
        )
        .add_section("Uploads")
        .add_commented("sftp_server", "\"sftp.example.org\"", "SFTP host")
        .add_commented("sftp_user", "\"coop\"", "SFTP user (key authentication)")
        .add_commented(
            "sftp_remote_dir",
            "\"/var/www/coop/images\"",
            "Remote image directory, cleared before each upload",
        )
        .add_commented(
            "sftp_identity",
            "\"~/.ssh/id_ed25519\"",
            "Private key for the SFTP user",
        )
        .add_section("Messaging")
        .add_commented("origin_number", "\"+15551230000\"", "Number texts are sent from")
        .add_commented(
            "recipients",
            "[\"+15551230001\"]",
            "Allowed phone numbers (receive reports, may send commands)",
        )
        .add_setting(
            "api_timeout",
            &DEFAULT_API_TIMEOUT.to_string(),
            &format!("Seconds before a messaging call is abandoned ({MINIMUM_API_TIMEOUT}-{MAXIMUM_API_TIMEOUT})"),
        )
        .build()
}

struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting written commented out, for values without a usable default.
    fn add_commented(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("# {key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.chars().count()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for (i, entry) in self.entries.into_iter().enumerate() {
            match entry {
                ConfigEntry::Section(title) => {
                    if i > 0 {
                        lines.push(String::new());
                    }
                    lines.push(title);
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(width - line.chars().count());
                    lines.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }
}
