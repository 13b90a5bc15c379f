//! Default values and limits used by configuration, the door and the loop.

// # Application

pub const EXIT_FAILURE: i32 = 1;
pub const CONFIG_FILE_NAME: &str = "coopbot.toml";
pub const APP_DIR_NAME: &str = "coopbot";
pub const LOCK_FILE_NAME: &str = "coopbot.lock";

// # Location and light

pub const DEFAULT_LOCATION: &str = "Felton, CA";
pub const DEFAULT_LATITUDE: f64 = 37.0513;
pub const DEFAULT_LONGITUDE: f64 = -122.0733;
pub const DEFAULT_SUNRISE_DELAY: i64 = 0; // minutes
pub const DEFAULT_SUNSET_DELAY: i64 = 60; // minutes
pub const DEFAULT_TIME_FORMAT: &str = "%-I:%M%p";

/// Above this the sun can stay up or down all day and there is no sunrise
/// or sunset to schedule the door from.
pub const MAXIMUM_LATITUDE: f64 = 65.0;

/// Delays beyond half a day would push the door window into the next cycle.
pub const MAXIMUM_DELAY_MINUTES: i64 = 720;

// # Control loop

pub const DEFAULT_POLL_INTERVAL: u64 = 5; // seconds
pub const MINIMUM_POLL_INTERVAL: u64 = 1;
pub const MAXIMUM_POLL_INTERVAL: u64 = 300;

// # Door and stepper

pub const DEFAULT_STATE_FILE: &str = "door.state";
pub const DOOR_STATUS_KEY: &str = "DOOR_STATUS";
pub const DEFAULT_STEPS_PER_REVOLUTION: u32 = 200; // 360 / 1.8 degree step angle
pub const DEFAULT_REVOLUTIONS: u32 = 10;
pub const MAXIMUM_STEPS_PER_REVOLUTION: u32 = 10_000;
pub const MAXIMUM_REVOLUTIONS: u32 = 1_000;

// # GPIO (BCM numbering)

pub const DEFAULT_DIR_PIN: u8 = 20;
pub const DEFAULT_STEP_PIN: u8 = 21;
pub const DEFAULT_CAMLIGHT_PIN: u8 = 19;
pub const DEFAULT_INDICATOR_PIN: u8 = 26;
pub const MAXIMUM_BCM_PIN: u8 = 27;

// # Cameras and images

pub const DEFAULT_MAX_CAMERAS: u8 = 8;
pub const DEFAULT_IMAGE_WIDTH: u32 = 1280;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 1024;
pub const DEFAULT_IMAGE_DIR: &str = "images";
pub const IMAGE_FILE_STEM: &str = "image";
pub const IMAGE_FILE_EXTENSION: &str = "jpg";
pub const DEFAULT_CAPTURE_COMMAND: &str = "fswebcam";
pub const CAMLIGHT_SETTLE_MS: u64 = 500;
pub const DEFAULT_IMAGE_URL_BASE: &str = "https://example.org/coop/images/";

// # Messaging and uploads

pub const DEFAULT_MESSAGE_PREFIX: &str = "";
pub const DEFAULT_MESSAGE_POSTFIX: &str = "\nBawwwk! 🐓🤖";
pub const DEFAULT_API_TIMEOUT: u64 = 20; // seconds
pub const MINIMUM_API_TIMEOUT: u64 = 1;
pub const MAXIMUM_API_TIMEOUT: u64 = 120;
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
pub const TWILIO_SID_ENV: &str = "TWILIO_ACCOUNT_SID";
pub const TWILIO_TOKEN_ENV: &str = "TWILIO_AUTH_TOKEN";
pub const CAPTURE_TIMEOUT_SECS: u64 = 15;
pub const CONSOLE_RECIPIENT: &str = "console";

// # Simulation

pub const DEFAULT_SIMULATION_MULTIPLIER: f64 = 3600.0;
