use super::builder::default_config_content;
use super::validation::validate_config;
use super::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn config_from(toml_text: &str) -> Config {
    toml::from_str(toml_text).expect("test config should parse")
}

#[test]
fn test_default_config_content_parses_and_validates() {
    let config = config_from(&default_config_content());
    assert!(validate_config(&config).is_ok());
    assert_eq!(config.location(), DEFAULT_LOCATION);
    assert_eq!(config.sunset_delay(), DEFAULT_SUNSET_DELAY);
    assert_eq!(config.steps_per_revolution(), DEFAULT_STEPS_PER_REVOLUTION);
    assert!(config.recipients().is_empty());
    assert!(!config.uploads_configured());
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = config_from("");
    assert_eq!(config.coordinates(), (DEFAULT_LATITUDE, DEFAULT_LONGITUDE));
    assert_eq!(config.poll_interval().as_secs(), DEFAULT_POLL_INTERVAL);
    assert_eq!(config.revolutions(), DEFAULT_REVOLUTIONS);
    assert_eq!(config.time_format(), DEFAULT_TIME_FORMAT);
}

#[test]
fn test_unknown_field_is_rejected() {
    let result: Result<Config, _> = toml::from_str("door_speed = 3\n");
    assert!(result.is_err());
}

#[test]
fn test_latitude_out_of_range() {
    let config = config_from("latitude = 91.0\n");
    let err = validate_config(&config).unwrap_err().to_string();
    assert!(err.contains("latitude"), "unexpected error: {err}");
}

#[test]
fn test_polar_latitude_is_rejected() {
    for latitude in ["78.2", "-70.0", "65.5"] {
        let config = config_from(&format!("latitude = {latitude}\n"));
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("polar"), "unexpected error for {latitude}: {err}");
    }

    assert!(validate_config(&config_from("latitude = 65.0\n")).is_ok());
    assert!(validate_config(&config_from("latitude = -64.9\n")).is_ok());
}

#[test]
fn test_longitude_out_of_range() {
    let config = config_from("longitude = -181.5\n");
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_unknown_timezone_is_rejected() {
    let config = config_from("timezone = \"Mars/Olympus_Mons\"\n");
    assert!(validate_config(&config).is_err());

    let config = config_from("timezone = \"America/Los_Angeles\"\n");
    assert!(validate_config(&config).is_ok());
    assert_eq!(
        config.observer_timezone().unwrap(),
        chrono_tz::America::Los_Angeles
    );
}

#[test]
fn test_timezone_defaults_to_the_coordinates() {
    let config = config_from("latitude = 52.52\nlongitude = 13.405\n");
    assert_eq!(
        config.observer_timezone().unwrap(),
        chrono_tz::Europe::Berlin
    );

    let config = config_from("latitude = 52.52\nlongitude = 13.405\ntimezone = \"Asia/Tokyo\"\n");
    assert_eq!(config.observer_timezone().unwrap(), chrono_tz::Asia::Tokyo);
}

#[test]
fn test_zero_steps_rejected() {
    let config = config_from("steps_per_revolution = 0\n");
    assert!(validate_config(&config).is_err());

    let config = config_from("revolutions = 0\n");
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_poll_interval_limits() {
    assert!(validate_config(&config_from("poll_interval = 0\n")).is_err());
    assert!(validate_config(&config_from("poll_interval = 301\n")).is_err());
    assert!(validate_config(&config_from("poll_interval = 30\n")).is_ok());
}

#[test]
fn test_delay_limits() {
    assert!(validate_config(&config_from("sunset_delay = 721\n")).is_err());
    assert!(validate_config(&config_from("sunrise_delay = -30\n")).is_ok());
}

#[test]
fn test_shared_gpio_pins_rejected() {
    let config = config_from("dir_pin = 21\nstep_pin = 21\n");
    let err = validate_config(&config).unwrap_err().to_string();
    assert!(err.contains("GPIO 21"), "unexpected error: {err}");
}

#[test]
fn test_pin_beyond_header_rejected() {
    assert!(validate_config(&config_from("indicator_pin = 40\n")).is_err());
}

#[test]
fn test_recipients_validation() {
    assert!(validate_config(&config_from("recipients = []\n")).is_err());
    assert!(validate_config(&config_from("recipients = [\"5551234\"]\n")).is_err());
    assert!(validate_config(&config_from("recipients = [\"+15551234567\"]\n")).is_ok());
}

#[test]
fn test_partial_sftp_settings_rejected() {
    let config = config_from("sftp_server = \"sftp.example.org\"\n");
    assert!(validate_config(&config).is_err());

    let config = config_from(
        "sftp_server = \"sftp.example.org\"\nsftp_user = \"coop\"\nsftp_remote_dir = \"/srv/coop\"\n",
    );
    assert!(validate_config(&config).is_ok());
    assert!(config.uploads_configured());
}

#[test]
fn test_bad_time_format_rejected() {
    assert!(validate_config(&config_from("time_format = \"%Q\"\n")).is_err());
    assert!(validate_config(&config_from("time_format = \"%H:%M\"\n")).is_ok());
}

#[test]
#[serial]
fn test_relative_state_paths_resolve_under_state_home() {
    let temp_dir = tempdir().unwrap();
    let original = std::env::var("XDG_STATE_HOME").ok();
    unsafe {
        std::env::set_var("XDG_STATE_HOME", temp_dir.path());
    }

    let config = config_from("state_file = \"door.state\"\nimage_dir = \"/srv/coop/images\"\n");
    let state_path = config.state_file_path().unwrap();
    let image_dir = config.image_dir_path().unwrap();

    unsafe {
        match original {
            Some(value) => std::env::set_var("XDG_STATE_HOME", value),
            None => std::env::remove_var("XDG_STATE_HOME"),
        }
    }

    assert_eq!(state_path, temp_dir.path().join("coopbot").join("door.state"));
    assert_eq!(image_dir, std::path::PathBuf::from("/srv/coop/images"));
}

#[test]
fn test_load_from_path_reads_and_validates() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("coopbot.toml");

    fs::write(&path, "location = \"Bolinas\"\nsunset_delay = 30\n").unwrap();
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.location(), "Bolinas");
    assert_eq!(config.sunset_delay(), 30);

    fs::write(&path, "latitude = 120.0\n").unwrap();
    assert!(load_from_path(&path).is_err());

    assert!(load_from_path(&temp_dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_create_default_config_writes_loadable_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("coopbot.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.coordinates(), (DEFAULT_LATITUDE, DEFAULT_LONGITUDE));
}
