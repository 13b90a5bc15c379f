//! Configuration validation.
//!
//! Rejects settings that would leave the door or the messaging layer in an
//! impossible state before any hardware is touched.

use anyhow::Result;
use chrono_tz::Tz;

use super::Config;
use crate::common::constants::*;

pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lat) = config.latitude
        && lat.abs() > MAXIMUM_LATITUDE
    {
        anyhow::bail!(
            "latitude {} is beyond ±{}°, where polar days and nights have no sunrise or sunset",
            lat,
            MAXIMUM_LATITUDE
        );
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(name) = config.timezone.as_deref()
        && name.parse::<Tz>().is_err()
    {
        anyhow::bail!("timezone '{}' is not a known IANA timezone name", name);
    }

    for (field, value) in [
        ("sunrise_delay", config.sunrise_delay),
        ("sunset_delay", config.sunset_delay),
    ] {
        if let Some(minutes) = value
            && minutes.abs() > MAXIMUM_DELAY_MINUTES
        {
            anyhow::bail!(
                "{} ({} minutes) must be within ±{} minutes",
                field,
                minutes,
                MAXIMUM_DELAY_MINUTES
            );
        }
    }

    if let Some(format) = config.time_format.as_deref() {
        validate_time_format(format)?;
    }

    if let Some(interval) = config.poll_interval
        && !(MINIMUM_POLL_INTERVAL..=MAXIMUM_POLL_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "poll_interval ({} s) must be between {} and {} seconds",
            interval,
            MINIMUM_POLL_INTERVAL,
            MAXIMUM_POLL_INTERVAL
        );
    }

    if let Some(steps) = config.steps_per_revolution
        && !(1..=MAXIMUM_STEPS_PER_REVOLUTION).contains(&steps)
    {
        anyhow::bail!(
            "steps_per_revolution ({}) must be between 1 and {}",
            steps,
            MAXIMUM_STEPS_PER_REVOLUTION
        );
    }

    if let Some(revs) = config.revolutions
        && !(1..=MAXIMUM_REVOLUTIONS).contains(&revs)
    {
        anyhow::bail!(
            "revolutions ({}) must be between 1 and {}",
            revs,
            MAXIMUM_REVOLUTIONS
        );
    }

    validate_pins(config)?;

    if let Some(timeout) = config.api_timeout
        && !(MINIMUM_API_TIMEOUT..=MAXIMUM_API_TIMEOUT).contains(&timeout)
    {
        anyhow::bail!(
            "api_timeout ({} s) must be between {} and {} seconds",
            timeout,
            MINIMUM_API_TIMEOUT,
            MAXIMUM_API_TIMEOUT
        );
    }

    if let Some(recipients) = config.recipients.as_ref() {
        if recipients.is_empty() {
            anyhow::bail!("recipients must list at least one phone number");
        }
        for number in recipients {
            validate_phone_number("recipients", number)?;
        }
    }

    if let Some(origin) = config.origin_number.as_deref() {
        validate_phone_number("origin_number", origin)?;
    }

    if let Some(base) = config.image_url_base.as_deref()
        && !(base.starts_with("https://") || base.starts_with("http://"))
    {
        anyhow::bail!("image_url_base must be an http(s) URL (got '{}')", base);
    }

    let sftp_fields = [
        config.sftp_server.is_some(),
        config.sftp_user.is_some(),
        config.sftp_remote_dir.is_some(),
    ];
    if sftp_fields.iter().any(|set| *set) && !sftp_fields.iter().all(|set| *set) {
        anyhow::bail!("sftp_server, sftp_user and sftp_remote_dir must be set together");
    }

    Ok(())
}

fn validate_pins(config: &Config) -> Result<()> {
    let pins = [
        ("dir_pin", config.dir_pin.unwrap_or(DEFAULT_DIR_PIN)),
        ("step_pin", config.step_pin.unwrap_or(DEFAULT_STEP_PIN)),
        (
            "indicator_pin",
            config.indicator_pin.unwrap_or(DEFAULT_INDICATOR_PIN),
        ),
        (
            "camlight_pin",
            config.camlight_pin.unwrap_or(DEFAULT_CAMLIGHT_PIN),
        ),
    ];

    for (name, pin) in pins {
        if pin > MAXIMUM_BCM_PIN {
            anyhow::bail!("{} ({}) must be a BCM pin between 0 and {}", name, pin, MAXIMUM_BCM_PIN);
        }
    }

    for (i, (name_a, pin_a)) in pins.iter().enumerate() {
        for (name_b, pin_b) in pins.iter().skip(i + 1) {
            if pin_a == pin_b {
                anyhow::bail!("{} and {} cannot share GPIO {}", name_a, name_b, pin_a);
            }
        }
    }

    Ok(())
}

fn validate_phone_number(field: &str, number: &str) -> Result<()> {
    let digits = number.strip_prefix('+').unwrap_or("");
    if digits.len() < 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!(
            "{} entry '{}' must be an E.164 number such as +15551234567",
            field,
            number
        );
    }
    Ok(())
}

fn validate_time_format(format: &str) -> Result<()> {
    use chrono::format::{Item, StrftimeItems};

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        anyhow::bail!("time_format '{}' is not a valid strftime pattern", format);
    }
    Ok(())
}
