//! Astronomical sunrise/sunset lookup and the day-boundary correction.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::common::constants::MAXIMUM_LATITUDE;

/// Source of raw sunrise/sunset instants for a calendar date.
pub trait Ephemeris {
    fn sunrise_utc(&self, date: NaiveDate) -> DateTime<Utc>;
    fn sunset_utc(&self, date: NaiveDate) -> DateTime<Utc>;
}

/// Ephemeris backed by the `sunrise` crate.
#[derive(Debug, Clone)]
pub struct SunriseEphemeris {
    coordinates: Coordinates,
}

impl SunriseEphemeris {
    /// Fails outside ±[`MAXIMUM_LATITUDE`], where the `sunrise` crate has no
    /// event to return on polar days and nights.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if latitude.abs() > MAXIMUM_LATITUDE {
            anyhow::bail!(
                "Latitude {latitude:.4}° is beyond ±{MAXIMUM_LATITUDE}°; sunrise and sunset are not defined every day there"
            );
        }
        let coordinates = Coordinates::new(latitude, longitude).ok_or_else(|| {
            anyhow::anyhow!("Invalid coordinates: {latitude:.4}°, {longitude:.4}°")
        })?;
        Ok(Self { coordinates })
    }

    fn event(&self, date: NaiveDate, event: SolarEvent) -> DateTime<Utc> {
        SolarDay::new(self.coordinates.clone(), date).event_time(event)
    }
}

impl Ephemeris for SunriseEphemeris {
    fn sunrise_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        self.event(date, SolarEvent::Sunrise)
    }

    fn sunset_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        self.event(date, SolarEvent::Sunset)
    }
}

/// Keep sunset after sunrise.
///
/// Near local midnight some longitudes get a sunset from the previous cycle;
/// when that happens the sunset for the following day is used instead.
pub fn correct_sunset<Tz, F>(
    sunrise: DateTime<Tz>,
    sunset: DateTime<Tz>,
    next_day_sunset: F,
) -> DateTime<Tz>
where
    Tz: TimeZone,
    F: FnOnce() -> DateTime<Tz>,
{
    if sunset < sunrise {
        next_day_sunset()
    } else {
        sunset
    }
}
