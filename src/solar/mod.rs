//! Sunrise/sunset tracking and the door window derived from it.
//!
//! A [`SolarClock`] answers one question for the control loop: should the door
//! be open at a given instant? The door window is
//!
//! ```text
//! door_open  = sunrise + sunrise_delay
//! door_close = sunset  + sunset_delay
//! light      = door_open <= reference < door_close
//! ```
//!
//! All instants are computed on demand for the reference's local calendar date
//! in the observer timezone. Nothing is cached, so the status text produced by
//! [`SolarClock::report`] always uses the same instants that drive the door.

pub mod ephemeris;
pub mod timezone;

use anyhow::Result;
use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use crate::config::Config;
pub use ephemeris::{Ephemeris, SunriseEphemeris, correct_sunset};

pub struct SolarClock<E: Ephemeris = SunriseEphemeris> {
    location: String,
    sunrise_delay: Duration,
    sunset_delay: Duration,
    timezone: Tz,
    time_format: String,
    ephemeris: E,
}

impl SolarClock<SunriseEphemeris> {
    /// Build the clock for the configured location.
    pub fn new(config: &Config) -> Result<Self> {
        let (latitude, longitude) = config.coordinates();
        let ephemeris = SunriseEphemeris::new(latitude, longitude)?;
        Ok(Self::with_ephemeris(config, config.observer_timezone()?, ephemeris))
    }
}

impl<E: Ephemeris> SolarClock<E> {
    pub fn with_ephemeris(config: &Config, timezone: Tz, ephemeris: E) -> Self {
        Self {
            location: config.location().to_string(),
            sunrise_delay: Duration::minutes(config.sunrise_delay()),
            sunset_delay: Duration::minutes(config.sunset_delay()),
            timezone,
            time_format: config.time_format().to_string(),
            ephemeris,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Sunrise on the reference's local date.
    pub fn sunrise(&self, reference: DateTime<Tz>) -> DateTime<Tz> {
        let date = reference.with_timezone(&self.timezone).date_naive();
        self.ephemeris
            .sunrise_utc(date)
            .with_timezone(&self.timezone)
    }

    /// Sunset on the reference's local date, never earlier than that date's sunrise.
    pub fn sunset(&self, reference: DateTime<Tz>) -> DateTime<Tz> {
        let date = reference.with_timezone(&self.timezone).date_naive();
        let sunset = self.ephemeris.sunset_utc(date).with_timezone(&self.timezone);

        correct_sunset(self.sunrise(reference), sunset, || {
            let tomorrow = (reference + Duration::days(1))
                .with_timezone(&self.timezone)
                .date_naive();
            self.ephemeris
                .sunset_utc(tomorrow)
                .with_timezone(&self.timezone)
        })
    }

    pub fn door_open(&self, reference: DateTime<Tz>) -> DateTime<Tz> {
        self.sunrise(reference) + self.sunrise_delay
    }

    pub fn door_close(&self, reference: DateTime<Tz>) -> DateTime<Tz> {
        self.sunset(reference) + self.sunset_delay
    }

    /// Dark unless `door_open <= reference < door_close`.
    pub fn is_dark(&self, reference: DateTime<Tz>) -> bool {
        let open = self.door_open(reference);
        let close = self.door_close(reference);
        !(open <= reference && reference < close)
    }

    pub fn is_light(&self, reference: DateTime<Tz>) -> bool {
        !self.is_dark(reference)
    }

    /// Light status and the next door transition, as sent to recipients.
    pub fn report(&self, reference: DateTime<Tz>) -> String {
        let sunrise = self.sunrise(reference);
        let sunset = self.sunset(reference);
        let open = sunrise + self.sunrise_delay;
        let close = sunset + self.sunset_delay;
        let dark = !(open <= reference && reference < close);

        let mut text = if dark {
            format!(
                "It is dark now in {}. Doors should be closed.\n",
                self.location
            )
        } else {
            format!(
                "It is daylight now in {}. Doors should be open.\n",
                self.location
            )
        };

        if reference < sunrise {
            text.push_str(&format!("The sun will rise at {}", self.format_time(sunrise)));
            if sunrise == open {
                text.push_str(" when the doors will open.");
            } else {
                text.push_str(&format!(
                    " and the doors will open at {}.",
                    self.format_time(open)
                ));
            }
        } else if reference < sunset {
            text.push_str(&format!("The sun will set at {}", self.format_time(sunset)));
            if sunset == close {
                text.push_str(" when the doors will close.");
            } else {
                text.push_str(&format!(
                    " and the doors will close at {}.",
                    self.format_time(close)
                ));
            }
        } else {
            text.push_str(&format!("The sun set at {}", self.format_time(sunset)));
            if sunset == close {
                text.push_str(" and the doors closed.");
            } else {
                text.push_str(&format!(" and the doors closed at {}.", self.format_time(close)));
            }
            let tomorrow = self.sunrise(reference + Duration::days(1));
            text.push_str(&format!(
                " Tomorrow's sunrise is at {}.",
                self.format_time(tomorrow)
            ));
        }

        text
    }

    /// Log today's instants at debug level.
    pub fn log_times(&self, reference: DateTime<Tz>) {
        if !crate::logger::Log::is_debug() {
            return;
        }
        log_debug!("Solar times for {}:", self.location);
        log_indented!("Sunrise:    {}", self.sunrise(reference).format("%H:%M:%S %Z"));
        log_indented!("Door open:  {}", self.door_open(reference).format("%H:%M:%S %Z"));
        log_indented!("Sunset:     {}", self.sunset(reference).format("%H:%M:%S %Z"));
        log_indented!("Door close: {}", self.door_close(reference).format("%H:%M:%S %Z"));
    }

    fn format_time(&self, instant: DateTime<Tz>) -> String {
        instant.format(&self.time_format).to_string()
    }
}

#[cfg(test)]
mod tests;
