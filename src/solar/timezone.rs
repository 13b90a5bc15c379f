//! Observer timezone lookup for configurations without a `timezone`.
//!
//! The zone is taken from the coop's coordinates rather than the host, so a
//! Pi left on UTC still reports door times in local wall-clock time.

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use tzf_rs::DefaultFinder;

// Building the finder decodes the bundled boundary data
static FINDER: Lazy<DefaultFinder> = Lazy::new(DefaultFinder::new);

/// IANA timezone containing the given coordinates. Falls back to UTC.
pub fn timezone_for_coordinates(latitude: f64, longitude: f64) -> Tz {
    let name = FINDER.get_tz_name(longitude, latitude);

    match name.parse::<Tz>() {
        Ok(tz) => {
            log_debug!("Timezone for {latitude:.4}°, {longitude:.4}°: {tz}");
            tz
        }
        Err(_) => {
            log_warning!("No timezone found for {latitude:.4}°, {longitude:.4}°, using UTC");
            log_indented!("Set 'timezone' in coopbot.toml to silence this warning");
            Tz::UTC
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timezone_follows_coordinates() {
        assert_eq!(
            timezone_for_coordinates(37.0513, -122.0733),
            chrono_tz::America::Los_Angeles
        );
        assert_eq!(
            timezone_for_coordinates(52.52, 13.405),
            chrono_tz::Europe::Berlin
        );
        assert_eq!(
            timezone_for_coordinates(35.6762, 139.6503),
            chrono_tz::Asia::Tokyo
        );
    }
}
