use super::*;
use crate::testing::FixedEphemeris;
use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::America::Los_Angeles;

/// Ephemeris that returns the sunset from the previous cycle, which lands
/// before sunrise on the same local date.
struct StaleSunsetEphemeris;

impl Ephemeris for StaleSunsetEphemeris {
    fn sunrise_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        FixedEphemeris.sunrise_utc(date)
    }

    fn sunset_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_time(NaiveTime::from_hms_opt(2, 0, 0).unwrap()))
    }
}

fn config(sunrise_delay: i64, sunset_delay: i64) -> Config {
    Config {
        location: Some("Felton, CA".to_string()),
        sunrise_delay: Some(sunrise_delay),
        sunset_delay: Some(sunset_delay),
        ..Default::default()
    }
}

fn clock(sunrise_delay: i64, sunset_delay: i64) -> SolarClock<FixedEphemeris> {
    SolarClock::with_ephemeris(
        &config(sunrise_delay, sunset_delay),
        Los_Angeles,
        FixedEphemeris,
    )
}

fn at(hour: u32, minute: u32) -> DateTime<Tz> {
    Los_Angeles
        .with_ymd_and_hms(2026, 6, 21, hour, minute, 0)
        .unwrap()
}

#[test]
fn test_door_instants_apply_delays() {
    let clock = clock(15, 60);
    let noon = at(12, 0);

    assert_eq!(clock.sunrise(noon), at(7, 0));
    assert_eq!(clock.sunset(noon), at(19, 0));
    assert_eq!(clock.door_open(noon), at(7, 15));
    assert_eq!(clock.door_close(noon), at(20, 0));
}

#[test]
fn test_light_inside_window_dark_outside() {
    let clock = clock(0, 60);

    for (hour, minute) in [(7, 1), (12, 0), (19, 30), (19, 59)] {
        let reference = at(hour, minute);
        assert!(clock.is_light(reference), "{hour}:{minute} should be light");
        assert!(!clock.is_dark(reference));
    }

    for (hour, minute) in [(0, 0), (3, 0), (6, 59), (20, 1), (23, 59)] {
        let reference = at(hour, minute);
        assert!(clock.is_dark(reference), "{hour}:{minute} should be dark");
        assert!(!clock.is_light(reference));
    }
}

#[test]
fn test_window_is_half_open() {
    let clock = clock(0, 60);

    // Exactly at door-open counts as light, exactly at door-close as dark
    assert!(clock.is_light(at(7, 0)));
    assert!(clock.is_dark(at(20, 0)));
}

#[test]
fn test_correct_sunset_keeps_ordered_pair() {
    let sunrise = at(7, 0);
    let sunset = at(19, 0);
    let corrected = correct_sunset(sunrise, sunset, || panic!("no recompute expected"));
    assert_eq!(corrected, sunset);
}

#[test]
fn test_correct_sunset_recomputes_when_before_sunrise() {
    let sunrise = at(7, 0);
    let stale = at(0, 30);
    let corrected = correct_sunset(sunrise, stale, || at(19, 0));
    assert_eq!(corrected, at(19, 0));
}

#[test]
fn test_stale_sunset_is_corrected_to_following_cycle() {
    let clock = SolarClock::with_ephemeris(&config(0, 60), Los_Angeles, StaleSunsetEphemeris);
    let noon = at(12, 0);

    let sunset = clock.sunset(noon);
    assert!(sunset > clock.sunrise(noon));
    assert_eq!(sunset, at(19, 0));
    assert!(clock.is_light(noon));
}

#[test]
fn test_report_before_sunrise_without_delay() {
    let clock = clock(0, 60);
    let report = clock.report(at(5, 0));

    assert!(report.starts_with("It is dark now in Felton, CA. Doors should be closed."));
    assert!(report.contains("The sun will rise at 7:00AM when the doors will open."));
    assert!(!report.contains("doors will open at"));
}

#[test]
fn test_report_before_sunrise_with_delay() {
    let clock = clock(30, 60);
    let report = clock.report(at(5, 0));
    assert!(report.contains("The sun will rise at 7:00AM and the doors will open at 7:30AM."));
}

#[test]
fn test_report_during_daylight() {
    let clock = clock(0, 60);
    let report = clock.report(at(12, 0));

    assert!(report.starts_with("It is daylight now in Felton, CA. Doors should be open."));
    assert!(report.contains("The sun will set at 7:00PM and the doors will close at 8:00PM."));
}

#[test]
fn test_report_after_sunset_before_close() {
    let clock = clock(0, 60);
    let report = clock.report(at(19, 30));

    // Still light: the door closes an hour after sunset
    assert!(report.starts_with("It is daylight now"));
    assert!(report.contains("The sun set at 7:00PM and the doors closed at 8:00PM."));
    assert!(report.contains("Tomorrow's sunrise is at 7:00AM."));
}

#[test]
fn test_report_after_close_without_delay() {
    let clock = clock(0, 0);
    let report = clock.report(at(22, 0));

    assert!(report.starts_with("It is dark now"));
    assert!(report.contains("The sun set at 7:00PM and the doors closed."));
}

#[test]
fn test_report_agrees_with_is_dark() {
    let clock = clock(10, 45);
    for hour in 0..24 {
        let reference = at(hour, 5);
        let report = clock.report(reference);
        assert_eq!(
            report.starts_with("It is dark"),
            clock.is_dark(reference),
            "report and is_dark disagree at {hour}:05"
        );
    }
}

#[test]
fn test_custom_time_format() {
    let config = Config {
        time_format: Some("%H:%M".to_string()),
        ..config(0, 60)
    };
    let clock = SolarClock::with_ephemeris(&config, Los_Angeles, FixedEphemeris);
    assert!(clock.report(at(5, 0)).contains("The sun will rise at 07:00"));
}

#[test]
fn test_real_ephemeris_for_felton_midsummer() {
    let config = Config {
        timezone: Some("America/Los_Angeles".to_string()),
        ..config(0, 60)
    };
    let clock = SolarClock::new(&config).unwrap();
    let noon = at(12, 0);

    let sunrise = clock.sunrise(noon);
    let sunset = clock.sunset(noon);
    assert!((5..=6).contains(&sunrise.hour()), "sunrise at {sunrise}");
    assert!((20..=21).contains(&sunset.hour()), "sunset at {sunset}");
    assert!(clock.is_light(noon));
    assert!(clock.is_dark(at(2, 0)));
}

#[test]
fn test_polar_latitudes_have_no_ephemeris() {
    for latitude in [78.2, -70.0, 65.01] {
        let err = SunriseEphemeris::new(latitude, 15.6).unwrap_err().to_string();
        assert!(err.contains("Latitude"), "unexpected error: {err}");
    }

    let config = Config {
        latitude: Some(78.2),
        longitude: Some(15.6),
        timezone: Some("Arctic/Longyearbyen".to_string()),
        ..config(0, 60)
    };
    assert!(SolarClock::new(&config).is_err());
}

#[test]
fn test_solstices_at_the_latitude_limit() {
    let ephemeris = SunriseEphemeris::new(65.0, 25.0).unwrap();
    for (month, day) in [(6, 21), (12, 21)] {
        let date = NaiveDate::from_ymd_opt(2026, month, day).unwrap();
        let sunrise = ephemeris.sunrise_utc(date);
        let sunset = ephemeris.sunset_utc(date);
        assert!(sunrise.year() >= 2026, "no sunrise on {date}: {sunrise}");
        assert!(sunset > sunrise, "sunset {sunset} not after sunrise {sunrise}");
        assert!(sunset - sunrise < Duration::hours(24));
    }
}
