//! Clock abstraction for the control loop.
//!
//! The coordinator never calls `Utc::now()` or `thread::sleep` directly; it goes
//! through this module so `coopbot simulate` can drive a whole day of door
//! decisions in a few seconds against a simulated clock.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Source of "now" and of sleeping.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for `duration` (or advance simulated time by it).
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool;

    /// Whether a simulated run has reached its end time. Always false for real time.
    fn is_ended(&self) -> bool {
        false
    }
}

/// Wall clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Accelerated clock between two instants.
///
/// With a multiplier of `0.0` every sleep jumps forward instantly
/// (fast-forward); otherwise simulated time runs `multiplier` times faster
/// than real time.
pub struct SimulatedTimeSource {
    end_time: DateTime<Utc>,
    multiplier: f64,
    current: Mutex<DateTime<Utc>>,
}

impl SimulatedTimeSource {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>, multiplier: f64) -> Self {
        Self {
            end_time,
            multiplier: if multiplier < 0.0 { 0.0 } else { multiplier },
            current: Mutex::new(start_time),
        }
    }

    fn advance(&self, duration: StdDuration) -> StdDuration {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let remaining = (self.end_time - *current).to_std().unwrap_or(StdDuration::ZERO);
        let step = duration.min(remaining);
        *current += ChronoDuration::from_std(step).unwrap_or_else(|_| ChronoDuration::zero());
        step
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep(&self, duration: StdDuration) {
        let step = self.advance(duration);
        if self.multiplier > 0.0 {
            std::thread::sleep(StdDuration::from_secs_f64(
                step.as_secs_f64() / self.multiplier,
            ));
        } else {
            // Yield so the log writer keeps up in fast-forward mode
            std::thread::sleep(StdDuration::from_millis(1));
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        self.now() >= self.end_time
    }
}

/// Install the process-wide time source. Only the first call has an effect.
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

pub fn is_initialized() -> bool {
    TIME_SOURCE.get().is_some()
}

fn source() -> &'static Arc<dyn TimeSource> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource))
}

pub fn now() -> DateTime<Utc> {
    source().now()
}

pub fn sleep(duration: StdDuration) {
    source().sleep(duration)
}

pub fn is_simulated() -> bool {
    source().is_simulated()
}

pub fn simulation_ended() -> bool {
    source().is_ended()
}

/// Parse `YYYY-MM-DD HH:MM:SS` as a wall-clock time in `tz`.
pub fn parse_datetime_in_tz(s: &str, tz: Tz) -> Result<DateTime<Tz>, String> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))?;
    tz.from_local_datetime(&naive)
        .single()
        .ok_or_else(|| format!("Ambiguous or invalid time in timezone {tz}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_forward_advances_and_caps() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 4, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 1, 4, 0, 30).unwrap();
        let clock = SimulatedTimeSource::new(start, end, 0.0);

        clock.sleep(StdDuration::from_secs(10));
        assert_eq!(clock.now(), start + ChronoDuration::seconds(10));
        assert!(!clock.is_ended());

        clock.sleep(StdDuration::from_secs(60));
        assert_eq!(clock.now(), end);
        assert!(clock.is_ended());
    }

    #[test]
    fn test_parse_datetime_in_tz() {
        let tz: Tz = "America/Los_Angeles".parse().unwrap();
        let dt = parse_datetime_in_tz("2026-06-21 05:30:00", tz).unwrap();
        assert_eq!(dt.with_timezone(&Utc).format("%H:%M").to_string(), "12:30");

        assert!(parse_datetime_in_tz("06/21/2026", tz).is_err());
    }
}
