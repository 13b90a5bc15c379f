//! Deterministic stand-ins for the clock and the stepper.
//!
//! Compiled for unit tests and for integration tests through the
//! `testing-support` feature.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::hardware::{Direction, HardwareError, StepperActuator};
use crate::solar::Ephemeris;

/// Sunrise at 14:00 UTC and sunset at 02:00 UTC the next day, every day.
///
/// In Los Angeles during daylight time that is 7:00AM to 7:00PM.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedEphemeris;

impl Ephemeris for FixedEphemeris {
    fn sunrise_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_time(NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default()))
    }

    fn sunset_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        let next = date.succ_opt().unwrap_or(date);
        Utc.from_utc_datetime(&next.and_time(NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default()))
    }
}

/// One call made to a [`RecordingStepper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepperCall {
    Rotate { direction: Direction, steps: u32 },
    Indicator(bool),
}

/// Stepper that records every call and optionally fails rotations.
#[derive(Debug, Clone, Default)]
pub struct RecordingStepper {
    calls: Arc<Mutex<Vec<StepperCall>>>,
    fault: Option<HardwareError>,
}

impl RecordingStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stepper whose rotations all fail with `fault`.
    pub fn failing(fault: HardwareError) -> Self {
        Self {
            fault: Some(fault),
            ..Self::default()
        }
    }

    /// Calls seen so far, shared across clones.
    pub fn calls(&self) -> Vec<StepperCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: StepperCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl StepperActuator for RecordingStepper {
    fn rotate(
        &mut self,
        direction: Direction,
        steps: u32,
        _step_delay: Duration,
    ) -> Result<(), HardwareError> {
        self.record(StepperCall::Rotate { direction, steps });
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    fn set_indicator(&mut self, lit: bool) -> Result<(), HardwareError> {
        self.record(StepperCall::Indicator(lit));
        Ok(())
    }
}
