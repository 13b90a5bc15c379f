//! Owned handles for the coop's physical outputs.
//!
//! The rig is acquired once at startup and split into two handles: the
//! stepper (direction, step and indicator lines) goes to the door controller,
//! the camera light goes to the camera rig. When GPIO cannot be opened the
//! handles are detached: every call reports [`HardwareError::Unavailable`] and
//! the daemon keeps running.

pub mod gpio;
pub mod simulated;

use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    /// GPIO could not be acquired (not a Pi, no permission, missing device).
    #[error("hardware unavailable: {0}")]
    Unavailable(String),
    /// The hardware was acquired but an operation on it failed.
    #[error("hardware failure: {0}")]
    Failure(String),
}

/// Stepper rotation direction. Opening turns clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Clockwise => write!(f, "clockwise"),
            Direction::CounterClockwise => write!(f, "counter-clockwise"),
        }
    }
}

/// Door motor plus the closed-door indicator.
#[cfg_attr(test, mockall::automock)]
pub trait StepperActuator {
    /// Pulse the step line `steps` times, waiting `step_delay` after each edge.
    fn rotate(
        &mut self,
        direction: Direction,
        steps: u32,
        step_delay: Duration,
    ) -> Result<(), HardwareError>;

    fn set_indicator(&mut self, lit: bool) -> Result<(), HardwareError>;
}

/// Light switched on around camera captures.
#[cfg_attr(test, mockall::automock)]
pub trait Lamp {
    fn set_camlight(&mut self, lit: bool) -> Result<(), HardwareError>;
}

/// Both hardware handles, ready to hand to their owners.
pub struct Rig {
    pub stepper: Box<dyn StepperActuator>,
    pub lamp: Box<dyn Lamp>,
}

impl Rig {
    /// Claim the configured GPIO lines, falling back to detached handles.
    pub fn acquire(config: &Config) -> Self {
        match gpio::GpioRig::open(config) {
            Ok((stepper, lamp)) => {
                log_decorated!("GPIO rig acquired");
                Self {
                    stepper: Box::new(stepper),
                    lamp: Box::new(lamp),
                }
            }
            Err(e) => {
                log_warning!("GPIO rig not available: {e}");
                log_indented!("Door moves and the camera light will be skipped");
                Self::detached(e)
            }
        }
    }

    /// Handles that fail every call with `reason`.
    pub fn detached(reason: HardwareError) -> Self {
        Self {
            stepper: Box::new(DetachedRig::new(reason.clone())),
            lamp: Box::new(DetachedRig::new(reason)),
        }
    }

    /// Log-only handles for dry runs.
    pub fn simulated() -> Self {
        Self {
            stepper: Box::new(simulated::SimulatedStepper::default()),
            lamp: Box::new(simulated::SimulatedLamp),
        }
    }
}

/// Stand-in used when GPIO could not be acquired.
#[derive(Debug, Clone)]
pub struct DetachedRig {
    reason: HardwareError,
}

impl DetachedRig {
    pub fn new(reason: HardwareError) -> Self {
        Self { reason }
    }
}

impl StepperActuator for DetachedRig {
    fn rotate(&mut self, _: Direction, _: u32, _: Duration) -> Result<(), HardwareError> {
        Err(self.reason.clone())
    }

    fn set_indicator(&mut self, _: bool) -> Result<(), HardwareError> {
        Err(self.reason.clone())
    }
}

impl Lamp for DetachedRig {
    fn set_camlight(&mut self, _: bool) -> Result<(), HardwareError> {
        Err(self.reason.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_rig_reports_reason() {
        let reason = HardwareError::Unavailable("no /dev/gpiomem".to_string());
        let mut rig = Rig::detached(reason.clone());

        assert_eq!(
            rig.stepper
                .rotate(Direction::Clockwise, 10, Duration::ZERO)
                .unwrap_err(),
            reason
        );
        assert_eq!(rig.stepper.set_indicator(true).unwrap_err(), reason);
        assert_eq!(rig.lamp.set_camlight(true).unwrap_err(), reason);
    }

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let unavailable = HardwareError::Unavailable("x".into());
        let failure = HardwareError::Failure("x".into());
        assert_ne!(unavailable, failure);
        assert!(unavailable.to_string().starts_with("hardware unavailable"));
        assert!(failure.to_string().starts_with("hardware failure"));
    }
}
