//! Log-only rig for `coopbot simulate` and machines without GPIO.

use std::time::Duration;

use super::{Direction, HardwareError, Lamp, StepperActuator};

#[derive(Debug, Default)]
pub struct SimulatedStepper {
    pub total_steps: u64,
}

impl StepperActuator for SimulatedStepper {
    fn rotate(
        &mut self,
        direction: Direction,
        steps: u32,
        step_delay: Duration,
    ) -> Result<(), HardwareError> {
        self.total_steps += u64::from(steps);
        log_indented!(
            "Stepper: {steps} steps {direction} ({:.1}s traversal)",
            (step_delay * 2 * steps).as_secs_f64()
        );
        Ok(())
    }

    fn set_indicator(&mut self, lit: bool) -> Result<(), HardwareError> {
        log_indented!("Indicator: {}", if lit { "on" } else { "off" });
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SimulatedLamp;

impl Lamp for SimulatedLamp {
    fn set_camlight(&mut self, lit: bool) -> Result<(), HardwareError> {
        log_debug!("Camera light: {}", if lit { "on" } else { "off" });
        Ok(())
    }
}
