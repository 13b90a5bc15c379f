//! Raspberry Pi GPIO implementation of the rig.
//!
//! The indicator and the camera light are wired active-low: driving the pin
//! low lights them.

use rppal::gpio::{Gpio, OutputPin};
use std::time::Duration;

use super::{Direction, HardwareError, Lamp, StepperActuator};
use crate::config::Config;
use crate::common::constants::*;

pub struct GpioStepper {
    dir: OutputPin,
    step: OutputPin,
    indicator: OutputPin,
}

pub struct GpioLamp {
    camlight: OutputPin,
}

pub struct GpioRig;

impl GpioRig {
    /// Open `/dev/gpiomem` and claim the four configured output lines.
    pub fn open(config: &Config) -> Result<(GpioStepper, GpioLamp), HardwareError> {
        let gpio = Gpio::new().map_err(|e| HardwareError::Unavailable(e.to_string()))?;

        let claim = |pin: u8| -> Result<OutputPin, HardwareError> {
            gpio.get(pin)
                .map(|p| p.into_output())
                .map_err(|e| HardwareError::Failure(format!("GPIO {pin}: {e}")))
        };

        let dir = claim(config.dir_pin.unwrap_or(DEFAULT_DIR_PIN))?;
        let mut step = claim(config.step_pin.unwrap_or(DEFAULT_STEP_PIN))?;
        let indicator = claim(config.indicator_pin.unwrap_or(DEFAULT_INDICATOR_PIN))?;
        let mut camlight = claim(config.camlight_pin.unwrap_or(DEFAULT_CAMLIGHT_PIN))?;

        step.set_low();
        camlight.set_high();

        Ok((
            GpioStepper {
                dir,
                step,
                indicator,
            },
            GpioLamp { camlight },
        ))
    }
}

impl StepperActuator for GpioStepper {
    fn rotate(
        &mut self,
        direction: Direction,
        steps: u32,
        step_delay: Duration,
    ) -> Result<(), HardwareError> {
        match direction {
            Direction::Clockwise => self.dir.set_high(),
            Direction::CounterClockwise => self.dir.set_low(),
        }

        // Blocks for the full traversal; physical time, not the loop clock
        for _ in 0..steps {
            self.step.set_high();
            std::thread::sleep(step_delay);
            self.step.set_low();
            std::thread::sleep(step_delay);
        }
        Ok(())
    }

    fn set_indicator(&mut self, lit: bool) -> Result<(), HardwareError> {
        if lit {
            self.indicator.set_low();
        } else {
            self.indicator.set_high();
        }
        Ok(())
    }
}

impl Drop for GpioStepper {
    fn drop(&mut self) {
        self.step.set_low();
    }
}

impl Lamp for GpioLamp {
    fn set_camlight(&mut self, lit: bool) -> Result<(), HardwareError> {
        if lit {
            self.camlight.set_low();
        } else {
            self.camlight.set_high();
        }
        Ok(())
    }
}

impl Drop for GpioLamp {
    fn drop(&mut self) {
        self.camlight.set_high();
    }
}
