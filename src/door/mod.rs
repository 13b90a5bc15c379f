//! The door state machine.
//!
//! The controller tracks two things: where the door is ([`Position`],
//! persisted across restarts) and who is in charge of it ([`Mode`], volatile).
//!
//! | call            | mode   | door already there        | door elsewhere            |
//! |-----------------|--------|---------------------------|---------------------------|
//! | `open_auto`     | Auto   | nothing                   | move, report              |
//! | `open_auto`     | Manual | mode becomes Auto         | nothing (override holds)  |
//! | `open_manual`   | any    | mode becomes Auto, report | mode becomes Manual, move |
//!
//! `close_auto` and `close_manual` mirror the open calls. Automatic control
//! never reverses a manual override. It only takes control back once the
//! door already sits where the light cycle wants it.

pub mod state_file;

use anyhow::Result;
use std::time::Duration;

use crate::config::Config;
use crate::hardware::{Direction, HardwareError, StepperActuator};
pub use state_file::StateFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Open,
    Closed,
}

impl Position {
    /// Value stored in the door record.
    pub fn as_record(self) -> u8 {
        match self {
            Position::Open => 1,
            Position::Closed => 0,
        }
    }

    fn direction(self) -> Direction {
        match self {
            Position::Open => Direction::Clockwise,
            Position::Closed => Direction::CounterClockwise,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Open => write!(f, "OPEN"),
            Position::Closed => write!(f, "CLOSED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Auto,
    Manual,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Auto => write!(f, "AUTOMATIC"),
            Mode::Manual => write!(f, "MANUAL"),
        }
    }
}

pub struct DoorController {
    position: Position,
    mode: Mode,
    actuator: Box<dyn StepperActuator>,
    state_file: StateFile,
    steps: u32,
    step_delay: Duration,
    last_fault: Option<HardwareError>,
}

impl DoorController {
    /// Load the stored position and take ownership of the actuator.
    ///
    /// A missing or malformed record means the door is closed; the record is
    /// rewritten straight away. Mode always starts as [`Mode::Auto`].
    pub fn new(config: &Config, state_file: StateFile, actuator: Box<dyn StepperActuator>) -> Self {
        let position = match state_file.read() {
            Ok(Some(position)) => position,
            Ok(None) => {
                log_decorated!("No door record yet, assuming the door is CLOSED");
                Self::store(&state_file, Position::Closed);
                Position::Closed
            }
            Err(e) => {
                log_warning!("{e:#}");
                log_indented!("Assuming the door is CLOSED");
                Self::store(&state_file, Position::Closed);
                Position::Closed
            }
        };

        let steps_per_revolution = config.steps_per_revolution();
        Self {
            position,
            mode: Mode::Auto,
            actuator,
            state_file,
            steps: config.revolutions().saturating_mul(steps_per_revolution),
            step_delay: Duration::from_secs_f64(1.0 / f64::from(steps_per_revolution)),
            last_fault: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.position == Position::Open
    }

    pub fn is_closed(&self) -> bool {
        self.position == Position::Closed
    }

    /// Hardware error from the most recent move, if it had one.
    pub fn last_fault(&self) -> Option<&HardwareError> {
        self.last_fault.as_ref()
    }

    /// Open because it is light. Returns a description only when the door moved.
    pub fn open_auto(&mut self) -> Option<String> {
        self.reconcile(Position::Open)
    }

    /// Close because it is dark. Returns a description only when the door moved.
    pub fn close_auto(&mut self) -> Option<String> {
        self.reconcile(Position::Closed)
    }

    pub fn open_manual(&mut self) -> String {
        self.command(Position::Open)
    }

    pub fn close_manual(&mut self) -> String {
        self.command(Position::Closed)
    }

    /// Position and mode as sent to recipients.
    pub fn report(&self) -> String {
        let mut text = format!("The doors are currently {} ", self.position);
        match (self.mode, self.position) {
            (Mode::Auto, _) => text.push_str("in AUTOMATIC mode. "),
            (Mode::Manual, Position::Open) => {
                text.push_str("in MANUAL mode (AUTOMATIC resumes at sunset). ")
            }
            (Mode::Manual, Position::Closed) => {
                text.push_str("in MANUAL mode (AUTOMATIC resumes at sunrise). ")
            }
        }
        text
    }

    fn reconcile(&mut self, desired: Position) -> Option<String> {
        match (self.mode, self.position == desired) {
            (Mode::Auto, true) => None,
            (Mode::Auto, false) => {
                log_block_start!("Light cycle wants the door {desired} (AUTOMATIC)");
                self.move_door(desired);
                Some(moved_text(desired))
            }
            (Mode::Manual, true) => {
                log_block_start!("Door is already {desired}, resuming AUTOMATIC mode");
                self.mode = Mode::Auto;
                None
            }
            (Mode::Manual, false) => {
                log_debug!("Manual override keeps the door {}", self.position);
                None
            }
        }
    }

    fn command(&mut self, target: Position) -> String {
        log_block_start!("Request to make the door {target} (MANUAL)");
        if self.position == target {
            self.mode = Mode::Auto;
            log_indented!("Already {target}, back to AUTOMATIC mode");
            match target {
                Position::Open => "The doors are already open. ".to_string(),
                Position::Closed => "The doors are already closed. ".to_string(),
            }
        } else {
            self.mode = Mode::Manual;
            self.move_door(target);
            moved_text(target)
        }
    }

    /// Drive the stepper to `target`, light or clear the indicator, persist.
    ///
    /// Blocks for the whole traversal. Hardware faults are logged and kept as
    /// [`Self::last_fault`]; the position is recorded as changed regardless.
    fn move_door(&mut self, target: Position) {
        log_indented!(
            "Turning {} steps {} ({:.0}s)",
            self.steps,
            target.direction(),
            (self.step_delay * 2).as_secs_f64() * f64::from(self.steps)
        );

        let rotated = self
            .actuator
            .rotate(target.direction(), self.steps, self.step_delay);
        let indicated = self.actuator.set_indicator(target == Position::Closed);

        self.last_fault = rotated.and(indicated).err();
        if let Some(fault) = &self.last_fault {
            log_warning!("Door {fault}");
            log_indented!("Recording the door as {target} anyway");
        }

        self.position = target;
        Self::store(&self.state_file, target);
        log_decorated!("Door is now {target}");
    }

    fn store(state_file: &StateFile, position: Position) {
        if let Err(e) = state_file.write(position) {
            log_warning!("Failed to store door position: {e:#}");
        }
    }
}

fn moved_text(position: Position) -> String {
    match position {
        Position::Open => "I just opened the doors. ".to_string(),
        Position::Closed => "I just closed the doors. ".to_string(),
    }
}

/// Door record at the configured path.
pub fn open_state_file(config: &Config) -> Result<StateFile> {
    Ok(StateFile::new(config.state_file_path()?))
}
