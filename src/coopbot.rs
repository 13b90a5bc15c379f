//! Application runner that manages the complete lifecycle of the daemon.
//!
//! This module handles resource acquisition and hands everything to the
//! [`Coordinator`]. It manages:
//! - Configuration loading
//! - Lock file management for single-instance enforcement
//! - Signal handler setup
//! - GPIO, camera and messaging collaborators
//!
//! The `Coopbot` struct uses a builder pattern to support different startup contexts:
//! - Normal startup: `Coopbot::new(debug_enabled).run()`
//! - Simulation mode: `Coopbot::new(debug_enabled).simulated().without_headers().run()`

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::{
    camera::CameraRig,
    comms::Comms,
    config::{self, Config},
    core::{Coordinator, CoordinatorParams},
    door::{self, DoorController, StateFile},
    hardware::Rig,
    io::{lock, signals::setup_signal_handler},
    logger::Log,
    solar::SolarClock,
};

/// Builder for configuring and running the coop daemon.
///
/// # Examples
///
/// ```no_run
/// use coopbot::Coopbot;
///
/// # fn main() -> anyhow::Result<()> {
/// // Normal application startup
/// Coopbot::new(false).run()?;
///
/// // Dry run against whatever time source is installed
/// Coopbot::new(true).simulated().without_headers().run()?;
/// # Ok(())
/// # }
/// ```
pub struct Coopbot {
    debug_enabled: bool,
    simulated: bool,
    show_headers: bool,
    config: Option<Config>,
}

impl Coopbot {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            simulated: false,
            show_headers: true,
            config: None,
        }
    }

    /// Use log-only hardware, no cameras, console texts and a scratch door
    /// record. No lock is taken.
    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }

    /// Skip header display (the caller already printed one)
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Use an already loaded configuration instead of reading it again
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Run until a shutdown signal arrives or the simulation ends.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();

            if self.debug_enabled {
                log_pipe!();
                log_debug!("Debug mode enabled - showing solar times and every poll");
            }
        }

        let config = match self.config {
            Some(config) => config,
            None => Config::load()?,
        };

        // Held until the coordinator returns
        let _lock = if self.simulated {
            None
        } else {
            let lock = lock::acquire_lock()?;
            log_block_start!("Lock acquired, starting coopbot...");
            Some(lock)
        };

        let signal_state = setup_signal_handler()?;

        let config_path = config::get_config_path().ok();
        config.log_config(config_path.as_deref());

        let clock = SolarClock::new(&config).context("Failed to set up the solar clock")?;
        Log::set_observer_timezone(clock.timezone());

        // The scratch directory must outlive the coordinator
        let (rig, state_file, _scratch) = if self.simulated {
            let (state_file, scratch) = scratch_state_file(&config)?;
            (Rig::simulated(), state_file, Some(scratch))
        } else {
            (Rig::acquire(&config), door::open_state_file(&config)?, None)
        };

        let door = DoorController::new(&config, state_file, rig.stepper);
        let camera = if self.simulated {
            CameraRig::without_cameras(&config, rig.lamp)?
        } else {
            CameraRig::new(&config, rig.lamp)?
        };
        let comms = Comms::connect(&config, self.simulated)?;

        let mut coordinator = Coordinator::new(CoordinatorParams {
            clock,
            door,
            camera,
            comms,
            poll_interval: config.poll_interval(),
        });

        coordinator.run(&signal_state)?;

        log_end!();
        Ok(())
    }
}

/// Door record in a temporary directory, seeded from the real record.
fn scratch_state_file(config: &Config) -> Result<(StateFile, TempDir)> {
    let scratch = tempfile::tempdir().context("Failed to create simulation directory")?;
    let state_file = StateFile::new(scratch.path().join(crate::common::constants::DEFAULT_STATE_FILE));

    let stored = door::open_state_file(config)
        .ok()
        .and_then(|real| real.read().ok().flatten());
    if let Some(position) = stored {
        state_file.write(position)?;
        log_decorated!("Simulation starts with the door {position}");
    }

    Ok((state_file, scratch))
}
