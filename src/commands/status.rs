//! Status command - print what the daemon would report, without touching hardware.
//!
//! The door position comes from the stored record; the light report is
//! computed for the current time. Nothing is written and no lock is taken.

use anyhow::Result;

use crate::camera::CameraRig;
use crate::common::utils::private_path;
use crate::config::Config;
use crate::door;
use crate::hardware::{DetachedRig, HardwareError};
use crate::io::lock;
use crate::solar::SolarClock;

/// Handle the status command.
pub fn handle_status_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let config = Config::load()?;
    let clock = SolarClock::new(&config)?;
    let now = crate::time_source::now().with_timezone(&clock.timezone());

    match lock::running_instance(&lock::lock_path()) {
        Some(pid) => log_block_start!("coopbot is running (PID: {pid})"),
        None => log_block_start!("coopbot is not running"),
    }

    let state_file = door::open_state_file(&config)?;
    match state_file.read() {
        Ok(Some(position)) => log_decorated!("Door: {position}"),
        Ok(None) => log_decorated!("Door: no record yet (CLOSED is assumed)"),
        Err(e) => log_warning!("{e:#}"),
    }
    if debug_enabled {
        log_indented!("Record: {}", private_path(state_file.path()));
    }

    log_block_start!("Light in {}:", clock.location());
    for line in clock.report(now).lines() {
        log_indented!("{}", line);
    }
    log_indented!(
        "Door window today: {} to {}",
        clock.door_open(now).format("%H:%M %Z"),
        clock.door_close(now).format("%H:%M %Z")
    );
    clock.log_times(now);

    log_block_start!("Cameras:");
    let lamp = DetachedRig::new(HardwareError::Unavailable(
        "not needed for status".to_string(),
    ));
    let camera = CameraRig::new(&config, Box::new(lamp))?;
    log_indented!("{}", camera.report().trim());

    log_end!();
    Ok(())
}
