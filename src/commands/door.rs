//! Open or close the door once from the command line.
//!
//! The move is a MANUAL command. MANUAL mode lives only as long as the
//! process, so the next daemon start is back in AUTOMATIC mode and will
//! return the door to wherever the light says it belongs.

use anyhow::Result;

use crate::config::Config;
use crate::door::{self, DoorController, Position};
use crate::hardware::Rig;
use crate::io::lock;

/// Handle the `open` and `close` commands.
pub fn handle_door_command(position: Position, debug_enabled: bool) -> Result<()> {
    log_version!();

    let config = Config::load()?;

    // Refuses while the daemon owns the rig
    let _lock = lock::acquire_lock()?;

    let rig = Rig::acquire(&config);
    let mut door = DoorController::new(&config, door::open_state_file(&config)?, rig.stepper);

    if debug_enabled {
        log_pipe!();
        log_debug!("Stored position: {}", door.position());
    }

    let text = match position {
        Position::Open => door.open_manual(),
        Position::Closed => door.close_manual(),
    };

    if let Some(fault) = door.last_fault() {
        log_pipe!();
        log_error!("The door may not have moved: {fault}");
        log_indented!("The record now says {}", door.position());
        log_end!();
        anyhow::bail!("Door move failed: {fault}");
    }

    log_block_start!("{}", text.trim());
    log_end!();
    Ok(())
}
