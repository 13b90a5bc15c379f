//! Take a round of photos and text them to every recipient.

use anyhow::Result;

use crate::camera::CameraRig;
use crate::comms::Comms;
use crate::config::Config;
use crate::core::PHOTOS_TEXT;
use crate::hardware::Rig;
use crate::io::lock;

/// Handle the `photo` command.
pub fn handle_photo_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let config = Config::load()?;

    // The camera light shares the GPIO rig with the stepper
    let _lock = lock::acquire_lock()?;

    let rig = Rig::acquire(&config);
    let mut camera = CameraRig::new(&config, rig.lamp)?;
    if camera.active_cameras() == 0 {
        anyhow::bail!("No cameras found");
    }

    let urls = camera.take_and_upload();
    if urls.is_empty() {
        anyhow::bail!("No photos were uploaded");
    }

    if debug_enabled {
        log_pipe!();
        for url in &urls {
            log_debug!("{url}");
        }
    }

    let comms = Comms::connect(&config, false)?;
    comms.send_text_and_photos(PHOTOS_TEXT, &urls);

    log_block_start!(
        "Sent {} photo(s) to {} recipient(s)",
        urls.len(),
        comms.recipients().len()
    );
    log_end!();
    Ok(())
}
