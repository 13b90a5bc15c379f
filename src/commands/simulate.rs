//! Implementation of the simulate command for testing time-based behavior.
//!
//! This command installs a simulated time source and runs the daemon against
//! it with log-only hardware, no cameras and console texts, so a whole day of
//! door moves can be watched in seconds. The real door record is never
//! written.

use anyhow::Result;
use chrono::{Local, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::coopbot::Coopbot;
use crate::logger::Log;
use crate::time_source::{self, SimulatedTimeSource};

/// Handle the simulate command.
///
/// # Arguments
/// * `start_time` - Start time in format "YYYY-MM-DD HH:MM:SS", observer timezone
/// * `end_time` - End time in the same format
/// * `multiplier` - Time acceleration factor
/// * `debug_enabled` - Whether debug mode is enabled
/// * `log_to_file` - Write the run to `coopbot-simulation-<stamp>.log` instead of stdout
pub fn handle_simulate_command(
    start_time: String,
    end_time: String,
    multiplier: f64,
    debug_enabled: bool,
    log_to_file: bool,
) -> Result<()> {
    let config = Config::load()?;
    let timezone = config.observer_timezone()?;

    let start = time_source::parse_datetime_in_tz(&start_time, timezone)
        .map_err(|e| anyhow::anyhow!("Invalid start time: {e}"))?;
    let end = time_source::parse_datetime_in_tz(&end_time, timezone)
        .map_err(|e| anyhow::anyhow!("Invalid end time: {e}"))?;

    if end <= start {
        anyhow::bail!("End time must be after start time");
    }

    // Installed before any logging so every line carries a simulated timestamp
    let sim_source = Arc::new(SimulatedTimeSource::new(
        start.with_timezone(&Utc),
        end.with_timezone(&Utc),
        multiplier,
    ));
    time_source::init_time_source(sim_source);
    Log::set_observer_timezone(timezone);

    let _log_guard = if log_to_file {
        let log_filename = format!(
            "coopbot-simulation-{}.log",
            Local::now().format("%Y%m%d-%H%M%S")
        );
        log_block_start!("Writing simulation output to {log_filename}");
        log_end!();
        Some(Log::start_file_logging(log_filename)?)
    } else {
        None
    };

    log_version!();
    log_block_start!("Simulation Mode");

    let duration = end.signed_duration_since(start);
    log_decorated!(
        "Simulating from {} to {} ({})",
        start.format("%Y-%m-%d %H:%M:%S"),
        end.format("%Y-%m-%d %H:%M:%S"),
        timezone
    );
    log_indented!(
        "Total simulated time: {} hours {} minutes",
        duration.num_hours(),
        duration.num_minutes() % 60
    );
    log_indented!(
        "Time acceleration: {}x (will complete in ~{:.1} seconds)",
        multiplier,
        duration.num_seconds() as f64 / multiplier
    );
    log_indented!("Hardware, cameras and texts are simulated");

    if debug_enabled {
        log_pipe!();
        log_debug!("Simulated time source initialized");
    }

    Coopbot::new(debug_enabled)
        .simulated()
        .without_headers()
        .with_config(config)
        .run()
}
