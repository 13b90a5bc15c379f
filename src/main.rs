//! Main application entry point.
//!
//! Parses the command line and hands off to the daemon runner or to one of
//! the one-shot commands. Any error that reaches this level is fatal: it is
//! printed with its full context chain and the process exits with status 1.

use coopbot::args::{self, CliAction, ParsedArgs};
use coopbot::common::constants::EXIT_FAILURE;
use coopbot::logger::Log;
use coopbot::{Coopbot, commands, config, log_end, log_error_exit, log_indented};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let result = match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => prepare(debug_enabled, config_dir).and_then(|()| Coopbot::new(debug_enabled).run()),
        CliAction::Status {
            debug_enabled,
            config_dir,
        } => prepare(debug_enabled, config_dir)
            .and_then(|()| commands::status::handle_status_command(debug_enabled)),
        CliAction::MoveDoor {
            debug_enabled,
            position,
            config_dir,
        } => prepare(debug_enabled, config_dir)
            .and_then(|()| commands::door::handle_door_command(position, debug_enabled)),
        CliAction::Photo {
            debug_enabled,
            config_dir,
        } => prepare(debug_enabled, config_dir)
            .and_then(|()| commands::photo::handle_photo_command(debug_enabled)),
        CliAction::Simulate {
            debug_enabled,
            start_time,
            end_time,
            multiplier,
            log_to_file,
            config_dir,
        } => prepare(debug_enabled, config_dir).and_then(|()| {
            commands::simulate::handle_simulate_command(
                start_time,
                end_time,
                multiplier,
                debug_enabled,
                log_to_file,
            )
        }),
    };

    if let Err(e) = result {
        log_error_exit!("{e}");
        for cause in e.chain().skip(1) {
            log_indented!("Caused by: {cause}");
        }
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }
}

/// Apply the flags every command shares.
fn prepare(debug_enabled: bool, config_dir: Option<String>) -> anyhow::Result<()> {
    Log::set_debug(debug_enabled);
    config::set_config_dir(config_dir)
}
