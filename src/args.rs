//! Command-line argument parsing and processing.
//!
//! Flags may appear anywhere on the line. The first bare word selects the
//! command; with no command the daemon runs.

use crate::common::constants::DEFAULT_SIMULATION_MULTIPLIER;
use crate::door::Position;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the door daemon
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print the light, door and camera reports
    Status {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Move the door once and exit
    MoveDoor {
        debug_enabled: bool,
        position: Position,
        config_dir: Option<String>,
    },
    /// Take a round of photos and text them to the keepers
    Photo {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Run the daemon against a simulated clock with dry-run hardware
    Simulate {
        debug_enabled: bool,
        start_time: String,
        end_time: String,
        multiplier: f64,
        log_to_file: bool,
        config_dir: Option<String>,
    },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments, skipping the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut log_to_file = false;
        let mut config_dir: Option<String> = None;
        let mut words: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = &args_vec[i];
            match arg.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--log" => log_to_file = true,
                "--config" | "-c" => {
                    if i + 1 < args_vec.len() && !args_vec[i + 1].starts_with('-') {
                        config_dir = Some(args_vec[i + 1].clone());
                        i += 1;
                    } else {
                        log_warning!("Missing directory for --config. Usage: --config <directory>");
                        return error();
                    }
                }
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    log_warning!("Unknown option: {flag}");
                    return error();
                }
                word => words.push(word.to_string()),
            }
            i += 1;
        }

        // Version wins over help
        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }

        let (command, rest) = match words.split_first() {
            Some((command, rest)) => (command.as_str(), rest),
            None => ("run", &[][..]),
        };

        if log_to_file && command != "simulate" {
            log_warning!("--log is only supported by the simulate command");
            return error();
        }

        let action = match command {
            "run" | "status" | "open" | "close" | "photo" => {
                if let Some(extra) = rest.first() {
                    log_warning!("Unexpected argument for {command}: {extra}");
                    return error();
                }
                match command {
                    "run" => CliAction::Run {
                        debug_enabled,
                        config_dir,
                    },
                    "status" => CliAction::Status {
                        debug_enabled,
                        config_dir,
                    },
                    "open" => CliAction::MoveDoor {
                        debug_enabled,
                        position: Position::Open,
                        config_dir,
                    },
                    "close" => CliAction::MoveDoor {
                        debug_enabled,
                        position: Position::Closed,
                        config_dir,
                    },
                    _ => CliAction::Photo {
                        debug_enabled,
                        config_dir,
                    },
                }
            }
            "simulate" => match parse_simulate(rest) {
                Some((start_time, end_time, multiplier)) => CliAction::Simulate {
                    debug_enabled,
                    start_time,
                    end_time,
                    multiplier,
                    log_to_file,
                    config_dir,
                },
                None => return error(),
            },
            unknown => {
                log_warning!("Unknown command: {unknown}");
                return error();
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn error() -> ParsedArgs {
    ParsedArgs {
        action: CliAction::ShowHelpDueToError,
    }
}

/// `<start> <end> [multiplier]`, with times checked for shape only.
fn parse_simulate(rest: &[String]) -> Option<(String, String, f64)> {
    let (start, end) = match rest {
        [start, end, ..] => (start, end),
        _ => {
            log_warning!(
                "Missing arguments for simulate. Usage: coopbot simulate <start> <end> [multiplier] [--log]"
            );
            return None;
        }
    };

    for (label, value) in [("start", start), ("end", end)] {
        if !looks_like_datetime(value) {
            log_error!("Invalid {label} time format: '{value}'. Use YYYY-MM-DD HH:MM:SS");
            return None;
        }
    }

    let multiplier = match rest.get(2) {
        None => DEFAULT_SIMULATION_MULTIPLIER,
        Some(value) => match value.parse::<f64>() {
            Ok(mult) if (0.1..=3600.0).contains(&mult) => mult,
            Ok(mult) => {
                log_error!("Invalid multiplier: {mult}. Must be between 0.1 and 3600.");
                return None;
            }
            Err(_) => {
                log_error!("Invalid multiplier: {value}");
                return None;
            }
        },
    };

    if let Some(extra) = rest.get(3) {
        log_warning!("Unexpected argument for simulate: {extra}");
        return None;
    }

    Some((start.clone(), end.clone(), multiplier))
}

fn looks_like_datetime(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 19
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b' '
        && bytes[13] == b':'
        && bytes[16] == b':'
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("coopbot [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Watch the light and run the door (default)");
    log_indented!("status                 Print the door, light and camera reports");
    log_indented!("open                   Open the door now (MANUAL mode)");
    log_indented!("close                  Close the door now (MANUAL mode)");
    log_indented!("photo                  Take photos and text them to the keepers");
    log_indented!("simulate <start> <end> [multiplier] [--log]");
    log_indented!("                       Run against a simulated clock with dry-run hardware");
    log_indented!("                       Times as \"YYYY-MM-DD HH:MM:SS\", multiplier 0.1-3600");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(args: &[&str]) -> CliAction {
        ParsedArgs::parse(std::iter::once("coopbot").chain(args.iter().copied())).action
    }

    #[test]
    fn test_parse_no_args_runs_daemon() {
        assert_eq!(
            action(&[]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_parse_debug_and_config_anywhere() {
        let expected = CliAction::Status {
            debug_enabled: true,
            config_dir: Some("/etc/coop".to_string()),
        };
        assert_eq!(action(&["-d", "status", "--config", "/etc/coop"]), expected);
        assert_eq!(action(&["--config", "/etc/coop", "status", "--debug"]), expected);
    }

    #[test]
    fn test_parse_door_commands() {
        assert_eq!(
            action(&["open"]),
            CliAction::MoveDoor {
                debug_enabled: false,
                position: Position::Open,
                config_dir: None,
            }
        );
        assert_eq!(
            action(&["close", "-d"]),
            CliAction::MoveDoor {
                debug_enabled: true,
                position: Position::Closed,
                config_dir: None,
            }
        );
        assert_eq!(
            action(&["photo"]),
            CliAction::Photo {
                debug_enabled: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(action(&["--help"]), CliAction::ShowHelp);
        assert_eq!(action(&["-h", "status"]), CliAction::ShowHelp);
        assert_eq!(action(&["-V"]), CliAction::ShowVersion);
        assert_eq!(action(&["--help", "--version"]), CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_simulate() {
        assert_eq!(
            action(&[
                "simulate",
                "2026-06-21 05:00:00",
                "2026-06-22 05:00:00",
                "600",
                "--log"
            ]),
            CliAction::Simulate {
                debug_enabled: false,
                start_time: "2026-06-21 05:00:00".to_string(),
                end_time: "2026-06-22 05:00:00".to_string(),
                multiplier: 600.0,
                log_to_file: true,
                config_dir: None,
            }
        );

        match action(&["simulate", "2026-06-21 05:00:00", "2026-06-22 05:00:00"]) {
            CliAction::Simulate { multiplier, .. } => {
                assert_eq!(multiplier, DEFAULT_SIMULATION_MULTIPLIER)
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors() {
        for args in [
            &["--frobnicate"][..],
            &["dance"],
            &["open", "now"],
            &["--config"],
            &["status", "--log"],
            &["simulate", "2026-06-21 05:00:00"],
            &["simulate", "2026-06-21", "2026-06-22 05:00:00"],
            &["simulate", "2026-06-21 05:00:00", "2026-06-22 05:00:00", "9000"],
            &["simulate", "2026-06-21 05:00:00", "2026-06-22 05:00:00", "fast"],
        ] {
            assert_eq!(action(args), CliAction::ShowHelpDueToError, "args: {args:?}");
        }
    }
}
