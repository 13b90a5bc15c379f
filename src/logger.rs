//! Structured terminal logging with box-drawing output.
//!
//! Every line coopbot prints goes through this module so the daemon's output
//! reads as one continuous tree:
//!
//! ```text
//! ┏ coopbot v0.4.0 ━━╸
//! ┃
//! ┣ Loading configuration...
//! ┃   Location: Felton, CA (37.0513°, -122.0733°)
//! ┣[INFO] Door is CLOSED in AUTOMATIC mode
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - **`log_block_start!`** opens a new conceptual block (a door move, a command
//!   batch, shutdown). It prints a spacer pipe and then `┣ message`.
//! - **`log_decorated!`** continues the current block with `┣ message`.
//! - **`log_indented!`** prints detail lines under the current block as
//!   `┃   message`.
//! - **`log_pipe!`** inserts a bare `┃` spacer, mostly before a semantic level
//!   line that starts its own block.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_critical!`** carry a
//!   `[LEVEL]` tag. **`log_debug!`** does too but is only printed when debug
//!   output was enabled with `Log::set_debug(true)`.
//! - **`log_version!`** / **`log_end!`** open and close the whole tree.
//!
//! Output normally goes to stdout. `Log::start_file_logging` reroutes it to a
//! writer thread that strips the ANSI colours and appends to a file.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Observer timezone, used for simulated-time prefixes
static OBSERVER_TIMEZONE: OnceLock<chrono_tz::Tz> = OnceLock::new();

static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// The shape of a single emitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Decorated,
    Indented,
    Block,
    Info,
    Debug,
    Warning,
    Error,
    ErrorExit,
    Critical,
}

impl LineKind {
    fn render(self, prefix: &str, message: &str) -> String {
        match self {
            LineKind::Decorated => format!("{prefix}┣ {message}\n"),
            LineKind::Indented => format!("{prefix}┃   {message}\n"),
            LineKind::Block => format!("{prefix}┃\n{prefix}┣ {message}\n"),
            LineKind::Info => format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
            LineKind::Debug => format!("{prefix}┣[\x1b[36mDEBUG\x1b[0m] {message}\n"),
            LineKind::Warning => format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
            LineKind::Error => format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
            LineKind::ErrorExit => {
                format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n")
            }
            LineKind::Critical => format!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"),
        }
    }
}

/// Global switches for the logger.
pub struct Log;

impl Log {
    /// Enable or disable all output (used by quiet one-shot commands and tests).
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Show or hide `log_debug!` lines.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Remember the observer timezone so simulated timestamps are shown in it.
    pub fn set_observer_timezone(tz: chrono_tz::Tz) {
        let _ = OBSERVER_TIMEZONE.set(tz);
    }

    /// Route all further output to `file_path` until the guard is dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix shown only while running against a simulated clock.
    pub fn timestamp_prefix() -> String {
        if !(crate::time_source::is_initialized() && crate::time_source::is_simulated()) {
            return String::new();
        }

        let now = crate::time_source::now();
        match OBSERVER_TIMEZONE.get() {
            Some(tz) => format!("[{}] ", now.with_timezone(tz).format("%m-%d %H:%M:%S")),
            None => format!("[{}] ", now.format("%m-%d %H:%M:%S")),
        }
    }
}

/// Keeps the file-logging thread alive; flushes and joins it on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Format and write one line. Called by the logging macros.
pub fn emit(kind: LineKind, message: &str) {
    if !Log::is_enabled() || (kind == LineKind::Debug && !Log::is_debug()) {
        return;
    }
    let prefix = Log::timestamp_prefix();
    write_output(&kind.render(&prefix, message));
}

/// Write raw text to the active sink (file thread or stdout).
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($kind:ident, $fmt:literal $($arg:tt)*) => {
        $crate::logger::emit($crate::logger::LineKind::$kind, &format!($fmt $($arg)*))
    };
    ($kind:ident, $expr:expr) => {
        $crate::logger::emit($crate::logger::LineKind::$kind, &format!("{}", $expr))
    };
}

/// Continue the current block: `┣ message`.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_line!(Decorated, $($arg)+) };
}

/// Detail line under the current block: `┃   message`.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_line!(Indented, $($arg)+) };
}

/// Start a new block with a spacer pipe.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_line!(Block, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_line!(Info, $($arg)+) };
}

/// Only printed when debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_line!(Debug, $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_line!(Warning, $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_line!(Error, $($arg)+) };
}

/// Error that terminates the tree: `┗[ERROR] message`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_line!(ErrorExit, $($arg)+) };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_line!(Critical, $($arg)+) };
}

/// Bare spacer line.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        if $crate::logger::Log::is_enabled() {
            let prefix = $crate::logger::Log::timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Application header.
#[macro_export]
macro_rules! log_version {
    () => {{
        if $crate::logger::Log::is_enabled() {
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("┏ coopbot v{version} ━━╸\n"));
        }
    }};
}

/// Final terminator.
#[macro_export]
macro_rules! log_end {
    () => {{
        if $crate::logger::Log::is_enabled() {
            let prefix = $crate::logger::Log::timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}
