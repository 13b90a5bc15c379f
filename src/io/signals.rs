//! Unix signal handling for the control loop.
//!
//! A listener thread turns SIGINT, SIGTERM and SIGHUP into a
//! [`SignalMessage::Shutdown`] on a channel. The loop sleeps on that channel
//! between iterations, so a signal ends the sleep immediately.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    Shutdown { signal: i32 },
}

/// Signal state shared between the listener thread and the loop.
pub struct SignalState {
    /// Cleared once a shutdown has been requested.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// State without a listener thread, for one-shot commands and tests.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = std::sync::mpsc::channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless a signal arrives first.
    ///
    /// Returns `false` when the loop should stop. Under a simulated clock the
    /// sleep goes through the time source and pending signals are checked
    /// afterwards.
    pub fn wait(&self, duration: Duration) -> bool {
        if crate::time_source::is_simulated() {
            crate::time_source::sleep(duration);
            return match self.signal_receiver.try_recv() {
                Ok(message) => self.handle(message),
                Err(TryRecvError::Empty) => self.is_running(),
                Err(TryRecvError::Disconnected) => false,
            };
        }

        match self.signal_receiver.recv_timeout(duration) {
            Ok(message) => self.handle(message),
            Err(RecvTimeoutError::Timeout) => self.is_running(),
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn handle(&self, message: SignalMessage) -> bool {
        match message {
            SignalMessage::Shutdown { signal } => {
                log_pipe!();
                log_info!("Received {}, shutting down", signal_name(signal));
                self.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }
}

/// Register the shutdown signals and start the listener thread.
pub fn setup_signal_handler() -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    let running = Arc::clone(&state.running);
    let sender = state.signal_sender.clone();

    thread::spawn(move || {
        for signal in signals.forever() {
            running.store(false, Ordering::SeqCst);
            if sender.send(SignalMessage::Shutdown { signal }).is_err() {
                break;
            }
        }
    });

    Ok(state)
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "signal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_times_out_while_running() {
        let state = SignalState::detached();
        assert!(state.wait(Duration::from_millis(10)));
        assert!(state.is_running());
    }

    #[test]
    fn test_shutdown_message_stops_wait() {
        let state = SignalState::detached();
        state
            .signal_sender
            .send(SignalMessage::Shutdown { signal: SIGTERM })
            .unwrap();

        assert!(!state.wait(Duration::from_secs(5)));
        assert!(!state.is_running());
    }
}
