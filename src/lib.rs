//! # Coopbot Library
//!
//! Internal library for the coopbot binary application.
//!
//! This library exists to enable testing of the door logic and provide clean
//! separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Coopbot` struct acquires resources and starts the loop
//! - **Core Logic**: `core` module contains the polling `Coordinator`
//! - **Light**: `solar` module computes sunrise/sunset and the door window
//! - **Door**: `door` module holds the persisted door state machine
//! - **Hardware**: `hardware` module drives the stepper and lights over GPIO
//! - **Cameras**: `camera` module captures, uploads and links photos
//! - **Messaging**: `comms` module texts the keepers and reads their commands
//! - **Configuration**: `config` module for TOML-based settings
//! - **Commands**: `commands` module for one-shot CLI subcommands
//! - **Infrastructure**: signal handling, lock file, logging and utilities

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod camera;
pub mod commands;
pub mod common;
pub mod comms;
pub mod config;
pub mod core;
pub mod door;
pub mod hardware;
pub mod io;
pub mod solar;
pub mod time_source;

#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

mod coopbot;

pub use coopbot::Coopbot;
