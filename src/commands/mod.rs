//! Command-line command handlers for coopbot.
//!
//! Each one-shot command lives in its own submodule. The daemon itself is
//! started through [`crate::Coopbot`].

pub mod door;
pub mod photo;
pub mod simulate;
pub mod status;
