//! termwatch command-line tool.
//!
//! Wires a [`termwatch_core::SessionMonitor`] to stdin and a transcript file,
//! and offers offline commands over stored transcripts. Split from main.rs so
//! the pieces can be tested directly.

pub mod commands;
pub mod config;
pub mod logging;
pub mod sink;
pub mod watch;
