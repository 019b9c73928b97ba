//! CLI module for the alarm coordinator.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: HTTP client for the coordinator service
//! - `display`: Output formatting and display logic

pub mod client;
pub mod commands;
pub mod display;

pub use client::{AlarmClient, ClientError, PollOutcome};
pub use commands::{Cli, Commands, ConfigCommands, LogCommands};
pub use display::Display;
