//! Command definitions for the alarm coordinator CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

use crate::cli::client::DEFAULT_SERVER_URL;
use crate::daemon::http::{ServerConfig, DEFAULT_SERVICE_NAME};
use crate::types::{validate_alarm_time, validate_device_id, ConfigUpdate, LogQuery, NewLogEntry};

// ============================================================================
// CLI Structure
// ============================================================================

/// Alarm coordinator for polling alarm-clock devices
#[derive(Parser, Debug)]
#[command(
    name = "despertador",
    version,
    about = "Alarm state coordinator for polling alarm-clock devices",
    long_about = "Coordinates an alarm-clock device that polls over HTTP with a remote user.\n\
                  Run `despertador serve` for the service; the other commands talk to it.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the alarm coordinator service
    #[arg(
        short,
        long,
        global = true,
        env = "DESPERTADOR_SERVER",
        default_value = DEFAULT_SERVER_URL
    )]
    pub server: String,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Report that the device's alarm started ringing
    Trigger(DeviceArgs),

    /// Ask the device to stop ringing
    Stop(DeviceArgs),

    /// Confirm that the device stopped ringing
    Ack(DeviceArgs),

    /// Show the device's alarm state
    Status(DeviceArgs),

    /// Act as the device: poll status and acknowledge stop requests
    Watch(WatchArgs),

    /// Read or change device configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Record or list device log entries
    #[command(subcommand)]
    Log(LogCommands),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show the device configuration
    Get(DeviceArgs),

    /// Update the device configuration
    Set(ConfigSetArgs),
}

/// Log subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum LogCommands {
    /// Record a sensor reading
    Add(LogAddArgs),

    /// List recorded entries, newest first
    List(LogListArgs),
}

// ============================================================================
// Arguments
// ============================================================================

/// Arguments for the serve command
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, env = "DESPERTADOR_BIND", default_value = "0.0.0.0:3001")]
    pub bind: SocketAddr,

    /// Service name reported by /health
    #[arg(long, default_value = DEFAULT_SERVICE_NAME)]
    pub service_name: String,
}

impl ServeArgs {
    /// Builds the server configuration.
    pub fn to_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            service_name: self.service_name.clone(),
        }
    }
}

/// Arguments naming a single device
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Device identifier
    #[arg(value_parser = parse_device_id)]
    pub device_id: String,
}

/// Arguments for the watch command
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Device identifier
    #[arg(value_parser = parse_device_id)]
    pub device_id: String,

    /// Poll interval in milliseconds (100-60000)
    #[arg(
        short,
        long,
        default_value = "1000",
        value_parser = clap::value_parser!(u64).range(100..=60_000)
    )]
    pub interval_ms: u64,

    /// Stop after this many polls
    #[arg(short, long)]
    pub max_polls: Option<u32>,
}

/// Arguments for `config set`
#[derive(Args, Debug, Clone)]
pub struct ConfigSetArgs {
    /// Device identifier
    #[arg(value_parser = parse_device_id)]
    pub device_id: String,

    /// Alarm time as HH:MM (repeat for several alarms; replaces the list)
    #[arg(short, long = "alarm", value_parser = parse_alarm_time)]
    pub alarms: Vec<String>,

    /// Remove every alarm
    #[arg(long, conflicts_with = "alarms")]
    pub clear_alarms: bool,

    /// Light sensor threshold
    #[arg(short, long)]
    pub light_threshold: Option<u32>,

    /// Enable or disable the alarm (true/false)
    #[arg(short, long)]
    pub enabled: Option<bool>,
}

impl ConfigSetArgs {
    /// Builds the partial update described by the arguments.
    pub fn to_update(&self) -> ConfigUpdate {
        let alarms = if self.clear_alarms {
            Some(Vec::new())
        } else if self.alarms.is_empty() {
            None
        } else {
            Some(self.alarms.clone())
        };

        ConfigUpdate {
            alarms,
            light_threshold: self.light_threshold,
            enabled: self.enabled,
        }
    }
}

/// Arguments for `log add`
#[derive(Args, Debug, Clone)]
pub struct LogAddArgs {
    /// Device identifier
    #[arg(value_parser = parse_device_id)]
    pub device_id: String,

    /// Light sensor reading
    #[arg(short, long, allow_negative_numbers = true)]
    pub light: f64,

    /// The alarm fired at this reading
    #[arg(short, long)]
    pub alarm_triggered: bool,

    /// The servo opened at this reading
    #[arg(long)]
    pub servo_opened: bool,
}

impl LogAddArgs {
    /// Builds the log entry described by the arguments.
    pub fn to_entry(&self) -> NewLogEntry {
        NewLogEntry {
            device_id: Some(self.device_id.clone()),
            light: Some(self.light),
            alarm_triggered: self.alarm_triggered,
            servo_opened: self.servo_opened,
        }
    }
}

/// Arguments for `log list`
#[derive(Args, Debug, Clone)]
pub struct LogListArgs {
    /// Only list entries for this device
    #[arg(value_parser = parse_device_id)]
    pub device_id: Option<String>,

    /// Maximum number of entries (capped at 1000 by the server)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Number of newest entries to skip
    #[arg(short, long)]
    pub offset: Option<usize>,
}

impl LogListArgs {
    /// Builds the pagination query.
    pub fn to_query(&self) -> LogQuery {
        LogQuery {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates a device identifier argument.
fn parse_device_id(s: &str) -> Result<String, String> {
    validate_device_id(s)
        .map(str::to_string)
        .map_err(|e| e.to_string())
}

/// Validates an `HH:MM` alarm time argument.
fn parse_alarm_time(s: &str) -> Result<String, String> {
    validate_alarm_time(s)?;
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================
