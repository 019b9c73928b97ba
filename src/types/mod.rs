//! Core data types for the alarm coordinator.
//!
//! This module defines the data structures used for:
//! - Alarm phase and the two-flag alarm state seen by clients
//! - Device identifier validation at the transport boundary
//! - Device configuration and log records
//! - HTTP response envelope serialization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Default light sensor threshold for a newly created device config.
pub const DEFAULT_LIGHT_THRESHOLD: u32 = 300;

/// Default page size for log listings.
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Upper bound for a single log listing page.
pub const MAX_LOG_LIMIT: usize = 1000;

/// Maximum accepted device identifier length in bytes.
pub const MAX_DEVICE_ID_LEN: usize = 128;

// ============================================================================
// AlarmPhase
// ============================================================================

/// Phase of a device's alarm handshake.
///
/// Stored instead of two independent booleans so that a ringing alarm with a
/// pending stop request cannot be represented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmPhase {
    /// Nothing ringing, nothing pending
    #[default]
    Idle,
    /// Device reported the alarm is sounding
    Ringing,
    /// User asked to stop; device has not acknowledged yet
    StopPending,
}

impl AlarmPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmPhase::Idle => "idle",
            AlarmPhase::Ringing => "ringing",
            AlarmPhase::StopPending => "stop_pending",
        }
    }

    /// Returns the phase reached by applying `command` to this phase.
    ///
    /// Every command fully determines the next phase; the current phase only
    /// matters for logging.
    pub fn apply(self, command: AlarmCommand) -> AlarmPhase {
        match command {
            AlarmCommand::Trigger => AlarmPhase::Ringing,
            AlarmCommand::RequestStop => AlarmPhase::StopPending,
            AlarmCommand::Acknowledge => AlarmPhase::Idle,
        }
    }

    /// Returns the client-facing two-flag view.
    pub fn state(self) -> AlarmState {
        AlarmState::from(self)
    }
}

// ============================================================================
// AlarmCommand
// ============================================================================

/// Mutating operations of the alarm handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmCommand {
    /// Device: the alarm started sounding
    Trigger,
    /// User: please silence the alarm
    RequestStop,
    /// Device: the alarm has been silenced
    Acknowledge,
}

impl AlarmCommand {
    /// All commands, for exhaustive tests and generators.
    pub const ALL: [AlarmCommand; 3] = [
        AlarmCommand::Trigger,
        AlarmCommand::RequestStop,
        AlarmCommand::Acknowledge,
    ];

    /// Returns the string representation of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmCommand::Trigger => "trigger",
            AlarmCommand::RequestStop => "stop",
            AlarmCommand::Acknowledge => "ack",
        }
    }
}

// ============================================================================
// AlarmState
// ============================================================================

/// Alarm state as reported to devices and users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmState {
    /// True while the device reports the alarm is audibly active
    pub ringing: bool,
    /// True while a stop request has not been acknowledged by the device
    pub stop_requested: bool,
}

impl From<AlarmPhase> for AlarmState {
    fn from(phase: AlarmPhase) -> Self {
        match phase {
            AlarmPhase::Idle => Self {
                ringing: false,
                stop_requested: false,
            },
            AlarmPhase::Ringing => Self {
                ringing: true,
                stop_requested: false,
            },
            AlarmPhase::StopPending => Self {
                ringing: false,
                stop_requested: true,
            },
        }
    }
}

// ============================================================================
// Device identifiers
// ============================================================================

/// Reasons a device identifier is rejected by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceIdError {
    /// Identifier is empty or whitespace only
    #[error("device id must not be empty")]
    Empty,

    /// Identifier exceeds the length limit
    #[error("device id must be at most {MAX_DEVICE_ID_LEN} bytes (got {0})")]
    TooLong(usize),

    /// Identifier contains control characters
    #[error("device id must not contain control characters")]
    ControlCharacter,
}

/// Validates a device identifier taken from a request path or body.
///
/// The coordinator itself treats identifiers as opaque; this check only
/// keeps garbage out at the HTTP boundary.
pub fn validate_device_id(device_id: &str) -> Result<&str, DeviceIdError> {
    if device_id.trim().is_empty() {
        return Err(DeviceIdError::Empty);
    }
    if device_id.len() > MAX_DEVICE_ID_LEN {
        return Err(DeviceIdError::TooLong(device_id.len()));
    }
    if device_id.chars().any(char::is_control) {
        return Err(DeviceIdError::ControlCharacter);
    }
    Ok(device_id)
}

// ============================================================================
// Device configuration
// ============================================================================

/// Per-device alarm schedule and sensor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Device this configuration belongs to
    pub device_id: String,
    /// Alarm times as `HH:MM`
    pub alarms: Vec<String>,
    /// Light sensor reading above which the device counts the room as lit
    pub light_threshold: u32,
    /// Whether the device should ring at all
    pub enabled: bool,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl DeviceConfig {
    /// Creates the default configuration for a device.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            alarms: Vec::new(),
            light_threshold: DEFAULT_LIGHT_THRESHOLD,
            enabled: true,
            updated_at: Utc::now(),
        }
    }

    /// Applies a partial update, keeping fields the update leaves out.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(alarms) = update.alarms {
            self.alarms = alarms;
        }
        if let Some(threshold) = update.light_threshold {
            self.light_threshold = threshold;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial configuration update sent by the app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    /// New alarm times
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarms: Option<Vec<String>>,
    /// New light threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_threshold: Option<u32>,
    /// New enabled flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ConfigUpdate {
    /// Validates every alarm time in the update.
    pub fn validate(&self) -> Result<(), String> {
        for alarm in self.alarms.iter().flatten() {
            validate_alarm_time(alarm)?;
        }
        Ok(())
    }
}

/// Validates an `HH:MM` alarm time.
pub fn validate_alarm_time(value: &str) -> Result<(), String> {
    let invalid = || format!("invalid alarm time '{value}', expected HH:MM");

    let (hours, minutes) = value.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: u8 = hours.parse().map_err(|_| invalid())?;
    let minutes: u8 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(())
}

// ============================================================================
// Device logs
// ============================================================================

/// A stored device log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Store-assigned identifier, increasing with insertion order
    pub id: u64,
    /// Reporting device
    pub device_id: String,
    /// Light sensor reading
    pub light: f64,
    /// Whether the alarm fired at this reading
    pub alarm_triggered: bool,
    /// Whether the servo opened at this reading
    pub servo_opened: bool,
    /// Time the record was stored
    pub timestamp: DateTime<Utc>,
}

/// Log record as submitted by a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLogEntry {
    /// Reporting device (required)
    #[serde(default)]
    pub device_id: Option<String>,
    /// Light sensor reading (required)
    #[serde(default)]
    pub light: Option<f64>,
    /// Whether the alarm fired
    #[serde(default)]
    pub alarm_triggered: bool,
    /// Whether the servo opened
    #[serde(default)]
    pub servo_opened: bool,
}

/// Pagination parameters for log listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    /// Page size; zero or missing means the default
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of newest entries to skip
    #[serde(default)]
    pub offset: Option<usize>,
}

impl LogQuery {
    /// Returns the effective `(limit, offset)` pair.
    pub fn page(&self) -> (usize, usize) {
        let limit = match self.limit {
            Some(0) | None => DEFAULT_LOG_LIMIT,
            Some(limit) => limit.min(MAX_LOG_LIMIT),
        };
        (limit, self.offset.unwrap_or(0))
    }
}

// ============================================================================
// HTTP response types
// ============================================================================

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error description on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Number of items in a list payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    /// Creates a success response with a message.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            data: Some(data),
            count: None,
        }
    }

    /// Creates a success response carrying only data.
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            data: Some(data),
            count: None,
        }
    }

    /// Creates an error response.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            data: None,
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Creates a success response for a list, filling in `count`.
    pub fn list(items: Vec<T>) -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            count: Some(items.len()),
            data: Some(items),
        }
    }
}

/// Payload of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Always "ok" when the service answers
    pub status: String,
    /// Service name
    pub service: String,
    /// Time of the check
    pub timestamp: DateTime<Utc>,
    /// Number of devices with alarm state
    pub devices: usize,
}

// ============================================================================
// Tests
// ============================================================================
