//! Despertador alarm coordinator library.
//!
//! This library provides the core functionality for the alarm coordinator.
//! It includes:
//! - Alarm handshake state machine (trigger / stop request / acknowledge)
//! - Device config and log stores
//! - HTTP server exposing the coordinator and stores
//! - HTTP client, device poll loop and CLI definitions
//! - Type definitions for state, records and responses

pub mod cli;
pub mod daemon;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    AlarmCommand, AlarmPhase, AlarmState, ApiResponse, ConfigUpdate, DeviceConfig, LogEntry,
    LogQuery, NewLogEntry,
};

// Re-export daemon types
pub use daemon::{AlarmCoordinator, AlarmEvent, HttpServer, RequestHandler, ServerConfig};

// Re-export client types
pub use cli::{AlarmClient, ClientError, PollOutcome};
