//! Display utilities for the alarm coordinator CLI.
//!
//! This module provides formatted output for:
//! - Alarm command results and status
//! - Device configuration
//! - Log listings
//! - Error messages

use crate::cli::client::PollOutcome;
use crate::types::{AlarmState, ApiResponse, DeviceConfig, HealthStatus, LogEntry};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of trigger/stop/ack.
    pub fn show_alarm_result(device_id: &str, response: &ApiResponse<AlarmState>) {
        let message = response.message.as_deref().unwrap_or("done");
        println!("* {device_id}: {message}");

        if let Some(state) = &response.data {
            println!("  State: {}", Self::describe_state(state));
        }
    }

    /// Shows the device's alarm status.
    pub fn show_status(device_id: &str, response: &ApiResponse<AlarmState>) {
        println!("Alarm status: {device_id}");
        println!("─────────────────────────────");

        match &response.data {
            Some(state) => {
                println!("State:          {}", Self::describe_state(state));
                println!("Ringing:        {}", Self::yes_no(state.ringing));
                println!("Stop requested: {}", Self::yes_no(state.stop_requested));
            }
            None => println!("No state reported"),
        }
    }

    /// Shows one iteration of the watch loop.
    pub fn show_poll(device_id: &str, poll: u32, outcome: PollOutcome) {
        let line = match outcome {
            PollOutcome::Idle => "idle",
            PollOutcome::Ringing => "ringing",
            PollOutcome::Acknowledged => "stop requested -> acknowledged",
        };
        println!("[{poll:>4}] {device_id}: {line}");
    }

    /// Shows the watch loop summary.
    pub fn show_watch_summary(device_id: &str, acknowledged: u32) {
        println!("* {device_id}: watch finished, {acknowledged} stop request(s) acknowledged");
    }

    /// Shows a device configuration.
    pub fn show_config(response: &ApiResponse<DeviceConfig>) {
        if let Some(message) = &response.message {
            println!("* {message}");
        }

        let Some(config) = &response.data else {
            println!("No configuration returned");
            return;
        };

        println!("Device config: {}", config.device_id);
        println!("─────────────────────────────");
        println!("Enabled:         {}", Self::yes_no(config.enabled));
        println!("Light threshold: {}", config.light_threshold);
        if config.alarms.is_empty() {
            println!("Alarms:          (none)");
        } else {
            println!("Alarms:          {}", config.alarms.join(", "));
        }
        println!("Updated:         {}", config.updated_at.to_rfc3339());
    }

    /// Shows a stored log entry.
    pub fn show_log_recorded(response: &ApiResponse<LogEntry>) {
        if let Some(entry) = &response.data {
            println!("* Log #{} recorded for {}", entry.id, entry.device_id);
        }
    }

    /// Shows a log listing.
    pub fn show_logs(response: &ApiResponse<Vec<LogEntry>>) {
        let entries = response.data.as_deref().unwrap_or_default();
        if entries.is_empty() {
            println!("No log entries");
            return;
        }

        for entry in entries {
            println!("{}", Self::format_log_line(entry));
        }
        println!("({} entries)", response.count.unwrap_or(entries.len()));
    }

    /// Shows the health payload.
    pub fn show_health(health: &HealthStatus) {
        println!(
            "{} is {} ({} device(s) tracked)",
            health.service, health.status, health.devices
        );
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {message}");
    }

    /// Describes an alarm state in words.
    fn describe_state(state: &AlarmState) -> &'static str {
        match (state.ringing, state.stop_requested) {
            (false, false) => "idle",
            (true, false) => "ringing",
            (false, true) => "stop pending",
            (true, true) => "ringing with stop pending",
        }
    }

    fn yes_no(value: bool) -> &'static str {
        if value {
            "yes"
        } else {
            "no"
        }
    }

    /// Formats one log entry as a table row.
    fn format_log_line(entry: &LogEntry) -> String {
        let mut flags = Vec::new();
        if entry.alarm_triggered {
            flags.push("alarm");
        }
        if entry.servo_opened {
            flags.push("servo");
        }

        format!(
            "#{:<6} {} {:<16} light={:<6} {}",
            entry.id,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.device_id,
            entry.light,
            flags.join(",")
        )
        .trim_end()
        .to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::types::AlarmPhase;

    fn entry(alarm_triggered: bool, servo_opened: bool) -> LogEntry {
        LogEntry {
            id: 7,
            device_id: "dev1".to_string(),
            light: 512.0,
            alarm_triggered,
            servo_opened,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap(),
        }
    }

    // ------------------------------------------------------------------------
    // Formatting Tests
    // ------------------------------------------------------------------------

    mod format_tests {
        use super::*;

        #[test]
        fn test_describe_state() {
            assert_eq!(Display::describe_state(&AlarmPhase::Idle.state()), "idle");
            assert_eq!(
                Display::describe_state(&AlarmPhase::Ringing.state()),
                "ringing"
            );
            assert_eq!(
                Display::describe_state(&AlarmPhase::StopPending.state()),
                "stop pending"
            );
        }

        #[test]
        fn test_yes_no() {
            assert_eq!(Display::yes_no(true), "yes");
            assert_eq!(Display::yes_no(false), "no");
        }

        #[test]
        fn test_format_log_line_with_flags() {
            let line = Display::format_log_line(&entry(true, true));
            assert!(line.starts_with("#7"));
            assert!(line.contains("2024-05-01 06:30:00"));
            assert!(line.contains("light=512"));
            assert!(line.ends_with("alarm,servo"));
        }

        #[test]
        fn test_format_log_line_without_flags() {
            let line = Display::format_log_line(&entry(false, false));
            assert!(line.ends_with("light=512"));
        }
    }

    // ------------------------------------------------------------------------
    // Display Output Tests
    // ------------------------------------------------------------------------

    mod display_tests {
        use super::*;

        #[test]
        fn test_show_functions_do_not_panic() {
            let alarm = ApiResponse::success("alarm will be stopped", AlarmPhase::StopPending.state());
            Display::show_alarm_result("dev1", &alarm);
            Display::show_status("dev1", &alarm);
            Display::show_status("dev1", &ApiResponse::error("nothing"));

            Display::show_poll("dev1", 1, PollOutcome::Acknowledged);
            Display::show_watch_summary("dev1", 1);

            Display::show_logs(&ApiResponse::list(vec![entry(true, false)]));
            Display::show_logs(&ApiResponse::list(Vec::new()));
            Display::show_log_recorded(&ApiResponse::data(entry(false, false)));
            Display::show_error("test error");
        }
    }
}
