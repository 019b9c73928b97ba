//! Device config and log stores.
//!
//! The alarm handshake does not depend on either store; they sit next to the
//! coordinator so the device and the app can reach everything through one
//! service. Both stores are in-memory, keyed by device identifier.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use thiserror::Error;

use crate::types::{ConfigUpdate, DeviceConfig, LogEntry, LogQuery, NewLogEntry};

// ============================================================================
// StoreError
// ============================================================================

/// Errors returned by the config and log stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A required field was missing from the request
    #[error("field '{0}' is required")]
    MissingField(&'static str),

    /// A field failed validation
    #[error("{0}")]
    Invalid(String),
}

// ============================================================================
// ConfigStore
// ============================================================================

/// Whether a config write created a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWrite {
    /// No config existed for the device
    Created,
    /// An existing config was changed
    Updated,
}

/// Per-device configuration storage.
pub trait ConfigStore: Send + Sync {
    /// Returns the device's config, storing the default one on first read.
    fn get(&self, device_id: &str) -> Result<DeviceConfig, StoreError>;

    /// Applies a partial update, creating the config if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails validation.
    fn update(
        &self,
        device_id: &str,
        update: ConfigUpdate,
    ) -> Result<(DeviceConfig, ConfigWrite), StoreError>;
}

/// `ConfigStore` backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    configs: Mutex<HashMap<String, DeviceConfig>>,
}

impl InMemoryConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored configs.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.configs).len()
    }

    /// Returns true if no config is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn get(&self, device_id: &str) -> Result<DeviceConfig, StoreError> {
        let mut configs = lock(&self.configs);
        let config = configs.entry(device_id.to_string()).or_insert_with(|| {
            tracing::info!(device_id, "creating default device config");
            DeviceConfig::new(device_id)
        });
        Ok(config.clone())
    }

    fn update(
        &self,
        device_id: &str,
        update: ConfigUpdate,
    ) -> Result<(DeviceConfig, ConfigWrite), StoreError> {
        update.validate().map_err(StoreError::Invalid)?;

        let mut configs = lock(&self.configs);
        let write = if configs.contains_key(device_id) {
            ConfigWrite::Updated
        } else {
            ConfigWrite::Created
        };

        let config = configs
            .entry(device_id.to_string())
            .or_insert_with(|| DeviceConfig::new(device_id));
        config.apply(update);

        Ok((config.clone(), write))
    }
}

// ============================================================================
// LogStore
// ============================================================================

/// Append-only device log storage.
pub trait LogStore: Send + Sync {
    /// Validates and stores a new entry.
    ///
    /// # Errors
    ///
    /// Returns an error if `deviceId` or `light` is missing.
    fn append(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError>;

    /// Lists entries newest first, optionally for one device.
    fn list(&self, device_id: Option<&str>, query: LogQuery) -> Vec<LogEntry>;
}

#[derive(Debug, Default)]
struct LogTable {
    next_id: u64,
    entries: Vec<LogEntry>,
}

/// `LogStore` backed by a `Vec` in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    table: Mutex<LogTable>,
}

impl InMemoryLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.table).entries.len()
    }

    /// Returns true if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogStore for InMemoryLogStore {
    fn append(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError> {
        let device_id = entry
            .device_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(StoreError::MissingField("deviceId"))?;
        let light = entry.light.ok_or(StoreError::MissingField("light"))?;

        let mut table = lock(&self.table);
        table.next_id += 1;
        let stored = LogEntry {
            id: table.next_id,
            device_id,
            light,
            alarm_triggered: entry.alarm_triggered,
            servo_opened: entry.servo_opened,
            timestamp: Utc::now(),
        };
        table.entries.push(stored.clone());

        tracing::debug!(id = stored.id, device_id = %stored.device_id, "log entry stored");
        Ok(stored)
    }

    fn list(&self, device_id: Option<&str>, query: LogQuery) -> Vec<LogEntry> {
        let (limit, offset) = query.page();
        let table = lock(&self.table);

        // Insertion order doubles as timestamp order.
        table
            .entries
            .iter()
            .rev()
            .filter(|entry| device_id.is_none_or(|id| entry.device_id == id))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(device_id: &str, light: f64) -> NewLogEntry {
        NewLogEntry {
            device_id: Some(device_id.to_string()),
            light: Some(light),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // ConfigStore Tests
    // ------------------------------------------------------------------------

    mod config_store_tests {
        use super::*;

        #[test]
        fn test_get_creates_default() {
            let store = InMemoryConfigStore::new();
            assert!(store.is_empty());

            let config = store.get("dev1").unwrap();
            assert_eq!(config.device_id, "dev1");
            assert_eq!(config.light_threshold, 300);
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn test_get_returns_stored_config() {
            let store = InMemoryConfigStore::new();
            store
                .update(
                    "dev1",
                    ConfigUpdate {
                        light_threshold: Some(80),
                        ..Default::default()
                    },
                )
                .unwrap();

            assert_eq!(store.get("dev1").unwrap().light_threshold, 80);
        }

        #[test]
        fn test_update_reports_created_then_updated() {
            let store = InMemoryConfigStore::new();
            let (_, first) = store.update("dev1", ConfigUpdate::default()).unwrap();
            let (_, second) = store.update("dev1", ConfigUpdate::default()).unwrap();
            assert_eq!(first, ConfigWrite::Created);
            assert_eq!(second, ConfigWrite::Updated);
        }

        #[test]
        fn test_update_preserves_missing_fields() {
            let store = InMemoryConfigStore::new();
            store
                .update(
                    "dev1",
                    ConfigUpdate {
                        alarms: Some(vec!["06:45".to_string()]),
                        enabled: Some(false),
                        ..Default::default()
                    },
                )
                .unwrap();
            let (config, _) = store
                .update(
                    "dev1",
                    ConfigUpdate {
                        light_threshold: Some(10),
                        ..Default::default()
                    },
                )
                .unwrap();

            assert_eq!(config.alarms, vec!["06:45".to_string()]);
            assert!(!config.enabled);
            assert_eq!(config.light_threshold, 10);
        }

        #[test]
        fn test_update_rejects_invalid_alarm() {
            let store = InMemoryConfigStore::new();
            let result = store.update(
                "dev1",
                ConfigUpdate {
                    alarms: Some(vec!["99:99".to_string()]),
                    ..Default::default()
                },
            );

            assert!(matches!(result, Err(StoreError::Invalid(_))));
            assert!(store.is_empty());
        }
    }

    // ------------------------------------------------------------------------
    // LogStore Tests
    // ------------------------------------------------------------------------

    mod log_store_tests {
        use super::*;

        #[test]
        fn test_append_assigns_increasing_ids() {
            let store = InMemoryLogStore::new();
            let first = store.append(reading("dev1", 10.0)).unwrap();
            let second = store.append(reading("dev2", 20.0)).unwrap();
            assert_eq!(first.id, 1);
            assert_eq!(second.id, 2);
            assert_eq!(store.len(), 2);
        }

        #[test]
        fn test_append_requires_device_id() {
            let store = InMemoryLogStore::new();
            let result = store.append(NewLogEntry {
                light: Some(5.0),
                ..Default::default()
            });
            assert_eq!(result, Err(StoreError::MissingField("deviceId")));

            let result = store.append(NewLogEntry {
                device_id: Some("  ".to_string()),
                light: Some(5.0),
                ..Default::default()
            });
            assert_eq!(result, Err(StoreError::MissingField("deviceId")));
        }

        #[test]
        fn test_append_requires_light() {
            let store = InMemoryLogStore::new();
            let result = store.append(NewLogEntry {
                device_id: Some("dev1".to_string()),
                ..Default::default()
            });
            assert_eq!(result, Err(StoreError::MissingField("light")));
            assert!(store.is_empty());
        }

        #[test]
        fn test_append_keeps_flags() {
            let store = InMemoryLogStore::new();
            let entry = store
                .append(NewLogEntry {
                    alarm_triggered: true,
                    servo_opened: true,
                    ..reading("dev1", 700.5)
                })
                .unwrap();
            assert_eq!(entry.light, 700.5);
            assert!(entry.alarm_triggered);
            assert!(entry.servo_opened);
        }

        #[test]
        fn test_list_newest_first_filtered() {
            let store = InMemoryLogStore::new();
            store.append(reading("dev1", 1.0)).unwrap();
            store.append(reading("dev2", 2.0)).unwrap();
            store.append(reading("dev1", 3.0)).unwrap();

            let lights: Vec<f64> = store
                .list(Some("dev1"), LogQuery::default())
                .iter()
                .map(|entry| entry.light)
                .collect();
            assert_eq!(lights, vec![3.0, 1.0]);

            assert_eq!(store.list(None, LogQuery::default()).len(), 3);
        }

        #[test]
        fn test_list_paginates() {
            let store = InMemoryLogStore::new();
            for light in 0..10 {
                store.append(reading("dev1", f64::from(light))).unwrap();
            }

            let page = store.list(
                Some("dev1"),
                LogQuery {
                    limit: Some(3),
                    offset: Some(2),
                },
            );
            let lights: Vec<f64> = page.iter().map(|entry| entry.light).collect();
            assert_eq!(lights, vec![7.0, 6.0, 5.0]);
        }

        #[test]
        fn test_store_error_display() {
            assert_eq!(
                StoreError::MissingField("light").to_string(),
                "field 'light' is required"
            );
        }
    }
}
