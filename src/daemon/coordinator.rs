//! Alarm state coordinator.
//!
//! This module owns the per-device alarm handshake:
//! - `trigger` / `request_stop` / `acknowledge` transitions
//! - `status` reads that never create state
//! - Event firing for auditing every applied transition
//!
//! The device table is a `RwLock` around a map of per-device slots. The map
//! lock is only held for a lookup or an insert; each slot has its own mutex,
//! so transitions on one device never wait on another device.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::sync::mpsc;

use crate::types::{AlarmCommand, AlarmPhase, AlarmState};

// ============================================================================
// AlarmEvent
// ============================================================================

/// Alarm events for auditing and external integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmEvent {
    /// Device reported the alarm started sounding
    Triggered {
        /// Device identifier
        device_id: String,
        /// Phase before the transition
        previous: AlarmPhase,
    },
    /// User asked for the alarm to stop
    StopRequested {
        /// Device identifier
        device_id: String,
        /// Phase before the transition
        previous: AlarmPhase,
    },
    /// Device confirmed the alarm is silent
    Acknowledged {
        /// Device identifier
        device_id: String,
        /// Phase before the transition
        previous: AlarmPhase,
    },
}

impl AlarmEvent {
    fn new(command: AlarmCommand, device_id: &str, previous: AlarmPhase) -> Self {
        let device_id = device_id.to_string();
        match command {
            AlarmCommand::Trigger => AlarmEvent::Triggered {
                device_id,
                previous,
            },
            AlarmCommand::RequestStop => AlarmEvent::StopRequested {
                device_id,
                previous,
            },
            AlarmCommand::Acknowledge => AlarmEvent::Acknowledged {
                device_id,
                previous,
            },
        }
    }

    /// Returns the device the event belongs to.
    pub fn device_id(&self) -> &str {
        match self {
            AlarmEvent::Triggered { device_id, .. }
            | AlarmEvent::StopRequested { device_id, .. }
            | AlarmEvent::Acknowledged { device_id, .. } => device_id,
        }
    }

    /// Returns the phase the device was in before the event.
    pub fn previous(&self) -> AlarmPhase {
        match self {
            AlarmEvent::Triggered { previous, .. }
            | AlarmEvent::StopRequested { previous, .. }
            | AlarmEvent::Acknowledged { previous, .. } => *previous,
        }
    }
}

/// Logs alarm events until every sender is dropped.
///
/// Returns the number of events seen. Meant to be spawned next to the HTTP
/// server so every `trigger` has a matching audit line.
pub async fn log_events(mut event_rx: mpsc::UnboundedReceiver<AlarmEvent>) -> usize {
    let mut seen = 0;

    while let Some(event) = event_rx.recv().await {
        seen += 1;
        match &event {
            AlarmEvent::Triggered {
                device_id,
                previous,
            } => {
                if *previous == AlarmPhase::StopPending {
                    tracing::warn!(%device_id, "alarm re-triggered, pending stop request discarded");
                } else {
                    tracing::info!(%device_id, previous = previous.as_str(), "alarm triggered");
                }
            }
            AlarmEvent::StopRequested {
                device_id,
                previous,
            } => {
                tracing::info!(%device_id, previous = previous.as_str(), "alarm stop requested");
            }
            AlarmEvent::Acknowledged {
                device_id,
                previous,
            } => {
                tracing::info!(%device_id, previous = previous.as_str(), "alarm acknowledged");
            }
        }
    }

    tracing::debug!(seen, "alarm event channel closed");
    seen
}

// ============================================================================
// AlarmCoordinator
// ============================================================================

type Slot = Arc<Mutex<AlarmPhase>>;

/// Coordinator holding one alarm phase per device identifier.
#[derive(Debug, Default)]
pub struct AlarmCoordinator {
    /// Device table
    devices: RwLock<HashMap<String, Slot>>,
    /// Optional event sender channel
    event_tx: Option<mpsc::UnboundedSender<AlarmEvent>>,
}

impl AlarmCoordinator {
    /// Creates an empty coordinator without event reporting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty coordinator that reports every transition on `event_tx`.
    pub fn with_events(event_tx: mpsc::UnboundedSender<AlarmEvent>) -> Self {
        Self {
            devices: RwLock::default(),
            event_tx: Some(event_tx),
        }
    }

    /// Records that the device's alarm started sounding.
    ///
    /// Overwrites any prior state, including a pending stop request.
    pub fn trigger(&self, device_id: &str) -> AlarmState {
        self.apply(device_id, AlarmCommand::Trigger)
    }

    /// Records the user's request to silence the alarm.
    pub fn request_stop(&self, device_id: &str) -> AlarmState {
        self.apply(device_id, AlarmCommand::RequestStop)
    }

    /// Records the device's confirmation that the alarm is silent.
    pub fn acknowledge(&self, device_id: &str) -> AlarmState {
        self.apply(device_id, AlarmCommand::Acknowledge)
    }

    /// Returns the current state of a device.
    ///
    /// Unknown devices read as idle and are not added to the table.
    pub fn status(&self, device_id: &str) -> AlarmState {
        self.phase(device_id).state()
    }

    /// Returns the current phase of a device.
    pub fn phase(&self, device_id: &str) -> AlarmPhase {
        let slot = read_map(&self.devices).get(device_id).cloned();
        slot.map_or(AlarmPhase::Idle, |slot| *lock_slot(&slot))
    }

    /// Applies a command to a device's state as one atomic step.
    pub fn apply(&self, device_id: &str, command: AlarmCommand) -> AlarmState {
        let slot = self.slot(device_id);
        let mut phase = lock_slot(&slot);

        let previous = *phase;
        *phase = previous.apply(command);

        tracing::debug!(
            device_id,
            command = command.as_str(),
            from = previous.as_str(),
            to = phase.as_str(),
            "alarm transition"
        );

        // Sent under the slot lock so per-device event order matches apply order.
        if let Some(event_tx) = &self.event_tx {
            if event_tx
                .send(AlarmEvent::new(command, device_id, previous))
                .is_err()
            {
                tracing::debug!(device_id, "alarm event receiver dropped");
            }
        }

        phase.state()
    }

    /// Returns the number of devices with recorded state.
    pub fn device_count(&self) -> usize {
        read_map(&self.devices).len()
    }

    /// Returns every known device with its phase, sorted by identifier.
    pub fn snapshot(&self) -> Vec<(String, AlarmPhase)> {
        let slots: Vec<(String, Slot)> = read_map(&self.devices)
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();

        let mut snapshot: Vec<(String, AlarmPhase)> = slots
            .into_iter()
            .map(|(id, slot)| {
                let phase = *lock_slot(&slot);
                (id, phase)
            })
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    /// Returns the slot for a device, creating an idle one on first use.
    fn slot(&self, device_id: &str) -> Slot {
        if let Some(slot) = read_map(&self.devices).get(device_id) {
            return Arc::clone(slot);
        }

        let mut devices = self
            .devices
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(devices.entry(device_id.to_string()).or_default())
    }
}

// A poisoned lock still guards a valid `AlarmPhase`, so recover instead of
// propagating the panic of another caller.
fn read_map(
    devices: &RwLock<HashMap<String, Slot>>,
) -> std::sync::RwLockReadGuard<'_, HashMap<String, Slot>> {
    devices.read().unwrap_or_else(PoisonError::into_inner)
}

fn lock_slot(slot: &Mutex<AlarmPhase>) -> MutexGuard<'_, AlarmPhase> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Tests
// ============================================================================
