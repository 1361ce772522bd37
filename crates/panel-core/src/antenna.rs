//! Antenna relay system state
//!
//! The remote relay controller owns the hardware; this module owns the
//! panel's cache of it, reconciled from server-pushed events and local
//! commands. The same pattern as the CAT state: authoritative external
//! events update the cache, the UI only ever reads published snapshots.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;

/// Number of relay slots
pub const RELAY_COUNT: usize = 8;

/// Maximum relay name length
pub const MAX_NAME_LEN: usize = 31;

/// One relay entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEntry {
    /// Relay id, 1-8
    pub id: u8,
    /// Relay energized
    pub on: bool,
    /// Display name, up to 31 chars
    pub name: String,
    /// Reported available by the controller
    pub available: bool,
}

/// Events pushed by the remote relay controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntennaEvent {
    /// A single relay changed state
    RelayChanged {
        /// Relay id, 1-8
        id: u8,
        /// New state
        on: bool,
    },
    /// Full controller status
    Status {
        /// Currently active relay, 0 = none
        active: u8,
        /// Ids currently available
        available: Vec<u8>,
    },
}

/// Requests the panel sends to the remote relay controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntennaRequest {
    /// Set one relay
    SetRelay {
        /// Relay id, 1-8
        id: u8,
        /// Desired state
        on: bool,
    },
    /// Aggregate select: exactly this relay on, everything else off
    SelectAntenna {
        /// Relay id, 1-8
        id: u8,
    },
}

/// The panel's cache of the relay system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntennaSystem {
    relays: Vec<RelayEntry>,
    /// Currently active relay, 0 = none
    pub active: u8,
    /// Transmitting flag mirrored from the radio
    pub transmitting: bool,
    #[serde(skip)]
    fallback_target: Option<u8>,
}

impl AntennaSystem {
    /// Default state: eight numbered relays, none available, none active
    pub fn new() -> Self {
        Self {
            relays: (1..=RELAY_COUNT as u8)
                .map(|id| RelayEntry {
                    id,
                    on: false,
                    name: format!("ANT {}", id),
                    available: false,
                })
                .collect(),
            active: 0,
            transmitting: false,
            fallback_target: None,
        }
    }

    /// All relay entries
    pub fn relays(&self) -> &[RelayEntry] {
        &self.relays
    }

    /// One relay entry by id
    pub fn relay(&self, id: u8) -> Option<&RelayEntry> {
        self.relays.iter().find(|r| r.id == id)
    }

    /// Rename a relay; the name is truncated to the slot size
    pub fn set_name(&mut self, id: u8, name: &str) -> Result<(), EngineError> {
        let entry = self
            .relays
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(EngineError::InvalidRelay(id))?;
        entry.name = name.chars().take(MAX_NAME_LEN).collect();
        Ok(())
    }

    /// Mirror the radio's transmitting flag
    pub fn set_transmitting(&mut self, on: bool) {
        self.transmitting = on;
    }

    /// Fold in a server-pushed event; returns whether anything changed
    pub fn apply_event(&mut self, event: &AntennaEvent) -> bool {
        match event {
            AntennaEvent::RelayChanged { id, on } => {
                let Some(entry) = self.relays.iter_mut().find(|r| r.id == *id) else {
                    debug!(id, "relay change for unknown id ignored");
                    return false;
                };
                let mut changed = false;
                if entry.on != *on {
                    entry.on = *on;
                    changed = true;
                }
                // Keep the active pointer consistent outside a fallback,
                // where transient multi-on states are expected
                if self.fallback_target.is_none() {
                    let new_active = if *on { *id } else if self.active == *id { 0 } else { self.active };
                    if self.active != new_active {
                        self.active = new_active;
                        changed = true;
                    }
                }
                changed
            }
            AntennaEvent::Status { active, available } => {
                let mut changed = self.active != *active;
                self.active = *active;
                for entry in &mut self.relays {
                    let avail = available.contains(&entry.id);
                    let on = entry.id == *active;
                    changed |= entry.available != avail || entry.on != on;
                    entry.available = avail;
                    entry.on = on;
                }
                changed
            }
        }
    }

    /// Aggregate select request
    pub fn select(&self, id: u8) -> Result<AntennaRequest, EngineError> {
        if !(1..=RELAY_COUNT as u8).contains(&id) {
            return Err(EngineError::InvalidRelay(id));
        }
        Ok(AntennaRequest::SelectAntenna { id })
    }

    /// Fallback path for a failed aggregate select: toggle relays
    /// individually. More than one relay may read "on" until
    /// [`Self::finish_fallback`] reconciles.
    pub fn begin_fallback(&mut self, target: u8) -> Result<Vec<AntennaRequest>, EngineError> {
        if !(1..=RELAY_COUNT as u8).contains(&target) {
            return Err(EngineError::InvalidRelay(target));
        }
        self.fallback_target = Some(target);

        let mut requests = vec![AntennaRequest::SetRelay { id: target, on: true }];
        requests.extend(
            self.relays
                .iter()
                .filter(|r| r.on && r.id != target)
                .map(|r| AntennaRequest::SetRelay { id: r.id, on: false }),
        );
        Ok(requests)
    }

    /// Reconcile to single-active after the individual commands have all
    /// completed or failed; returns whether anything changed
    pub fn finish_fallback(&mut self) -> bool {
        let Some(target) = self.fallback_target.take() else {
            return false;
        };
        let mut changed = self.active != target;
        self.active = target;
        for entry in &mut self.relays {
            let on = entry.id == target;
            changed |= entry.on != on;
            entry.on = on;
        }
        changed
    }

    /// Whether a fallback is in flight
    pub fn fallback_in_progress(&self) -> bool {
        self.fallback_target.is_some()
    }

    /// Serialize the eight relay names for persistent storage
    pub fn names_blob(&self) -> Result<Vec<u8>, EngineError> {
        let names: Vec<&str> = self.relays.iter().map(|r| r.name.as_str()).collect();
        Ok(serde_json::to_vec(&names)?)
    }

    /// Restore relay names from a previously saved blob
    pub fn load_names_blob(&mut self, blob: &[u8]) -> Result<(), EngineError> {
        let names: Vec<String> = serde_json::from_slice(blob)?;
        for (entry, name) in self.relays.iter_mut().zip(names) {
            entry.name = name.chars().take(MAX_NAME_LEN).collect();
        }
        Ok(())
    }
}

impl Default for AntennaSystem {
    fn default() -> Self {
        Self::new()
    }
}
