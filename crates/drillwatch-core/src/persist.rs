//! JSON save blob for the controller's records.
//!
//! Records are stored as a list rather than a map so the blob stays valid
//! JSON regardless of key type. Every record goes through
//! [`migrate`](crate::registry::migrate) on load, which fills flags an older
//! schema did not have.

use drillwatch_types::{DeviceId, PlayerId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PersistError;
use crate::reconcile::Controller;
use crate::registry::{self, DeviceRegistry, SCHEMA_VERSION, StoredRecord};

/// One open panel at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The player with the panel open.
    pub player: PlayerId,
    /// The device the panel belongs to.
    pub device_id: DeviceId,
}

/// Everything the controller persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    /// Schema the records were written with.
    pub schema_version: u32,
    /// One entry per monitored device.
    #[serde(default)]
    pub records: Vec<StoredRecord>,
    /// Open panels.
    #[serde(default)]
    pub sessions: Vec<StoredSession>,
}

impl SaveState {
    /// Snapshot a registry at the current schema version.
    pub fn capture(registry: &DeviceRegistry) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            records: registry.iter().map(StoredRecord::from).collect(),
            sessions: registry
                .sessions()
                .map(|(player, device_id)| StoredSession { player, device_id })
                .collect(),
        }
    }

    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Json`] for a malformed blob and
    /// [`PersistError::UnsupportedVersion`] for one written by a newer
    /// schema.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let state: Self = serde_json::from_str(json)?;
        if state.schema_version > SCHEMA_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: state.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(state)
    }

    /// Rebuild a registry, migrating every record.
    ///
    /// Sessions that point at a device with no record are dropped.
    pub fn restore(self) -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        for stored in self.records {
            registry.insert(registry::migrate(stored));
        }
        for session in self.sessions {
            if registry.get(session.device_id).is_some() {
                registry.open_session(session.player, session.device_id);
            } else {
                warn!(player = %session.player, device = %session.device_id, "Dropping session of unknown device");
            }
        }
        registry
    }
}

impl Controller {
    /// Serialize the registry to a JSON save blob.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Json`] if encoding fails.
    pub fn save(&self) -> Result<String, PersistError> {
        SaveState::capture(&self.registry).to_json()
    }

    /// Replace the registry with one loaded from a save blob.
    ///
    /// Global settings are untouched: they come from configuration, not from
    /// the save. Returns the number of records loaded. Records whose device
    /// no longer exists are collected by the next reconciliation pass.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if the blob cannot be read; the current
    /// registry is kept in that case.
    pub fn load(&mut self, json: &str) -> Result<usize, PersistError> {
        let state = SaveState::from_json(json)?;
        let from_version = state.schema_version;
        self.registry = state.restore();
        info!(
            records = self.registry.len(),
            from_version,
            to_version = SCHEMA_VERSION,
            "Controller state loaded"
        );
        Ok(self.registry.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use drillwatch_types::{EntityId, SignalId};

    use super::*;
    use crate::config::ControllerConfig;
    use crate::registry::MonitoredDeviceRecord;

    #[test]
    fn save_then_load_keeps_settings_and_sessions() {
        let mut controller = Controller::new(&ControllerConfig::default());
        let mut record = MonitoredDeviceRecord::new(DeviceId(5), EntityId(50));
        record.emitter = Some(EntityId(51));
        record.settings.depletion_signal_enabled = true;
        record.settings.depletion_signal_override = Some(SignalId::fluid("water"));
        controller.registry.insert(record.clone());
        controller.registry.open_session(PlayerId(2), DeviceId(5));

        let blob = controller.save().unwrap();
        let mut restored = Controller::new(&ControllerConfig::default());
        assert_eq!(restored.load(&blob).unwrap(), 1);
        assert_eq!(restored.registry().get(DeviceId(5)), Some(&record));
        assert_eq!(restored.registry().session_device(PlayerId(2)), Some(DeviceId(5)));
    }

    #[test]
    fn v1_blob_migrates_missing_flags_to_off() {
        let blob = r#"{
            "schema_version": 1,
            "records": [
                { "device_id": 3, "device": 30, "counter_enabled": true }
            ]
        }"#;
        let registry = SaveState::from_json(blob).unwrap().restore();
        let record = registry.get(DeviceId(3)).unwrap();
        assert!(record.settings.counter_enabled);
        assert!(!record.settings.depletion_signal_enabled);
        assert!(!record.settings.effective_yield_enabled);
        assert!(record.emitter.is_none());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let blob = r#"{ "schema_version": 99, "records": [] }"#;
        assert!(matches!(
            SaveState::from_json(blob),
            Err(PersistError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn orphan_sessions_are_dropped() {
        let state = SaveState {
            schema_version: SCHEMA_VERSION,
            records: Vec::new(),
            sessions: vec![StoredSession {
                player: PlayerId(1),
                device_id: DeviceId(9),
            }],
        };
        let registry = state.restore();
        assert!(registry.session_device(PlayerId(1)).is_none());
    }

    #[test]
    fn failed_load_keeps_current_registry() {
        let mut controller = Controller::new(&ControllerConfig::default());
        controller.registry.insert(MonitoredDeviceRecord::new(DeviceId(1), EntityId(10)));
        assert!(controller.load("not json").is_err());
        assert_eq!(controller.registry().len(), 1);
    }
}
