//! Device registry: one record per monitored device.
//!
//! Records are keyed by the host's stable unit number in a `BTreeMap`, so
//! every pass over the registry visits devices in the same order. Nothing
//! reference-counts the host entities; records whose device has vanished
//! are collected by [`DeviceRegistry::sweep_invalid`] or removed when the
//! host reports the removal.
//!
//! The registry also owns the transient GUI session map (which player has
//! which device's panel open).

use std::collections::BTreeMap;

use drillwatch_types::{DeviceId, DeviceSettings, DeviceState, EntityId, PlayerId, SignalId};
use drillwatch_world::HostWorld;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::emitter;
use crate::error::ControllerError;
use crate::reader;

/// Current schema version of persisted records.
///
/// - v1: counter only
/// - v2: + depletion signal and its override
/// - v3: + effective yield
pub const SCHEMA_VERSION: u32 = 3;

/// Runtime state of one monitored device.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredDeviceRecord {
    /// Stable identity (registry key).
    pub device_id: DeviceId,
    /// Handle to the host device. Re-check validity before every use.
    pub device: EntityId,
    /// The emitter this controller created for the device, if any.
    pub emitter: Option<EntityId>,
    /// User configuration.
    pub settings: DeviceSettings,
}

impl MonitoredDeviceRecord {
    /// A record with every feature off and no emitter.
    pub fn new(device_id: DeviceId, device: EntityId) -> Self {
        Self {
            device_id,
            device,
            emitter: None,
            settings: DeviceSettings::default(),
        }
    }

    /// Whether any output feature is on.
    pub const fn any_enabled(&self) -> bool {
        self.settings.any_enabled()
    }

    /// Lifecycle state given the current world.
    pub fn state(&self, world: &dyn HostWorld) -> DeviceState {
        if !world.is_valid(self.device) {
            DeviceState::Stale
        } else if self.any_enabled() {
            DeviceState::Active
        } else {
            DeviceState::Dormant
        }
    }
}

/// Persisted shape of a record.
///
/// Flags are optional so a record written by an older schema can be told
/// apart from one where the user switched the flag off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Stable identity.
    pub device_id: DeviceId,
    /// Host device handle.
    pub device: EntityId,
    /// Emitter handle, if one existed at save time.
    #[serde(default)]
    pub emitter: Option<EntityId>,
    /// Counter flag (v1+).
    #[serde(default)]
    pub counter_enabled: Option<bool>,
    /// Depletion flag (v2+).
    #[serde(default)]
    pub depletion_signal_enabled: Option<bool>,
    /// Depletion override (v2+).
    #[serde(default)]
    pub depletion_signal_override: Option<SignalId>,
    /// Effective yield flag (v3+).
    #[serde(default)]
    pub effective_yield_enabled: Option<bool>,
}

impl From<&MonitoredDeviceRecord> for StoredRecord {
    fn from(record: &MonitoredDeviceRecord) -> Self {
        Self {
            device_id: record.device_id,
            device: record.device,
            emitter: record.emitter,
            counter_enabled: Some(record.settings.counter_enabled),
            depletion_signal_enabled: Some(record.settings.depletion_signal_enabled),
            depletion_signal_override: record.settings.depletion_signal_override.clone(),
            effective_yield_enabled: Some(record.settings.effective_yield_enabled),
        }
    }
}

/// Bring a stored record up to the current schema.
///
/// Flags the stored schema did not have are set to `false`; flags that are
/// present keep their value.
pub fn migrate(stored: StoredRecord) -> MonitoredDeviceRecord {
    let missing = [
        stored.counter_enabled,
        stored.depletion_signal_enabled,
        stored.effective_yield_enabled,
    ]
    .iter()
    .filter(|flag| flag.is_none())
    .count();
    if missing > 0 {
        debug!(device = %stored.device_id, missing, "Defaulting flags absent from stored record");
    }
    MonitoredDeviceRecord {
        device_id: stored.device_id,
        device: stored.device,
        emitter: stored.emitter,
        settings: DeviceSettings {
            counter_enabled: stored.counter_enabled.unwrap_or(false),
            depletion_signal_enabled: stored.depletion_signal_enabled.unwrap_or(false),
            depletion_signal_override: stored.depletion_signal_override,
            effective_yield_enabled: stored.effective_yield_enabled.unwrap_or(false),
        },
    }
}

/// All monitored-device records plus the open GUI sessions.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    records: BTreeMap<DeviceId, MonitoredDeviceRecord>,
    sessions: BTreeMap<PlayerId, DeviceId>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            sessions: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------

    /// Return the record of a live monitored device, creating a dormant one
    /// on first touch.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NotMonitored`] if `device` is not a live
    /// mining device.
    pub fn get_or_create(
        &mut self,
        world: &dyn HostWorld,
        device: EntityId,
    ) -> Result<&mut MonitoredDeviceRecord, ControllerError> {
        if !reader::is_monitored(world, device) {
            return Err(ControllerError::NotMonitored(device));
        }
        let device_id = world
            .device_id(device)
            .ok_or(ControllerError::NotMonitored(device))?;
        let record = self.records.entry(device_id).or_insert_with(|| {
            debug!(device = %device_id, "Registering device");
            MonitoredDeviceRecord::new(device_id, device)
        });
        Ok(record)
    }

    /// Put a record in place, replacing any previous record for its id.
    pub fn insert(&mut self, record: MonitoredDeviceRecord) -> Option<MonitoredDeviceRecord> {
        self.records.insert(record.device_id, record)
    }

    /// Look up a record.
    pub fn get(&self, device_id: DeviceId) -> Option<&MonitoredDeviceRecord> {
        self.records.get(&device_id)
    }

    /// Look up a record mutably.
    pub fn get_mut(&mut self, device_id: DeviceId) -> Option<&mut MonitoredDeviceRecord> {
        self.records.get_mut(&device_id)
    }

    /// Snapshot of every registered id, in order.
    pub fn ids(&self) -> Vec<DeviceId> {
        self.records.keys().copied().collect()
    }

    /// Iterate over all records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &MonitoredDeviceRecord> {
        self.records.values()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove a record, destroying its emitter and closing any panel on it.
    pub fn remove(
        &mut self,
        world: &mut dyn HostWorld,
        device_id: DeviceId,
    ) -> Option<MonitoredDeviceRecord> {
        let mut record = self.records.remove(&device_id)?;
        emitter::destroy(world, &mut record);
        self.sessions.retain(|_, open| *open != device_id);
        Some(record)
    }

    /// Remove every record whose device is no longer valid.
    ///
    /// Works from a snapshot of the keys, so it is safe to call between any
    /// two steps of a reconciliation pass.
    pub fn sweep_invalid(&mut self, world: &mut dyn HostWorld) -> Vec<DeviceId> {
        let stale: Vec<DeviceId> = self
            .records
            .values()
            .filter(|record| !world.is_valid(record.device))
            .map(|record| record.device_id)
            .collect();
        for &device_id in &stale {
            self.remove(world, device_id);
        }
        if !stale.is_empty() {
            info!(removed = stale.len(), "Swept records of vanished devices");
        }
        stale
    }

    // -------------------------------------------------------------------
    // GUI sessions
    // -------------------------------------------------------------------

    /// Record that `player` has the panel of `device_id` open.
    pub fn open_session(&mut self, player: PlayerId, device_id: DeviceId) -> Option<DeviceId> {
        self.sessions.insert(player, device_id)
    }

    /// Forget `player`'s open panel.
    pub fn close_session(&mut self, player: PlayerId) -> Option<DeviceId> {
        self.sessions.remove(&player)
    }

    /// The device whose panel `player` has open.
    pub fn session_device(&self, player: PlayerId) -> Option<DeviceId> {
        self.sessions.get(&player).copied()
    }

    /// Every open session, in player order.
    pub fn sessions(&self) -> impl Iterator<Item = (PlayerId, DeviceId)> + '_ {
        self.sessions.iter().map(|(&player, &device)| (player, device))
    }
}
