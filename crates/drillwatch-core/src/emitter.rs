//! Emitter lifecycle and wiring.
//!
//! An emitter is a hidden output entity placed on top of its device. It
//! publishes the device's computed signals onto the bus by sharing the
//! device's wire channels: on every channel where the device takes part in
//! a network, the emitter is wired directly to the device; on every other
//! channel it is not wired to the device at all.
//!
//! Only that one link is mirrored. The rest of the device's wiring is the
//! player's business and is never touched.

use drillwatch_types::{EmitterFlags, EmitterSpec, EntityId, EntityKind, WireChannel};
use drillwatch_world::{HostWorld, WorldError};
use tracing::{debug, info, warn};

use crate::error::EmitterError;
use crate::registry::MonitoredDeviceRecord;

/// Edges changed by one [`sync_topology`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyChange {
    /// Channels on which the emitter was wired to the device.
    pub connected: Vec<WireChannel>,
    /// Channels on which the emitter was unwired from the device.
    pub disconnected: Vec<WireChannel>,
}

impl TopologyChange {
    /// Whether the call changed nothing.
    pub fn is_empty(&self) -> bool {
        self.connected.is_empty() && self.disconnected.is_empty()
    }

    /// Number of edges added or removed.
    pub fn edge_changes(&self) -> usize {
        self.connected.len().saturating_add(self.disconnected.len())
    }
}

/// Place an emitter on `device` and wire it into the device's networks.
///
/// # Errors
///
/// Returns [`EmitterError::InvalidDevice`] if the device is gone, or
/// [`EmitterError::CreationFailed`] if the host refuses the placement or
/// the initial wiring. A half-built emitter is removed before returning.
pub fn create(
    world: &mut dyn HostWorld,
    device: EntityId,
    emitter_name: &str,
) -> Result<EntityId, EmitterError> {
    if !world.is_valid(device) {
        return Err(EmitterError::InvalidDevice(device));
    }
    let placement = world
        .placement(device)
        .ok_or(EmitterError::InvalidDevice(device))?;
    let spec = EmitterSpec {
        name: emitter_name.to_owned(),
        placement,
        flags: EmitterFlags::HIDDEN,
    };
    let emitter = world.create_emitter(&spec)?;

    for channel in WireChannel::ALL {
        if !device_has_connections(world, device, emitter, channel) {
            continue;
        }
        if let Err(err) = world.connect(emitter, device, channel) {
            world.destroy_entity(emitter);
            return Err(err.into());
        }
    }

    info!(device = %device, emitter = %emitter, "Emitter created");
    Ok(emitter)
}

/// Remove a record's emitter and clear the handle.
///
/// Safe to call when there is no emitter or the emitter is already gone.
/// A handle that resolves to anything other than a signal emitter is
/// dropped without touching the entity behind it. Returns `true` if an
/// entity was actually removed.
pub fn destroy(world: &mut dyn HostWorld, record: &mut MonitoredDeviceRecord) -> bool {
    let Some(emitter) = record.emitter.take() else {
        return false;
    };
    if !is_emitter(world, emitter) {
        return false;
    }
    let removed = world.destroy_entity(emitter);
    if removed {
        debug!(device = %record.device_id, emitter = %emitter, "Emitter destroyed");
    }
    removed
}

/// Make the emitter's link to its device mirror the device's participation
/// in each channel.
///
/// Connects where the device has a live connection but the emitter is not
/// linked, disconnects where the device has none but the emitter is linked,
/// and leaves matching channels alone. A second call with no wiring change
/// in between makes no edge changes.
///
/// # Errors
///
/// Returns the host's [`WorldError`] if a connect or disconnect fails.
pub fn sync_topology(
    world: &mut dyn HostWorld,
    device: EntityId,
    emitter: EntityId,
) -> Result<TopologyChange, WorldError> {
    let mut change = TopologyChange::default();
    if !world.is_valid(device) || !is_emitter(world, emitter) {
        return Ok(change);
    }
    for channel in WireChannel::ALL {
        let wanted = device_has_connections(world, device, emitter, channel);
        let linked = emitter_linked(world, device, emitter, channel);
        if wanted && !linked {
            if world.connect(emitter, device, channel)? {
                change.connected.push(channel);
            }
        } else if !wanted && linked && world.disconnect(emitter, device, channel)? {
            change.disconnected.push(channel);
        }
    }
    if !change.is_empty() {
        debug!(
            device = %device,
            connected = change.connected.len(),
            disconnected = change.disconnected.len(),
            "Emitter wiring synced"
        );
    }
    Ok(change)
}

/// Whether the device has a live connection on `channel` to anything other
/// than its own emitter.
fn device_has_connections(
    world: &dyn HostWorld,
    device: EntityId,
    emitter: EntityId,
    channel: WireChannel,
) -> bool {
    world
        .wire_neighbours(device, channel)
        .iter()
        .any(|&neighbour| neighbour != emitter)
}

fn emitter_linked(
    world: &dyn HostWorld,
    device: EntityId,
    emitter: EntityId,
    channel: WireChannel,
) -> bool {
    world.wire_neighbours(emitter, channel).contains(&device)
}

/// Whether `entity` is a live signal emitter.
pub fn is_emitter(world: &dyn HostWorld, entity: EntityId) -> bool {
    world.is_valid(entity) && world.entity_kind(entity) == Some(EntityKind::SignalEmitter)
}

/// Drop an emitter handle that no longer refers to a live signal emitter.
///
/// Returns `true` if the handle was stale.
pub fn forget_if_stale(world: &dyn HostWorld, record: &mut MonitoredDeviceRecord) -> bool {
    match record.emitter {
        Some(emitter) if !is_emitter(world, emitter) => {
            warn!(device = %record.device_id, emitter = %emitter, "Emitter vanished; will recreate");
            record.emitter = None;
            true
        }
        _ => false,
    }
}
