//! Resource reads for monitored devices.
//!
//! A device reads resources in one of two scopes (see [`ReadMode`]). The
//! reader switches the scope it needs for a query and switches it back
//! afterwards, so the device's persistent configuration is observed, never
//! changed.
//!
//! Both queries return `false`/empty for an invalid handle or for an entity
//! that is not a mining device.

use drillwatch_types::{EntityId, EntityKind, ReadMode, ResourceHandle, ResourceRegime};
use drillwatch_world::HostWorld;
use tracing::warn;

/// Whether `entity` is a live device of the monitored kind.
pub fn is_monitored(world: &dyn HostWorld, entity: EntityId) -> bool {
    world.is_valid(entity) && world.entity_kind(entity) == Some(EntityKind::MiningDrill)
}

/// Whether the device still has something to extract.
///
/// True iff its single-target scope holds at least one unit, or the
/// resource it reaches is non-depleting (those never run out).
pub fn has_resource(world: &mut dyn HostWorld, device: EntityId) -> bool {
    if !is_monitored(world, device) {
        return false;
    }
    if world
        .mining_target(device)
        .is_some_and(|target| target.regime == ResourceRegime::NonDepleting)
    {
        return true;
    }
    read_scoped(world, device, ReadMode::SingleTarget)
        .iter()
        .any(|handle| handle.regime == ResourceRegime::NonDepleting || handle.amount > 0)
}

/// Every resource in the field the device sits on.
pub fn read_patch(world: &mut dyn HostWorld, device: EntityId) -> Vec<ResourceHandle> {
    if !is_monitored(world, device) {
        return Vec::new();
    }
    read_scoped(world, device, ReadMode::EntireField)
}

/// Read under `mode`, restoring the device's own mode afterwards.
fn read_scoped(world: &mut dyn HostWorld, device: EntityId, mode: ReadMode) -> Vec<ResourceHandle> {
    let Some(saved) = world.read_mode(device) else {
        return Vec::new();
    };
    if saved == mode {
        return world.resource_targets(device);
    }
    if let Err(err) = world.set_read_mode(device, mode) {
        warn!(device = %device, error = %err, "Failed to switch read mode");
        return Vec::new();
    }
    let targets = world.resource_targets(device);
    if let Err(err) = world.set_read_mode(device, saved) {
        warn!(device = %device, error = %err, "Failed to restore read mode");
    }
    targets
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use drillwatch_types::{DevicePrototype, ForceId, Placement, Position};
    use drillwatch_world::SimWorld;

    use super::*;

    fn at(x: f64) -> Placement {
        Placement {
            position: Position { x, y: 0.0 },
            force: ForceId(1),
        }
    }

    fn drill() -> DevicePrototype {
        DevicePrototype {
            name: "electric-mining-drill".to_owned(),
            mining_speed: 0.5,
            drain_rate_percent: None,
        }
    }

    #[test]
    fn has_resource_true_with_units_left() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 10, 1.0, 1, at(0.0));
        let device = world.add_drill(drill(), at(0.0), vec![ore]);
        assert!(has_resource(&mut world, device));
    }

    #[test]
    fn has_resource_false_once_area_is_exhausted() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 10, 1.0, 1, at(0.0));
        world.add_resource("iron-ore", ResourceRegime::Depleting, 900, 1.0, 1, at(8.0));
        let device = world.add_drill(drill(), at(0.0), vec![ore]);
        world.extract(ore, 10).unwrap();
        // The rest of the patch is out of reach of this device.
        assert!(!has_resource(&mut world, device));
    }

    #[test]
    fn non_depleting_target_always_present() {
        let mut world = SimWorld::new();
        let oil = world.add_resource("crude-oil", ResourceRegime::NonDepleting, 0, 1.0, 1, at(0.0));
        let device = world.add_drill(drill(), at(0.0), vec![oil]);
        assert!(has_resource(&mut world, device));
    }

    #[test]
    fn read_patch_restores_read_mode() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 10, 1.0, 1, at(0.0));
        world.add_resource("iron-ore", ResourceRegime::Depleting, 20, 1.0, 1, at(5.0));
        let device = world.add_drill(drill(), at(0.0), vec![ore]);

        let patch = read_patch(&mut world, device);
        assert_eq!(patch.len(), 2);
        assert_eq!(world.read_mode(device), Some(ReadMode::SingleTarget));
        assert_eq!(world.read_mode_changes(), 2);
    }

    #[test]
    fn has_resource_restores_entire_field_mode() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 10, 1.0, 1, at(0.0));
        let device = world.add_drill(drill(), at(0.0), vec![ore]);
        world.set_read_mode(device, ReadMode::EntireField).unwrap();

        assert!(has_resource(&mut world, device));
        assert_eq!(world.read_mode(device), Some(ReadMode::EntireField));
    }

    #[test]
    fn invalid_or_foreign_entities_read_nothing() {
        let mut world = SimWorld::new();
        let pole = world.add_pole("small-electric-pole", at(0.0));
        assert!(!has_resource(&mut world, pole));
        assert!(read_patch(&mut world, pole).is_empty());
        assert!(!has_resource(&mut world, EntityId(999)));
    }
}
