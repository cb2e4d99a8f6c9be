//! The demo mining site.
//!
//! Layout:
//!
//! - An iron-ore patch worked by two electric drills. The east drill sits
//!   on a thin corner and runs dry early.
//! - A crude-oil well with a pumpjack.
//! - One medium pole; the west drill and the pumpjack hang off it on red,
//!   the east drill on green.

use drillwatch_core::{Controller, ControllerEvent, blueprint};
use drillwatch_types::{
    DevicePrototype, DeviceSettings, EntityId, ForceId, Placement, Position, ResourceRegime,
    WireChannel,
};
use drillwatch_world::{HostWorld, SimWorld};
use tracing::info;

use crate::error::EngineError;

/// The force that owns everything on the site.
pub const PLAYER_FORCE: ForceId = ForceId(1);

/// Mining productivity researched by the player force.
const PRODUCTIVITY_BONUS: f64 = 0.1;

/// A built site and the handles the engine drives.
#[derive(Debug)]
pub struct DemoSite {
    /// The simulated host.
    pub world: SimWorld,
    /// Every mining device, drills first.
    pub devices: Vec<EntityId>,
}

fn at(x: f64, y: f64) -> Placement {
    Placement {
        position: Position { x, y },
        force: PLAYER_FORCE,
    }
}

fn electric_drill() -> DevicePrototype {
    DevicePrototype {
        name: "electric-mining-drill".to_owned(),
        mining_speed: 0.5,
        drain_rate_percent: None,
    }
}

fn pumpjack() -> DevicePrototype {
    DevicePrototype {
        name: "pumpjack".to_owned(),
        mining_speed: 1.0,
        drain_rate_percent: None,
    }
}

/// Lay out resources, devices, and wiring.
///
/// # Errors
///
/// Returns [`EngineError::World`] if a wire cannot be placed.
pub fn build() -> Result<DemoSite, EngineError> {
    let mut world = SimWorld::new();
    world.register_fluid("crude-oil");
    world.set_productivity(PLAYER_FORCE, PRODUCTIVITY_BONUS);

    let west_tiles = vec![
        world.add_resource("iron-ore", ResourceRegime::Depleting, 6, 1.0, 1, at(0.0, 0.0)),
        world.add_resource("iron-ore", ResourceRegime::Depleting, 9, 1.0, 1, at(1.0, 0.0)),
    ];
    let east_tiles = vec![world.add_resource(
        "iron-ore",
        ResourceRegime::Depleting,
        3,
        1.0,
        1,
        at(3.0, 0.0),
    )];
    world.add_resource("iron-ore", ResourceRegime::Depleting, 40, 1.0, 1, at(5.0, 0.0));
    let well = world.add_resource("crude-oil", ResourceRegime::NonDepleting, 65, 1.0, 2, at(20.0, 0.0));

    let west = world.add_drill(electric_drill(), at(0.5, 0.0), west_tiles);
    let east = world.add_drill(electric_drill(), at(3.0, 0.0), east_tiles);
    let jack = world.add_drill(pumpjack(), at(20.0, 0.0), vec![well]);

    let pole = world.add_pole("medium-electric-pole", at(10.0, 2.0));
    world.connect(west, pole, WireChannel::Red)?;
    world.connect(jack, pole, WireChannel::Red)?;
    world.connect(east, pole, WireChannel::Green)?;

    info!(entities = world.entity_count(), "Demo site built");
    Ok(DemoSite {
        world,
        devices: vec![west, east, jack],
    })
}

/// Settings the demo places each device with, in `devices` order.
fn preset(index: usize) -> DeviceSettings {
    match index {
        0 => DeviceSettings {
            counter_enabled: true,
            effective_yield_enabled: true,
            ..DeviceSettings::default()
        },
        1 => DeviceSettings {
            counter_enabled: true,
            depletion_signal_enabled: true,
            ..DeviceSettings::default()
        },
        _ => DeviceSettings {
            effective_yield_enabled: true,
            ..DeviceSettings::default()
        },
    }
}

/// Announce every device to the controller as if placed from a blueprint.
///
/// # Errors
///
/// Returns [`EngineError::Controller`] if the controller rejects a device.
pub fn place_devices(controller: &mut Controller, site: &mut DemoSite) -> Result<(), EngineError> {
    for (index, &device) in site.devices.iter().enumerate() {
        let tags = blueprint::to_tags(&preset(index))?;
        controller.dispatch(
            &mut site.world,
            ControllerEvent::DeviceBuilt {
                device,
                tags: Some(tags),
            },
        )?;
    }
    info!(devices = controller.registry().len(), "Devices registered");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use drillwatch_core::ControllerConfig;

    use super::*;

    #[test]
    fn site_places_three_configured_devices() {
        let mut site = build().unwrap();
        let mut controller = Controller::new(&ControllerConfig::default());
        place_devices(&mut controller, &mut site).unwrap();
        assert_eq!(controller.registry().len(), 3);
        assert_eq!(site.world.emitters().len(), 3);
    }

    #[test]
    fn emitters_join_the_pole_networks() {
        let mut site = build().unwrap();
        let mut controller = Controller::new(&ControllerConfig::default());
        place_devices(&mut controller, &mut site).unwrap();
        for record in controller.registry().iter() {
            let emitter = record.emitter.unwrap();
            let linked: usize = WireChannel::ALL
                .iter()
                .filter(|&&channel| site.world.bus().are_connected(emitter, record.device, channel))
                .count();
            assert_eq!(linked, 1);
        }
    }
}
