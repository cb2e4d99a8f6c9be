//! Signal composition for one device.
//!
//! [`compose`] evaluates the enabled features in a fixed order:
//!
//! 1. **Counter** -- the device's own item signal, quantity 1. Omitted when
//!    the global suppress option is on and the device has run dry.
//! 2. **Depletion** -- the override (or global default) signal, quantity 1,
//!    only while the device has nothing left to extract.
//! 3. **Effective yield** -- one signal per resource channel of the patch,
//!    followed by the rate indicator if any of them is a rate.
//!
//! Slots are numbered 1..N in that order with no gaps: a skipped feature
//! simply does not push anything, so later signals move down.
//!
//! [`apply`] writes the result to the device's emitter, creating or
//! destroying the emitter as needed.

use drillwatch_types::{EntityId, OutputSignal, ResourceRegime, SignalId};
use drillwatch_world::HostWorld;
use tracing::{debug, warn};

use crate::config::GlobalConfig;
use crate::emitter;
use crate::error::ControllerError;
use crate::reader;
use crate::registry::MonitoredDeviceRecord;
use crate::yields::{self, YieldModifiers};

/// What [`apply`] did with a device's emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// The device is gone; nothing was done. The record awaits the sweep.
    Stale,
    /// No feature is enabled; any emitter was removed.
    Dormant {
        /// Whether an emitter was removed by this call.
        emitter_destroyed: bool,
    },
    /// Features are enabled but produced no signal; any emitter was removed.
    Cleared {
        /// Whether an emitter was removed by this call.
        emitter_destroyed: bool,
    },
    /// Signals were written.
    Written {
        /// Number of slots written.
        signals: usize,
        /// Whether the emitter was created by this call.
        created: bool,
    },
    /// An emitter was needed but the host refused to create it. Retried on
    /// the next pass.
    CreationFailed,
}

/// Accumulates signals with contiguous 1-based slot indices.
#[derive(Debug, Default)]
struct SignalList {
    signals: Vec<OutputSignal>,
}

impl SignalList {
    fn push(&mut self, signal: SignalId, quantity: i32) {
        let slot_index = u32::try_from(self.signals.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        self.signals.push(OutputSignal {
            signal,
            quantity: quantity.max(0),
            slot_index,
        });
    }

    fn into_vec(self) -> Vec<OutputSignal> {
        self.signals
    }
}

/// Build the ordered signal list for one device.
///
/// Reads the world (with read-mode save/restore) but changes nothing the
/// host would notice.
pub fn compose(
    world: &mut dyn HostWorld,
    record: &MonitoredDeviceRecord,
    config: &GlobalConfig,
) -> Vec<OutputSignal> {
    let settings = &record.settings;
    let device = record.device;
    if !settings.any_enabled() || !reader::is_monitored(world, device) {
        return Vec::new();
    }

    let needs_presence = settings.depletion_signal_enabled
        || (settings.counter_enabled && config.suppress_counter_when_depleted);
    let has_resource = !needs_presence || reader::has_resource(world, device);

    let mut list = SignalList::default();

    if settings.counter_enabled && (has_resource || !config.suppress_counter_when_depleted) {
        if let Some(prototype) = world.device_prototype(device) {
            list.push(SignalId::item(prototype.name), 1);
        }
    }

    if settings.depletion_signal_enabled && !has_resource {
        let signal = settings
            .depletion_signal_override
            .clone()
            .unwrap_or_else(|| config.depletion_signal.clone());
        list.push(signal, 1);
    }

    if settings.effective_yield_enabled {
        let (channels, any_rate) = effective_signals(world, device);
        for (signal, quantity) in channels {
            list.push(signal, quantity);
        }
        if any_rate {
            list.push(config.rate_indicator_signal.clone(), 1);
        }
    }

    list.into_vec()
}

/// Per-channel effective yield of the device's whole patch, in channel
/// name order, and whether any of them is a rate.
///
/// A single depleting tile anywhere in the patch switches every channel to
/// depleting evaluation; channels with only non-depleting tiles then
/// contribute nothing.
fn effective_signals(world: &mut dyn HostWorld, device: EntityId) -> (Vec<(SignalId, i32)>, bool) {
    let Some(prototype) = world.device_prototype(device) else {
        return (Vec::new(), false);
    };
    let bonus = world
        .placement(device)
        .map_or(0.0, |placement| world.productivity_bonus(placement.force));
    let modifiers = YieldModifiers::new(&prototype, bonus);

    let groups = yields::group_by_channel(reader::read_patch(world, device));
    let regime = if yields::patch_has_depleting(&groups) {
        ResourceRegime::Depleting
    } else {
        ResourceRegime::NonDepleting
    };

    let mut signals = Vec::new();
    let mut any_rate = false;
    for (name, group) in &groups {
        let Some(result) = yields::effective_yield(group, regime, &modifiers) else {
            continue;
        };
        if result.quantity <= 0 {
            continue;
        }
        let signal = if world.is_fluid(name) {
            SignalId::fluid(name.as_str())
        } else {
            SignalId::item(name.as_str())
        };
        any_rate |= result.is_rate;
        signals.push((signal, result.quantity));
    }
    (signals, any_rate)
}

/// Recompute a device's signals and publish them.
///
/// - Invalid device: no-op ([`ComposeOutcome::Stale`]).
/// - No feature enabled: emitter removed, nothing written.
/// - Features enabled but no signal: emitter removed.
/// - Otherwise: emitter created if missing (or if its handle went stale),
///   all slots cleared, then slots 1..N written.
///
/// # Errors
///
/// Returns [`ControllerError::World`] if the host rejects a slot write.
pub fn apply(
    world: &mut dyn HostWorld,
    record: &mut MonitoredDeviceRecord,
    config: &GlobalConfig,
    emitter_name: &str,
) -> Result<ComposeOutcome, ControllerError> {
    if !world.is_valid(record.device) {
        return Ok(ComposeOutcome::Stale);
    }
    if !record.any_enabled() {
        let emitter_destroyed = emitter::destroy(world, record);
        return Ok(ComposeOutcome::Dormant { emitter_destroyed });
    }

    emitter::forget_if_stale(world, record);
    let signals = compose(world, record, config);
    if signals.is_empty() {
        let emitter_destroyed = emitter::destroy(world, record);
        return Ok(ComposeOutcome::Cleared { emitter_destroyed });
    }

    let (target, created) = if let Some(existing) = record.emitter {
        (existing, false)
    } else {
        match emitter::create(world, record.device, emitter_name) {
            Ok(created) => {
                record.emitter = Some(created);
                (created, true)
            }
            Err(err) => {
                warn!(device = %record.device_id, error = %err, "Emitter creation failed");
                return Ok(ComposeOutcome::CreationFailed);
            }
        }
    };

    world.clear_output(target)?;
    for signal in &signals {
        world.set_output_slot(target, signal)?;
    }
    debug!(device = %record.device_id, signals = signals.len(), created, "Signals written");
    Ok(ComposeOutcome::Written {
        signals: signals.len(),
        created,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use drillwatch_types::{
        DeviceId, DevicePrototype, DeviceSettings, ForceId, Placement, Position, SignalKind,
    };
    use drillwatch_world::SimWorld;

    use super::*;

    const NAME: &str = "drillwatch-signal-emitter";
    const FORCE: ForceId = ForceId(1);

    fn at(x: f64) -> Placement {
        Placement {
            position: Position { x, y: 0.0 },
            force: FORCE,
        }
    }

    fn prototype(name: &str, speed: f64) -> DevicePrototype {
        DevicePrototype {
            name: name.to_owned(),
            mining_speed: speed,
            drain_rate_percent: None,
        }
    }

    fn record_for(world: &SimWorld, device: EntityId, settings: DeviceSettings) -> MonitoredDeviceRecord {
        let device_id = world.device_id(device).unwrap_or(DeviceId(0));
        MonitoredDeviceRecord {
            device_id,
            device,
            emitter: None,
            settings,
        }
    }

    fn all_features() -> DeviceSettings {
        DeviceSettings {
            counter_enabled: true,
            depletion_signal_enabled: true,
            depletion_signal_override: None,
            effective_yield_enabled: true,
        }
    }

    #[test]
    fn slots_are_contiguous_when_a_feature_is_skipped() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 300, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        // Depletion is enabled but skipped: the device still has ore.
        let record = record_for(&world, drill, all_features());

        let signals = compose(&mut world, &record, &GlobalConfig::default());
        let slots: Vec<u32> = signals.iter().map(|s| s.slot_index).collect();
        assert_eq!(slots, vec![1, 2]);
        assert_eq!(signals.first().map(|s| s.signal.name.as_str()), Some("electric-mining-drill"));
        assert_eq!(signals.get(1).map(|s| s.quantity), Some(300));
    }

    #[test]
    fn depleting_takes_precedence_over_non_depleting() {
        let mut world = SimWorld::new();
        world.register_fluid("crude-oil");
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 100, 1.0, 1, at(0.0));
        world.add_resource("crude-oil", ResourceRegime::NonDepleting, 80, 1.0, 1, at(3.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        let settings = DeviceSettings {
            effective_yield_enabled: true,
            ..DeviceSettings::default()
        };
        let record = record_for(&world, drill, settings);

        let signals = compose(&mut world, &record, &GlobalConfig::default());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals.first().map(|s| s.signal.clone()), Some(SignalId::item("iron-ore")));
    }

    #[test]
    fn rate_mode_resolves_fluid_and_appends_indicator() {
        let mut world = SimWorld::new();
        world.register_fluid("crude-oil");
        let oil = world.add_resource("crude-oil", ResourceRegime::NonDepleting, 100, 1.0, 1, at(0.0));
        let jack = world.add_drill(prototype("pumpjack", 1.0), at(0.0), vec![oil]);
        let settings = DeviceSettings {
            effective_yield_enabled: true,
            ..DeviceSettings::default()
        };
        let record = record_for(&world, jack, settings);
        let config = GlobalConfig {
            rate_indicator_signal: SignalId::virtual_signal("signal-Q"),
            ..GlobalConfig::default()
        };

        let signals = compose(&mut world, &record, &config);
        assert_eq!(signals.len(), 2);
        let oil_signal = signals.first().unwrap();
        assert_eq!(oil_signal.signal.kind, SignalKind::Fluid);
        assert_eq!(oil_signal.quantity, 60);
        assert_eq!(signals.get(1).map(|s| s.signal.name.as_str()), Some("signal-Q"));
        assert_eq!(signals.get(1).map(|s| s.slot_index), Some(2));
    }

    #[test]
    fn channels_follow_name_order() {
        let mut world = SimWorld::new();
        let stone = world.add_resource("stone", ResourceRegime::Depleting, 50, 1.0, 1, at(0.0));
        world.add_resource("coal", ResourceRegime::Depleting, 70, 1.0, 1, at(1.0));
        world.add_resource("copper-ore", ResourceRegime::Depleting, 90, 1.0, 1, at(2.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![stone]);
        let settings = DeviceSettings {
            effective_yield_enabled: true,
            ..DeviceSettings::default()
        };
        let record = record_for(&world, drill, settings);

        let names: Vec<String> = compose(&mut world, &record, &GlobalConfig::default())
            .into_iter()
            .map(|s| s.signal.name)
            .collect();
        assert_eq!(names, vec!["coal", "copper-ore", "stone"]);
    }

    #[test]
    fn productivity_bonus_of_owning_force_applies() {
        let mut world = SimWorld::new();
        world.set_productivity(FORCE, 0.5);
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 1000, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        let settings = DeviceSettings {
            effective_yield_enabled: true,
            ..DeviceSettings::default()
        };
        let record = record_for(&world, drill, settings);
        let signals = compose(&mut world, &record, &GlobalConfig::default());
        assert_eq!(signals.first().map(|s| s.quantity), Some(1500));
    }

    #[test]
    fn depletion_override_replaces_default() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 5, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        world.extract(ore, 5).unwrap();
        let settings = DeviceSettings {
            depletion_signal_enabled: true,
            depletion_signal_override: Some(SignalId::item("iron-plate")),
            ..DeviceSettings::default()
        };
        let record = record_for(&world, drill, settings);
        let signals = compose(&mut world, &record, &GlobalConfig::default());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals.first().map(|s| s.signal.clone()), Some(SignalId::item("iron-plate")));
    }

    #[test]
    fn apply_writes_then_clears_when_signals_vanish() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 40, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        let settings = DeviceSettings {
            effective_yield_enabled: true,
            ..DeviceSettings::default()
        };
        let mut record = record_for(&world, drill, settings);
        let config = GlobalConfig::default();

        let outcome = apply(&mut world, &mut record, &config, NAME).unwrap();
        assert_eq!(outcome, ComposeOutcome::Written { signals: 1, created: true });
        let emitter = record.emitter.unwrap();
        assert_eq!(world.output_signals(emitter).map(|s| s.len()), Some(1));

        world.extract(ore, 40).unwrap();
        let outcome = apply(&mut world, &mut record, &config, NAME).unwrap();
        assert_eq!(outcome, ComposeOutcome::Cleared { emitter_destroyed: true });
        assert!(record.emitter.is_none());
        assert!(world.emitters().is_empty());
    }

    #[test]
    fn apply_overwrites_previous_slots() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 40, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        let mut record = record_for(&world, drill, all_features());
        let config = GlobalConfig::default();
        apply(&mut world, &mut record, &config, NAME).unwrap();

        record.settings.counter_enabled = false;
        apply(&mut world, &mut record, &config, NAME).unwrap();
        let written = world.output_signals(record.emitter.unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written.first().map(|s| s.slot_index), Some(1));
        assert_eq!(written.first().map(|s| s.signal.name.as_str()), Some("iron-ore"));
    }

    #[test]
    fn apply_reports_creation_failure_and_retries() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 40, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        let mut record = record_for(&world, drill, all_features());
        let config = GlobalConfig::default();

        world.refuse_creation(Some("blocked".to_owned()));
        let outcome = apply(&mut world, &mut record, &config, NAME).unwrap();
        assert_eq!(outcome, ComposeOutcome::CreationFailed);
        assert!(record.emitter.is_none());
        assert!(record.any_enabled());

        world.refuse_creation(None);
        let outcome = apply(&mut world, &mut record, &config, NAME).unwrap();
        assert!(matches!(outcome, ComposeOutcome::Written { created: true, .. }));
    }

    #[test]
    fn apply_recreates_vanished_emitter() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 40, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        let mut record = record_for(&world, drill, all_features());
        let config = GlobalConfig::default();
        apply(&mut world, &mut record, &config, NAME).unwrap();
        let first = record.emitter.unwrap();
        world.remove_entity(first);

        let outcome = apply(&mut world, &mut record, &config, NAME).unwrap();
        assert!(matches!(outcome, ComposeOutcome::Written { created: true, .. }));
        assert_ne!(record.emitter, Some(first));
    }

    #[test]
    fn apply_replaces_handle_that_points_at_a_player_entity() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 40, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        let pole = world.add_pole("small-electric-pole", at(2.0));
        let mut record = record_for(&world, drill, all_features());
        record.emitter = Some(pole);

        let outcome = apply(&mut world, &mut record, &GlobalConfig::default(), NAME).unwrap();
        assert!(matches!(outcome, ComposeOutcome::Written { created: true, .. }));
        assert_ne!(record.emitter, Some(pole));
        assert!(world.is_valid(pole));
    }

    #[test]
    fn apply_on_invalid_device_is_a_noop() {
        let mut world = SimWorld::new();
        let ore = world.add_resource("iron-ore", ResourceRegime::Depleting, 40, 1.0, 1, at(0.0));
        let drill = world.add_drill(prototype("electric-mining-drill", 0.5), at(0.0), vec![ore]);
        let mut record = record_for(&world, drill, all_features());
        world.remove_entity(drill);
        let outcome = apply(&mut world, &mut record, &GlobalConfig::default(), NAME).unwrap();
        assert_eq!(outcome, ComposeOutcome::Stale);
        assert!(world.emitters().is_empty());
    }
}
