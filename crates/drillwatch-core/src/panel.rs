//! View model for the per-device configuration panel.

use drillwatch_types::{DeviceId, DeviceState, SignalId};
use drillwatch_world::HostWorld;
use serde::Serialize;

use crate::config::GlobalConfig;
use crate::emitter;
use crate::registry::MonitoredDeviceRecord;

/// Everything the panel shows for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    /// The device being configured.
    pub device_id: DeviceId,
    /// Counter checkbox.
    pub counter_enabled: bool,
    /// Depletion checkbox.
    pub depletion_signal_enabled: bool,
    /// Signal shown in the depletion picker: the override, or the global
    /// default when there is none.
    pub depletion_signal: SignalId,
    /// Whether the picker shows the global default.
    pub depletion_signal_is_default: bool,
    /// Effective-yield checkbox.
    pub effective_yield_enabled: bool,
    /// Whether an emitter currently exists for the device.
    pub emitter_present: bool,
    /// Current lifecycle state.
    pub state: DeviceState,
}

impl PanelView {
    /// Build the view from a record and the global settings.
    pub fn from_record(
        world: &dyn HostWorld,
        record: &MonitoredDeviceRecord,
        config: &GlobalConfig,
    ) -> Self {
        let settings = &record.settings;
        let (depletion_signal, depletion_signal_is_default) =
            match &settings.depletion_signal_override {
                Some(signal) => (signal.clone(), false),
                None => (config.depletion_signal.clone(), true),
            };
        Self {
            device_id: record.device_id,
            counter_enabled: settings.counter_enabled,
            depletion_signal_enabled: settings.depletion_signal_enabled,
            depletion_signal,
            depletion_signal_is_default,
            effective_yield_enabled: settings.effective_yield_enabled,
            emitter_present: record
                .emitter
                .is_some_and(|handle| emitter::is_emitter(world, handle)),
            state: record.state(world),
        }
    }
}

#[cfg(test)]
mod tests {
    use drillwatch_types::{DevicePrototype, EntityId, ForceId, Placement, Position};
    use drillwatch_world::SimWorld;

    use super::*;

    fn world_with_drill() -> (SimWorld, EntityId) {
        let mut world = SimWorld::new();
        let drill = world.add_drill(
            DevicePrototype {
                name: "electric-mining-drill".to_owned(),
                mining_speed: 0.5,
                drain_rate_percent: None,
            },
            Placement {
                position: Position::default(),
                force: ForceId(1),
            },
            Vec::new(),
        );
        (world, drill)
    }

    #[test]
    fn shows_global_default_without_override() {
        let (world, drill) = world_with_drill();
        let record = MonitoredDeviceRecord::new(DeviceId(1), drill);
        let view = PanelView::from_record(&world, &record, &GlobalConfig::default());
        assert_eq!(view.depletion_signal, SignalId::virtual_signal("signal-D"));
        assert!(view.depletion_signal_is_default);
        assert_eq!(view.state, DeviceState::Dormant);
        assert!(!view.emitter_present);
    }

    #[test]
    fn shows_override_when_chosen() {
        let (world, drill) = world_with_drill();
        let mut record = MonitoredDeviceRecord::new(DeviceId(1), drill);
        record.settings.depletion_signal_enabled = true;
        record.settings.depletion_signal_override = Some(SignalId::item("stone"));
        let view = PanelView::from_record(&world, &record, &GlobalConfig::default());
        assert_eq!(view.depletion_signal, SignalId::item("stone"));
        assert!(!view.depletion_signal_is_default);
        assert_eq!(view.state, DeviceState::Active);
    }
}
