//! Host notifications and the single function that handles them.
//!
//! Every callback the host makes is turned into a [`ControllerEvent`] and
//! passed to [`Controller::dispatch`]. Handlers run to completion; any
//! change to a device's configuration recomputes that device before the
//! handler returns, so outputs never wait for the next periodic pass.

use drillwatch_types::{DeviceId, EntityId, Feature, PlayerId, SignalId};
use drillwatch_world::HostWorld;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::blueprint;
use crate::compositor::ComposeOutcome;
use crate::config::GlobalSettings;
use crate::error::ControllerError;
use crate::panel::PanelView;
use crate::reconcile::{Controller, ReconcileSummary};

/// A notification from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A host tick elapsed.
    Tick {
        /// Current host tick.
        tick: u64,
    },
    /// A mining device was placed, possibly from a blueprint.
    DeviceBuilt {
        /// The new device.
        device: EntityId,
        /// Tag object carried by the blueprint, if any.
        tags: Option<Value>,
    },
    /// A mining device was mined, destroyed, or otherwise removed.
    DeviceRemoved {
        /// Stable identity of the removed device.
        device_id: DeviceId,
    },
    /// A player opened a device's configuration panel.
    PanelOpened {
        /// The player.
        player: PlayerId,
        /// The device.
        device: EntityId,
    },
    /// A player closed their configuration panel.
    PanelClosed {
        /// The player.
        player: PlayerId,
    },
    /// A player flipped a feature checkbox in their open panel.
    FeatureToggled {
        /// The player.
        player: PlayerId,
        /// Which feature.
        feature: Feature,
        /// New state.
        enabled: bool,
    },
    /// A player picked (or cleared) the depletion signal in their open
    /// panel.
    DepletionSignalChosen {
        /// The player.
        player: PlayerId,
        /// The new override; `None` returns to the global default.
        signal: Option<SignalId>,
    },
    /// A player copied one device's settings onto another.
    SettingsPasted {
        /// Device copied from.
        source: EntityId,
        /// Device pasted onto.
        destination: EntityId,
    },
    /// The host is capturing a device into a blueprint.
    BlueprintCaptured {
        /// The device being captured.
        device: EntityId,
    },
    /// Global settings changed at runtime.
    GlobalSettingsChanged {
        /// The new settings.
        settings: GlobalSettings,
    },
    /// The host loaded the controller under a new configuration or version.
    ConfigurationChanged,
}

/// What handling an event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Nothing to do for this event.
    Ignored,
    /// A periodic pass ran.
    Reconciled(ReconcileSummary),
    /// A device was registered without being recomputed (nothing enabled).
    Registered {
        /// The registered device.
        device_id: DeviceId,
    },
    /// A device was recomputed.
    Refreshed {
        /// The device.
        device_id: DeviceId,
        /// What the recompute did.
        outcome: ComposeOutcome,
    },
    /// A device's record was removed.
    Removed {
        /// The device.
        device_id: DeviceId,
    },
    /// A panel should be shown or redrawn.
    Panel(PanelView),
    /// A panel was closed.
    PanelClosed {
        /// The device whose panel was open, if any.
        device_id: Option<DeviceId>,
    },
    /// Tag object to store in the blueprint.
    Tags(Value),
    /// Every device was recomputed.
    RefreshedAll {
        /// Devices refreshed without error.
        refreshed: usize,
    },
}

impl Controller {
    /// Handle one host notification.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] when the event names an entity that is
    /// not a live mining device, a player with no open panel, or a device
    /// whose emitter slots the host refused to write.
    pub fn dispatch(
        &mut self,
        world: &mut dyn HostWorld,
        event: ControllerEvent,
    ) -> Result<EventOutcome, ControllerError> {
        match event {
            ControllerEvent::Tick { tick } => Ok(self
                .on_tick(world, tick)
                .map_or(EventOutcome::Ignored, EventOutcome::Reconciled)),
            ControllerEvent::DeviceBuilt { device, tags } => self.on_device_built(world, device, tags),
            ControllerEvent::DeviceRemoved { device_id } => {
                Ok(match self.registry.remove(world, device_id) {
                    Some(_) => {
                        debug!(device = %device_id, "Device removed");
                        EventOutcome::Removed { device_id }
                    }
                    None => EventOutcome::Ignored,
                })
            }
            ControllerEvent::PanelOpened { player, device } => {
                let device_id = self.registry.get_or_create(world, device)?.device_id;
                self.registry.open_session(player, device_id);
                self.panel(world, device_id)
            }
            ControllerEvent::PanelClosed { player } => Ok(EventOutcome::PanelClosed {
                device_id: self.registry.close_session(player),
            }),
            ControllerEvent::FeatureToggled {
                player,
                feature,
                enabled,
            } => {
                let device_id = self.session(player)?;
                self.record_mut(device_id)?
                    .settings
                    .set_enabled(feature, enabled);
                debug!(device = %device_id, ?feature, enabled, "Feature toggled");
                self.refresh_device(world, device_id)?;
                self.panel(world, device_id)
            }
            ControllerEvent::DepletionSignalChosen { player, signal } => {
                let device_id = self.session(player)?;
                self.record_mut(device_id)?.settings.depletion_signal_override = signal;
                self.refresh_device(world, device_id)?;
                self.panel(world, device_id)
            }
            ControllerEvent::SettingsPasted {
                source,
                destination,
            } => self.on_settings_pasted(world, source, destination),
            ControllerEvent::BlueprintCaptured { device } => {
                let device_id = world
                    .device_id(device)
                    .ok_or(ControllerError::NotMonitored(device))?;
                match self.registry.get(device_id) {
                    Some(record) if record.any_enabled() => {
                        Ok(EventOutcome::Tags(blueprint::to_tags(&blueprint::capture(record))?))
                    }
                    _ => Ok(EventOutcome::Ignored),
                }
            }
            ControllerEvent::GlobalSettingsChanged { settings } => {
                self.set_global_settings(settings);
                info!("Global settings changed");
                Ok(EventOutcome::RefreshedAll {
                    refreshed: self.refresh_all(world),
                })
            }
            ControllerEvent::ConfigurationChanged => {
                self.registry.sweep_invalid(world);
                Ok(EventOutcome::RefreshedAll {
                    refreshed: self.refresh_all(world),
                })
            }
        }
    }

    fn on_device_built(
        &mut self,
        world: &mut dyn HostWorld,
        device: EntityId,
        tags: Option<Value>,
    ) -> Result<EventOutcome, ControllerError> {
        let settings = match tags.as_ref().map(blueprint::from_tags).transpose() {
            Ok(settings) => settings.flatten(),
            Err(err) => {
                warn!(device = %device, error = %err, "Ignoring unreadable blueprint tags");
                None
            }
        };
        let record = self.registry.get_or_create(world, device)?;
        let device_id = record.device_id;
        if let Some(settings) = settings {
            blueprint::apply_settings(record, settings);
        }
        if !record.any_enabled() {
            return Ok(EventOutcome::Registered { device_id });
        }
        let outcome = self.refresh_device(world, device_id)?;
        Ok(EventOutcome::Refreshed { device_id, outcome })
    }

    fn on_settings_pasted(
        &mut self,
        world: &mut dyn HostWorld,
        source: EntityId,
        destination: EntityId,
    ) -> Result<EventOutcome, ControllerError> {
        let settings = blueprint::capture(self.registry.get_or_create(world, source)?);
        let record = self.registry.get_or_create(world, destination)?;
        let device_id = record.device_id;
        blueprint::apply_settings(record, settings);
        let outcome = self.refresh_device(world, device_id)?;
        debug!(device = %device_id, ?outcome, "Settings pasted");
        Ok(EventOutcome::Refreshed { device_id, outcome })
    }

    fn session(&self, player: PlayerId) -> Result<DeviceId, ControllerError> {
        self.registry
            .session_device(player)
            .ok_or(ControllerError::NoOpenPanel(player))
    }

    fn record_mut(
        &mut self,
        device_id: DeviceId,
    ) -> Result<&mut crate::registry::MonitoredDeviceRecord, ControllerError> {
        self.registry
            .get_mut(device_id)
            .ok_or(ControllerError::UnknownDevice(device_id))
    }

    fn panel(&self, world: &dyn HostWorld, device_id: DeviceId) -> Result<EventOutcome, ControllerError> {
        let record = self
            .registry
            .get(device_id)
            .ok_or(ControllerError::UnknownDevice(device_id))?;
        Ok(EventOutcome::Panel(PanelView::from_record(
            world,
            record,
            self.global_config(),
        )))
    }
}
