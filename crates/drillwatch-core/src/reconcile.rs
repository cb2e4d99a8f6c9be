//! The controller and its periodic reconciliation pass.
//!
//! Each record moves between three states (see [`DeviceState`]):
//!
//! - **Dormant** -- no feature enabled. No emitter, no work.
//! - **Active** -- at least one feature enabled. Recomputed on every pass
//!   and on every configuration change.
//! - **Stale** -- the device is gone. Removed (with its emitter) on the next
//!   pass or on the host's removal notification.
//!
//! A pass runs every `reconcile_interval_ticks` host ticks. It is the only
//! unprompted refresh, and the only place wiring is re-synced apart from
//! emitter creation.

use drillwatch_types::{DeviceId, DeviceState};
use drillwatch_world::HostWorld;
use tracing::{debug, info, warn};

use crate::compositor::{self, ComposeOutcome};
use crate::config::{ControllerConfig, GlobalConfig, GlobalSettings};
use crate::emitter;
use crate::error::ControllerError;
use crate::registry::{DeviceRegistry, MonitoredDeviceRecord};

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Host tick the pass ran on.
    pub tick: u64,
    /// Active devices whose outputs were recomputed.
    pub refreshed: usize,
    /// Wire edges added or removed by topology sync.
    pub synced_edges: usize,
    /// Records dropped because their device vanished.
    pub removed: usize,
    /// Devices whose refresh failed or whose emitter could not be created.
    pub failed: usize,
}

/// Owns the device registry and the resolved global settings.
#[derive(Debug, Clone)]
pub struct Controller {
    pub(crate) registry: DeviceRegistry,
    settings: GlobalSettings,
    config: GlobalConfig,
    interval: u64,
    emitter_name: String,
}

impl Controller {
    /// Build an empty controller from loaded configuration.
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            settings: config.signals.clone(),
            config: config.signals.snapshot(),
            interval: config.controller.reconcile_interval_ticks.max(1),
            emitter_name: config.controller.emitter_name.clone(),
        }
    }

    /// The device registry.
    pub const fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// The resolved global settings passed to every recompute.
    pub const fn global_config(&self) -> &GlobalConfig {
        &self.config
    }

    /// The raw global settings the snapshot was resolved from.
    pub const fn global_settings(&self) -> &GlobalSettings {
        &self.settings
    }

    /// Replace the global settings and re-resolve the snapshot.
    ///
    /// Does not recompute any device; callers follow up with
    /// [`Controller::refresh_all`].
    pub fn set_global_settings(&mut self, settings: GlobalSettings) {
        self.config = settings.snapshot();
        self.settings = settings;
    }

    /// Ticks between two passes.
    pub const fn reconcile_interval(&self) -> u64 {
        self.interval
    }

    /// Prototype name used when placing emitters.
    pub fn emitter_name(&self) -> &str {
        &self.emitter_name
    }

    /// Whether a pass is due on `tick`.
    pub fn is_due(&self, tick: u64) -> bool {
        tick.checked_rem(self.interval) == Some(0)
    }

    /// Run a pass if one is due on `tick`.
    pub fn on_tick(&mut self, world: &mut dyn HostWorld, tick: u64) -> Option<ReconcileSummary> {
        self.is_due(tick).then(|| self.reconcile(world, tick))
    }

    /// Run one reconciliation pass over every registered device.
    ///
    /// Works from a snapshot of the registry's ids. A failure on one device
    /// is logged and counted; the pass always visits every device.
    pub fn reconcile(&mut self, world: &mut dyn HostWorld, tick: u64) -> ReconcileSummary {
        let mut summary = ReconcileSummary {
            tick,
            ..ReconcileSummary::default()
        };

        for device_id in self.registry.ids() {
            let Some(record) = self.registry.get_mut(device_id) else {
                continue;
            };
            match record.state(world) {
                DeviceState::Stale => {
                    self.registry.remove(world, device_id);
                    summary.removed = summary.removed.saturating_add(1);
                }
                DeviceState::Dormant => {
                    // A dormant record never keeps an emitter.
                    emitter::destroy(world, record);
                }
                DeviceState::Active => {
                    match refresh_and_sync(world, record, &self.config, &self.emitter_name) {
                        Ok((ComposeOutcome::CreationFailed, _)) => {
                            summary.failed = summary.failed.saturating_add(1);
                        }
                        Ok((_, edges)) => {
                            summary.refreshed = summary.refreshed.saturating_add(1);
                            summary.synced_edges = summary.synced_edges.saturating_add(edges);
                        }
                        Err(err) => {
                            warn!(tick, device = %device_id, error = %err, "Device reconcile failed");
                            summary.failed = summary.failed.saturating_add(1);
                        }
                    }
                }
            }
        }

        if summary.removed > 0 {
            info!(tick, removed = summary.removed, "Dropped records of vanished devices");
        }
        debug!(
            tick,
            refreshed = summary.refreshed,
            synced_edges = summary.synced_edges,
            failed = summary.failed,
            "Reconcile pass complete"
        );
        summary
    }

    /// Recompute one device's outputs right away.
    ///
    /// Used after configuration changes. Wiring is left for the next pass.
    /// A device found gone is removed from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownDevice`] if the id is not
    /// registered, or the host's error if a slot write fails.
    pub fn refresh_device(
        &mut self,
        world: &mut dyn HostWorld,
        device_id: DeviceId,
    ) -> Result<ComposeOutcome, ControllerError> {
        let record = self
            .registry
            .get_mut(device_id)
            .ok_or(ControllerError::UnknownDevice(device_id))?;
        let outcome = compositor::apply(world, record, &self.config, &self.emitter_name)?;
        if outcome == ComposeOutcome::Stale {
            self.registry.remove(world, device_id);
        }
        Ok(outcome)
    }

    /// Recompute every registered device right away.
    ///
    /// Returns the number of devices refreshed without error.
    pub fn refresh_all(&mut self, world: &mut dyn HostWorld) -> usize {
        let mut refreshed = 0_usize;
        for device_id in self.registry.ids() {
            match self.refresh_device(world, device_id) {
                Ok(ComposeOutcome::Stale) => {}
                Ok(_) => refreshed = refreshed.saturating_add(1),
                Err(err) => warn!(device = %device_id, error = %err, "Device refresh failed"),
            }
        }
        refreshed
    }
}

/// Recompute a record's outputs, then mirror the device's wiring onto the
/// emitter if one exists. Returns the compose outcome and the number of
/// edges changed.
fn refresh_and_sync(
    world: &mut dyn HostWorld,
    record: &mut MonitoredDeviceRecord,
    config: &GlobalConfig,
    emitter_name: &str,
) -> Result<(ComposeOutcome, usize), ControllerError> {
    let outcome = compositor::apply(world, record, config, emitter_name)?;
    let edges = match record.emitter {
        Some(emitter) => emitter::sync_topology(world, record.device, emitter)?.edge_changes(),
        None => 0,
    };
    Ok((outcome, edges))
}
