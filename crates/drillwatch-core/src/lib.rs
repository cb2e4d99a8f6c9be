//! Signal composition, emitter management, and the reconciliation loop.
//!
//! This crate owns every monitored-device record and keeps each device's
//! signal emitter in step with the resource field, the device's settings,
//! and the device's wiring.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `drillwatch-config.yaml` and
//!   the resolved [`GlobalConfig`] snapshot.
//! - [`error`] -- [`ControllerError`] and friends.
//! - [`reader`] -- Resource presence and whole-patch reads with read-mode
//!   save/restore.
//! - [`yields`] -- Effective amount and rate formulas.
//! - [`registry`] -- [`DeviceRegistry`]: records keyed by device identity,
//!   GUI sessions, sweep of invalid devices.
//! - [`emitter`] -- Emitter creation, destruction, and topology sync.
//! - [`compositor`] -- Builds the ordered signal list and writes it out.
//! - [`reconcile`] -- [`Controller`] and the periodic reconciliation pass.
//! - [`dispatch`] -- [`ControllerEvent`] and the event dispatch function.
//! - [`blueprint`] -- Settings bundle carried by blueprints and copy/paste.
//! - [`panel`] -- [`PanelView`] rendered by the configuration panel.
//! - [`persist`] -- JSON save blob with schema migration.
//!
//! [`GlobalConfig`]: config::GlobalConfig
//! [`ControllerError`]: error::ControllerError
//! [`DeviceRegistry`]: registry::DeviceRegistry
//! [`Controller`]: reconcile::Controller
//! [`ControllerEvent`]: dispatch::ControllerEvent
//! [`PanelView`]: panel::PanelView

pub mod blueprint;
pub mod compositor;
pub mod config;
pub mod dispatch;
pub mod emitter;
pub mod error;
pub mod panel;
pub mod persist;
pub mod reader;
pub mod reconcile;
pub mod registry;
pub mod yields;

pub use config::{ControllerConfig, GlobalConfig, GlobalSettings};
pub use dispatch::{ControllerEvent, EventOutcome};
pub use error::ControllerError;
pub use reconcile::{Controller, ReconcileSummary};
pub use registry::{DeviceRegistry, MonitoredDeviceRecord};
