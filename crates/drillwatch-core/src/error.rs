//! Error types for the `drillwatch-core` crate.
//!
//! None of these errors is fatal to the controller as a whole. The
//! reconciliation loop logs and counts per-device failures and moves on to
//! the next device.

use drillwatch_types::{DeviceId, EntityId, PlayerId};
use drillwatch_world::WorldError;

/// Errors raised while creating or wiring an emitter.
#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    /// The device the emitter would mirror is gone.
    #[error("device entity {0} is not valid")]
    InvalidDevice(EntityId),

    /// The host refused to place the emitter.
    #[error("emitter creation failed: {source}")]
    CreationFailed {
        /// The underlying host error.
        #[from]
        source: WorldError,
    },
}

/// Errors raised while handling one device or one event.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// A host operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// An event named a device the registry does not know.
    #[error("device {0} is not registered")]
    UnknownDevice(DeviceId),

    /// An event named an entity that is not a live monitored device.
    #[error("entity {0} is not a monitored device")]
    NotMonitored(EntityId),

    /// A panel action arrived from a player with no panel open.
    #[error("player {0} has no configuration panel open")]
    NoOpenPanel(PlayerId),

    /// A settings tag bundle could not be encoded or decoded.
    #[error("settings tags error: {source}")]
    Tags {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Errors raised while saving or loading controller state.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The save blob is not valid JSON for the expected shape.
    #[error("save blob error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The blob was written by a newer schema than this build understands.
    #[error("save schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the blob.
        found: u32,
        /// Newest version this build reads.
        supported: u32,
    },
}
