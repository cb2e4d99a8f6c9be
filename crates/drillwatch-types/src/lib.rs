//! Shared type definitions for the Drillwatch signal controller.
//!
//! This crate is the single source of truth for the values that cross the
//! boundary between the controller and the host world: entity handles,
//! signal identifiers, resource readings, and per-device settings.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer wrappers for host-assigned identifiers
//! - [`enums`] -- Enumeration types (signal kinds, wire channels, read modes)
//! - [`structs`] -- Value structs (signals, resource handles, prototypes)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{DeviceState, EntityKind, Feature, ReadMode, ResourceRegime, SignalKind, WireChannel};
pub use ids::{DeviceId, EntityId, ForceId, PlayerId};
pub use structs::{
    DevicePrototype, DeviceSettings, EmitterFlags, EmitterSpec, OutputSignal, Placement, Position,
    ResourceHandle, SignalId,
};
