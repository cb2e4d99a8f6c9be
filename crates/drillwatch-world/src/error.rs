//! Error types for the `drillwatch-world` crate.
//!
//! All fallible host operations return [`WorldError`] through the standard
//! [`Result`] type.

use drillwatch_types::{EntityId, WireChannel};

/// Errors that can occur during host-world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The entity handle no longer refers to a live entity.
    #[error("entity {0} is not valid")]
    InvalidEntity(EntityId),

    /// The entity exists but does not support the requested operation.
    #[error("entity {entity} does not support {operation}")]
    Unsupported {
        /// The entity that was addressed.
        entity: EntityId,
        /// Short name of the rejected operation.
        operation: &'static str,
    },

    /// The host refused to place a new entity.
    #[error("cannot create {name}: {reason}")]
    CreationRefused {
        /// Prototype name of the entity that could not be placed.
        name: String,
        /// Host-supplied explanation.
        reason: String,
    },

    /// A wire cannot connect an entity to itself.
    #[error("cannot wire entity {entity} to itself on {channel:?}")]
    SelfConnection {
        /// The entity at both ends.
        entity: EntityId,
        /// The channel requested.
        channel: WireChannel,
    },

    /// An output slot index outside the emitter's section.
    #[error("slot {slot} out of range for emitter {entity} (capacity {capacity})")]
    SlotOutOfRange {
        /// The emitter.
        entity: EntityId,
        /// Requested 1-based slot.
        slot: u32,
        /// Number of available slots.
        capacity: u32,
    },
}
