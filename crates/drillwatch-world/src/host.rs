//! The host-world trait.
//!
//! The host owns every entity, the wire graph, and the resource field. The
//! controller only observes it, with three narrow exceptions: it may flip a
//! device's read mode (and must restore it), it creates and destroys its own
//! emitters, and it wires those emitters to their devices.
//!
//! Handles are never assumed live. Every method accepts possibly-stale
//! handles and reports them through `None`, `false`, an empty list, or
//! [`WorldError::InvalidEntity`].

use drillwatch_types::{
    DeviceId, DevicePrototype, EmitterSpec, EntityId, EntityKind, ForceId, OutputSignal,
    Placement, ReadMode, ResourceHandle, WireChannel,
};

use crate::error::WorldError;

/// The collaborator interface the controller consumes.
pub trait HostWorld {
    // -------------------------------------------------------------------
    // Identity and validity
    // -------------------------------------------------------------------

    /// Whether the handle still refers to a live entity.
    fn is_valid(&self, entity: EntityId) -> bool;

    /// Stable unit number of a live device.
    fn device_id(&self, entity: EntityId) -> Option<DeviceId>;

    /// Classification of a live entity.
    fn entity_kind(&self, entity: EntityId) -> Option<EntityKind>;

    /// Position and owning force of a live entity.
    fn placement(&self, entity: EntityId) -> Option<Placement>;

    /// Prototype properties of a live mining device.
    fn device_prototype(&self, entity: EntityId) -> Option<DevicePrototype>;

    /// Mining productivity bonus of a force (0.0 = no bonus).
    fn productivity_bonus(&self, force: ForceId) -> f64;

    /// Whether `name` is registered as a fluid (otherwise it is an item).
    fn is_fluid(&self, name: &str) -> bool;

    // -------------------------------------------------------------------
    // Resource reads
    // -------------------------------------------------------------------

    /// Current read mode of a mining device.
    fn read_mode(&self, entity: EntityId) -> Option<ReadMode>;

    /// Change a mining device's read mode.
    fn set_read_mode(&mut self, entity: EntityId, mode: ReadMode) -> Result<(), WorldError>;

    /// Resources the device reads under its current read mode.
    fn resource_targets(&self, entity: EntityId) -> Vec<ResourceHandle>;

    /// The resource the device is extracting right now, if any.
    fn mining_target(&self, entity: EntityId) -> Option<ResourceHandle>;

    // -------------------------------------------------------------------
    // Emitters
    // -------------------------------------------------------------------

    /// Place a new emitter.
    fn create_emitter(&mut self, spec: &EmitterSpec) -> Result<EntityId, WorldError>;

    /// Remove an entity. Returns `false` if it was already gone.
    fn destroy_entity(&mut self, entity: EntityId) -> bool;

    /// Clear every slot of an emitter's output section.
    fn clear_output(&mut self, emitter: EntityId) -> Result<(), WorldError>;

    /// Write one signal into the slot named by its `slot_index`.
    fn set_output_slot(&mut self, emitter: EntityId, signal: &OutputSignal)
    -> Result<(), WorldError>;

    // -------------------------------------------------------------------
    // Wiring
    // -------------------------------------------------------------------

    /// Live entities directly wired to `entity` on `channel`.
    fn wire_neighbours(&self, entity: EntityId, channel: WireChannel) -> Vec<EntityId>;

    /// Wire two entities together. Returns `false` if they already were.
    fn connect(&mut self, a: EntityId, b: EntityId, channel: WireChannel)
    -> Result<bool, WorldError>;

    /// Remove the wire between two entities. Returns `false` if there was none.
    fn disconnect(
        &mut self,
        a: EntityId,
        b: EntityId,
        channel: WireChannel,
    ) -> Result<bool, WorldError>;
}
