//! In-memory host world.
//!
//! [`SimWorld`] implements [`HostWorld`] over plain `BTreeMap`s. It models
//! just enough of a mining site for the controller to run against it:
//!
//! - **Resources** belong to a numbered patch. A drill's single-target read
//!   returns the resources under its mining area; an entire-field read
//!   returns every resource in any patch the area touches.
//! - **Drills** carry a prototype, a read mode and a mining area.
//! - **Emitters** carry their creation spec and a slot map.
//! - **Wires** live in a [`BusGraph`].
//!
//! Host-side mutations that the controller must tolerate (removing
//! entities, exhausting resources, rewiring, refusing placements) are
//! exposed as inherent methods.

use std::collections::{BTreeMap, BTreeSet};

use drillwatch_types::{
    DeviceId, DevicePrototype, EmitterSpec, EntityId, EntityKind, ForceId, OutputSignal,
    Placement, ReadMode, ResourceHandle, ResourceRegime, WireChannel,
};
use tracing::debug;

use crate::bus::BusGraph;
use crate::error::WorldError;
use crate::host::HostWorld;

/// Number of output slots in an emitter's section.
pub const DEFAULT_SLOT_CAPACITY: u32 = 1000;

/// Mutable state of a drill.
#[derive(Debug, Clone)]
struct DrillBody {
    prototype: DevicePrototype,
    read_mode: ReadMode,
    area: Vec<EntityId>,
}

/// Mutable state of a resource tile.
#[derive(Debug, Clone)]
struct ResourceBody {
    regime: ResourceRegime,
    amount: u64,
    mining_time: f64,
    patch: u32,
}

/// Mutable state of an emitter.
#[derive(Debug, Clone)]
struct EmitterBody {
    spec: EmitterSpec,
    slots: BTreeMap<u32, OutputSignal>,
}

#[derive(Debug, Clone)]
enum Body {
    Drill(DrillBody),
    Resource(ResourceBody),
    Emitter(EmitterBody),
    Other,
}

/// One live entity.
#[derive(Debug, Clone)]
struct SimEntity {
    name: String,
    unit: Option<DeviceId>,
    placement: Placement,
    body: Body,
}

impl SimEntity {
    const fn kind(&self) -> EntityKind {
        match self.body {
            Body::Drill(_) => EntityKind::MiningDrill,
            Body::Resource(_) => EntityKind::Resource,
            Body::Emitter(_) => EntityKind::SignalEmitter,
            Body::Other => EntityKind::Other,
        }
    }
}

/// An in-memory mining site implementing [`HostWorld`].
#[derive(Debug, Clone)]
pub struct SimWorld {
    entities: BTreeMap<EntityId, SimEntity>,
    next_entity: u64,
    next_unit: u64,
    bus: BusGraph,
    fluids: BTreeSet<String>,
    productivity: BTreeMap<ForceId, f64>,
    refuse_creation: Option<String>,
    read_mode_changes: u64,
    slot_capacity: u32,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    /// Create an empty world.
    pub const fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_entity: 1,
            next_unit: 1,
            bus: BusGraph::new(),
            fluids: BTreeSet::new(),
            productivity: BTreeMap::new(),
            refuse_creation: None,
            read_mode_changes: 0,
            slot_capacity: DEFAULT_SLOT_CAPACITY,
        }
    }

    // -------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------

    fn spawn(
        &mut self,
        name: String,
        unit: Option<DeviceId>,
        placement: Placement,
        body: Body,
    ) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        self.entities.insert(
            id,
            SimEntity {
                name,
                unit,
                placement,
                body,
            },
        );
        id
    }

    /// Register a name in the fluid registry.
    pub fn register_fluid(&mut self, name: impl Into<String>) {
        self.fluids.insert(name.into());
    }

    /// Set a force's mining productivity bonus.
    pub fn set_productivity(&mut self, force: ForceId, bonus: f64) {
        self.productivity.insert(force, bonus);
    }

    /// Place a resource tile in `patch`.
    pub fn add_resource(
        &mut self,
        name: impl Into<String>,
        regime: ResourceRegime,
        amount: u64,
        mining_time: f64,
        patch: u32,
        placement: Placement,
    ) -> EntityId {
        self.spawn(
            name.into(),
            None,
            placement,
            Body::Resource(ResourceBody {
                regime,
                amount,
                mining_time,
                patch,
            }),
        )
    }

    /// Place a mining device over the given resource tiles.
    ///
    /// The device gets the next unit number and starts in
    /// [`ReadMode::SingleTarget`].
    pub fn add_drill(
        &mut self,
        prototype: DevicePrototype,
        placement: Placement,
        area: Vec<EntityId>,
    ) -> EntityId {
        let unit = DeviceId(self.next_unit);
        self.next_unit = self.next_unit.saturating_add(1);
        let name = prototype.name.clone();
        self.spawn(
            name,
            Some(unit),
            placement,
            Body::Drill(DrillBody {
                prototype,
                read_mode: ReadMode::SingleTarget,
                area,
            }),
        )
    }

    /// Place a passive entity (a power pole, a chest) that can carry wires.
    pub fn add_pole(&mut self, name: impl Into<String>, placement: Placement) -> EntityId {
        self.spawn(name.into(), None, placement, Body::Other)
    }

    /// Make every later emitter placement fail with `reason`, or lift the
    /// block with `None`.
    pub fn refuse_creation(&mut self, reason: Option<String>) {
        self.refuse_creation = reason;
    }

    /// Shrink or grow every emitter's output section.
    pub const fn set_slot_capacity(&mut self, capacity: u32) {
        self.slot_capacity = capacity;
    }

    // -------------------------------------------------------------------
    // Host-side mutation
    // -------------------------------------------------------------------

    /// Remove an entity and every wire attached to it.
    pub fn remove_entity(&mut self, entity: EntityId) -> bool {
        if self.entities.remove(&entity).is_none() {
            return false;
        }
        let wires = self.bus.remove_entity(entity);
        debug!(entity = %entity, wires, "Entity removed");
        true
    }

    /// Overwrite a resource's amount.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidEntity`] or [`WorldError::Unsupported`]
    /// if `resource` is not a live resource tile.
    pub fn set_amount(&mut self, resource: EntityId, amount: u64) -> Result<(), WorldError> {
        let body = self.resource_body_mut(resource)?;
        body.amount = amount;
        Ok(())
    }

    /// Extract up to `units` from a resource. Depleting tiles that reach
    /// zero are removed from the world. Non-depleting tiles never change.
    ///
    /// Returns the number of units taken.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidEntity`] or [`WorldError::Unsupported`]
    /// if `resource` is not a live resource tile.
    pub fn extract(&mut self, resource: EntityId, units: u64) -> Result<u64, WorldError> {
        let body = self.resource_body_mut(resource)?;
        if body.regime == ResourceRegime::NonDepleting {
            return Ok(units);
        }
        let taken = units.min(body.amount);
        body.amount = body.amount.saturating_sub(taken);
        if body.amount == 0 {
            self.remove_entity(resource);
        }
        Ok(taken)
    }

    fn resource_body_mut(&mut self, resource: EntityId) -> Result<&mut ResourceBody, WorldError> {
        match self.entities.get_mut(&resource).map(|e| &mut e.body) {
            Some(Body::Resource(body)) => Ok(body),
            Some(_) => Err(WorldError::Unsupported {
                entity: resource,
                operation: "resource amount",
            }),
            None => Err(WorldError::InvalidEntity(resource)),
        }
    }

    // -------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------

    /// Live resource tiles under a drill's mining area.
    pub fn area_resources(&self, drill: EntityId) -> Vec<EntityId> {
        match self.entities.get(&drill).map(|e| &e.body) {
            Some(Body::Drill(body)) => body
                .area
                .iter()
                .copied()
                .filter(|id| self.entities.contains_key(id))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every live emitter, in id order.
    pub fn emitters(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| matches!(e.body, Body::Emitter(_)))
            .map(|(&id, _)| id)
            .collect()
    }

    /// The placement request an emitter was created from.
    pub fn emitter_spec(&self, emitter: EntityId) -> Option<&EmitterSpec> {
        match self.entities.get(&emitter).map(|e| &e.body) {
            Some(Body::Emitter(body)) => Some(&body.spec),
            _ => None,
        }
    }

    /// Signals currently written into an emitter, in slot order.
    pub fn output_signals(&self, emitter: EntityId) -> Option<Vec<OutputSignal>> {
        match self.entities.get(&emitter).map(|e| &e.body) {
            Some(Body::Emitter(body)) => Some(body.slots.values().cloned().collect()),
            _ => None,
        }
    }

    /// The wire graph.
    pub const fn bus(&self) -> &BusGraph {
        &self.bus
    }

    /// How many times any drill's read mode was changed.
    pub const fn read_mode_changes(&self) -> u64 {
        self.read_mode_changes
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn handle(&self, id: EntityId) -> Option<ResourceHandle> {
        let entity = self.entities.get(&id)?;
        match &entity.body {
            Body::Resource(body) => Some(ResourceHandle {
                entity: id,
                name: entity.name.clone(),
                regime: body.regime,
                amount: body.amount,
                mining_time: body.mining_time,
            }),
            _ => None,
        }
    }

    fn patch_of(&self, id: EntityId) -> Option<u32> {
        match self.entities.get(&id).map(|e| &e.body) {
            Some(Body::Resource(body)) => Some(body.patch),
            _ => None,
        }
    }

    fn emitter_body_mut(&mut self, emitter: EntityId) -> Result<&mut EmitterBody, WorldError> {
        match self.entities.get_mut(&emitter).map(|e| &mut e.body) {
            Some(Body::Emitter(body)) => Ok(body),
            Some(_) => Err(WorldError::Unsupported {
                entity: emitter,
                operation: "output section",
            }),
            None => Err(WorldError::InvalidEntity(emitter)),
        }
    }
}

impl HostWorld for SimWorld {
    fn is_valid(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn device_id(&self, entity: EntityId) -> Option<DeviceId> {
        self.entities.get(&entity).and_then(|e| e.unit)
    }

    fn entity_kind(&self, entity: EntityId) -> Option<EntityKind> {
        self.entities.get(&entity).map(SimEntity::kind)
    }

    fn placement(&self, entity: EntityId) -> Option<Placement> {
        self.entities.get(&entity).map(|e| e.placement)
    }

    fn device_prototype(&self, entity: EntityId) -> Option<DevicePrototype> {
        match self.entities.get(&entity).map(|e| &e.body) {
            Some(Body::Drill(body)) => Some(body.prototype.clone()),
            _ => None,
        }
    }

    fn productivity_bonus(&self, force: ForceId) -> f64 {
        self.productivity.get(&force).copied().unwrap_or(0.0)
    }

    fn is_fluid(&self, name: &str) -> bool {
        self.fluids.contains(name)
    }

    fn read_mode(&self, entity: EntityId) -> Option<ReadMode> {
        match self.entities.get(&entity).map(|e| &e.body) {
            Some(Body::Drill(body)) => Some(body.read_mode),
            _ => None,
        }
    }

    fn set_read_mode(&mut self, entity: EntityId, mode: ReadMode) -> Result<(), WorldError> {
        match self.entities.get_mut(&entity).map(|e| &mut e.body) {
            Some(Body::Drill(body)) => {
                body.read_mode = mode;
                self.read_mode_changes = self.read_mode_changes.saturating_add(1);
                Ok(())
            }
            Some(_) => Err(WorldError::Unsupported {
                entity,
                operation: "read mode",
            }),
            None => Err(WorldError::InvalidEntity(entity)),
        }
    }

    fn resource_targets(&self, entity: EntityId) -> Vec<ResourceHandle> {
        let Some(Body::Drill(body)) = self.entities.get(&entity).map(|e| &e.body) else {
            return Vec::new();
        };
        let area = self.area_resources(entity);
        match body.read_mode {
            ReadMode::SingleTarget => area.iter().filter_map(|&id| self.handle(id)).collect(),
            ReadMode::EntireField => {
                let patches: BTreeSet<u32> =
                    area.iter().filter_map(|&id| self.patch_of(id)).collect();
                self.entities
                    .keys()
                    .filter(|&&id| self.patch_of(id).is_some_and(|p| patches.contains(&p)))
                    .filter_map(|&id| self.handle(id))
                    .collect()
            }
        }
    }

    fn mining_target(&self, entity: EntityId) -> Option<ResourceHandle> {
        self.area_resources(entity)
            .into_iter()
            .filter_map(|id| self.handle(id))
            .find(|h| h.regime == ResourceRegime::NonDepleting || h.amount > 0)
    }

    fn create_emitter(&mut self, spec: &EmitterSpec) -> Result<EntityId, WorldError> {
        if let Some(reason) = &self.refuse_creation {
            return Err(WorldError::CreationRefused {
                name: spec.name.clone(),
                reason: reason.clone(),
            });
        }
        let id = self.spawn(
            spec.name.clone(),
            None,
            spec.placement,
            Body::Emitter(EmitterBody {
                spec: spec.clone(),
                slots: BTreeMap::new(),
            }),
        );
        debug!(entity = %id, name = spec.name, "Emitter placed");
        Ok(id)
    }

    fn destroy_entity(&mut self, entity: EntityId) -> bool {
        self.remove_entity(entity)
    }

    fn clear_output(&mut self, emitter: EntityId) -> Result<(), WorldError> {
        self.emitter_body_mut(emitter)?.slots.clear();
        Ok(())
    }

    fn set_output_slot(
        &mut self,
        emitter: EntityId,
        signal: &OutputSignal,
    ) -> Result<(), WorldError> {
        let capacity = self.slot_capacity;
        let body = self.emitter_body_mut(emitter)?;
        if signal.slot_index == 0 || signal.slot_index > capacity {
            return Err(WorldError::SlotOutOfRange {
                entity: emitter,
                slot: signal.slot_index,
                capacity,
            });
        }
        body.slots.insert(signal.slot_index, signal.clone());
        Ok(())
    }

    fn wire_neighbours(&self, entity: EntityId, channel: WireChannel) -> Vec<EntityId> {
        self.bus
            .neighbours(entity, channel)
            .into_iter()
            .filter(|id| self.entities.contains_key(id))
            .collect()
    }

    fn connect(
        &mut self,
        a: EntityId,
        b: EntityId,
        channel: WireChannel,
    ) -> Result<bool, WorldError> {
        for id in [a, b] {
            if !self.entities.contains_key(&id) {
                return Err(WorldError::InvalidEntity(id));
            }
        }
        self.bus.connect(a, b, channel)
    }

    fn disconnect(
        &mut self,
        a: EntityId,
        b: EntityId,
        channel: WireChannel,
    ) -> Result<bool, WorldError> {
        Ok(self.bus.disconnect(a, b, channel))
    }
}
