//! The circuit bus: one undirected wire graph per [`WireChannel`].
//!
//! Edges are stored normalized as `(low, high)` pairs in a `BTreeSet` per
//! channel, so lookups and iteration are deterministic regardless of the
//! order wires were placed in.
//!
//! The graph counts every edge it actually adds or removes through
//! [`BusGraph::connect`] and [`BusGraph::disconnect`]. Callers use the
//! counter to prove that a reconciliation pass made no changes.

use std::collections::{BTreeMap, BTreeSet};

use drillwatch_types::{EntityId, WireChannel};

use crate::error::WorldError;

/// Normalize an undirected edge so `(a, b)` and `(b, a)` compare equal.
fn edge(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Undirected wire graph over both bus channels.
#[derive(Debug, Clone, Default)]
pub struct BusGraph {
    /// Edges per channel.
    edges: BTreeMap<WireChannel, BTreeSet<(EntityId, EntityId)>>,
    /// Number of edges added or removed through connect/disconnect.
    mutations: u64,
}

impl BusGraph {
    /// Create an empty bus.
    pub const fn new() -> Self {
        Self {
            edges: BTreeMap::new(),
            mutations: 0,
        }
    }

    /// Add a wire between `a` and `b`. Returns `false` if it already existed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::SelfConnection`] if `a == b`.
    pub fn connect(
        &mut self,
        a: EntityId,
        b: EntityId,
        channel: WireChannel,
    ) -> Result<bool, WorldError> {
        if a == b {
            return Err(WorldError::SelfConnection { entity: a, channel });
        }
        let added = self.edges.entry(channel).or_default().insert(edge(a, b));
        if added {
            self.mutations = self.mutations.saturating_add(1);
        }
        Ok(added)
    }

    /// Remove the wire between `a` and `b`. Returns `false` if there was none.
    pub fn disconnect(&mut self, a: EntityId, b: EntityId, channel: WireChannel) -> bool {
        let removed = self
            .edges
            .get_mut(&channel)
            .is_some_and(|set| set.remove(&edge(a, b)));
        if removed {
            self.mutations = self.mutations.saturating_add(1);
        }
        removed
    }

    /// Whether `a` and `b` are directly wired on `channel`.
    pub fn are_connected(&self, a: EntityId, b: EntityId, channel: WireChannel) -> bool {
        self.edges
            .get(&channel)
            .is_some_and(|set| set.contains(&edge(a, b)))
    }

    /// Every entity directly wired to `entity` on `channel`, in id order.
    pub fn neighbours(&self, entity: EntityId, channel: WireChannel) -> Vec<EntityId> {
        let Some(set) = self.edges.get(&channel) else {
            return Vec::new();
        };
        let mut out: BTreeSet<EntityId> = BTreeSet::new();
        for &(low, high) in set {
            if low == entity {
                out.insert(high);
            } else if high == entity {
                out.insert(low);
            }
        }
        out.into_iter().collect()
    }

    /// Drop every wire touching `entity` on every channel.
    ///
    /// Used when the host removes an entity. Not counted as a mutation:
    /// the controller did not cause it.
    pub fn remove_entity(&mut self, entity: EntityId) -> usize {
        let mut removed: usize = 0;
        for set in self.edges.values_mut() {
            let before = set.len();
            set.retain(|&(low, high)| low != entity && high != entity);
            removed = removed.saturating_add(before.saturating_sub(set.len()));
        }
        removed
    }

    /// Total edges across all channels.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Number of edges changed by connect/disconnect since creation.
    pub const fn mutation_count(&self) -> u64 {
        self.mutations
    }
}
