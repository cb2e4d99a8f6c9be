//! Value structs exchanged between the controller and the host world.

use serde::{Deserialize, Serialize};

use crate::enums::{Feature, ResourceRegime, SignalKind};
use crate::ids::{EntityId, ForceId};

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// Identifies one circuit-bus signal channel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SignalId {
    /// Registry the name belongs to.
    pub kind: SignalKind,
    /// Prototype name, e.g. `iron-ore` or `signal-R`.
    pub name: String,
}

impl SignalId {
    /// An item signal.
    pub fn item(name: impl Into<String>) -> Self {
        Self {
            kind: SignalKind::Item,
            name: name.into(),
        }
    }

    /// A fluid signal.
    pub fn fluid(name: impl Into<String>) -> Self {
        Self {
            kind: SignalKind::Fluid,
            name: name.into(),
        }
    }

    /// A virtual signal.
    pub fn virtual_signal(name: impl Into<String>) -> Self {
        Self {
            kind: SignalKind::Virtual,
            name: name.into(),
        }
    }
}

/// A signal written into one slot of an emitter's output section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputSignal {
    /// The channel the value is published on.
    pub signal: SignalId,
    /// Published value, always within `0..=i32::MAX`.
    pub quantity: i32,
    /// 1-based slot position inside the output section.
    pub slot_index: u32,
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// A point on the host's map, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// Where an entity sits and who owns it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Map position.
    pub position: Position,
    /// Owning force.
    pub force: ForceId,
}

// ---------------------------------------------------------------------------
// Devices and resources
// ---------------------------------------------------------------------------

/// Static properties of a mining device prototype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePrototype {
    /// Prototype name; doubles as the counter signal's item name.
    pub name: String,
    /// Mining speed (units of mining time processed per second).
    pub mining_speed: f64,
    /// Percentage of the normal drain this device removes from a depleting
    /// resource per unit mined. `None` means the normal 100%.
    pub drain_rate_percent: Option<f64>,
}

/// One resource entity reachable by a device's read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// The resource entity.
    pub entity: EntityId,
    /// Resource (and product channel) name.
    pub name: String,
    /// Whether the amount depletes or is a fixed yield.
    pub regime: ResourceRegime,
    /// Remaining units for depleting resources; yield percentage (0-100)
    /// for non-depleting ones.
    pub amount: u64,
    /// Seconds of mining time required per extracted unit.
    pub mining_time: f64,
}

// ---------------------------------------------------------------------------
// Emitters
// ---------------------------------------------------------------------------

/// Interaction flags applied to a freshly created emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmitterFlags {
    /// Whether players can pick the entity up.
    pub minable: bool,
    /// Whether the entity can take damage.
    pub destructible: bool,
    /// Whether players can open its panel.
    pub operable: bool,
    /// Whether players can rotate it.
    pub rotatable: bool,
    /// Whether it occupies a collision footprint.
    pub collides: bool,
}

impl EmitterFlags {
    /// Flags for a hidden, untouchable emitter.
    pub const HIDDEN: Self = Self {
        minable: false,
        destructible: false,
        operable: false,
        rotatable: false,
        collides: false,
    };
}

/// Everything the host needs to instantiate an emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterSpec {
    /// Prototype name of the emitter entity.
    pub name: String,
    /// Position and owner, copied from the monitored device.
    pub placement: Placement,
    /// Interaction flags.
    pub flags: EmitterFlags,
}

// ---------------------------------------------------------------------------
// Device settings
// ---------------------------------------------------------------------------

/// The user-facing configuration of one monitored device.
///
/// This is the bundle carried by blueprints and copy/paste, and the shape
/// in which records are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Emit the device's own item signal.
    #[serde(default)]
    pub counter_enabled: bool,
    /// Emit a flag signal when the device runs dry.
    #[serde(default)]
    pub depletion_signal_enabled: bool,
    /// Signal to emit instead of the global depletion default.
    #[serde(default)]
    pub depletion_signal_override: Option<SignalId>,
    /// Emit the effective field amounts or rates.
    #[serde(default)]
    pub effective_yield_enabled: bool,
}

impl DeviceSettings {
    /// Whether any output feature is switched on.
    pub const fn any_enabled(&self) -> bool {
        self.counter_enabled || self.depletion_signal_enabled || self.effective_yield_enabled
    }

    /// Whether a single feature is switched on.
    pub const fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Counter => self.counter_enabled,
            Feature::DepletionSignal => self.depletion_signal_enabled,
            Feature::EffectiveYield => self.effective_yield_enabled,
        }
    }

    /// Switch a single feature on or off.
    pub const fn set_enabled(&mut self, feature: Feature, enabled: bool) {
        match feature {
            Feature::Counter => self.counter_enabled = enabled,
            Feature::DepletionSignal => self.depletion_signal_enabled = enabled,
            Feature::EffectiveYield => self.effective_yield_enabled = enabled,
        }
    }
}
