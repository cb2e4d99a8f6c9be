//! Enumeration types shared between the controller and the host world.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// The namespace a circuit signal lives in.
///
/// The host resolves item and fluid names through separate registries;
/// virtual signals carry no physical meaning and are used as flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// A signal named after an item prototype.
    Item,
    /// A signal named after a fluid prototype.
    Fluid,
    /// A virtual signal (letters, colours, symbols).
    Virtual,
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// A channel of the circuit bus. Each channel is an independent wire graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireChannel {
    /// The red wire network.
    Red,
    /// The green wire network.
    Green,
}

impl WireChannel {
    /// Every bus channel, in the order topology sync visits them.
    pub const ALL: [Self; 2] = [Self::Red, Self::Green];
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// How a resource behaves as it is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceRegime {
    /// Finite amount that decreases as the device extracts it.
    Depleting,
    /// Fixed yield percentage that never runs out (rate based).
    NonDepleting,
}

/// Scope of a device's resource read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Only the resources under the device's own mining area.
    SingleTarget,
    /// Every resource in the connected field (the whole patch).
    EntireField,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Coarse classification of host entities the controller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A resource-extraction device (drill or pumpjack). The only
    /// monitored kind.
    MiningDrill,
    /// A synthetic signal emitter created by the controller.
    SignalEmitter,
    /// A resource tile entity (ore, oil well).
    Resource,
    /// Anything else (poles, chests, combinators placed by players).
    Other,
}

// ---------------------------------------------------------------------------
// Controller state
// ---------------------------------------------------------------------------

/// Lifecycle state of a monitored device record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    /// No feature enabled; no emitter should exist.
    Dormant,
    /// At least one feature enabled; reconciled every cycle.
    Active,
    /// The backing device is gone; the record awaits removal.
    Stale,
}

/// One of the independently toggled output features of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Emit the device's own item signal with quantity 1.
    Counter,
    /// Emit a flag signal once the device has nothing left to extract.
    DepletionSignal,
    /// Emit the effective amount (or rate) of every resource in the field.
    EffectiveYield,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_kind_serializes_snake_case() {
        let json = serde_json::to_string(&SignalKind::Virtual).unwrap_or_default();
        assert_eq!(json, "\"virtual\"");
    }

    #[test]
    fn wire_channels_are_ordered() {
        assert_eq!(WireChannel::ALL, [WireChannel::Red, WireChannel::Green]);
    }
}
