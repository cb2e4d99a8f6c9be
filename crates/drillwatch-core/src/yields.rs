//! Effective yield of a resource channel.
//!
//! Two regimes, two formulas:
//!
//! - **Depleting**: what the device will actually get out of the remaining
//!   amount, `floor(sum * (1 + productivity) / drain)`. A device that drains
//!   less than 100% per unit mined stretches the field further.
//! - **Non-depleting**: a per-minute production rate,
//!   `floor((speed / mine_time) * mean(amount / 100) * (1 + productivity) * 60)`,
//!   where `amount` is the tile's yield percentage.
//!
//! Which regime applies is decided for the whole patch by the caller (see
//! [`patch_has_depleting`]); this module only evaluates one channel at a
//! time.

use std::collections::BTreeMap;

use drillwatch_types::{DevicePrototype, ResourceHandle, ResourceRegime};

/// Non-depleting amounts are yield percentages.
const PERCENT: f64 = 100.0;

/// Rates are reported per minute; mining speeds are per second.
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Device and force modifiers that scale a channel's yield.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldModifiers {
    /// Mining productivity bonus of the owning force.
    pub productivity_bonus: f64,
    /// Mining speed of the device.
    pub mining_speed: f64,
    /// Drain percentage declared by the device, if any.
    pub drain_rate_percent: Option<f64>,
}

impl YieldModifiers {
    /// Collect modifiers from a device prototype and its force's bonus.
    pub fn new(prototype: &DevicePrototype, productivity_bonus: f64) -> Self {
        Self {
            productivity_bonus,
            mining_speed: prototype.mining_speed,
            drain_rate_percent: prototype.drain_rate_percent,
        }
    }

    /// Fraction of a unit drained from the field per unit mined.
    ///
    /// Defaults to 1.0; a non-positive or non-finite declaration is ignored.
    pub fn drain_modifier(&self) -> f64 {
        match self.drain_rate_percent {
            Some(percent) if percent.is_finite() && percent > 0.0 => percent / PERCENT,
            _ => 1.0,
        }
    }

    fn productivity_multiplier(&self) -> f64 {
        1.0 + self.productivity_bonus
    }
}

/// The computed output of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveYield {
    /// Quantity already floored and clamped to `0..=i32::MAX`.
    pub quantity: i32,
    /// Whether the quantity is a per-minute rate.
    pub is_rate: bool,
}

/// Resource instances of one channel, split by regime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelGroup {
    /// Depleting tiles.
    pub depleting: Vec<ResourceHandle>,
    /// Non-depleting tiles.
    pub non_depleting: Vec<ResourceHandle>,
}

/// Group a patch read by channel name.
///
/// The `BTreeMap` makes iteration order depend only on the names, never on
/// the order the host returned the tiles in.
pub fn group_by_channel(handles: Vec<ResourceHandle>) -> BTreeMap<String, ChannelGroup> {
    let mut groups: BTreeMap<String, ChannelGroup> = BTreeMap::new();
    for handle in handles {
        let group = groups.entry(handle.name.clone()).or_default();
        match handle.regime {
            ResourceRegime::Depleting => group.depleting.push(handle),
            ResourceRegime::NonDepleting => group.non_depleting.push(handle),
        }
    }
    groups
}

/// Whether any channel of the patch holds a depleting tile.
pub fn patch_has_depleting(groups: &BTreeMap<String, ChannelGroup>) -> bool {
    groups.values().any(|group| !group.depleting.is_empty())
}

/// Evaluate one channel in the given regime.
///
/// Returns `None` when the channel has no instances of that regime (it then
/// contributes nothing, not a zero).
pub fn effective_yield(
    group: &ChannelGroup,
    regime: ResourceRegime,
    modifiers: &YieldModifiers,
) -> Option<EffectiveYield> {
    match regime {
        ResourceRegime::Depleting => {
            depleting_amount(&group.depleting, modifiers).map(|raw| EffectiveYield {
                quantity: clamp_quantity(raw),
                is_rate: false,
            })
        }
        ResourceRegime::NonDepleting => {
            production_rate(&group.non_depleting, modifiers).map(|raw| EffectiveYield {
                quantity: clamp_quantity(raw),
                is_rate: true,
            })
        }
    }
}

/// Raw effective amount of depleting tiles.
#[allow(clippy::cast_precision_loss)]
pub fn depleting_amount(tiles: &[ResourceHandle], modifiers: &YieldModifiers) -> Option<f64> {
    if tiles.is_empty() {
        return None;
    }
    let total = tiles
        .iter()
        .fold(0_u64, |acc, tile| acc.saturating_add(tile.amount));
    Some(total as f64 * modifiers.productivity_multiplier() / modifiers.drain_modifier())
}

/// Raw per-minute production rate of non-depleting tiles.
#[allow(clippy::cast_precision_loss)]
pub fn production_rate(tiles: &[ResourceHandle], modifiers: &YieldModifiers) -> Option<f64> {
    let first = tiles.first()?;
    let mine_time = first.mining_time;
    if !mine_time.is_finite() || mine_time <= 0.0 {
        return None;
    }
    let fraction_sum: f64 = tiles.iter().map(|tile| tile.amount as f64 / PERCENT).sum();
    let average_fraction = fraction_sum / tiles.len() as f64;
    Some(
        (modifiers.mining_speed / mine_time)
            * average_fraction
            * modifiers.productivity_multiplier()
            * SECONDS_PER_MINUTE,
    )
}

/// Floor a raw quantity into the bus's signed 32-bit range.
///
/// Negative and NaN inputs become 0; anything at or above `i32::MAX`
/// saturates.
#[allow(clippy::cast_possible_truncation)]
pub fn clamp_quantity(raw: f64) -> i32 {
    if raw.is_nan() || raw <= 0.0 {
        return 0;
    }
    let floored = raw.floor();
    if floored >= f64::from(i32::MAX) {
        return i32::MAX;
    }
    floored as i32
}
