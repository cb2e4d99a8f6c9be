//! Simulated extraction for the demo site.
//!
//! Each tick every device rolls against `mining_speed / 60` and, on a hit,
//! takes one unit from a random live tile under it. Seeded, so a run is
//! reproducible from `engine.seed`.

use drillwatch_types::EntityId;
use drillwatch_world::{HostWorld, SimWorld};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::EngineError;

/// Host ticks per second.
const TICKS_PER_SECOND: f64 = 60.0;

/// Seeded extraction driver.
#[derive(Debug)]
pub struct Extractor {
    rng: StdRng,
    mined: u64,
}

impl Extractor {
    /// Create a driver from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            mined: 0,
        }
    }

    /// Total units taken so far.
    pub const fn mined(&self) -> u64 {
        self.mined
    }

    /// Advance extraction by one tick. Returns the units taken this tick.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::World`] if a tile vanished between the area
    /// read and the extraction.
    pub fn step(&mut self, world: &mut SimWorld, devices: &[EntityId]) -> Result<u64, EngineError> {
        let mut taken = 0_u64;
        for &device in devices {
            let Some(prototype) = world.device_prototype(device) else {
                continue;
            };
            let chance = (prototype.mining_speed / TICKS_PER_SECOND).clamp(0.0, 1.0);
            if self.rng.random::<f64>() >= chance {
                continue;
            }
            let tiles = world.area_resources(device);
            if tiles.is_empty() {
                continue;
            }
            let pick = self.rng.random_range(0..tiles.len());
            let Some(&tile) = tiles.get(pick) else {
                continue;
            };
            let units = world.extract(tile, 1)?;
            if units > 0 {
                debug!(device = %device, tile = %tile, "Unit extracted");
            }
            taken = taken.saturating_add(units);
        }
        self.mined = self.mined.saturating_add(taken);
        Ok(taken)
    }
}
