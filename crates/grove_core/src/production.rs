use serde::Serialize;

use crate::config::EconomyConfig;
use crate::error::GameError;
use crate::state::ResourceState;
use crate::trackers::GasTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Cooling,
    Ready,
}

/// Oxygen production of one planted tree.
///
/// A unit alternates between cooling and ready. The session owns the ripening
/// timer; the unit only records the phase and the yield of its next harvest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductionUnit {
    tile: usize,
    amount: u32,
    ceiling: u32,
    phase: Phase,
}

impl ProductionUnit {
    pub fn new(tile: usize, economy: &EconomyConfig) -> Self {
        Self {
            tile,
            amount: economy.production_start,
            ceiling: economy.production_ceiling,
            phase: Phase::Cooling,
        }
    }

    pub fn tile(&self) -> usize {
        self.tile
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn ripen(&mut self) {
        self.phase = Phase::Ready;
    }

    /// Harvest the ready oxygen. Each harvest yields one more unit than the
    /// last, up to the ceiling.
    pub fn collect(
        &mut self,
        state: &mut ResourceState,
        oxygen: &mut GasTracker,
    ) -> Result<u32, GameError> {
        if !self.is_ready() {
            return Err(GameError::NotReady { tile: self.tile });
        }
        let harvested = self.amount;
        oxygen.add(state, f64::from(harvested));
        if self.amount < self.ceiling {
            self.amount += 1;
        }
        self.phase = Phase::Cooling;
        Ok(harvested)
    }
}
