//! Gauges over the shared [`ResourceState`](crate::state::ResourceState).

pub mod climate;
pub mod counters;
pub mod gas;

use anyhow::Result;

pub use climate::ClimateTracker;
pub use counters::{DayTracker, ScoreTracker};
pub use gas::{Gas, GasTracker, OxygenSpend};

use crate::config::ClimateConfig;
use crate::state::ResourceState;

/// Every tracker a session keeps, in one place so they resync together.
#[derive(Clone, Debug)]
pub struct Trackers {
    pub oxygen: GasTracker,
    pub co2: GasTracker,
    pub climate: ClimateTracker,
    pub score: ScoreTracker,
    pub days: DayTracker,
}

impl Trackers {
    pub fn new(climate: &ClimateConfig, state: &ResourceState) -> Result<Self> {
        Ok(Self {
            oxygen: GasTracker::new(Gas::Oxygen, state),
            co2: GasTracker::new(Gas::Co2, state),
            climate: ClimateTracker::new(climate, state)?,
            score: ScoreTracker::new(state),
            days: DayTracker::new(state),
        })
    }

    pub fn sync(&mut self, state: &ResourceState) {
        self.oxygen.sync(state);
        self.co2.sync(state);
        self.climate.sync(state);
        self.score.sync(state);
        self.days.sync(state);
    }
}
