use serde::Serialize;

use crate::state::{GasLevel, ResourceState};
use crate::trackers::ScoreTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gas {
    Oxygen,
    Co2,
}

impl Gas {
    fn level(self, state: &ResourceState) -> &GasLevel {
        match self {
            Gas::Oxygen => &state.oxygen,
            Gas::Co2 => &state.co2,
        }
    }

    fn level_mut(self, state: &mut ResourceState) -> &mut GasLevel {
        match self {
            Gas::Oxygen => &mut state.oxygen,
            Gas::Co2 => &mut state.co2,
        }
    }
}

/// Gauge over one gas of the shared [`ResourceState`].
///
/// The tracker caches the last value, cap and fill percentage it saw; the
/// state stays authoritative and is passed in on every call.
#[derive(Clone, Debug, PartialEq)]
pub struct GasTracker {
    gas: Gas,
    value: f64,
    cap: f64,
    percentage: f64,
}

impl GasTracker {
    pub fn new(gas: Gas, state: &ResourceState) -> Self {
        let mut tracker = Self {
            gas,
            value: 0.0,
            cap: 0.0,
            percentage: 0.0,
        };
        tracker.sync(state);
        tracker
    }

    pub fn gas(&self) -> Gas {
        self.gas
    }

    /// Add to the gas, clamped to its cap.
    pub fn add(&mut self, state: &mut ResourceState, amount: f64) {
        self.gas.level_mut(state).add(amount);
        self.sync(state);
    }

    /// Raise the cap; the value is left alone.
    pub fn add_cap(&mut self, state: &mut ResourceState, amount: f64) {
        self.gas.level_mut(state).raise_cap(amount);
        self.sync(state);
    }

    /// Pull value and cap from the state and recompute the percentage.
    pub fn sync(&mut self, state: &ResourceState) {
        let level = self.gas.level(state);
        self.value = level.value;
        self.cap = level.cap;
        self.percentage = level.percentage();
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Whole-unit value as shown on the gauge.
    pub fn display_value(&self) -> i64 {
        self.value.round_ties_even() as i64
    }
}

/// Amount of CO2 one growth tick adds at the current day and temperature.
pub fn co2_growth(state: &ResourceState, rate: f64) -> f64 {
    (f64::from(state.days) + state.temperature) * rate
}

/// Run one CO2 growth tick, returning how much was actually added.
pub fn grow_co2(state: &mut ResourceState, co2: &mut GasTracker, rate: f64) -> f64 {
    let before = state.co2.value;
    co2.add(state, co2_growth(state, rate));
    state.co2.value - before
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OxygenSpend {
    pub oxygen: f64,
    pub co2_removed: f64,
    pub score: i64,
}

/// Trade every unit of stored oxygen for CO2 removal and score.
///
/// CO2 drops by half the oxygen (never below zero), score rises by half the
/// oxygen rounded half to even, and the oxygen gauge empties.
pub fn spend_oxygen(
    state: &mut ResourceState,
    oxygen: &mut GasTracker,
    co2: &mut GasTracker,
    score: &mut ScoreTracker,
) -> OxygenSpend {
    let spent = state.oxygen.value;
    let half = spent / 2.0;

    let co2_before = state.co2.value;
    state.co2.drain(half);
    let co2_removed = co2_before - state.co2.value;

    let award = half.round_ties_even() as i64;
    score.add(state, award);
    state.oxygen.empty();

    oxygen.sync(state);
    co2.sync(state);
    OxygenSpend {
        oxygen: spent,
        co2_removed,
        score: award,
    }
}
