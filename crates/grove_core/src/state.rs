use serde::{Deserialize, Serialize};

use crate::bounded::{level_ratio, saturating_add, saturating_sub};
use crate::config::ResourceConfig;

/// A gas reservoir that never leaves `[0, cap]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasLevel {
    pub value: f64,
    pub cap: f64,
}

impl GasLevel {
    pub fn new(value: f64, cap: f64) -> Self {
        let cap = cap.max(0.0);
        Self {
            value: value.clamp(0.0, cap),
            cap,
        }
    }

    pub fn add(&mut self, amount: f64) {
        self.value = saturating_add(self.value, amount, self.cap);
    }

    pub fn drain(&mut self, amount: f64) {
        self.value = saturating_sub(self.value, amount, self.cap);
    }

    pub fn raise_cap(&mut self, amount: f64) {
        self.cap = (self.cap + amount).max(0.0);
        self.value = self.value.min(self.cap);
    }

    pub fn empty(&mut self) {
        self.value = 0.0;
    }

    pub fn percentage(&self) -> f64 {
        level_ratio(self.value, self.cap)
    }
}

/// Shared ecosystem state of one game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub oxygen: GasLevel,
    pub co2: GasLevel,
    pub temperature: f64,
    pub days: u32,
    pub score: i64,
}

impl ResourceState {
    pub fn new(config: &ResourceConfig) -> Self {
        Self {
            oxygen: GasLevel::new(config.oxygen_value, config.oxygen_cap),
            co2: GasLevel::new(config.co2_value, config.co2_cap),
            temperature: config.temperature,
            days: config.days.max(1),
            score: config.score,
        }
    }

    /// Return every field to its configured starting value.
    pub fn reset(&mut self, config: &ResourceConfig) {
        *self = Self::new(config);
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::new(&ResourceConfig::default())
    }
}
