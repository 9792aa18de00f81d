//! Temperature drift driven by atmospheric CO2.
//!
//! Every drift tick derives a modifier from how far CO2 sits from its neutral
//! level (warming counts double), then picks one of three candidates around
//! it with fixed weights. A step is applied only if it keeps the temperature
//! strictly inside the configured band; otherwise the temperature holds.

use anyhow::{Context, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::bounded::round_tenths;
use crate::config::ClimateConfig;
use crate::state::ResourceState;

pub const STAGE: &str = "kernel:climate";

#[derive(Clone, Debug)]
pub struct ClimateTracker {
    config: ClimateConfig,
    weights: WeightedIndex<u32>,
    reading: f64,
}

impl ClimateTracker {
    pub fn new(config: &ClimateConfig, state: &ResourceState) -> Result<Self> {
        let weights =
            WeightedIndex::new(config.weights).context("invalid temperature drift weights")?;
        Ok(Self {
            config: config.clone(),
            weights,
            reading: round_tenths(state.temperature),
        })
    }

    /// Signed temperature change CO2 pushes for before randomisation.
    pub fn modifier(&self, state: &ResourceState) -> f64 {
        let modifier = (state.co2.value - self.config.neutral_co2) / self.config.co2_divisor;
        if modifier > 0.0 {
            modifier * self.config.warming_factor
        } else {
            modifier
        }
    }

    /// Run one drift tick. Returns the new temperature, or `None` when the
    /// chosen step would leave the band.
    pub fn drift<R: Rng + ?Sized>(
        &mut self,
        state: &mut ResourceState,
        rng: &mut R,
    ) -> Option<f64> {
        let modifier = self.modifier(state);
        let step = self.config.step;
        let candidates = [modifier, modifier - step, modifier + step];
        let delta = candidates[self.weights.sample(rng)];

        let next = state.temperature + delta;
        if next > self.config.band_min && next < self.config.band_max {
            state.temperature = next;
            self.reading = round_tenths(next);
            Some(next)
        } else {
            None
        }
    }

    /// Temperature rounded to one decimal, as displayed to the player.
    pub fn reading(&self) -> f64 {
        self.reading
    }

    pub fn sync(&mut self, state: &ResourceState) {
        self.reading = round_tenths(state.temperature);
    }

    pub fn is_flooding(&self) -> bool {
        self.reading > self.config.flood_above
    }

    pub fn is_reclaiming(&self) -> bool {
        self.reading < self.config.reclaim_below
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Stream;
    use proptest::prelude::*;

    fn tracker(state: &ResourceState) -> ClimateTracker {
        ClimateTracker::new(&ClimateConfig::default(), state).unwrap()
    }

    #[test]
    fn saturated_co2_warms_by_about_one_degree() {
        let mut state = ResourceState::default();
        state.co2.value = 100.0;
        let mut climate = tracker(&state);
        let mut rng = Stream::from(3, STAGE, 0);
        for _ in 0..20 {
            let before = state.temperature;
            let after = climate.drift(&mut state, &mut rng).unwrap();
            let delta = after - before;
            assert!((0.9 - 1e-9..=1.1 + 1e-9).contains(&delta), "delta {}", delta);
        }
    }

    #[test]
    fn clean_air_cools() {
        let mut state = ResourceState::default();
        let mut climate = tracker(&state);
        let mut rng = Stream::from(4, STAGE, 0);
        let before = state.temperature;
        let after = climate.drift(&mut state, &mut rng).unwrap();
        assert!(after < before);
        assert!((before - after) >= 0.4 - 1e-9 && (before - after) <= 0.6 + 1e-9);
    }

    #[test]
    fn steps_out_of_band_are_refused() {
        let mut state = ResourceState::default();
        state.co2.value = 100.0;
        state.temperature = 59.5;
        let mut climate = tracker(&state);
        let mut rng = Stream::from(5, STAGE, 0);
        assert_eq!(climate.drift(&mut state, &mut rng), None);
        assert_eq!(state.temperature, 59.5);

        state.co2.value = 0.0;
        state.temperature = 20.3;
        assert_eq!(climate.drift(&mut state, &mut rng), None);
        assert_eq!(state.temperature, 20.3);
    }

    #[test]
    fn reading_rounds_to_tenths() {
        let mut state = ResourceState::default();
        state.temperature = 50.04;
        let mut climate = tracker(&state);
        assert_eq!(climate.reading(), 50.0);
        assert!(!climate.is_flooding());
        state.temperature = 50.06;
        climate.sync(&state);
        assert_eq!(climate.reading(), 50.1);
        assert!(climate.is_flooding());
        state.temperature = 32.04;
        climate.sync(&state);
        assert!(climate.is_reclaiming());
    }

    #[test]
    fn reclaim_needs_a_reading_below_32_1() {
        let mut state = ResourceState::default();
        state.temperature = 32.1;
        let mut climate = tracker(&state);
        assert_eq!(climate.reading(), 32.1);
        assert!(!climate.is_reclaiming());

        state.temperature = 32.06;
        climate.sync(&state);
        assert_eq!(climate.reading(), 32.1);
        assert!(!climate.is_reclaiming());

        state.temperature = 32.0;
        climate.sync(&state);
        assert_eq!(climate.reading(), 32.0);
        assert!(climate.is_reclaiming());
        assert!(!climate.is_flooding());
    }

    proptest! {
        #[test]
        fn temperature_stays_inside_band(
            seed in any::<u64>(),
            co2 in 0.0f64..=100.0,
            start in 20.5f64..59.5,
        ) {
            let mut state = ResourceState::default();
            state.co2.value = co2;
            state.temperature = start;
            let mut climate = tracker(&state);
            let mut rng = Stream::from(seed, STAGE, 0);
            for _ in 0..50 {
                climate.drift(&mut state, &mut rng);
                prop_assert!(state.temperature > 20.0 && state.temperature < 60.0);
            }
        }
    }
}
