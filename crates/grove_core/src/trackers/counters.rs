use crate::state::ResourceState;

/// Score ledger. Deltas may be negative; the score has no floor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoreTracker {
    shown: i64,
}

impl ScoreTracker {
    pub fn new(state: &ResourceState) -> Self {
        Self { shown: state.score }
    }

    pub fn add(&mut self, state: &mut ResourceState, delta: i64) {
        state.score = state.score.saturating_add(delta);
        self.shown = state.score;
    }

    pub fn sync(&mut self, state: &ResourceState) {
        self.shown = state.score;
    }

    pub fn shown(&self) -> i64 {
        self.shown
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DayTracker {
    shown: u32,
}

impl DayTracker {
    pub fn new(state: &ResourceState) -> Self {
        Self { shown: state.days }
    }

    /// Advance one day and pay the daily score.
    pub fn tick(&mut self, state: &mut ResourceState, score: &mut ScoreTracker, day_score: i64) {
        state.days = state.days.saturating_add(1);
        self.shown = state.days;
        score.add(state, day_score);
    }

    pub fn sync(&mut self, state: &ResourceState) {
        self.shown = state.days;
    }

    pub fn shown(&self) -> u32 {
        self.shown
    }
}
