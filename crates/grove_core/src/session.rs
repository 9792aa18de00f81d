//! The game session: owns the ecosystem and runs it on the scheduler.
//!
//! A session is created paused. Every scheduled task is dispatched in due
//! order by [`Session::advance_to`]; player actions are applied between
//! advances and are refused while the session is paused or over.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::clock::{Clock, Millis};
use crate::config::{millis, GameConfig};
use crate::error::GameError;
use crate::event::{Effect, Event, Record};
use crate::grid::{Propagation, Purchase, TileGrid};
use crate::kernels;
use crate::rng::Stream;
use crate::schedule::{Scheduler, Task};
use crate::state::ResourceState;
use crate::trackers::{climate, gas, OxygenSpend, Trackers};

/// Final standing reported when the board is lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub score: i64,
    pub days: u32,
}

/// Receives the end-of-game notification.
pub trait GameOverSink {
    fn game_over(&mut self, summary: GameSummary);
}

impl<F: FnMut(GameSummary)> GameOverSink for F {
    fn game_over(&mut self, summary: GameSummary) {
        self(summary)
    }
}

/// Point-in-time view of a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub oxygen: f64,
    pub oxygen_cap: f64,
    pub co2: f64,
    pub co2_cap: f64,
    pub temperature: f64,
    pub days: u32,
    pub score: i64,
    pub sky: f64,
    pub tree_count: u32,
    pub tree_price: u32,
    pub flood_cooldown: bool,
    pub reclaim_cooldown: bool,
}

struct Streams {
    climate: Stream,
    flood: Stream,
    reclaim: Stream,
}

impl Streams {
    fn new(seed: u64, epoch: u64) -> Self {
        Self {
            climate: Stream::from(seed, climate::STAGE, epoch),
            flood: Stream::from(seed, kernels::flood::STAGE, epoch),
            reclaim: Stream::from(seed, kernels::reclaim::STAGE, epoch),
        }
    }
}

pub struct Session {
    config: GameConfig,
    state: ResourceState,
    trackers: Trackers,
    grid: TileGrid,
    scheduler: Scheduler,
    streams: Streams,
    epoch: u64,
    sky: f64,
    ready: Vec<usize>,
    over: bool,
    events: Vec<Record>,
    sink: Option<Box<dyn GameOverSink>>,
}

impl Session {
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let state = ResourceState::new(&config.resources);
        let trackers = Trackers::new(&config.climate, &state)?;
        let grid = TileGrid::from_config(&config)?;
        let streams = Streams::new(config.seed, 0);
        let mut session = Self {
            sky: trackers.co2.percentage(),
            ready: grid.ready_tiles(),
            config,
            state,
            trackers,
            grid,
            scheduler: Scheduler::new(0),
            streams,
            epoch: 0,
            over: false,
            events: Vec::new(),
            sink: None,
        };
        session.register_tasks();
        session.scheduler.pause();
        info!(
            seed = session.config.seed,
            tasks = session.scheduler.len(),
            "session created (paused)"
        );
        Ok(session)
    }

    /// Install the collaborator told about the end of the game.
    pub fn set_game_over_sink(&mut self, sink: impl GameOverSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn with_game_over_sink(mut self, sink: impl GameOverSink + 'static) -> Self {
        self.set_game_over_sink(sink);
        self
    }

    fn register_tasks(&mut self) {
        let timing = &self.config.timing;
        let ripen = millis(timing.tree_ripen);
        self.scheduler
            .schedule_interval(Task::Co2Growth, millis(timing.co2_growth));
        self.scheduler
            .schedule_interval(Task::SkySync, millis(timing.sky_sync));
        self.scheduler
            .schedule_interval(Task::TemperatureDrift, millis(timing.temperature));
        self.scheduler
            .schedule_interval(Task::DayIncrement, millis(timing.day));
        let seeded: Vec<usize> = self.grid.producers().map(|unit| unit.tile()).collect();
        for tile in seeded {
            self.scheduler.schedule_once(Task::TreeReady(tile), ripen);
        }
        self.scheduler
            .schedule_interval(Task::FloodCheck, millis(timing.flood_check));
        self.scheduler
            .schedule_interval(Task::ReclaimCheck, millis(timing.reclaim_check));
        self.scheduler
            .schedule_interval(Task::ProductionRefresh, millis(timing.production_refresh));
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    pub fn trackers(&self) -> &Trackers {
        &self.trackers
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Number of resets so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// CO2 fill ratio as of the last sky sync.
    pub fn sky(&self) -> f64 {
        self.sky
    }

    /// Ready tiles as of the last production refresh or harvest.
    pub fn ready_tiles(&self) -> &[usize] {
        &self.ready
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            oxygen: self.state.oxygen.value,
            oxygen_cap: self.state.oxygen.cap,
            co2: self.state.co2.value,
            co2_cap: self.state.co2.cap,
            temperature: self.trackers.climate.reading(),
            days: self.state.days,
            score: self.state.score,
            sky: self.sky,
            tree_count: self.grid.tree_count(),
            tree_price: self.grid.tree_price(),
            flood_cooldown: self.grid.flood_used(),
            reclaim_cooldown: self.grid.reclaim_used(),
        }
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.events)
    }

    /// Suspend every running timer, tree ripening included.
    pub fn pause(&mut self) {
        if self.over || self.scheduler.is_paused() {
            return;
        }
        self.scheduler.pause();
        self.record(Event::Paused);
        info!(at = self.now(), "session paused");
    }

    /// Resume exactly the timers the pause suspended. A finished game stays
    /// paused.
    pub fn resume(&mut self) {
        if self.over || !self.scheduler.is_paused() {
            return;
        }
        self.scheduler.resume();
        self.record(Event::Resumed);
        info!(at = self.now(), "session resumed");
    }

    /// Start over: fresh state and board, every timer re-registered and
    /// running. Pending cooldowns and ripening timers are dropped.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.state.reset(&self.config.resources);
        self.trackers.sync(&self.state);
        self.grid.reset();
        self.epoch += 1;
        self.streams = Streams::new(self.config.seed, self.epoch);
        self.over = false;
        self.sky = self.trackers.co2.percentage();
        self.ready = self.grid.ready_tiles();
        self.register_tasks();
        self.record(Event::Reset);
        info!(at = self.now(), epoch = self.epoch, "session reset");
        self.check_game_over();
    }

    /// Run every task due up to `now`, in order.
    pub fn advance_to(&mut self, now: Millis) {
        while let Some((_, task)) = self.scheduler.pop_due(now) {
            self.dispatch(task);
        }
        self.scheduler.settle(now);
    }

    pub fn advance_by(&mut self, by: Millis) {
        self.advance_to(self.now().saturating_add(by));
    }

    pub fn pump<C: Clock + ?Sized>(&mut self, clock: &C) {
        self.advance_to(clock.now());
    }

    /// Change the resource state from outside the scheduled tasks, then
    /// bring every tracker back in line.
    pub fn adjust_state(&mut self, adjust: impl FnOnce(&mut ResourceState)) {
        adjust(&mut self.state);
        self.trackers.sync(&self.state);
    }

    pub fn purchase_tree(&mut self, tile: usize) -> Result<Purchase, GameError> {
        self.ensure_playing()?;
        let purchase = self.grid.purchase_tree(
            tile,
            &mut self.state,
            &mut self.trackers.oxygen,
            &mut self.trackers.score,
        )?;
        self.scheduler
            .schedule_once(Task::TreeReady(tile), millis(self.config.timing.tree_ripen));
        self.record(Event::TreePlanted {
            tile,
            price: purchase.price,
        });
        self.check_game_over();
        Ok(purchase)
    }

    /// Harvest a ready tree and restart its ripening timer.
    pub fn collect(&mut self, tile: usize) -> Result<u32, GameError> {
        self.ensure_playing()?;
        let amount = self
            .grid
            .collect(tile, &mut self.state, &mut self.trackers.oxygen)?;
        self.trackers
            .score
            .add(&mut self.state, self.config.economy.collect_score);
        self.scheduler
            .schedule_once(Task::TreeReady(tile), millis(self.config.timing.tree_ripen));
        self.ready = self.grid.ready_tiles();
        self.record(Event::OxygenCollected { tile, amount });
        debug!(tile, amount, "oxygen collected");
        Ok(amount)
    }

    pub fn spend_oxygen(&mut self) -> Result<OxygenSpend, GameError> {
        self.ensure_playing()?;
        let trackers = &mut self.trackers;
        let spend = gas::spend_oxygen(
            &mut self.state,
            &mut trackers.oxygen,
            &mut trackers.co2,
            &mut trackers.score,
        );
        self.record(Event::OxygenSpent {
            oxygen: spend.oxygen,
            co2_removed: spend.co2_removed,
            score: spend.score,
        });
        debug!(oxygen = spend.oxygen, co2_removed = spend.co2_removed, "oxygen spent");
        Ok(spend)
    }

    fn ensure_playing(&self) -> Result<(), GameError> {
        if self.over {
            Err(GameError::GameOver)
        } else if self.scheduler.is_paused() {
            Err(GameError::Paused)
        } else {
            Ok(())
        }
    }

    fn dispatch(&mut self, task: Task) {
        match task {
            Task::Co2Growth => {
                let rate = self.config.climate.co2_growth_rate;
                gas::grow_co2(&mut self.state, &mut self.trackers.co2, rate);
            }
            Task::SkySync => {
                self.trackers.co2.sync(&self.state);
                self.sky = self.trackers.co2.percentage();
            }
            Task::TemperatureDrift => {
                if self
                    .trackers
                    .climate
                    .drift(&mut self.state, &mut self.streams.climate)
                    .is_some()
                {
                    let temperature = self.trackers.climate.reading();
                    self.record(Event::TemperatureChanged { temperature });
                }
            }
            Task::DayIncrement => {
                let day_score = self.config.economy.day_score;
                let trackers = &mut self.trackers;
                trackers
                    .days
                    .tick(&mut self.state, &mut trackers.score, day_score);
                trace!(days = self.state.days, "day advanced");
                self.record(Event::DayAdvanced {
                    days: self.state.days,
                });
            }
            Task::ProductionRefresh => {
                self.ready = self.grid.ready_tiles();
            }
            Task::TreeReady(tile) => {
                if let Some(unit) = self.grid.producer_mut(tile) {
                    unit.ripen();
                    self.record(Event::TreeRipened { tile });
                }
            }
            Task::FloodCheck => self.flood_check(),
            Task::FloodCooldown => {
                self.grid.clear_flood_cooldown();
                self.scheduler.release(Task::FloodCheck);
                self.record(Event::CooldownEnded {
                    effect: Effect::Flood,
                });
                debug!(at = self.now(), "flood cooldown over");
            }
            Task::ReclaimCheck => self.reclaim_check(),
            Task::ReclaimCooldown => {
                self.grid.clear_reclaim_cooldown();
                self.scheduler.release(Task::ReclaimCheck);
                self.record(Event::CooldownEnded {
                    effect: Effect::Reclaim,
                });
                debug!(at = self.now(), "reclaim cooldown over");
            }
        }
    }

    fn flood_check(&mut self) {
        if self.grid.flood_used() || !self.trackers.climate.is_flooding() {
            return;
        }
        let flood = self.grid.flood(
            &mut self.streams.flood,
            &self.config.ecology,
            &mut self.state,
            &mut self.trackers.score,
        );
        if !flood.is_empty() {
            for tile in &flood.felled {
                self.scheduler.cancel(Task::TreeReady(*tile));
            }
            self.ready = self.grid.ready_tiles();
            debug!(
                tiles = ?flood.tiles(),
                felled = flood.felled.len(),
                temperature = self.trackers.climate.reading(),
                "flood spread"
            );
            self.record(Event::Flooded {
                tiles: flood.tiles(),
                felled: flood.felled.clone(),
                score: flood.score,
            });
            self.start_cooldown(Effect::Flood, &flood);
        }
        self.check_game_over();
    }

    fn reclaim_check(&mut self) {
        if self.grid.reclaim_used() || !self.trackers.climate.is_reclaiming() {
            return;
        }
        let reclaim = self.grid.reclaim(
            &mut self.streams.reclaim,
            &self.config.ecology,
            &mut self.state,
            &mut self.trackers.score,
        );
        if !reclaim.is_empty() {
            debug!(
                tiles = ?reclaim.tiles(),
                temperature = self.trackers.climate.reading(),
                "land reclaimed"
            );
            self.record(Event::Reclaimed {
                tiles: reclaim.tiles(),
                score: reclaim.score,
            });
            self.start_cooldown(Effect::Reclaim, &reclaim);
        }
        self.check_game_over();
    }

    fn start_cooldown(&mut self, effect: Effect, pass: &Propagation) {
        let (check, cooldown) = match effect {
            Effect::Flood => (Task::FloodCheck, Task::FloodCooldown),
            Effect::Reclaim => (Task::ReclaimCheck, Task::ReclaimCooldown),
        };
        self.scheduler.hold(check);
        self.scheduler
            .schedule_once(cooldown, millis(self.config.timing.cooldown));
        self.record(Event::CooldownStarted { effect });
        trace!(?effect, changed = pass.diff.len(), "cooldown started");
    }

    fn check_game_over(&mut self) {
        if self.over || !self.grid.is_lost() {
            return;
        }
        self.over = true;
        self.scheduler.pause();
        let summary = GameSummary {
            score: self.state.score,
            days: self.state.days,
        };
        self.record(Event::GameOver {
            score: summary.score,
            days: summary.days,
        });
        info!(score = summary.score, days = summary.days, "game over");
        if let Some(sink) = self.sink.as_mut() {
            sink.game_over(summary);
        }
    }

    fn record(&mut self, event: Event) {
        let at = self.now();
        self.events.push(Record { at, event });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_registers_the_full_task_set_paused() {
        let session = Session::new(GameConfig::default()).unwrap();
        assert!(session.is_paused());
        let tasks: Vec<Task> = session.scheduler().tasks().collect();
        assert_eq!(
            tasks,
            vec![
                Task::Co2Growth,
                Task::SkySync,
                Task::TemperatureDrift,
                Task::DayIncrement,
                Task::ProductionRefresh,
                Task::FloodCheck,
                Task::ReclaimCheck,
                Task::TreeReady(19),
            ]
        );
    }

    #[test]
    fn paused_session_refuses_player_actions() {
        let mut session = Session::new(GameConfig::default()).unwrap();
        assert_eq!(session.spend_oxygen(), Err(GameError::Paused));
        assert_eq!(session.purchase_tree(0), Err(GameError::Paused));
        assert_eq!(session.collect(19), Err(GameError::Paused));
    }

    #[test]
    fn day_tick_pays_score() {
        let mut session = Session::new(GameConfig::default()).unwrap();
        session.resume();
        session.advance_to(2_000);
        assert_eq!(session.state().days, 2);
        assert_eq!(session.state().score, 2);
        assert!(session
            .drain_events()
            .iter()
            .any(|record| record.event == Event::DayAdvanced { days: 2 }));
    }

    #[test]
    fn co2_grows_while_running_only() {
        let mut session = Session::new(GameConfig::default()).unwrap();
        session.advance_to(1_000);
        assert_eq!(session.state().co2.value, 0.0);
        session.resume();
        session.advance_to(1_025);
        assert!(session.state().co2.value > 0.0);
    }
}
