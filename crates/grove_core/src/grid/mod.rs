//! The tile board: terrain, planted trees and the flood/reclaim front.

mod layout;
mod tile;

use std::collections::BTreeMap;

use anyhow::{ensure, Result};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

pub use layout::GridShape;
#[cfg(any(test, feature = "proptest-support"))]
pub use tile::arb_tile;
pub use tile::Tile;

use crate::config::{EcologyConfig, EconomyConfig, GameConfig};
use crate::diff::GridDiff;
use crate::error::GameError;
use crate::kernels;
use crate::production::ProductionUnit;
use crate::reduce;
use crate::state::ResourceState;
use crate::trackers::{GasTracker, ScoreTracker};

/// Outcome of a successful tree purchase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Purchase {
    pub tile: usize,
    pub price: u32,
    pub cap_raised: bool,
}

/// Outcome of one flood or reclaim pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Propagation {
    pub diff: GridDiff,
    /// Tiles whose tree (and production unit) was lost.
    pub felled: Vec<usize>,
    pub score: i64,
}

impl Propagation {
    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }

    pub fn tiles(&self) -> Vec<usize> {
        self.diff.tiles()
    }
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    shape: GridShape,
    initial: Vec<Tile>,
    pub(crate) tiles: Vec<Tile>,
    pub(crate) producers: BTreeMap<usize, ProductionUnit>,
    economy: EconomyConfig,
    tree_count: u32,
    flood_used: bool,
    reclaim_used: bool,
}

impl TileGrid {
    /// Build a grid from a row-major tile sequence. Every tree on it gets a
    /// production unit and counts towards the tree price.
    pub fn new(shape: GridShape, tiles: Vec<Tile>, economy: &EconomyConfig) -> Result<Self> {
        ensure!(
            tiles.len() == shape.len(),
            "grid {}x{} needs {} tiles, got {}",
            shape.rows,
            shape.cols,
            shape.len(),
            tiles.len()
        );
        let mut grid = Self {
            shape,
            initial: tiles.clone(),
            tiles,
            producers: BTreeMap::new(),
            economy: economy.clone(),
            tree_count: 0,
            flood_used: false,
            reclaim_used: false,
        };
        grid.seed_producers();
        Ok(grid)
    }

    pub fn from_config(config: &GameConfig) -> Result<Self> {
        Self::new(config.grid.shape(), config.grid.tiles()?, &config.economy)
    }

    fn seed_producers(&mut self) {
        self.producers = self
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == Tile::Tree)
            .map(|(index, _)| (index, ProductionUnit::new(index, &self.economy)))
            .collect();
        self.tree_count = self.producers.len() as u32;
    }

    /// Restore the starting layout, trees and price, and clear both cooldowns.
    pub fn reset(&mut self) {
        self.tiles = self.initial.clone();
        self.flood_used = false;
        self.reclaim_used = false;
        self.seed_producers();
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<Tile> {
        self.tiles.get(index).copied()
    }

    /// One symbol per tile, row-major.
    pub fn symbols(&self) -> String {
        self.tiles.iter().map(|tile| tile.symbol()).collect()
    }

    pub fn producer(&self, tile: usize) -> Option<&ProductionUnit> {
        self.producers.get(&tile)
    }

    pub fn producers(&self) -> impl Iterator<Item = &ProductionUnit> + '_ {
        self.producers.values()
    }

    pub(crate) fn producer_mut(&mut self, tile: usize) -> Option<&mut ProductionUnit> {
        self.producers.get_mut(&tile)
    }

    /// Trees bought or seeded so far. Flooded trees still count.
    pub fn tree_count(&self) -> u32 {
        self.tree_count
    }

    pub fn tree_price(&self) -> u32 {
        self.tree_count.saturating_mul(self.economy.price_per_tree)
    }

    /// Tiles whose tree has oxygen waiting, ascending.
    pub fn ready_tiles(&self) -> Vec<usize> {
        self.producers
            .values()
            .filter(|unit| unit.is_ready())
            .map(|unit| unit.tile())
            .collect()
    }

    pub fn land_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_land()).count()
    }

    /// True once no grass or tree tile remains.
    pub fn is_lost(&self) -> bool {
        !self.tiles.iter().any(|tile| tile.is_land())
    }

    pub fn flood_used(&self) -> bool {
        self.flood_used
    }

    pub fn reclaim_used(&self) -> bool {
        self.reclaim_used
    }

    pub fn clear_flood_cooldown(&mut self) {
        self.flood_used = false;
    }

    pub fn clear_reclaim_cooldown(&mut self) {
        self.reclaim_used = false;
    }

    /// Plant a tree on a grass tile, paying the current price in oxygen.
    ///
    /// Paying exactly the price is enough. On success the tile gets a fresh
    /// production unit (cooling), the oxygen cap grows until it reaches the
    /// configured ceiling, and the next tree becomes more expensive.
    pub fn purchase_tree(
        &mut self,
        tile: usize,
        state: &mut ResourceState,
        oxygen: &mut GasTracker,
        score: &mut ScoreTracker,
    ) -> Result<Purchase, GameError> {
        let found = self.tile(tile).ok_or(GameError::OutOfBounds { tile })?;
        if found != Tile::Grass {
            return Err(GameError::NotGrass { tile, found });
        }
        let price = self.tree_price();
        if state.oxygen.value < f64::from(price) {
            return Err(GameError::Declined {
                price,
                oxygen: state.oxygen.value,
            });
        }

        state.oxygen.drain(f64::from(price));
        oxygen.sync(state);
        self.tiles[tile] = Tile::Tree;
        self.producers
            .insert(tile, ProductionUnit::new(tile, &self.economy));

        let cap_raised = state.oxygen.cap < self.economy.cap_ceiling;
        if cap_raised {
            oxygen.add_cap(state, self.economy.cap_bonus);
        }
        self.tree_count = self.tree_count.saturating_add(1);
        score.add(state, self.economy.purchase_score);

        debug!(tile, price, next_price = self.tree_price(), "tree planted");
        Ok(Purchase {
            tile,
            price,
            cap_raised,
        })
    }

    /// Harvest the tree on `tile`, returning the oxygen it yielded.
    pub fn collect(
        &mut self,
        tile: usize,
        state: &mut ResourceState,
        oxygen: &mut GasTracker,
    ) -> Result<u32, GameError> {
        if tile >= self.tiles.len() {
            return Err(GameError::OutOfBounds { tile });
        }
        let unit = self
            .producer_mut(tile)
            .ok_or(GameError::NoProducer { tile })?;
        unit.collect(state, oxygen)
    }

    /// Run one flood pass from every water tile.
    pub fn flood<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        ecology: &EcologyConfig,
        state: &mut ResourceState,
        score: &mut ScoreTracker,
    ) -> Propagation {
        let diff = kernels::flood::update(self, rng, ecology.flood_probability);
        let propagation = self.commit(diff, ecology.flood_score, state, score);
        if !propagation.is_empty() {
            self.flood_used = true;
        }
        propagation
    }

    /// Run one reclaim pass from every land tile.
    pub fn reclaim<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        ecology: &EcologyConfig,
        state: &mut ResourceState,
        score: &mut ScoreTracker,
    ) -> Propagation {
        let diff = kernels::reclaim::update(self, rng, ecology.reclaim_probability);
        let propagation = self.commit(diff, ecology.reclaim_score, state, score);
        if !propagation.is_empty() {
            self.reclaim_used = true;
        }
        propagation
    }

    fn commit(
        &mut self,
        diff: GridDiff,
        per_tile: i64,
        state: &mut ResourceState,
        score: &mut ScoreTracker,
    ) -> Propagation {
        let applied = reduce::apply(self, &diff);
        let points = per_tile.saturating_mul(applied.changed.len() as i64);
        if points != 0 {
            score.add(state, points);
        }
        let mut committed = GridDiff::default();
        for change in diff.changes() {
            if applied.changed.contains(&change.tile) {
                committed.record(change.tile, change.from, change.to);
            }
        }
        Propagation {
            diff: committed,
            felled: applied.felled,
            score: points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::production::Phase;
    use crate::trackers::Gas;
    use rand::rngs::mock::StepRng;

    struct Fixture {
        grid: TileGrid,
        state: ResourceState,
        oxygen: GasTracker,
        score: ScoreTracker,
    }

    fn fixture(config: &GameConfig) -> Fixture {
        let state = ResourceState::new(&config.resources);
        Fixture {
            grid: TileGrid::from_config(config).unwrap(),
            oxygen: GasTracker::new(Gas::Oxygen, &state),
            score: ScoreTracker::new(&state),
            state,
        }
    }

    fn layout(config: &mut GameConfig, rows: [&str; 4]) {
        config.grid.layout = rows.iter().map(|row| row.to_string()).collect();
    }

    #[test]
    fn default_board_has_one_seeded_tree() {
        let f = fixture(&GameConfig::default());
        assert_eq!(f.grid.tree_count(), 1);
        assert_eq!(f.grid.tree_price(), 3);
        assert_eq!(f.grid.producer(19).map(|unit| unit.phase()), Some(Phase::Cooling));
        assert_eq!(f.grid.land_count(), 56 - 15);
        assert!(!f.grid.is_lost());
    }

    #[test]
    fn purchase_with_exact_oxygen_succeeds() {
        let mut f = fixture(&GameConfig::default());
        f.state.oxygen.value = 3.0;
        let purchase = f
            .grid
            .purchase_tree(0, &mut f.state, &mut f.oxygen, &mut f.score)
            .unwrap();
        assert_eq!(purchase.price, 3);
        assert!(purchase.cap_raised);
        assert_eq!(f.state.oxygen.value, 0.0);
        assert_eq!(f.state.oxygen.cap, 105.0);
        assert_eq!(f.grid.tile(0), Some(Tile::Tree));
        assert_eq!(f.grid.tree_count(), 2);
        assert_eq!(f.grid.tree_price(), 6);
        assert_eq!(f.state.score, 5);
        assert!(f.grid.producer(0).is_some());
    }

    #[test]
    fn purchase_one_short_is_declined_without_side_effects() {
        let mut f = fixture(&GameConfig::default());
        f.state.oxygen.value = 2.0;
        let err = f
            .grid
            .purchase_tree(0, &mut f.state, &mut f.oxygen, &mut f.score)
            .unwrap_err();
        assert!(err.is_decline());
        assert_eq!(f.state.oxygen.value, 2.0);
        assert_eq!(f.grid.tile(0), Some(Tile::Grass));
        assert_eq!(f.grid.tree_count(), 1);
        assert_eq!(f.state.score, 0);
    }

    #[test]
    fn purchase_preconditions() {
        let mut f = fixture(&GameConfig::default());
        f.state.oxygen.value = 100.0;
        assert_eq!(
            f.grid
                .purchase_tree(56, &mut f.state, &mut f.oxygen, &mut f.score),
            Err(GameError::OutOfBounds { tile: 56 })
        );
        assert_eq!(
            f.grid
                .purchase_tree(12, &mut f.state, &mut f.oxygen, &mut f.score),
            Err(GameError::NotGrass {
                tile: 12,
                found: Tile::LockedWater
            })
        );
        assert_eq!(
            f.grid
                .purchase_tree(19, &mut f.state, &mut f.oxygen, &mut f.score),
            Err(GameError::NotGrass {
                tile: 19,
                found: Tile::Tree
            })
        );
        assert_eq!(f.state.oxygen.value, 100.0);
    }

    #[test]
    fn cap_stops_growing_at_ceiling() {
        let mut config = GameConfig::default();
        config.resources.oxygen_cap = 200.0;
        config.resources.oxygen_value = 200.0;
        let mut f = fixture(&config);
        let purchase = f
            .grid
            .purchase_tree(0, &mut f.state, &mut f.oxygen, &mut f.score)
            .unwrap();
        assert!(!purchase.cap_raised);
        assert_eq!(f.state.oxygen.cap, 200.0);
    }

    #[test]
    fn collect_reports_missing_tree() {
        let mut f = fixture(&GameConfig::default());
        assert_eq!(
            f.grid.collect(0, &mut f.state, &mut f.oxygen),
            Err(GameError::NoProducer { tile: 0 })
        );
        assert_eq!(
            f.grid.collect(19, &mut f.state, &mut f.oxygen),
            Err(GameError::NotReady { tile: 19 })
        );
        f.grid.producer_mut(19).unwrap().ripen();
        assert_eq!(f.grid.ready_tiles(), vec![19]);
        assert_eq!(f.grid.collect(19, &mut f.state, &mut f.oxygen), Ok(5));
        assert_eq!(f.state.oxygen.value, 5.0);
        assert!(f.grid.ready_tiles().is_empty());
    }

    #[test]
    fn flood_from_corner_only_reaches_its_neighbours() {
        let mut config = GameConfig::default();
        layout(
            &mut config,
            [
                "GGGGGGGGGGGGGL",
                "GGGGGTGGGGGGGG",
                "GGGGGGGGGGGGGG",
                "GGGGGGGGGGGGGG",
            ],
        );
        let mut f = fixture(&config);
        let mut always = StepRng::new(0, 0);
        let flood = f
            .grid
            .flood(&mut always, &config.ecology, &mut f.state, &mut f.score);
        assert_eq!(flood.tiles(), vec![12, 26, 27]);
        assert_eq!(flood.score, -15);
        assert_eq!(f.state.score, -15);
        assert!(f.grid.flood_used());
        for index in [12, 26, 27] {
            assert_eq!(f.grid.tile(index), Some(Tile::Water));
        }
        assert_eq!(f.grid.land_count(), 56 - 4);
    }

    #[test]
    fn flood_fells_trees_but_keeps_tree_count() {
        let mut config = GameConfig::default();
        layout(
            &mut config,
            [
                "GGGGGGGGGGGGGG",
                "GGGGWTGGGGGGGG",
                "GGGGGGGGGGGGGG",
                "GGGGGGGGGGGGGG",
            ],
        );
        let mut f = fixture(&config);
        let mut always = StepRng::new(0, 0);
        let flood = f
            .grid
            .flood(&mut always, &config.ecology, &mut f.state, &mut f.score);
        assert_eq!(flood.felled, vec![19]);
        assert!(f.grid.producer(19).is_none());
        assert_eq!(f.grid.tree_count(), 1);
    }

    #[test]
    fn dry_board_never_floods() {
        let mut config = GameConfig::default();
        layout(
            &mut config,
            [
                "GGGGGGGGGGGGGG",
                "GGGGGTGGGGGGGG",
                "GGGGGGGGGGGGGG",
                "GGGGGGGGGGGGGG",
            ],
        );
        let mut f = fixture(&config);
        let mut always = StepRng::new(0, 0);
        let flood = f
            .grid
            .flood(&mut always, &config.ecology, &mut f.state, &mut f.score);
        assert!(flood.is_empty());
        assert!(!f.grid.flood_used());
        assert_eq!(f.state.score, 0);
    }

    #[test]
    fn reclaim_drains_water_but_not_the_shoreline() {
        let mut config = GameConfig::default();
        layout(
            &mut config,
            [
                "GGGGGGGGGGGGLL",
                "GGGGGTGGGGGWLL",
                "GGGGGGGGGGLLLL",
                "GGGGGGGGLLLLLL",
            ],
        );
        let mut f = fixture(&config);
        let mut always = StepRng::new(0, 0);
        let reclaim = f
            .grid
            .reclaim(&mut always, &config.ecology, &mut f.state, &mut f.score);
        assert_eq!(reclaim.tiles(), vec![25]);
        assert_eq!(f.grid.tile(25), Some(Tile::Grass));
        assert_eq!(f.state.score, 15);
        assert!(f.grid.reclaim_used());
        assert_eq!(f.grid.tile(12), Some(Tile::LockedWater));
    }

    #[test]
    fn all_water_board_is_lost() {
        let mut config = GameConfig::default();
        layout(
            &mut config,
            [
                "WWWWWWWWWWWWLL",
                "WWWWWWWWWWWLLL",
                "WWWWWWWWWWLLLL",
                "WWWWWWWWLLLLLL",
            ],
        );
        let f = fixture(&config);
        assert!(f.grid.is_lost());
        assert_eq!(f.grid.tree_count(), 0);
    }

    #[test]
    fn reset_restores_layout_and_price() {
        let mut f = fixture(&GameConfig::default());
        f.state.oxygen.value = 50.0;
        f.grid
            .purchase_tree(0, &mut f.state, &mut f.oxygen, &mut f.score)
            .unwrap();
        let mut always = StepRng::new(0, 0);
        f.grid.flood(
            &mut always,
            &EcologyConfig::default(),
            &mut f.state,
            &mut f.score,
        );
        f.grid.reset();
        assert_eq!(f.grid.symbols(), GameConfig::default().grid.layout.concat());
        assert_eq!(f.grid.tree_count(), 1);
        assert_eq!(f.grid.tree_price(), 3);
        assert!(!f.grid.flood_used());
        assert_eq!(f.grid.producers().count(), 1);
    }
}
