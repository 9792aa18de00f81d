use rand::Rng;

use crate::diff::GridDiff;
use crate::grid::{Tile, TileGrid};

pub const STAGE: &str = "kernel:flood";

/// Spread water from every tile that is water at the start of the pass.
///
/// Each source gives each neighbour an independent trial; a hit on grass or
/// a tree turns it into water. Water created by this pass does not spread
/// until the next one.
pub fn update<R: Rng + ?Sized>(grid: &TileGrid, rng: &mut R, probability: f64) -> GridDiff {
    let mut diff = GridDiff::default();
    let shape = grid.shape();
    let tiles = grid.tiles();
    for (source, tile) in tiles.iter().enumerate() {
        if !tile.is_water() {
            continue;
        }
        for neighbor in shape.neighbors(source) {
            let hit = rng.gen_bool(probability);
            let target = tiles[neighbor];
            if hit && target.is_land() {
                diff.record(neighbor, target, Tile::Water);
            }
        }
    }
    diff
}
