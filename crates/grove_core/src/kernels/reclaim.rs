use rand::Rng;

use crate::diff::GridDiff;
use crate::grid::{Tile, TileGrid};

pub const STAGE: &str = "kernel:reclaim";

/// Drain flooded tiles bordering land back to grass.
///
/// Sources are the grass and tree tiles at the start of the pass. Only
/// `Water` neighbours can be drained; the locked shoreline stays.
pub fn update<R: Rng + ?Sized>(grid: &TileGrid, rng: &mut R, probability: f64) -> GridDiff {
    let mut diff = GridDiff::default();
    let shape = grid.shape();
    let tiles = grid.tiles();
    for (source, tile) in tiles.iter().enumerate() {
        if !tile.is_land() {
            continue;
        }
        for neighbor in shape.neighbors(source) {
            let hit = rng.gen_bool(probability);
            if hit && tiles[neighbor] == Tile::Water {
                diff.record(neighbor, Tile::Water, Tile::Grass);
            }
        }
    }
    diff
}
