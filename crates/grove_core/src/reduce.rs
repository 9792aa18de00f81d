use crate::diff::GridDiff;
use crate::grid::{Tile, TileGrid};

/// What a diff actually changed once committed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Applied {
    pub changed: Vec<usize>,
    pub felled: Vec<usize>,
}

/// Commit a diff to the grid.
///
/// Changes whose `from` no longer matches the tile are stale and skipped, and
/// locked water never moves. A tree that is overwritten loses its production
/// unit; the tree count is left alone.
pub fn apply(grid: &mut TileGrid, diff: &GridDiff) -> Applied {
    let mut applied = Applied::default();
    for change in diff.changes() {
        let Some(current) = grid.tiles.get(change.tile).copied() else {
            continue;
        };
        if current != change.from || current == Tile::LockedWater || current == change.to {
            continue;
        }
        grid.tiles[change.tile] = change.to;
        if current == Tile::Tree && grid.producers.remove(&change.tile).is_some() {
            applied.felled.push(change.tile);
        }
        applied.changed.push(change.tile);
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn stale_and_locked_changes_are_skipped() {
        let mut grid = TileGrid::from_config(&GameConfig::default()).unwrap();
        let mut diff = GridDiff::default();
        diff.record(0, Tile::Water, Tile::Grass);
        diff.record(1, Tile::Grass, Tile::Water);
        diff.record(12, Tile::LockedWater, Tile::Grass);
        diff.record(19, Tile::Tree, Tile::Water);

        let applied = apply(&mut grid, &diff);
        assert_eq!(applied.changed, vec![1, 19]);
        assert_eq!(applied.felled, vec![19]);
        assert_eq!(grid.tile(0), Some(Tile::Grass));
        assert_eq!(grid.tile(12), Some(Tile::LockedWater));
        assert!(grid.producer(19).is_none());
        assert_eq!(grid.tree_count(), 1);
    }
}
