use serde::Serialize;

use crate::grid::Tile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TileChange {
    pub tile: usize,
    pub from: Tile,
    pub to: Tile,
}

/// Tile transitions produced by one propagation pass, kept sorted by tile.
///
/// A pass reads the grid as it was when the pass started and records what
/// should change; [`crate::reduce::apply`] commits the result afterwards.
/// A tile changes at most once per diff: the first recorded transition wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GridDiff {
    changes: Vec<TileChange>,
}

impl GridDiff {
    /// Record a transition. Returns `false` if the tile already changes in
    /// this diff.
    pub fn record(&mut self, tile: usize, from: Tile, to: Tile) -> bool {
        match self.changes.binary_search_by_key(&tile, |change| change.tile) {
            Ok(_) => false,
            Err(position) => {
                self.changes.insert(position, TileChange { tile, from, to });
                true
            }
        }
    }

    pub fn changes(&self) -> &[TileChange] {
        &self.changes
    }

    pub fn tiles(&self) -> Vec<usize> {
        self.changes.iter().map(|change| change.tile).collect()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
