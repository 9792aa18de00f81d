use thiserror::Error;

use crate::grid::Tile;

/// Why a player action was refused.
///
/// [`GameError::Declined`] is the only business-rule outcome: the request was
/// valid but unaffordable. Every other variant is a precondition the caller
/// should have checked.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GameError {
    #[error("not enough oxygen: a tree costs {price}, only {oxygen:.0} available")]
    Declined { price: u32, oxygen: f64 },
    #[error("tile {tile} is {found:?}, trees can only be planted on grass")]
    NotGrass { tile: usize, found: Tile },
    #[error("tile {tile} is outside the grid")]
    OutOfBounds { tile: usize },
    #[error("the tree on tile {tile} has no oxygen ready")]
    NotReady { tile: usize },
    #[error("no tree grows on tile {tile}")]
    NoProducer { tile: usize },
    #[error("the session is paused")]
    Paused,
    #[error("the game is over")]
    GameOver,
}

impl GameError {
    pub fn is_decline(&self) -> bool {
        matches!(self, GameError::Declined { .. })
    }
}
