//! Propagation passes over the tile grid.
//!
//! A kernel reads the grid as it stands and returns a [`GridDiff`](crate::diff::GridDiff)
//! of the transitions its trials produced. Trials are per source/neighbour
//! edge and always drawn, hit or miss, so a stream's consumption depends only
//! on the board at the start of the pass.

pub mod flood;
pub mod reclaim;
