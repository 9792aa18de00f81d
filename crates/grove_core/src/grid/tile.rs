use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Grass,
    Tree,
    Water,
    /// Original shoreline; never drains.
    LockedWater,
}

impl Tile {
    pub fn is_land(self) -> bool {
        matches!(self, Tile::Grass | Tile::Tree)
    }

    pub fn is_water(self) -> bool {
        matches!(self, Tile::Water | Tile::LockedWater)
    }

    pub fn symbol(self) -> char {
        match self {
            Tile::Grass => 'G',
            Tile::Tree => 'T',
            Tile::Water => 'W',
            Tile::LockedWater => 'L',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'G' => Some(Tile::Grass),
            'T' => Some(Tile::Tree),
            'W' => Some(Tile::Water),
            'L' => Some(Tile::LockedWater),
            _ => None,
        }
    }
}

#[cfg(any(test, feature = "proptest-support"))]
pub fn arb_tile() -> impl proptest::strategy::Strategy<Value = Tile> {
    use proptest::prelude::*;
    prop_oneof![
        Just(Tile::Grass),
        Just(Tile::Tree),
        Just(Tile::Water),
        Just(Tile::LockedWater),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn land_and_water_partition_tiles(tile in arb_tile()) {
            prop_assert!(tile.is_land() != tile.is_water());
            prop_assert_eq!(Tile::from_symbol(tile.symbol()), Some(tile));
        }
    }
}
