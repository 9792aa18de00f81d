use serde::Serialize;

use crate::clock::Millis;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Flood,
    Reclaim,
}

/// Something the player would notice happen during a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    TemperatureChanged {
        temperature: f64,
    },
    DayAdvanced {
        days: u32,
    },
    TreeRipened {
        tile: usize,
    },
    TreePlanted {
        tile: usize,
        price: u32,
    },
    OxygenCollected {
        tile: usize,
        amount: u32,
    },
    OxygenSpent {
        oxygen: f64,
        co2_removed: f64,
        score: i64,
    },
    Flooded {
        tiles: Vec<usize>,
        felled: Vec<usize>,
        score: i64,
    },
    Reclaimed {
        tiles: Vec<usize>,
        score: i64,
    },
    CooldownStarted {
        effect: Effect,
    },
    CooldownEnded {
        effect: Effect,
    },
    Paused,
    Resumed,
    Reset,
    GameOver {
        score: i64,
        days: u32,
    },
}

/// An [`Event`] stamped with the session time it happened at.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    pub at: Millis,
    #[serde(flatten)]
    pub event: Event,
}
