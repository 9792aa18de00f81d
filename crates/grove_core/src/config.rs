use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};

use crate::clock::Millis;
use crate::grid::{GridShape, Tile};

/// Oxygen-to-CO2 growth coefficient applied per CO2 growth tick.
pub const CO2_GROWTH_RATE: f64 = 0.08 * 0.012435;

/// Starting grid: grass (`G`), the seeded tree (`T`) and the locked shoreline (`L`).
pub const DEFAULT_LAYOUT: [&str; 4] = [
    "GGGGGGGGGGGGLL",
    "GGGGGTGGGGGLLL",
    "GGGGGGGGGGLLLL",
    "GGGGGGGGLLLLLL",
];

/// Complete tuning surface of a game session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for every random stream of the session.
    pub seed: u64,
    pub timing: TimingConfig,
    pub resources: ResourceConfig,
    pub grid: GridConfig,
    pub climate: ClimateConfig,
    pub ecology: EcologyConfig,
    pub economy: EconomyConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            timing: TimingConfig::default(),
            resources: ResourceConfig::default(),
            grid: GridConfig::default(),
            climate: ClimateConfig::default(),
            ecology: EcologyConfig::default(),
            economy: EconomyConfig::default(),
        }
    }
}

/// Periods of the scheduled tasks.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "co2_growth_ms")]
    pub co2_growth: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "sky_sync_ms")]
    pub sky_sync: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "temperature_ms")]
    pub temperature: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "day_ms")]
    pub day: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "production_refresh_ms")]
    pub production_refresh: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "flood_check_ms")]
    pub flood_check: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "reclaim_check_ms")]
    pub reclaim_check: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "cooldown_ms")]
    pub cooldown: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "tree_ripen_ms")]
    pub tree_ripen: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            co2_growth: Duration::from_millis(25),
            sky_sync: Duration::from_millis(30),
            temperature: Duration::from_secs(2),
            day: Duration::from_secs(2),
            production_refresh: Duration::from_secs(1),
            flood_check: Duration::from_secs(2),
            reclaim_check: Duration::from_secs(2),
            cooldown: Duration::from_secs(10),
            tree_ripen: Duration::from_secs(5),
        }
    }
}

impl TimingConfig {
    fn periods(&self) -> [(&'static str, Duration); 9] {
        [
            ("co2_growth_ms", self.co2_growth),
            ("sky_sync_ms", self.sky_sync),
            ("temperature_ms", self.temperature),
            ("day_ms", self.day),
            ("production_refresh_ms", self.production_refresh),
            ("flood_check_ms", self.flood_check),
            ("reclaim_check_ms", self.reclaim_check),
            ("cooldown_ms", self.cooldown),
            ("tree_ripen_ms", self.tree_ripen),
        ]
    }
}

/// Convert a configured period to scheduler milliseconds.
pub fn millis(period: Duration) -> Millis {
    u64::try_from(period.as_millis()).unwrap_or(u64::MAX)
}

/// Starting values of the shared resource state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub oxygen_value: f64,
    pub oxygen_cap: f64,
    pub co2_value: f64,
    pub co2_cap: f64,
    pub temperature: f64,
    pub days: u32,
    pub score: i64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            oxygen_value: 0.0,
            oxygen_cap: 100.0,
            co2_value: 0.0,
            co2_cap: 100.0,
            temperature: 25.0,
            days: 1,
            score: 0,
        }
    }
}

/// Grid shape and starting layout, one string per row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub layout: Vec<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 14,
            layout: DEFAULT_LAYOUT.iter().map(|row| row.to_string()).collect(),
        }
    }
}

impl GridConfig {
    pub fn shape(&self) -> GridShape {
        GridShape::new(self.rows, self.cols)
    }

    /// Parse the layout rows into a row-major tile sequence.
    pub fn tiles(&self) -> Result<Vec<Tile>> {
        ensure!(
            self.layout.len() == self.rows,
            "layout has {} rows, grid declares {}",
            self.layout.len(),
            self.rows
        );
        let mut tiles = Vec::with_capacity(self.rows * self.cols);
        for (row, line) in self.layout.iter().enumerate() {
            let symbols: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            ensure!(
                symbols.len() == self.cols,
                "layout row {} has {} tiles, grid declares {} columns",
                row,
                symbols.len(),
                self.cols
            );
            for (col, symbol) in symbols.into_iter().enumerate() {
                let tile = Tile::from_symbol(symbol).with_context(|| {
                    format!("unknown tile symbol {:?} at row {} column {}", symbol, row, col)
                })?;
                tiles.push(tile);
            }
        }
        Ok(tiles)
    }
}

/// Temperature drift and the climate thresholds that trigger flood or reclaim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// Exclusive lower bound of the drift band.
    pub band_min: f64,
    /// Exclusive upper bound of the drift band.
    pub band_max: f64,
    /// CO2 level at which temperature holds steady.
    pub neutral_co2: f64,
    pub co2_divisor: f64,
    /// Multiplier applied to warming (positive) modifiers.
    pub warming_factor: f64,
    /// Spread between the three drift candidates.
    pub step: f64,
    /// Weights of `[modifier, modifier - step, modifier + step]`.
    pub weights: [u32; 3],
    /// Floods run while the reading is strictly above this.
    pub flood_above: f64,
    /// Reclaims run while the reading is strictly below this.
    pub reclaim_below: f64,
    pub co2_growth_rate: f64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            band_min: 20.0,
            band_max: 60.0,
            neutral_co2: 50.0,
            co2_divisor: 100.0,
            warming_factor: 2.0,
            step: 0.1,
            weights: [50, 25, 25],
            flood_above: 50.0,
            reclaim_below: 32.1,
            co2_growth_rate: CO2_GROWTH_RATE,
        }
    }
}

/// Flood and reclaim propagation odds and their score effects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcologyConfig {
    /// Chance per water-to-neighbour edge of flooding the neighbour.
    pub flood_probability: f64,
    /// Chance per land-to-neighbour edge of draining the neighbour.
    pub reclaim_probability: f64,
    pub flood_score: i64,
    pub reclaim_score: i64,
}

impl Default for EcologyConfig {
    fn default() -> Self {
        Self {
            flood_probability: 0.15,
            reclaim_probability: 0.20,
            flood_score: -5,
            reclaim_score: 15,
        }
    }
}

/// Tree prices, production yields and score awards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Tree price is `tree_count * price_per_tree`.
    pub price_per_tree: u32,
    pub cap_bonus: f64,
    /// Purchases stop raising the oxygen cap once it reaches this.
    pub cap_ceiling: f64,
    pub production_start: u32,
    pub production_ceiling: u32,
    pub purchase_score: i64,
    pub collect_score: i64,
    pub day_score: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            price_per_tree: 3,
            cap_bonus: 5.0,
            cap_ceiling: 200.0,
            production_start: 5,
            production_ceiling: 10,
            purchase_score: 5,
            collect_score: 1,
            day_score: 2,
        }
    }
}

impl GameConfig {
    /// Load a config JSON document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open config file {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Deserialize a config document from an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader).context("invalid config json")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, period) in self.timing.periods() {
            ensure!(millis(period) > 0, "{} must be at least one millisecond", name);
        }

        let resources = &self.resources;
        ensure!(resources.oxygen_cap > 0.0, "oxygen cap must be positive");
        ensure!(resources.co2_cap > 0.0, "co2 cap must be positive");
        ensure!(
            (0.0..=resources.oxygen_cap).contains(&resources.oxygen_value),
            "oxygen value {} outside [0, {}]",
            resources.oxygen_value,
            resources.oxygen_cap
        );
        ensure!(
            (0.0..=resources.co2_cap).contains(&resources.co2_value),
            "co2 value {} outside [0, {}]",
            resources.co2_value,
            resources.co2_cap
        );
        ensure!(resources.days >= 1, "day counter starts at 1 or later");

        ensure!(
            self.grid.rows > 0 && self.grid.cols > 0,
            "grid must have at least one row and one column"
        );
        self.grid.tiles()?;

        let climate = &self.climate;
        ensure!(
            climate.band_min < climate.band_max,
            "temperature band [{}, {}] is inverted",
            climate.band_min,
            climate.band_max
        );
        ensure!(climate.co2_divisor != 0.0, "co2 divisor must be non-zero");
        ensure!(
            climate.weights.iter().any(|&weight| weight > 0),
            "at least one drift weight must be positive"
        );

        for (name, probability) in [
            ("flood_probability", self.ecology.flood_probability),
            ("reclaim_probability", self.ecology.reclaim_probability),
        ] {
            ensure!(
                (0.0..=1.0).contains(&probability),
                "{} {} outside [0, 1]",
                name,
                probability
            );
        }

        let economy = &self.economy;
        ensure!(
            economy.production_start <= economy.production_ceiling,
            "production starts above its ceiling"
        );
        Ok(())
    }
}
