//! Per-cell weather labels used for reward shaping.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::GridCell;

/// Weather label for one grid cell.
///
/// Cloudy is the neutral default; the shaping rules treat sunny as a bonus
/// multiplier and snow/rain as flat penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Weather {
    Sunny,
    Cloudy,
    Snow,
    Rain,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weather::Sunny => write!(f, "sunny"),
            Weather::Cloudy => write!(f, "cloudy"),
            Weather::Snow => write!(f, "snow"),
            Weather::Rain => write!(f, "rain"),
        }
    }
}

impl FromStr for Weather {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sunny" => Ok(Weather::Sunny),
            "cloudy" => Ok(Weather::Cloudy),
            "snow" => Ok(Weather::Snow),
            "rain" => Ok(Weather::Rain),
            _ => Err(()),
        }
    }
}

/// Read-only mapping from grid cell to weather label.
///
/// Supplied to the agent at construction and never mutated afterwards.
/// Cells without an entry are treated as cloudy.
#[derive(Debug, Clone, Default)]
pub struct WeatherMap {
    cells: HashMap<GridCell, Weather>,
}

impl WeatherMap {
    /// Creates an empty map (every cell cloudy).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the quadrant layout used by the default world:
    /// left half sunny, right half cloudy, then the top-right quadrant
    /// becomes snow and the bottom-left quadrant becomes rain.
    pub fn quadrants(grid_num: i32) -> Self {
        let mut cells = HashMap::new();
        let half = grid_num / 2;
        for col in 0..half {
            for row in 0..grid_num {
                cells.insert(GridCell::new(col, row), Weather::Sunny);
            }
        }
        for col in half..grid_num {
            for row in 0..grid_num {
                cells.insert(GridCell::new(col, row), Weather::Cloudy);
            }
        }
        for col in half..grid_num {
            for row in 0..half {
                cells.insert(GridCell::new(col, row), Weather::Snow);
            }
        }
        for col in 0..half {
            for row in half..grid_num {
                cells.insert(GridCell::new(col, row), Weather::Rain);
            }
        }
        Self { cells }
    }

    /// Sets the weather for one cell.
    pub fn insert(&mut self, cell: GridCell, weather: Weather) {
        self.cells.insert(cell, weather);
    }

    /// Returns the weather at a cell, defaulting to cloudy.
    pub fn get(&self, cell: GridCell) -> Weather {
        self.cells.get(&cell).copied().unwrap_or(Weather::Cloudy)
    }

    /// Number of cells with an explicit label.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if no cell has an explicit label.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
