//! Grid-world environment: the collaborator that executes actions.
//!
//! A `grid_num × grid_num` world with a start cell, a goal cell, static
//! obstacle cells ("buildings") and moving hazard cells ("birds"). Hazards
//! wander one cell in a random direction per step, reversing at the
//! boundary. Observations are object-sized bounding boxes centered in the
//! agent's current cell; reaching the goal yields the terminal sentinel.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

use crate::config::WorldConfig;
use crate::state::{GridCell, Observation};
use crate::weather::WeatherMap;

/// One of the four discrete movement actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in index order.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Maps an action index to an action, if in range.
    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }

    /// The (column, row) displacement of this action.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }
}

/// The grid-world environment.
///
/// Treated as a read-only oracle by the agent: one [`GridWorld::step`] per
/// decision cycle plus snapshot queries for hazard positions and weather.
#[derive(Debug)]
pub struct GridWorld {
    config: WorldConfig,
    weather: WeatherMap,
    buildings: HashSet<GridCell>,
    hazards: Vec<GridCell>,
    agent: GridCell,
    rng: StdRng,
}

impl GridWorld {
    /// Creates a world with the quadrant weather layout and randomly placed
    /// buildings avoiding the start, goal, and initial hazard cells.
    pub fn new(config: WorldConfig, seed: u64) -> Self {
        let weather = WeatherMap::quadrants(config.grid.grid_num);
        Self::with_weather(config, weather, seed)
    }

    /// Creates a world with an explicit weather map.
    pub fn with_weather(config: WorldConfig, weather: WeatherMap, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let forbidden: HashSet<GridCell> = config
            .hazards
            .iter()
            .copied()
            .chain([config.start, config.goal])
            .collect();
        let mut available: Vec<GridCell> = (0..config.grid.grid_num)
            .flat_map(|col| (0..config.grid.grid_num).map(move |row| GridCell::new(col, row)))
            .filter(|c| !forbidden.contains(c))
            .collect();
        available.shuffle(&mut rng);
        available.truncate(config.num_buildings);
        let buildings = available.into_iter().collect();

        let hazards = config.hazards.clone();
        let agent = config.start;
        Self {
            config,
            weather,
            buildings,
            hazards,
            agent,
            rng,
        }
    }

    /// The world configuration.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Width of one grid cell.
    pub fn cell_width(&self) -> f64 {
        self.config.grid.cell_width
    }

    /// The per-cell weather map (read-only).
    pub fn weather_map(&self) -> &WeatherMap {
        &self.weather
    }

    /// Static obstacle cells.
    pub fn buildings(&self) -> &HashSet<GridCell> {
        &self.buildings
    }

    /// Snapshot of live hazard bounding boxes.
    pub fn hazard_boxes(&self) -> Vec<[f64; 4]> {
        self.hazards.iter().map(|c| self.object_box(*c)).collect()
    }

    /// The agent's current cell.
    pub fn agent_cell(&self) -> GridCell {
        self.agent
    }

    /// Moves the agent back to the start cell and returns the initial
    /// observation.
    pub fn reset(&mut self) -> Observation {
        self.agent = self.config.start;
        Observation::Coords(self.object_box(self.agent))
    }

    /// Executes one action and returns `(next_observation, reward, done)`.
    ///
    /// Movement clamps at the grid edge. A move into a building is blocked:
    /// the agent stays put and receives the obstacle reward. Otherwise the
    /// agent moves, hazards advance one cell, and the outcome is goal
    /// (terminal sentinel), hazard collision (episode ends), or an ordinary
    /// step.
    pub fn step(&mut self, action: usize) -> (Observation, f64, bool) {
        let (dc, dr) = Action::from_index(action).map(|a| a.delta()).unwrap_or((0, 0));
        let limit = self.config.grid.grid_num - 1;
        let target = GridCell::new(
            (self.agent.col + dc).clamp(0, limit),
            (self.agent.row + dr).clamp(0, limit),
        );

        if self.buildings.contains(&target) {
            let obs = Observation::Coords(self.object_box(self.agent));
            return (obs, self.config.obstacle_reward, false);
        }

        self.agent = target;
        self.advance_hazards();

        if self.agent == self.config.goal {
            return (Observation::Finished, self.config.goal_reward, true);
        }
        if self.hazards.contains(&self.agent) {
            let obs = Observation::Coords(self.object_box(self.agent));
            return (obs, self.config.hazard_reward, true);
        }
        let obs = Observation::Coords(self.object_box(self.agent));
        (obs, self.config.step_reward, false)
    }

    /// Moves each hazard one cell in a random direction, reversing when the
    /// move would leave the grid.
    fn advance_hazards(&mut self) {
        let limit = self.config.grid.grid_num - 1;
        for hazard in &mut self.hazards {
            let (mut dc, mut dr) = Action::ALL
                .choose(&mut self.rng)
                .map(|a| a.delta())
                .unwrap_or((0, 0));
            let col = hazard.col + dc;
            let row = hazard.row + dr;
            if col < 0 || col > limit || row < 0 || row > limit {
                dc = -dc;
                dr = -dr;
            }
            hazard.col += dc;
            hazard.row += dr;
        }
    }

    /// Bounding box of an object of `obj_width` centered in a cell.
    fn object_box(&self, cell: GridCell) -> [f64; 4] {
        let w = self.config.grid.cell_width;
        let half = self.config.obj_width / 2.0;
        let cx = cell.col as f64 * w + w / 2.0;
        let cy = cell.row as f64 * w + w / 2.0;
        [cx - half, cy - half, cx + half, cy + half]
    }
}
