//! Configuration for the grid world and the Q-learning agent.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::GridCell;

/// Geometry of the discretized 2-D grid world.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridConfig {
    /// Number of cells per side.
    pub grid_num: i32,
    /// Width of one cell in world units.
    pub cell_width: f64,
}

impl GridConfig {
    /// Total number of canonical states: one per cell plus the terminal state.
    pub fn canonical_states(&self) -> usize {
        (self.grid_num * self.grid_num) as usize + 1
    }

    /// Returns true if the cell lies inside the grid.
    pub fn contains(&self, cell: GridCell) -> bool {
        cell.col >= 0 && cell.col < self.grid_num && cell.row >= 0 && cell.row < self.grid_num
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_num: 12,
            cell_width: 80.0,
        }
    }
}

/// Configuration for the tabular Q-learning agent.
///
/// The random source is injected separately (as a seed) so that action
/// selection is deterministic under test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentConfig {
    /// Number of discrete actions (up/down/left/right = 4).
    pub actions: usize,
    /// Learning rate α applied to each temporal-difference step.
    pub learning_rate: f64,
    /// Discount factor γ for future value.
    pub discount_factor: f64,
    /// Exploration probability ε for epsilon-greedy selection.
    pub epsilon: f64,
    /// Grid geometry shared with the environment.
    pub grid: GridConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            actions: 4,
            learning_rate: 0.01,
            discount_factor: 0.9,
            epsilon: 0.01,
            grid: GridConfig::default(),
        }
    }
}

/// Configuration for the grid-world environment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// Grid geometry.
    pub grid: GridConfig,
    /// Width of objects (agent, hazards) drawn inside a cell.
    pub obj_width: f64,
    /// Number of static obstacle cells to place at construction.
    pub num_buildings: usize,
    /// Agent start cell.
    pub start: GridCell,
    /// Goal cell.
    pub goal: GridCell,
    /// Initial hazard cells. Hazards wander one cell per tick.
    pub hazards: Vec<GridCell>,
    /// Reward for an ordinary step.
    pub step_reward: f64,
    /// Reward for reaching the goal.
    pub goal_reward: f64,
    /// Reward for colliding with a hazard (episode ends).
    pub hazard_reward: f64,
    /// Reward for a blocked move into an obstacle (no movement).
    pub obstacle_reward: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            obj_width: 50.0,
            num_buildings: 22,
            start: GridCell::new(0, 0),
            goal: GridCell::new(9, 9),
            hazards: vec![
                GridCell::new(0, 2),
                GridCell::new(1, 2),
                GridCell::new(3, 0),
                GridCell::new(4, 4),
            ],
            step_reward: -1.0,
            goal_reward: 100.0,
            hazard_reward: -100.0,
            obstacle_reward: -5.0,
        }
    }
}
