//! skyroute - tabular Q-learning for drone route planning on a weathered grid.
//!
//! A discretized 2-D grid world is explored on-policy by a single agent:
//! raw bounding-box observations are collapsed to canonical grid cells, an
//! epsilon-greedy policy picks among four movement actions, and rewards are
//! shaped by per-cell weather and proximity to moving hazards before each
//! temporal-difference update. The Q-table persists across runs through a
//! columnar text snapshot that reindexes to the full state space on load.

pub mod agent;
pub mod config;
pub mod environment;
pub mod metrics;
pub mod reward;
pub mod state;
pub mod table;
pub mod weather;

pub use agent::Agent;
pub use config::{AgentConfig, GridConfig, WorldConfig};
pub use environment::{Action, GridWorld};
pub use metrics::TrainingSummary;
pub use reward::RewardShaper;
pub use state::{Canonicalizer, GridCell, Observation, StateKey};
pub use table::{QTable, TableError};
pub use weather::{Weather, WeatherMap};
