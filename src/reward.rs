//! Composite reward shaping.
//!
//! The base reward from the environment already encodes step cost, goal
//! bonus, hazard collision, and obstacle collision. Shaping adds two
//! environment-conditioned adjustments keyed on the *next* state, applied in
//! a fixed order: weather first, then hazard proximity.

use crate::state::{Canonicalizer, StateKey};
use crate::weather::{Weather, WeatherMap};

/// Applies weather and hazard-proximity adjustments to a base reward.
pub struct RewardShaper;

impl RewardShaper {
    /// Shapes a base reward given the canonical next state.
    ///
    /// # Rules
    ///
    /// 1. Weather at the next cell (cloudy when terminal, opaque, or
    ///    unlabeled): sunny scales a positive reward by 1.5 with truncation
    ///    toward zero, snow subtracts 5, rain subtracts 2, cloudy leaves the
    ///    reward unchanged. Exactly one branch applies.
    /// 2. If any hazard's cell sits at Manhattan distance exactly 1 from the
    ///    next cell, subtract 3 once, regardless of how many hazards qualify.
    ///
    /// Terminal and opaque next states skip both adjustments' lookups and
    /// leave the reward at the weather-neutral value.
    pub fn shape(
        base: f64,
        next: &StateKey,
        weather: &WeatherMap,
        hazards: &[[f64; 4]],
        canon: &Canonicalizer,
    ) -> f64 {
        let cell = next.cell();
        let mut reward = base;

        let label = cell.map(|c| weather.get(c)).unwrap_or(Weather::Cloudy);
        match label {
            Weather::Sunny if reward > 0.0 => reward = (reward * 1.5).trunc(),
            Weather::Snow => reward -= 5.0,
            Weather::Rain => reward -= 2.0,
            _ => {}
        }

        if let Some(c) = cell {
            for hazard in hazards {
                if c.manhattan(canon.cell_of_box(hazard)) == 1 {
                    reward -= 3.0;
                    break;
                }
            }
        }

        reward
    }
}
