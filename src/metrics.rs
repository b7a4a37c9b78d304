//! Episode driver and aggregate training metrics.
//!
//! Runs the decision-execution-update loop over a fixed number of episodes
//! and reports success rate, reward statistics, and step counts.

use std::fmt;

use crate::agent::Agent;
use crate::environment::GridWorld;
use crate::state::Observation;

/// Aggregated statistics over a training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Number of episodes run.
    pub episodes: usize,
    /// Fraction of episodes that ended at the goal.
    pub success_rate: f64,
    /// Mean total reward per episode.
    pub mean_reward: f64,
    /// Population standard deviation of episode rewards.
    pub reward_std: f64,
    /// Mean steps per episode.
    pub mean_steps: f64,
    /// Mean steps over successful episodes only (0 when none).
    pub mean_success_steps: f64,
}

impl TrainingSummary {
    /// Trains an agent for `episodes` episodes.
    ///
    /// Each step: select an action, execute it, snapshot hazard positions,
    /// and apply the Q-update. Episodes longer than `max_steps` are truncated
    /// and counted as failures (the underlying walk has no horizon of its
    /// own).
    pub fn train(
        env: &mut GridWorld,
        agent: &mut Agent,
        episodes: usize,
        max_steps: usize,
    ) -> Self {
        let mut episode_rewards = Vec::with_capacity(episodes);
        let mut episode_steps = Vec::with_capacity(episodes);
        let mut success_steps = Vec::new();
        let mut successes = 0usize;

        for _ in 0..episodes {
            let mut observation = env.reset();
            let mut total_reward = 0.0;
            let mut steps = 0usize;

            loop {
                let action = agent.select_action(&observation);
                let (next_observation, reward, done) = env.step(action);
                let hazards = env.hazard_boxes();
                agent.update(&observation, action, reward, &next_observation, &hazards);

                total_reward += reward;
                steps += 1;

                if done {
                    if next_observation == Observation::Finished {
                        successes += 1;
                        success_steps.push(steps);
                    }
                    break;
                }
                if steps >= max_steps {
                    break;
                }
                observation = next_observation;
            }

            episode_rewards.push(total_reward);
            episode_steps.push(steps);
        }

        let n = episodes.max(1) as f64;
        let mean_reward = episode_rewards.iter().sum::<f64>() / n;
        let reward_std = (episode_rewards
            .iter()
            .map(|r| (r - mean_reward).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();
        let mean_steps = episode_steps.iter().sum::<usize>() as f64 / n;
        let mean_success_steps = if success_steps.is_empty() {
            0.0
        } else {
            success_steps.iter().sum::<usize>() as f64 / success_steps.len() as f64
        };

        Self {
            episodes,
            success_rate: successes as f64 / n,
            mean_reward,
            reward_std,
            mean_steps,
            mean_success_steps,
        }
    }
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Training Summary ({} episodes) ===", self.episodes)?;
        writeln!(f, "  Success rate:          {:.2}%", self.success_rate * 100.0)?;
        writeln!(f, "  Mean reward:           {:.3}", self.mean_reward)?;
        writeln!(f, "  Reward std:            {:.3}", self.reward_std)?;
        writeln!(f, "  Mean steps:            {:.2}", self.mean_steps)?;
        writeln!(
            f,
            "  Mean steps (success):  {:.2}",
            self.mean_success_steps
        )
    }
}
