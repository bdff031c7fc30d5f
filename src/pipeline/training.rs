//! Headless driver for the training loop

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    episode::Termination,
    ports::Observer,
    training::{EpisodeEvent, TrainingLoop},
};

/// Run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of ticks to issue
    pub ticks: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { ticks: 10_000 }
    }
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Ticks issued
    pub total_ticks: u64,

    /// Episodes that reached a termination
    pub episodes: usize,

    pub goals_reached: usize,

    pub falls: usize,

    pub timeouts: usize,

    /// Fraction of finished episodes that reached the goal
    pub goal_rate: f64,

    /// Mean total reward over finished episodes
    pub mean_episode_reward: f64,

    /// Best total reward of any finished episode
    pub best_episode_reward: Option<f64>,

    /// Exploration rate after the last tick
    pub final_epsilon: f64,

    /// States with at least one non-zero value
    pub visited_states: usize,
}

impl TrainingResult {
    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Stand-in for the visual front-end
///
/// Owns the displayed agent position, feeds it to the controller once per
/// tick and replaces it with whatever the controller returns.
pub struct TrainingPipeline {
    config: RunConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Issue `ticks` ticks against `controller`, starting from its start position
    ///
    /// # Errors
    ///
    /// Stops at the first tick or observer error and returns it.
    pub fn run(&mut self, controller: &mut TrainingLoop) -> Result<TrainingResult> {
        let goal = controller.goal_position();
        let mut position = controller.start_position();

        let mut episodes = 0;
        let mut goals_reached = 0;
        let mut falls = 0;
        let mut timeouts = 0;
        let mut reward_sum = 0.0;
        let mut best_episode_reward: Option<f64> = None;

        for observer in &mut self.observers {
            observer.on_training_start(self.config.ticks)?;
        }

        for tick in 0..self.config.ticks {
            let outcome = controller.tick(position, goal)?;
            position = outcome.position;

            for observer in &mut self.observers {
                observer.on_tick(tick, &outcome)?;
            }

            let Some(summary) = outcome.episode_end else {
                continue;
            };

            episodes += 1;
            reward_sum += summary.total_reward;
            best_episode_reward = Some(
                best_episode_reward.map_or(summary.total_reward, |best| {
                    best.max(summary.total_reward)
                }),
            );
            match summary.termination {
                Termination::GoalReached => goals_reached += 1,
                Termination::Fallen => falls += 1,
                Termination::TimedOut => timeouts += 1,
            }

            if outcome.event == EpisodeEvent::GoalReached {
                for observer in &mut self.observers {
                    observer.on_goal_reached(summary.episode)?;
                }
            }
            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let (goal_rate, mean_episode_reward) = if episodes > 0 {
            (
                goals_reached as f64 / episodes as f64,
                reward_sum / episodes as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Ok(TrainingResult {
            total_ticks: self.config.ticks,
            episodes,
            goals_reached,
            falls,
            timeouts,
            goal_rate,
            mean_episode_reward,
            best_episode_reward,
            final_epsilon: controller.epsilon(),
            visited_states: controller.table().visited_states(),
        })
    }
}
