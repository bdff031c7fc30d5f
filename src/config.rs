//! Controller configuration
//!
//! Every field has a default matching the standard arena, so a
//! JSON file only needs to list the values it overrides.

use std::{fs::File, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    discretizer::{OutOfRangeMode, StateDiscretizer},
    error::{Error, Result},
    q_learning::{
        TableLayout,
        q_table::{MAX_DENSE_VALUES, table_len},
    },
    types::Position,
};

/// Configuration for a [`crate::training::TrainingLoop`].
///
/// # Examples
///
/// ```
/// use qnav::config::ControllerConfig;
/// use qnav::q_learning::TableLayout;
///
/// let config = ControllerConfig::default()
///     .with_seed(42)
///     .with_exploration(0.3, 0.99, 0.01)
///     .with_table_layout(TableLayout::Sparse);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Learning rate α, in (0, 1]
    pub learning_rate: f64,
    /// Discount factor γ, in [0, 1)
    pub discount_factor: f64,
    /// Initial exploration rate ε, in [0, 1]
    pub exploration_rate: f64,
    /// Multiplicative ε decay applied after each episode, in (0, 1]
    pub exploration_decay: f64,
    /// Lower bound for the decayed ε
    pub min_exploration_rate: f64,
    /// Cells per axis of the state grid
    pub grid_size: usize,
    /// Distance below which the goal counts as reached
    pub goal_proximity_threshold: f64,
    /// Episode length in logical time units
    pub episode_timeout: f64,
    /// Logical time consumed by one tick
    pub time_step: f64,
    /// The agent's height is clamped to at least this value every tick
    pub ground_height: f64,
    /// Heights strictly below this count as a fall
    pub fall_height: f64,
    pub step_size: f64,
    pub jump_height: f64,
    pub fall_penalty: f64,
    pub goal_bonus: f64,
    pub start_position: Position,
    pub goal_position: Position,
    pub table_layout: TableLayout,
    pub out_of_range: OutOfRangeMode,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            exploration_rate: 0.1,
            exploration_decay: 1.0,
            min_exploration_rate: 0.0,
            grid_size: 100,
            goal_proximity_threshold: 1.0,
            episode_timeout: 3.0,
            time_step: 0.1,
            ground_height: 1.0,
            fall_height: 0.0,
            step_size: 1.0,
            jump_height: 3.0,
            fall_penalty: -10.0,
            goal_bonus: 10.0,
            start_position: Position::new(-24.0, 1.0, 0.0),
            goal_position: Position::new(3.0, 3.0, 0.0),
            table_layout: TableLayout::Dense,
            out_of_range: OutOfRangeMode::Reject,
            seed: None,
        }
    }
}

fn check(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::invalid_config(message()))
    }
}

impl ControllerConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_learning(mut self, learning_rate: f64, discount_factor: f64) -> Self {
        self.learning_rate = learning_rate;
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_exploration(mut self, rate: f64, decay: f64, min_rate: f64) -> Self {
        self.exploration_rate = rate;
        self.exploration_decay = decay;
        self.min_exploration_rate = min_rate;
        self
    }

    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_positions(mut self, start: Position, goal: Position) -> Self {
        self.start_position = start;
        self.goal_position = goal;
        self
    }

    pub fn with_timing(mut self, episode_timeout: f64, time_step: f64) -> Self {
        self.episode_timeout = episode_timeout;
        self.time_step = time_step;
        self
    }

    pub fn with_table_layout(mut self, layout: TableLayout) -> Self {
        self.table_layout = layout;
        self
    }

    pub fn with_out_of_range(mut self, mode: OutOfRangeMode) -> Self {
        self.out_of_range = mode;
        self
    }

    /// Check every parameter; training must not start on error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        check(self.learning_rate > 0.0 && self.learning_rate <= 1.0, || {
            format!("learning_rate {} must be in (0, 1]", self.learning_rate)
        })?;
        check(
            self.discount_factor >= 0.0 && self.discount_factor < 1.0,
            || format!("discount_factor {} must be in [0, 1)", self.discount_factor),
        )?;
        check(
            (0.0..=1.0).contains(&self.exploration_rate),
            || format!("exploration_rate {} must be in [0, 1]", self.exploration_rate),
        )?;
        check(
            self.exploration_decay > 0.0 && self.exploration_decay <= 1.0,
            || {
                format!(
                    "exploration_decay {} must be in (0, 1]",
                    self.exploration_decay
                )
            },
        )?;
        check(
            self.min_exploration_rate >= 0.0
                && self.min_exploration_rate <= self.exploration_rate,
            || {
                format!(
                    "min_exploration_rate {} must be in [0, exploration_rate]",
                    self.min_exploration_rate
                )
            },
        )?;
        check(self.goal_proximity_threshold > 0.0, || {
            format!(
                "goal_proximity_threshold {} must be positive",
                self.goal_proximity_threshold
            )
        })?;
        check(self.episode_timeout > 0.0, || {
            format!("episode_timeout {} must be positive", self.episode_timeout)
        })?;
        check(self.time_step > 0.0, || {
            format!("time_step {} must be positive", self.time_step)
        })?;
        check(self.step_size > 0.0, || {
            format!("step_size {} must be positive", self.step_size)
        })?;
        check(self.jump_height > 0.0, || {
            format!("jump_height {} must be positive", self.jump_height)
        })?;
        check(
            self.ground_height.is_finite()
                && self.fall_height.is_finite()
                && self.fall_penalty.is_finite()
                && self.goal_bonus.is_finite(),
            || "ground_height, fall_height, fall_penalty and goal_bonus must be finite".to_string(),
        )?;

        let discretizer = StateDiscretizer::new(self.grid_size, OutOfRangeMode::Reject)?;
        let Some(values) = table_len(self.grid_size) else {
            return Err(Error::invalid_config(format!(
                "grid_size {} overflows the value table size",
                self.grid_size
            )));
        };
        check(
            self.table_layout == TableLayout::Sparse || values <= MAX_DENSE_VALUES,
            || {
                format!(
                    "grid_size {} needs {values} dense values (limit {MAX_DENSE_VALUES}); \
                     use the sparse table layout",
                    self.grid_size
                )
            },
        )?;
        check(
            self.start_position.distance(&self.goal_position) >= self.goal_proximity_threshold,
            || "start_position lies within goal_proximity_threshold of goal_position".to_string(),
        )?;
        for (name, position) in [
            ("start_position", &self.start_position),
            ("goal_position", &self.goal_position),
        ] {
            check(discretizer.contains(position), || {
                format!(
                    "{name} {position} lies outside the {size}³ state grid",
                    size = self.grid_size
                )
            })?;
        }
        Ok(())
    }

    /// Load a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open config {}", path.display()),
            source,
        })?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
