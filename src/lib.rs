//! Tabular Q-learning controller for a point-mass agent in a 3D arena
//!
//! This crate provides:
//! - State discretization of continuous positions onto a cubic grid
//! - A fixed seven-action move set (six steps and a jump)
//! - A value table with the TD(0) Q-learning update and ε-greedy selection
//! - Reward shaping and an episode lifecycle (fall, timeout, goal)
//! - A tick-driven training loop plus a headless pipeline and CLI to drive it
//!
//! ```
//! use qnav::{config::ControllerConfig, training::TrainingLoop};
//!
//! let mut controller = TrainingLoop::new(ControllerConfig::default().with_seed(1))?;
//! let goal = controller.goal_position();
//! let mut position = controller.start_position();
//! for _ in 0..10 {
//!     position = controller.tick(position, goal)?.position;
//! }
//! assert_eq!(controller.total_ticks(), 10);
//! # Ok::<(), qnav::Error>(())
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod discretizer;
pub mod episode;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod reward;
pub mod training;
pub mod types;

pub use actions::{ACTION_COUNT, Action, ActionSet};
pub use config::ControllerConfig;
pub use discretizer::{OutOfRangeMode, StateDiscretizer};
pub use episode::{EpisodeController, EpisodeStatus, Termination};
pub use error::{Error, Result};
pub use q_learning::{EpsilonGreedy, ExplorationSchedule, TableLayout, ValueTable};
pub use reward::RewardModel;
pub use training::{EpisodeEvent, TickOutcome, TrainingLoop};
pub use types::{DiscreteState, Position};
