//! Observer port - abstraction for watching a training run
//!
//! Observers receive every tick outcome and every finished episode without
//! being able to touch the value table.

use crate::{
    Result,
    training::{EpisodeSummary, TickOutcome},
};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_ticks)` - once
/// 2. for each tick:
///    - `on_tick(outcome)`
///    - `on_goal_reached(episode)` - when the tick reported the goal
///    - `on_episode_end(summary)` - when the tick ended an episode
/// 3. `on_training_end()` - once
///
/// # Examples
///
/// ```
/// use qnav::ports::Observer;
///
/// struct GoalCounter {
///     goals: usize,
/// }
///
/// impl Observer for GoalCounter {
///     fn on_goal_reached(&mut self, _episode: usize) -> qnav::Result<()> {
///         self.goals += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called once before the first tick.
    fn on_training_start(&mut self, _total_ticks: u64) -> Result<()> {
        Ok(())
    }

    /// Called after every tick, including terminating ones.
    fn on_tick(&mut self, _tick: u64, _outcome: &TickOutcome) -> Result<()> {
        Ok(())
    }

    /// Called when an episode ends for any reason.
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// One-shot notification that the agent reached the goal.
    ///
    /// This is where a front-end would show its victory message.
    fn on_goal_reached(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called once after the last tick.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
