//! Episode lifecycle
//!
//! An episode runs from the start position until the agent falls, runs
//! out of time or reaches the goal. Termination is checked in that
//! precedence order; every termination resets the agent to the start
//! position and the clock to zero.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Termination {
    Fallen,
    TimedOut,
    GoalReached,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Termination::Fallen => "fallen",
            Termination::TimedOut => "timed out",
            Termination::GoalReached => "goal reached",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeStatus {
    Running,
    Terminated(Termination),
}

/// Whole ticks that fit into `timeout`, tolerant of `time_step` rounding
///
/// `3.0 / 0.1` evaluates to `29.999999999999996`; it must count as 30.
fn tick_budget(timeout: f64, time_step: f64) -> u64 {
    let ratio = timeout / time_step;
    let nearest = ratio.round();
    if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest as u64
    } else {
        ratio.floor() as u64
    }
}

/// Tracks the episode clock and decides when an episode is over
///
/// The clock counts whole ticks. An episode times out once more than
/// `timeout / time_step` ticks have elapsed.
#[derive(Debug, Clone)]
pub struct EpisodeController {
    start_position: Position,
    time_step: f64,
    tick_budget: u64,
    proximity_threshold: f64,
    fall_height: f64,
    ticks: u64,
    episode: usize,
}

impl EpisodeController {
    pub fn new(
        start_position: Position,
        timeout: f64,
        time_step: f64,
        proximity_threshold: f64,
        fall_height: f64,
    ) -> Self {
        Self {
            start_position,
            time_step,
            tick_budget: tick_budget(timeout, time_step),
            proximity_threshold,
            fall_height,
            ticks: 0,
            episode: 0,
        }
    }

    /// Logical time since the current episode started
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.time_step
    }

    /// Ticks since the current episode started
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Zero-based index of the current episode
    pub fn episode(&self) -> usize {
        self.episode
    }

    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    pub fn has_fallen(&self, position: &Position) -> bool {
        position.y < self.fall_height
    }

    pub fn timed_out(&self) -> bool {
        self.ticks > self.tick_budget
    }

    pub fn at_goal(&self, position: &Position, goal: &Position) -> bool {
        position.distance(goal) < self.proximity_threshold
    }

    /// Status of the episode with the agent at `position`
    pub fn check(&self, position: &Position, goal: &Position) -> EpisodeStatus {
        if self.has_fallen(position) {
            EpisodeStatus::Terminated(Termination::Fallen)
        } else if self.timed_out() {
            EpisodeStatus::Terminated(Termination::TimedOut)
        } else if self.at_goal(position, goal) {
            EpisodeStatus::Terminated(Termination::GoalReached)
        } else {
            EpisodeStatus::Running
        }
    }

    /// Start a new episode and return the position the agent restarts from
    pub fn reset(&mut self) -> Position {
        self.ticks = 0;
        self.episode += 1;
        self.start_position
    }
}
