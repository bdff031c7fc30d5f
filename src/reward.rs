//! Reward shaping

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Which branch of the reward function produced a value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RewardKind {
    Fell,
    Goal,
    Shaped { distance: f64 },
}

/// Three-branch piecewise reward
///
/// - fall: fixed penalty, regardless of distance
/// - within `proximity_threshold` of the goal: fixed bonus
/// - otherwise: negative Euclidean distance to the goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardModel {
    pub fall_penalty: f64,
    pub goal_bonus: f64,
    pub proximity_threshold: f64,
}

impl RewardModel {
    pub fn new(fall_penalty: f64, goal_bonus: f64, proximity_threshold: f64) -> Self {
        Self {
            fall_penalty,
            goal_bonus,
            proximity_threshold,
        }
    }

    pub fn classify(&self, next_position: &Position, goal: &Position, fell: bool) -> RewardKind {
        if fell {
            return RewardKind::Fell;
        }
        let distance = next_position.distance(goal);
        if distance < self.proximity_threshold {
            RewardKind::Goal
        } else {
            RewardKind::Shaped { distance }
        }
    }

    pub fn reward(&self, next_position: &Position, goal: &Position, fell: bool) -> f64 {
        match self.classify(next_position, goal, fell) {
            RewardKind::Fell => self.fall_penalty,
            RewardKind::Goal => self.goal_bonus,
            RewardKind::Shaped { distance } => -distance,
        }
    }
}

impl Default for RewardModel {
    fn default() -> Self {
        Self::new(-10.0, 10.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOAL: Position = Position::new(3.0, 3.0, 0.0);

    #[test]
    fn test_fall_overrides_everything() {
        let model = RewardModel::default();
        assert_eq!(model.reward(&GOAL, &GOAL, true), -10.0);
        assert_eq!(model.reward(&Position::new(-24.0, -0.5, 0.0), &GOAL, true), -10.0);
    }

    #[test]
    fn test_goal_bonus_inside_threshold() {
        let model = RewardModel::default();
        assert_eq!(model.reward(&Position::new(3.0, 3.0, 0.4), &GOAL, false), 10.0);
        assert_eq!(model.reward(&GOAL, &GOAL, false), 10.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let model = RewardModel::default();
        let on_boundary = Position::new(4.0, 3.0, 0.0);
        assert_eq!(model.reward(&on_boundary, &GOAL, false), -1.0);
    }

    #[test]
    fn test_shaped_reward_is_negative_distance() {
        let model = RewardModel::default();
        let reward = model.reward(&Position::new(-24.0, 1.0, 0.0), &GOAL, false);
        assert!((reward + 27.074).abs() < 1e-3);
        assert!(matches!(
            model.classify(&Position::new(-24.0, 1.0, 0.0), &GOAL, false),
            RewardKind::Shaped { distance } if distance > 27.0
        ));
    }
}
