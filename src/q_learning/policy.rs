//! ε-greedy action selection and its exploration schedule

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{actions::ACTION_COUNT, q_learning::q_table::ValueTable, types::DiscreteState};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// ε-greedy selector over a [`ValueTable`]
///
/// Reads the table but never writes it.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl EpsilonGreedy {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: build_rng(seed),
            rng_seed: seed,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        self
    }

    /// Pick an action index for `state`
    ///
    /// With probability `epsilon` a uniformly random action, otherwise the
    /// greedy action (ties resolved towards the lowest index).
    pub fn select_action(
        &mut self,
        table: &ValueTable,
        state: &DiscreteState,
        epsilon: f64,
    ) -> usize {
        if self.rng.random::<f64>() < epsilon {
            self.rng.random_range(0..ACTION_COUNT)
        } else {
            table.greedy_action(state)
        }
    }

    /// Restart the random stream from the configured seed
    pub fn reset(&mut self) {
        self.rng = build_rng(self.rng_seed);
    }
}

/// Exploration rate with optional per-episode multiplicative decay
///
/// A decay of `1.0` keeps ε constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    epsilon: f64,
    initial_epsilon: f64,
    decay: f64,
    min_epsilon: f64,
}

impl ExplorationSchedule {
    pub fn new(epsilon: f64, decay: f64, min_epsilon: f64) -> Self {
        Self {
            epsilon,
            initial_epsilon: epsilon,
            decay,
            min_epsilon,
        }
    }

    pub fn constant(epsilon: f64) -> Self {
        Self::new(epsilon, 1.0, epsilon)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Decay ε after an episode
    pub fn on_episode_end(&mut self) {
        self.epsilon = (self.epsilon * self.decay).max(self.min_epsilon);
    }

    pub fn reset(&mut self) {
        self.epsilon = self.initial_epsilon;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q_learning::q_table::TableLayout;

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let mut table = ValueTable::new(4, TableLayout::Sparse, 0.1, 0.9);
        let state = DiscreteState::new(1, 2, 3);
        table.set(&state, 5, 3.0);

        let mut policy = EpsilonGreedy::new(Some(7));
        for _ in 0..100 {
            assert_eq!(policy.select_action(&table, &state, 0.0), 5);
        }
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let table = ValueTable::new(4, TableLayout::Sparse, 0.1, 0.9);
        let state = DiscreteState::new(0, 0, 0);

        let mut a = EpsilonGreedy::new(Some(11));
        let mut b = EpsilonGreedy::new(None).with_seed(11);
        let first: Vec<usize> = (0..50).map(|_| a.select_action(&table, &state, 0.5)).collect();
        let second: Vec<usize> = (0..50).map(|_| b.select_action(&table, &state, 0.5)).collect();
        assert_eq!(first, second);

        a.reset();
        let replay: Vec<usize> = (0..50).map(|_| a.select_action(&table, &state, 0.5)).collect();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_schedule_decays_to_floor() {
        let mut schedule = ExplorationSchedule::new(0.5, 0.5, 0.1);
        schedule.on_episode_end();
        assert!((schedule.epsilon() - 0.25).abs() < 1e-12);
        schedule.on_episode_end();
        schedule.on_episode_end();
        assert!((schedule.epsilon() - 0.1).abs() < 1e-12);

        schedule.reset();
        assert!((schedule.epsilon() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_schedule_never_moves() {
        let mut schedule = ExplorationSchedule::constant(0.1);
        for _ in 0..1000 {
            schedule.on_episode_end();
        }
        assert_eq!(schedule.epsilon(), 0.1);
    }
}
