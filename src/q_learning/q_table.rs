//! Value table for tabular Q-learning

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{actions::ACTION_COUNT, types::DiscreteState};

/// One row of action values for a single state
pub type ActionValues = [f64; ACTION_COUNT];

const ZERO_ROW: ActionValues = [0.0; ACTION_COUNT];

/// Largest dense table, in values, that configuration validation accepts
pub const MAX_DENSE_VALUES: usize = 1 << 27;

/// Values held by a full table over a `grid_size³` grid, `None` on overflow
pub fn table_len(grid_size: usize) -> Option<usize> {
    grid_size.checked_pow(3)?.checked_mul(ACTION_COUNT)
}

/// Backing storage for a [`ValueTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableLayout {
    /// `grid_size³ × ACTION_COUNT` values allocated up front
    #[default]
    Dense,
    /// Rows created on first write; unvisited states read as zero
    Sparse,
}

#[derive(Debug, Clone)]
enum Storage {
    Dense(Vec<f64>),
    Sparse(HashMap<DiscreteState, ActionValues>),
}

/// Q-values indexed by (state, action), initialised to zero
///
/// States must come from a discretizer with the same `grid_size`; a dense
/// table panics on indices outside its grid.
#[derive(Debug, Clone)]
pub struct ValueTable {
    storage: Storage,
    grid_size: usize,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
}

impl ValueTable {
    /// # Panics
    ///
    /// A dense table panics when `grid_size³ × ACTION_COUNT` overflows or
    /// cannot be allocated. [`crate::config::ControllerConfig::validate`]
    /// rejects such grids before a controller builds its table.
    pub fn new(
        grid_size: usize,
        layout: TableLayout,
        learning_rate: f64,
        discount_factor: f64,
    ) -> Self {
        let storage = match layout {
            TableLayout::Dense => {
                Storage::Dense(vec![0.0; table_len(grid_size).unwrap_or(usize::MAX)])
            }
            TableLayout::Sparse => Storage::Sparse(HashMap::new()),
        };
        Self {
            storage,
            grid_size,
            learning_rate,
            discount_factor,
        }
    }

    pub fn layout(&self) -> TableLayout {
        match self.storage {
            Storage::Dense(_) => TableLayout::Dense,
            Storage::Sparse(_) => TableLayout::Sparse,
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// All action values for `state`
    pub fn row(&self, state: &DiscreteState) -> ActionValues {
        match &self.storage {
            Storage::Dense(values) => {
                let start = state.flat_index(self.grid_size) * ACTION_COUNT;
                let mut row = ZERO_ROW;
                row.copy_from_slice(&values[start..start + ACTION_COUNT]);
                row
            }
            Storage::Sparse(rows) => rows.get(state).copied().unwrap_or(ZERO_ROW),
        }
    }

    fn row_mut(&mut self, state: &DiscreteState) -> &mut [f64] {
        match &mut self.storage {
            Storage::Dense(values) => {
                let start = state.flat_index(self.grid_size) * ACTION_COUNT;
                &mut values[start..start + ACTION_COUNT]
            }
            Storage::Sparse(rows) => rows.entry(*state).or_insert(ZERO_ROW).as_mut_slice(),
        }
    }

    /// Q-value for a state-action pair
    pub fn get(&self, state: &DiscreteState, action: usize) -> f64 {
        self.row(state)[action]
    }

    /// Overwrite the Q-value for a state-action pair
    pub fn set(&mut self, state: &DiscreteState, action: usize, value: f64) {
        self.row_mut(state)[action] = value;
    }

    /// Maximum Q-value over all actions in `state`
    pub fn max_value(&self, state: &DiscreteState) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Highest-valued action; ties go to the lowest index
    pub fn greedy_action(&self, state: &DiscreteState) -> usize {
        let row = self.row(state);
        let mut best = 0;
        for (action, &value) in row.iter().enumerate().skip(1) {
            if value > row[best] {
                best = action;
            }
        }
        best
    }

    /// Q-learning update: off-policy TD(0)
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// Returns the TD error.
    pub fn update(
        &mut self,
        state: &DiscreteState,
        action: usize,
        reward: f64,
        next_state: &DiscreteState,
    ) -> f64 {
        let current_q = self.get(state, action);
        let best_next = self.max_value(next_state);
        let td_target = reward + self.discount_factor * best_next;
        let td_error = td_target - current_q;
        self.set(state, action, current_q + self.learning_rate * td_error);
        td_error
    }

    /// Number of states holding at least one non-zero value
    pub fn visited_states(&self) -> usize {
        match &self.storage {
            Storage::Dense(values) => values
                .chunks_exact(ACTION_COUNT)
                .filter(|row| row.iter().any(|&v| v != 0.0))
                .count(),
            Storage::Sparse(rows) => rows
                .values()
                .filter(|row| row.iter().any(|&v| v != 0.0))
                .count(),
        }
    }

    /// Zero every value
    pub fn reset(&mut self) {
        match &mut self.storage {
            Storage::Dense(values) => values.fill(0.0),
            Storage::Sparse(rows) => rows.clear(),
        }
    }
}
