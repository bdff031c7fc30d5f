//! Tabular Q-learning
//!
//! The [`ValueTable`] stores one estimated return per (grid cell, action)
//! pair and is updated with the off-policy TD(0) rule
//!
//! ```text
//! Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
//! ```
//!
//! Actions are chosen by [`EpsilonGreedy`], whose exploration rate comes
//! from an [`ExplorationSchedule`] that is constant unless a decay is
//! configured.
//!
//! ## Usage Example
//!
//! ```
//! use qnav::q_learning::{EpsilonGreedy, TableLayout, ValueTable};
//! use qnav::types::DiscreteState;
//!
//! let mut table = ValueTable::new(10, TableLayout::Sparse, 0.1, 0.9);
//! let state = DiscreteState::new(1, 1, 1);
//! let next = DiscreteState::new(2, 1, 1);
//! table.update(&state, 0, -1.0, &next);
//!
//! let mut policy = EpsilonGreedy::new(Some(42));
//! let action = policy.select_action(&table, &state, 0.0);
//! assert_eq!(action, 1);
//! ```

pub mod policy;
pub mod q_table;

pub use policy::{EpsilonGreedy, ExplorationSchedule};
pub use q_table::{ActionValues, TableLayout, ValueTable};
