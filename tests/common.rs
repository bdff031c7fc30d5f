//! Shared fixtures for the qnav integration tests.

#![allow(dead_code)]

use qnav::{
    ActionSet, ControllerConfig, DiscreteState, OutOfRangeMode, Position, TableLayout, ValueTable,
    q_learning::ActionValues,
};

/// Short straight corridor: start at (0, 1, 0), goal two steps away along -x.
///
/// Greedy (ε = 0), seeded, sparse table, 0.1 time units per tick.
pub fn corridor_config() -> ControllerConfig {
    ControllerConfig::default()
        .with_positions(Position::new(0.0, 1.0, 0.0), Position::new(-2.0, 1.0, 0.0))
        .with_timing(3.0, 0.1)
        .with_exploration(0.0, 1.0, 0.0)
        .with_table_layout(TableLayout::Sparse)
        .with_out_of_range(OutOfRangeMode::Reject)
        .with_seed(17)
}

/// Copy of the table rows for `states`
pub fn snapshot(table: &ValueTable, states: &[DiscreteState]) -> Vec<ActionValues> {
    states.iter().map(|state| table.row(state)).collect()
}

/// Table whose only non-zero entry makes `action` dominant in `state`
pub fn dominant_table(state: &DiscreteState, action: usize) -> ValueTable {
    let mut table = ValueTable::new(100, TableLayout::Sparse, 0.1, 0.9);
    for other in 0..ActionSet::default().len() {
        table.set(state, other, -1.0);
    }
    table.set(state, action, 5.0);
    table
}
