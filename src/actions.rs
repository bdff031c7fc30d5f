//! The agent's action space
//!
//! Six axis-aligned steps plus one jump. Steps move the agent by vector
//! addition; the jump raises its height directly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Number of admissible actions; also the width of a value-table row
pub const ACTION_COUNT: usize = 7;

/// A single admissible move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Displace the agent by `(dx, dy, dz)`
    Step { dx: f64, dy: f64, dz: f64 },
    /// Raise the agent by `height`
    Jump { height: f64 },
}

impl Action {
    pub const fn step(dx: f64, dy: f64, dz: f64) -> Self {
        Action::Step { dx, dy, dz }
    }

    /// Position reached by taking this action from `position`
    pub fn apply(&self, position: Position) -> Position {
        match *self {
            Action::Step { dx, dy, dz } => position + Position::new(dx, dy, dz),
            Action::Jump { height } => Position {
                y: position.y + height,
                ..position
            },
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, Action::Jump { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Step { dx, dy, dz } => write!(f, "step({dx}, {dy}, {dz})"),
            Action::Jump { height } => write!(f, "jump({height})"),
        }
    }
}

/// Fixed, ordered set of actions
///
/// The order defines the column index in the value table and the
/// tie-break order for greedy selection: `+x, -x, +z, -z, +y, -y, jump`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSet {
    actions: [Action; ACTION_COUNT],
}

impl ActionSet {
    pub fn new(step_size: f64, jump_height: f64) -> Self {
        let s = step_size;
        Self {
            actions: [
                Action::step(s, 0.0, 0.0),
                Action::step(-s, 0.0, 0.0),
                Action::step(0.0, 0.0, s),
                Action::step(0.0, 0.0, -s),
                Action::step(0.0, s, 0.0),
                Action::step(0.0, -s, 0.0),
                Action::Jump {
                    height: jump_height,
                },
            ],
        }
    }

    /// # Panics
    ///
    /// Panics if `index >= ACTION_COUNT`.
    pub fn get(&self, index: usize) -> Action {
        self.actions[index]
    }

    pub fn len(&self) -> usize {
        ACTION_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}

impl Default for ActionSet {
    fn default() -> Self {
        Self::new(1.0, 3.0)
    }
}
