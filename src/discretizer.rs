//! Continuous-to-grid state mapping
//!
//! Every coordinate is shifted by half the grid width and truncated
//! towards negative infinity: `index = floor(coord + grid_size / 2)`.
//! With the default 100-cell grid a unit cube centred on the origin
//! covers world coordinates `[-50, 50)` on each axis.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{Axis, DiscreteState, Position},
};

/// What to do with a coordinate that falls outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangeMode {
    /// Fail with [`Error::OutOfRangeState`]
    #[default]
    Reject,
    /// Clamp the index into the grid and emit a warning
    Clamp,
}

/// Maps [`Position`]s onto [`DiscreteState`] cells of a cubic grid
#[derive(Debug, Clone)]
pub struct StateDiscretizer {
    grid_size: usize,
    offset: f64,
    mode: OutOfRangeMode,
}

impl StateDiscretizer {
    /// Create a discretizer for a `grid_size³` grid
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when `grid_size` is zero or
    /// does not fit a `u32` index.
    pub fn new(grid_size: usize, mode: OutOfRangeMode) -> Result<Self> {
        if grid_size == 0 {
            return Err(Error::invalid_config("grid_size must be positive"));
        }
        if grid_size > u32::MAX as usize {
            return Err(Error::invalid_config(format!(
                "grid_size {grid_size} exceeds the supported maximum of {}",
                u32::MAX
            )));
        }
        Ok(Self {
            grid_size,
            offset: (grid_size / 2) as f64,
            mode,
        })
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn mode(&self) -> OutOfRangeMode {
        self.mode
    }

    /// Raw, unchecked grid index of one coordinate
    fn raw_index(&self, coord: f64) -> i64 {
        (coord + self.offset).floor() as i64
    }

    /// Whether `position` maps inside the grid without clamping
    pub fn contains(&self, position: &Position) -> bool {
        position.is_finite()
            && Axis::ALL.iter().all(|&axis| {
                let index = self.raw_index(position.component(axis));
                index >= 0 && (index as u64) < self.grid_size as u64
            })
    }

    /// Map `position` to its grid cell
    ///
    /// # Errors
    ///
    /// - [`Error::NonFinitePosition`] if any coordinate is NaN or infinite.
    /// - [`Error::OutOfRangeState`] if a coordinate leaves the grid and the
    ///   mode is [`OutOfRangeMode::Reject`].
    pub fn discretize(&self, position: &Position) -> Result<DiscreteState> {
        if !position.is_finite() {
            return Err(Error::NonFinitePosition {
                position: *position,
            });
        }

        let mut indices = [0u32; 3];
        for (slot, axis) in indices.iter_mut().zip(Axis::ALL) {
            *slot = self.axis_index(position, axis)?;
        }
        let [ix, iy, iz] = indices;
        Ok(DiscreteState::new(ix, iy, iz))
    }

    fn axis_index(&self, position: &Position, axis: Axis) -> Result<u32> {
        let index = self.raw_index(position.component(axis));
        let upper = self.grid_size as i64 - 1;
        if (0..=upper).contains(&index) {
            return Ok(index as u32);
        }

        match self.mode {
            OutOfRangeMode::Reject => Err(Error::OutOfRangeState {
                axis,
                index,
                grid_size: self.grid_size,
                position: *position,
            }),
            OutOfRangeMode::Clamp => {
                let clamped = index.clamp(0, upper);
                tracing::warn!(
                    %position,
                    %axis,
                    index,
                    clamped,
                    "position outside the state grid, clamping"
                );
                Ok(clamped as u32)
            }
        }
    }

    /// Centre of `state`'s cell in world coordinates
    pub fn cell_center(&self, state: &DiscreteState) -> Position {
        let center = |index: u32| index as f64 - self.offset + 0.5;
        Position::new(center(state.ix), center(state.iy), center(state.iz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_grid() -> StateDiscretizer {
        StateDiscretizer::new(100, OutOfRangeMode::Reject).unwrap()
    }

    #[test]
    fn test_default_start_and_goal_cells() {
        let d = default_grid();
        assert_eq!(
            d.discretize(&Position::new(-24.0, 1.0, 0.0)).unwrap(),
            DiscreteState::new(26, 51, 50)
        );
        assert_eq!(
            d.discretize(&Position::new(3.0, 3.0, 0.0)).unwrap(),
            DiscreteState::new(53, 53, 50)
        );
    }

    #[test]
    fn test_floor_not_truncation() {
        let d = default_grid();
        let state = d.discretize(&Position::new(-0.5, 0.25, 49.99)).unwrap();
        assert_eq!(state, DiscreteState::new(49, 50, 99));
    }

    #[test]
    fn test_reject_mode_reports_axis() {
        let d = default_grid();
        let err = d.discretize(&Position::new(0.0, 50.0, 0.0)).unwrap_err();
        match err {
            Error::OutOfRangeState {
                axis,
                index,
                grid_size,
                ..
            } => {
                assert_eq!(axis, Axis::Y);
                assert_eq!(index, 100);
                assert_eq!(grid_size, 100);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            d.discretize(&Position::new(-50.5, 0.0, 0.0)),
            Err(Error::OutOfRangeState { axis: Axis::X, index: -1, .. })
        ));
    }

    #[test]
    fn test_clamp_mode_stays_in_grid() {
        let d = StateDiscretizer::new(10, OutOfRangeMode::Clamp).unwrap();
        let state = d.discretize(&Position::new(-100.0, 2.0, 100.0)).unwrap();
        assert_eq!(state, DiscreteState::new(0, 7, 9));
    }

    #[test]
    fn test_non_finite_is_rejected_in_both_modes() {
        for mode in [OutOfRangeMode::Reject, OutOfRangeMode::Clamp] {
            let d = StateDiscretizer::new(10, mode).unwrap();
            assert!(matches!(
                d.discretize(&Position::new(f64::NAN, 0.0, 0.0)),
                Err(Error::NonFinitePosition { .. })
            ));
        }
    }

    #[test]
    fn test_zero_grid_is_invalid() {
        assert!(matches!(
            StateDiscretizer::new(0, OutOfRangeMode::Reject),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_cell_center_within_one_cell() {
        let d = default_grid();
        let samples = [
            Position::new(-24.0, 1.0, 0.0),
            Position::new(3.3, 2.9, -0.1),
            Position::new(-49.99, 49.99, 12.5),
            Position::new(0.0, 0.0, 0.0),
        ];
        for p in samples {
            let state = d.discretize(&p).unwrap();
            assert_eq!(d.discretize(&p).unwrap(), state);
            let center = d.cell_center(&state);
            for axis in Axis::ALL {
                assert!((center.component(axis) - p.component(axis)).abs() <= 1.0);
            }
            assert_eq!(d.discretize(&center).unwrap(), state);
        }
    }

    #[test]
    fn test_contains_matches_discretize() {
        let d = default_grid();
        assert!(d.contains(&Position::new(49.0, -50.0, 0.0)));
        assert!(!d.contains(&Position::new(50.0, 0.0, 0.0)));
        assert!(!d.contains(&Position::new(0.0, f64::NAN, 0.0)));
    }
}
