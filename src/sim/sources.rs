// External forcing and smoke injection

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    sim::{
        field::{ScalarField, VectorField},
        obstacle::ObstacleMask,
    },
};

/// A rectangular band of cells with a fixed inflow velocity and a nonzero
/// smoke source rate. Ranges are half-open `(start, end)`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InletBand {
    pub rows: (usize, usize),
    pub cols: (usize, usize),

    /// Initial velocity (u, v) inside the band
    pub velocity: (f32, f32),

    /// Smoke injection rate inside the band
    pub source: f32,
}

impl InletBand {
    /// The default inlet: a 60 row band through the middle of the left edge,
    /// a tenth of the grid wide, blowing along the columns at 20 cells per unit time.
    pub fn centered(rows: usize, cols: usize) -> Self {
        let mid = rows / 2;
        InletBand {
            rows: (mid.saturating_sub(30).max(1), (mid + 30).min(rows - 1)),
            cols: (1, (cols / 10).max(2)),
            velocity: (0., 20.),
            source: 1.,
        }
    }

    /// Check that the band is non-empty and fits inside the grid.
    pub fn validate(&self, rows: usize, cols: usize) -> Result<(), ConfigError> {
        let (r0, r1) = self.rows;
        let (c0, c1) = self.cols;

        if r0 >= r1 || c0 >= c1 || r1 > rows || c1 > cols {
            return Err(ConfigError::InletOutOfBounds {
                rows: self.rows,
                cols: self.cols,
            });
        }

        Ok(())
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.rows.0..self.rows.1).contains(&row) && (self.cols.0..self.cols.1).contains(&col)
    }
}

/// Add `force * dt` to both velocity components on interior fluid cells.
pub fn apply_forces(u: &mut VectorField, f: &VectorField, mask: &ObstacleMask, dt: f32) {
    let (rows, cols) = u[0].shape();

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            if mask.is_solid(r, c) {
                continue;
            }
            u[0][(r, c)] += f[0][(r, c)] * dt;
            u[1][(r, c)] += f[1][(r, c)] * dt;
        }
    }
}

/// Add `source * dt` to the density on interior fluid cells.
pub fn source_smoke(
    density: &mut ScalarField,
    source: &ScalarField,
    mask: &ObstacleMask,
    dt: f32,
) {
    let (rows, cols) = density.shape();

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            if !mask.is_solid(r, c) {
                density[(r, c)] += source[(r, c)] * dt;
            }
        }
    }
}
