// Pressure projection with a Jacobi Poisson solver

use crate::sim::{
    field::{ScalarField, VectorField},
    numeric::{self, grid_spacing},
    obstacle::ObstacleMask,
};

/// Number of Jacobi sweeps per pressure solve
pub const PRESSURE_ITERATIONS: usize = 20;

/// Iteratively relax the pressure Poisson equation `∇²p = div` with Jacobi sweeps,
/// `p'[r][c] = 0.25 * (p[r+1][c] + p[r-1][c] + p[r][c+1] + p[r][c-1] - div[r][c])`.
///
/// The solve warm-starts from the current `pressure`. Boundary and solid cells
/// are never solved and keep whatever value they held.
///
/// Parameters
/// - `pressure` - The pressure field, updated in place
/// - `divergence` - The right-hand side
/// - `mask` - Solid cells to exclude from the solve
pub fn poisson_solve(pressure: &mut ScalarField, divergence: &ScalarField, mask: &ObstacleMask) {
    let (rows, cols) = pressure.shape();
    let mut next = ScalarField::new(rows, cols);

    for _ in 0..PRESSURE_ITERATIONS {
        for r in 1..(rows - 1) {
            for c in 1..(cols - 1) {
                if mask.is_solid(r, c) {
                    continue;
                }
                next[(r, c)] = 0.25
                    * (pressure[(r + 1, c)] + pressure[(r - 1, c)] + pressure[(r, c + 1)]
                        + pressure[(r, c - 1)]
                        - divergence[(r, c)]);
            }
        }

        for r in 1..(rows - 1) {
            for c in 1..(cols - 1) {
                if !mask.is_solid(r, c) {
                    pressure[(r, c)] = next[(r, c)];
                }
            }
        }
    }
}

/// Subtract the central-difference pressure gradient from the velocity on
/// interior fluid cells.
pub fn subtract_gradient(u: &mut VectorField, pressure: &ScalarField, mask: &ObstacleMask) {
    let (rows, cols) = pressure.shape();
    let h = grid_spacing(pressure);

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            if mask.is_solid(r, c) {
                continue;
            }
            u[0][(r, c)] -= 0.5 * h * (pressure[(r, c + 1)] - pressure[(r, c - 1)]);
            u[1][(r, c)] -= 0.5 * h * (pressure[(r + 1, c)] - pressure[(r - 1, c)]);
        }
    }
}

/// Reduce the divergence of `u`: compute the divergence, relax the pressure
/// against it, then correct the velocity with the pressure gradient.
pub fn project(pressure: &mut ScalarField, u: &mut VectorField, mask: &ObstacleMask) {
    let divergence = numeric::divergence(u, mask);
    poisson_solve(pressure, &divergence, mask);
    subtract_gradient(u, pressure, mask);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::numeric::mean_abs_divergence;

    /// A smooth radial source centred in the grid.
    fn gaussian_source(n: usize) -> VectorField {
        let center = n as f32 / 2.;
        let weight = |r: usize, c: usize| {
            let (dy, dx) = (r as f32 - center, c as f32 - center);
            (-(dy * dy + dx * dx) / 8.).exp()
        };

        [
            ScalarField::from_fn(n, n, |r, c| (c as f32 - center) * weight(r, c)),
            ScalarField::from_fn(n, n, |r, c| (r as f32 - center) * weight(r, c)),
        ]
    }

    #[test]
    fn test_projection_reduces_divergence() {
        let mut u = gaussian_source(16);
        let mut p = ScalarField::new(16, 16);
        let mask = ObstacleMask::new(16, 16);

        let before = mean_abs_divergence(&u, &mask);
        assert!(before > 0.);

        project(&mut p, &mut u, &mask);

        let after = mean_abs_divergence(&u, &mask);
        assert!(after < before, "divergence grew from {before} to {after}");
    }

    #[test]
    fn test_divergence_free_flow_untouched() {
        let mut u = [
            ScalarField::from_element(8, 8, 1.5),
            ScalarField::from_element(8, 8, -2.),
        ];
        let mut p = ScalarField::new(8, 8);
        let mask = ObstacleMask::new(8, 8);

        project(&mut p, &mut u, &mask);

        assert!(p.to_matrix().iter().all(|x| *x == 0.));
        assert!(u[0].to_matrix().iter().all(|x| *x == 1.5));
    }

    #[test]
    fn test_solve_skips_solid_and_boundary() {
        let mut p = ScalarField::from_element(7, 7, 2.);
        let div = ScalarField::from_element(7, 7, 1.);
        let mask = ObstacleMask::from_fn(7, 7, |r, c| (r, c) == (3, 3));

        poisson_solve(&mut p, &div, &mask);

        assert_eq!(p[(3, 3)], 2.);
        assert_eq!(p[(0, 4)], 2.);
        assert_eq!(p[(6, 6)], 2.);
        assert!(p[(2, 2)] < 2.);
    }

    #[test]
    fn test_solve_is_repeated_sweeps() {
        let mut p = ScalarField::from_fn(5, 5, |r, c| (r + 2 * c) as f32);
        let div = ScalarField::from_element(5, 5, 0.4);
        let mask = ObstacleMask::new(5, 5);

        let mut reference = p.clone();
        for _ in 0..PRESSURE_ITERATIONS {
            let prev = reference.clone();
            for r in 1..4 {
                for c in 1..4 {
                    reference[(r, c)] = 0.25
                        * (prev[(r + 1, c)] + prev[(r - 1, c)] + prev[(r, c + 1)]
                            + prev[(r, c - 1)]
                            - div[(r, c)]);
                }
            }
        }

        poisson_solve(&mut p, &div, &mask);
        assert_eq!(p, reference);
    }

    #[test]
    fn test_gradient_correction() {
        // pressure rising along the columns pushes u down, along the rows pushes v down
        let pressure = ScalarField::from_fn(5, 5, |r, c| (c + 3 * r) as f32);
        let mut u = [ScalarField::new(5, 5), ScalarField::new(5, 5)];
        let mask = ObstacleMask::new(5, 5);

        subtract_gradient(&mut u, &pressure, &mask);

        // h = 0.2: du = -0.1 * 2, dv = -0.1 * 6
        assert!((u[0][(2, 2)] + 0.2).abs() < 1e-6);
        assert!((u[1][(2, 2)] + 0.6).abs() < 1e-6);
        assert_eq!(u[0][(0, 2)], 0.);
    }
}
