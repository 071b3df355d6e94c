// Implicit diffusion by Jacobi relaxation

use crate::sim::{field::ScalarField, obstacle::ObstacleMask};

/// Number of Jacobi sweeps per diffusion solve
pub const DIFFUSION_ITERATIONS: usize = 20;

/// Diffusion coefficient `k = dt * viscosity * rows * cols`.
///
/// Scales with the grid area rather than with `1 / h²`, so refining the
/// grid changes the effective viscosity.
pub fn diffusion_coefficient(field: &ScalarField, viscosity: f32, dt: f32) -> f32 {
    let (rows, cols) = field.shape();
    dt * viscosity * rows as f32 * cols as f32
}

/// Run a single Jacobi sweep of
/// `f'[r][c] = (f[r][c] + k * (f[r+1][c] + f[r-1][c] + f[r][c+1] + f[r][c-1])) / (1 + 4k)`
/// on interior fluid cells.
///
/// Reads only from `field`, writes into `scratch`, then commits the updated
/// cells back so no sweep ever mixes old and new values.
pub fn diffusion_sweep(field: &mut ScalarField, scratch: &mut ScalarField, mask: &ObstacleMask, k: f32) {
    let (rows, cols) = field.shape();
    let denom = 1. + 4. * k;

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            if mask.is_solid(r, c) {
                continue;
            }
            let neighbors =
                field[(r + 1, c)] + field[(r - 1, c)] + field[(r, c + 1)] + field[(r, c - 1)];
            scratch[(r, c)] = (field[(r, c)] + k * neighbors) / denom;
        }
    }

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            if !mask.is_solid(r, c) {
                field[(r, c)] = scratch[(r, c)];
            }
        }
    }
}

/// Diffuse `field` in place with a fixed number of Jacobi sweeps.
/// Boundary and solid cells keep their values.
pub fn diffuse(field: &mut ScalarField, mask: &ObstacleMask, viscosity: f32, dt: f32) {
    let k = diffusion_coefficient(field, viscosity, dt);
    let mut scratch = ScalarField::new(field.rows(), field.cols());

    for _ in 0..DIFFUSION_ITERATIONS {
        diffusion_sweep(field, &mut scratch, mask, k);
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn random_field(rows: usize, cols: usize) -> ScalarField {
        let mut rng = rand::rng();
        ScalarField::from_fn(rows, cols, |_, _| rng.random_range(-10.0..10.0))
    }

    #[test]
    fn test_coefficient_scales_with_area() {
        let field = ScalarField::new(200, 200);
        assert!((diffusion_coefficient(&field, 0.01, 0.5) - 200.).abs() < 1e-3);

        let field = ScalarField::new(100, 100);
        assert!((diffusion_coefficient(&field, 0.01, 0.5) - 50.).abs() < 1e-3);
    }

    #[test]
    fn test_sweep_maximum_principle() {
        let mask = ObstacleMask::from_fn(12, 12, |r, c| r == 5 && c > 6);

        for k in [0.1, 1., 200.] {
            let before = random_field(12, 12);
            let mut field = before.clone();
            let mut scratch = ScalarField::new(12, 12);

            diffusion_sweep(&mut field, &mut scratch, &mask, k);

            for r in 1..11 {
                for c in 1..11 {
                    if mask.is_solid(r, c) {
                        continue;
                    }
                    let stencil = [
                        before[(r, c)],
                        before[(r + 1, c)],
                        before[(r - 1, c)],
                        before[(r, c + 1)],
                        before[(r, c - 1)],
                    ];
                    let lo = stencil.iter().copied().fold(f32::INFINITY, f32::min);
                    let hi = stencil.iter().copied().fold(f32::NEG_INFINITY, f32::max);

                    assert!(field[(r, c)] >= lo - 1e-4, "({r}, {c}) below stencil min");
                    assert!(field[(r, c)] <= hi + 1e-4, "({r}, {c}) above stencil max");
                }
            }
        }
    }

    #[test]
    fn test_diffuse_bounded_and_leaves_boundary() {
        let before = random_field(16, 16);
        let lo = before.to_matrix().iter().copied().fold(f32::INFINITY, f32::min);
        let hi = before.max();

        let mask = ObstacleMask::from_fn(16, 16, |r, c| (6..9).contains(&r) && (6..9).contains(&c));
        let mut field = before.clone();

        diffuse(&mut field, &mask, 0.01, 0.5);

        for r in 0..16 {
            for c in 0..16 {
                let on_ring = r == 0 || c == 0 || r == 15 || c == 15;
                if on_ring || mask.is_solid(r, c) {
                    assert_eq!(field[(r, c)], before[(r, c)]);
                } else {
                    assert!(field[(r, c)] >= lo - 1e-4 && field[(r, c)] <= hi + 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_constant_field_unchanged() {
        let mut field = ScalarField::from_element(10, 10, 4.);
        diffuse(&mut field, &ObstacleMask::new(10, 10), 0.3, 1.);

        for value in field.to_matrix().iter() {
            assert!((value - 4.).abs() < 1e-5);
        }
    }

    #[test]
    fn test_spike_spreads_to_neighbors() {
        let mut field = ScalarField::new(9, 9);
        field[(4, 4)] = 1.;

        diffuse(&mut field, &ObstacleMask::new(9, 9), 0.01, 0.5);

        assert!(field[(4, 4)] < 1.);
        assert!(field[(3, 4)] > 0.);
        assert!((field[(3, 4)] - field[(4, 5)]).abs() < 1e-6);
    }
}
