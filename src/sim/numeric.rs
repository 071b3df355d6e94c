// Numeric approximations

use crate::sim::{
    field::{ScalarField, VectorField},
    obstacle::ObstacleMask,
};

/// Grid spacing used by the pressure terms, `h = 1 / rows`.
pub fn grid_spacing(field: &ScalarField) -> f32 {
    1. / field.rows() as f32
}

/// Compute the divergence of the velocity field on interior fluid cells.
///
/// Mathematically, this is the central difference
/// `0.5 * h * (u[r][c+1] - u[r][c-1] + v[r+1][c] - v[r-1][c])`.
/// Boundary and solid cells are left at zero.
///
/// Parameters:
/// - `field` - The velocity `[u, v]`
/// - `mask` - Cells to exclude
///
/// Returns:
///     A `ScalarField` of the divergence.
pub fn divergence(field: &VectorField, mask: &ObstacleMask) -> ScalarField {
    let (u, v) = (&field[0], &field[1]);
    let (rows, cols) = u.shape();
    let h = grid_spacing(u);

    let mut div = ScalarField::new(rows, cols);

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            if mask.is_solid(r, c) {
                continue;
            }
            div[(r, c)] =
                0.5 * h * (u[(r, c + 1)] - u[(r, c - 1)] + v[(r + 1, c)] - v[(r - 1, c)]);
        }
    }

    div
}

/// Mean absolute divergence over the interior fluid cells. Zero for a
/// grid with no interior fluid.
pub fn mean_abs_divergence(field: &VectorField, mask: &ObstacleMask) -> f32 {
    let div = divergence(field, mask);
    let (rows, cols) = div.shape();

    let mut total = 0.;
    let mut count = 0usize;
    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            if !mask.is_solid(r, c) {
                total += div[(r, c)].abs();
                count += 1;
            }
        }
    }

    if count == 0 { 0. } else { total / count as f32 }
}

/// Per-cell magnitude `sqrt(u² + v²)`.
pub fn velocity_magnitude(field: &VectorField) -> ScalarField {
    let (u, v) = (&field[0], &field[1]);
    ScalarField::from_fn(u.rows(), u.cols(), |r, c| {
        (u[(r, c)].powi(2) + v[(r, c)].powi(2)).sqrt()
    })
}

/// Bilinearly interpolate `field` at fractional `(x, y)` = (row, col).
///
/// The caller must keep `x` in `[0, rows - 1)` and `y` in `[0, cols - 1)` so
/// that the 2x2 stencil stays inside the grid.
pub fn bilinear(field: &ScalarField, x: f32, y: f32) -> f32 {
    let (x0, y0) = (x.floor() as usize, y.floor() as usize);
    let (x1, y1) = (x0 + 1, y0 + 1);

    let s1 = x - x0 as f32;
    let t1 = y - y0 as f32;
    let (s0, t0) = (1. - s1, 1. - t1);

    s0 * (t0 * field[(x0, y0)] + t1 * field[(x0, y1)])
        + s1 * (t0 * field[(x1, y0)] + t1 * field[(x1, y1)])
}

#[cfg(test)]
mod tests {
    use na::{DMatrix, dmatrix};

    use super::*;

    #[test]
    fn test_divergence() {
        // u varies along columns, v along rows
        let u = ScalarField::from_fn(4, 4, |_, c| (c * c) as f32);
        let v = ScalarField::from_fn(4, 4, |r, _| 2. * r as f32);
        let field = [u, v];
        let mask = ObstacleMask::new(4, 4);

        let div = divergence(&field, &mask);

        // h = 0.25; interior (r, 1): u diff = 4 - 0 = 4, v diff = 4 -> 0.125 * 8
        // interior (r, 2): u diff = 9 - 1 = 8, v diff = 4 -> 0.125 * 12
        let expected: DMatrix<f32> = dmatrix![
            0., 0.,  0.,  0.;
            0., 1., 1.5,  0.;
            0., 1., 1.5,  0.;
            0., 0.,  0.,  0.;
        ];

        assert_eq!(div.to_matrix(), expected);
    }

    #[test]
    fn test_divergence_skips_solids() {
        let u = ScalarField::from_fn(5, 5, |_, c| c as f32);
        let v = ScalarField::new(5, 5);
        let mask = ObstacleMask::from_fn(5, 5, |r, c| (r, c) == (2, 2));

        let div = divergence(&[u, v], &mask);

        assert_eq!(div[(2, 2)], 0.);
        assert_eq!(div[(2, 1)], 0.5 * 0.2 * 2.);
    }

    #[test]
    fn test_mean_abs_divergence_of_uniform_flow() {
        let u = ScalarField::from_element(6, 6, 3.);
        let v = ScalarField::from_element(6, 6, -1.);
        let mask = ObstacleMask::new(6, 6);

        assert_eq!(mean_abs_divergence(&[u, v], &mask), 0.);
    }

    #[test]
    fn test_velocity_magnitude() {
        let u = ScalarField::from_element(3, 3, 3.);
        let v = ScalarField::from_element(3, 3, -4.);

        let mag = velocity_magnitude(&[u, v]);
        assert!(mag.to_matrix().iter().all(|m| *m == 5.));
    }

    #[test]
    fn test_bilinear() {
        let field = ScalarField::from_fn(3, 3, |r, c| (10 * r + c) as f32);

        // exact at lattice points
        assert_eq!(bilinear(&field, 1., 1.), 11.);

        // the field is linear, so interpolation is exact
        assert!((bilinear(&field, 0.5, 1.25) - 6.25).abs() < 1e-6);
        assert!((bilinear(&field, 1.75, 0.5) - 18.).abs() < 1e-6);
    }
}
