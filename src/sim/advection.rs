// Semi-Lagrangian transport

use crate::sim::{
    field::{ScalarField, VectorField},
    numeric::bilinear,
    obstacle::ObstacleMask,
};

/// Trace cell `(r, c)` backwards through `velocity` for `dt`, clamped so the
/// 2x2 interpolation stencil around the origin stays on the grid.
///
/// Returns the fractional `(row, col)` origin, each in `[0.5, dim - 1.5]`.
pub fn backtrace(velocity: &VectorField, r: usize, c: usize, dt: f32) -> (f32, f32) {
    let (rows, cols) = velocity[0].shape();

    let x = r as f32 - dt * velocity[0][(r, c)];
    let y = c as f32 - dt * velocity[1][(r, c)];

    (
        x.max(0.5).min(rows as f32 - 1.5),
        y.max(0.5).min(cols as f32 - 1.5),
    )
}

/// Advect `field` along `velocity` over one timestep.
///
/// Each interior fluid cell samples `field` at its backtraced origin. The
/// result is then committed to every fluid cell of the grid, including the
/// outer ring, which was never sampled and therefore reads zero. Every call
/// thus resets the non-solid boundary ring to zero, acting as a zero-value
/// wall for velocity and smoke alike. Solid cells are not touched.
///
/// Parameters:
/// - `velocity` - The velocity `[u, v]` to trace through; must not alias `field`
/// - `field` - The quantity to transport, updated in place
/// - `mask` - Solid cells
/// - `dt` - The timestep
pub fn advect(velocity: &VectorField, field: &mut ScalarField, mask: &ObstacleMask, dt: f32) {
    let (rows, cols) = field.shape();

    let mut advected = ScalarField::new(rows, cols);

    for r in 1..(rows - 1) {
        for c in 1..(cols - 1) {
            if mask.is_solid(r, c) {
                continue;
            }
            let (x, y) = backtrace(velocity, r, c, dt);
            advected[(r, c)] = bilinear(field, x, y);
        }
    }

    for r in 0..rows {
        for c in 0..cols {
            if !mask.is_solid(r, c) {
                field[(r, c)] = advected[(r, c)];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn still(rows: usize, cols: usize) -> VectorField {
        [ScalarField::new(rows, cols), ScalarField::new(rows, cols)]
    }

    #[test]
    fn test_backtrace_clamped() {
        let velocity = [
            ScalarField::from_element(10, 12, 100.),
            ScalarField::from_element(10, 12, -100.),
        ];

        let (x, y) = backtrace(&velocity, 5, 5, 1.);
        assert_eq!((x, y), (0.5, 10.5));

        let mut rng = rand::rng();
        let velocity = [
            ScalarField::from_fn(10, 12, |_, _| rng.random_range(-50.0..50.0)),
            ScalarField::from_fn(10, 12, |_, _| rng.random_range(-50.0..50.0)),
        ];
        for r in 1..9 {
            for c in 1..11 {
                let (x, y) = backtrace(&velocity, r, c, 0.5);
                assert!((0.5..=8.5).contains(&x));
                assert!((0.5..=10.5).contains(&y));
            }
        }
    }

    #[test]
    fn test_still_fluid_is_identity_on_interior() {
        let mut rng = rand::rng();
        let original = ScalarField::from_fn(8, 8, |_, _| rng.random_range(0.0..1.0));
        let mut field = original.clone();

        advect(&still(8, 8), &mut field, &ObstacleMask::new(8, 8), 0.5);

        for r in 1..7 {
            for c in 1..7 {
                assert_eq!(field[(r, c)], original[(r, c)]);
            }
        }
    }

    #[test]
    fn test_boundary_ring_reset_to_zero() {
        let mut field = ScalarField::from_element(6, 6, 3.);
        let mask = ObstacleMask::from_fn(6, 6, |r, c| (r, c) == (0, 0));

        advect(&still(6, 6), &mut field, &mask, 1.);

        assert_eq!(field[(0, 3)], 0.);
        assert_eq!(field[(5, 5)], 0.);
        assert_eq!(field[(3, 0)], 0.);
        // solid corner keeps its value
        assert_eq!(field[(0, 0)], 3.);
        assert_eq!(field[(3, 3)], 3.);
    }

    #[test]
    fn test_uniform_shift() {
        // one cell per timestep along the columns
        let velocity = [
            ScalarField::new(6, 8),
            ScalarField::from_element(6, 8, 1.),
        ];
        let mut field = ScalarField::from_fn(6, 8, |_, c| c as f32);

        advect(&velocity, &mut field, &ObstacleMask::new(6, 8), 1.);

        assert_eq!(field[(2, 3)], 2.);
        assert_eq!(field[(2, 6)], 5.);
        // (2, 1) traces to column 0, clamped to 0.5
        assert_eq!(field[(2, 1)], 0.5);
    }

    #[test]
    fn test_solid_cells_frozen() {
        let mut field = ScalarField::from_fn(7, 7, |r, c| (r * 7 + c) as f32);
        let velocity = [
            ScalarField::from_element(7, 7, 0.7),
            ScalarField::from_element(7, 7, -1.3),
        ];
        let mask = ObstacleMask::from_fn(7, 7, |r, c| (2..4).contains(&r) && (2..5).contains(&c));

        advect(&velocity, &mut field, &mask, 0.5);

        for r in 2..4 {
            for c in 2..5 {
                assert_eq!(field[(r, c)], (r * 7 + c) as f32);
            }
        }
    }
}
