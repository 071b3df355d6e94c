// Dense scalar grid storage

use std::ops::{Index, IndexMut};

use na::DMatrix;

/// A fixed-size `rows x cols` scalar field, stored flat in row-major order.
///
/// All fields of one simulation share the same shape, so `(row, col)`
/// names the same physical cell across every buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

/// A velocity-like pair of fields; `[0]` is the row-direction component (u)
/// and `[1]` the column-direction component (v).
pub type VectorField = [ScalarField; 2];

impl ScalarField {
    /// Create a field filled with zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_element(rows, cols, 0.)
    }

    /// Create a field where every cell holds `value`.
    ///
    /// Panics if the grid has no interior (fewer than 3 rows or columns).
    pub fn from_element(rows: usize, cols: usize, value: f32) -> Self {
        assert!(rows >= 3, "rows must be >= 3");
        assert!(cols >= 3, "cols must be >= 3");

        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Create a field by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut field = Self::new(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                field[(r, c)] = f(r, c);
            }
        }
        field
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Flat index of `(row, col)`.
    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }

    /// Overwrite this field with the contents of `other` without reallocating.
    pub fn copy_from(&mut self, other: &ScalarField) {
        assert_eq!(self.shape(), other.shape(), "field shapes differ");
        self.data.copy_from_slice(&other.data);
    }

    /// Largest value in the field, or `f32::NEG_INFINITY` if every value is NaN.
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Copy into a `DMatrix` for consumers outside the solver.
    pub fn to_matrix(&self) -> DMatrix<f32> {
        DMatrix::from_row_slice(self.rows, self.cols, &self.data)
    }
}

impl Index<(usize, usize)> for ScalarField {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.data[self.idx(row, col)]
    }
}

impl IndexMut<(usize, usize)> for ScalarField {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        let k = self.idx(row, col);
        &mut self.data[k]
    }
}
