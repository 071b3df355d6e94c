use serde::{Deserialize, Serialize};

use crate::sim::obstacle::ObstacleMask;

/// Compact, JSON-friendly form of an [`ObstacleMask`] (row-major, one byte per cell).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SerialMask {
    data: Vec<u8>,
    nrows: usize,
    ncols: usize,
}

impl SerialMask {
    pub fn from_mask(mask: &ObstacleMask) -> Self {
        let (nrows, ncols) = mask.shape();

        Self {
            data: mask.as_slice().iter().map(|b| (*b) as u8).collect(),
            nrows,
            ncols,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    pub fn to_mask(&self) -> ObstacleMask {
        ObstacleMask::from_fn(self.nrows, self.ncols, |r, c| {
            self.data.get(r * self.ncols + c).is_some_and(|b| *b != 0)
        })
    }
}
