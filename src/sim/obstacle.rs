// Static solid geometry

use std::{fmt, str::FromStr};

use na::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The obstacle shapes that can be stamped into the grid center.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleShape {
    Rectangle,
    #[serde(alias = "circle")]
    Disk,
    Diagonal,
}

impl FromStr for ObstacleShape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rectangle" => Ok(ObstacleShape::Rectangle),
            "disk" | "circle" => Ok(ObstacleShape::Disk),
            "diagonal" => Ok(ObstacleShape::Diagonal),
            _ => Err(ConfigError::UnknownShape(s.to_owned())),
        }
    }
}

impl fmt::Display for ObstacleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObstacleShape::Rectangle => "rectangle",
            ObstacleShape::Disk => "disk",
            ObstacleShape::Diagonal => "diagonal",
        };
        write!(f, "{name}")
    }
}

/// Sizing for [`ObstacleMask::stamp`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ShapeParams {
    /// Half side of the rectangle, radius of the disk, half length of the diagonal band
    pub size: usize,

    /// Width of the diagonal band measured perpendicular to the diagonal.
    /// Cells within `thickness / 2` of the diagonal are solid, so zero leaves
    /// a one-cell line.
    pub thickness: usize,
}

impl Default for ShapeParams {
    fn default() -> Self {
        ShapeParams {
            size: 25,
            thickness: 10,
        }
    }
}

/// Boolean solid mask; `true` cells are frozen and skipped by every kernel.
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleMask {
    rows: usize,
    cols: usize,
    data: Vec<bool>,
}

impl ObstacleMask {
    /// An empty (all-fluid) mask.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![false; rows * cols],
        }
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut mask = Self::new(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                if f(r, c) {
                    mask.set_solid(r, c);
                }
            }
        }
        mask
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_solid(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Mark a cell solid. Marking is one-way; nothing clears a solid cell.
    #[inline]
    pub fn set_solid(&mut self, row: usize, col: usize) {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] = true;
    }

    pub fn solid_count(&self) -> usize {
        self.data.iter().filter(|s| **s).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// Mark every cell in `rows x cols` (half-open, signed) solid, clipped to the grid.
    fn stamp_span(&mut self, rows: (isize, isize), cols: (isize, isize)) {
        let r0 = rows.0.clamp(0, self.rows as isize) as usize;
        let r1 = rows.1.clamp(0, self.rows as isize) as usize;
        let c0 = cols.0.clamp(0, self.cols as isize) as usize;
        let c1 = cols.1.clamp(0, self.cols as isize) as usize;

        for r in r0..r1 {
            for c in c0..c1 {
                self.set_solid(r, c);
            }
        }
    }

    /// Stamp `shape` around the grid center. Only ever sets cells solid, so
    /// stamping the same shape again leaves the mask unchanged. Loops only
    /// visit rows and columns that exist, whatever the requested size.
    pub fn stamp(&mut self, shape: ObstacleShape, params: ShapeParams) {
        let (rows, cols) = (self.rows as isize, self.cols as isize);
        let (cy, cx) = (rows / 2, cols / 2);
        let size = isize::try_from(params.size).unwrap_or(isize::MAX);

        match shape {
            ObstacleShape::Rectangle => {
                self.stamp_span(
                    (cy.saturating_sub(size), cy.saturating_add(size)),
                    (cx.saturating_sub(size), cx.saturating_add(size)),
                );
            }
            ObstacleShape::Disk => {
                let radius = params.size as f64;
                for dy in (-size).max(-cy)..size.min(rows - cy) {
                    let half = (radius * radius - (dy * dy) as f64).sqrt().floor().min(cols as f64);
                    let half = half as isize;
                    self.stamp_span((cy + dy, cy + dy + 1), (cx - half, cx + half));
                }
            }
            ObstacleShape::Diagonal => {
                // offsets o = row - col with |o| / sqrt(2) <= thickness / 2
                let reach = (params.thickness as f64 / std::f64::consts::SQRT_2).floor();
                let reach = reach.min(rows.max(cols) as f64) as isize;

                let center = cy.min(cx);
                let k0 = center.saturating_sub(size).max(0);
                let k1 = center.saturating_add(size).min(cols);
                for k in k0..k1 {
                    self.stamp_span((k - reach, k + reach + 1), (k, k + 1));
                }
            }
        }
    }

    /// Merge another mask of the same shape into this one.
    pub fn union(&mut self, other: &ObstacleMask) -> Result<(), ConfigError> {
        if self.shape() != other.shape() {
            return Err(ConfigError::MaskShape {
                expected: self.shape(),
                found: other.shape(),
            });
        }

        for (dst, src) in self.data.iter_mut().zip(other.data.iter()) {
            *dst |= *src;
        }

        Ok(())
    }

    pub fn to_matrix(&self) -> DMatrix<bool> {
        DMatrix::from_row_slice(self.rows, self.cols, &self.data)
    }
}
