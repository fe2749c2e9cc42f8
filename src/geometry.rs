//! Grid geometry: cell sizes, cell rectangles and circular-clipped bounds.
//!
//! All sizes come from floor division of the image dimensions, so the last
//! row and column may leave remainder pixels uncovered. Whether those pixels
//! are dropped or absorbed into the trailing cells is chosen explicitly with
//! [`RemainderPolicy`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};

/// Half-open pixel rectangle `[left, right) × [top, bottom)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CellRect {
    /// Create a new rectangle from edges.
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// `true` when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Check if this rectangle contains a pixel.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Calculate the intersection of two rectangles.
    pub fn intersect(&self, other: CellRect) -> Option<CellRect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(CellRect::new(left, top, right, bottom))
        } else {
            None
        }
    }
}

/// What happens to pixels left over by floor division.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Trailing remainder pixels belong to no cell.
    #[default]
    Drop,
    /// The last row and column extend to the image edge.
    Absorb,
}

/// How each cell is cut out of the source image.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum CropMode {
    /// The plain grid rectangle.
    #[default]
    Rectangular,
    /// A square around the cell center, sized from the inscribed circle and
    /// clipped to the image.
    CircularClipped {
        /// Circle radius as a fraction of the smaller cell side, in `(0, 1]`.
        radius_ratio: f64,
    },
}

impl CropMode {
    /// Reject radius ratios outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Rectangular => Ok(()),
            Self::CircularClipped { radius_ratio } => {
                if radius_ratio > 0.0 && radius_ratio <= 1.0 {
                    Ok(())
                } else {
                    Err(SplitError::Config(format!(
                        "radius ratio must be in (0, 1], got {radius_ratio}"
                    )))
                }
            }
        }
    }

    /// Radius ratio when circles are in use.
    pub fn radius_ratio(&self) -> Option<f64> {
        match *self {
            Self::Rectangular => None,
            Self::CircularClipped { radius_ratio } => Some(radius_ratio),
        }
    }
}

/// A rows × cols grid laid over an image of known size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    width: u32,
    height: u32,
    rows: u32,
    cols: u32,
    row_height: u32,
    col_width: u32,
}

impl GridSpec {
    /// Build a grid for a `width × height` image.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Config`] when `rows` or `cols` is zero, or when
    /// the grid is finer than the image so that cells would be empty.
    pub fn new(width: u32, height: u32, rows: u32, cols: u32) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(SplitError::Config(format!(
                "rows and cols must be positive, got {rows}x{cols}"
            )));
        }
        let row_height = height / rows;
        let col_width = width / cols;
        if row_height == 0 || col_width == 0 {
            return Err(SplitError::Config(format!(
                "a {rows}x{cols} grid does not fit a {width}x{height} image"
            )));
        }
        Ok(Self {
            width,
            height,
            rows,
            cols,
            row_height,
            col_width,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    pub fn col_width(&self) -> u32 {
        self.col_width
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// All `(row, col)` pairs in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + use<> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }

    /// Y coordinates of the interior horizontal cut lines.
    pub fn row_boundaries(&self) -> impl Iterator<Item = u32> + use<> {
        let step = self.row_height;
        (1..self.rows).map(move |i| i * step)
    }

    /// X coordinates of the interior vertical cut lines.
    pub fn col_boundaries(&self) -> impl Iterator<Item = u32> + use<> {
        let step = self.col_width;
        (1..self.cols).map(move |j| j * step)
    }

    /// Grid rectangle of a cell.
    pub fn cell_rect(&self, row: u32, col: u32, policy: RemainderPolicy) -> CellRect {
        let top = row * self.row_height;
        let left = col * self.col_width;
        let mut bottom = top + self.row_height;
        let mut right = left + self.col_width;
        if policy == RemainderPolicy::Absorb {
            if row + 1 == self.rows {
                bottom = self.height;
            }
            if col + 1 == self.cols {
                right = self.width;
            }
        }
        CellRect::new(left, top, right, bottom)
    }

    /// Center pixel of a cell, `(x, y)`.
    pub fn cell_center(&self, row: u32, col: u32) -> (u32, u32) {
        (
            col * self.col_width + self.col_width / 2,
            row * self.row_height + self.row_height / 2,
        )
    }

    /// Circle radius for a ratio of the smaller cell side, floored.
    pub fn radius(&self, ratio: f64) -> u32 {
        let side = self.row_height.min(self.col_width) as f64;
        (side * ratio).floor().max(0.0) as u32
    }

    /// Square around the cell center with half-side `radius`, clamped to the
    /// image.
    pub fn circle_bounds(&self, row: u32, col: u32, radius: u32) -> CellRect {
        let (cx, cy) = self.cell_center(row, col);
        CellRect::new(
            cx.saturating_sub(radius),
            cy.saturating_sub(radius),
            cx.saturating_add(radius).min(self.width),
            cy.saturating_add(radius).min(self.height),
        )
    }

    /// Crop bounds of a cell for the given mode.
    pub fn bounds(&self, row: u32, col: u32, mode: CropMode, policy: RemainderPolicy) -> CellRect {
        match mode {
            CropMode::Rectangular => self.cell_rect(row, col, policy),
            CropMode::CircularClipped { radius_ratio } => {
                self.circle_bounds(row, col, self.radius(radius_ratio))
            }
        }
    }
}
