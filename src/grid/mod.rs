//! Region descriptor and in-memory elevation raster.
//!
//! A [`Region`] ties map-unit bounds to a discrete row/column grid; a
//! [`Grid`] stores one `f64` value per cell in row-major order. Cells with
//! no defined elevation hold `NaN` and pass through every transform
//! untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing a [`Region`].
#[derive(Error, Debug)]
pub enum RegionError {
    #[error("north ({north}) must exceed south ({south})")]
    EmptyNorthSouth { north: f64, south: f64 },
    #[error("east ({east}) must exceed west ({west})")]
    EmptyEastWest { east: f64, west: f64 },
    #[error("cell size must be positive and finite, got {0}")]
    BadCellSize(f64),
    #[error("bounds span {span_rows}x{span_cols} cells but {rows}x{cols} were requested")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        span_rows: usize,
        span_cols: usize,
    },
}

/// A rectangular computational region: map-unit bounds plus the derived
/// row/column dimensions at a fixed cell size.
///
/// Rows run north to south, columns west to east. Never mutated after
/// creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f64,
}

impl Region {
    /// Creates a region from bounds and a cell size, deriving rows/cols.
    ///
    /// The bounds must span a whole number of cells (to within half a cell,
    /// matching how the external grid accessor rounds its region).
    pub fn new(
        north: f64,
        south: f64,
        east: f64,
        west: f64,
        cell_size: f64,
    ) -> Result<Self, RegionError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RegionError::BadCellSize(cell_size));
        }
        if north <= south {
            return Err(RegionError::EmptyNorthSouth { north, south });
        }
        if east <= west {
            return Err(RegionError::EmptyEastWest { east, west });
        }

        let rows = ((north - south) / cell_size).round() as usize;
        let cols = ((east - west) / cell_size).round() as usize;

        Ok(Self {
            north,
            south,
            east,
            west,
            rows: rows.max(1),
            cols: cols.max(1),
            cell_size,
        })
    }

    /// Creates a region with explicit dimensions, validating that the bounds
    /// agree with them at the given cell size.
    pub fn with_dimensions(
        north: f64,
        south: f64,
        east: f64,
        west: f64,
        rows: usize,
        cols: usize,
        cell_size: f64,
    ) -> Result<Self, RegionError> {
        let region = Self::new(north, south, east, west, cell_size)?;
        if region.rows != rows || region.cols != cols {
            return Err(RegionError::DimensionMismatch {
                rows,
                cols,
                span_rows: region.rows,
                span_cols: region.cols,
            });
        }
        Ok(region)
    }

    /// Map coordinates of a cell center.
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        debug_assert!(row < self.rows && col < self.cols);
        let x = self.west + (col as f64 + 0.5) * self.cell_size;
        let y = self.north - (row as f64 + 0.5) * self.cell_size;
        (x, y)
    }

    /// Cell containing a map coordinate, or `None` if outside the region.
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if x < self.west || x >= self.east || y <= self.south || y > self.north {
            return None;
        }
        let col = ((x - self.west) / self.cell_size) as usize;
        let row = ((self.north - y) / self.cell_size) as usize;
        Some((row.min(self.rows - 1), col.min(self.cols - 1)))
    }

    /// Nearest in-region cell to a map coordinate.
    ///
    /// Coordinates outside the region clamp to the boundary cell, which is
    /// how relative-datum seeds just beyond the edge pick up a base
    /// elevation.
    pub fn locate_clamped(&self, x: f64, y: f64) -> (usize, usize) {
        let col = ((x - self.west) / self.cell_size).floor();
        let row = ((self.north - y) / self.cell_size).floor();
        let col = col.clamp(0.0, (self.cols - 1) as f64) as usize;
        let row = row.clamp(0.0, (self.rows - 1) as f64) as usize;
        (row, col)
    }

    /// Area of one cell in square map units.
    pub fn cell_area(&self) -> f64 {
        self.cell_size * self.cell_size
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// A row-major raster of `f64` values.
///
/// Out-of-range access is a programming error: indexing panics rather than
/// returning a runtime result, mirroring the external accessor contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Grid {
    /// Creates a grid filled with zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::constant(rows, cols, 0.0)
    }

    /// Creates a grid filled with a constant value.
    pub fn constant(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            values: vec![value; rows * cols],
        }
    }

    /// Wraps an existing row-major value buffer.
    ///
    /// # Panics
    /// Panics if `values.len() != rows * cols`.
    pub fn from_values(rows: usize, cols: usize, values: Vec<f64>) -> Self {
        assert_eq!(
            values.len(),
            rows * cols,
            "value buffer length must equal rows * cols"
        );
        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at a cell.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols);
        self.values[row * self.cols + col]
    }

    /// Sets the value at a cell.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        self.values[row * self.cols + col] = value;
    }

    /// The underlying row-major buffer.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Copies a sub-rectangle buffer into this grid.
    ///
    /// `block` is row-major with `block_cols` columns, placed with its
    /// top-left corner at `(row0, col0)`.
    pub fn write_block(&mut self, row0: usize, col0: usize, block_cols: usize, block: &[f64]) {
        debug_assert!(block.len() % block_cols == 0);
        let block_rows = block.len() / block_cols;
        debug_assert!(row0 + block_rows <= self.rows && col0 + block_cols <= self.cols);
        for r in 0..block_rows {
            let src = r * block_cols;
            let dst = (row0 + r) * self.cols + col0;
            self.values[dst..dst + block_cols].copy_from_slice(&block[src..src + block_cols]);
        }
    }

    /// Minimum and maximum finite values, ignoring NaN cells.
    pub fn min_max(&self) -> (f64, f64) {
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for &v in &self.values {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        (min, max)
    }
}
