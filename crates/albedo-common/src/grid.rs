//! Raster grid geometry and cell storage.

use std::ops::Range;

use crate::error::{AlbedoError, AlbedoResult};
use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Specification of a north-up raster with square cells.
///
/// `origin_x`/`origin_y` are the outer top-left corner of cell (0, 0). Rows
/// grow southward, columns grow eastward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of columns
    pub nx: usize,
    /// Number of rows
    pub ny: usize,
    /// Side length of one cell in map units (e.g. 500 m for the snow products)
    pub cell_size: f64,
    /// X of the grid's west edge
    pub origin_x: f64,
    /// Y of the grid's north edge
    pub origin_y: f64,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(nx: usize, ny: usize, cell_size: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            nx,
            ny,
            cell_size,
            origin_x,
            origin_y,
        }
    }

    /// Reject empty grids and non-positive or non-finite geometry.
    pub fn validate(&self) -> AlbedoResult<()> {
        if self.is_empty() {
            return Err(AlbedoError::InvalidGrid(format!(
                "grid must have at least one cell, got {}x{}",
                self.nx, self.ny
            )));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(AlbedoError::InvalidGrid(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if !(self.origin_x.is_finite() && self.origin_y.is_finite()) {
            return Err(AlbedoError::InvalidGrid("origin must be finite".to_string()));
        }
        Ok(())
    }

    /// Calculate the outer bounding box of this grid.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            min_x: self.origin_x,
            min_y: self.origin_y - self.ny as f64 * self.cell_size,
            max_x: self.origin_x + self.nx as f64 * self.cell_size,
            max_y: self.origin_y,
        }
    }

    /// Area of a single cell.
    pub fn cell_area(&self) -> f64 {
        self.cell_size * self.cell_size
    }

    /// Map-coordinate center of a cell.
    pub fn cell_center(&self, row: usize, col: usize) -> Option<GridPoint> {
        if row >= self.ny || col >= self.nx {
            return None;
        }

        Some(GridPoint {
            x: self.origin_x + (col as f64 + 0.5) * self.cell_size,
            y: self.origin_y - (row as f64 + 0.5) * self.cell_size,
            row,
            col,
        })
    }

    /// Square footprint of a cell: its center ± half the cell size.
    pub fn cell_footprint(&self, row: usize, col: usize) -> Option<BoundingBox> {
        self.cell_center(row, col)
            .map(|p| BoundingBox::around(p.x, p.y, self.cell_size / 2.0))
    }

    /// Convert coordinates to the index of the containing cell.
    pub fn coord_to_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let col = ((x - self.origin_x) / self.cell_size).floor();
        let row = ((self.origin_y - y) / self.cell_size).floor();

        if row < 0.0 || col < 0.0 || row >= self.ny as f64 || col >= self.nx as f64 {
            return None;
        }

        Some((row as usize, col as usize))
    }

    /// Row and column ranges of the cells whose footprints can overlap `bbox`.
    ///
    /// Returns `None` when the box misses the grid entirely.
    pub fn window(&self, bbox: &BoundingBox) -> Option<(Range<usize>, Range<usize>)> {
        let clipped = self.bbox().intersection(bbox)?;

        let col_start = ((clipped.min_x - self.origin_x) / self.cell_size).floor() as usize;
        let col_end = ((clipped.max_x - self.origin_x) / self.cell_size).ceil() as usize;
        let row_start = ((self.origin_y - clipped.max_y) / self.cell_size).floor() as usize;
        let row_end = ((self.origin_y - clipped.min_y) / self.cell_size).ceil() as usize;

        Some((
            row_start.min(self.ny)..row_end.min(self.ny),
            col_start.min(self.nx)..col_end.min(self.nx),
        ))
    }

    /// Get the 1D array index for a 2D grid position (row-major).
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.nx + col
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// A cell center with both indices and coordinates.
#[derive(Debug, Clone, Copy)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
    pub row: usize,
    pub col: usize,
}

/// Row-major cell values with a fixed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Wrap row-major data, checking that it matches the shape.
    pub fn new(width: usize, height: usize, data: Vec<T>) -> AlbedoResult<Self> {
        if data.len() != width * height {
            return Err(AlbedoError::shape_mismatch(
                "grid",
                width * height,
                data.len(),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the value at a specific cell.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col)
    }

    /// Set the value at a cell. Out-of-range writes are ignored and return false.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        self.data[row * self.width + col] = value;
        true
    }

    /// Values in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether this grid has the shape described by `spec`.
    pub fn matches(&self, spec: &GridSpec) -> bool {
        self.width == spec.nx && self.height == spec.ny && self.data.len() == spec.len()
    }
}

impl<T: Clone> Grid<T> {
    /// Grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}
