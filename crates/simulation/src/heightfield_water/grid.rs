//! `HeightFieldGrid`: the four parallel layers the water solver works on.
//!
//! All layers are flat row-major arrays indexed by `y * width + x`. Terrain is
//! fixed once the grid is built; water depth and the two flow accumulators are
//! owned and mutated by the water update system only.

use std::fmt;
use std::ops::Range;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{GRID_HEIGHT, GRID_WIDTH, MIN_GRID_DIM, VISIBLE_WATER_THRESHOLD};

// =============================================================================
// GridError
// =============================================================================

/// Errors raised when a host builds a grid with inconsistent inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Either dimension is too small to leave an interior inside the wall ring.
    TooSmall { width: usize, height: usize },
    /// `width * height` does not fit in `usize`.
    TooLarge { width: usize, height: usize },
    /// A supplied layer does not have `width * height` entries.
    LengthMismatch { expected: usize, found: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::TooSmall { width, height } => write!(
                f,
                "Grid {width}x{height} is too small: both dimensions must be at least {MIN_GRID_DIM}"
            ),
            GridError::TooLarge { width, height } => {
                write!(f, "Grid {width}x{height} has more cells than fit in memory")
            }
            GridError::LengthMismatch { expected, found } => {
                write!(f, "Layer length mismatch: expected {expected} cells, found {found}")
            }
        }
    }
}

impl std::error::Error for GridError {}

// =============================================================================
// GridLayers
// =============================================================================

/// Split borrow of every layer for the duration of one phase.
///
/// Terrain is handed out read-only so no phase can mutate it.
pub struct GridLayers<'a> {
    pub width: usize,
    pub height: usize,
    pub terrain: &'a [f32],
    pub water: &'a mut [f32],
    pub flow_x: &'a mut [f32],
    pub flow_y: &'a mut [f32],
}

// =============================================================================
// HeightFieldGrid resource
// =============================================================================

/// Static terrain height, dynamic water depth and the west/south face flow
/// accumulators for every cell of the map.
///
/// Deserialization goes through the same checks as
/// [`HeightFieldGrid::with_terrain`], applied to all four layers.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "HeightFieldGridRaw", into = "HeightFieldGridRaw")]
pub struct HeightFieldGrid {
    width: usize,
    height: usize,
    terrain: Vec<f32>,
    water: Vec<f32>,
    /// Flow crossing each cell's west face, from `x - 1` into `x`.
    flow_x: Vec<f32>,
    /// Flow crossing each cell's south face, from `y - 1` into `y`.
    flow_y: Vec<f32>,
}

impl Default for HeightFieldGrid {
    fn default() -> Self {
        let len = GRID_WIDTH * GRID_HEIGHT;
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            terrain: vec![0.0; len],
            water: vec![0.0; len],
            flow_x: vec![0.0; len],
            flow_y: vec![0.0; len],
        }
    }
}

/// Unchecked wire form of [`HeightFieldGrid`].
#[derive(Serialize, Deserialize)]
struct HeightFieldGridRaw {
    width: usize,
    height: usize,
    terrain: Vec<f32>,
    water: Vec<f32>,
    flow_x: Vec<f32>,
    flow_y: Vec<f32>,
}

impl TryFrom<HeightFieldGridRaw> for HeightFieldGrid {
    type Error = GridError;

    fn try_from(raw: HeightFieldGridRaw) -> Result<Self, GridError> {
        let len = cell_count(raw.width, raw.height)?;
        for layer in [&raw.terrain, &raw.water, &raw.flow_x, &raw.flow_y] {
            check_layer(layer, len)?;
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            terrain: raw.terrain,
            water: raw.water,
            flow_x: raw.flow_x,
            flow_y: raw.flow_y,
        })
    }
}

impl From<HeightFieldGrid> for HeightFieldGridRaw {
    fn from(grid: HeightFieldGrid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            terrain: grid.terrain,
            water: grid.water,
            flow_x: grid.flow_x,
            flow_y: grid.flow_y,
        }
    }
}

/// Number of cells in a `width` x `height` grid, or why no such grid exists.
fn cell_count(width: usize, height: usize) -> Result<usize, GridError> {
    if width < MIN_GRID_DIM || height < MIN_GRID_DIM {
        return Err(GridError::TooSmall { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(GridError::TooLarge { width, height })
}

fn check_layer(layer: &[f32], len: usize) -> Result<(), GridError> {
    if layer.len() != len {
        return Err(GridError::LengthMismatch {
            expected: len,
            found: layer.len(),
        });
    }
    Ok(())
}

impl HeightFieldGrid {
    /// Flat, dry grid of the given size.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        let len = cell_count(width, height)?;
        Self::with_terrain(width, height, vec![0.0; len])
    }

    /// Dry grid over a host-supplied terrain layer.
    pub fn with_terrain(width: usize, height: usize, terrain: Vec<f32>) -> Result<Self, GridError> {
        let len = cell_count(width, height)?;
        check_layer(&terrain, len)?;
        Ok(Self {
            width,
            height,
            terrain,
            water: vec![0.0; len],
            flow_x: vec![0.0; len],
            flow_y: vec![0.0; len],
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// True for cells on the outermost ring, which are never simulated.
    #[inline]
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }

    /// Columns that take part in flow computation.
    pub fn interior_x(&self) -> Range<usize> {
        1..self.width - 1
    }

    /// Rows that take part in flow computation.
    pub fn interior_y(&self) -> Range<usize> {
        1..self.height - 1
    }

    // -------------------------------------------------------------------------
    // Whole-layer access
    // -------------------------------------------------------------------------

    pub fn terrain(&self) -> &[f32] {
        &self.terrain
    }

    pub fn water(&self) -> &[f32] {
        &self.water
    }

    pub fn water_mut(&mut self) -> &mut [f32] {
        &mut self.water
    }

    pub fn flow_x(&self) -> &[f32] {
        &self.flow_x
    }

    pub fn flow_y(&self) -> &[f32] {
        &self.flow_y
    }

    pub fn layers_mut(&mut self) -> GridLayers<'_> {
        GridLayers {
            width: self.width,
            height: self.height,
            terrain: &self.terrain,
            water: &mut self.water,
            flow_x: &mut self.flow_x,
            flow_y: &mut self.flow_y,
        }
    }

    // -------------------------------------------------------------------------
    // Per-cell access
    // -------------------------------------------------------------------------

    #[inline]
    pub fn get_terrain(&self, x: usize, y: usize) -> f32 {
        self.terrain[self.index(x, y)]
    }

    #[inline]
    pub fn get_water(&self, x: usize, y: usize) -> f32 {
        self.water[self.index(x, y)]
    }

    /// Set a cell's water depth. Negative depths are stored as zero.
    #[inline]
    pub fn set_water(&mut self, x: usize, y: usize, depth: f32) {
        let idx = self.index(x, y);
        self.water[idx] = depth.max(0.0);
    }

    #[inline]
    pub fn add_water(&mut self, x: usize, y: usize, depth: f32) {
        let idx = self.index(x, y);
        self.water[idx] = (self.water[idx] + depth).max(0.0);
    }

    #[inline]
    pub fn get_flow_x(&self, x: usize, y: usize) -> f32 {
        self.flow_x[self.index(x, y)]
    }

    #[inline]
    pub fn get_flow_y(&self, x: usize, y: usize) -> f32 {
        self.flow_y[self.index(x, y)]
    }

    /// Clear both flow accumulators, dropping all flow inertia.
    pub fn reset_flow(&mut self) {
        self.flow_x.iter_mut().for_each(|f| *f = 0.0);
        self.flow_y.iter_mut().for_each(|f| *f = 0.0);
    }

    /// Remove all water and flow. Terrain is kept.
    pub fn clear_water(&mut self) {
        self.water.iter_mut().for_each(|d| *d = 0.0);
        self.reset_flow();
    }

    // -------------------------------------------------------------------------
    // Aggregates
    // -------------------------------------------------------------------------

    /// Sum of water depth over every cell, edge ring included.
    pub fn total_volume(&self) -> f64 {
        sum_volume(&self.water)
    }

    /// Cells holding more water than `noise_threshold`, edge ring included.
    pub fn active_cells(&self, noise_threshold: f32) -> usize {
        count_active(&self.water, noise_threshold)
    }

    pub fn max_depth(&self) -> f32 {
        self.water.iter().copied().fold(0.0, f32::max)
    }

    // -------------------------------------------------------------------------
    // Consumer queries (read between ticks)
    // -------------------------------------------------------------------------

    /// Height of the water surface: terrain plus water depth.
    #[inline]
    pub fn surface_height(&self, x: usize, y: usize) -> f32 {
        let idx = self.index(x, y);
        self.terrain[idx] + self.water[idx]
    }

    /// Whether a renderer should draw a water surface at this cell.
    ///
    /// Checks the cell and its diagonal neighbours against
    /// [`VISIBLE_WATER_THRESHOLD`], so the surface does not pop in one cell late
    /// along a spreading front.
    pub fn has_visible_water(&self, x: usize, y: usize) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        if self.get_water(x, y) > VISIBLE_WATER_THRESHOLD {
            return true;
        }
        const DIAGONALS: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];
        DIAGONALS.iter().any(|&(dx, dy)| {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            nx >= 0
                && ny >= 0
                && self.in_bounds(nx as usize, ny as usize)
                && self.get_water(nx as usize, ny as usize) > VISIBLE_WATER_THRESHOLD
        })
    }
}

#[inline]
pub(crate) fn sum_volume(water: &[f32]) -> f64 {
    water.iter().map(|&d| d as f64).sum()
}

#[inline]
pub(crate) fn count_active(water: &[f32], noise_threshold: f32) -> usize {
    water.iter().filter(|&&d| d > noise_threshold).count()
}

// =============================================================================
// Tests
// =============================================================================
