//! Static layout helpers used when a scene is generated or resized.
//!
//! Densities are authored against a reference resolution; [`scale_factor`]
//! and [`scaled_count`] translate them to the actual [`Viewport`]. Positions
//! come from [`sample_position`] (uniform, optionally pulled toward the
//! center) or from a shuffled grid ([`shuffled_grid_cells`] +
//! [`jittered_cell_center`]) when items must not overlap.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::prng::Xorshift64;

/// Drawing-surface size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    /// Returns `EngineError::InvalidDimensions` if either side is zero or the
    /// area overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        width
            .checked_mul(height)
            .ok_or(EngineError::InvalidDimensions)?;
        Ok(Self { width, height })
    }

    /// The 1920x1080 resolution that default densities are authored against.
    pub const REFERENCE: Viewport = Viewport {
        width: 1920,
        height: 1080,
    };

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64)
    }

    pub fn center(&self) -> DVec2 {
        self.size() * 0.5
    }
}

/// `min(width / reference_width, height / reference_height)`.
pub fn scale_factor(viewport: Viewport, reference: Viewport) -> f64 {
    let sx = viewport.width as f64 / reference.width as f64;
    let sy = viewport.height as f64 / reference.height as f64;
    sx.min(sy)
}

/// `floor(count * scale)`; negative or non-finite scales give 0.
pub fn scaled_count(count: usize, scale: f64) -> usize {
    if !scale.is_finite() || scale <= 0.0 {
        return 0;
    }
    (count as f64 * scale).floor() as usize
}

/// Uniform point in the viewport, optionally concentrated toward the center.
///
/// With `distribution > 0` the point keeps its angle from the center but its
/// distance is scaled by `random()^distribution`.
pub fn sample_position(viewport: Viewport, distribution: f64, rng: &mut Xorshift64) -> DVec2 {
    let point = DVec2::new(
        rng.next_f64() * viewport.width as f64,
        rng.next_f64() * viewport.height as f64,
    );
    if distribution <= 0.0 || !distribution.is_finite() {
        return point;
    }
    let center = viewport.center();
    let offset = point - center;
    let distance = offset.length();
    if distance <= 0.0 {
        return point;
    }
    let pulled = distance * rng.next_f64().powf(distribution);
    center + offset / distance * pulled
}

/// A cell of a placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

/// Every cell of a `rows x cols` grid in row-major order, then shuffled.
pub fn shuffled_grid_cells(rows: usize, cols: usize, rng: &mut Xorshift64) -> Vec<GridCell> {
    let mut cells: Vec<GridCell> = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| GridCell { row, col }))
        .collect();
    rng.shuffle(&mut cells);
    cells
}

/// A point inside the middle 60% of `cell`.
pub fn jittered_cell_center(cell: GridCell, cell_size: DVec2, rng: &mut Xorshift64) -> DVec2 {
    let jitter = DVec2::new(
        (0.2 + 0.6 * rng.next_f64()) * cell_size.x,
        (0.2 + 0.6 * rng.next_f64()) * cell_size.y,
    );
    DVec2::new(cell.col as f64 * cell_size.x, cell.row as f64 * cell_size.y) + jitter
}

/// First entry whose cumulative probability exceeds `roll`, else the last entry.
///
/// Returns `None` only for an empty table.
pub fn pick_cumulative<T: Copy>(table: &[(f64, T)], roll: f64) -> Option<T> {
    table
        .iter()
        .find(|(threshold, _)| roll < *threshold)
        .or_else(|| table.last())
        .map(|(_, value)| *value)
}
