//! Uniform grid over the static pegs
//!
//! Pegs never move within one board, so the grid is built once per layout
//! and only read afterwards. Queries return a conservative superset of the
//! pegs near a point; callers do the exact distance check themselves.

use std::collections::HashMap;

use glam::Vec2;

use super::state::Peg;
use crate::error::{PlinkoError, Result};

/// Cell coordinate -> indices into the board's peg list
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Smallest and largest occupied cell on each axis
    bounds: Option<((i32, i32), (i32, i32))>,
}

impl SpatialIndex {
    /// Bucket every peg by the cell containing its centre
    pub fn build(pegs: &[Peg], cell_size: f32) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(PlinkoError::parameter(
                "cell_size",
                format!("must be positive, got {cell_size}"),
            ));
        }

        let mut index = Self {
            cell_size,
            cells: HashMap::new(),
            bounds: None,
        };
        for (i, peg) in pegs.iter().enumerate() {
            let cell = index.world_to_cell(peg.pos);
            index.cells.entry(cell).or_default().push(i);
            index.bounds = Some(match index.bounds {
                None => (cell, cell),
                Some((min, max)) => (
                    (min.0.min(cell.0), min.1.min(cell.1)),
                    (max.0.max(cell.0), max.1.max(cell.1)),
                ),
            });
        }
        Ok(index)
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of non-empty cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Compute grid cell coordinates for a world position
    fn world_to_cell(&self, pos: Vec2) -> (i32, i32) {
        let x = (pos.x / self.cell_size).floor() as i32;
        let y = (pos.y / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Cells to check in each direction for a given radius
    fn radius_in_cells(&self, radius: f32) -> i32 {
        ((radius / self.cell_size).ceil() as i32).max(1)
    }

    /// Peg indices in every cell overlapping the square around `(x, y)`.
    /// The scan never leaves the occupied cells, however large `radius` is.
    pub fn query(&self, x: f32, y: f32, radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.query_into(Vec2::new(x, y), radius, &mut out);
        out
    }

    /// Same as [`query`](Self::query) but reuses the caller's buffer
    pub fn query_into(&self, pos: Vec2, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        if !pos.is_finite() {
            return;
        }
        let Some((min, max)) = self.bounds else {
            return;
        };

        let cell = self.world_to_cell(pos);
        let reach = self.radius_in_cells(radius);
        let (x_lo, x_hi) = (
            cell.0.saturating_sub(reach).max(min.0),
            cell.0.saturating_add(reach).min(max.0),
        );
        let (y_lo, y_hi) = (
            cell.1.saturating_sub(reach).max(min.1),
            cell.1.saturating_add(reach).min(max.1),
        );

        for x in x_lo..=x_hi {
            for y in y_lo..=y_hi {
                if let Some(pegs) = self.cells.get(&(x, y)) {
                    out.extend_from_slice(pegs);
                }
            }
        }
    }
}
