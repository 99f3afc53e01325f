//! Peg lattice and slot layout
//!
//! Row `r` (0-based) holds `r + 1` pegs centred on the board, so each row is
//! offset by half a spacing from the one above (triangular lattice). The
//! horizontal spacing is `width / (rows + 1)`, which puts the bottom row's
//! pegs exactly on the interior slot boundaries. Vertically the board is
//! split into `rows + 4` bands: two bands of drop room above the first row,
//! one band per peg row and the slots underneath.

use glam::Vec2;

use super::multipliers::{MultiplierTable, RiskTier};
use super::spatial::SpatialIndex;
use super::state::{Peg, Slot};
use crate::config::PhysicsConfig;
use crate::consts::{MAX_ROWS, REFERENCE_SPACING};
use crate::error::{PlinkoError, Result};

/// Lattice spacing and derived sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub horizontal: f32,
    pub vertical: f32,
    pub peg_radius: f32,
    pub ball_radius: f32,
}

impl Spacing {
    /// Smaller of the two spacings; radii and motion scale with it
    #[inline]
    pub fn unit(&self) -> f32 {
        self.horizontal.min(self.vertical)
    }
}

/// Output of [`layout`]
#[derive(Debug, Clone)]
pub struct Layout {
    pub pegs: Vec<Peg>,
    /// Multipliers are zero until a table is attached
    pub slots: Vec<Slot>,
    pub spacing: Spacing,
}

fn validate(row_count: u32, width: f32, height: f32) -> Result<()> {
    if row_count == 0 || row_count > MAX_ROWS {
        return Err(PlinkoError::InvalidRowCount(row_count));
    }
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !valid(width) || !valid(height) {
        return Err(PlinkoError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Compute peg and slot positions for a board
pub fn layout(row_count: u32, width: f32, height: f32, config: &PhysicsConfig) -> Result<Layout> {
    validate(row_count, width, height)?;

    let rows = row_count as usize;
    let horizontal = width / (row_count as f32 + 1.0);
    let vertical = height / (row_count as f32 + 4.0);
    let unit = horizontal.min(vertical);
    let spacing = Spacing {
        horizontal,
        vertical,
        peg_radius: unit * config.peg_radius_scale,
        ball_radius: unit * config.ball_radius_scale,
    };

    let center_x = width / 2.0;
    let mut pegs = Vec::with_capacity(rows * (rows + 1) / 2);
    for row in 0..rows {
        let y = (row as f32 + 2.0) * vertical;
        let half_span = row as f32 / 2.0;
        for col in 0..=row {
            let x = center_x + (col as f32 - half_span) * horizontal;
            let id = pegs.len() as u32;
            pegs.push(Peg::new(id, Vec2::new(x, y), spacing.peg_radius));
        }
    }

    let slot_count = rows + 1;
    let slot_top = (row_count as f32 + 2.0) * vertical;
    let slots = (0..slot_count)
        .map(|index| {
            let x = index as f32 * horizontal;
            // Last slot ends exactly at the wall
            let right = if index + 1 == slot_count {
                width
            } else {
                (index + 1) as f32 * horizontal
            };
            Slot {
                index,
                x,
                width: right - x,
                top: slot_top,
                multiplier: 0.0,
            }
        })
        .collect();

    Ok(Layout {
        pegs,
        slots,
        spacing,
    })
}

/// Everything that depends on (rows, dimensions, risk), built together and
/// tagged with a version so consumers never mix two layouts.
#[derive(Debug, Clone)]
pub struct Board {
    pub version: u64,
    pub row_count: u32,
    pub width: f32,
    pub height: f32,
    pub risk: RiskTier,
    pub pegs: Vec<Peg>,
    pub slots: Vec<Slot>,
    pub table: MultiplierTable,
    pub index: SpatialIndex,
    pub spacing: Spacing,
    pub ball_radius: f32,
}

impl Board {
    pub fn build(
        version: u64,
        row_count: u32,
        width: f32,
        height: f32,
        risk: RiskTier,
        config: &PhysicsConfig,
    ) -> Result<Self> {
        let Layout {
            pegs,
            mut slots,
            spacing,
        } = layout(row_count, width, height, config)?;

        let table = MultiplierTable::generate(risk, slots.len());
        for slot in &mut slots {
            slot.multiplier = table.get(slot.index).unwrap_or(0.0);
        }

        let cell_size =
            (spacing.ball_radius * config.cell_size_factor).max(spacing.ball_radius * 2.0);
        let index = SpatialIndex::build(&pegs, cell_size)?;

        Ok(Self {
            version,
            row_count,
            width,
            height,
            risk,
            pegs,
            slots,
            table,
            index,
            spacing,
            ball_radius: spacing.ball_radius,
        })
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Top edge of the slot row (all slots share it)
    #[inline]
    pub fn slot_top(&self) -> f32 {
        self.slots.first().map(|s| s.top).unwrap_or(self.height)
    }

    /// Factor from reference-spacing motion constants to this board
    #[inline]
    pub fn motion_scale(&self) -> f32 {
        self.spacing.unit() / REFERENCE_SPACING
    }

    /// Height balls are dropped from, one band above the first peg row
    #[inline]
    pub fn drop_y(&self) -> f32 {
        self.spacing.vertical
    }

    /// Slot whose span contains `x`
    pub fn slot_at(&self, x: f32) -> Option<&Slot> {
        if !x.is_finite() || x < 0.0 || x >= self.width {
            return None;
        }
        let guess = ((x / self.spacing.horizontal) as usize).min(self.slots.len() - 1);
        // Float rounding can put the guess one slot off at a boundary
        [guess.saturating_sub(1), guess, guess + 1]
            .into_iter()
            .filter_map(|i| self.slots.get(i))
            .find(|s| s.contains_x(x))
    }

    /// Nearest slot to `x`, clamping positions outside the board
    pub fn nearest_slot(&self, x: f32) -> &Slot {
        let x = if x.is_finite() { x } else { self.width / 2.0 };
        let i = (x / self.spacing.horizontal).floor().max(0.0) as usize;
        &self.slots[i.min(self.slots.len() - 1)]
    }
}
