//! Initial concentration patterns.

use super::grid::{Cell, Field};

/// Seed pattern evaluated on squared distance from the grid center
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedPattern {
    /// A = 1 everywhere; B = 1 inside a filled disk
    Disk {
        /// Cells with `dx² + dy² < radius_sq` receive B
        radius_sq: f32,
    },

    /// B = 1 and A = 0 inside a ring; A = 1 and B = 0 elsewhere
    Ring {
        /// Inclusive squared-distance bounds
        inner_sq: f32,
        outer_sq: f32,
    },
}

impl Default for SeedPattern {
    fn default() -> Self {
        Self::Disk { radius_sq: 100.0 }
    }
}

impl SeedPattern {
    pub fn ring() -> Self {
        Self::Ring {
            inner_sq: 90.0,
            outer_sq: 125.0,
        }
    }

    /// Cell value at an offset from the grid center
    pub fn cell(&self, dx: f32, dy: f32) -> Cell {
        let dist_sq = dx * dx + dy * dy;
        match *self {
            Self::Disk { radius_sq } => {
                let b = if dist_sq < radius_sq { 1.0 } else { 0.0 };
                Cell::new(1.0, b)
            }
            Self::Ring { inner_sq, outer_sq } => {
                if (inner_sq..=outer_sq).contains(&dist_sq) {
                    Cell::new(0.0, 1.0)
                } else {
                    Cell::new(1.0, 0.0)
                }
            }
        }
    }

    /// Build a seeded field of the given size
    pub fn build(&self, width: u32, height: u32) -> Field {
        Field::from_fn(width, height, |dx, dy| self.cell(dx, dy))
    }
}
