//! Gray-Scott diffusion-reaction kernel on the CPU.
//!
//! The same kernel runs on the GPU in `gpu/diffusion.wgsl`; both sample
//! neighbors with clamp-to-edge addressing.

use rayon::prelude::*;

use crate::error::SessionError;
use crate::field::{Cell, Field, FieldBuffers, SeedPattern};
use crate::instrument::FieldBackend;
use crate::params::SimulationParams;

/// Weight of each of the four orthogonal neighbors
pub const ORTHOGONAL_WEIGHT: f32 = 0.2;

/// Weight of each of the four diagonal neighbors
pub const DIAGONAL_WEIGHT: f32 = 0.05;

const ORTHOGONAL: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i64, i64); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Weighted 3x3 Laplacian of (A, B) at (x, y)
///
/// Evaluated as weighted differences from the center, which equals the
/// 3x3 stencil with a center weight of -1 because the neighbor weights add
/// up to 1. A uniform neighborhood therefore yields exactly 0.
pub fn laplacian(field: &Field, x: u32, y: u32) -> (f32, f32) {
    let center = field.get(x, y);
    let (x, y) = (x as i64, y as i64);

    let accumulate = |offsets: &[(i64, i64)]| {
        offsets.iter().fold((0.0, 0.0), |(sum_a, sum_b), (dx, dy)| {
            let n = field.get_clamped(x + dx, y + dy);
            (sum_a + (n.a - center.a), sum_b + (n.b - center.b))
        })
    };

    let (orth_a, orth_b) = accumulate(&ORTHOGONAL);
    let (diag_a, diag_b) = accumulate(&DIAGONAL);

    (
        ORTHOGONAL_WEIGHT * orth_a + DIAGONAL_WEIGHT * diag_a,
        ORTHOGONAL_WEIGHT * orth_b + DIAGONAL_WEIGHT * diag_b,
    )
}

/// Gray-Scott update of one cell given its Laplacian
pub fn react(cell: Cell, (lap_a, lap_b): (f32, f32), params: &SimulationParams) -> Cell {
    let ab2 = cell.a * cell.b * cell.b;
    let next_a = cell.a + (params.da * lap_a - ab2 + params.feed * (1.0 - cell.a)) * params.dt;
    let next_b =
        cell.b + (params.db * lap_b + ab2 - (params.kill + params.feed) * cell.b) * params.dt;
    Cell::new(next_a, next_b)
}

/// Compute the next field from `previous` into a new allocation
pub fn step(previous: &Field, params: &SimulationParams) -> Field {
    let mut next = Field::new(previous.width(), previous.height());
    step_into(previous, &mut next, params);
    next
}

/// Compute the next field from `previous` into `next`, rows in parallel
///
/// `previous` and `next` are distinct borrows, so a step can never read cells
/// it has already written.
pub fn step_into(previous: &Field, next: &mut Field, params: &SimulationParams) {
    let width = previous.width() as usize;
    if width == 0 {
        return;
    }
    next.cells_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let (x, y) = (x as u32, y as u32);
                *out = react(previous.get(x, y), laplacian(previous, x, y), params);
            }
        });
}

/// Field backend running the kernel on a rayon worker pool
pub struct CpuBackend {
    buffers: FieldBuffers,
}

impl CpuBackend {
    pub fn new(width: u32, height: u32, seed: &SeedPattern) -> Self {
        Self {
            buffers: FieldBuffers::new(width, height, seed),
        }
    }

    pub fn buffers(&self) -> &FieldBuffers {
        &self.buffers
    }
}

impl FieldBackend for CpuBackend {
    fn dimensions(&self) -> (u32, u32) {
        (self.buffers.width(), self.buffers.height())
    }

    fn step(&mut self, params: &SimulationParams) {
        let (previous, next) = self.buffers.split();
        step_into(previous, next, params);
    }

    fn read_next(&mut self) -> Result<&Field, SessionError> {
        Ok(self.buffers.next())
    }

    fn swap(&mut self) {
        self.buffers.swap();
    }

    fn previous_index(&self) -> usize {
        self.buffers.previous_index()
    }

    fn reset(&mut self, seed: &SeedPattern) {
        self.buffers.reset(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_weights_balance_center() {
        let neighbors = ORTHOGONAL.len() as f32 * ORTHOGONAL_WEIGHT
            + DIAGONAL.len() as f32 * DIAGONAL_WEIGHT;
        assert!((neighbors - 1.0).abs() < 1e-6, "neighbor sum {}", neighbors);
    }

    #[test]
    fn test_laplacian_matches_weighted_stencil() {
        // Single hot cell: its own Laplacian is -1 times its value, an
        // orthogonal neighbor sees 0.2 of it and a diagonal one 0.05
        let mut field = Field::new(5, 5);
        field.set(2, 2, Cell::new(0.0, 2.0));

        assert!((laplacian(&field, 2, 2).1 - (-2.0)).abs() < 1e-6);
        assert!((laplacian(&field, 3, 2).1 - 0.4).abs() < 1e-6);
        assert!((laplacian(&field, 3, 3).1 - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_laplacian_of_uniform_field_is_exactly_zero() {
        for value in [0.0, 0.37, 1.0, 255.0, -3.5] {
            let field = Field::from_fn(9, 7, |_, _| Cell::new(value, value * 0.5));
            for y in 0..7 {
                for x in 0..9 {
                    assert_eq!(laplacian(&field, x, y), (0.0, 0.0));
                }
            }
        }
    }

    #[test]
    fn test_laplacian_clamps_at_edges() {
        let mut field = Field::new(4, 4);
        field.set(0, 0, Cell::new(0.0, 1.0));

        // Out-of-range neighbors resolve to the corner itself, not the far side
        let (_, lap_b) = laplacian(&field, 0, 0);
        assert!((lap_b - (-0.55)).abs() < 1e-6, "lap_b = {}", lap_b);

        let (_, lap_far) = laplacian(&field, 3, 3);
        assert_eq!(lap_far, 0.0);
    }

    #[test]
    fn test_zero_time_step_is_identity() {
        let params = SimulationParams {
            dt: 0.0,
            ..Default::default()
        };
        let initial = SeedPattern::default().build(32, 32);

        let once = step(&initial, &params);
        let twice = step(&once, &params);
        assert_eq!(twice, initial);
    }

    #[test]
    fn test_reaction_matches_formula() {
        let params = SimulationParams::default();
        let cell = Cell::new(0.8, 0.3);
        let next = react(cell, (0.1, -0.2), &params);

        let ab2 = 0.8 * 0.3 * 0.3;
        let expected_a = 0.8 + (0.4 * 0.1 - ab2 + 0.029 * (1.0 - 0.8)) * 1.5;
        let expected_b = 0.3 + (0.15 * -0.2 + ab2 - (0.057 + 0.029) * 0.3) * 1.5;
        assert!((next.a - expected_a).abs() < 1e-6);
        assert!((next.b - expected_b).abs() < 1e-6);
    }

    #[test]
    fn test_single_step_leaves_unreached_cells_untouched() {
        let initial = SeedPattern::default().build(256, 256);
        let next = step(&initial, &SimulationParams::default());
        let (cx, cy) = initial.center();

        for y in 0..256 {
            for x in 0..256 {
                let (dx, dy) = (x as f32 - cx, y as f32 - cy);
                // Disk radius 10 plus one stencil radius, with diagonal slack
                if dx * dx + dy * dy > 12.0 * 12.0 {
                    assert_eq!(next.get(x, y).b, 0.0, "B leaked to ({}, {})", x, y);
                }
            }
        }
        // The disk itself reacts
        assert_ne!(next.get(128, 128), initial.get(128, 128));
    }

    #[test]
    fn test_empty_field_steps_without_work() {
        let empty = Field::new(0, 0);
        assert_eq!(step(&empty, &SimulationParams::default()), empty);
    }

    #[test]
    fn test_cpu_backend_alternates_roles() {
        let mut backend = CpuBackend::new(16, 16, &SeedPattern::default());
        let params = SimulationParams::default();
        assert_eq!(backend.previous_index(), 1);

        backend.step(&params);
        backend.swap();
        assert_eq!(backend.previous_index(), 0);

        backend.step(&params);
        backend.swap();
        assert_eq!(backend.previous_index(), 1);
    }
}
