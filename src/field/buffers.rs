//! Ping-pong pair of fields with alternating previous/next roles.

use super::grid::{Cell, Field};
use super::seed::SeedPattern;

/// Slot that holds the "previous" role right after construction or reset
pub const INITIAL_PREVIOUS: usize = 1;

/// Two equal-size fields; exactly one is readable-previous, the other
/// writable-next
pub struct FieldBuffers {
    fields: [Field; 2],
    previous: usize,
}

impl FieldBuffers {
    /// Allocate both fields and seed the previous slot
    pub fn new(width: u32, height: u32, seed: &SeedPattern) -> Self {
        let mut buffers = Self {
            fields: [Field::new(width, height), Field::new(width, height)],
            previous: INITIAL_PREVIOUS,
        };
        buffers.reset(seed);
        buffers
    }

    pub fn width(&self) -> u32 {
        self.fields[0].width()
    }

    pub fn height(&self) -> u32 {
        self.fields[0].height()
    }

    /// Slot index currently in the previous role
    pub fn previous_index(&self) -> usize {
        self.previous
    }

    /// Slot index currently in the next role
    pub fn next_index(&self) -> usize {
        1 - self.previous
    }

    pub fn previous(&self) -> &Field {
        &self.fields[self.previous]
    }

    pub fn next(&self) -> &Field {
        &self.fields[self.next_index()]
    }

    /// Read-only previous and writable next, borrowed together
    pub fn split(&mut self) -> (&Field, &mut Field) {
        let (first, second) = self.fields.split_at_mut(1);
        if self.previous == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Exchange roles after a completed step
    pub fn swap(&mut self) {
        self.previous = self.next_index();
    }

    /// Clear both fields to the zero cell
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.fill(Cell::ZERO);
        }
    }

    /// Seed the previous slot by evaluating `f(dx, dy)` relative to the center
    pub fn seed_with(&mut self, f: impl Fn(f32, f32) -> Cell) {
        let seeded = Field::from_fn(self.width(), self.height(), f);
        self.fields[self.previous].copy_from(&seeded);
    }

    /// Clear both fields, restore the initial role assignment and re-seed
    pub fn reset(&mut self, seed: &SeedPattern) {
        self.clear();
        self.previous = INITIAL_PREVIOUS;
        self.seed_with(|dx, dy| seed.cell(dx, dy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_strictly_alternates() {
        let mut buffers = FieldBuffers::new(8, 8, &SeedPattern::default());
        assert_eq!(buffers.previous_index(), 1);

        for n in 1..=6 {
            buffers.swap();
            assert_eq!(buffers.previous_index(), 1 - (n % 2));
        }
    }

    #[test]
    fn test_split_hands_out_distinct_roles() {
        let mut buffers = FieldBuffers::new(8, 8, &SeedPattern::default());
        let seeded = buffers.previous().clone();

        let (previous, next) = buffers.split();
        assert_eq!(previous, &seeded);
        next.fill(Cell::new(0.5, 0.5));

        assert_eq!(buffers.previous(), &seeded);
        assert_eq!(buffers.next().get(3, 3), Cell::new(0.5, 0.5));
    }

    #[test]
    fn test_reset_restores_seed_and_roles() {
        let seed = SeedPattern::ring();
        let mut buffers = FieldBuffers::new(64, 64, &seed);
        let initial = buffers.previous().clone();

        buffers.split().1.fill(Cell::new(0.3, 0.3));
        buffers.swap();
        buffers.reset(&seed);

        assert_eq!(buffers.previous_index(), INITIAL_PREVIOUS);
        assert_eq!(buffers.previous(), &initial);
        assert!(buffers.next().cells().iter().all(|c| *c == Cell::ZERO));
    }
}
