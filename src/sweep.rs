//! Rotating radial scan line and the sampler that reads the field along it.
//!
//! The ray is bounded by the field's inscribed square rather than a circle,
//! so its length varies with the angle like a square radar screen.
//!
//! Coordinates are row-major pixel coordinates (row 0 on top). An angle of 0
//! points right and π/2 points up.

use glam::Vec2;

use crate::field::Field;
use crate::params::SweepConfig;

/// Ray length at `angle` for a `width × height` field:
/// `min(|1/cos θ|, |1/sin θ|)` times half the shorter side
pub fn radius_at(angle: f32, width: u32, height: u32) -> f32 {
    let half = width.min(height) as f32 / 2.0;
    let (sin, cos) = angle.sin_cos();
    (1.0 / cos.abs()).min(1.0 / sin.abs()) * half
}

/// Overlay line from the field center to the end of the ray (pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSegment {
    pub start: Vec2,
    pub end: Vec2,
}

impl SweepSegment {
    /// Endpoints in normalized device coordinates for a `width × height` target
    pub fn to_clip(&self, width: u32, height: u32) -> [[f32; 2]; 2] {
        let size = Vec2::new(width as f32, height as f32);
        let to_ndc = |p: Vec2| {
            let uv = p / size;
            [uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0]
        };
        [to_ndc(self.start), to_ndc(self.end)]
    }
}

/// Current sweep angle, advanced once per frame
#[derive(Debug, Clone)]
pub struct SweepState {
    angle: f32,
    increment: f32,
}

impl SweepState {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            angle: config.initial_angle_rad,
            increment: config.increment_rad,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Advance by the fixed increment. The angle is left unwrapped; only its
    /// sine and cosine are ever used.
    pub fn advance(&mut self) {
        self.angle += self.increment;
    }

    /// Unit direction of the ray in pixel coordinates
    pub fn direction(&self) -> Vec2 {
        let (sin, cos) = self.angle.sin_cos();
        Vec2::new(cos, -sin)
    }

    pub fn segment(&self, width: u32, height: u32) -> SweepSegment {
        let center = Vec2::new(width as f32 / 2.0, height as f32 / 2.0);
        let radius = radius_at(self.angle, width, height);
        SweepSegment {
            start: center,
            end: center + self.direction() * radius,
        }
    }

    /// Pixel position of each of `count` samples along the ray, `None` when the
    /// rounded position falls outside the field
    pub fn sample_positions(
        &self,
        width: u32,
        height: u32,
        count: usize,
    ) -> Vec<Option<(u32, u32)>> {
        let segment = self.segment(width, height);
        let span = segment.end - segment.start;
        let last = count.saturating_sub(1).max(1) as f32;

        (0..count)
            .map(|o| {
                let p = segment.start + span * (o as f32 / last);
                let (x, y) = (p.x.round() as i64, p.y.round() as i64);
                let in_bounds = x >= 0 && y >= 0 && x < width as i64 && y < height as i64;
                in_bounds.then_some((x as u32, y as u32))
            })
            .collect()
    }
}

/// Reads chemical B at evenly spaced points along the sweep ray
#[derive(Debug, Clone)]
pub struct RadialSampler {
    sample_count: usize,
}

impl RadialSampler {
    pub fn new(sample_count: usize) -> Self {
        Self { sample_count }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// B concentration per sample, `None` for out-of-bounds positions
    ///
    /// `field` must be the read-back of the frame's freshly written buffer.
    pub fn sample(&self, field: &Field, sweep: &SweepState) -> Vec<Option<f32>> {
        sweep
            .sample_positions(field.width(), field.height(), self.sample_count)
            .into_iter()
            .map(|pos| pos.map(|(x, y)| field.get(x, y).b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Cell;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn sweep_at(angle: f32) -> SweepState {
        SweepState::new(&SweepConfig {
            initial_angle_rad: angle,
            ..Default::default()
        })
    }

    #[test]
    fn test_radius_reaches_square_boundary() {
        assert!((radius_at(0.0, 256, 256) - 128.0).abs() < 1e-3);
        assert!((radius_at(FRAC_PI_2, 256, 256) - 128.0).abs() < 1e-3);
        // Diagonal reaches the corner of the square
        let diag = radius_at(FRAC_PI_4, 256, 256);
        assert!((diag - 128.0 * 2f32.sqrt()).abs() < 1e-2);
        // Shorter side bounds non-square fields
        assert!((radius_at(0.0, 512, 256) - 128.0).abs() < 1e-3);
    }

    #[test]
    fn test_last_sample_pointing_up_lands_on_top_edge() {
        let positions = sweep_at(FRAC_PI_2).sample_positions(256, 256, 88);
        assert_eq!(positions[87], Some((128, 0)));
        assert_eq!(positions[0], Some((128, 128)));
    }

    #[test]
    fn test_out_of_bounds_samples_are_skipped() {
        // Pointing right, the last sample lands on x = 256, one past the edge
        let positions = sweep_at(0.0).sample_positions(256, 256, 88);
        assert_eq!(positions[87], None);
        assert!(positions[..87].iter().all(Option::is_some));

        // Pointing left, x = 0 is still inside
        let positions = sweep_at(PI).sample_positions(256, 256, 88);
        assert_eq!(positions[87], Some((0, 128)));
    }

    #[test]
    fn test_sampler_reads_chemical_b() {
        let field = Field::from_fn(64, 64, |dx, _| Cell::new(1.0, (dx + 32.0) / 64.0));
        let sampler = RadialSampler::new(8);
        let samples = sampler.sample(&field, &sweep_at(PI));

        assert_eq!(samples.len(), 8);
        assert_eq!(samples[0], Some(0.5));
        assert_eq!(samples[7], Some(0.0));
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut sweep = SweepState::new(&SweepConfig::default());
        let start = sweep.angle();
        for _ in 0..1000 {
            sweep.advance();
        }
        assert!((sweep.angle() - start - 10.0).abs() < 1e-2);
    }

    #[test]
    fn test_segment_clip_space() {
        let segment = sweep_at(FRAC_PI_2).segment(256, 256);
        let [start, end] = segment.to_clip(256, 256);
        assert_eq!(start, [0.0, 0.0]);
        assert!(end[0].abs() < 1e-5);
        assert!((end[1] - 1.0).abs() < 1e-5);
    }
}
