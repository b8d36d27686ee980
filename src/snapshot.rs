//! Offscreen presenter writing PNG snapshots of the field.

use image::{Rgba, RgbaImage};
use log::debug;

use crate::error::SessionError;
use crate::field::Field;
use crate::instrument::{FieldBackend, Presenter};
use crate::params::RecordingConfig;
use crate::sweep::SweepSegment;

/// Gray image of chemical B with the sweep segment drawn on top
pub fn render_snapshot(field: &Field, segment: &SweepSegment, color: [f32; 4]) -> RgbaImage {
    let mut img = RgbaImage::from_fn(field.width(), field.height(), |x, y| {
        let b = field.get(x, y).to_rgba8()[2];
        Rgba([b, b, b, 255])
    });
    draw_line(&mut img, segment, to_rgba8(color));
    img
}

fn to_rgba8(color: [f32; 4]) -> Rgba<u8> {
    Rgba(color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
}

/// Plot the segment one pixel per step along its longer axis, skipping
/// points outside the image
fn draw_line(img: &mut RgbaImage, segment: &SweepSegment, color: Rgba<u8>) {
    let span = segment.end - segment.start;
    let steps = span.x.abs().max(span.y.abs()).ceil().max(1.0) as u32;

    for i in 0..=steps {
        let p = segment.start + span * (i as f32 / steps as f32);
        let (x, y) = (p.x.round() as i64, p.y.round() as i64);
        if x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64 {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Presenter for headless runs: every `snapshot_every` frames, reads the
/// next field back and saves it under the recording's frame directory
pub struct SnapshotPresenter {
    config: RecordingConfig,
    color: [f32; 4],
    written: usize,
}

impl SnapshotPresenter {
    pub fn new(config: RecordingConfig, color: [f32; 4]) -> Result<Self, SessionError> {
        std::fs::create_dir_all(config.frames_dir())?;
        Ok(Self {
            config,
            color,
            written: 0,
        })
    }

    /// Number of snapshots written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl<B: FieldBackend> Presenter<B> for SnapshotPresenter {
    fn present(
        &mut self,
        backend: &mut B,
        frame: u64,
        segment: &SweepSegment,
    ) -> Result<(), SessionError> {
        if !self.config.wants_snapshot(frame) {
            return Ok(());
        }

        let field = backend.read_next()?;
        let path = self.config.frame_path(frame);
        render_snapshot(field, segment, self.color).save(&path)?;
        self.written += 1;

        debug!("Saved {}", path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}
