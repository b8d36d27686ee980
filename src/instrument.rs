//! Per-frame simulate, render, sonify loop.
//!
//! One `run_frame` call performs, in order: step previous into next, present
//! next with the sweep overlay, read next back, sample the sweep ray, update
//! voice gains, swap buffer roles, advance the sweep. The caller schedules
//! frames (one per redraw in the windowed app, a counted loop when headless).

use log::debug;

use crate::audio::ToneMapper;
use crate::error::SessionError;
use crate::field::{Field, SeedPattern};
use crate::params::{ParameterOverrides, SimulationParams, SweepConfig};
use crate::sweep::{RadialSampler, SweepSegment, SweepState};

/// Storage and execution of the diffusion-reaction step
///
/// Implementations own two equal-size fields with alternating
/// previous/next roles and never update a field in place.
pub trait FieldBackend {
    /// Field size in cells
    fn dimensions(&self) -> (u32, u32);

    /// Compute the next field from the previous one
    fn step(&mut self, params: &SimulationParams);

    /// Synchronously read the next field after `step` has completed
    fn read_next(&mut self) -> Result<&Field, SessionError>;

    /// Exchange previous/next roles
    fn swap(&mut self);

    /// Slot index currently holding the previous role
    fn previous_index(&self) -> usize;

    /// Clear both fields, seed the previous slot, restore the initial roles
    fn reset(&mut self, seed: &SeedPattern);
}

/// Display of the next field plus the sweep overlay
pub trait Presenter<B: FieldBackend> {
    /// Draw the backend's next field and the sweep segment, replacing any
    /// previous frame content
    fn present(
        &mut self,
        backend: &mut B,
        frame: u64,
        segment: &SweepSegment,
    ) -> Result<(), SessionError>;

    /// Clear the display
    fn clear(&mut self) -> Result<(), SessionError>;
}

/// Summary of one completed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub angle: f32,
    pub sounding_voices: usize,
    pub previous_index: usize,
}

/// Simulation, sampler and tone mapper driven together, one frame at a time
pub struct Instrument<B: FieldBackend> {
    backend: B,
    params: SimulationParams,
    seed: SeedPattern,
    sweep: SweepState,
    sampler: RadialSampler,
    tones: ToneMapper,
    frame: u64,
}

impl<B: FieldBackend> Instrument<B> {
    pub fn new(
        backend: B,
        params: SimulationParams,
        seed: SeedPattern,
        sweep: &SweepConfig,
        tones: ToneMapper,
    ) -> Self {
        Self {
            backend,
            params,
            seed,
            sweep: SweepState::new(sweep),
            sampler: RadialSampler::new(tones.voice_count()),
            tones,
            frame: 0,
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Sweep samples per frame, one per voice
    pub fn sample_count(&self) -> usize {
        self.sampler.sample_count()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Override the parameters that are present; takes effect on the next step
    pub fn update_parameters(&mut self, overrides: ParameterOverrides) {
        self.params.apply(&overrides);
        debug!("Parameters: {:?}", self.params);
    }

    /// Re-seed both buffers, restore the initial roles and clear the display
    pub fn reset_buffers<P: Presenter<B>>(
        &mut self,
        presenter: &mut P,
    ) -> Result<(), SessionError> {
        self.backend.reset(&self.seed);
        self.tones.silence();
        presenter.clear()
    }

    /// Run one complete frame
    pub fn run_frame<P: Presenter<B>>(
        &mut self,
        presenter: &mut P,
    ) -> Result<FrameReport, SessionError> {
        let (width, height) = self.backend.dimensions();

        self.backend.step(&self.params);

        let segment = self.sweep.segment(width, height);
        presenter.present(&mut self.backend, self.frame, &segment)?;

        let next = self.backend.read_next()?;
        let samples = self.sampler.sample(next, &self.sweep);
        let sounding_voices = self.tones.apply(&samples);

        let report = FrameReport {
            frame: self.frame,
            angle: self.sweep.angle(),
            sounding_voices,
            previous_index: self.backend.previous_index(),
        };

        self.backend.swap();
        self.sweep.advance();
        self.frame += 1;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::VoiceGains;
    use crate::params::AudioConfig;
    use crate::stepper::CpuBackend;

    /// Records what it was asked to draw
    #[derive(Default)]
    struct RecordingPresenter {
        presented: Vec<(u64, SweepSegment)>,
        clears: usize,
    }

    impl<B: FieldBackend> Presenter<B> for RecordingPresenter {
        fn present(
            &mut self,
            _backend: &mut B,
            frame: u64,
            segment: &SweepSegment,
        ) -> Result<(), SessionError> {
            self.presented.push((frame, *segment));
            Ok(())
        }

        fn clear(&mut self) -> Result<(), SessionError> {
            self.clears += 1;
            Ok(())
        }
    }

    fn instrument(seed: SeedPattern) -> (Instrument<CpuBackend>, VoiceGains) {
        let gains = VoiceGains::new(88);
        let tones = ToneMapper::new(gains.clone(), &AudioConfig::default());
        let instrument = Instrument::new(
            CpuBackend::new(64, 64, &seed),
            SimulationParams::default(),
            seed,
            &SweepConfig::default(),
            tones,
        );
        (instrument, gains)
    }

    #[test]
    fn test_frames_alternate_buffers_and_advance_sweep() {
        let (mut instrument, _) = instrument(SeedPattern::default());
        let mut presenter = RecordingPresenter::default();

        let first = instrument.run_frame(&mut presenter).unwrap();
        assert_eq!(first.previous_index, 1);
        assert_eq!(instrument.backend().previous_index(), 0);

        let second = instrument.run_frame(&mut presenter).unwrap();
        assert_eq!(second.previous_index, 0);
        assert_eq!(instrument.backend().previous_index(), 1);

        assert!(second.angle > first.angle);
        assert_eq!(presenter.presented.len(), 2);
        assert_eq!(presenter.presented[1].0, 1);
    }

    #[test]
    fn test_gains_track_sweep_samples() {
        let (mut instrument, gains) = instrument(SeedPattern::default());
        let mut presenter = RecordingPresenter::default();
        instrument.run_frame(&mut presenter).unwrap();

        for voice in 0..88 {
            let gain = gains.get(voice);
            assert!((0.0..=0.05).contains(&gain));
        }
        // Pointing right on a 64-wide grid, the last sample is off the edge
        assert_eq!(gains.get(87), 0.0);
    }

    #[test]
    fn test_sample_count_follows_voice_count() {
        let gains = VoiceGains::new(16);
        let seed = SeedPattern::default();
        let mut instrument = Instrument::new(
            CpuBackend::new(64, 64, &seed),
            SimulationParams::default(),
            seed,
            &SweepConfig::default(),
            ToneMapper::new(gains.clone(), &AudioConfig::default()),
        );
        assert_eq!(instrument.sample_count(), 16);

        instrument.run_frame(&mut RecordingPresenter::default()).unwrap();
        // First sample at the reacting center, last one just past the right edge
        assert!(gains.get(0) > 0.0);
        assert_eq!(gains.get(15), 0.0);
    }

    #[test]
    fn test_reset_after_parameter_update_restores_seed() {
        let seed = SeedPattern::ring();
        let (mut instrument, gains) = instrument(seed);
        let mut presenter = RecordingPresenter::default();
        let seeded = seed.build(64, 64);

        for _ in 0..5 {
            instrument.run_frame(&mut presenter).unwrap();
        }
        instrument.update_parameters(ParameterOverrides {
            feed: Some(0.04),
            ..Default::default()
        });
        instrument.reset_buffers(&mut presenter).unwrap();

        assert_eq!(presenter.clears, 1);
        assert_eq!(instrument.params().feed, 0.04);
        assert_eq!(instrument.backend().previous_index(), 1);
        assert_eq!(instrument.backend().buffers().previous(), &seeded);
        // Ring cell at squared distance 100 and a far cell
        let previous = instrument.backend().buffers().previous();
        assert_eq!(previous.get(42, 32).to_rgba8(), [0, 0, 255, 255]);
        assert_eq!(previous.get(0, 0).to_rgba8(), [255, 0, 0, 255]);
        assert!(gains.snapshot().iter().all(|&g| g == 0.0));
    }
}
