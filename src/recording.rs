//! Headless recording: PNG snapshots plus an offline render of the voice bank.

use std::io::BufWriter;
use std::time::Instant;

use log::info;

use crate::audio::{BankSynth, VoiceBank};
use crate::error::SessionError;
use crate::instrument::{FieldBackend, Instrument};
use crate::params::{AudioConfig, RecordingConfig};
use crate::snapshot::SnapshotPresenter;

/// Outcome of a headless run
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub frames: usize,
    pub snapshots: usize,
    pub audio_samples: usize,
    pub peak_sounding_voices: usize,
}

/// Run `config.frames` frames without a window, writing snapshots and
/// `audio.wav` under the output directory
///
/// Each frame renders `sample_rate / fps` audio samples after the gains are
/// updated, so the WAV plays back in step with the snapshots.
pub fn run_headless<B: FieldBackend>(
    instrument: &mut Instrument<B>,
    bank: &VoiceBank,
    audio: &AudioConfig,
    config: &RecordingConfig,
    sweep_color: [f32; 4],
) -> Result<RecordingSummary, SessionError> {
    audio.validate().map_err(SessionError::Config)?;
    std::fs::create_dir_all(&config.output_dir)?;

    let mut presenter = SnapshotPresenter::new(config.clone(), sweep_color)?;

    let sample_rate = audio.offline_sample_rate_hz;
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let file = std::fs::File::create(config.audio_path())?;
    let mut writer = hound::WavWriter::new(BufWriter::new(file), spec)?;

    let mut synth = BankSynth::new(bank, sample_rate as f32, audio.gain_smoothing_ms);
    let mut block = vec![0.0; config.samples_per_frame(sample_rate)];

    let start = Instant::now();
    let mut audio_samples = 0;
    let mut peak_sounding_voices = 0;

    for _ in 0..config.frames {
        let report = instrument.run_frame(&mut presenter)?;
        peak_sounding_voices = peak_sounding_voices.max(report.sounding_voices);

        synth.render(&mut block);
        for &sample in &block {
            writer.write_sample(sample)?;
            writer.write_sample(sample)?;
        }
        audio_samples += block.len();

        if report.frame > 0 && report.frame % 60 == 0 {
            info!(
                "Frame {}/{} (sweep {:.2} rad, {} voices)",
                report.frame, config.frames, report.angle, report.sounding_voices
            );
        }
    }

    writer.finalize()?;

    info!(
        "Recorded {} frames in {:.2}s to {}",
        config.frames,
        start.elapsed().as_secs_f32(),
        config.output_dir.display()
    );

    Ok(RecordingSummary {
        frames: config.frames,
        snapshots: presenter.written(),
        audio_samples,
        peak_sounding_voices,
    })
}
