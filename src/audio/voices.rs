//! Fixed oscillator bank and its additive sine synth.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::tuning::Tuning;
use crate::params::AudioConfig;

/// Per-voice gains shared between the frame loop and the audio thread
///
/// Each gain is an `f32` stored as bits in an atomic, so the audio callback
/// never blocks on the frame loop.
#[derive(Clone, Debug)]
pub struct VoiceGains {
    gains: Arc<[AtomicU32]>,
}

impl VoiceGains {
    /// `count` silent voices
    pub fn new(count: usize) -> Self {
        Self {
            gains: (0..count).map(|_| AtomicU32::new(0f32.to_bits())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.gains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gains.is_empty()
    }

    pub fn get(&self, voice: usize) -> f32 {
        f32::from_bits(self.gains[voice].load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, voice: usize, gain: f32) {
        self.gains[voice].store(gain.to_bits(), Ordering::Relaxed);
    }

    /// Copy of all gains
    pub fn snapshot(&self) -> Vec<f32> {
        (0..self.len()).map(|voice| self.get(voice)).collect()
    }
}

/// Voice frequencies fixed at startup plus their mutable gains
#[derive(Clone, Debug)]
pub struct VoiceBank {
    frequencies: Vec<f32>,
    gains: VoiceGains,
}

impl VoiceBank {
    pub fn new(tuning: &Tuning, config: &AudioConfig) -> Self {
        let frequencies = tuning.frequencies(config.voice_count, config.base_frequency_hz);
        let gains = VoiceGains::new(frequencies.len());
        Self { frequencies, gains }
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Handle to the shared gains
    pub fn gains(&self) -> VoiceGains {
        self.gains.clone()
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Additive synth rendering the bank as a sum of sines
///
/// Target gains are read once per block and approached with a one-pole
/// smoother so per-frame gain jumps do not click.
pub struct BankSynth {
    increments: Vec<f32>,
    phases: Vec<f32>,
    smoothed: Vec<f32>,
    targets: Vec<f32>,
    gains: VoiceGains,
    smoothing: f32,
}

impl BankSynth {
    pub fn new(bank: &VoiceBank, sample_rate_hz: f32, smoothing_ms: f32) -> Self {
        let nyquist = sample_rate_hz / 2.0;
        // Voices above Nyquist would alias; park them with a zero increment
        let increments = bank
            .frequencies()
            .iter()
            .map(|&f| if f < nyquist { f / sample_rate_hz } else { 0.0 })
            .collect();

        let smoothing_samples = (smoothing_ms / 1000.0 * sample_rate_hz).max(1.0);
        let count = bank.len();

        Self {
            increments,
            phases: vec![0.0; count],
            smoothed: vec![0.0; count],
            targets: vec![0.0; count],
            gains: bank.gains(),
            smoothing: 1.0 - (-1.0 / smoothing_samples).exp(),
        }
    }

    /// Fill `out` with mono samples, hard-limited to ±1
    pub fn render(&mut self, out: &mut [f32]) {
        for (voice, target) in self.targets.iter_mut().enumerate() {
            *target = self.gains.get(voice);
        }

        for sample in out.iter_mut() {
            let mut mix = 0.0;
            for voice in 0..self.phases.len() {
                let gain = &mut self.smoothed[voice];
                *gain += (self.targets[voice] - *gain) * self.smoothing;
                if *gain > 1e-6 && self.increments[voice] > 0.0 {
                    mix += (self.phases[voice] * TAU).sin() * *gain;
                }
                self.phases[voice] = (self.phases[voice] + self.increments[voice]).fract();
            }
            *sample = mix.clamp(-1.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> VoiceBank {
        VoiceBank::new(&Tuning::EqualTemperament, &AudioConfig::default())
    }

    #[test]
    fn test_bank_starts_silent() {
        let bank = bank();
        assert_eq!(bank.len(), 88);
        assert!(bank.gains().snapshot().iter().all(|&g| g == 0.0));

        let mut synth = BankSynth::new(&bank, 44100.0, 10.0);
        let mut out = vec![1.0; 256];
        synth.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_gain_handle_is_shared() {
        let bank = bank();
        let handle = bank.gains();
        handle.set(5, 0.03);
        assert_eq!(bank.gains().get(5), 0.03);
    }

    #[test]
    fn test_single_voice_produces_bounded_tone() {
        let bank = bank();
        bank.gains().set(48, 0.05); // A4

        let mut synth = BankSynth::new(&bank, 44100.0, 1.0);
        let mut out = vec![0.0; 4410];
        synth.render(&mut out);

        let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.04 && peak <= 0.05 + 1e-4, "peak {}", peak);
    }

    #[test]
    fn test_mix_is_hard_limited() {
        let bank = bank();
        for voice in 0..bank.len() {
            bank.gains().set(voice, 1.0);
        }
        let mut synth = BankSynth::new(&bank, 44100.0, 0.1);
        let mut out = vec![0.0; 1024];
        synth.render(&mut out);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
    }
}
