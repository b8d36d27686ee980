//! Mapping from sampled B concentrations to voice gains.

use super::voices::VoiceGains;
use crate::params::AudioConfig;

/// Sole writer of voice gains
pub struct ToneMapper {
    gains: VoiceGains,
    loudness_ceiling: f32,
    silence_threshold: f32,
}

impl ToneMapper {
    pub fn new(gains: VoiceGains, config: &AudioConfig) -> Self {
        Self {
            gains,
            loudness_ceiling: config.loudness_ceiling,
            silence_threshold: config.silence_threshold,
        }
    }

    /// Number of voices driven, one per sweep sample
    pub fn voice_count(&self) -> usize {
        self.gains.len()
    }

    /// Gain for one sample: silent when out of bounds, at or below the
    /// threshold, or NaN; otherwise proportional to B clamped to [0, 1]
    pub fn gain_for(&self, sample: Option<f32>) -> f32 {
        match sample {
            Some(b) if b > self.silence_threshold => b.min(1.0) * self.loudness_ceiling,
            _ => 0.0,
        }
    }

    /// Update every voice from this frame's samples; voices without a sample
    /// are silenced. Returns the number of sounding voices.
    pub fn apply(&self, samples: &[Option<f32>]) -> usize {
        let mut sounding = 0;
        for voice in 0..self.gains.len() {
            let gain = self.gain_for(samples.get(voice).copied().flatten());
            if gain > 0.0 {
                sounding += 1;
            }
            self.gains.set(voice, gain);
        }
        sounding
    }

    /// Silence all voices
    pub fn silence(&self) {
        for voice in 0..self.gains.len() {
            self.gains.set(voice, 0.0);
        }
    }
}
