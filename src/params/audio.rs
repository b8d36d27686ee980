//! Oscillator bank and sonification configuration.

/// Oscillator bank configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Number of persistent voices (one per radial sample)
    pub voice_count: usize,

    /// Frequency of voice 0 in equal temperament (Hz, A0)
    pub base_frequency_hz: f32,

    /// Gain of a voice whose sample is fully saturated (B = 1)
    pub loudness_ceiling: f32,

    /// Normalized B concentration at or below which a voice stays silent
    /// (one 8-bit quantization step)
    pub silence_threshold: f32,

    /// Time constant of the per-voice gain smoothing in the synth (ms)
    pub gain_smoothing_ms: f32,

    /// Sample rate used for offline rendering (Hz)
    pub offline_sample_rate_hz: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            voice_count: 88,
            base_frequency_hz: 27.5,
            loudness_ceiling: 0.05,
            silence_threshold: 1.0 / 255.0,
            gain_smoothing_ms: 10.0,
            offline_sample_rate_hz: 44100,
        }
    }
}

impl AudioConfig {
    /// Validate configuration (non-empty bank, sane ceiling)
    pub fn validate(&self) -> Result<(), String> {
        if self.voice_count < 2 {
            return Err(format!(
                "Voice count must be at least 2, got {}",
                self.voice_count
            ));
        }
        if self.loudness_ceiling.is_nan() || self.loudness_ceiling < 0.0 {
            return Err("Loudness ceiling must be >= 0".to_string());
        }
        if self.offline_sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        Ok(())
    }
}
