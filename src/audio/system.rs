//! Audio output system playing the oscillator bank through cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info};

use super::voices::{BankSynth, VoiceBank};
use crate::error::SessionError;
use crate::params::AudioConfig;

/// Audio system owning the output stream for the whole session
pub struct AudioSystem {
    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    pub device_name: String,
    pub sample_rate: u32,
}

impl AudioSystem {
    /// Open the default output device and start playing `bank`
    pub fn new(bank: &VoiceBank, config: &AudioConfig) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::Config)?;

        // Setup audio output device
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SessionError::Audio("No audio output device found".to_string()))?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported_config = device
            .default_output_config()
            .map_err(|e| SessionError::Audio(format!("Failed to get audio config: {}", e)))?;
        let stream_config = supported_config.config();
        let sample_rate = stream_config.sample_rate.0;

        info!("Audio: {} @ {}Hz", device_name, sample_rate);

        let synth = BankSynth::new(bank, sample_rate as f32, config.gain_smoothing_ms);
        let stream = match supported_config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, synth)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, synth)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, synth)?,
            other => {
                return Err(SessionError::Audio(format!(
                    "Unsupported output sample format: {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| SessionError::Audio(format!("Failed to start audio stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            device_name,
            sample_rate,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut synth: BankSynth,
) -> Result<cpal::Stream, SessionError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut mono = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                mono.resize(frames, 0.0);
                synth.render(&mut mono);

                // Same signal on every channel
                for (frame, &sample) in data.chunks_mut(channels).zip(mono.iter()) {
                    for out in frame.iter_mut() {
                        *out = T::from_sample(sample);
                    }
                }
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| SessionError::Audio(format!("Failed to build audio stream: {}", e)))
}
