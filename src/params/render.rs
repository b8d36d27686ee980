//! Rendering, sweep and recording configuration.

use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Initial window width (pixels)
    pub window_width: u32,

    /// Initial window height (pixels)
    pub window_height: u32,

    /// Field size in cells (square). `None` derives it from the window.
    pub grid_size: Option<u32>,

    /// Sweep overlay color (linear RGBA)
    pub sweep_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 768,
            window_height: 768,
            grid_size: None,
            sweep_color: [0.9, 0.2, 0.2, 1.0],
        }
    }
}

impl RenderConfig {
    /// Field size for a window of the given size: the shorter side rounded down
    /// to a power of two, unless an explicit size was requested
    pub fn grid_size_for(&self, width: u32, height: u32) -> u32 {
        self.grid_size
            .unwrap_or_else(|| floor_power_of_two(width.min(height)).max(16))
    }

    /// Validate configuration (non-empty field, visible window)
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_size == Some(0) {
            return Err("Grid size must be at least 1 cell".to_string());
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(format!(
                "Window size must be non-zero, got {}x{}",
                self.window_width, self.window_height
            ));
        }
        Ok(())
    }
}

/// Largest power of two less than or equal to `x` (0 for 0)
pub fn floor_power_of_two(x: u32) -> u32 {
    if x == 0 {
        0
    } else {
        1 << (31 - x.leading_zeros())
    }
}

/// Radial sweep configuration
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Angle advance per frame (radians)
    pub increment_rad: f32,

    /// Starting angle (radians)
    pub initial_angle_rad: f32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            increment_rad: 0.01, // ~10 s per revolution at 60 FPS
            initial_angle_rad: 0.0,
        }
    }
}

/// Headless recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Frames to simulate
    pub frames: usize,

    /// Output directory for snapshots and audio
    pub output_dir: PathBuf,

    /// Frame rate used to pace the offline audio (FPS)
    pub fps: u32,

    /// Write a PNG every N frames (0 disables snapshots)
    pub snapshot_every: usize,
}

impl RecordingConfig {
    pub fn new(frames: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames,
            output_dir: output_dir.into(),
            fps: 60,
            snapshot_every: 30,
        }
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Audio file path
    pub fn audio_path(&self) -> PathBuf {
        self.output_dir.join("audio.wav")
    }

    /// Snapshot path for a frame number
    pub fn frame_path(&self, frame: u64) -> PathBuf {
        self.frames_dir().join(format!("frame_{:05}.png", frame))
    }

    /// Audio samples rendered per simulated frame
    pub fn samples_per_frame(&self, sample_rate_hz: u32) -> usize {
        (sample_rate_hz / self.fps.max(1)) as usize
    }

    /// Whether `frame` should produce a snapshot
    pub fn wants_snapshot(&self, frame: u64) -> bool {
        self.snapshot_every != 0 && frame % self.snapshot_every as u64 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_power_of_two() {
        assert_eq!(floor_power_of_two(0), 0);
        assert_eq!(floor_power_of_two(1), 1);
        assert_eq!(floor_power_of_two(767), 512);
        assert_eq!(floor_power_of_two(1024), 1024);
        assert_eq!(floor_power_of_two(1080), 1024);
    }

    #[test]
    fn test_grid_size_prefers_explicit_size() {
        let mut config = RenderConfig::default();
        assert_eq!(config.grid_size_for(1920, 1080), 1024);

        config.grid_size = Some(256);
        assert_eq!(config.grid_size_for(1920, 1080), 256);
    }

    #[test]
    fn test_zero_grid_size_rejected() {
        assert!(RenderConfig::default().validate().is_ok());

        let config = RenderConfig {
            grid_size: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_recording_paths_and_pacing() {
        let config = RecordingConfig::new(120, "out");
        assert_eq!(config.audio_path(), PathBuf::from("out/audio.wav"));
        assert_eq!(
            config.frame_path(7),
            PathBuf::from("out/frames/frame_00007.png")
        );
        assert_eq!(config.samples_per_frame(44100), 735);
        assert!(config.wants_snapshot(0));
        assert!(config.wants_snapshot(30));
        assert!(!config.wants_snapshot(31));
    }
}
