//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rand::{rngs::StdRng, SeedableRng};

use crate::audio::Tuning;
use crate::field::SeedPattern;
use crate::params::{ParameterOverrides, RecordingConfig, RenderConfig};

/// Initial concentration pattern
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PatternArg {
    /// Filled disk of B in a field of A
    Disk,
    /// Ring of B with no A inside it
    Ring,
}

/// Voice frequency assignment
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TuningArg {
    /// Successive semitones from A0
    Equal,
    /// Random chord in a random key, spread across octaves
    Chord,
}

/// Where the diffusion kernel runs in headless mode
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Cpu,
    Gpu,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "diffusion-sonar")]
#[command(about = "Gray-Scott reaction-diffusion swept by a radar line and played as 88 voices", long_about = None)]
pub struct Args {
    /// Diffusion rate of chemical A
    #[arg(long)]
    pub da: Option<f32>,

    /// Diffusion rate of chemical B
    #[arg(long)]
    pub db: Option<f32>,

    /// Feed rate
    #[arg(long)]
    pub feed: Option<f32>,

    /// Kill rate
    #[arg(long)]
    pub kill: Option<f32>,

    /// Time step per frame
    #[arg(long)]
    pub dt: Option<f32>,

    /// Field size in cells (default: window size rounded down to a power of two)
    #[arg(long, value_name = "CELLS", value_parser = clap::value_parser!(u32).range(1..))]
    pub size: Option<u32>,

    /// Initial pattern
    #[arg(long, value_enum, default_value_t = PatternArg::Disk)]
    pub pattern: PatternArg,

    /// Voice tuning
    #[arg(long, value_enum, default_value_t = TuningArg::Equal)]
    pub tuning: TuningArg,

    /// Seed for the chord/key choice (random when omitted)
    #[arg(long, value_name = "SEED")]
    pub rng_seed: Option<u64>,

    /// Run without a window, writing snapshots and audio.wav
    #[arg(long)]
    pub headless: bool,

    /// Frames to simulate in headless mode
    #[arg(long, default_value_t = 600)]
    pub frames: usize,

    /// Output directory for headless mode
    #[arg(long, value_name = "DIR", default_value = "recording")]
    pub output: PathBuf,

    /// Diffusion backend for headless mode
    #[arg(long, value_enum, default_value_t = BackendArg::Cpu)]
    pub backend: BackendArg,

    /// Write a snapshot every N frames (0 disables snapshots)
    #[arg(long, value_name = "N", default_value_t = 30)]
    pub snapshot_every: usize,
}

impl Args {
    /// Parameter overrides given on the command line
    pub fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            da: self.da,
            db: self.db,
            feed: self.feed,
            kill: self.kill,
            dt: self.dt,
        }
    }

    pub fn seed_pattern(&self) -> SeedPattern {
        match self.pattern {
            PatternArg::Disk => SeedPattern::default(),
            PatternArg::Ring => SeedPattern::ring(),
        }
    }

    pub fn tuning(&self) -> Tuning {
        match self.tuning {
            TuningArg::Equal => Tuning::EqualTemperament,
            TuningArg::Chord => {
                let mut rng = match self.rng_seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                Tuning::random_chord(&mut rng)
            }
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            grid_size: self.size,
            ..Default::default()
        }
    }

    /// Recording configuration for headless mode
    pub fn recording_config(&self) -> RecordingConfig {
        let mut config = RecordingConfig::new(self.frames, &self.output);
        config.snapshot_every = self.snapshot_every;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_carry_given_values() {
        let args = Args::parse_from(["diffusion-sonar", "--feed", "0.035", "--dt", "1.0"]);
        let overrides = args.overrides();
        assert_eq!(overrides.feed, Some(0.035));
        assert_eq!(overrides.dt, Some(1.0));
        assert_eq!(overrides.da, None);
        assert!(!args.headless);
        assert_eq!(args.seed_pattern(), SeedPattern::default());
    }

    #[test]
    fn test_seeded_chord_tuning_is_reproducible() {
        let args = Args::parse_from(["diffusion-sonar", "--tuning", "chord", "--rng-seed", "3"]);
        assert_eq!(args.tuning(), args.tuning());
        assert!(matches!(args.tuning(), Tuning::Chord { .. }));
    }

    #[test]
    fn test_headless_arguments() {
        let args = Args::parse_from([
            "diffusion-sonar",
            "--headless",
            "--frames",
            "90",
            "--backend",
            "gpu",
            "--pattern",
            "ring",
            "--size",
            "128",
        ]);
        assert!(args.headless);
        assert_eq!(args.backend, BackendArg::Gpu);
        assert_eq!(args.seed_pattern(), SeedPattern::ring());
        assert_eq!(args.render_config().grid_size_for(1920, 1080), 128);
        assert_eq!(args.recording_config().frames, 90);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let result = Args::try_parse_from(["diffusion-sonar", "--headless", "--size", "0"]);
        assert!(result.is_err());
    }
}
