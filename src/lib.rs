//! Diffusion Sonar - a Gray-Scott reaction-diffusion field swept by a radar
//! line and played as a bank of 88 sine voices
//!
//! The field runs on the GPU (wgpu compute) or on a rayon worker pool; each
//! frame the sweep samples chemical B along a ray from the center and the
//! samples set the gains of the oscillator bank.

pub mod audio;
pub mod cli;
pub mod controls;
pub mod error;
pub mod field;
pub mod gpu;
pub mod instrument;
pub mod params;
pub mod recording;
pub mod rendering;
pub mod snapshot;
pub mod stepper;
pub mod sweep;
