//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (cells, seconds, Hz, radians per frame)
//! - Documented ranges and meanings
//! - Defaults that grow a stable pattern from the center seed

mod audio;
mod render;
mod simulation;

// Re-export all types
pub use audio::AudioConfig;
pub use render::{floor_power_of_two, RecordingConfig, RenderConfig, SweepConfig};
pub use simulation::{ParameterOverrides, SimulationParams};
