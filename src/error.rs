//! Session error taxonomy.

use thiserror::Error;

/// Errors surfaced by the instrument and its collaborators.
///
/// Numeric divergence and out-of-bounds sweep samples are not errors:
/// both are valid simulation outcomes handled locally.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No adapter or device capable of running the compute kernel
    #[error("GPU unavailable: {0}")]
    GpuUnavailable(String),

    /// Shader module or pipeline failed validation
    #[error("failed to build {label}: {message}")]
    KernelBuild { label: &'static str, message: String },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("field read-back failed: {0}")]
    Readback(String),

    #[error("audio output unavailable: {0}")]
    Audio(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}
