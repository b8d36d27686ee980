//! GPU device setup and the compute-shader field backend.

mod context;
mod diffusion;

pub use context::GpuContext;
pub use diffusion::{DiffusionUniforms, GpuBackend, WORKGROUP_SIZE};
