//! Field buffer store: concentration grids, seed patterns and ping-pong roles.

mod buffers;
mod grid;
mod seed;

pub use buffers::{FieldBuffers, INITIAL_PREVIOUS};
pub use grid::{Cell, Field};
pub use seed::SeedPattern;
