//! Graphics data model
//!
//! Driver-independent vocabulary shared by materials, meshes, the batcher,
//! and the command executor: data types, state modes, upload descriptions,
//! uniform bags, materials, and the GPU command list.

pub mod command;
pub mod material;
pub mod types;
pub mod uniforms;

pub use command::GpuCommand;
pub use material::{Material, Materials};
pub use types::*;
pub use uniforms::{UniformBag, UniformEntry};
