//! Lantern OpenGL backend
//!
//! The driver-facing half of the engine: GPU objects (programs, textures,
//! targets, buffers, meshes) held in generational-handle tables with
//! deferred destruction, a command executor with a bound-state cache, the
//! 2D batcher with text layout, and the built-in asset types.
//!
//! # Architecture
//!
//! Driver calls go through the [`GlApi`] seam. [`driver::Gl45`] implements
//! it over loaded OpenGL 4.5 function pointers (direct state access
//! throughout); tests substitute a recording driver, so everything above
//! the seam runs without a GPU.
//!
//! A frame looks like:
//!
//! 1. record geometry and text into [`Batcher2d`], state into
//!    [`GpuCommand`] lists,
//! 2. `batcher.bake(...)`: render font atlases, patch glyph UVs, upload
//!    the frame mesh,
//! 3. `batcher.issue_commands(...)` then `graphics.execute(...)`,
//! 4. `graphics.run_deferred()`: destroy objects freed during the frame.

pub mod asset_types;
pub mod batcher;
pub mod driver;
pub mod error;
pub mod execute;
pub mod font;
pub mod graphics;
pub mod text;

mod buffer;
mod mesh;
mod program;
mod target;
mod texture;

pub use asset_types::{BytesAsset, GfxWorld, ShaderAsset, TargetAsset};
pub use batcher::{Batch, Batcher2d, Vertex2d};
pub use driver::{DriverCaps, DriverUniform, Gl45, GlApi, ShaderStage};
pub use error::GfxError;
pub use font::{FontAsset, FontAtlas, Glyph};
pub use graphics::{ClipSpace, Graphics, ProgramUniform};
pub use text::{Utf8Step, Utf8Walk};

pub use lantern_core::gfx::GpuCommand;
