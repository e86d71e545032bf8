//! GPU command list
//!
//! A frame is a linear array of these commands, executed strictly in
//! order by the executor in the GL crate. Handles resolve at execution
//! time; a handle freed earlier in the frame still resolves because
//! destruction is deferred a frame.

use glam::{UVec2, Vec4};

use crate::gfx::types::{BlendMode, CullMode, DepthMode, TextureType, Winding};
use crate::gfx::uniforms::UniformBag;
use crate::handle::Handle;

#[derive(Debug, Clone, Copy)]
pub enum GpuCommand<'a> {
    /// Toggle face culling; `CullMode::None` disables it.
    Cull { mode: CullMode, winding: Winding },

    /// Bind a render target (null handle = default framebuffer) and set
    /// the viewport to its size, or to `screen_size` for the default.
    Target { screen_size: UVec2, target: Handle },

    /// Clear the attachments in `mask`. Depth clears to the far plane of
    /// the active clip space, stencil to zero.
    Clear { mask: TextureType, color: Vec4 },

    /// Select a material: its program, blend and depth modes, and every
    /// entry of its uniform bag.
    Material { material: Handle },

    /// Select a program with explicit blend and depth state, bypassing
    /// materials.
    Shader {
        program: Handle,
        blend_mode: BlendMode,
        depth_mode: DepthMode,
    },

    /// Upload `count` entries of `uniforms` starting at `offset`. A null
    /// `program` applies to every live program.
    Uniform {
        program: Handle,
        uniforms: &'a UniformBag,
        offset: u32,
        count: u32,
    },

    /// Bind a range of a GPU buffer to a shader-storage slot.
    Buffer {
        buffer: Handle,
        index: u32,
        offset: usize,
        length: usize,
    },

    /// Draw a mesh range. `length == 0` draws the mesh's natural count;
    /// `instances` clamps to at least one.
    Draw {
        mesh: Handle,
        offset: u32,
        length: u32,
        instances: u32,
    },
}
