//! Driver seam
//!
//! [`GlApi`] covers exactly the driver calls the object layer and the
//! executor perform, so the layer's bookkeeping (handle tables, state
//! cache, texture units, introspection handling) is testable without a
//! GPU. [`Gl45`] is the real implementation over OpenGL 4.5 direct state
//! access; translation tables from the shared enums to GL constants live
//! there and nowhere else.

mod gl45;

#[cfg(test)]
pub(crate) mod recording;

use glam::{UVec2, Vec4};

use lantern_core::gfx::{
    BlendMode, CullMode, DataType, DepthMode, MeshMode, SamplerSettings, TextureParameters,
    TextureSettings, TextureType, Winding,
};

use crate::error::GfxError;

pub use gl45::Gl45;

/// Stages a single source file can be compiled as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    Compute,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 4] = [
        ShaderStage::Vertex,
        ShaderStage::Fragment,
        ShaderStage::Geometry,
        ShaderStage::Compute,
    ];

    /// The define that both selects this stage in a multi-stage source and
    /// guards its `#ifdef` block.
    pub fn define(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX_SHADER",
            ShaderStage::Fragment => "FRAGMENT_SHADER",
            ShaderStage::Geometry => "GEOMETRY_SHADER",
            ShaderStage::Compute => "COMPUTE_SHADER",
        }
    }
}

/// Driver-reported limits and abilities, queried once at startup.
#[derive(Debug, Clone, Copy)]
pub struct DriverCaps {
    /// Combined texture/sampler units.
    pub max_units: u32,
    pub max_texture_size: u32,
    pub max_renderbuffer_size: u32,
    /// `glClipControl` availability (core in 4.5).
    pub clip_control: bool,
    /// GLSL `#version` to emit, e.g. 450.
    pub glsl_version: u32,
}

impl Default for DriverCaps {
    fn default() -> Self {
        Self {
            max_units: 16,
            max_texture_size: 1 << 14,
            max_renderbuffer_size: 1 << 14,
            clip_control: true,
            glsl_version: 450,
        }
    }
}

/// One active uniform reported by program introspection, untranslated:
/// the name still carries any `[0]` suffix.
#[derive(Debug, Clone)]
pub struct DriverUniform {
    pub name: String,
    pub data_type: DataType,
    pub array_size: u32,
    pub location: i32,
}

/// The raw driver surface.
///
/// Object arguments are driver ids (`GLuint`), never engine handles; the
/// object layer owns that mapping. Implementations are expected to be
/// main-thread confined, like the rest of the engine.
pub trait GlApi {
    fn caps(&self) -> DriverCaps;

    /// Configure lower-left origin with a zero-to-one depth range.
    fn clip_control_lower_left_zero_one(&self);
    fn depth_range(&self, near: f32, far: f32);

    // programs
    fn create_program(&self) -> u32;
    fn delete_program(&self, id: u32);
    /// Compile one stage from source fragments concatenated in order.
    fn compile_shader(&self, stage: ShaderStage, sources: &[&str]) -> Result<u32, GfxError>;
    fn delete_shader(&self, id: u32);
    /// Attach, link, detach. The shaders stay alive for the caller to
    /// delete.
    fn link_program(&self, program: u32, shaders: &[u32]) -> Result<(), GfxError>;
    fn program_uniforms(&self, program: u32) -> Vec<DriverUniform>;
    fn use_program(&self, id: u32);
    /// Upload one uniform; `data` is `array_size` packed elements of
    /// `data_type` (unit types take `i32` unit indices).
    fn upload_uniform(&self, program: u32, location: i32, data_type: DataType, array_size: u32, data: &[u8]);

    // textures
    fn create_texture(&self) -> u32;
    fn delete_texture(&self, id: u32);
    fn texture_storage_2d(&self, id: u32, levels: u32, parameters: TextureParameters, size: UVec2);
    fn texture_sub_image_2d(&self, id: u32, size: UVec2, parameters: TextureParameters, pixels: &[u8]);
    fn generate_texture_mipmap(&self, id: u32);
    fn texture_settings(&self, id: u32, settings: &TextureSettings);
    fn texture_sampler(&self, id: u32, sampler: &SamplerSettings);
    fn bind_texture_unit(&self, unit: u32, id: u32);

    // targets
    fn create_framebuffer(&self) -> u32;
    fn delete_framebuffer(&self, id: u32);
    fn create_renderbuffer(&self) -> u32;
    fn delete_renderbuffer(&self, id: u32);
    fn renderbuffer_storage(&self, id: u32, parameters: TextureParameters, size: UVec2);
    /// Attach a texture; `color_index` picks the attachment point for
    /// color, depth/stencil use their fixed points.
    fn framebuffer_texture(&self, framebuffer: u32, ty: TextureType, color_index: u32, texture: u32);
    fn framebuffer_renderbuffer(&self, framebuffer: u32, ty: TextureType, color_index: u32, renderbuffer: u32);
    fn check_framebuffer(&self, framebuffer: u32) -> Result<(), GfxError>;
    fn bind_framebuffer(&self, id: u32);

    // buffers
    fn create_buffer(&self) -> u32;
    fn delete_buffer(&self, id: u32);
    /// Immutable storage with the dynamic-storage flag; `None` data
    /// allocates without uploading.
    fn buffer_storage(&self, id: u32, size: usize, data: Option<&[u8]>);
    fn buffer_sub_data(&self, id: u32, offset: usize, data: &[u8]);
    fn bind_buffer_range(&self, index: u32, id: u32, offset: usize, length: usize);

    // meshes
    fn create_vertex_array(&self) -> u32;
    fn delete_vertex_array(&self, id: u32);
    fn vertex_array_element_buffer(&self, vao: u32, buffer: u32);
    fn vertex_array_vertex_buffer(&self, vao: u32, binding: u32, buffer: u32, stride: u32);
    fn vertex_array_attribute(&self, vao: u32, binding: u32, location: u32, channels: u32, data_type: DataType, offset: u32);
    fn bind_vertex_array(&self, id: u32);

    // fixed-function state and draws
    fn set_cull(&self, mode: CullMode, winding: Winding);
    fn set_blend(&self, mode: BlendMode);
    fn set_depth(&self, mode: DepthMode, reversed_z: bool);
    fn set_viewport(&self, size: UVec2);
    fn clear(&self, mask: TextureType, color: Vec4, depth: f32, stencil: i32);
    fn draw_arrays(&self, mode: MeshMode, offset: u32, count: u32, instances: u32);
    fn draw_elements(&self, mode: MeshMode, count: u32, index_type: DataType, byte_offset: usize, instances: u32);
}
