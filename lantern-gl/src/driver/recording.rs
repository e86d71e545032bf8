//! Recording driver for tests
//!
//! Implements [`GlApi`] without a GPU: object creation hands out ids from
//! a counter and every call is appended to a log the tests inspect.
//! Introspection results and failure modes are scripted per test.

use std::cell::{Cell, RefCell};

use glam::{UVec2, Vec4};

use lantern_core::gfx::{
    BlendMode, CullMode, DataType, DepthMode, MeshMode, SamplerSettings, TextureParameters,
    TextureSettings, TextureType, Winding,
};

use crate::error::GfxError;

use super::{DriverCaps, DriverUniform, GlApi, ShaderStage};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProgram(u32),
    DeleteProgram(u32),
    CompileShader { stage: ShaderStage, id: u32 },
    DeleteShader(u32),
    LinkProgram(u32),
    UseProgram(u32),
    UploadUniform {
        program: u32,
        location: i32,
        data_type: DataType,
        array_size: u32,
        data: Vec<u8>,
    },

    CreateTexture(u32),
    DeleteTexture(u32),
    TextureStorage { id: u32, levels: u32, size: UVec2 },
    TextureSubImage { id: u32, size: UVec2, bytes: usize },
    GenerateMipmap(u32),
    TextureSettings(u32),
    TextureSampler(u32),
    BindTextureUnit { unit: u32, id: u32 },

    CreateFramebuffer(u32),
    DeleteFramebuffer(u32),
    CreateRenderbuffer(u32),
    DeleteRenderbuffer(u32),
    RenderbufferStorage { id: u32, size: UVec2 },
    FramebufferTexture { framebuffer: u32, ty: TextureType, color_index: u32, texture: u32 },
    FramebufferRenderbuffer { framebuffer: u32, ty: TextureType, color_index: u32, renderbuffer: u32 },
    BindFramebuffer(u32),

    CreateBuffer(u32),
    DeleteBuffer(u32),
    BufferStorage { id: u32, size: usize, with_data: bool },
    BufferSubData { id: u32, offset: usize, len: usize },
    BindBufferRange { index: u32, id: u32, offset: usize, length: usize },

    CreateVertexArray(u32),
    DeleteVertexArray(u32),
    ElementBuffer { vao: u32, buffer: u32 },
    VertexBuffer { vao: u32, binding: u32, buffer: u32, stride: u32 },
    VertexAttribute { vao: u32, binding: u32, location: u32, channels: u32, offset: u32 },
    BindVertexArray(u32),

    SetCull { mode: CullMode, winding: Winding },
    SetBlend(BlendMode),
    SetDepth { mode: DepthMode, reversed_z: bool },
    SetViewport(UVec2),
    Clear { mask: TextureType, color: Vec4, depth: f32, stencil: i32 },
    DrawArrays { mode: MeshMode, offset: u32, count: u32, instances: u32 },
    DrawElements { mode: MeshMode, count: u32, index_type: DataType, byte_offset: usize, instances: u32 },

    ClipControl,
    DepthRange(f32, f32),
}

#[derive(Default)]
pub struct Recording {
    calls: RefCell<Vec<Call>>,
    next_id: Cell<u32>,
    /// Reported for every `program_uniforms` query.
    pub scripted_uniforms: RefCell<Vec<DriverUniform>>,
    pub fail_compile: Cell<bool>,
    pub fail_link: Cell<bool>,
    pub fail_framebuffer: Cell<bool>,
    caps: DriverCaps,
}

impl Recording {
    pub fn new() -> Self {
        Self {
            caps: DriverCaps {
                max_units: 4,
                ..DriverCaps::default()
            },
            ..Self::default()
        }
    }

    pub fn with_units(max_units: u32) -> Self {
        let mut recording = Self::new();
        recording.caps.max_units = max_units;
        recording
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count<F: Fn(&Call) -> bool>(&self, predicate: F) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    pub fn script_uniform(&self, name: &str, data_type: DataType, array_size: u32, location: i32) {
        self.scripted_uniforms.borrow_mut().push(DriverUniform {
            name: name.to_owned(),
            data_type,
            array_size,
            location,
        });
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

impl GlApi for Recording {
    fn caps(&self) -> DriverCaps {
        self.caps
    }

    fn clip_control_lower_left_zero_one(&self) {
        self.push(Call::ClipControl);
    }

    fn depth_range(&self, near: f32, far: f32) {
        self.push(Call::DepthRange(near, far));
    }

    fn create_program(&self) -> u32 {
        let id = self.id();
        self.push(Call::CreateProgram(id));
        id
    }

    fn delete_program(&self, id: u32) {
        self.push(Call::DeleteProgram(id));
    }

    fn compile_shader(&self, stage: ShaderStage, _sources: &[&str]) -> Result<u32, GfxError> {
        if self.fail_compile.get() {
            return Err(GfxError::ShaderCompile("scripted failure".into()));
        }
        let id = self.id();
        self.push(Call::CompileShader { stage, id });
        Ok(id)
    }

    fn delete_shader(&self, id: u32) {
        self.push(Call::DeleteShader(id));
    }

    fn link_program(&self, program: u32, _shaders: &[u32]) -> Result<(), GfxError> {
        if self.fail_link.get() {
            return Err(GfxError::ProgramLink("scripted failure".into()));
        }
        self.push(Call::LinkProgram(program));
        Ok(())
    }

    fn program_uniforms(&self, _program: u32) -> Vec<DriverUniform> {
        self.scripted_uniforms.borrow().clone()
    }

    fn use_program(&self, id: u32) {
        self.push(Call::UseProgram(id));
    }

    fn upload_uniform(
        &self,
        program: u32,
        location: i32,
        data_type: DataType,
        array_size: u32,
        data: &[u8],
    ) {
        self.push(Call::UploadUniform {
            program,
            location,
            data_type,
            array_size,
            data: data.to_vec(),
        });
    }

    fn create_texture(&self) -> u32 {
        let id = self.id();
        self.push(Call::CreateTexture(id));
        id
    }

    fn delete_texture(&self, id: u32) {
        self.push(Call::DeleteTexture(id));
    }

    fn texture_storage_2d(&self, id: u32, levels: u32, _parameters: TextureParameters, size: UVec2) {
        self.push(Call::TextureStorage { id, levels, size });
    }

    fn texture_sub_image_2d(
        &self,
        id: u32,
        size: UVec2,
        _parameters: TextureParameters,
        pixels: &[u8],
    ) {
        self.push(Call::TextureSubImage {
            id,
            size,
            bytes: pixels.len(),
        });
    }

    fn generate_texture_mipmap(&self, id: u32) {
        self.push(Call::GenerateMipmap(id));
    }

    fn texture_settings(&self, id: u32, _settings: &TextureSettings) {
        self.push(Call::TextureSettings(id));
    }

    fn texture_sampler(&self, id: u32, _sampler: &SamplerSettings) {
        self.push(Call::TextureSampler(id));
    }

    fn bind_texture_unit(&self, unit: u32, id: u32) {
        self.push(Call::BindTextureUnit { unit, id });
    }

    fn create_framebuffer(&self) -> u32 {
        let id = self.id();
        self.push(Call::CreateFramebuffer(id));
        id
    }

    fn delete_framebuffer(&self, id: u32) {
        self.push(Call::DeleteFramebuffer(id));
    }

    fn create_renderbuffer(&self) -> u32 {
        let id = self.id();
        self.push(Call::CreateRenderbuffer(id));
        id
    }

    fn delete_renderbuffer(&self, id: u32) {
        self.push(Call::DeleteRenderbuffer(id));
    }

    fn renderbuffer_storage(&self, id: u32, _parameters: TextureParameters, size: UVec2) {
        self.push(Call::RenderbufferStorage { id, size });
    }

    fn framebuffer_texture(&self, framebuffer: u32, ty: TextureType, color_index: u32, texture: u32) {
        self.push(Call::FramebufferTexture {
            framebuffer,
            ty,
            color_index,
            texture,
        });
    }

    fn framebuffer_renderbuffer(
        &self,
        framebuffer: u32,
        ty: TextureType,
        color_index: u32,
        renderbuffer: u32,
    ) {
        self.push(Call::FramebufferRenderbuffer {
            framebuffer,
            ty,
            color_index,
            renderbuffer,
        });
    }

    fn check_framebuffer(&self, _framebuffer: u32) -> Result<(), GfxError> {
        if self.fail_framebuffer.get() {
            Err(GfxError::TargetIncomplete("scripted failure".into()))
        } else {
            Ok(())
        }
    }

    fn bind_framebuffer(&self, id: u32) {
        self.push(Call::BindFramebuffer(id));
    }

    fn create_buffer(&self) -> u32 {
        let id = self.id();
        self.push(Call::CreateBuffer(id));
        id
    }

    fn delete_buffer(&self, id: u32) {
        self.push(Call::DeleteBuffer(id));
    }

    fn buffer_storage(&self, id: u32, size: usize, data: Option<&[u8]>) {
        self.push(Call::BufferStorage {
            id,
            size,
            with_data: data.is_some(),
        });
    }

    fn buffer_sub_data(&self, id: u32, offset: usize, data: &[u8]) {
        self.push(Call::BufferSubData {
            id,
            offset,
            len: data.len(),
        });
    }

    fn bind_buffer_range(&self, index: u32, id: u32, offset: usize, length: usize) {
        self.push(Call::BindBufferRange {
            index,
            id,
            offset,
            length,
        });
    }

    fn create_vertex_array(&self) -> u32 {
        let id = self.id();
        self.push(Call::CreateVertexArray(id));
        id
    }

    fn delete_vertex_array(&self, id: u32) {
        self.push(Call::DeleteVertexArray(id));
    }

    fn vertex_array_element_buffer(&self, vao: u32, buffer: u32) {
        self.push(Call::ElementBuffer { vao, buffer });
    }

    fn vertex_array_vertex_buffer(&self, vao: u32, binding: u32, buffer: u32, stride: u32) {
        self.push(Call::VertexBuffer {
            vao,
            binding,
            buffer,
            stride,
        });
    }

    fn vertex_array_attribute(
        &self,
        vao: u32,
        binding: u32,
        location: u32,
        channels: u32,
        _data_type: DataType,
        offset: u32,
    ) {
        self.push(Call::VertexAttribute {
            vao,
            binding,
            location,
            channels,
            offset,
        });
    }

    fn bind_vertex_array(&self, id: u32) {
        self.push(Call::BindVertexArray(id));
    }

    fn set_cull(&self, mode: CullMode, winding: Winding) {
        self.push(Call::SetCull { mode, winding });
    }

    fn set_blend(&self, mode: BlendMode) {
        self.push(Call::SetBlend(mode));
    }

    fn set_depth(&self, mode: DepthMode, reversed_z: bool) {
        self.push(Call::SetDepth { mode, reversed_z });
    }

    fn set_viewport(&self, size: UVec2) {
        self.push(Call::SetViewport(size));
    }

    fn clear(&self, mask: TextureType, color: Vec4, depth: f32, stencil: i32) {
        self.push(Call::Clear {
            mask,
            color,
            depth,
            stencil,
        });
    }

    fn draw_arrays(&self, mode: MeshMode, offset: u32, count: u32, instances: u32) {
        self.push(Call::DrawArrays {
            mode,
            offset,
            count,
            instances,
        });
    }

    fn draw_elements(
        &self,
        mode: MeshMode,
        count: u32,
        index_type: DataType,
        byte_offset: usize,
        instances: u32,
    ) {
        self.push(Call::DrawElements {
            mode,
            count,
            index_type,
            byte_offset,
            instances,
        });
    }
}
