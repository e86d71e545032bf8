//! OpenGL 4.5 driver
//!
//! Implements [`GlApi`] over the `gl` crate's loaded function pointers.
//! Everything goes through direct-state-access entry points
//! (`glCreate*`/`glNamed*`); nothing here binds an object just to mutate
//! it. This module is the only place GL constants appear.

use std::ffi::c_void;

use glam::{UVec2, Vec4};

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLuint};

use lantern_core::gfx::{
    BlendMode, CullMode, DataType, DepthMode, FilterMode, MeshMode, SamplerSettings, Swizzle,
    TextureParameters, TextureSettings, TextureType, WrapMode, Winding,
};

use crate::error::GfxError;

use super::{DriverCaps, DriverUniform, GlApi, ShaderStage};

pub struct Gl45 {
    caps: DriverCaps,
}

impl Gl45 {
    /// Loads function pointers through `loader` (e.g. the windowing
    /// library's `get_proc_address`) and queries driver limits. The GL
    /// context must be current on this thread.
    pub fn load_with<F>(mut loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        gl::load_with(|symbol| loader(symbol));

        unsafe {
            if gl::DebugMessageCallback::is_loaded() {
                gl::Enable(gl::DEBUG_OUTPUT);
                gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
                gl::DebugMessageCallback(Some(debug_message), std::ptr::null());
                gl::DebugMessageControl(
                    gl::DONT_CARE,
                    gl::DONT_CARE,
                    gl::DEBUG_SEVERITY_NOTIFICATION,
                    0,
                    std::ptr::null(),
                    gl::FALSE,
                );
            }
        }

        let mut max_units = 0;
        let mut max_texture_size = 0;
        let mut max_renderbuffer_size = 0;
        let mut major = 0;
        let mut minor = 0;
        unsafe {
            gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut max_units);
            gl::GetIntegerv(gl::MAX_TEXTURE_SIZE, &mut max_texture_size);
            gl::GetIntegerv(gl::MAX_RENDERBUFFER_SIZE, &mut max_renderbuffer_size);
            gl::GetIntegerv(gl::MAJOR_VERSION, &mut major);
            gl::GetIntegerv(gl::MINOR_VERSION, &mut minor);
        }

        let caps = DriverCaps {
            max_units: max_units.max(0) as u32,
            max_texture_size: max_texture_size.max(0) as u32,
            max_renderbuffer_size: max_renderbuffer_size.max(0) as u32,
            clip_control: (major, minor) >= (4, 5),
            glsl_version: (major.max(0) as u32) * 100 + (minor.max(0) as u32) * 10,
        };
        tracing::info!(
            "OpenGL {major}.{minor}: {} units, {}px textures, {}px renderbuffers",
            caps.max_units,
            caps.max_texture_size,
            caps.max_renderbuffer_size,
        );

        Self { caps }
    }
}

impl GlApi for Gl45 {
    fn caps(&self) -> DriverCaps {
        self.caps
    }

    fn clip_control_lower_left_zero_one(&self) {
        unsafe { gl::ClipControl(gl::LOWER_LEFT, gl::ZERO_TO_ONE) }
    }

    fn depth_range(&self, near: f32, far: f32) {
        unsafe { gl::DepthRangef(near, far) }
    }

    fn create_program(&self) -> u32 {
        unsafe { gl::CreateProgram() }
    }

    fn delete_program(&self, id: u32) {
        unsafe { gl::DeleteProgram(id) }
    }

    fn compile_shader(&self, stage: ShaderStage, sources: &[&str]) -> Result<u32, GfxError> {
        let pointers: Vec<*const GLchar> =
            sources.iter().map(|s| s.as_ptr() as *const GLchar).collect();
        let lengths: Vec<GLint> = sources.iter().map(|s| s.len() as GLint).collect();

        unsafe {
            let id = gl::CreateShader(shader_stage(stage));
            gl::ShaderSource(id, pointers.len() as GLsizei, pointers.as_ptr(), lengths.as_ptr());
            gl::CompileShader(id);

            let mut status = 0;
            gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut status);
            if status == GLint::from(gl::TRUE) {
                return Ok(id);
            }

            let log = shader_info_log(id);
            gl::DeleteShader(id);
            Err(GfxError::ShaderCompile(log))
        }
    }

    fn delete_shader(&self, id: u32) {
        unsafe { gl::DeleteShader(id) }
    }

    fn link_program(&self, program: u32, shaders: &[u32]) -> Result<(), GfxError> {
        unsafe {
            for &shader in shaders {
                gl::AttachShader(program, shader);
            }
            gl::LinkProgram(program);
            for &shader in shaders {
                gl::DetachShader(program, shader);
            }

            let mut status = 0;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
            if status == GLint::from(gl::TRUE) {
                Ok(())
            } else {
                Err(GfxError::ProgramLink(program_info_log(program)))
            }
        }
    }

    fn program_uniforms(&self, program: u32) -> Vec<DriverUniform> {
        let mut count = 0;
        let mut name_capacity = 0;
        unsafe {
            gl::GetProgramInterfaceiv(program, gl::UNIFORM, gl::ACTIVE_RESOURCES, &mut count);
            gl::GetProgramInterfaceiv(program, gl::UNIFORM, gl::MAX_NAME_LENGTH, &mut name_capacity);
        }

        let properties: [GLenum; 3] = [gl::TYPE, gl::ARRAY_SIZE, gl::LOCATION];
        let mut name_buffer = vec![0u8; name_capacity.max(1) as usize];
        let mut uniforms = Vec::with_capacity(count.max(0) as usize);

        for index in 0..count.max(0) as u32 {
            let mut values: [GLint; 3] = [0; 3];
            let mut name_length: GLsizei = 0;
            unsafe {
                gl::GetProgramResourceiv(
                    program,
                    gl::UNIFORM,
                    index,
                    properties.len() as GLsizei,
                    properties.as_ptr(),
                    values.len() as GLsizei,
                    std::ptr::null_mut(),
                    values.as_mut_ptr(),
                );
                gl::GetProgramResourceName(
                    program,
                    gl::UNIFORM,
                    index,
                    name_buffer.len() as GLsizei,
                    &mut name_length,
                    name_buffer.as_mut_ptr() as *mut GLchar,
                );
            }
            let name =
                String::from_utf8_lossy(&name_buffer[..name_length.max(0) as usize]).into_owned();
            let Some(data_type) = uniform_data_type(values[0] as GLenum) else {
                tracing::warn!("uniform '{name}' has unsupported type 0x{:x}", values[0]);
                continue;
            };
            uniforms.push(DriverUniform {
                name,
                data_type,
                array_size: values[1].max(1) as u32,
                location: values[2],
            });
        }
        uniforms
    }

    fn use_program(&self, id: u32) {
        unsafe { gl::UseProgram(id) }
    }

    fn upload_uniform(
        &self,
        program: u32,
        location: i32,
        data_type: DataType,
        array_size: u32,
        data: &[u8],
    ) {
        let count = array_size as GLsizei;
        let floats = data.as_ptr() as *const f32;
        let ints = data.as_ptr() as *const i32;
        let uints = data.as_ptr() as *const u32;
        unsafe {
            use DataType::*;
            match data_type {
                // units travel as int unit indices
                UnitU | UnitS | UnitF => gl::ProgramUniform1iv(program, location, count, ints),

                R32U => gl::ProgramUniform1uiv(program, location, count, uints),
                Rg32U => gl::ProgramUniform2uiv(program, location, count, uints),
                Rgb32U => gl::ProgramUniform3uiv(program, location, count, uints),
                Rgba32U => gl::ProgramUniform4uiv(program, location, count, uints),

                R32S => gl::ProgramUniform1iv(program, location, count, ints),
                Rg32S => gl::ProgramUniform2iv(program, location, count, ints),
                Rgb32S => gl::ProgramUniform3iv(program, location, count, ints),
                Rgba32S => gl::ProgramUniform4iv(program, location, count, ints),

                R32F => gl::ProgramUniform1fv(program, location, count, floats),
                Rg32F => gl::ProgramUniform2fv(program, location, count, floats),
                Rgb32F => gl::ProgramUniform3fv(program, location, count, floats),
                Rgba32F => gl::ProgramUniform4fv(program, location, count, floats),

                Mat2 => gl::ProgramUniformMatrix2fv(program, location, count, gl::FALSE, floats),
                Mat3 => gl::ProgramUniformMatrix3fv(program, location, count, gl::FALSE, floats),
                Mat4 => gl::ProgramUniformMatrix4fv(program, location, count, gl::FALSE, floats),

                other => {
                    tracing::warn!("unsupported uniform data type {other:?}");
                }
            }
        }
    }

    fn create_texture(&self) -> u32 {
        let mut id = 0;
        unsafe { gl::CreateTextures(gl::TEXTURE_2D, 1, &mut id) }
        id
    }

    fn delete_texture(&self, id: u32) {
        unsafe { gl::DeleteTextures(1, &id) }
    }

    fn texture_storage_2d(&self, id: u32, levels: u32, parameters: TextureParameters, size: UVec2) {
        unsafe {
            gl::TextureStorage2D(
                id,
                levels as GLsizei,
                sized_internal_format(parameters),
                size.x as GLsizei,
                size.y as GLsizei,
            );
        }
    }

    fn texture_sub_image_2d(
        &self,
        id: u32,
        size: UVec2,
        parameters: TextureParameters,
        pixels: &[u8],
    ) {
        unsafe {
            gl::TextureSubImage2D(
                id,
                0,
                0,
                0,
                size.x as GLsizei,
                size.y as GLsizei,
                pixel_format(parameters),
                pixel_type(parameters.data_type),
                pixels.as_ptr() as *const c_void,
            );
        }
    }

    fn generate_texture_mipmap(&self, id: u32) {
        unsafe { gl::GenerateTextureMipmap(id) }
    }

    fn texture_settings(&self, id: u32, settings: &TextureSettings) {
        let swizzle: [GLint; 4] = [
            swizzle_op(settings.swizzle[0], 0),
            swizzle_op(settings.swizzle[1], 1),
            swizzle_op(settings.swizzle[2], 2),
            swizzle_op(settings.swizzle[3], 3),
        ];
        unsafe {
            gl::TextureParameteri(id, gl::TEXTURE_MAX_LEVEL, settings.max_lod as GLint);
            gl::TextureParameteriv(id, gl::TEXTURE_SWIZZLE_RGBA, swizzle.as_ptr());
        }
    }

    fn texture_sampler(&self, id: u32, sampler: &SamplerSettings) {
        unsafe {
            gl::TextureParameterfv(id, gl::TEXTURE_BORDER_COLOR, sampler.border.as_ref().as_ptr());
            gl::TextureParameteri(
                id,
                gl::TEXTURE_MIN_FILTER,
                min_filter(sampler.mipmap, sampler.minification) as GLint,
            );
            gl::TextureParameteri(
                id,
                gl::TEXTURE_MAG_FILTER,
                mag_filter(sampler.magnification) as GLint,
            );
            gl::TextureParameteri(id, gl::TEXTURE_WRAP_S, wrap_mode(sampler.wrap_x) as GLint);
            gl::TextureParameteri(id, gl::TEXTURE_WRAP_T, wrap_mode(sampler.wrap_y) as GLint);
        }
    }

    fn bind_texture_unit(&self, unit: u32, id: u32) {
        unsafe { gl::BindTextureUnit(unit, id) }
    }

    fn create_framebuffer(&self) -> u32 {
        let mut id = 0;
        unsafe { gl::CreateFramebuffers(1, &mut id) }
        id
    }

    fn delete_framebuffer(&self, id: u32) {
        unsafe { gl::DeleteFramebuffers(1, &id) }
    }

    fn create_renderbuffer(&self) -> u32 {
        let mut id = 0;
        unsafe { gl::CreateRenderbuffers(1, &mut id) }
        id
    }

    fn delete_renderbuffer(&self, id: u32) {
        unsafe { gl::DeleteRenderbuffers(1, &id) }
    }

    fn renderbuffer_storage(&self, id: u32, parameters: TextureParameters, size: UVec2) {
        unsafe {
            gl::NamedRenderbufferStorage(
                id,
                sized_internal_format(parameters),
                size.x as GLsizei,
                size.y as GLsizei,
            );
        }
    }

    fn framebuffer_texture(&self, framebuffer: u32, ty: TextureType, color_index: u32, texture: u32) {
        unsafe {
            gl::NamedFramebufferTexture(framebuffer, attachment_point(ty, color_index), texture, 0);
        }
    }

    fn framebuffer_renderbuffer(
        &self,
        framebuffer: u32,
        ty: TextureType,
        color_index: u32,
        renderbuffer: u32,
    ) {
        unsafe {
            gl::NamedFramebufferRenderbuffer(
                framebuffer,
                attachment_point(ty, color_index),
                gl::RENDERBUFFER,
                renderbuffer,
            );
        }
    }

    fn check_framebuffer(&self, framebuffer: u32) -> Result<(), GfxError> {
        let status = unsafe { gl::CheckNamedFramebufferStatus(framebuffer, gl::FRAMEBUFFER) };
        if status == gl::FRAMEBUFFER_COMPLETE {
            Ok(())
        } else {
            Err(GfxError::TargetIncomplete(format!("status 0x{status:x}")))
        }
    }

    fn bind_framebuffer(&self, id: u32) {
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, id) }
    }

    fn create_buffer(&self) -> u32 {
        let mut id = 0;
        unsafe { gl::CreateBuffers(1, &mut id) }
        id
    }

    fn delete_buffer(&self, id: u32) {
        unsafe { gl::DeleteBuffers(1, &id) }
    }

    fn buffer_storage(&self, id: u32, size: usize, data: Option<&[u8]>) {
        let pointer = data.map_or(std::ptr::null(), |bytes| bytes.as_ptr() as *const c_void);
        unsafe {
            gl::NamedBufferStorage(id, size as isize, pointer, gl::DYNAMIC_STORAGE_BIT);
        }
    }

    fn buffer_sub_data(&self, id: u32, offset: usize, data: &[u8]) {
        unsafe {
            gl::NamedBufferSubData(
                id,
                offset as isize,
                data.len() as isize,
                data.as_ptr() as *const c_void,
            );
        }
    }

    fn bind_buffer_range(&self, index: u32, id: u32, offset: usize, length: usize) {
        unsafe {
            gl::BindBufferRange(
                gl::SHADER_STORAGE_BUFFER,
                index,
                id,
                offset as isize,
                length as isize,
            );
        }
    }

    fn create_vertex_array(&self) -> u32 {
        let mut id = 0;
        unsafe { gl::CreateVertexArrays(1, &mut id) }
        id
    }

    fn delete_vertex_array(&self, id: u32) {
        unsafe { gl::DeleteVertexArrays(1, &id) }
    }

    fn vertex_array_element_buffer(&self, vao: u32, buffer: u32) {
        unsafe { gl::VertexArrayElementBuffer(vao, buffer) }
    }

    fn vertex_array_vertex_buffer(&self, vao: u32, binding: u32, buffer: u32, stride: u32) {
        unsafe { gl::VertexArrayVertexBuffer(vao, binding, buffer, 0, stride as GLsizei) }
    }

    fn vertex_array_attribute(
        &self,
        vao: u32,
        binding: u32,
        location: u32,
        channels: u32,
        data_type: DataType,
        offset: u32,
    ) {
        unsafe {
            gl::EnableVertexArrayAttrib(vao, location);
            gl::VertexArrayAttribBinding(vao, location, binding);
            gl::VertexArrayAttribFormat(
                vao,
                location,
                channels as GLint,
                vertex_value_type(data_type),
                gl::FALSE,
                offset,
            );
        }
    }

    fn bind_vertex_array(&self, id: u32) {
        unsafe { gl::BindVertexArray(id) }
    }

    fn set_cull(&self, mode: CullMode, winding: Winding) {
        unsafe {
            match mode {
                CullMode::None => gl::Disable(gl::CULL_FACE),
                _ => {
                    gl::Enable(gl::CULL_FACE);
                    gl::CullFace(match mode {
                        CullMode::Back => gl::BACK,
                        CullMode::Front => gl::FRONT,
                        _ => gl::FRONT_AND_BACK,
                    });
                    gl::FrontFace(match winding {
                        Winding::Ccw => gl::CCW,
                        Winding::Cw => gl::CW,
                    });
                }
            }
        }
    }

    fn set_blend(&self, mode: BlendMode) {
        unsafe {
            match blend_func(mode) {
                None => {
                    gl::Disable(gl::BLEND);
                    gl::ColorMask(gl::TRUE, gl::TRUE, gl::TRUE, gl::TRUE);
                }
                Some(func) => {
                    gl::Enable(gl::BLEND);
                    gl::ColorMask(gl::TRUE, gl::TRUE, gl::TRUE, gl::TRUE);
                    gl::BlendEquationSeparate(func.color_op, func.alpha_op);
                    gl::BlendFuncSeparate(
                        func.color_src,
                        func.color_dst,
                        func.alpha_src,
                        func.alpha_dst,
                    );
                }
            }
        }
    }

    fn set_depth(&self, mode: DepthMode, reversed_z: bool) {
        unsafe {
            match mode {
                DepthMode::None => gl::Disable(gl::DEPTH_TEST),
                DepthMode::Transparent | DepthMode::Opaque => {
                    gl::Enable(gl::DEPTH_TEST);
                    gl::DepthMask(if mode == DepthMode::Opaque { gl::TRUE } else { gl::FALSE });
                    gl::DepthFunc(if reversed_z { gl::GREATER } else { gl::LESS });
                }
            }
        }
    }

    fn set_viewport(&self, size: UVec2) {
        unsafe { gl::Viewport(0, 0, size.x as GLsizei, size.y as GLsizei) }
    }

    fn clear(&self, mask: TextureType, color: Vec4, depth: f32, stencil: i32) {
        let mut bits = 0;
        if mask.contains(TextureType::COLOR) {
            bits |= gl::COLOR_BUFFER_BIT;
        }
        if mask.contains(TextureType::DEPTH) {
            bits |= gl::DEPTH_BUFFER_BIT;
        }
        if mask.contains(TextureType::STENCIL) {
            bits |= gl::STENCIL_BUFFER_BIT;
        }
        unsafe {
            gl::ClearColor(color.x, color.y, color.z, color.w);
            gl::ClearDepthf(depth);
            gl::ClearStencil(stencil);
            gl::Clear(bits);
        }
    }

    fn draw_arrays(&self, mode: MeshMode, offset: u32, count: u32, instances: u32) {
        unsafe {
            gl::DrawArraysInstanced(
                mesh_mode(mode),
                offset as GLint,
                count as GLsizei,
                instances as GLsizei,
            );
        }
    }

    fn draw_elements(
        &self,
        mode: MeshMode,
        count: u32,
        index_type: DataType,
        byte_offset: usize,
        instances: u32,
    ) {
        unsafe {
            gl::DrawElementsInstanced(
                mesh_mode(mode),
                count as GLsizei,
                index_value_type(index_type),
                byte_offset as *const c_void,
                instances as GLsizei,
            );
        }
    }
}

// ----- translation tables -----

fn shader_stage(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        ShaderStage::Geometry => gl::GEOMETRY_SHADER,
        ShaderStage::Compute => gl::COMPUTE_SHADER,
    }
}

fn uniform_data_type(value: GLenum) -> Option<DataType> {
    Some(match value {
        gl::SAMPLER_2D | gl::SAMPLER_2D_SHADOW | gl::SAMPLER_2D_ARRAY | gl::SAMPLER_3D
        | gl::SAMPLER_CUBE => DataType::UnitF,
        gl::INT_SAMPLER_2D | gl::INT_SAMPLER_3D | gl::INT_SAMPLER_CUBE => DataType::UnitS,
        gl::UNSIGNED_INT_SAMPLER_2D | gl::UNSIGNED_INT_SAMPLER_3D
        | gl::UNSIGNED_INT_SAMPLER_CUBE => DataType::UnitU,

        gl::UNSIGNED_INT => DataType::R32U,
        gl::UNSIGNED_INT_VEC2 => DataType::Rg32U,
        gl::UNSIGNED_INT_VEC3 => DataType::Rgb32U,
        gl::UNSIGNED_INT_VEC4 => DataType::Rgba32U,

        gl::INT => DataType::R32S,
        gl::INT_VEC2 => DataType::Rg32S,
        gl::INT_VEC3 => DataType::Rgb32S,
        gl::INT_VEC4 => DataType::Rgba32S,

        gl::FLOAT => DataType::R32F,
        gl::FLOAT_VEC2 => DataType::Rg32F,
        gl::FLOAT_VEC3 => DataType::Rgb32F,
        gl::FLOAT_VEC4 => DataType::Rgba32F,

        gl::FLOAT_MAT2 => DataType::Mat2,
        gl::FLOAT_MAT3 => DataType::Mat3,
        gl::FLOAT_MAT4 => DataType::Mat4,

        _ => return None,
    })
}

fn sized_internal_format(parameters: TextureParameters) -> GLenum {
    use DataType::*;
    let ty = parameters.texture_type;
    if ty == TextureType::COLOR {
        match parameters.data_type {
            R8Unorm => gl::R8,
            Rg8Unorm => gl::RG8,
            Rgb8Unorm => gl::RGB8,
            Rgba8Unorm => gl::RGBA8,
            R8U => gl::R8UI,
            Rg8U => gl::RG8UI,
            Rgb8U => gl::RGB8UI,
            Rgba8U => gl::RGBA8UI,
            R16Unorm => gl::R16,
            Rg16Unorm => gl::RG16,
            Rgb16Unorm => gl::RGB16,
            Rgba16Unorm => gl::RGBA16,
            R16F => gl::R16F,
            Rg16F => gl::RG16F,
            Rgb16F => gl::RGB16F,
            Rgba16F => gl::RGBA16F,
            R32U => gl::R32UI,
            Rg32U => gl::RG32UI,
            Rgb32U => gl::RGB32UI,
            Rgba32U => gl::RGBA32UI,
            R32S => gl::R32I,
            Rg32S => gl::RG32I,
            Rgb32S => gl::RGB32I,
            Rgba32S => gl::RGBA32I,
            R32F => gl::R32F,
            Rg32F => gl::RG32F,
            Rgb32F => gl::RGB32F,
            Rgba32F => gl::RGBA32F,
            other => {
                tracing::warn!("no sized color format for {other:?}, defaulting to RGBA8");
                gl::RGBA8
            }
        }
    } else if ty == TextureType::DEPTH {
        match parameters.data_type {
            R16Unorm => gl::DEPTH_COMPONENT16,
            R32F => gl::DEPTH_COMPONENT32F,
            _ => gl::DEPTH_COMPONENT24,
        }
    } else if ty == TextureType::STENCIL {
        gl::STENCIL_INDEX8
    } else {
        match parameters.data_type {
            R32F => gl::DEPTH32F_STENCIL8,
            _ => gl::DEPTH24_STENCIL8,
        }
    }
}

fn pixel_format(parameters: TextureParameters) -> GLenum {
    let ty = parameters.texture_type;
    if ty == TextureType::DEPTH {
        return gl::DEPTH_COMPONENT;
    }
    if ty == TextureType::STENCIL {
        return gl::STENCIL_INDEX;
    }
    if ty == TextureType::DEPTH_STENCIL {
        return gl::DEPTH_STENCIL;
    }
    let integer = parameters.data_type.is_integer();
    match (parameters.data_type.channels(), integer) {
        (1, false) => gl::RED,
        (2, false) => gl::RG,
        (3, false) => gl::RGB,
        (4, false) => gl::RGBA,
        (1, true) => gl::RED_INTEGER,
        (2, true) => gl::RG_INTEGER,
        (3, true) => gl::RGB_INTEGER,
        _ => gl::RGBA_INTEGER,
    }
}

fn pixel_type(data_type: DataType) -> GLenum {
    use DataType::*;
    match data_type {
        R8U | Rg8U | Rgb8U | Rgba8U | R8Unorm | Rg8Unorm | Rgb8Unorm | Rgba8Unorm => {
            gl::UNSIGNED_BYTE
        }
        R8S | Rg8S | Rgb8S | Rgba8S | R8Snorm | Rg8Snorm | Rgb8Snorm | Rgba8Snorm => gl::BYTE,
        R16U | Rg16U | Rgb16U | Rgba16U | R16Unorm | Rg16Unorm | Rgb16Unorm | Rgba16Unorm => {
            gl::UNSIGNED_SHORT
        }
        R16S | Rg16S | Rgb16S | Rgba16S | R16Snorm | Rg16Snorm | Rgb16Snorm | Rgba16Snorm => {
            gl::SHORT
        }
        R16F | Rg16F | Rgb16F | Rgba16F => gl::HALF_FLOAT,
        R32U | Rg32U | Rgb32U | Rgba32U => gl::UNSIGNED_INT,
        R32S | Rg32S | Rgb32S | Rgba32S => gl::INT,
        _ => gl::FLOAT,
    }
}

fn min_filter(mipmap: FilterMode, minification: FilterMode) -> GLenum {
    match (mipmap, minification) {
        (FilterMode::None, FilterMode::Lerp) => gl::LINEAR,
        (FilterMode::None, _) => gl::NEAREST,
        (FilterMode::Point, FilterMode::Lerp) => gl::LINEAR_MIPMAP_NEAREST,
        (FilterMode::Point, _) => gl::NEAREST_MIPMAP_NEAREST,
        (FilterMode::Lerp, FilterMode::Lerp) => gl::LINEAR_MIPMAP_LINEAR,
        (FilterMode::Lerp, _) => gl::NEAREST_MIPMAP_LINEAR,
    }
}

fn mag_filter(magnification: FilterMode) -> GLenum {
    match magnification {
        FilterMode::Lerp => gl::LINEAR,
        _ => gl::NEAREST,
    }
}

fn wrap_mode(mode: WrapMode) -> GLenum {
    match mode {
        WrapMode::Repeat => gl::REPEAT,
        WrapMode::Edge => gl::CLAMP_TO_EDGE,
        WrapMode::Border => gl::CLAMP_TO_BORDER,
        WrapMode::MirrorEdge => gl::MIRROR_CLAMP_TO_EDGE,
        WrapMode::MirrorRepeat => gl::MIRRORED_REPEAT,
    }
}

fn swizzle_op(op: Swizzle, channel: usize) -> GLint {
    (match op {
        Swizzle::None => match channel {
            0 => gl::RED,
            1 => gl::GREEN,
            2 => gl::BLUE,
            _ => gl::ALPHA,
        },
        Swizzle::Zero => gl::ZERO,
        Swizzle::One => gl::ONE,
        Swizzle::R => gl::RED,
        Swizzle::G => gl::GREEN,
        Swizzle::B => gl::BLUE,
        Swizzle::A => gl::ALPHA,
    }) as GLint
}

fn attachment_point(ty: TextureType, color_index: u32) -> GLenum {
    if ty == TextureType::DEPTH_STENCIL {
        gl::DEPTH_STENCIL_ATTACHMENT
    } else if ty.contains(TextureType::DEPTH) {
        gl::DEPTH_ATTACHMENT
    } else if ty.contains(TextureType::STENCIL) {
        gl::STENCIL_ATTACHMENT
    } else {
        gl::COLOR_ATTACHMENT0 + color_index
    }
}

struct BlendFunc {
    color_src: GLenum,
    color_dst: GLenum,
    color_op: GLenum,
    alpha_src: GLenum,
    alpha_dst: GLenum,
    alpha_op: GLenum,
}

fn blend_func(mode: BlendMode) -> Option<BlendFunc> {
    Some(match mode {
        BlendMode::None => return None,
        BlendMode::Mix => BlendFunc {
            color_src: gl::SRC_ALPHA,
            color_dst: gl::ONE_MINUS_SRC_ALPHA,
            color_op: gl::FUNC_ADD,
            alpha_src: gl::ONE,
            alpha_dst: gl::ONE,
            alpha_op: gl::MAX,
        },
        BlendMode::Pma => BlendFunc {
            color_src: gl::ONE,
            color_dst: gl::ONE_MINUS_SRC_ALPHA,
            color_op: gl::FUNC_ADD,
            alpha_src: gl::ONE,
            alpha_dst: gl::ONE,
            alpha_op: gl::MAX,
        },
        BlendMode::Add => BlendFunc {
            color_src: gl::ONE,
            color_dst: gl::ONE,
            color_op: gl::FUNC_ADD,
            alpha_src: gl::ONE,
            alpha_dst: gl::ONE,
            alpha_op: gl::FUNC_ADD,
        },
        BlendMode::Sub => BlendFunc {
            color_src: gl::ONE,
            color_dst: gl::ONE,
            color_op: gl::FUNC_REVERSE_SUBTRACT,
            alpha_src: gl::ONE,
            alpha_dst: gl::ONE,
            alpha_op: gl::FUNC_REVERSE_SUBTRACT,
        },
        BlendMode::Mul => BlendFunc {
            color_src: gl::ZERO,
            color_dst: gl::SRC_COLOR,
            color_op: gl::FUNC_ADD,
            alpha_src: gl::ZERO,
            alpha_dst: gl::SRC_ALPHA,
            alpha_op: gl::FUNC_ADD,
        },
        BlendMode::Scr => BlendFunc {
            color_src: gl::ONE_MINUS_DST_COLOR,
            color_dst: gl::ONE,
            color_op: gl::FUNC_ADD,
            alpha_src: gl::ONE_MINUS_DST_ALPHA,
            alpha_dst: gl::ONE,
            alpha_op: gl::FUNC_ADD,
        },
    })
}

fn mesh_mode(mode: MeshMode) -> GLenum {
    match mode {
        MeshMode::None | MeshMode::Points => gl::POINTS,
        MeshMode::Lines => gl::LINES,
        MeshMode::LineStrip => gl::LINE_STRIP,
        MeshMode::LineLoop => gl::LINE_LOOP,
        MeshMode::Triangles => gl::TRIANGLES,
        MeshMode::TriangleStrip => gl::TRIANGLE_STRIP,
        MeshMode::TriangleFan => gl::TRIANGLE_FAN,
    }
}

fn index_value_type(data_type: DataType) -> GLenum {
    match data_type {
        DataType::R8U => gl::UNSIGNED_BYTE,
        DataType::R16U => gl::UNSIGNED_SHORT,
        _ => gl::UNSIGNED_INT,
    }
}

fn vertex_value_type(data_type: DataType) -> GLenum {
    use DataType::*;
    match data_type {
        R8U | Rg8U | Rgb8U | Rgba8U | R8Unorm | Rg8Unorm | Rgb8Unorm | Rgba8Unorm => {
            gl::UNSIGNED_BYTE
        }
        R8S | Rg8S | Rgb8S | Rgba8S | R8Snorm | Rg8Snorm | Rgb8Snorm | Rgba8Snorm => gl::BYTE,
        R16U | Rg16U | Rgb16U | Rgba16U | R16Unorm | Rg16Unorm | Rgb16Unorm | Rgba16Unorm => {
            gl::UNSIGNED_SHORT
        }
        R16S | Rg16S | Rgb16S | Rgba16S | R16Snorm | Rg16Snorm | Rgb16Snorm | Rgba16Snorm => {
            gl::SHORT
        }
        R16F | Rg16F | Rgb16F | Rgba16F => gl::HALF_FLOAT,
        R32U | Rg32U | Rgb32U | Rgba32U => gl::UNSIGNED_INT,
        R32S | Rg32S | Rgb32S | Rgba32S => gl::INT,
        R64F | Rg64F | Rgb64F | Rgba64F => gl::DOUBLE,
        _ => gl::FLOAT,
    }
}

fn shader_info_log(id: GLuint) -> String {
    let mut length = 0;
    unsafe { gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut length) }
    if length <= 0 {
        return String::new();
    }
    let mut buffer = vec![0u8; length as usize];
    let mut written: GLsizei = 0;
    unsafe {
        gl::GetShaderInfoLog(id, length, &mut written, buffer.as_mut_ptr() as *mut GLchar);
    }
    String::from_utf8_lossy(&buffer[..written.max(0) as usize]).into_owned()
}

fn program_info_log(id: GLuint) -> String {
    let mut length = 0;
    unsafe { gl::GetProgramiv(id, gl::INFO_LOG_LENGTH, &mut length) }
    if length <= 0 {
        return String::new();
    }
    let mut buffer = vec![0u8; length as usize];
    let mut written: GLsizei = 0;
    unsafe {
        gl::GetProgramInfoLog(id, length, &mut written, buffer.as_mut_ptr() as *mut GLchar);
    }
    String::from_utf8_lossy(&buffer[..written.max(0) as usize]).into_owned()
}

extern "system" fn debug_message(
    _source: GLenum,
    kind: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user: *mut c_void,
) {
    let text = unsafe {
        let bytes = std::slice::from_raw_parts(message as *const u8, length.max(0) as usize);
        String::from_utf8_lossy(bytes).into_owned()
    };
    match severity {
        gl::DEBUG_SEVERITY_HIGH | gl::DEBUG_SEVERITY_MEDIUM => {
            tracing::error!("GL 0x{id:x} (type 0x{kind:x}): {text}");
        }
        gl::DEBUG_SEVERITY_LOW => tracing::warn!("GL 0x{id:x}: {text}"),
        _ => tracing::trace!("GL 0x{id:x}: {text}"),
    }
}
