//! Built-in asset types
//!
//! Registration helpers for the types every application wants: raw
//! bytes, shader programs, and JSON-described render targets. They are
//! generic over the application context through [`GfxWorld`], the
//! accessor the loaders use to reach the graphics state.
//!
//! Font assets have no file loader here (rasterization is an external
//! collaborator), so applications build [`FontAsset`](crate::FontAsset)
//! values themselves and install them under their own type.

use core::any::Any;

use anyhow::Context as _;

use glam::UVec2;

use serde::Deserialize;

use lantern_core::assets::{AssetTypeInfo, Assets};
use lantern_core::gfx::{DataType, TargetDesc, TextureFlags, TextureParameters, TextureType};
use lantern_core::handle::Handle;

use crate::driver::GlApi;
use crate::graphics::Graphics;

/// Access to the graphics state from inside asset loaders.
pub trait GfxWorld {
    type Api: GlApi;

    fn graphics(&mut self) -> &mut Graphics<Self::Api>;
}

impl<A: GlApi> GfxWorld for Graphics<A> {
    type Api = A;

    fn graphics(&mut self) -> &mut Graphics<A> {
        self
    }
}

/// Whole-file contents; `.txt` by default.
pub struct BytesAsset {
    pub data: Vec<u8>,
}

/// A compiled GPU program; `.glsl` by default.
pub struct ShaderAsset {
    pub program: Handle,
}

/// A GPU render target described by a JSON file; `.target` by default.
pub struct TargetAsset {
    pub target: Handle,
}

/// Registers the built-in types and their default extensions.
pub fn register_builtin_types<C: GfxWorld + 'static>(assets: &mut Assets<C>) {
    register_bytes_type(assets);
    register_shader_type(assets);
    register_target_type(assets);
}

pub fn register_bytes_type<C: 'static>(assets: &mut Assets<C>) {
    assets.type_set(
        "bytes",
        AssetTypeInfo {
            load: bytes_load::<C>,
            drop: bytes_drop::<C>,
        },
    );
    assets.type_map("bytes", "txt");
}

pub fn register_shader_type<C: GfxWorld + 'static>(assets: &mut Assets<C>) {
    assets.type_set(
        "shader",
        AssetTypeInfo {
            load: shader_load::<C>,
            drop: shader_drop::<C>,
        },
    );
    assets.type_map("shader", "glsl");
}

pub fn register_target_type<C: GfxWorld + 'static>(assets: &mut Assets<C>) {
    assets.type_set(
        "target",
        AssetTypeInfo {
            load: target_load::<C>,
            drop: target_drop::<C>,
        },
    );
    assets.type_map("target", "target");
}

fn read_file<C>(assets: &Assets<C>, handle: Handle) -> Option<Vec<u8>> {
    let name = assets.name(handle)?.to_owned();
    match std::fs::read(&name).with_context(|| format!("reading '{name}'")) {
        Ok(data) => Some(data),
        Err(error) => {
            tracing::warn!("{error:#}");
            None
        }
    }
}

fn bytes_load<C>(_ctx: &mut C, assets: &mut Assets<C>, handle: Handle) -> Option<Box<dyn Any>> {
    let data = read_file(assets, handle)?;
    Some(Box::new(BytesAsset { data }))
}

fn bytes_drop<C>(_ctx: &mut C, _assets: &mut Assets<C>, _handle: Handle, _payload: Box<dyn Any>) {}

fn shader_load<C: GfxWorld>(
    ctx: &mut C,
    assets: &mut Assets<C>,
    handle: Handle,
) -> Option<Box<dyn Any>> {
    let data = read_file(assets, handle)?;
    let source = String::from_utf8_lossy(&data);
    let program = ctx.graphics().program_init(&source);
    if program.is_none() {
        return None;
    }
    Some(Box::new(ShaderAsset { program }))
}

fn shader_drop<C: GfxWorld>(
    ctx: &mut C,
    _assets: &mut Assets<C>,
    _handle: Handle,
    payload: Box<dyn Any>,
) {
    if let Ok(shader) = payload.downcast::<ShaderAsset>() {
        ctx.graphics().program_free(shader.program);
    }
}

#[derive(Deserialize)]
struct TargetFile {
    size: [u32; 2],
    buffers: Vec<TargetBufferFile>,
}

#[derive(Deserialize)]
struct TargetBufferFile {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    opaque: bool,
}

fn parse_target_buffer(entry: &TargetBufferFile) -> Option<TextureParameters> {
    let (texture_type, data_type) = match entry.kind.as_str() {
        "color_r8" => (TextureType::COLOR, DataType::R8Unorm),
        "color_rg8" => (TextureType::COLOR, DataType::Rg8Unorm),
        "color_rgba8" => (TextureType::COLOR, DataType::Rgba8Unorm),
        "color_rgba16f" => (TextureType::COLOR, DataType::Rgba16F),
        "color_rgba32f" => (TextureType::COLOR, DataType::Rgba32F),
        "depth_r16" => (TextureType::DEPTH, DataType::R16Unorm),
        "depth_r32f" => (TextureType::DEPTH, DataType::R32F),
        "stencil_r8" => (TextureType::STENCIL, DataType::R8U),
        "dstencil_r32f" => (TextureType::DEPTH_STENCIL, DataType::R32F),
        other => {
            tracing::warn!("unknown target buffer type '{other}'");
            return None;
        }
    };
    Some(TextureParameters {
        texture_type,
        data_type,
        flags: if entry.opaque {
            TextureFlags::OPAQUE
        } else {
            TextureFlags::empty()
        },
    })
}

fn target_load<C: GfxWorld>(
    ctx: &mut C,
    assets: &mut Assets<C>,
    handle: Handle,
) -> Option<Box<dyn Any>> {
    let data = read_file(assets, handle)?;
    let file: TargetFile = match serde_json::from_slice(&data) {
        Ok(file) => file,
        Err(error) => {
            tracing::warn!("malformed target description: {error}");
            return None;
        }
    };

    let desc = TargetDesc {
        size: UVec2::new(file.size[0], file.size[1]),
        attachments: file.buffers.iter().filter_map(parse_target_buffer).collect(),
    };
    if desc.size.x == 0 || desc.size.y == 0 || desc.attachments.is_empty() {
        tracing::warn!("degenerate target description");
        return None;
    }

    let target = ctx.graphics().target_init(&desc);
    if target.is_none() {
        return None;
    }
    Some(Box::new(TargetAsset { target }))
}

fn target_drop<C: GfxWorld>(
    ctx: &mut C,
    _assets: &mut Assets<C>,
    _handle: Handle,
    payload: Box<dyn Any>,
) {
    if let Ok(target) = payload.downcast::<TargetAsset>() {
        ctx.graphics().target_free(target.target);
    }
}
