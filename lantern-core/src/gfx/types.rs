//! Shared graphics types
//!
//! Stable identifiers that cross the asset/material/mesh/driver seams.
//! The driver backend owns the translation of each of these to API enums.

use bitflags::bitflags;
use glam::{UVec2, Vec2, Vec4};

/// Element types for uniforms, vertex attributes, pixels, and indices.
///
/// Scalars, 2/3/4-channel vectors of each scalar, texture units
/// (sampler kinds by element class), and square float matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    #[default]
    None,

    // texture units
    UnitU,
    UnitS,
    UnitF,

    // u8
    R8U,
    Rg8U,
    Rgb8U,
    Rgba8U,
    R8Unorm,
    Rg8Unorm,
    Rgb8Unorm,
    Rgba8Unorm,

    // s8
    R8S,
    Rg8S,
    Rgb8S,
    Rgba8S,
    R8Snorm,
    Rg8Snorm,
    Rgb8Snorm,
    Rgba8Snorm,

    // u16
    R16U,
    Rg16U,
    Rgb16U,
    Rgba16U,
    R16Unorm,
    Rg16Unorm,
    Rgb16Unorm,
    Rgba16Unorm,

    // s16
    R16S,
    Rg16S,
    Rgb16S,
    Rgba16S,
    R16Snorm,
    Rg16Snorm,
    Rgb16Snorm,
    Rgba16Snorm,

    // f16
    R16F,
    Rg16F,
    Rgb16F,
    Rgba16F,

    // u32 / s32 / f32
    R32U,
    Rg32U,
    Rgb32U,
    Rgba32U,
    R32S,
    Rg32S,
    Rgb32S,
    Rgba32S,
    R32F,
    Rg32F,
    Rgb32F,
    Rgba32F,

    // f64
    R64F,
    Rg64F,
    Rgb64F,
    Rgba64F,

    // matrices
    Mat2,
    Mat3,
    Mat4,
}

impl DataType {
    /// Channel count: 1 for scalars and units, 2/3/4 for vectors, the full
    /// element count for matrices.
    pub fn channels(self) -> u32 {
        use DataType::*;
        match self {
            None => 0,
            UnitU | UnitS | UnitF => 1,
            R8U | R8Unorm | R8S | R8Snorm | R16U | R16Unorm | R16S | R16Snorm | R16F | R32U
            | R32S | R32F | R64F => 1,
            Rg8U | Rg8Unorm | Rg8S | Rg8Snorm | Rg16U | Rg16Unorm | Rg16S | Rg16Snorm | Rg16F
            | Rg32U | Rg32S | Rg32F | Rg64F => 2,
            Rgb8U | Rgb8Unorm | Rgb8S | Rgb8Snorm | Rgb16U | Rgb16Unorm | Rgb16S | Rgb16Snorm
            | Rgb16F | Rgb32U | Rgb32S | Rgb32F | Rgb64F => 3,
            Rgba8U | Rgba8Unorm | Rgba8S | Rgba8Snorm | Rgba16U | Rgba16Unorm | Rgba16S
            | Rgba16Snorm | Rgba16F | Rgba32U | Rgba32S | Rgba32F | Rgba64F => 4,
            Mat2 => 4,
            Mat3 => 9,
            Mat4 => 16,
        }
    }

    /// Size of a single channel in bytes. Texture units travel as handles.
    pub fn element_size(self) -> u32 {
        use DataType::*;
        match self {
            None => 0,
            UnitU | UnitS | UnitF => 4,
            R8U | Rg8U | Rgb8U | Rgba8U | R8Unorm | Rg8Unorm | Rgb8Unorm | Rgba8Unorm | R8S
            | Rg8S | Rgb8S | Rgba8S | R8Snorm | Rg8Snorm | Rgb8Snorm | Rgba8Snorm => 1,
            R16U | Rg16U | Rgb16U | Rgba16U | R16Unorm | Rg16Unorm | Rgb16Unorm | Rgba16Unorm
            | R16S | Rg16S | Rgb16S | Rgba16S | R16Snorm | Rg16Snorm | Rgb16Snorm | Rgba16Snorm
            | R16F | Rg16F | Rgb16F | Rgba16F => 2,
            R32U | Rg32U | Rgb32U | Rgba32U | R32S | Rg32S | Rgb32S | Rgba32S | R32F | Rg32F
            | Rgb32F | Rgba32F => 4,
            R64F | Rg64F | Rgb64F | Rgba64F => 8,
            Mat2 | Mat3 | Mat4 => 4,
        }
    }

    pub fn size_in_bytes(self) -> u32 {
        self.channels() * self.element_size()
    }

    pub fn is_sampler(self) -> bool {
        matches!(self, DataType::UnitU | DataType::UnitS | DataType::UnitF)
    }

    pub fn is_integer(self) -> bool {
        use DataType::*;
        matches!(
            self,
            UnitU | UnitS
                | R8U | Rg8U | Rgb8U | Rgba8U
                | R8S | Rg8S | Rgb8S | Rgba8S
                | R16U | Rg16U | Rgb16U | Rgba16U
                | R16S | Rg16S | Rgb16S | Rgba16S
                | R32U | Rg32U | Rgb32U | Rgba32U
                | R32S | Rg32S | Rgb32S | Rgba32S
        )
    }
}

bitflags! {
    /// Attachment classes; depth-stencil is the union.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureType: u8 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
        const DEPTH_STENCIL = Self::DEPTH.bits() | Self::STENCIL.bits();
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u8 {
        /// Attach as a renderbuffer instead of a sampleable texture.
        const OPAQUE = 1 << 0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshFlags: u8 {
        /// The buffer holds indices, not vertices.
        const INDEX = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    None,
    Point,
    Lerp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    Edge,
    Border,
    MirrorEdge,
    MirrorRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Swizzle {
    /// Identity for the channel it sits in.
    #[default]
    None,
    Zero,
    One,
    R,
    G,
    B,
    A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    #[default]
    None,
    Back,
    Front,
    Both,
}

/// Front-face winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Winding {
    #[default]
    Ccw,
    Cw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// No blending; full color mask.
    #[default]
    None,
    /// lerp(Drgb, Srgb, Sa); max(Da, Sa)
    Mix,
    /// Drgb * (1 - Sa) + Srgb; max(Da, Sa)
    Pma,
    /// D + S
    Add,
    /// D - S
    Sub,
    /// D * S
    Mul,
    /// lerp(D, 1, S)
    Scr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthMode {
    #[default]
    None,
    /// Test, skip writing.
    Transparent,
    /// Test and write.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshMode {
    #[default]
    None,
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Vertex attribute semantics; the wire value minus one is the shader
/// attribute location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum AttributeType {
    #[default]
    None = 0,
    Position = 1,
    Texcoord = 2,
    Normal = 3,
    Color = 4,
}

impl AttributeType {
    /// Shader attribute location (0-based).
    pub fn location(self) -> Option<u32> {
        match self {
            AttributeType::None => None,
            other => Some(other as u32 - 1),
        }
    }
}

pub const MESH_ATTRIBUTES: usize = 4;

/// One vertex attribute: semantic plus channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attribute {
    pub ty: AttributeType,
    pub channels: u32,
}

impl Attribute {
    pub fn new(ty: AttributeType, channels: u32) -> Self {
        Self { ty, channels }
    }
}

/// Per-buffer mesh layout description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshParameters {
    pub mode: MeshMode,
    pub data_type: DataType,
    pub flags: MeshFlags,
    pub attributes: [Attribute; MESH_ATTRIBUTES],
}

impl MeshParameters {
    /// Byte stride of one vertex under this layout.
    pub fn vertex_size(&self) -> u32 {
        self.attributes
            .iter()
            .map(|attribute| attribute.channels * self.data_type.element_size())
            .sum()
    }

    pub fn is_index(&self) -> bool {
        self.flags.contains(MeshFlags::INDEX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureParameters {
    pub texture_type: TextureType,
    pub data_type: DataType,
    pub flags: TextureFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureSettings {
    /// Highest mip level; 0 disables the mip chain.
    pub max_lod: u32,
    pub swizzle: [Swizzle; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SamplerSettings {
    pub mipmap: FilterMode,
    pub minification: FilterMode,
    pub magnification: FilterMode,
    pub wrap_x: WrapMode,
    pub wrap_y: WrapMode,
    pub border: Vec4,
}

/// A decoded image ready for texture upload. Empty `pixels` allocates
/// storage without an initial upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureAsset {
    pub size: UVec2,
    pub parameters: TextureParameters,
    pub settings: TextureSettings,
    pub sampler: SamplerSettings,
    pub pixels: Vec<u8>,
}

/// Raw bytes for buffer upload. `data == None` reserves `size` bytes of
/// storage without uploading.
#[derive(Debug, Clone, Copy)]
pub struct BufferAsset<'a> {
    pub size: usize,
    pub data: Option<&'a [u8]>,
}

impl<'a> BufferAsset<'a> {
    pub fn bytes(data: &'a [u8]) -> Self {
        Self {
            size: data.len(),
            data: Some(data),
        }
    }

    pub fn reserve(size: usize) -> Self {
        Self { size, data: None }
    }
}

/// One mesh source buffer with its layout.
#[derive(Debug, Clone, Copy)]
pub struct MeshBufferAsset<'a> {
    pub data: BufferAsset<'a>,
    pub parameters: MeshParameters,
}

/// A parsed mesh: per-attribute buffers plus an optional index buffer,
/// each tagged by its parameters.
#[derive(Debug, Clone, Copy)]
pub struct MeshAsset<'a> {
    pub buffers: &'a [MeshBufferAsset<'a>],
}

/// Render target description: one attachment per entry, color attachment
/// points numbered in entry order.
#[derive(Debug, Clone, Default)]
pub struct TargetDesc {
    pub size: UVec2,
    pub attachments: Vec<TextureParameters>,
}

/// Axis-aligned rectangle, `min` bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}
