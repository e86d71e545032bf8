//! Font atlas seam
//!
//! Rasterization is not this crate's business: the batcher consumes any
//! [`FontAtlas`], anything that can collect glyphs, render them into a
//! coherent image on demand, and answer metric queries. A [`FontAsset`]
//! couples one atlas with the GPU texture its image uploads into.

use lantern_core::gfx::{Rect, TextureAsset};
use lantern_core::handle::Handle;

/// One rasterized glyph, in pixel units relative to the pen position.
///
/// `rect` is the quad to emit, `uv` its place in the atlas after the last
/// `render`, `full_size_x` the horizontal advance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Glyph {
    pub rect: Rect,
    pub uv: Rect,
    pub full_size_x: f32,
    pub is_empty: bool,
}

/// Rasterized glyph + kerning + vertical metrics provider.
///
/// Glyphs requested via [`FontAtlas::add_glyph`] may be packed lazily;
/// [`FontAtlas::render`] must leave the atlas image coherent, with every
/// previously requested glyph's `uv` valid. Implementations always carry
/// a fallback glyph for codepoint 0.
pub trait FontAtlas {
    /// Font scale for a pixel size.
    fn scale(&self, pixel_size: f32) -> f32;
    fn ascent(&self, scale: f32) -> f32;
    fn descent(&self, scale: f32) -> f32;
    fn line_gap(&self, scale: f32) -> f32;

    /// Requests a glyph for packing at the given pixel size.
    fn add_glyph(&mut self, codepoint: u32, pixel_size: f32);
    fn glyph(&self, codepoint: u32, pixel_size: f32) -> Option<Glyph>;
    fn kerning(&self, previous: u32, codepoint: u32, scale: f32) -> f32;

    /// Rasterizes pending glyphs into the atlas image.
    fn render(&mut self);
    /// The atlas image, coherent after the last `render`.
    fn image(&self) -> &TextureAsset;
}

/// A font as the batcher sees it: an atlas and the texture it uploads to.
/// Applications construct it from whatever rasterizer they use and hand
/// it to the asset registry.
pub struct FontAsset {
    pub atlas: Box<dyn FontAtlas>,
    pub texture: Handle,
}
