//! 2D batcher and text layout
//!
//! Accumulates quads and laid-out text into one position+texcoord vertex
//! stream with a 32-bit index stream, segmenting the stream into minimal
//! material batches. The current matrix is folded into vertices on the
//! CPU, so a whole frame of 2D lives in a single mesh and matrix changes
//! never split a batch.
//!
//! Text goes through four passes: tokenize codepoints into blocks at
//! breaker codepoints; position blocks as if aligned to the top-left,
//! wrapping on overflow; re-align whole lines horizontally and the block
//! of lines vertically; emit quads for glyphs that survive clipping,
//! with UVs left zero. `bake` renders the font atlases once per frame,
//! patches the deferred UVs, and uploads the mesh.
//!
//! quad layout
//! 0-----------2
//! |         \ |
//! 1-----------3

use glam::{Mat4, Vec2};

use hashbrown::HashSet;

use lantern_core::assets::Assets;
use lantern_core::gfx::{
    Attribute, AttributeType, BufferAsset, GpuCommand, MeshAsset, MeshBufferAsset, MeshFlags,
    MeshMode, MeshParameters, Rect,
};
use lantern_core::handle::Handle;

use crate::driver::GlApi;
use crate::font::FontAsset;
use crate::graphics::Graphics;
use crate::text::{Utf8Walk, is_block_break, is_invisible};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

/// A contiguous index range sharing one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Batch {
    pub offset: u32,
    pub length: u32,
    pub material: Handle,
}

/// A run of codepoints ending at a breaker; the unit of text layout.
#[derive(Debug, Clone, Copy)]
struct TextBlock {
    codepoints_from: u32,
    codepoints_to: u32,
    vertices_offset: u32,
    font: Handle,
    pixel_size: f32,
    breaker: u32,
    position: Vec2,
    full_size_x: f32,
}

pub struct Batcher2d {
    batch: Batch,
    batches: Vec<Batch>,
    codepoints: Vec<u32>,
    texts: Vec<TextBlock>,
    fonts_seen: HashSet<Handle>,
    matrix: Mat4,
    vertices: Vec<Vertex2d>,
    indices: Vec<u32>,
    parameters: [MeshParameters; 2],
    mesh: Handle,
}

impl Batcher2d {
    /// Creates the batcher and its GPU mesh (empty vertex and index
    /// buffers, grown on first bake).
    pub fn new<A: GlApi>(graphics: &mut Graphics<A>) -> Self {
        let parameters = [
            // Layout only; the geometry draws through the index stream.
            MeshParameters {
                mode: MeshMode::None,
                data_type: lantern_core::gfx::DataType::R32F,
                flags: MeshFlags::empty(),
                attributes: [
                    Attribute::new(AttributeType::Position, 2),
                    Attribute::new(AttributeType::Texcoord, 2),
                    Attribute::default(),
                    Attribute::default(),
                ],
            },
            MeshParameters {
                mode: MeshMode::Triangles,
                data_type: lantern_core::gfx::DataType::R32U,
                flags: MeshFlags::INDEX,
                ..Default::default()
            },
        ];

        let buffers = [
            MeshBufferAsset {
                data: BufferAsset::reserve(0),
                parameters: parameters[0],
            },
            MeshBufferAsset {
                data: BufferAsset::reserve(0),
                parameters: parameters[1],
            },
        ];
        let mesh = graphics.mesh_init(&MeshAsset { buffers: &buffers });

        Self {
            batch: Batch::default(),
            batches: Vec::new(),
            codepoints: Vec::new(),
            texts: Vec::new(),
            fonts_seen: HashSet::new(),
            matrix: Mat4::IDENTITY,
            vertices: Vec::new(),
            indices: Vec::new(),
            parameters,
            mesh,
        }
    }

    /// Releases the batcher's GPU mesh (deferred).
    pub fn free<A: GlApi>(self, graphics: &mut Graphics<A>) {
        graphics.mesh_free(self.mesh);
    }

    pub fn mesh(&self) -> Handle {
        self.mesh
    }

    pub fn vertices(&self) -> &[Vertex2d] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Replaces the transform applied to subsequent vertices.
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
    }

    /// Switches the material; a real change closes the current batch.
    pub fn set_material(&mut self, material: Handle) {
        if self.batch.material != material {
            self.close_batch();
        }
        self.batch.material = material;
    }

    /// Appends one quad with the fixed index pattern.
    pub fn add_quad(&mut self, rect: Rect, uv: Rect) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[
            self.make_vertex(rect.min, uv.min),
            self.make_vertex(Vec2::new(rect.min.x, rect.max.y), Vec2::new(uv.min.x, uv.max.y)),
            self.make_vertex(Vec2::new(rect.max.x, rect.min.y), Vec2::new(uv.max.x, uv.min.y)),
            self.make_vertex(rect.max, uv.max),
        ]);
        self.indices.extend_from_slice(&[
            base + 3,
            base + 1,
            base,
            base,
            base + 2,
            base + 3,
        ]);
    }

    /// Lays `text` out inside `rect` and emits placeholder-UV quads for
    /// the visible glyphs. `alignment` is per-axis in `[0, 1]` (0 =
    /// left/bottom); `font` must resolve to a [`FontAsset`].
    pub fn add_text<C>(
        &mut self,
        assets: &mut Assets<C>,
        rect: Rect,
        alignment: Vec2,
        wrap: bool,
        font: Handle,
        text: &str,
        pixel_size: f32,
    ) {
        let Some(font_asset) = assets.get_mut::<FontAsset>(font) else {
            tracing::warn!("font {font:?} does not resolve, text dropped");
            return;
        };
        let atlas = font_asset.atlas.as_mut();

        let scale = atlas.scale(pixel_size);
        let font_ascent = atlas.ascent(scale);
        let font_descent = atlas.descent(scale);
        let line_gap = atlas.line_gap(scale);
        let line_height = font_ascent - font_descent + line_gap;

        let texts_offset = self.texts.len();

        atlas.add_glyph(0, pixel_size);
        let glyph_error = atlas.glyph(0, pixel_size).unwrap_or_default();

        // tokenize into crude text blocks
        {
            let mut block_width = 0.0f32;
            let mut block_from = self.codepoints.len() as u32;

            for step in Utf8Walk::new(text.as_bytes()) {
                atlas.add_glyph(step.codepoint, pixel_size);
                let full_size_x = atlas
                    .glyph(step.codepoint, pixel_size)
                    .map_or(glyph_error.full_size_x, |glyph| glyph.full_size_x);

                block_width += full_size_x;
                if is_block_break(step.codepoint) {
                    self.texts.push(TextBlock {
                        codepoints_from: block_from,
                        codepoints_to: self.codepoints.len() as u32,
                        vertices_offset: 0,
                        font,
                        pixel_size,
                        breaker: step.codepoint,
                        position: Vec2::ZERO,
                        full_size_x: block_width,
                    });
                    block_width = 0.0;
                    block_from = self.codepoints.len() as u32;
                }

                if !is_invisible(step.codepoint) {
                    self.codepoints.push(step.codepoint);
                    block_width += atlas.kerning(step.previous, step.codepoint, scale);
                }
            }

            if self.codepoints.len() as u32 > block_from {
                self.texts.push(TextBlock {
                    codepoints_from: block_from,
                    codepoints_to: self.codepoints.len() as u32,
                    vertices_offset: 0,
                    font,
                    pixel_size,
                    breaker: 0,
                    position: Vec2::ZERO,
                    full_size_x: block_width,
                });
            }
        }

        // position blocks as for alignment {0, 1}
        {
            let mut cursor = Vec2::new(rect.min.x, rect.max.y - font_ascent);

            for block_i in texts_offset..self.texts.len() {
                let block = self.texts[block_i];

                // break the line if the block overflows
                if wrap && cursor.x + block.full_size_x > rect.max.x {
                    cursor.x = rect.min.x;
                    cursor.y -= line_height;
                }
                self.texts[block_i].position = cursor;

                // advance over the block
                for index in block.codepoints_from..block.codepoints_to {
                    let codepoint = self.codepoints[index as usize];
                    let previous = if index > block.codepoints_from {
                        self.codepoints[index as usize - 1]
                    } else {
                        0
                    };
                    let full_size_x = atlas
                        .glyph(codepoint, pixel_size)
                        .map_or(glyph_error.full_size_x, |glyph| glyph.full_size_x);
                    cursor.x += full_size_x + atlas.kerning(previous, codepoint, scale);
                }

                // advance over the breaker
                let breaker = atlas.glyph(block.breaker, pixel_size).unwrap_or(glyph_error);
                cursor.x += breaker.full_size_x;
                if block.breaker == u32::from('\n') {
                    cursor.x = rect.min.x;
                    cursor.y -= line_height;
                }
            }
        }

        // re-align blocks; same y means same line
        {
            let error_margins = Vec2::new(
                0.0001 * (1.0 - 2.0 * alignment.x),
                0.0001 * (1.0 - 2.0 * alignment.y),
            );
            let rect_size = rect.size();

            let mut line_offset = texts_offset;
            let mut lines_count = 1u32;
            let mut line_position_y = 0.0f32;
            let mut line_width = 0.0f32;

            for block_i in texts_offset..self.texts.len() {
                let block = self.texts[block_i];

                if line_position_y != block.position.y {
                    let offset =
                        lerp(0.0, rect_size.x - line_width, alignment.x) + error_margins.x;
                    for aligned in &mut self.texts[line_offset..block_i] {
                        aligned.position.x += offset;
                    }
                    line_offset = block_i;
                    lines_count += 1;

                    line_position_y = block.position.y;
                    line_width = 0.0;
                }

                line_width += block.full_size_x;
            }

            {
                let offset = lerp(0.0, rect_size.x - line_width, alignment.x) + error_margins.x;
                for aligned in &mut self.texts[line_offset..] {
                    aligned.position.x += offset;
                }
            }

            {
                let height = lines_count as f32 * line_height;
                let offset = lerp((height - rect_size.y) - line_height, 0.0, alignment.y)
                    + error_margins.y;
                for aligned in &mut self.texts[texts_offset..] {
                    aligned.position.y += offset;
                }
            }
        }

        // emit crude vertices; UVs wait for the atlas render in `bake`
        let mut block_i = texts_offset;
        while block_i < self.texts.len() {
            let block = self.texts[block_i];
            self.texts[block_i].vertices_offset = self.vertices.len() as u32;

            let mut offset = block.position;
            if offset.y > rect.max.y {
                // above the rect: void the entry
                self.texts[block_i].codepoints_to = block.codepoints_from;
                block_i += 1;
                continue;
            }
            if offset.y < rect.min.y {
                // below the rect: drop the rest
                self.texts.truncate(block_i);
                break;
            }

            let mut from = block.codepoints_from;
            let mut to = block.codepoints_to;
            for index in block.codepoints_from..block.codepoints_to {
                let codepoint = self.codepoints[index as usize];
                let previous = if index > from {
                    self.codepoints[index as usize - 1]
                } else {
                    0
                };

                let glyph = atlas.glyph(codepoint, pixel_size).unwrap_or(glyph_error);
                let kerning = atlas.kerning(previous, codepoint, scale);
                let offset_x = offset.x + kerning;
                offset.x += glyph.full_size_x + kerning;

                if offset_x < rect.min.x {
                    // left of the rect: skip the glyph
                    from = index + 1;
                    continue;
                }
                if offset.x > rect.max.x {
                    // right of the rect: drop the rest
                    to = index;
                    break;
                }

                if !is_invisible(codepoint) {
                    let quad = Rect::new(
                        glyph.rect.min + Vec2::new(offset_x, offset.y),
                        glyph.rect.max + Vec2::new(offset_x, offset.y),
                    );
                    self.add_quad(quad, Rect::default());
                }
            }
            self.texts[block_i].codepoints_from = from;
            self.texts[block_i].codepoints_to = to;

            block_i += 1;
        }
    }

    /// Closes the open batch, renders and uploads the font atlases used
    /// this frame, patches the deferred glyph UVs, and uploads the
    /// vertex and index streams to the GPU mesh. Call before
    /// [`Batcher2d::issue_commands`].
    pub fn bake<A: GlApi, C>(&mut self, graphics: &mut Graphics<A>, assets: &mut Assets<C>) {
        self.close_batch();
        self.bake_texts(graphics, assets);

        let buffers = [
            MeshBufferAsset {
                data: BufferAsset::bytes(bytemuck::cast_slice(&self.vertices)),
                parameters: self.parameters[0],
            },
            MeshBufferAsset {
                data: BufferAsset::bytes(bytemuck::cast_slice(&self.indices)),
                parameters: self.parameters[1],
            },
        ];
        graphics.mesh_update(self.mesh, &MeshAsset { buffers: &buffers });
    }

    /// Appends one `Material` + `Draw` pair per completed batch, then
    /// forgets the batches.
    pub fn issue_commands<'a>(&mut self, out: &mut Vec<GpuCommand<'a>>) {
        self.close_batch();
        for batch in &self.batches {
            out.push(GpuCommand::Material {
                material: batch.material,
            });
            out.push(GpuCommand::Draw {
                mesh: self.mesh,
                offset: batch.offset,
                length: batch.length,
                instances: 1,
            });
        }
        self.batches.clear();
    }

    /// Resets every accumulator for the next frame.
    pub fn clear(&mut self) {
        self.batch = Batch::default();
        self.batches.clear();
        self.codepoints.clear();
        self.texts.clear();
        self.vertices.clear();
        self.indices.clear();
    }

    fn bake_texts<A: GlApi, C>(&mut self, graphics: &mut Graphics<A>, assets: &mut Assets<C>) {
        if self.texts.is_empty() {
            return;
        }

        // render each used atlas once, then push it to its texture
        self.fonts_seen.clear();
        for block in &self.texts {
            self.fonts_seen.insert(block.font);
        }
        for &font in &self.fonts_seen {
            let Some(font_asset) = assets.get_mut::<FontAsset>(font) else {
                continue;
            };
            font_asset.atlas.render();
            graphics.texture_update(font_asset.texture, font_asset.atlas.image());
        }

        // fill the deferred quad UVs
        for block_i in 0..self.texts.len() {
            let block = self.texts[block_i];
            let Some(font_asset) = assets.get::<FontAsset>(block.font) else {
                continue;
            };
            let atlas = font_asset.atlas.as_ref();

            let glyph_error_uv = atlas.glyph(0, block.pixel_size).unwrap_or_default().uv;
            let mut vertex = block.vertices_offset as usize;

            for index in block.codepoints_from..block.codepoints_to {
                let codepoint = self.codepoints[index as usize];
                if is_invisible(codepoint) {
                    continue;
                }
                let uv = atlas
                    .glyph(codepoint, block.pixel_size)
                    .map_or(glyph_error_uv, |glyph| glyph.uv);

                self.vertices[vertex].tex_coord = [uv.min.x, uv.min.y];
                self.vertices[vertex + 1].tex_coord = [uv.min.x, uv.max.y];
                self.vertices[vertex + 2].tex_coord = [uv.max.x, uv.min.y];
                self.vertices[vertex + 3].tex_coord = [uv.max.x, uv.max.y];
                vertex += 4;
            }
        }
    }

    fn close_batch(&mut self) {
        let offset = self.indices.len() as u32;
        if self.batch.offset < offset {
            self.batch.length = offset - self.batch.offset;
            self.batches.push(self.batch);

            self.batch.offset = offset;
            self.batch.length = 0;
        }
    }

    fn make_vertex(&self, position: Vec2, tex_coord: Vec2) -> Vertex2d {
        let m = &self.matrix;
        Vertex2d {
            position: [
                m.x_axis.x * position.x + m.y_axis.x * position.y + m.w_axis.x,
                m.x_axis.y * position.x + m.y_axis.y * position.y + m.w_axis.y,
            ],
            tex_coord: [tex_coord.x, tex_coord.y],
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::any::Any;

    use glam::{Vec2, Vec3};

    use hashbrown::HashMap;

    use lantern_core::assets::AssetTypeInfo;
    use lantern_core::gfx::{
        DataType, Materials, TextureAsset, TextureParameters, TextureType,
    };

    use crate::driver::recording::{Call, Recording};
    use crate::font::{FontAtlas, FontAsset, Glyph};

    type World = Graphics<Recording>;

    // Fixed-metric atlas: letters are 20 units wide, the space 10;
    // ascent 20 with no descent or gap. UVs appear after `render`.
    struct StubAtlas {
        glyphs: HashMap<u32, Glyph>,
        image: TextureAsset,
        rendered: bool,
    }

    impl StubAtlas {
        fn new() -> Self {
            Self {
                glyphs: HashMap::new(),
                image: TextureAsset {
                    size: glam::UVec2::splat(64),
                    parameters: TextureParameters {
                        texture_type: TextureType::COLOR,
                        data_type: DataType::R8Unorm,
                        ..Default::default()
                    },
                    pixels: vec![0; 64 * 64],
                    ..Default::default()
                },
                rendered: false,
            }
        }

        fn advance(codepoint: u32) -> f32 {
            match codepoint {
                0x20 => 10.0,
                0 => 5.0,
                _ => 20.0,
            }
        }
    }

    impl FontAtlas for StubAtlas {
        fn scale(&self, _pixel_size: f32) -> f32 {
            1.0
        }

        fn ascent(&self, _scale: f32) -> f32 {
            20.0
        }

        fn descent(&self, _scale: f32) -> f32 {
            0.0
        }

        fn line_gap(&self, _scale: f32) -> f32 {
            0.0
        }

        fn add_glyph(&mut self, codepoint: u32, _pixel_size: f32) {
            self.glyphs.entry(codepoint).or_insert(Glyph {
                rect: Rect::new(Vec2::ZERO, Vec2::new(20.0, 20.0)),
                uv: Rect::default(),
                full_size_x: Self::advance(codepoint),
                is_empty: is_invisible(codepoint),
            });
            self.rendered = false;
        }

        fn glyph(&self, codepoint: u32, _pixel_size: f32) -> Option<Glyph> {
            self.glyphs.get(&codepoint).copied()
        }

        fn kerning(&self, _previous: u32, _codepoint: u32, _scale: f32) -> f32 {
            0.0
        }

        fn render(&mut self) {
            self.rendered = true;
            for (&codepoint, glyph) in &mut self.glyphs {
                let u = (codepoint % 8) as f32 / 8.0;
                glyph.uv = Rect::new(Vec2::new(u, 0.0), Vec2::new(u + 0.125, 0.125));
            }
        }

        fn image(&self) -> &TextureAsset {
            &self.image
        }
    }

    fn font_load(
        ctx: &mut World,
        _assets: &mut Assets<World>,
        _handle: Handle,
    ) -> Option<Box<dyn Any>> {
        let texture = ctx.texture_init(&StubAtlas::new().image);
        Some(Box::new(FontAsset {
            atlas: Box::new(StubAtlas::new()),
            texture,
        }))
    }

    fn font_drop(
        ctx: &mut World,
        _assets: &mut Assets<World>,
        _handle: Handle,
        payload: Box<dyn Any>,
    ) {
        if let Ok(font) = payload.downcast::<FontAsset>() {
            ctx.texture_free(font.texture);
        }
    }

    fn world() -> (World, Assets<World>, Handle) {
        let mut graphics = Graphics::new(Recording::new());
        let mut assets: Assets<World> = Assets::new();
        assets.type_set(
            "font",
            AssetTypeInfo {
                load: font_load,
                drop: font_drop,
            },
        );
        assets.type_map("font", "font");
        let font = assets.load(&mut graphics, "stub.font");
        assert!(font.is_some());
        (graphics, assets, font)
    }

    fn rect(min: (f32, f32), max: (f32, f32)) -> Rect {
        Rect::new(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1))
    }

    #[test]
    fn quad_vertices_follow_the_layout_law() {
        let mut graphics = Graphics::new(Recording::new());
        let mut batcher = Batcher2d::new(&mut graphics);

        batcher.add_quad(rect((1.0, 2.0), (3.0, 5.0)), rect((0.0, 0.0), (1.0, 1.0)));

        let v = batcher.vertices();
        assert_eq!(v[0].position, [1.0, 2.0]);
        assert_eq!(v[1].position, [1.0, 5.0]);
        assert_eq!(v[2].position, [3.0, 2.0]);
        assert_eq!(v[3].position, [3.0, 5.0]);
        assert_eq!(v[0].tex_coord, [0.0, 0.0]);
        assert_eq!(v[1].tex_coord, [0.0, 1.0]);
        assert_eq!(v[2].tex_coord, [1.0, 0.0]);
        assert_eq!(v[3].tex_coord, [1.0, 1.0]);

        assert_eq!(batcher.indices(), &[3, 1, 0, 0, 2, 3]);
    }

    #[test]
    fn matrix_premultiplies_on_the_cpu() {
        let mut graphics = Graphics::new(Recording::new());
        let mut batcher = Batcher2d::new(&mut graphics);

        batcher.set_matrix(
            Mat4::from_translation(Vec3::new(10.0, 20.0, 0.0))
                * Mat4::from_scale(Vec3::new(2.0, 3.0, 1.0)),
        );
        batcher.add_quad(rect((1.0, 1.0), (2.0, 2.0)), Rect::default());

        let v = batcher.vertices();
        assert_eq!(v[0].position, [12.0, 23.0]);
        assert_eq!(v[3].position, [14.0, 26.0]);
    }

    #[test]
    fn batches_split_on_material_change_only() {
        let mut graphics = Graphics::new(Recording::new());
        let mut batcher = Batcher2d::new(&mut graphics);
        let mut materials = Materials::new();
        let m1 = materials.acquire();
        let m2 = materials.acquire();

        let unit = rect((0.0, 0.0), (1.0, 1.0));
        batcher.set_material(m1);
        batcher.add_quad(unit, Rect::default());
        batcher.set_matrix(Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0)));
        batcher.add_quad(unit, Rect::default());
        batcher.set_material(m1); // no-op switch
        batcher.set_material(m2);
        batcher.add_quad(unit, Rect::default());
        batcher.set_material(m1);
        batcher.add_quad(unit, Rect::default());
        batcher.add_quad(unit, Rect::default());

        let mut commands = Vec::new();
        batcher.issue_commands(&mut commands);

        // Three Material/Draw pairs; matrix changes never split.
        assert_eq!(commands.len(), 6);
        let mut last_material = Handle::NONE;
        let mut total_indices = 0;
        for pair in commands.chunks(2) {
            let GpuCommand::Material { material } = pair[0] else {
                panic!("expected a material command");
            };
            let GpuCommand::Draw { length, .. } = pair[1] else {
                panic!("expected a draw command");
            };
            assert_ne!(material, last_material, "adjacent batches share a material");
            last_material = material;
            total_indices += length;
        }
        assert_eq!(total_indices, 30, "five quads of six indices");
        assert_eq!(total_indices as usize, batcher.indices().len());

        // Issuing again emits nothing until new geometry arrives.
        let mut again = Vec::new();
        batcher.issue_commands(&mut again);
        assert!(again.is_empty());
    }

    #[test]
    fn text_wraps_into_lines() {
        let (mut graphics, mut assets, font) = world();
        let mut batcher = Batcher2d::new(&mut graphics);

        batcher.add_text(
            &mut assets,
            rect((0.0, 0.0), (100.0, 50.0)),
            Vec2::new(0.0, 1.0),
            true,
            font,
            "aa bb cc",
            20.0,
        );

        // Six visible letters, one quad each.
        assert_eq!(batcher.vertices().len(), 24);
        assert_eq!(batcher.indices().len(), 36);

        let v = batcher.vertices();
        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;

        // "aa" and "bb" sit on the first line (baseline y = 30), "cc"
        // wraps to the second (y = 10) starting back at the left edge.
        assert!(close(v[0].position[0], 0.0), "first a x {}", v[0].position[0]);
        assert!(close(v[0].position[1], 30.0), "first a y {}", v[0].position[1]);
        let bb = &v[8]; // third quad, first of "bb"
        assert!(close(bb.position[0], 50.0), "bb x {}", bb.position[0]);
        assert!(close(bb.position[1], 30.0), "bb y {}", bb.position[1]);
        let cc = &v[16]; // fifth quad, first of "cc"
        assert!(close(cc.position[0], 0.0), "cc x {}", cc.position[0]);
        assert!(close(cc.position[1], 10.0), "cc y {}", cc.position[1]);
    }

    #[test]
    fn newline_forces_a_line_feed() {
        let (mut graphics, mut assets, font) = world();
        let mut batcher = Batcher2d::new(&mut graphics);

        batcher.add_text(
            &mut assets,
            rect((0.0, 0.0), (200.0, 50.0)),
            Vec2::new(0.0, 1.0),
            false,
            font,
            "a\nb",
            20.0,
        );

        let v = batcher.vertices();
        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;
        assert_eq!(v.len(), 8);
        assert!(close(v[0].position[1], 30.0));
        assert!(close(v[4].position[0], 0.0), "carriage return");
        assert!(close(v[4].position[1], 10.0), "line feed");
    }

    #[test]
    fn bake_patches_uvs_and_uploads() {
        let (mut graphics, mut assets, font) = world();
        let mut batcher = Batcher2d::new(&mut graphics);
        let mut materials = Materials::new();
        let material = materials.acquire();

        batcher.set_material(material);
        batcher.add_text(
            &mut assets,
            rect((0.0, 0.0), (200.0, 40.0)),
            Vec2::new(0.0, 1.0),
            false,
            font,
            "ab",
            20.0,
        );
        assert_eq!(batcher.vertices()[0].tex_coord, [0.0, 0.0], "UVs deferred");

        graphics.api.clear_calls();
        batcher.bake(&mut graphics, &mut assets);

        // The atlas rendered and landed in the font texture.
        assert_eq!(
            graphics
                .api
                .count(|call| matches!(call, Call::TextureSubImage { .. })),
            1
        );
        // Mesh upload rebuilt the buffers (they started at zero capacity).
        assert_eq!(
            graphics
                .api
                .count(|call| matches!(call, Call::CreateVertexArray(_))),
            1
        );

        // UVs now come from the rendered atlas, quad-pattern ordered.
        let a = u32::from('a');
        let u = (a % 8) as f32 / 8.0;
        let v = batcher.vertices();
        assert_eq!(v[0].tex_coord, [u, 0.0]);
        assert_eq!(v[1].tex_coord, [u, 0.125]);
        assert_eq!(v[2].tex_coord, [u + 0.125, 0.0]);
        assert_eq!(v[3].tex_coord, [u + 0.125, 0.125]);

        let mut commands = Vec::new();
        batcher.issue_commands(&mut commands);
        assert_eq!(commands.len(), 2);
        graphics.execute(&commands, &materials);
        assert_eq!(
            graphics.api.count(|call| matches!(
                call,
                Call::DrawElements { count: 12, .. }
            )),
            1,
            "two glyph quads drawn"
        );
    }

    #[test]
    fn blocks_outside_the_rect_are_clipped() {
        let (mut graphics, mut assets, font) = world();
        let mut batcher = Batcher2d::new(&mut graphics);

        // Two lines fit; the third falls below the rect and is dropped
        // entirely.
        batcher.add_text(
            &mut assets,
            rect((0.0, 0.0), (200.0, 50.0)),
            Vec2::new(0.0, 1.0),
            false,
            font,
            "a\nb\nc",
            20.0,
        );

        let glyphs = batcher.vertices().len() / 4;
        assert_eq!(glyphs, 2, "third line clipped away");
    }

    #[test]
    fn clear_resets_all_accumulators() {
        let (mut graphics, mut assets, font) = world();
        let mut batcher = Batcher2d::new(&mut graphics);
        let mut materials = Materials::new();

        batcher.set_material(materials.acquire());
        batcher.add_quad(rect((0.0, 0.0), (1.0, 1.0)), Rect::default());
        batcher.add_text(
            &mut assets,
            rect((0.0, 0.0), (100.0, 40.0)),
            Vec2::ZERO,
            false,
            font,
            "a",
            20.0,
        );

        batcher.clear();
        assert!(batcher.vertices().is_empty());
        assert!(batcher.indices().is_empty());

        let mut commands = Vec::new();
        batcher.issue_commands(&mut commands);
        assert!(commands.is_empty());
    }
}
