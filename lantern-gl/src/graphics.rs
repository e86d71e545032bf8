//! GPU object layer state
//!
//! One [`Graphics`] owns every driver-side object table (programs,
//! textures, targets, buffers, meshes), the texture-unit table, the
//! bound-state cache, the clip-space description, the uniform-name
//! interner, and the defer queue for frame-delayed destruction. It is an
//! explicit context, not a global, so tests instantiate isolated worlds.
//!
//! Object lifecycles live in the sibling modules (`program`, `texture`,
//! `target`, `buffer`, `mesh`); command interpretation in `execute`.

use glam::{Mat4, UVec2, Vec2};

use hashbrown::HashMap;

use lantern_core::defer::DeferQueue;
use lantern_core::gfx::{
    DataType, Material, MeshParameters, SamplerSettings, TextureParameters, TextureSettings,
};
use lantern_core::handle::Handle;
use lantern_core::sparse::SparseSet;
use lantern_core::strings::StringTable;

use crate::driver::{DriverCaps, GlApi};

/// One introspected uniform of a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramUniform {
    pub data_type: DataType,
    pub array_size: u32,
    pub location: i32,
}

#[derive(Debug, Default)]
pub struct GpuProgram {
    pub(crate) id: u32,
    /// Uniform name id (into [`Graphics::uniform_id`]'s table) to shape.
    pub(crate) uniforms: HashMap<Handle, ProgramUniform>,
}

#[derive(Debug, Default)]
pub struct GpuTexture {
    pub(crate) id: u32,
    pub(crate) size: UVec2,
    pub(crate) parameters: TextureParameters,
    pub(crate) settings: TextureSettings,
    pub(crate) sampler: SamplerSettings,
}

#[derive(Debug)]
pub(crate) struct TargetBuffer {
    pub(crate) id: u32,
    pub(crate) parameters: TextureParameters,
}

#[derive(Debug, Default)]
pub struct GpuTarget {
    pub(crate) id: u32,
    pub(crate) size: UVec2,
    /// Sampleable attachments, owned.
    pub(crate) textures: Vec<Handle>,
    /// Opaque attachments (renderbuffers), owned.
    pub(crate) buffers: Vec<TargetBuffer>,
}

#[derive(Debug, Default)]
pub struct GpuBuffer {
    pub(crate) id: u32,
    /// Immutable storage size.
    pub(crate) capacity: usize,
    /// Live byte count.
    pub(crate) size: usize,
}

#[derive(Debug, Default)]
pub struct GpuMesh {
    pub(crate) id: u32,
    pub(crate) buffers: Vec<Handle>,
    pub(crate) parameters: Vec<MeshParameters>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Unit {
    pub(crate) texture: Handle,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Active {
    pub(crate) program: Handle,
    pub(crate) target: Handle,
    pub(crate) mesh: Handle,
}

/// Clip-space description baked into every compiled shader, so shader
/// code stays agnostic of the reverse-Z setup.
#[derive(Debug, Clone, Copy)]
pub struct ClipSpace {
    pub origin: Vec2,
    pub depth_near: f32,
    pub depth_far: f32,
    pub ndc_near: f32,
    pub ndc_far: f32,
}

pub struct Graphics<A: GlApi> {
    pub(crate) api: A,
    pub(crate) caps: DriverCaps,

    pub(crate) programs: SparseSet<GpuProgram>,
    pub(crate) textures: SparseSet<GpuTexture>,
    pub(crate) targets: SparseSet<GpuTarget>,
    pub(crate) buffers: SparseSet<GpuBuffer>,
    pub(crate) meshes: SparseSet<GpuMesh>,

    pub(crate) units: Vec<Unit>,
    pub(crate) active: Active,
    pub(crate) clip_space: ClipSpace,

    /// Uniform names; shared by program introspection, materials, and
    /// uniform bags.
    pub(crate) uniforms: StringTable,

    pub(crate) defer: DeferQueue<Graphics<A>>,
}

impl<A: GlApi> Graphics<A> {
    /// Takes ownership of a loaded driver and configures clip space:
    /// lower-left origin with zero-to-one depth when the driver can, and
    /// reverse-Z (near = 1, far = 0) always.
    pub fn new(api: A) -> Self {
        let caps = api.caps();

        if caps.clip_control {
            api.clip_control_lower_left_zero_one();
        }
        let clip_space = ClipSpace {
            origin: Vec2::new(0.0, if caps.clip_control { 0.0 } else { 1.0 }),
            depth_near: 1.0,
            depth_far: 0.0,
            ndc_near: if caps.clip_control { 0.0 } else { -1.0 },
            ndc_far: 1.0,
        };
        api.depth_range(clip_space.depth_near, clip_space.depth_far);

        Self {
            caps,
            units: vec![Unit::default(); caps.max_units as usize],
            active: Active::default(),
            clip_space,
            programs: SparseSet::new(),
            textures: SparseSet::new(),
            targets: SparseSet::new(),
            buffers: SparseSet::new(),
            meshes: SparseSet::new(),
            uniforms: StringTable::new(),
            defer: DeferQueue::new(),
            api,
        }
    }

    pub fn caps(&self) -> DriverCaps {
        self.caps
    }

    pub fn clip_space(&self) -> ClipSpace {
        self.clip_space
    }

    pub(crate) fn reversed_z(&self) -> bool {
        self.clip_space.depth_near > self.clip_space.depth_far
    }

    /// Interns a uniform name.
    pub fn uniform_id(&mut self, name: &str) -> Handle {
        self.uniforms.add(name)
    }

    /// Looks a uniform name up without interning.
    pub fn find_uniform(&self, name: &str) -> Handle {
        self.uniforms.find(name)
    }

    pub fn uniform_name(&self, id: Handle) -> Option<&str> {
        self.uniforms.get(id)
    }

    /// Runs destruction actions whose frame delay has expired. Call once
    /// per frame, after the frame's commands have been executed.
    pub fn run_deferred(&mut self) {
        for action in self.defer.due() {
            (action.invoke)(self, action.handle);
        }
    }

    /// Drains the defer queue and destroys every remaining object. The
    /// tables are left empty; outstanding handles stop resolving.
    pub fn shutdown(&mut self) {
        // Freeing a target or mesh re-enqueues its attachments, so keep
        // draining until the queue settles.
        loop {
            let actions = self.defer.drain_all();
            if actions.is_empty() {
                break;
            }
            for action in actions {
                (action.invoke)(self, action.handle);
            }
        }

        let leaked = self.programs.len()
            + self.textures.len()
            + self.targets.len()
            + self.buffers.len()
            + self.meshes.len();
        if leaked > 0 {
            tracing::warn!("{leaked} gpu objects leaked to shutdown");
        }

        for handle in self.targets.handles() {
            Self::target_free_now(self, handle);
        }
        for handle in self.meshes.handles() {
            Self::mesh_free_now(self, handle);
        }
        // Targets and meshes enqueue their attachment frees.
        loop {
            let actions = self.defer.drain_all();
            if actions.is_empty() {
                break;
            }
            for action in actions {
                (action.invoke)(self, action.handle);
            }
        }
        for handle in self.programs.handles() {
            Self::program_free_now(self, handle);
        }
        for handle in self.textures.handles() {
            Self::texture_free_now(self, handle);
        }
        for handle in self.buffers.handles() {
            Self::buffer_free_now(self, handle);
        }
    }

    /// Projection against the active clip space; column-major, column
    /// vectors, right-handed. `ortho` blends between perspective (0) and
    /// orthographic (1) so the same helper serves cameras and UI.
    pub fn projection(
        &self,
        scale_xy: Vec2,
        offset_xy: Vec2,
        view_near: f32,
        view_far: f32,
        ortho: f32,
    ) -> Mat4 {
        projection_mat4(
            scale_xy,
            offset_xy,
            view_near,
            view_far,
            ortho,
            self.clip_space.ndc_near,
            self.clip_space.ndc_far,
        )
    }

    pub(crate) fn select_program(&mut self, handle: Handle) {
        if self.active.program == handle {
            return;
        }
        self.active.program = handle;
        let id = self.programs.get(handle).map_or(0, |program| program.id);
        self.api.use_program(id);
    }

    pub(crate) fn select_target(&mut self, handle: Handle) {
        if self.active.target == handle {
            return;
        }
        self.active.target = handle;
        let id = self.targets.get(handle).map_or(0, |target| target.id);
        self.api.bind_framebuffer(id);
    }

    pub(crate) fn select_mesh(&mut self, handle: Handle) {
        if self.active.mesh == handle {
            return;
        }
        self.active.mesh = handle;
        let id = self.meshes.get(handle).map_or(0, |mesh| mesh.id);
        self.api.bind_vertex_array(id);
    }
}

/// Maps view-space z in `[view_near, view_far]` onto `[ndc_near, ndc_far]`,
/// lerping between a perspective and an orthographic mapping.
fn projection_mat4(
    scale_xy: Vec2,
    offset_xy: Vec2,
    view_near: f32,
    view_far: f32,
    ortho: f32,
    ndc_near: f32,
    ndc_far: f32,
) -> Mat4 {
    let reciprocal_depth = 1.0 / (view_far - view_near);

    let persp_scale_z = (ndc_far * view_far - ndc_near * view_near) * reciprocal_depth;
    let persp_offset_z = (ndc_near - ndc_far) * view_near * view_far * reciprocal_depth;

    let ortho_scale_z = (ndc_far - ndc_near) * reciprocal_depth;
    let ortho_offset_z = ndc_near - view_near * ortho_scale_z;

    let lerp = |a: f32, b: f32| a + (b - a) * ortho;

    Mat4::from_cols_array_2d(&[
        // column 0
        [scale_xy.x, 0.0, 0.0, 0.0],
        // column 1
        [0.0, scale_xy.y, 0.0, 0.0],
        // column 2
        [
            lerp(offset_xy.x, 0.0),
            lerp(offset_xy.y, 0.0),
            lerp(persp_scale_z, ortho_scale_z),
            lerp(1.0, 0.0),
        ],
        // column 3
        [
            lerp(0.0, offset_xy.x),
            lerp(0.0, offset_xy.y),
            lerp(persp_offset_z, ortho_offset_z),
            lerp(0.0, 1.0),
        ],
    ])
}

/// Applies a material's shader: records the program handle and rebuilds
/// the uniform bag with one zeroed entry per `p_`-prefixed program
/// uniform, ready for the caller to fill in.
pub fn material_set_shader<A: GlApi>(
    graphics: &Graphics<A>,
    material: &mut Material,
    program: Handle,
) {
    const PROPERTY_PREFIX: &str = "p_";

    material.program = program;
    material.uniforms.clear();
    let Some(gpu_program) = graphics.programs.get(program) else {
        return;
    };

    for (&id, uniform) in &gpu_program.uniforms {
        let Some(name) = graphics.uniforms.get(id) else {
            continue;
        };
        if !name.starts_with(PROPERTY_PREFIX) {
            continue;
        }
        let size = uniform.data_type.size_in_bytes() * uniform.array_size;
        material.uniforms.push_zeroed(id, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::recording::Recording;

    #[test]
    fn clip_space_is_reverse_z() {
        let graphics = Graphics::new(Recording::new());
        let clip = graphics.clip_space();
        assert_eq!(clip.depth_near, 1.0);
        assert_eq!(clip.depth_far, 0.0);
        assert_eq!(clip.ndc_near, 0.0);
        assert_eq!(clip.ndc_far, 1.0);
        assert!(graphics.reversed_z());
    }

    #[test]
    fn projection_maps_near_and_far() {
        let graphics = Graphics::new(Recording::new());

        // Perspective: view z = near lands on ndc_near, z = far on ndc_far.
        let projection = graphics.projection(Vec2::ONE, Vec2::ZERO, 0.1, 100.0, 0.0);
        let near = projection.project_point3(glam::Vec3::new(0.0, 0.0, 0.1));
        let far = projection.project_point3(glam::Vec3::new(0.0, 0.0, 100.0));
        assert!((near.z - 0.0).abs() < 1e-5, "near -> ndc_near, got {}", near.z);
        assert!((far.z - 1.0).abs() < 1e-4, "far -> ndc_far, got {}", far.z);

        // Orthographic: same endpoints, no perspective divide.
        let projection = graphics.projection(Vec2::ONE, Vec2::ZERO, 0.1, 100.0, 1.0);
        let near = projection * glam::Vec4::new(0.0, 0.0, 0.1, 1.0);
        let far = projection * glam::Vec4::new(0.0, 0.0, 100.0, 1.0);
        assert!((near.z - 0.0).abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-4);
        assert!((near.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shutdown_destroys_everything_including_pending_frees() {
        use glam::UVec2;
        use lantern_core::gfx::{
            BufferAsset, DataType, TargetDesc, TextureAsset, TextureParameters, TextureType,
        };

        use crate::driver::recording::Call;

        let mut graphics = Graphics::new(Recording::new());
        let texture = graphics.texture_init(&TextureAsset {
            size: UVec2::splat(2),
            parameters: TextureParameters {
                texture_type: TextureType::COLOR,
                data_type: DataType::Rgba8Unorm,
                ..Default::default()
            },
            pixels: vec![0; 16],
            ..Default::default()
        });
        graphics.buffer_init(&BufferAsset::bytes(&[0u8; 8]));
        graphics.target_init(&TargetDesc {
            size: UVec2::splat(16),
            attachments: vec![TextureParameters {
                texture_type: TextureType::COLOR,
                data_type: DataType::Rgba8Unorm,
                ..Default::default()
            }],
        });

        // One free still pending in the defer queue at shutdown.
        graphics.texture_free(texture);
        graphics.shutdown();

        assert_eq!(graphics.textures.len(), 0);
        assert_eq!(graphics.targets.len(), 0);
        assert_eq!(graphics.buffers.len(), 0);
        // Both standalone textures and the target attachment are gone.
        assert_eq!(graphics.api.count(|call| matches!(call, Call::DeleteTexture(_))), 2);
        assert_eq!(graphics.api.count(|call| matches!(call, Call::DeleteFramebuffer(_))), 1);
        assert_eq!(graphics.api.count(|call| matches!(call, Call::DeleteBuffer(_))), 1);
    }

    #[test]
    fn uniform_names_intern_once() {
        let mut graphics = Graphics::new(Recording::new());
        let a = graphics.uniform_id("p_color");
        let b = graphics.uniform_id("p_color");
        assert_eq!(a, b);
        assert_eq!(graphics.find_uniform("p_color"), a);
        assert!(graphics.find_uniform("unseen").is_none());
        assert_eq!(graphics.uniform_name(a), Some("p_color"));
    }
}
