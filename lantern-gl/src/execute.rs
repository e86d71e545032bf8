//! Command executor
//!
//! Interprets a linear command array into driver calls. Commands run
//! strictly in order; the only optimization is the bound-state cache
//! (program, target, mesh) that skips redundant rebinds. Handles that
//! fail to resolve turn their command into a no-op, so a frame degrades
//! instead of crashing.

use smallvec::SmallVec;

use lantern_core::gfx::{BlendMode, DepthMode, GpuCommand, Materials, MeshMode, MeshParameters, UniformBag};
use lantern_core::handle::Handle;

use crate::driver::GlApi;
use crate::graphics::{Graphics, ProgramUniform};

impl<A: GlApi> Graphics<A> {
    /// Executes one frame's command list. `materials` resolves the
    /// handles carried by `Material` commands.
    pub fn execute(&mut self, commands: &[GpuCommand<'_>], materials: &Materials) {
        for command in commands {
            match *command {
                GpuCommand::Cull { mode, winding } => {
                    self.api.set_cull(mode, winding);
                }

                GpuCommand::Target {
                    screen_size,
                    target,
                } => {
                    self.select_target(target);
                    let viewport = if target.is_some() {
                        self.target_size(target)
                    } else {
                        screen_size
                    };
                    self.api.set_viewport(viewport);
                }

                GpuCommand::Clear { mask, color } => {
                    if mask.is_empty() {
                        tracing::warn!("clear mask is empty");
                        continue;
                    }
                    // Clears ignore blend and depth state; force both.
                    self.api.set_blend(BlendMode::None);
                    self.api.set_depth(DepthMode::Opaque, self.reversed_z());
                    self.api
                        .clear(mask, color, self.clip_space.depth_far, 0);
                }

                GpuCommand::Material { material } => {
                    let Some(material) = materials.get(material) else {
                        tracing::warn!("material {material:?} does not resolve");
                        self.select_program(Handle::NONE);
                        continue;
                    };
                    self.select_program(material.program);
                    self.api.set_blend(material.blend_mode);
                    self.api.set_depth(material.depth_mode, self.reversed_z());
                    self.upload_uniforms(
                        material.program,
                        &material.uniforms,
                        0,
                        material.uniforms.len() as u32,
                    );
                }

                GpuCommand::Shader {
                    program,
                    blend_mode,
                    depth_mode,
                } => {
                    self.select_program(program);
                    self.api.set_blend(blend_mode);
                    self.api.set_depth(depth_mode, self.reversed_z());
                }

                GpuCommand::Uniform {
                    program,
                    uniforms,
                    offset,
                    count,
                } => {
                    if program.is_some() {
                        self.upload_uniforms(program, uniforms, offset, count);
                    } else {
                        for program in self.programs.handles() {
                            self.upload_uniforms(program, uniforms, offset, count);
                        }
                    }
                }

                GpuCommand::Buffer {
                    buffer,
                    index,
                    offset,
                    length,
                } => {
                    let Some(gpu_buffer) = self.buffers.get(buffer) else {
                        continue;
                    };
                    self.api.bind_buffer_range(index, gpu_buffer.id, offset, length);
                }

                GpuCommand::Draw {
                    mesh,
                    offset,
                    length,
                    instances,
                } => {
                    self.execute_draw(mesh, offset, length, instances);
                }
            }
        }
    }

    fn execute_draw(&mut self, mesh: Handle, offset: u32, length: u32, instances: u32) {
        self.select_mesh(mesh);
        let Some(gpu_mesh) = self.meshes.get(mesh) else {
            return;
        };
        let instances = instances.max(1);

        let sub_buffers: SmallVec<[(Handle, MeshParameters); 4]> = gpu_mesh
            .buffers
            .iter()
            .zip(&gpu_mesh.parameters)
            .map(|(&handle, &parameters)| (handle, parameters))
            .collect();

        for (buffer_handle, parameters) in sub_buffers {
            if parameters.mode == MeshMode::None {
                continue;
            }
            let Some(buffer) = self.buffers.get(buffer_handle) else {
                continue;
            };
            if buffer.size == 0 {
                continue;
            }

            if parameters.is_index() {
                let element_size = parameters.data_type.size_in_bytes().max(1);
                let count = if length != 0 {
                    length
                } else {
                    (buffer.size / element_size as usize) as u32
                };
                let byte_offset = offset as usize * element_size as usize;
                self.api.draw_elements(
                    parameters.mode,
                    count,
                    parameters.data_type,
                    byte_offset,
                    instances,
                );
            } else {
                let vertex_size = parameters.vertex_size().max(1);
                let count = if length != 0 {
                    length
                } else {
                    (buffer.size / vertex_size as usize) as u32
                };
                self.api.draw_arrays(parameters.mode, offset, count, instances);
            }
        }
    }

    /// Uploads `[offset, offset + count)` of a uniform bag to a program.
    /// Entries whose byte size disagrees with the introspected
    /// `size_of(type) * array_size` are skipped without a driver call;
    /// sampler entries resolve their texture handles to units first.
    fn upload_uniforms(&mut self, program: Handle, bag: &UniformBag, offset: u32, count: u32) {
        let Some(gpu_program) = self.programs.get(program) else {
            return;
        };
        let program_id = gpu_program.id;

        let last = (offset + count).min(bag.len() as u32);
        let mut planned: SmallVec<[(ProgramUniform, usize); 16]> = SmallVec::new();
        for index in offset..last {
            let Some((entry, _)) = bag.entry(index as usize) else {
                continue;
            };
            let Some(&uniform) = gpu_program.uniforms.get(&entry.id) else {
                continue;
            };
            if uniform.data_type.size_in_bytes() * uniform.array_size != entry.size {
                tracing::warn!("uniform entry size mismatch, skipping upload");
                continue;
            }
            planned.push((uniform, index as usize));
        }

        for (uniform, index) in planned {
            let Some((_, payload)) = bag.entry(index) else {
                continue;
            };
            if uniform.data_type.is_sampler() {
                // The payload is packed texture handles; the bag gives no
                // alignment guarantee, so read them bytewise.
                let mut units: SmallVec<[i32; 8]> = SmallVec::new();
                for chunk in payload.chunks_exact(4) {
                    let bits = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                    units.push(self.find_unit(Handle::from_bits(bits)) as i32);
                }
                self.api.upload_uniform(
                    program_id,
                    uniform.location,
                    uniform.data_type,
                    uniform.array_size,
                    bytemuck::cast_slice(&units),
                );
            } else {
                self.api.upload_uniform(
                    program_id,
                    uniform.location,
                    uniform.data_type,
                    uniform.array_size,
                    payload,
                );
            }
        }
    }

    /// Unit already holding `texture`, else the first empty slot (binding
    /// the texture there). Units are 1-based; 0 means no unit available
    /// or a texture that does not resolve.
    pub(crate) fn find_unit(&mut self, texture: Handle) -> u32 {
        if let Some(unit) = self.unit_of(texture) {
            return unit;
        }
        let Some(free) = self.unit_of(Handle::NONE) else {
            tracing::warn!("no spare texture units");
            return 0;
        };
        let Some(gpu_texture) = self.textures.get(texture) else {
            tracing::warn!("texture {texture:?} does not resolve to a unit");
            return 0;
        };

        self.units[free as usize - 1].texture = texture;
        self.api.bind_texture_unit(free, gpu_texture.id);
        free
    }

    fn unit_of(&self, texture: Handle) -> Option<u32> {
        self.units
            .iter()
            .position(|unit| unit.texture == texture)
            .map(|index| index as u32 + 1)
    }
}
