//! GPU programs
//!
//! One GLSL source serves every stage: a stage is compiled iff the text
//! mentions its define (`VERTEX_SHADER`, ...), with a generated header
//! prepended so shaders can stay agnostic of attribute locations and of
//! the clip-space convention. After link the active uniforms are
//! introspected into a name-id map used by materials and uniform upload.

use std::fmt::Write;

use smallvec::SmallVec;

use lantern_core::handle::Handle;

use crate::driver::{GlApi, ShaderStage};
use crate::graphics::{Graphics, GpuProgram, ProgramUniform};

impl<A: GlApi> Graphics<A> {
    /// Compiles, links, and introspects a program. Returns the null
    /// handle on compile or link failure; the half-built driver object is
    /// destroyed, never leaked.
    pub fn program_init(&mut self, source: &str) -> Handle {
        match self.program_acquire(source) {
            Some(program) => self.programs.acquire(program),
            None => Handle::NONE,
        }
    }

    /// Deferred free; the driver object survives until the defer queue
    /// drains, so commands already recorded this frame stay valid.
    pub fn program_free(&mut self, handle: Handle) {
        self.defer.push(1, handle, Self::program_free_now);
    }

    /// Rebuilds the program from new source in place; the handle stays
    /// valid. On failure the program goes inert (driver id 0).
    pub fn program_update(&mut self, handle: Handle, source: &str) {
        if self.programs.get(handle).is_none() {
            return;
        }
        let fresh = self.program_acquire(source).unwrap_or_default();
        if let Some(program) = self.programs.get_mut(handle) {
            let stale = core::mem::replace(program, fresh);
            if stale.id != 0 {
                tracing::trace!("discard program {}", stale.id);
                self.api.delete_program(stale.id);
            }
        }
    }

    /// Introspected uniforms of a live program.
    pub fn program_uniforms(
        &self,
        handle: Handle,
    ) -> Option<impl Iterator<Item = (Handle, ProgramUniform)> + '_> {
        let program = self.programs.get(handle)?;
        Some(program.uniforms.iter().map(|(&id, &uniform)| (id, uniform)))
    }

    pub(crate) fn program_free_now(graphics: &mut Graphics<A>, handle: Handle) {
        if graphics.active.program == handle {
            graphics.active.program = Handle::NONE;
        }
        if let Some(program) = graphics.programs.discard(handle) {
            if program.id != 0 {
                tracing::trace!("discard program {}", program.id);
                graphics.api.delete_program(program.id);
            }
        }
    }

    fn program_acquire(&mut self, source: &str) -> Option<GpuProgram> {
        let header = self.shader_header();

        let stages: SmallVec<[ShaderStage; 4]> = ShaderStage::ALL
            .iter()
            .copied()
            .filter(|stage| source.contains(stage.define()))
            .collect();
        if stages.is_empty() {
            tracing::warn!("shader source names no stage define");
            return None;
        }

        let id = self.api.create_program();
        let mut shaders: SmallVec<[u32; 4]> = SmallVec::new();
        for stage in stages {
            let stage_define = format!("#define {}\n\n", stage.define());
            match self
                .api
                .compile_shader(stage, &[header.as_str(), stage_define.as_str(), source])
            {
                Ok(shader) => shaders.push(shader),
                Err(error) => {
                    tracing::error!("{error}");
                    for &shader in &shaders {
                        self.api.delete_shader(shader);
                    }
                    self.api.delete_program(id);
                    return None;
                }
            }
        }

        let linked = self.api.link_program(id, &shaders);
        for &shader in &shaders {
            self.api.delete_shader(shader);
        }
        if let Err(error) = linked {
            tracing::error!("{error}");
            self.api.delete_program(id);
            return None;
        }

        let mut uniforms = hashbrown::HashMap::new();
        for raw in self.api.program_uniforms(id) {
            let mut name = raw.name.as_str();
            if name.contains("[0][0]") {
                tracing::warn!("nested arrays are not supported: '{name}'");
                continue;
            }
            if name.contains("[0].") {
                tracing::warn!("arrays of structs are not supported: '{name}'");
                continue;
            }
            if raw.array_size > 1 && name.ends_with("[0]") {
                name = &name[..name.len() - 3];
            }
            let id = self.uniforms.add(name);
            uniforms.insert(
                id,
                ProgramUniform {
                    data_type: raw.data_type,
                    array_size: raw.array_size,
                    location: raw.location,
                },
            );
        }

        tracing::trace!("acquire program {id}");
        Some(GpuProgram { id, uniforms })
    }

    /// The generated source header: GLSL version, attribute location
    /// constants, and the clip-space description.
    fn shader_header(&self) -> String {
        use lantern_core::gfx::AttributeType;

        let mut header = String::with_capacity(256);
        let _ = writeln!(header, "#version {} core", self.caps.glsl_version);
        let _ = writeln!(header);
        let _ = writeln!(
            header,
            "#define ATTRIBUTE_TYPE_POSITION {}",
            AttributeType::Position.location().unwrap_or(0)
        );
        let _ = writeln!(
            header,
            "#define ATTRIBUTE_TYPE_TEXCOORD {}",
            AttributeType::Texcoord.location().unwrap_or(0)
        );
        let _ = writeln!(
            header,
            "#define ATTRIBUTE_TYPE_NORMAL   {}",
            AttributeType::Normal.location().unwrap_or(0)
        );
        let _ = writeln!(
            header,
            "#define ATTRIBUTE_TYPE_COLOR    {}",
            AttributeType::Color.location().unwrap_or(0)
        );
        let _ = writeln!(header);
        let _ = writeln!(header, "#define DEPTH_NEAR {:?}", self.clip_space.depth_near);
        let _ = writeln!(header, "#define DEPTH_FAR  {:?}", self.clip_space.depth_far);
        let _ = writeln!(header, "#define NDC_NEAR {:?}", self.clip_space.ndc_near);
        let _ = writeln!(header, "#define NDC_FAR  {:?}", self.clip_space.ndc_far);
        let _ = writeln!(header);
        header
    }
}
