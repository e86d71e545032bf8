//! Render targets
//!
//! A target owns its attachments: sampleable ones are textures created
//! here (sized like the target, clamped wrapping), opaque ones are
//! renderbuffers. Color attachment points number in the order attachments
//! appear; depth/stencil use their fixed points. An incomplete
//! framebuffer is destroyed on the spot and reported as a null handle.

use glam::UVec2;

use lantern_core::gfx::{
    SamplerSettings, TargetDesc, TextureAsset, TextureFlags, TextureType, WrapMode,
};
use lantern_core::handle::Handle;

use crate::driver::GlApi;
use crate::graphics::{Graphics, GpuTarget, TargetBuffer};

impl<A: GlApi> Graphics<A> {
    pub fn target_init(&mut self, desc: &TargetDesc) -> Handle {
        match self.target_acquire(desc) {
            Some(target) => self.targets.acquire(target),
            None => Handle::NONE,
        }
    }

    /// Deferred free.
    pub fn target_free(&mut self, handle: Handle) {
        self.defer.push(1, handle, Self::target_free_now);
    }

    /// Destroys and rebuilds the attachments; the handle stays valid.
    pub fn target_update(&mut self, handle: Handle, desc: &TargetDesc) {
        if self.targets.get(handle).is_none() {
            return;
        }
        let fresh = self.target_acquire(desc).unwrap_or_default();
        if let Some(target) = self.targets.get_mut(handle) {
            let stale = core::mem::replace(target, fresh);
            self.target_discard(stale);
        }
    }

    pub fn target_size(&self, handle: Handle) -> UVec2 {
        self.targets.get(handle).map_or(UVec2::ZERO, |target| target.size)
    }

    /// The `index`-th sampleable attachment of class `ty`, for feeding a
    /// target's output back into materials.
    pub fn target_texture(&self, handle: Handle, ty: TextureType, index: u32) -> Handle {
        let Some(target) = self.targets.get(handle) else {
            return Handle::NONE;
        };

        let mut color_count = 0;
        for &texture_handle in &target.textures {
            let Some(texture) = self.textures.get(texture_handle) else {
                continue;
            };
            let attachment = color_count;
            if texture.parameters.texture_type == TextureType::COLOR {
                color_count += 1;
            }
            if texture.parameters.texture_type == ty && attachment == index {
                return texture_handle;
            }
        }
        tracing::warn!("target {handle:?} has no {ty:?} texture #{index}");
        Handle::NONE
    }

    pub(crate) fn target_free_now(graphics: &mut Graphics<A>, handle: Handle) {
        if graphics.active.target == handle {
            graphics.active.target = Handle::NONE;
        }
        if let Some(target) = graphics.targets.discard(handle) {
            graphics.target_discard(target);
        }
    }

    fn target_discard(&mut self, target: GpuTarget) {
        if target.id == 0 {
            return;
        }
        tracing::trace!("discard target {}", target.id);
        for texture in target.textures {
            self.texture_free(texture);
        }
        for buffer in target.buffers {
            self.api.delete_renderbuffer(buffer.id);
        }
        self.api.delete_framebuffer(target.id);
    }

    fn target_acquire(&mut self, desc: &TargetDesc) -> Option<GpuTarget> {
        let max = self.caps.max_renderbuffer_size;
        if desc.size.x > max || desc.size.y > max {
            tracing::warn!(
                "target {}x{} exceeds the driver maximum {max}, clamping",
                desc.size.x,
                desc.size.y,
            );
        }
        let size = UVec2::new(desc.size.x.min(max), desc.size.y.min(max));

        let id = self.api.create_framebuffer();
        let mut target = GpuTarget {
            id,
            size,
            textures: Vec::new(),
            buffers: Vec::new(),
        };

        for parameters in &desc.attachments {
            if parameters.flags.contains(TextureFlags::OPAQUE) {
                let buffer = TargetBuffer {
                    id: self.api.create_renderbuffer(),
                    parameters: *parameters,
                };
                self.api.renderbuffer_storage(buffer.id, *parameters, size);
                target.buffers.push(buffer);
            } else {
                let texture = self.texture_init(&TextureAsset {
                    size,
                    parameters: *parameters,
                    sampler: SamplerSettings {
                        wrap_x: WrapMode::Edge,
                        wrap_y: WrapMode::Edge,
                        ..Default::default()
                    },
                    ..Default::default()
                });
                target.textures.push(texture);
            }
        }

        // Attach: sampleable first, then opaque, sharing one color
        // attachment counter.
        let mut color_count = 0;
        for &texture_handle in &target.textures {
            let Some(texture) = self.textures.get(texture_handle) else {
                continue;
            };
            let attachment = color_count;
            if texture.parameters.texture_type == TextureType::COLOR {
                color_count += 1;
            }
            self.api
                .framebuffer_texture(id, texture.parameters.texture_type, attachment, texture.id);
        }
        for buffer in &target.buffers {
            let attachment = color_count;
            if buffer.parameters.texture_type == TextureType::COLOR {
                color_count += 1;
            }
            self.api
                .framebuffer_renderbuffer(id, buffer.parameters.texture_type, attachment, buffer.id);
        }

        if let Err(error) = self.api.check_framebuffer(id) {
            tracing::error!("{error}");
            self.target_discard(target);
            return None;
        }

        tracing::trace!("acquire target {id}");
        Some(target)
    }
}
