//! GPU textures
//!
//! Immutable 2D storage sized at creation (mip levels = max_lod + 1).
//! `texture_update` streams new pixels in place when the incoming asset
//! matches the live object exactly; any mismatch in size, format,
//! settings, or sampler destroys and reallocates. Freeing scrubs every
//! texture unit that held the handle.

use lantern_core::gfx::TextureAsset;
use lantern_core::handle::Handle;

use glam::UVec2;

use crate::driver::GlApi;
use crate::graphics::{Graphics, GpuTexture};

impl<A: GlApi> Graphics<A> {
    /// Allocates storage and uploads the initial pixels, if any. The size
    /// is clamped to the driver-reported maximum.
    pub fn texture_init(&mut self, asset: &TextureAsset) -> Handle {
        let texture = self.texture_acquire(asset);
        self.textures.acquire(texture)
    }

    /// Deferred free.
    pub fn texture_free(&mut self, handle: Handle) {
        self.defer.push(1, handle, Self::texture_free_now);
    }

    /// Fast path: stream pixels via subdata when the asset matches the
    /// live object; otherwise destroy and reallocate under the same
    /// handle.
    pub fn texture_update(&mut self, handle: Handle, asset: &TextureAsset) {
        let Some(texture) = self.textures.get(handle) else {
            return;
        };
        if Self::texture_upload(&self.api, texture, asset) {
            return;
        }

        let fresh = self.texture_acquire(asset);
        if let Some(texture) = self.textures.get_mut(handle) {
            let stale = core::mem::replace(texture, fresh);
            if stale.id != 0 {
                tracing::trace!("discard texture {}", stale.id);
                self.api.delete_texture(stale.id);
            }
        }
    }

    pub fn texture_size(&self, handle: Handle) -> UVec2 {
        self.textures.get(handle).map_or(UVec2::ZERO, |texture| texture.size)
    }

    pub(crate) fn texture_free_now(graphics: &mut Graphics<A>, handle: Handle) {
        for unit in &mut graphics.units {
            if unit.texture == handle {
                unit.texture = Handle::NONE;
            }
        }
        if let Some(texture) = graphics.textures.discard(handle) {
            if texture.id != 0 {
                tracing::trace!("discard texture {}", texture.id);
                graphics.api.delete_texture(texture.id);
            }
        }
    }

    /// In-place upload; false when the asset no longer fits the object.
    fn texture_upload(api: &A, texture: &GpuTexture, asset: &TextureAsset) -> bool {
        if texture.size != asset.size {
            return false;
        }
        if texture.parameters != asset.parameters
            || texture.settings != asset.settings
            || texture.sampler != asset.sampler
        {
            return false;
        }

        if asset.pixels.is_empty() || asset.size.x == 0 || asset.size.y == 0 {
            return true;
        }
        api.texture_sub_image_2d(texture.id, asset.size, asset.parameters, &asset.pixels);
        if texture.settings.max_lod != 0 {
            api.generate_texture_mipmap(texture.id);
        }
        true
    }

    fn texture_acquire(&mut self, asset: &TextureAsset) -> GpuTexture {
        let max = self.caps.max_texture_size;
        if asset.size.x > max || asset.size.y > max {
            tracing::warn!(
                "texture {}x{} exceeds the driver maximum {max}, clamping",
                asset.size.x,
                asset.size.y,
            );
        }
        let texture = GpuTexture {
            id: 0,
            size: UVec2::new(asset.size.x.min(max), asset.size.y.min(max)),
            parameters: asset.parameters,
            settings: asset.settings,
            sampler: asset.sampler,
        };
        if texture.size.x == 0 || texture.size.y == 0 {
            return texture;
        }

        let mut texture = texture;
        texture.id = self.api.create_texture();
        self.api.texture_storage_2d(
            texture.id,
            texture.settings.max_lod + 1,
            texture.parameters,
            texture.size,
        );
        Self::texture_upload(&self.api, &texture, asset);
        self.api.texture_settings(texture.id, &texture.settings);
        self.api.texture_sampler(texture.id, &texture.sampler);

        tracing::trace!("acquire texture {}", texture.id);
        texture
    }
}
