//! GPU buffers
//!
//! Storage is immutable: updates stream through subdata while the new
//! contents fit the allocated capacity, and destroy-reallocate otherwise.

use lantern_core::gfx::BufferAsset;
use lantern_core::handle::Handle;

use crate::driver::GlApi;
use crate::graphics::{Graphics, GpuBuffer};

impl<A: GlApi> Graphics<A> {
    /// Allocates immutable storage (with the dynamic-storage flag) and
    /// uploads initial contents when provided.
    pub fn buffer_init(&mut self, asset: &BufferAsset<'_>) -> Handle {
        let buffer = self.buffer_acquire(asset);
        self.buffers.acquire(buffer)
    }

    /// Deferred free.
    pub fn buffer_free(&mut self, handle: Handle) {
        self.defer.push(1, handle, Self::buffer_free_now);
    }

    /// Subdata while `asset.size <= capacity`; destroy-reallocate beyond.
    pub fn buffer_update(&mut self, handle: Handle, asset: &BufferAsset<'_>) {
        let Some(buffer) = self.buffers.get_mut(handle) else {
            return;
        };
        if Self::buffer_upload(&self.api, buffer, asset) {
            return;
        }

        let fresh = self.buffer_acquire(asset);
        if let Some(buffer) = self.buffers.get_mut(handle) {
            let stale = core::mem::replace(buffer, fresh);
            if stale.id != 0 {
                tracing::trace!("discard buffer {}", stale.id);
                self.api.delete_buffer(stale.id);
            }
        }
    }

    /// Live byte count of a buffer; zero for a dead handle.
    pub fn buffer_size(&self, handle: Handle) -> usize {
        self.buffers.get(handle).map_or(0, |buffer| buffer.size)
    }

    pub(crate) fn buffer_free_now(graphics: &mut Graphics<A>, handle: Handle) {
        if let Some(buffer) = graphics.buffers.discard(handle) {
            if buffer.id != 0 {
                tracing::trace!("discard buffer {}", buffer.id);
                graphics.api.delete_buffer(buffer.id);
            }
        }
    }

    pub(crate) fn buffer_upload(api: &A, buffer: &mut GpuBuffer, asset: &BufferAsset<'_>) -> bool {
        if buffer.capacity < asset.size {
            return false;
        }
        buffer.size = asset.size;
        let Some(data) = asset.data else {
            return true;
        };
        if data.is_empty() {
            return true;
        }
        api.buffer_sub_data(buffer.id, 0, data);
        true
    }

    fn buffer_acquire(&mut self, asset: &BufferAsset<'_>) -> GpuBuffer {
        let mut buffer = GpuBuffer {
            id: 0,
            capacity: asset.size,
            size: if asset.data.is_some() { asset.size } else { 0 },
        };
        if asset.size == 0 {
            return buffer;
        }

        buffer.id = self.api.create_buffer();
        self.api.buffer_storage(buffer.id, buffer.capacity, asset.data);
        tracing::trace!("acquire buffer {}", buffer.id);
        buffer
    }
}
