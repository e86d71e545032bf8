//! GPU meshes
//!
//! A mesh is a vertex array object over a set of owned GPU buffers. Index
//! buffers bind to the element slot; vertex buffers each take a binding
//! index, with attribute locations, channel counts, and stride offsets
//! computed from the buffer's parameters. Updates try every underlying
//! buffer in place and rebuild the whole object when any of them needs
//! reallocation.

use lantern_core::gfx::{MeshAsset, MeshParameters};
use lantern_core::handle::Handle;

use crate::driver::GlApi;
use crate::graphics::{Graphics, GpuMesh};

impl<A: GlApi> Graphics<A> {
    pub fn mesh_init(&mut self, asset: &MeshAsset<'_>) -> Handle {
        let mesh = self.mesh_acquire(asset);
        self.meshes.acquire(mesh)
    }

    /// Deferred free.
    pub fn mesh_free(&mut self, handle: Handle) {
        self.defer.push(1, handle, Self::mesh_free_now);
    }

    /// Fast path: subdata every source buffer in place. Any layout change
    /// or capacity overflow rebuilds the mesh under the same handle.
    pub fn mesh_update(&mut self, handle: Handle, asset: &MeshAsset<'_>) {
        if self.meshes.get(handle).is_none() {
            return;
        }
        if self.mesh_upload(handle, asset) {
            return;
        }

        let fresh = self.mesh_acquire(asset);
        if let Some(mesh) = self.meshes.get_mut(handle) {
            let stale = core::mem::replace(mesh, fresh);
            Self::mesh_discard(self, stale);
        }
    }

    /// Per-buffer layout of a live mesh.
    pub fn mesh_parameters(&self, handle: Handle) -> Option<&[MeshParameters]> {
        Some(self.meshes.get(handle)?.parameters.as_slice())
    }

    pub(crate) fn mesh_free_now(graphics: &mut Graphics<A>, handle: Handle) {
        if graphics.active.mesh == handle {
            graphics.active.mesh = Handle::NONE;
        }
        if let Some(mesh) = graphics.meshes.discard(handle) {
            Self::mesh_discard(graphics, mesh);
        }
    }

    fn mesh_discard(graphics: &mut Graphics<A>, mesh: GpuMesh) {
        if mesh.id == 0 {
            return;
        }
        tracing::trace!("discard mesh {}", mesh.id);
        for buffer in mesh.buffers {
            graphics.buffer_free(buffer);
        }
        graphics.api.delete_vertex_array(mesh.id);
    }

    fn mesh_upload(&mut self, handle: Handle, asset: &MeshAsset<'_>) -> bool {
        let Some(mesh) = self.meshes.get(handle) else {
            return false;
        };
        if mesh.buffers.len() != asset.buffers.len() {
            return false;
        }
        for (parameters, source) in mesh.parameters.iter().zip(asset.buffers) {
            if *parameters != source.parameters {
                return false;
            }
        }

        // Check capacities first so a half-applied update cannot happen.
        for (&buffer_handle, source) in mesh.buffers.iter().zip(asset.buffers) {
            match self.buffers.get(buffer_handle) {
                Some(buffer) if buffer.capacity >= source.data.size => {}
                _ => return false,
            }
        }

        let buffers: Vec<Handle> = mesh.buffers.clone();
        for (buffer_handle, source) in buffers.into_iter().zip(asset.buffers) {
            if let Some(buffer) = self.buffers.get_mut(buffer_handle) {
                Self::buffer_upload(&self.api, buffer, &source.data);
            }
        }
        true
    }

    fn mesh_acquire(&mut self, asset: &MeshAsset<'_>) -> GpuMesh {
        let id = self.api.create_vertex_array();
        let mut mesh = GpuMesh {
            id,
            buffers: Vec::with_capacity(asset.buffers.len()),
            parameters: Vec::with_capacity(asset.buffers.len()),
        };

        for source in asset.buffers {
            mesh.buffers.push(self.buffer_init(&source.data));
            mesh.parameters.push(source.parameters);
        }

        let mut binding = 0;
        for (&buffer_handle, parameters) in mesh.buffers.iter().zip(&mesh.parameters) {
            let Some(buffer) = self.buffers.get(buffer_handle) else {
                continue;
            };

            if parameters.is_index() {
                self.api.vertex_array_element_buffer(id, buffer.id);
                continue;
            }

            let stride = parameters.vertex_size();
            self.api.vertex_array_vertex_buffer(id, binding, buffer.id, stride);

            let mut offset = 0;
            for attribute in &parameters.attributes {
                let Some(location) = attribute.ty.location() else {
                    continue;
                };
                if attribute.channels == 0 {
                    continue;
                }
                self.api.vertex_array_attribute(
                    id,
                    binding,
                    location,
                    attribute.channels,
                    parameters.data_type,
                    offset,
                );
                offset += attribute.channels * parameters.data_type.element_size();
            }

            binding += 1;
        }

        tracing::trace!("acquire mesh {id}");
        mesh
    }
}

#[cfg(test)]
mod tests {
    use lantern_core::gfx::{
        Attribute, AttributeType, BufferAsset, DataType, MeshAsset, MeshBufferAsset, MeshFlags,
        MeshMode, MeshParameters,
    };

    use crate::driver::recording::{Call, Recording};
    use crate::graphics::Graphics;

    fn vertex_parameters() -> MeshParameters {
        MeshParameters {
            mode: MeshMode::Triangles,
            data_type: DataType::R32F,
            flags: MeshFlags::empty(),
            attributes: [
                Attribute::new(AttributeType::Position, 2),
                Attribute::new(AttributeType::Texcoord, 2),
                Attribute::default(),
                Attribute::default(),
            ],
        }
    }

    fn index_parameters() -> MeshParameters {
        MeshParameters {
            mode: MeshMode::Triangles,
            data_type: DataType::R32U,
            flags: MeshFlags::INDEX,
            ..Default::default()
        }
    }

    struct MeshData {
        vertices: Vec<u8>,
        indices: Vec<u8>,
    }

    fn quad_mesh(vertices: &[u8], indices: &[u8]) -> MeshData {
        MeshData {
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        }
    }

    impl MeshData {
        fn asset(&self) -> [MeshBufferAsset<'_>; 2] {
            [
                MeshBufferAsset {
                    data: BufferAsset::bytes(&self.vertices),
                    parameters: vertex_parameters(),
                },
                MeshBufferAsset {
                    data: BufferAsset::bytes(&self.indices),
                    parameters: index_parameters(),
                },
            ]
        }
    }

    #[test]
    fn creation_binds_vertex_layout_and_element_buffer() {
        let mut graphics = Graphics::new(Recording::new());
        let data = quad_mesh(&[0u8; 64], &[0u8; 24]);
        let buffers = data.asset();
        let handle = graphics.mesh_init(&MeshAsset { buffers: &buffers });
        assert!(handle.is_some());

        // Interleaved position2 + texcoord2 floats: stride 16, offsets 0/8.
        assert_eq!(
            graphics.api.count(|call| matches!(
                call,
                Call::VertexBuffer { binding: 0, stride: 16, .. }
            )),
            1
        );
        assert_eq!(
            graphics.api.count(|call| matches!(
                call,
                Call::VertexAttribute { location: 0, channels: 2, offset: 0, .. }
            )),
            1
        );
        assert_eq!(
            graphics.api.count(|call| matches!(
                call,
                Call::VertexAttribute { location: 1, channels: 2, offset: 8, .. }
            )),
            1
        );
        assert_eq!(graphics.api.count(|call| matches!(call, Call::ElementBuffer { .. })), 1);
        assert_eq!(graphics.api.count(|call| matches!(call, Call::CreateBuffer(_))), 2);
    }

    #[test]
    fn fitting_update_streams_both_buffers() {
        let mut graphics = Graphics::new(Recording::new());
        let data = quad_mesh(&[0u8; 64], &[0u8; 24]);
        let buffers = data.asset();
        let handle = graphics.mesh_init(&MeshAsset { buffers: &buffers });
        graphics.api.clear_calls();

        let smaller = quad_mesh(&[1u8; 32], &[1u8; 12]);
        let buffers = smaller.asset();
        graphics.mesh_update(handle, &MeshAsset { buffers: &buffers });

        assert_eq!(graphics.api.count(|call| matches!(call, Call::BufferSubData { .. })), 2);
        assert_eq!(graphics.api.count(|call| matches!(call, Call::CreateVertexArray(_))), 0);
    }

    #[test]
    fn growth_rebuilds_the_whole_mesh() {
        let mut graphics = Graphics::new(Recording::new());
        let data = quad_mesh(&[0u8; 16], &[0u8; 12]);
        let buffers = data.asset();
        let handle = graphics.mesh_init(&MeshAsset { buffers: &buffers });
        graphics.api.clear_calls();

        let bigger = quad_mesh(&[0u8; 128], &[0u8; 48]);
        let buffers = bigger.asset();
        graphics.mesh_update(handle, &MeshAsset { buffers: &buffers });

        assert_eq!(graphics.api.count(|call| matches!(call, Call::CreateVertexArray(_))), 1);
        assert_eq!(graphics.api.count(|call| matches!(call, Call::DeleteVertexArray(_))), 1);
        // No partial subdata happened before the rebuild decision.
        assert_eq!(graphics.api.count(|call| matches!(call, Call::BufferSubData { .. })), 0);
        assert!(graphics.meshes.get(handle).is_some(), "handle survives");
    }

    #[test]
    fn free_releases_owned_buffers() {
        let mut graphics = Graphics::new(Recording::new());
        let data = quad_mesh(&[0u8; 16], &[0u8; 12]);
        let buffers = data.asset();
        let handle = graphics.mesh_init(&MeshAsset { buffers: &buffers });

        graphics.mesh_free(handle);
        graphics.run_deferred();
        graphics.run_deferred();
        assert!(graphics.meshes.get(handle).is_none());
        assert_eq!(graphics.api.count(|call| matches!(call, Call::DeleteVertexArray(_))), 1);

        graphics.run_deferred();
        graphics.run_deferred();
        assert_eq!(graphics.api.count(|call| matches!(call, Call::DeleteBuffer(_))), 2);
        assert_eq!(graphics.buffers.len(), 0);
    }
}
