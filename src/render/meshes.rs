use crate::core::geometry::MeshData;
use crate::core::scene::{MeshKey, SceneGraph};
use fnv::FnvHashMap;
use wgpu;
use wgpu::util::DeviceExt;

pub(crate) struct GpuMesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl GpuMesh {
    pub(crate) fn upload(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// GPU buffers mirroring the scene graph's meshes.
#[derive(Default)]
pub(crate) struct MeshCache {
    meshes: FnvHashMap<MeshKey, GpuMesh>,
}

impl MeshCache {
    /// Drop buffers for released meshes and upload any mesh a node uses that
    /// is not resident yet.
    pub(crate) fn sync(&mut self, device: &wgpu::Device, scene: &mut SceneGraph) {
        for key in scene.drain_released() {
            if let Some(mesh) = self.meshes.remove(&key) {
                mesh.destroy();
            }
        }
        let missing: Vec<MeshKey> = scene
            .nodes()
            .map(|(_, n)| n.mesh)
            .filter(|k| !self.meshes.contains_key(k))
            .collect();
        for key in missing {
            if self.meshes.contains_key(&key) {
                continue;
            }
            if let Some(data) = scene.mesh(key).filter(|m| !m.is_empty()) {
                self.meshes
                    .insert(key, GpuMesh::upload(device, &format!("mesh_{key}"), data));
            }
        }
    }

    pub(crate) fn get(&self, key: MeshKey) -> Option<&GpuMesh> {
        self.meshes.get(&key)
    }

    pub(crate) fn len(&self) -> usize {
        self.meshes.len()
    }

    pub(crate) fn clear(&mut self) {
        for (_, mesh) in self.meshes.drain() {
            mesh.destroy();
        }
    }
}
