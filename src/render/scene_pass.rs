use super::helpers;
use super::meshes::{GpuMesh, MeshCache};
use crate::core::geometry::{self, MeshVertex};
use crate::core::scene::{LayerMask, MeshKey, SceneGraph};
use std::ops::Range;
use wgpu;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct CameraUniforms {
    pub(crate) view_proj: [[f32; 4]; 4],
    pub(crate) eye: [f32; 4],
    pub(crate) fog_color: [f32; 4],
    pub(crate) params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceRaw {
    offset_scale: [f32; 4],
}

const MESH_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];
const INSTANCE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x4];

/// Which scene draw an instance list feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DrawSlot {
    Depth,
    Color,
    /// Excluded-layer nodes stamped into the depth target as "no depth".
    Masked,
}

impl DrawSlot {
    fn index(self) -> usize {
        match self {
            DrawSlot::Depth => 0,
            DrawSlot::Color => 1,
            DrawSlot::Masked => 2,
        }
    }
}

struct DrawBatch {
    mesh: MeshKey,
    instances: Range<u32>,
}

struct InstanceList {
    buffer: wgpu::Buffer,
    capacity: usize,
    batches: Vec<DrawBatch>,
}

impl InstanceList {
    fn new(device: &wgpu::Device, label: &str, capacity: usize) -> Self {
        Self {
            buffer: instance_buffer(device, label, capacity),
            capacity,
            batches: Vec::new(),
        }
    }
}

fn instance_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (capacity.max(1) * std::mem::size_of::<InstanceRaw>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Mesh drawing for the depth pre-pass and the scene color pass.
///
/// Each frame the visible nodes are flattened into one instance list per
/// slot (instance 0 is always the ground) and drawn batched by mesh.
pub(crate) struct ScenePassResources {
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    color_pipeline: wgpu::RenderPipeline,
    depth_pipeline: wgpu::RenderPipeline,
    mask_pipeline: wgpu::RenderPipeline,
    ground: GpuMesh,
    lists: [InstanceList; 3],
}

fn scene_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    frag_entry: &str,
    format: wgpu::TextureFormat,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &MESH_ATTRS,
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceRaw>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &INSTANCE_ATTRS,
                },
            ],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: helpers::DEPTH_STENCIL_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(frag_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    })
}

pub(crate) fn create_scene_pass_resources(
    device: &wgpu::Device,
    ground_half_extent: f32,
    ground_color: [f32; 3],
) -> ScenePassResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(crate::core::SCENE_WGSL.into()),
    });
    let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene_bgl"),
        entries: &[helpers::uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
    });
    let pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pl"),
        bind_group_layouts: &[&bgl],
        push_constant_ranges: &[],
    });
    let camera_buffer = helpers::uniform_buffer(
        device,
        "camera_uniforms",
        std::mem::size_of::<CameraUniforms>(),
    );
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("scene_bg"),
        layout: &bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: camera_buffer.as_entire_binding(),
        }],
    });
    let ground = GpuMesh::upload(
        device,
        "ground",
        &geometry::ground_plane(ground_half_extent, ground_color),
    );

    ScenePassResources {
        color_pipeline: scene_pipeline(
            device,
            "scene_color",
            &pl,
            &shader,
            "fs_color",
            helpers::HDR_FORMAT,
            true,
        ),
        depth_pipeline: scene_pipeline(
            device,
            "depth_prepass",
            &pl,
            &shader,
            "fs_depth",
            helpers::DEPTH_VALUE_FORMAT,
            true,
        ),
        // tested against the pre-pass depth, never written: an excluded node
        // behind world geometry leaves that geometry's depth in place
        mask_pipeline: scene_pipeline(
            device,
            "depth_mask",
            &pl,
            &shader,
            "fs_depth_mask",
            helpers::DEPTH_VALUE_FORMAT,
            false,
        ),
        camera_buffer,
        camera_bind_group,
        ground,
        lists: [
            InstanceList::new(device, "depth_instances", 256),
            InstanceList::new(device, "color_instances", 256),
            InstanceList::new(device, "masked_instances", 16),
        ],
    }
}

fn draw_batches(r: &mut wgpu::RenderPass<'_>, list: &InstanceList, cache: &MeshCache) {
    for batch in &list.batches {
        let Some(mesh) = cache.get(batch.mesh) else {
            continue;
        };
        r.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        r.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        r.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
    }
}

impl ScenePassResources {
    pub(crate) fn write_camera(&self, queue: &wgpu::Queue, uniforms: &CameraUniforms) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Snapshot the nodes visible right now into `slot`'s instance list.
    ///
    /// `only` restricts the list to nodes on those layers; `None` takes every
    /// visible node.
    pub(crate) fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneGraph,
        cache: &MeshCache,
        slot: DrawSlot,
        only: Option<LayerMask>,
    ) {
        let mut visible: Vec<(MeshKey, InstanceRaw)> = scene
            .visible_nodes()
            .filter(|(_, n)| only.map_or(true, |mask| n.layers.intersects(mask)))
            .filter(|(_, n)| cache.get(n.mesh).is_some())
            .map(|(_, n)| {
                let p = n.position;
                (
                    n.mesh,
                    InstanceRaw {
                        offset_scale: [p.x, p.y, p.z, n.scale],
                    },
                )
            })
            .collect();
        visible.sort_by_key(|(mesh, _)| *mesh);

        let mut instances = Vec::with_capacity(visible.len() + 1);
        instances.push(InstanceRaw {
            offset_scale: [0.0, 0.0, 0.0, 1.0],
        });
        let mut batches: Vec<DrawBatch> = Vec::new();
        for (mesh, raw) in visible {
            let idx = instances.len() as u32;
            instances.push(raw);
            match batches.last_mut() {
                Some(b) if b.mesh == mesh => b.instances.end = idx + 1,
                _ => batches.push(DrawBatch {
                    mesh,
                    instances: idx..idx + 1,
                }),
            }
        }

        let list = &mut self.lists[slot.index()];
        if instances.len() > list.capacity {
            list.buffer.destroy();
            list.capacity = instances.len().next_power_of_two();
            list.buffer = instance_buffer(device, "instances", list.capacity);
        }
        queue.write_buffer(&list.buffer, 0, bytemuck::cast_slice(&instances));
        list.batches = batches;
    }

    pub(crate) fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        slot: DrawSlot,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        clear: wgpu::Color,
        cache: &MeshCache,
    ) {
        let (label, pipeline) = match slot {
            DrawSlot::Depth | DrawSlot::Masked => ("depth_prepass", &self.depth_pipeline),
            DrawSlot::Color => ("scene_color", &self.color_pipeline),
        };
        let mut r = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        r.set_pipeline(pipeline);
        r.set_bind_group(0, &self.camera_bind_group, &[]);
        let list = &self.lists[slot.index()];
        r.set_vertex_buffer(1, list.buffer.slice(..));

        r.set_vertex_buffer(0, self.ground.vertex_buffer.slice(..));
        r.set_index_buffer(self.ground.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        r.draw_indexed(0..self.ground.index_count, 0, 0..1);
        draw_batches(&mut r, list, cache);

        if slot == DrawSlot::Depth {
            let masked = &self.lists[DrawSlot::Masked.index()];
            if !masked.batches.is_empty() {
                r.set_pipeline(&self.mask_pipeline);
                r.set_vertex_buffer(1, masked.buffer.slice(..));
                draw_batches(&mut r, masked, cache);
            }
        }
    }

    pub(crate) fn destroy(&mut self) {
        self.camera_buffer.destroy();
        self.ground.vertex_buffer.destroy();
        self.ground.index_buffer.destroy();
        for list in &self.lists {
            list.buffer.destroy();
        }
    }
}
