use super::helpers;
use wgpu;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct AuxUniforms {
    pub(crate) resolution: [f32; 2],
    pub(crate) time: f32,
    pub(crate) speed: f32,
}

/// Full-screen animated offset field rendered into the aux scene target.
pub(crate) struct AuxResources {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) uniform_buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
}

pub(crate) fn create_aux_resources(device: &wgpu::Device, format: wgpu::TextureFormat) -> AuxResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("aux_shader"),
        source: wgpu::ShaderSource::Wgsl(crate::core::AUX_WGSL.into()),
    });
    let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("aux_bgl"),
        entries: &[helpers::uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
    });
    let pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("aux_pl"),
        bind_group_layouts: &[&bgl],
        push_constant_ranges: &[],
    });
    let pipeline = helpers::make_post_pipeline(device, "aux_pipeline", &pl, &shader, "fs_aux", format, None);
    let uniform_buffer =
        helpers::uniform_buffer(device, "aux_uniforms", std::mem::size_of::<AuxUniforms>());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("aux_bg"),
        layout: &bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    AuxResources {
        pipeline,
        uniform_buffer,
        bind_group,
    }
}

impl AuxResources {
    pub(crate) fn encode(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        super::post::blit(
            encoder,
            "aux_scene",
            target,
            wgpu::Color::BLACK,
            &self.pipeline,
            &self.bind_group,
            None,
        );
    }
}
