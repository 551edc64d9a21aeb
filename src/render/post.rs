use super::helpers;
use super::targets::RenderTargets;
use crate::core::passes::{PassGraph, PassId};
use fnv::FnvHashMap;
use wgpu;

/// Uniform block shared by `post.wgsl` and `dof.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct PostUniforms {
    pub(crate) resolution: [f32; 2],
    pub(crate) time: f32,
    pub(crate) strength: f32,
    pub(crate) params: [f32; 4],
    pub(crate) direction: [f32; 2],
    pub(crate) near: f32,
    pub(crate) far: f32,
}

/// One full-screen draw. Every step owns its uniform buffer, so writes for
/// different steps in the same frame never overwrite each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PostStep {
    Displace,
    DepthBlur,
    Chromatic,
    BloomBright,
    BloomBlurH,
    BloomBlurV,
    BloomComposite,
    Gamma,
}

impl PostStep {
    pub(crate) const COUNT: usize = 8;

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// The step that writes the output of `pass`, if `pass` is an effect.
    pub(crate) fn for_pass(pass: PassId) -> Option<Self> {
        match pass {
            PassId::Displacement => Some(PostStep::Displace),
            PassId::DepthBlur => Some(PostStep::DepthBlur),
            PassId::Chromatic => Some(PostStep::Chromatic),
            PassId::Bloom => Some(PostStep::BloomComposite),
            PassId::Gamma => Some(PostStep::Gamma),
            PassId::DepthPrepass | PassId::AuxScene | PassId::SceneColor => None,
        }
    }
}

pub(crate) struct PostResources {
    pub(crate) bgl0: wgpu::BindGroupLayout, // tex+sampler+uniform
    pub(crate) bgl1: wgpu::BindGroupLayout, // tex+sampler
    pub(crate) bgl_depth: wgpu::BindGroupLayout,
    pub(crate) uniform_buffers: [wgpu::Buffer; PostStep::COUNT],
    pub(crate) displace_pipeline: wgpu::RenderPipeline,
    pub(crate) depth_blur_pipeline: wgpu::RenderPipeline,
    pub(crate) chromatic_pipeline: wgpu::RenderPipeline,
    pub(crate) bright_pipeline: wgpu::RenderPipeline,
    pub(crate) blur_pipeline: wgpu::RenderPipeline,
    pub(crate) bloom_composite_pipeline: wgpu::RenderPipeline,
    pub(crate) gamma_pipeline: wgpu::RenderPipeline,
}

impl PostResources {
    pub(crate) fn uniforms(&self, step: PostStep) -> &wgpu::Buffer {
        &self.uniform_buffers[step.index()]
    }

    pub(crate) fn pipeline(&self, step: PostStep) -> &wgpu::RenderPipeline {
        match step {
            PostStep::Displace => &self.displace_pipeline,
            PostStep::DepthBlur => &self.depth_blur_pipeline,
            PostStep::Chromatic => &self.chromatic_pipeline,
            PostStep::BloomBright => &self.bright_pipeline,
            PostStep::BloomBlurH | PostStep::BloomBlurV => &self.blur_pipeline,
            PostStep::BloomComposite => &self.bloom_composite_pipeline,
            PostStep::Gamma => &self.gamma_pipeline,
        }
    }
}

pub(crate) fn create_post_resources(
    device: &wgpu::Device,
    post_shader: &wgpu::ShaderModule,
    dof_shader: &wgpu::ShaderModule,
    swap_format: wgpu::TextureFormat,
) -> PostResources {
    let bgl0 = helpers::source_layout(device);
    let bgl1 = helpers::secondary_layout(device);
    let bgl_depth = helpers::depth_input_layout(device);
    let uniform_buffers = std::array::from_fn(|i| {
        helpers::uniform_buffer(
            device,
            &format!("post_uniforms_{i}"),
            std::mem::size_of::<PostUniforms>(),
        )
    });

    let pl_single = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_post_0"),
        bind_group_layouts: &[&bgl0],
        push_constant_ranges: &[],
    });
    let pl_dual = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_post_dual"),
        bind_group_layouts: &[&bgl0, &bgl1],
        push_constant_ranges: &[],
    });
    let pl_depth = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pl_post_depth"),
        bind_group_layouts: &[&bgl0, &bgl_depth],
        push_constant_ranges: &[],
    });

    let hdr = helpers::HDR_FORMAT;
    let post = |label: &str, layout: &wgpu::PipelineLayout, entry: &str, format| {
        helpers::make_post_pipeline(device, label, layout, post_shader, entry, format, None)
    };
    PostResources {
        displace_pipeline: post("displace", &pl_dual, "fs_displace", hdr),
        depth_blur_pipeline: helpers::make_post_pipeline(
            device,
            "depth_blur",
            &pl_depth,
            dof_shader,
            "fs_depth_blur",
            hdr,
            None,
        ),
        chromatic_pipeline: post("chromatic", &pl_single, "fs_chromatic", hdr),
        bright_pipeline: post("bloom_bright", &pl_single, "fs_bright", hdr),
        blur_pipeline: post("bloom_blur", &pl_single, "fs_blur", hdr),
        bloom_composite_pipeline: post("bloom_composite", &pl_dual, "fs_bloom_composite", hdr),
        gamma_pipeline: helpers::make_post_pipeline(
            device,
            "gamma",
            &pl_single,
            post_shader,
            "fs_gamma",
            swap_format,
            Some(wgpu::BlendState::REPLACE),
        ),
        bgl0,
        bgl1,
        bgl_depth,
        uniform_buffers,
    }
}

/// Bind groups for every effect step; rebuilt whenever targets are.
pub(crate) struct PostBindings {
    groups: FnvHashMap<PassId, (wgpu::BindGroup, Option<wgpu::BindGroup>)>,
    pub(crate) bright: wgpu::BindGroup,
    pub(crate) blur_h: wgpu::BindGroup,
    pub(crate) blur_v: wgpu::BindGroup,
}

impl PostBindings {
    pub(crate) fn build(
        device: &wgpu::Device,
        post: &PostResources,
        graph: &PassGraph,
        targets: &RenderTargets,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let source = |label: &str, view: &wgpu::TextureView, step: PostStep| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &post.bgl0,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: post.uniforms(step).as_entire_binding(),
                    },
                ],
            })
        };
        let secondary = |label: &str, view: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &post.bgl1,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        };
        let depth_input = |label: &str, view: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &post.bgl_depth,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                }],
            })
        };

        let mut groups = FnvHashMap::default();
        for pass in graph.order() {
            let Some(step) = PostStep::for_pass(pass.id) else {
                continue;
            };
            let Some(primary) = pass.inputs.first().and_then(|i| targets.view(*i)) else {
                continue;
            };
            let g0 = source(pass.id.name(), primary, step);
            let g1 = if pass.id == PassId::Bloom {
                Some(secondary("bloom_glow", &targets.bloom_a.view))
            } else {
                pass.inputs.get(1).and_then(|&input| {
                    let view = targets.view(input)?;
                    Some(if input == PassId::DepthPrepass {
                        depth_input(input.name(), view)
                    } else {
                        secondary(input.name(), view)
                    })
                })
            };
            groups.insert(pass.id, (g0, g1));
        }

        let bloom_input = graph
            .descriptor(PassId::Bloom)
            .and_then(|d| d.inputs.first())
            .and_then(|i| targets.view(*i))
            .unwrap_or(&targets.bloom_b.view);
        Self {
            groups,
            bright: source("bloom_bright", bloom_input, PostStep::BloomBright),
            blur_h: source("bloom_blur_h", &targets.bloom_a.view, PostStep::BloomBlurH),
            blur_v: source("bloom_blur_v", &targets.bloom_b.view, PostStep::BloomBlurV),
        }
    }

    pub(crate) fn pass(&self, id: PassId) -> Option<(&wgpu::BindGroup, Option<&wgpu::BindGroup>)> {
        self.groups.get(&id).map(|(g0, g1)| (g0, g1.as_ref()))
    }
}

pub(crate) fn blit(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    clear: wgpu::Color,
    pipeline: &wgpu::RenderPipeline,
    bg0: &wgpu::BindGroup,
    bg1: Option<&wgpu::BindGroup>,
) {
    let mut r = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    r.set_pipeline(pipeline);
    r.set_bind_group(0, bg0, &[]);
    if let Some(g1) = bg1 {
        r.set_bind_group(1, g1, &[]);
    }
    r.draw(0..3, 0..1);
}
