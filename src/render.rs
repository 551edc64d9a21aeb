use crate::core::camera::Camera;
use crate::core::config::SceneConfig;
use crate::core::depth::{CLEAR_DEPTH, NEGLIGIBLE_BLUR_PX};
use crate::core::passes::{
    FrameLedger, PassDescriptor, PassGraph, PassId, PassOutput, PipelineError, PostParams,
};
use crate::core::scene::{LayerMask, SceneGraph};
use thiserror::Error;
use web_sys as web;

mod aux;
mod helpers;
mod meshes;
mod post;
mod scene_pass;
mod targets;

use aux::{create_aux_resources, AuxResources, AuxUniforms};
use meshes::MeshCache;
use post::{create_post_resources, PostBindings, PostResources, PostStep, PostUniforms};
use scene_pass::{create_scene_pass_resources, CameraUniforms, DrawSlot, ScenePassResources};
use targets::RenderTargets;

/// Look of the scene that is not a tunable parameter.
#[derive(Clone, Copy, Debug)]
pub struct SceneLook {
    pub clear_color: [f32; 3],
    pub fog_start: f32,
    pub fog_end: f32,
    pub ground_half_extent: f32,
    pub ground_color: [f32; 3],
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("no bindings for pass `{}`", .0.name())]
    MissingBinding(PassId),
    #[error("pipeline used after dispose")]
    Disposed,
}

/// The pass chain on the GPU.
///
/// Built once after resources are ready. Every pass target is resized
/// together and every pass is disposed together.
pub struct Pipeline<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    graph: PassGraph,
    ledger: FrameLedger,
    params: PostParams,
    excluded_layers: LayerMask,
    near: f32,
    far: f32,

    scene_pass: ScenePassResources,
    aux: AuxResources,
    post: PostResources,
    bindings: PostBindings,
    targets: RenderTargets,
    meshes: MeshCache,
    linear_sampler: wgpu::Sampler,

    look: SceneLook,
    clear_color: wgpu::Color,
    time_accum: f32,
    disposed: bool,
}

impl<'a> Pipeline<'a> {
    pub async fn new(
        canvas: &'a web::HtmlCanvasElement,
        scene_config: &SceneConfig,
        look: SceneLook,
    ) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    // Use default limits on web to avoid passing unknown fields to older WebGPU impls
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let first = caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        // The gamma pass encodes, so a linear swapchain is preferred.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(first);
        let mut params = scene_config.post.clone();
        if format.is_srgb() {
            log::info!("[render] sRGB-only surface {:?}; gamma pass set to 1.0", format);
            params.gamma = 1.0;
        }
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut graph = PassGraph::standard()?;
        graph.resize(width, height);
        log::info!(
            "[render] passes: {}",
            graph
                .ids()
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(crate::core::POST_WGSL.into()),
        });
        let dof_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("dof_shader"),
            source: wgpu::ShaderSource::Wgsl(crate::core::DOF_WGSL.into()),
        });
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let scene_pass =
            create_scene_pass_resources(&device, look.ground_half_extent, look.ground_color);
        let aux = create_aux_resources(&device, targets::format_for(PassId::AuxScene));
        let post = create_post_resources(&device, &post_shader, &dof_shader, format);
        let render_targets = RenderTargets::new(&device, &graph);
        let bindings =
            PostBindings::build(&device, &post, &graph, &render_targets, &linear_sampler);

        let [r, g, b] = look.clear_color;
        Ok(Self {
            surface,
            device,
            queue,
            config,
            graph,
            ledger: FrameLedger::new(),
            params,
            excluded_layers: scene_config.depth_excluded_layers,
            near: scene_config.camera.near,
            far: scene_config.camera.far,
            scene_pass,
            aux,
            post,
            bindings,
            targets: render_targets,
            meshes: MeshCache::default(),
            linear_sampler,
            look,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            time_accum: 0.0,
            disposed: false,
        })
    }

    pub fn params(&self) -> &PostParams {
        &self.params
    }

    /// Takes effect from the next `execute`.
    pub fn set_parameter(&mut self, pass: PassId, name: &str, value: f32) -> Result<(), PipelineError> {
        self.params.set(pass, name, value)?;
        log::info!("[render] {}.{} = {:.4}", pass.name(), name, value);
        Ok(())
    }

    /// Layers left out of the depth pre-pass from the next `execute`.
    pub fn set_excluded_layers(&mut self, layers: LayerMask) {
        self.excluded_layers = layers;
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.disposed {
            return;
        }
        if (width, height) != self.graph.size() {
            self.resize(width, height);
        }
    }

    /// Resize the swapchain and every pass target to `width` x `height`.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.disposed {
            return;
        }
        self.graph.resize(width, height);
        let (w, h) = self.graph.size();
        self.config.width = w;
        self.config.height = h;
        self.surface.configure(&self.device, &self.config);

        // Recreate offscreen render targets and dependent bind groups
        self.targets.recreate(&self.device, &self.graph);
        self.bindings = PostBindings::build(
            &self.device,
            &self.post,
            &self.graph,
            &self.targets,
            &self.linear_sampler,
        );
        log::debug!("[render] resized to {}x{}", w, h);
    }

    /// Render one frame of `scene` seen from `camera`.
    ///
    /// Nodes on the excluded layers are hidden while the depth pre-pass list
    /// is built and restored before the color pass. Where one of them is the
    /// front-most surface the pre-pass records `NO_DEPTH` instead.
    pub fn execute(&mut self, scene: &mut SceneGraph, camera: &Camera, dt: f32) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.time_accum += dt.max(0.0);
        self.near = camera.znear;
        self.far = camera.zfar;

        let frame = match self.surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("[render] surface lost; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.meshes.sync(&self.device, scene);
        self.write_uniforms(camera);
        {
            let Self {
                scene_pass,
                device,
                queue,
                meshes,
                excluded_layers,
                ..
            } = self;
            scene.with_layers_hidden(*excluded_layers, |s| {
                scene_pass.prepare(device, queue, s, meshes, DrawSlot::Depth, None)
            });
            scene_pass.prepare(
                device,
                queue,
                scene,
                meshes,
                DrawSlot::Masked,
                Some(*excluded_layers),
            );
            scene_pass.prepare(device, queue, scene, meshes, DrawSlot::Color, None);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        let mut ledger = std::mem::take(&mut self.ledger);
        let result = self
            .graph
            .execute_frame(&mut ledger, |pass| self.encode_pass(&mut encoder, pass, &view));
        self.ledger = ledger;
        result?;

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn write_uniforms(&self, camera: &Camera) {
        let [r, g, b] = self.look.clear_color;
        self.scene_pass.write_camera(
            &self.queue,
            &CameraUniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                eye: camera.eye.extend(1.0).to_array(),
                fog_color: [r, g, b, 1.0],
                params: [self.time_accum, self.look.fog_start, self.look.fog_end, 0.0],
            },
        );

        let resolution = self.graph.resolution();
        self.queue.write_buffer(
            &self.aux.uniform_buffer,
            0,
            bytemuck::bytes_of(&AuxUniforms {
                resolution,
                time: self.time_accum,
                speed: self.params.displacement_speed,
            }),
        );

        let p = &self.params;
        let (bw, bh) = self.targets.bloom_size();
        let base = PostUniforms {
            resolution,
            time: self.time_accum,
            near: self.near,
            far: self.far,
            ..Default::default()
        };
        let half = PostUniforms {
            resolution: [bw as f32, bh as f32],
            ..base
        };
        let steps = [
            (
                PostStep::Displace,
                PostUniforms {
                    strength: p.displacement_scale,
                    ..base
                },
            ),
            (
                PostStep::DepthBlur,
                PostUniforms {
                    strength: p.max_blur_size,
                    params: [p.blur_directions, p.blur_quality, NEGLIGIBLE_BLUR_PX, 0.0],
                    ..base
                },
            ),
            (
                PostStep::Chromatic,
                PostUniforms {
                    strength: p.aberration_strength,
                    ..base
                },
            ),
            (
                PostStep::BloomBright,
                PostUniforms {
                    params: [p.bloom_threshold, 0.0, 0.0, 0.0],
                    ..half
                },
            ),
            (
                PostStep::BloomBlurH,
                PostUniforms {
                    direction: [1.0, 0.0],
                    params: [p.bloom_radius * 4.0, 0.0, 0.0, 0.0],
                    ..half
                },
            ),
            (
                PostStep::BloomBlurV,
                PostUniforms {
                    direction: [0.0, 1.0],
                    params: [p.bloom_radius * 4.0, 0.0, 0.0, 0.0],
                    ..half
                },
            ),
            (
                PostStep::BloomComposite,
                PostUniforms {
                    strength: p.bloom_strength,
                    ..base
                },
            ),
            (
                PostStep::Gamma,
                PostUniforms {
                    strength: p.exposure,
                    params: [p.gamma, 0.0, 0.0, 0.0],
                    ..base
                },
            ),
        ];
        for (step, uniforms) in steps {
            self.queue
                .write_buffer(self.post.uniforms(step), 0, bytemuck::bytes_of(&uniforms));
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &PassDescriptor,
        screen: &wgpu::TextureView,
    ) -> Result<(), RenderError> {
        let target = match pass.output {
            PassOutput::Screen => screen,
            PassOutput::Target => self
                .targets
                .view(pass.id)
                .ok_or(RenderError::MissingBinding(pass.id))?,
        };
        match pass.id {
            PassId::DepthPrepass => self.scene_pass.encode(
                encoder,
                DrawSlot::Depth,
                target,
                &self.targets.prepass_depth.view,
                wgpu::Color {
                    r: CLEAR_DEPTH as f64,
                    g: 0.0,
                    b: 0.0,
                    a: 1.0,
                },
                &self.meshes,
            ),
            PassId::AuxScene => self.aux.encode(encoder, target),
            PassId::SceneColor => self.scene_pass.encode(
                encoder,
                DrawSlot::Color,
                target,
                &self.targets.scene_depth.view,
                self.clear_color,
                &self.meshes,
            ),
            PassId::Bloom => {
                let (bg0, bg1) = self
                    .bindings
                    .pass(pass.id)
                    .ok_or(RenderError::MissingBinding(pass.id))?;
                let black = wgpu::Color::BLACK;
                let a = &self.targets.bloom_a.view;
                let b = &self.targets.bloom_b.view;
                // bright pass -> a, blur a -> b -> a, composite over the input
                let steps = [
                    ("bloom_bright", a, PostStep::BloomBright, &self.bindings.bright),
                    ("bloom_blur_h", b, PostStep::BloomBlurH, &self.bindings.blur_h),
                    ("bloom_blur_v", a, PostStep::BloomBlurV, &self.bindings.blur_v),
                ];
                for (label, dst, step, bg) in steps {
                    post::blit(encoder, label, dst, black, self.post.pipeline(step), bg, None);
                }
                post::blit(
                    encoder,
                    "bloom_composite",
                    target,
                    black,
                    self.post.pipeline(PostStep::BloomComposite),
                    bg0,
                    bg1,
                );
            }
            id => {
                let step = PostStep::for_pass(id).ok_or(RenderError::MissingBinding(id))?;
                let (bg0, bg1) = self
                    .bindings
                    .pass(id)
                    .ok_or(RenderError::MissingBinding(id))?;
                post::blit(
                    encoder,
                    id.name(),
                    target,
                    self.clear_color,
                    self.post.pipeline(step),
                    bg0,
                    bg1,
                );
            }
        }
        Ok(())
    }

    /// Release every GPU resource the pipeline owns. Safe to call twice.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.meshes.clear();
        self.targets.destroy();
        self.scene_pass.destroy();
        self.aux.uniform_buffer.destroy();
        for buffer in &self.post.uniform_buffers {
            buffer.destroy();
        }
        log::info!("[render] disposed");
    }

    pub fn resident_meshes(&self) -> usize {
        self.meshes.len()
    }
}
