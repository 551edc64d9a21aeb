use super::helpers;
use crate::core::passes::{PassGraph, PassId};
use fnv::FnvHashMap;
use wgpu;

pub(crate) struct Target {
    pub(crate) tex: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) size: (u32, u32),
}

impl Target {
    fn color(device: &wgpu::Device, label: &str, size: (u32, u32), format: wgpu::TextureFormat) -> Self {
        let (tex, view) = helpers::create_target(device, label, size.0, size.1, format);
        Self { tex, view, size }
    }

    fn depth(device: &wgpu::Device, label: &str, size: (u32, u32)) -> Self {
        let (tex, view) = helpers::create_depth_attachment(device, label, size.0, size.1);
        Self { tex, view, size }
    }
}

/// Texture format of the target `id` writes.
pub(crate) fn format_for(id: PassId) -> wgpu::TextureFormat {
    match id {
        PassId::DepthPrepass => helpers::DEPTH_VALUE_FORMAT,
        _ => helpers::HDR_FORMAT,
    }
}

/// Offscreen targets, one per pass that writes a target, sized from the pass
/// graph.
///
/// - the depth pre-pass and scene color pass each own a depth attachment
/// - `bloom_*` are half-res scratch buffers internal to the bloom pass
pub(crate) struct RenderTargets {
    pass_targets: FnvHashMap<PassId, Target>,
    pub(crate) prepass_depth: Target,
    pub(crate) scene_depth: Target,
    pub(crate) bloom_a: Target,
    pub(crate) bloom_b: Target,
}

impl RenderTargets {
    pub(crate) fn new(device: &wgpu::Device, graph: &PassGraph) -> Self {
        let pass_targets = graph
            .targets()
            .map(|(id, size)| (id, Target::color(device, id.name(), size, format_for(id))))
            .collect();
        let (w, h) = graph.size();
        let half = ((w / 2).max(1), (h / 2).max(1));
        Self {
            pass_targets,
            prepass_depth: Target::depth(device, "prepass_depth", (w, h)),
            scene_depth: Target::depth(device, "scene_depth", (w, h)),
            bloom_a: Target::color(device, "bloom_a", half, helpers::HDR_FORMAT),
            bloom_b: Target::color(device, "bloom_b", half, helpers::HDR_FORMAT),
        }
    }

    pub(crate) fn recreate(&mut self, device: &wgpu::Device, graph: &PassGraph) {
        self.destroy();
        *self = Self::new(device, graph);
    }

    pub(crate) fn view(&self, id: PassId) -> Option<&wgpu::TextureView> {
        self.pass_targets.get(&id).map(|t| &t.view)
    }

    pub(crate) fn bloom_size(&self) -> (u32, u32) {
        self.bloom_a.size
    }

    pub(crate) fn destroy(&mut self) {
        for t in self.pass_targets.values() {
            t.tex.destroy();
        }
        self.prepass_depth.tex.destroy();
        self.scene_depth.tex.destroy();
        self.bloom_a.tex.destroy();
        self.bloom_b.tex.destroy();
    }
}
