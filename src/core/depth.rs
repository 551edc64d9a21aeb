// CPU statement of the depth math used by the depth pre-pass and the
// depth-driven blur shader (`shaders/dof.wgsl` mirrors these functions).
use super::camera::Camera;
use super::scene::{LayerMask, SceneGraph};
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Blur radii below this many pixels take a single unblurred sample.
pub const NEGLIGIBLE_BLUR_PX: f32 = 0.5;

/// Depth value written for pixels no geometry covers.
pub const CLEAR_DEPTH: f32 = 1.0;

/// Marker the pre-pass writes where an excluded-layer node is front-most.
/// Outside the `[0, 1]` depth range; such pixels are never blurred.
pub const NO_DEPTH: f32 = -1.0;

/// Non-linear `[0, 1]` depth for view-space `view_z` under
/// `Mat4::perspective_rh(.., near, far)` (near maps to 0, far to 1).
#[inline]
pub fn perspective_depth(view_z: f32, near: f32, far: f32) -> f32 {
    far * (view_z + near) / (view_z * (far - near))
}

/// Reconstruct view-space Z from a non-linear depth sample.
#[inline]
pub fn view_z_from_depth(depth: f32, near: f32, far: f32) -> f32 {
    (near * far) / ((far - near) * depth - far)
}

/// Normalized linear depth in `[0, 1]`: 0 at the near plane, 1 at far.
#[inline]
pub fn linearize_depth(depth: f32, near: f32, far: f32) -> f32 {
    let view_z = view_z_from_depth(depth, near, far);
    ((-view_z - near) / (far - near)).clamp(0.0, 1.0)
}

/// Per-pixel blur radius in pixels.
#[inline]
pub fn blur_radius(linear_depth: f32, max_blur_size: f32) -> f32 {
    linear_depth.clamp(0.0, 1.0) * max_blur_size.max(0.0)
}

/// Blur radius the depth blur uses for a raw pre-pass sample.
pub fn depth_blur_radius(depth: f32, near: f32, far: f32, max_blur_size: f32) -> f32 {
    if depth < 0.0 {
        return 0.0;
    }
    blur_radius(linearize_depth(depth, near, far), max_blur_size)
}

/// Ring sample offsets (pixels) taken around a pixel for `radius`.
///
/// `directions * quality` samples on concentric rings; empty when the radius
/// is negligible, meaning the pixel is passed through unblurred.
pub fn ring_offsets(directions: u32, quality: u32, radius: f32) -> Vec<Vec2> {
    if radius < NEGLIGIBLE_BLUR_PX {
        return Vec::new();
    }
    let directions = directions.max(1);
    let quality = quality.max(1);
    let mut out = Vec::with_capacity((directions * quality) as usize);
    for d in 0..directions {
        let angle = TAU * d as f32 / directions as f32;
        let dir = Vec2::new(angle.cos(), angle.sin());
        for q in 1..=quality {
            out.push(dir * radius * q as f32 / quality as f32);
        }
    }
    out
}

/// Ray/sphere hit distance; `None` on a miss or when the hit is behind the
/// origin.
#[inline]
pub fn ray_sphere(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Depth the pre-pass would record at `ndc`, treating every visible node as
/// its bounding sphere. Hidden nodes contribute nothing.
pub fn probe_depth(scene: &SceneGraph, camera: &Camera, ndc: Vec2) -> f32 {
    let (ro, rd) = camera.ray_through_ndc(ndc);
    let nearest = scene
        .visible_nodes()
        .filter_map(|(_, n)| ray_sphere(ro, rd, n.position, n.bounds_radius * n.scale))
        .fold(None::<f32>, |best, t| Some(best.map_or(t, |b| b.min(t))));
    match nearest {
        Some(t) => {
            let view_z = camera.view_z(ro + rd * t);
            if -view_z < camera.znear || -view_z > camera.zfar {
                CLEAR_DEPTH
            } else {
                perspective_depth(view_z, camera.znear, camera.zfar)
            }
        }
        None => CLEAR_DEPTH,
    }
}

/// Value the depth pre-pass records at `ndc` when nodes on `excluded` are
/// left out of depth: the nearest other node's depth, or `NO_DEPTH` when an
/// excluded node is in front of it.
pub fn prepass_depth(scene: &mut SceneGraph, camera: &Camera, ndc: Vec2, excluded: LayerMask) -> f32 {
    let depth = scene.with_layers_hidden(excluded, |s| probe_depth(s, camera, ndc));
    let (ro, rd) = camera.ray_through_ndc(ndc);
    let masked = scene
        .visible_nodes()
        .filter(|(_, n)| n.layers.intersects(excluded))
        .filter_map(|(_, n)| ray_sphere(ro, rd, n.position, n.bounds_radius * n.scale))
        .map(|t| camera.view_z(ro + rd * t))
        .filter(|&view_z| -view_z >= camera.znear && -view_z <= camera.zfar)
        .any(|view_z| perspective_depth(view_z, camera.znear, camera.zfar) < depth);
    if masked {
        NO_DEPTH
    } else {
        depth
    }
}
