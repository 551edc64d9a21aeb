use super::constants::*;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Camera rig tuning. The rig itself (follow/head-look) is intentionally
/// simple: a fixed eye height looking down the travel axis.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye_height: f32,
    pub look_ahead: f32,
    pub sway: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: CAMERA_FOV_DEGREES,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            eye_height: CAMERA_EYE_HEIGHT,
            look_ahead: CAMERA_LOOK_AHEAD,
            sway: CAMERA_SWAY,
        }
    }
}

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Rig pose at playback time `t`: eye above the origin, a slow lateral
    /// sway, looking `look_ahead` units down -Z.
    pub fn rig(config: &CameraConfig, aspect: f32, t: f32) -> Self {
        let sway = (t * 0.21).sin() * config.sway;
        let eye = Vec3::new(sway, config.eye_height, 0.0);
        let target = Vec3::new(sway * 0.5, config.eye_height * 0.6, -config.look_ahead);
        Self {
            eye,
            target,
            up: Vec3::Y,
            aspect: aspect.max(1e-3),
            fovy_radians: config.fov_degrees.clamp(1.0, 179.0).to_radians(),
            znear: config.near,
            zfar: config.far,
        }
    }

    /// Compute the clip-space projection matrix (depth in `[0, 1]`).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// View-space Z of a world point (negative in front of the camera).
    #[inline]
    pub fn view_z(&self, world: Vec3) -> f32 {
        self.view_matrix().transform_point3(world).z
    }

    /// World-space ray through normalized device coordinates `ndc`
    /// (x right, y up, both in `[-1, 1]`).
    ///
    /// Returns `(ray_origin, ray_direction)`.
    pub fn ray_through_ndc(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let inv = self.view_projection().inverse();
        let p_far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let p1: Vec3 = p_far.truncate() / p_far.w;
        (self.eye, (p1 - self.eye).normalize())
    }

    /// Point `distance` units along the ray through `ndc`.
    pub fn point_along_ndc(&self, ndc: Vec2, distance: f32) -> Vec3 {
        let (ro, rd) = self.ray_through_ndc(ndc);
        ro + rd * distance
    }
}

/// Convert canvas UV (origin top-left) into NDC.
#[inline]
pub fn uv_to_ndc(uv: [f32; 2]) -> Vec2 {
    Vec2::new(uv[0] * 2.0 - 1.0, 1.0 - uv[1] * 2.0)
}
