pub mod camera;
pub mod clock;
pub mod config;
pub mod constants;
pub mod controls;
pub mod cues;
pub mod depth;
pub mod field;
pub mod geometry;
pub mod passes;
pub mod placement;
pub mod readiness;
pub mod scene;

// Shaders bundled as string constants
pub static SCENE_WGSL: &str = include_str!("../../shaders/scene.wgsl");
pub static AUX_WGSL: &str = include_str!("../../shaders/aux.wgsl");
pub static POST_WGSL: &str = include_str!("../../shaders/post.wgsl");
pub static DOF_WGSL: &str = include_str!("../../shaders/dof.wgsl");
