/// Field and post-processing tuning defaults.
///
/// These are the starting values of `SceneConfig`; every one of them can be
/// overridden at runtime by name. They express intended look rather than
/// correctness limits.
// Travel axis window (world units along +Z, viewer sits near z = 0)
pub const GENERATION_Z: f32 = -90.0; // far edge where new instances appear
pub const REMOVAL_Z: f32 = 8.0; // instances past this plane are recycled
pub const SPAWN_JITTER: f32 = 12.0; // depth of the respawn band behind GENERATION_Z
pub const TRAVEL_SPEED: f32 = 6.0; // world units per second

// Cross-axis layout
pub const FIELD_CENTER_X: f32 = 0.0;
pub const SPREAD_WIDTH: f32 = 48.0;
pub const CENTER_EXPONENT: f32 = 1.5; // >1 packs instances toward the center line
pub const PERIPHERY_SHRINK: f32 = 0.6; // size loss at the outer edge (0 = none)

// Initial rows
pub const ROW_COUNT: usize = 6;
pub const GROUND_PER_ROW: usize = 14;
pub const PROPS_PER_ROW: usize = 3;

// Ground cover patches
pub const MIN_PATCH_SIZE: f32 = 0.8;
pub const MAX_PATCH_SIZE: f32 = 2.2;
pub const MIN_BLADES: u32 = 24;
pub const MAX_BLADES: u32 = 80;
pub const BLADE_HEIGHT: f32 = 0.9;

// Separation (center to center, XZ plane)
pub const GROUND_MIN_DISTANCE: f32 = 2.0;
pub const PROP_MIN_DISTANCE: f32 = 7.0;
pub const PROP_FOOTPRINT: f32 = 1.2;

// Camera
pub const CAMERA_FOV_DEGREES: f32 = 55.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 140.0;
pub const CAMERA_EYE_HEIGHT: f32 = 1.6;
pub const CAMERA_LOOK_AHEAD: f32 = 12.0;
pub const CAMERA_SWAY: f32 = 0.35;

// Post-processing defaults
pub const DISPLACEMENT_SCALE: f32 = 0.012;
pub const DISPLACEMENT_SPEED: f32 = 0.25;
pub const MAX_BLUR_SIZE: f32 = 7.0; // pixels at linear depth 1.0
pub const BLUR_DIRECTIONS: f32 = 16.0;
pub const BLUR_QUALITY: f32 = 3.0;
pub const ABERRATION_STRENGTH: f32 = 0.0025;
pub const BLOOM_STRENGTH: f32 = 0.9;
pub const BLOOM_RADIUS: f32 = 0.6;
pub const BLOOM_THRESHOLD: f32 = 0.6;
pub const EXPOSURE: f32 = 1.0;
pub const GAMMA: f32 = 2.2;
