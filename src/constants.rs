/// Web-side constants: asset locations, load timeouts, DOM ids and the fixed
/// look of the scene.
// Assets
pub const AUDIO_URL: &str = "assets/soundtrack.mp3";
pub const CAPTIONS_URL: &str = "assets/captions.txt";
pub const PROP_VARIANT_URLS: &[&str] = &[
    "assets/props/birch.mesh",
    "assets/props/pine.mesh",
    "assets/props/shrub.mesh",
];

// Load timeouts (milliseconds)
pub const ASSET_ITEM_TIMEOUT_MS: i32 = 6_000;
pub const ASSET_TIMEOUT_MS: i32 = 10_000;

// DOM element ids
pub const CANVAS_ID: &str = "app-canvas";
pub const OVERLAY_ID: &str = "start-overlay";
pub const OVERLAY_OK_ID: &str = "overlay-ok";
pub const STATUS_ID: &str = "status-line";
pub const CAPTION_ID: &str = "caption";

// Captions drift upward by this many CSS pixels over a cue's lifetime
pub const CAPTION_SCROLL_PX: f32 = 14.0;

// Pointer orb
pub const CURSOR_DISTANCE: f32 = 6.0;
pub const CURSOR_RADIUS: f32 = 0.12;

// Scene look
pub const CLEAR_COLOR: [f32; 3] = [0.025, 0.035, 0.055];
pub const FOG_START: f32 = 25.0;
pub const FOG_END: f32 = 95.0;
pub const GROUND_HALF_EXTENT: f32 = 160.0;
pub const GROUND_COLOR: [f32; 3] = [0.05, 0.09, 0.04];
