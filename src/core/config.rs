use super::camera::CameraConfig;
use super::constants::*;
use super::passes::{PassId, PipelineError, PostParams};
use super::scene::{LayerMask, LAYER_CURSOR};
use thiserror::Error;

/// Tuning for the windowed vegetation field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig {
    pub center_x: f32,
    pub spread_width: f32,
    pub row_count: usize,
    pub per_row_density: usize,
    pub props_per_row: usize,
    pub min_patch_size: f32,
    pub max_patch_size: f32,
    pub min_blades: u32,
    pub max_blades: u32,
    pub blade_height: f32,
    pub ground_min_distance: f32,
    pub prop_min_distance: f32,
    pub prop_footprint: f32,
    pub generation_z: f32,
    pub removal_z: f32,
    pub spawn_jitter: f32,
    pub center_exponent: f32,
    pub periphery_shrink: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            center_x: FIELD_CENTER_X,
            spread_width: SPREAD_WIDTH,
            row_count: ROW_COUNT,
            per_row_density: GROUND_PER_ROW,
            props_per_row: PROPS_PER_ROW,
            min_patch_size: MIN_PATCH_SIZE,
            max_patch_size: MAX_PATCH_SIZE,
            min_blades: MIN_BLADES,
            max_blades: MAX_BLADES,
            blade_height: BLADE_HEIGHT,
            ground_min_distance: GROUND_MIN_DISTANCE,
            prop_min_distance: PROP_MIN_DISTANCE,
            prop_footprint: PROP_FOOTPRINT,
            generation_z: GENERATION_Z,
            removal_z: REMOVAL_Z,
            spawn_jitter: SPAWN_JITTER,
            center_exponent: CENTER_EXPONENT,
            periphery_shrink: PERIPHERY_SHRINK,
        }
    }
}

impl FieldConfig {
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.spread_width * 0.5
    }

    fn validate(&self) -> Result<(), String> {
        if self.generation_z >= self.removal_z {
            return Err("generation_z must be below removal_z".into());
        }
        if self.min_patch_size > self.max_patch_size {
            return Err("min_patch_size exceeds max_patch_size".into());
        }
        if self.min_blades > self.max_blades {
            return Err("min_blades exceeds max_blades".into());
        }
        if self.row_count == 0 {
            return Err("row_count must be at least 1".into());
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("invalid value `{value}` for `{name}`")]
    InvalidValue { name: String, value: String },
    #[error("`{name}` rejected: {reason}")]
    Inconsistent { name: String, reason: String },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Which part of the config a successful `SceneConfig::set` touched, so the
/// caller knows what to push into live state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigChange {
    Camera,
    Field,
    Post { pass: PassId, param: &'static str },
    TravelSpeed,
    DepthLayers,
    Seed,
}

/// All runtime-tunable state, set by name from keys or the URL query.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub field: FieldConfig,
    pub post: PostParams,
    pub travel_speed: f32,
    pub depth_excluded_layers: LayerMask,
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            field: FieldConfig::default(),
            post: PostParams::default(),
            travel_speed: TRAVEL_SPEED,
            depth_excluded_layers: LayerMask::layer(LAYER_CURSOR),
            seed: None,
        }
    }
}

/// Flat parameter names that route to a pass parameter.
const POST_NAMES: &[(&str, PassId, &str)] = &[
    ("displacement_scale", PassId::Displacement, "scale"),
    ("displacement_speed", PassId::Displacement, "speed"),
    ("max_blur_size", PassId::DepthBlur, "max_blur_size"),
    ("blur_directions", PassId::DepthBlur, "directions"),
    ("blur_quality", PassId::DepthBlur, "quality"),
    ("aberration_strength", PassId::Chromatic, "strength"),
    ("bloom_strength", PassId::Bloom, "strength"),
    ("bloom_radius", PassId::Bloom, "radius"),
    ("bloom_threshold", PassId::Bloom, "threshold"),
    ("exposure", PassId::Gamma, "exposure"),
    ("gamma", PassId::Gamma, "gamma"),
];

impl SceneConfig {
    /// Set one parameter by its flat name. The whole config is validated
    /// before the change is kept, so a rejected value leaves it untouched.
    pub fn set(&mut self, name: &str, value: f32) -> Result<ConfigChange, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        if !value.is_finite() {
            return Err(invalid());
        }
        if let Some((_, pass, param)) = POST_NAMES.iter().find(|(n, _, _)| *n == name) {
            self.post.set(*pass, param, value)?;
            return Ok(ConfigChange::Post {
                pass: *pass,
                param: *param,
            });
        }

        let count = || -> Result<usize, ConfigError> {
            if value < 0.0 {
                Err(invalid())
            } else {
                Ok(value.round() as usize)
            }
        };
        let positive = || -> Result<f32, ConfigError> {
            if value <= 0.0 {
                Err(invalid())
            } else {
                Ok(value)
            }
        };

        let mut next = self.clone();
        let change = match name {
            "fov" | "near" | "far" | "eye_height" | "sway" => ConfigChange::Camera,
            "travel_speed" => ConfigChange::TravelSpeed,
            // bitmask of layer indices
            "depth_excluded_layers" => ConfigChange::DepthLayers,
            "seed" => ConfigChange::Seed,
            _ => ConfigChange::Field,
        };
        let f = &mut next.field;
        match name {
            "fov" => next.camera.fov_degrees = value.clamp(1.0, 179.0),
            "near" => next.camera.near = positive()?,
            "far" => next.camera.far = positive()?,
            "eye_height" => next.camera.eye_height = value,
            "sway" => next.camera.sway = value.abs(),
            "travel_speed" => next.travel_speed = value.max(0.0),
            "depth_excluded_layers" => next.depth_excluded_layers = LayerMask(count()? as u32),
            "center_x" => f.center_x = value,
            "spread_width" => f.spread_width = positive()?,
            "row_count" => f.row_count = count()?,
            "per_row_density" => f.per_row_density = count()?,
            "props_per_row" => f.props_per_row = count()?,
            "min_patch_size" => f.min_patch_size = positive()?,
            "max_patch_size" => f.max_patch_size = positive()?,
            "min_blades" => f.min_blades = count()? as u32,
            "max_blades" => f.max_blades = count()? as u32,
            "blade_height" => f.blade_height = positive()?,
            "ground_min_distance" => f.ground_min_distance = value.max(0.0),
            "prop_min_distance" => f.prop_min_distance = value.max(0.0),
            "generation_z" => f.generation_z = value,
            "removal_z" => f.removal_z = value,
            "spawn_jitter" => f.spawn_jitter = value.max(0.0),
            "center_exponent" => f.center_exponent = positive()?,
            "periphery_shrink" => f.periphery_shrink = value.clamp(0.0, 0.95),
            "seed" => next.seed = Some(count()? as u64),
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        }
        if next.camera.near >= next.camera.far {
            return Err(ConfigError::Inconsistent {
                name: name.to_string(),
                reason: "near must be below far".into(),
            });
        }
        next.field
            .validate()
            .map_err(|reason| ConfigError::Inconsistent {
                name: name.to_string(),
                reason,
            })?;
        *self = next;
        Ok(change)
    }

    /// Apply `key=value` pairs from a URL query string (leading `?` optional).
    ///
    /// Every pair is attempted; the errors of rejected pairs are returned for
    /// the caller to log.
    pub fn apply_query(&mut self, query: &str) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for pair in query.trim_start_matches('?').split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            match raw.trim().parse::<f32>() {
                Ok(value) => {
                    if let Err(e) = self.set(key.trim(), value) {
                        errors.push(e);
                    }
                }
                Err(_) => errors.push(ConfigError::InvalidValue {
                    name: key.to_string(),
                    value: raw.to_string(),
                }),
            }
        }
        errors
    }
}
