// Host-side tests for runtime configuration by name and URL query.

#![allow(dead_code)]
mod camera {
    include!("../src/core/camera.rs");
}
mod config {
    include!("../src/core/config.rs");
}
mod constants {
    include!("../src/core/constants.rs");
}
mod geometry {
    include!("../src/core/geometry.rs");
}
mod passes {
    include!("../src/core/passes.rs");
}
mod scene {
    include!("../src/core/scene.rs");
}

use config::*;
use passes::{PassId, PipelineError};

#[test]
fn defaults_are_consistent() {
    let config = SceneConfig::default();
    assert!(config.camera.near < config.camera.far);
    assert!(config.field.generation_z < config.field.removal_z);
    assert_eq!(config.field.half_width(), config.field.spread_width * 0.5);
    assert_eq!(config.seed, None);
}

#[test]
fn field_and_camera_values_set_by_name() {
    let mut config = SceneConfig::default();
    config.set("spread_width", 30.0).expect("known parameter");
    config.set("row_count", 3.4).expect("known parameter");
    config.set("fov", 400.0).expect("known parameter");
    config.set("seed", 42.0).expect("known parameter");

    assert_eq!(config.field.spread_width, 30.0);
    assert_eq!(config.field.row_count, 3);
    assert_eq!(config.camera.fov_degrees, 179.0);
    assert_eq!(config.seed, Some(42));
}

#[test]
fn post_names_route_to_pass_parameters() {
    let mut config = SceneConfig::default();
    config.set("bloom_strength", 1.25).expect("known parameter");
    config.set("max_blur_size", 3.0).expect("known parameter");
    assert_eq!(config.post.get(PassId::Bloom, "strength"), Ok(1.25));
    assert_eq!(config.post.get(PassId::DepthBlur, "max_blur_size"), Ok(3.0));

    assert!(matches!(
        config.set("gamma", 0.0),
        Err(ConfigError::Pipeline(PipelineError::InvalidValue { .. }))
    ));
}

#[test]
fn rejected_values_leave_config_untouched() {
    let mut config = SceneConfig::default();
    let before = config.clone();

    assert_eq!(
        config.set("wobble", 1.0),
        Err(ConfigError::UnknownParameter("wobble".into()))
    );
    assert!(matches!(config.set("near", 0.0), Err(ConfigError::InvalidValue { .. })));
    assert!(matches!(config.set("far", f32::INFINITY), Err(ConfigError::InvalidValue { .. })));
    assert!(matches!(config.set("near", 500.0), Err(ConfigError::Inconsistent { .. })));
    assert!(matches!(
        config.set("generation_z", 50.0),
        Err(ConfigError::Inconsistent { .. })
    ));
    assert!(matches!(
        config.set("min_patch_size", 10.0),
        Err(ConfigError::Inconsistent { .. })
    ));
    assert!(matches!(config.set("row_count", 0.0), Err(ConfigError::Inconsistent { .. })));
    assert_eq!(config, before);
}

#[test]
fn query_string_applies_every_valid_pair() {
    let mut config = SceneConfig::default();
    let errors = config.apply_query("?bloom_strength=1.5&near=abc&&foo=1&travel_speed=2");

    assert_eq!(errors.len(), 2);
    assert!(errors.contains(&ConfigError::UnknownParameter("foo".into())));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidValue { name, .. } if name == "near")));
    assert_eq!(config.post.bloom_strength, 1.5);
    assert_eq!(config.travel_speed, 2.0);
}

#[test]
fn empty_query_changes_nothing() {
    let mut config = SceneConfig::default();
    assert!(config.apply_query("").is_empty());
    assert!(config.apply_query("?").is_empty());
    assert_eq!(config, SceneConfig::default());
}

#[test]
fn set_reports_what_changed() {
    let mut config = SceneConfig::default();
    assert_eq!(config.set("fov", 60.0), Ok(ConfigChange::Camera));
    assert_eq!(config.set("travel_speed", 3.0), Ok(ConfigChange::TravelSpeed));
    assert_eq!(config.set("prop_min_distance", 4.0), Ok(ConfigChange::Field));
    assert_eq!(config.set("seed", 7.0), Ok(ConfigChange::Seed));
    assert_eq!(
        config.set("bloom_radius", 0.3),
        Ok(ConfigChange::Post {
            pass: PassId::Bloom,
            param: "radius"
        })
    );
}

#[test]
fn excluded_depth_layers_are_a_bitmask() {
    let mut config = SceneConfig::default();
    assert_eq!(config.set("depth_excluded_layers", 0.0), Ok(ConfigChange::DepthLayers));
    assert_eq!(config.depth_excluded_layers, scene::LayerMask::NONE);
    config.set("depth_excluded_layers", 3.0).expect("known parameter");
    assert_eq!(
        config.depth_excluded_layers,
        scene::LayerMask::layer(scene::LAYER_WORLD).with(scene::LAYER_CURSOR)
    );
    assert!(matches!(
        config.set("depth_excluded_layers", -1.0),
        Err(ConfigError::InvalidValue { .. })
    ));
}
