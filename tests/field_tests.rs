// Host-side tests for the windowed vegetation field.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

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
mod field {
    include!("../src/core/field.rs");
}
mod geometry {
    include!("../src/core/geometry.rs");
}
mod passes {
    include!("../src/core/passes.rs");
}
mod placement {
    include!("../src/core/placement.rs");
}
mod scene {
    include!("../src/core/scene.rs");
}

use config::FieldConfig;
use field::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scene::{MeshOwnership, SceneGraph};

fn make_field(seed: u64) -> (FieldManager<StdRng>, SceneGraph) {
    let mut scene = SceneGraph::new();
    let mut field = FieldManager::new(FieldConfig::default(), StdRng::seed_from_u64(seed));
    field.populate_initial(&mut scene);
    (field, scene)
}

fn assert_separated(field: &FieldManager<StdRng>) {
    for kind in InstanceKind::ALL {
        let min = field.min_distance(kind);
        let same: Vec<_> = field
            .instances()
            .iter()
            .filter(|i| i.kind() == kind)
            .map(|i| i.position)
            .collect();
        for (a_idx, a) in same.iter().enumerate() {
            for b in &same[a_idx + 1..] {
                let d = ((a.x - b.x).powi(2) + (a.z - b.z).powi(2)).sqrt();
                assert!(d >= min - 1e-3, "{:?} pair only {} apart (min {})", kind, d, min);
            }
        }
    }
}

fn window_step(field: &FieldManager<StdRng>, frames: usize) -> f32 {
    let cfg = field.config();
    // every instance crosses the removal plane about once over `frames`
    (cfg.removal_z - cfg.generation_z + cfg.spawn_jitter) / frames as f32
}

#[test]
fn initial_population_is_separated_per_kind() {
    let (field, scene) = make_field(1);
    assert!(field.live_count() > 0);
    assert!(field.count_of(InstanceKind::GroundCover) > 0);
    assert!(field.count_of(InstanceKind::Prop) > 0);
    assert_eq!(scene.len(), field.live_count());
    assert_separated(&field);
}

#[test]
fn separation_holds_across_recycling() {
    let (mut field, mut scene) = make_field(2);
    let step = window_step(&field, 300);
    for _ in 0..300 {
        field.advance(step, &mut scene);
        field.recycle(&mut scene);
        assert_separated(&field);
    }
}

#[test]
fn exhausted_spawns_shrink_population_instead_of_overlapping() {
    let config = FieldConfig {
        spread_width: 2.0,
        row_count: 1,
        per_row_density: 40,
        props_per_row: 0,
        ground_min_distance: 5.0,
        generation_z: -4.0,
        removal_z: 0.0,
        ..FieldConfig::default()
    };
    let mut scene = SceneGraph::new();
    let mut field = FieldManager::new(config, StdRng::seed_from_u64(3));
    let live = field.populate_initial(&mut scene);

    assert!(live < 40);
    assert_eq!(live + field.deficit(InstanceKind::GroundCover), 40);
    assert_separated(&field);
}

#[test]
fn instances_stay_inside_window_after_each_cycle() {
    let (mut field, mut scene) = make_field(4);
    let cfg = field.config().clone();
    let lo = cfg.generation_z - cfg.spawn_jitter;
    for step in [0.5_f32, 3.0, 17.0, 0.01, 40.0] {
        for _ in 0..20 {
            field.advance(step, &mut scene);
            field.recycle(&mut scene);
            for inst in field.instances() {
                let z = inst.position.z;
                assert!(z >= lo && z <= cfg.removal_z, "z={} outside [{}, {}]", z, lo, cfg.removal_z);
            }
        }
    }
}

#[test]
fn recycle_without_crossing_keeps_live_set() {
    let (mut field, mut scene) = make_field(5);
    let before: Vec<InstanceId> = field.instances().iter().map(|i| i.id).collect();

    let live = field.recycle(&mut scene);
    assert_eq!(live, before.len());

    // far too short a step for anything to reach the removal plane
    let nearest = field
        .instances()
        .iter()
        .map(|i| i.position.z)
        .fold(f32::MIN, f32::max);
    let gap = field.config().removal_z - nearest;
    field.advance(gap * 0.5, &mut scene);
    field.recycle(&mut scene);

    let after: Vec<InstanceId> = field.instances().iter().map(|i| i.id).collect();
    assert_eq!(before, after);
}

#[test]
fn repopulation_replaces_rather_than_accumulates() {
    let (mut field, mut scene) = make_field(6);
    let first_ids: Vec<InstanceId> = field.instances().iter().map(|i| i.id).collect();
    let target =
        field.initial_target(InstanceKind::GroundCover) + field.initial_target(InstanceKind::Prop);

    let live = field.populate_initial(&mut scene);
    assert!(live <= target);
    assert!(live * 2 > target);
    assert_eq!(scene.len(), live);
    assert!(field
        .instances()
        .iter()
        .all(|i| !first_ids.contains(&i.id)));
}

#[test]
fn rows_thin_out_away_from_viewer() {
    let (field, _) = make_field(7);
    let cfg = field.config();
    let mid = (cfg.generation_z + cfg.removal_z) * 0.5;
    let ground = field
        .instances()
        .iter()
        .filter(|i| i.kind() == InstanceKind::GroundCover);
    let (near, far): (Vec<_>, Vec<_>) = ground.partition(|i| i.position.z > mid);
    assert!(near.len() > far.len(), "near={} far={}", near.len(), far.len());
}

#[test]
fn thousand_frames_keep_population_bounded() {
    let (mut field, mut scene) = make_field(8);
    let initial = field.live_count();
    let step = window_step(&field, 1000);
    for _ in 0..1000 {
        field.advance(step, &mut scene);
        field.recycle(&mut scene);
    }
    let live = field.live_count();
    assert!(live * 10 >= initial, "collapsed: {} -> {}", initial, live);
    assert!(live <= initial * 10, "grew: {} -> {}", initial, live);
    assert_eq!(scene.len(), live);
}

#[test]
fn negative_and_nan_advance_move_nothing() {
    let (mut field, mut scene) = make_field(9);
    let before: Vec<_> = field.instances().iter().map(|i| i.position).collect();
    field.advance(-5.0, &mut scene);
    field.advance(f32::NAN, &mut scene);
    let after: Vec<_> = field.instances().iter().map(|i| i.position).collect();
    assert_eq!(before, after);
}

#[test]
fn advance_moves_scene_nodes_with_instances() {
    let (mut field, mut scene) = make_field(10);
    field.advance(1.5, &mut scene);
    for inst in field.instances() {
        let node = scene.node(inst.node()).expect("node for live instance");
        assert_eq!(node.position, inst.position);
    }
}

#[test]
fn props_share_one_placeholder_without_variants() {
    let (field, scene) = make_field(11);
    let keys: Vec<_> = field
        .instances()
        .iter()
        .filter_map(|i| match &i.body {
            InstanceBody::Prop(p) => {
                assert_eq!(p.variant, None);
                scene.node(p.node).map(|n| n.mesh)
            }
            _ => None,
        })
        .collect();
    assert!(!keys.is_empty());
    assert!(keys.iter().all(|k| *k == keys[0]));
}

#[test]
fn props_draw_from_installed_variants() {
    let mut scene = SceneGraph::new();
    let variants = vec![
        scene.add_mesh(geometry::prop_placeholder(), MeshOwnership::Shared),
        scene.add_mesh(geometry::prop_placeholder(), MeshOwnership::Shared),
    ];
    let mut field = FieldManager::new(FieldConfig::default(), StdRng::seed_from_u64(12));
    field.set_prop_variants(variants.clone());
    field.populate_initial(&mut scene);

    for inst in field.instances() {
        if let InstanceBody::Prop(p) = &inst.body {
            let v = p.variant.expect("variant chosen");
            assert_eq!(scene.node(p.node).map(|n| n.mesh), Some(variants[v]));
        }
    }
}

#[test]
fn dispose_releases_every_node_and_mesh() {
    let (mut field, mut scene) = make_field(13);
    assert!(scene.mesh_count() > 0);
    field.dispose(&mut scene);

    assert_eq!(field.live_count(), 0);
    assert!(scene.is_empty());
    assert_eq!(scene.mesh_count(), 0);
    assert!(!scene.drain_released().is_empty());

    field.dispose(&mut scene);
    assert!(scene.drain_released().is_empty());
}

#[test]
fn runtime_field_change_applies_to_next_spawns() {
    let (mut field, mut scene) = make_field(11);
    let mut settings = config::SceneConfig::default();
    assert_eq!(settings.set("center_x", 500.0), Ok(config::ConfigChange::Field));
    assert_eq!(settings.set("spread_width", 8.0), Ok(config::ConfigChange::Field));
    field.set_config(settings.field.clone());

    let cfg = field.config().clone();
    field.advance(cfg.removal_z - cfg.generation_z + cfg.spawn_jitter + 1.0, &mut scene);
    let live = field.recycle(&mut scene);

    assert!(live > 0);
    assert_eq!(scene.len(), live);
    for inst in field.instances() {
        assert!(
            (inst.position.x - 500.0).abs() <= 4.0 + 1e-3,
            "x={} outside the moved window",
            inst.position.x
        );
    }
}

#[test]
fn reseeding_makes_spawns_repeatable() {
    let spawn_xs = |field: &mut FieldManager<StdRng>, scene: &mut SceneGraph| {
        field.set_rng(StdRng::seed_from_u64(99));
        field.populate_initial(scene);
        field.instances().iter().map(|i| i.position.x).collect::<Vec<_>>()
    };
    let (mut a, mut scene_a) = make_field(1);
    let (mut b, mut scene_b) = make_field(2);
    assert_eq!(spawn_xs(&mut a, &mut scene_a), spawn_xs(&mut b, &mut scene_b));
}
