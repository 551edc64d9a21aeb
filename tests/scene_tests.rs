// Host-side tests for the scene graph, mesh payloads and placement sampling.

#![allow(dead_code)]
mod geometry {
    include!("../src/core/geometry.rs");
}
mod placement {
    include!("../src/core/placement.rs");
}
mod scene {
    include!("../src/core/scene.rs");
}

use geometry::*;
use glam::Vec3;
use placement::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scene::*;

fn payload(vertices: &[[f32; 9]], indices: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(vertices.len() as u32).to_le_bytes());
    out.extend_from_slice(&(indices.len() as u32).to_le_bytes());
    for v in vertices {
        for f in v {
            out.extend_from_slice(&f.to_le_bytes());
        }
    }
    for i in indices {
        out.extend_from_slice(&i.to_le_bytes());
    }
    out
}

const TRI: [[f32; 9]; 3] = [
    [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
    [0.0, 2.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
];

#[test]
fn decodes_mesh_payload() {
    let mesh = MeshData::from_le_bytes(&payload(&TRI, &[0, 1, 2])).expect("valid payload");
    assert_eq!(mesh.triangle_count(), 1);
    assert_eq!(mesh.vertices[2].position, [0.0, 2.0, 0.0]);
    assert_eq!(mesh.vertices[1].color, [0.0, 1.0, 0.0]);
    assert_eq!(mesh.bounds_radius(), 2.0);
}

#[test]
fn rejects_bad_payloads() {
    let good = payload(&TRI, &[0, 1, 2]);
    assert!(matches!(
        MeshData::from_le_bytes(&good[..good.len() - 1]),
        Err(GeometryError::Truncated { .. })
    ));
    assert!(matches!(
        MeshData::from_le_bytes(&[1, 0]),
        Err(GeometryError::Truncated { expected: 8, actual: 2 })
    ));
    assert_eq!(
        MeshData::from_le_bytes(&payload(&TRI, &[0, 1])),
        Err(GeometryError::NotTriangles(2))
    );
    assert_eq!(
        MeshData::from_le_bytes(&payload(&TRI, &[0, 1, 3])),
        Err(GeometryError::IndexOutOfRange {
            index: 3,
            vertex_count: 3
        })
    );
}

#[test]
fn oversized_headers_are_truncation_errors() {
    let mut header = Vec::new();
    header.extend_from_slice(&u32::MAX.to_le_bytes());
    header.extend_from_slice(&u32::MAX.to_le_bytes());
    assert!(matches!(
        MeshData::from_le_bytes(&header),
        Err(GeometryError::Truncated { actual: 8, .. })
    ));

    assert_eq!(payload_len(1, 3), Some(8 + 36 + 12));
    assert_eq!(payload_len(usize::MAX / 8, 0), None);
    assert_eq!(payload_len(0, usize::MAX / 2), None);
    assert_eq!(payload_len(usize::MAX / 36, usize::MAX / 4), None);
}

#[test]
fn generated_meshes_are_indexed_triangles() {
    let mut rng = StdRng::seed_from_u64(1);
    let grass = grass_patch(&mut rng, 30, 1.5, 0.9);
    assert_eq!(grass.triangle_count(), 30);
    for mesh in [grass, prop_placeholder(), ground_plane(50.0, [0.1; 3]), cursor_orb(0.2)] {
        assert!(!mesh.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }
    assert!((cursor_orb(0.2).bounds_radius() - 0.2).abs() < 1e-6);
}

#[test]
fn owned_mesh_goes_with_its_node() {
    let mut scene = SceneGraph::new();
    let owned = scene.add_mesh(cursor_orb(0.1), MeshOwnership::Owned);
    let shared = scene.add_mesh(prop_placeholder(), MeshOwnership::Shared);
    let a = scene.insert(SceneNode::new(owned, Vec3::ZERO));
    let b = scene.insert(SceneNode::new(shared, Vec3::ZERO));
    let c = scene.insert(SceneNode::new(shared, Vec3::X));

    scene.remove(a);
    scene.remove(b);
    assert_eq!(scene.drain_released(), vec![owned]);
    assert!(scene.mesh(shared).is_some());
    assert!(scene.contains(c));

    scene.release_mesh(shared);
    scene.release_mesh(shared);
    assert_eq!(scene.drain_released(), vec![shared]);
    assert_eq!(scene.remove(a), None);
}

#[test]
fn layer_hiding_is_undone_exactly() {
    let mut scene = SceneGraph::new();
    let world = scene.insert(SceneNode::new(0, Vec3::ZERO));
    let cursor = scene.insert(
        SceneNode::new(0, Vec3::ZERO).with_layers(LayerMask::layer(LAYER_WORLD).with(LAYER_CURSOR)),
    );
    let count = scene.with_layers_hidden(LayerMask::layer(LAYER_CURSOR), |s| s.visible_nodes().count());
    assert_eq!(count, 1);
    assert!(scene.node(cursor).is_some_and(|n| n.visible));
    assert!(scene.node(world).is_some_and(|n| n.visible));
    assert_eq!(
        scene.with_layers_hidden(LayerMask::NONE, |s| s.visible_nodes().count()),
        2
    );
}

#[test]
fn center_bias_packs_draws_toward_zero() {
    assert_eq!(center_biased(0.5, 1.5), 0.0);
    assert_eq!(center_biased(0.0, 1.5), -1.0);
    assert_eq!(center_biased(1.0, 1.5), 1.0);
    assert!((center_biased(0.75, 1.0) - 0.5).abs() < 1e-6);
    assert!(center_biased(0.75, 2.0).abs() < 0.5);
}

#[test]
fn falloff_shrinks_the_periphery() {
    assert_eq!(center_falloff(0.0, 0.6), 1.0);
    assert!((center_falloff(1.0, 0.6) - 0.4).abs() < 1e-6);
    assert_eq!(center_falloff(-3.0, 0.6), center_falloff(1.0, 0.6));
}

#[test]
fn samples_stay_in_band_and_width() {
    let mut rng = StdRng::seed_from_u64(2);
    let band = ZBand::new(-10.0, -20.0);
    assert_eq!((band.min, band.max), (-20.0, -10.0));
    for _ in 0..500 {
        let p = sample_position(&mut rng, band, 5.0, 2.0, 1.5);
        assert!(band.contains(p.z));
        assert!(p.x >= -3.0 - 1e-4 && p.x <= 7.0 + 1e-4);
        assert_eq!(p.y, 0.0);
    }
}

#[test]
fn separation_uses_the_ground_plane() {
    let others = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)];
    assert!(is_separated(Vec3::new(5.0, 100.0, 0.0), others, 5.0));
    assert!(!is_separated(Vec3::new(0.0, 0.0, 1.0), others, 2.0));
    assert!(is_separated(Vec3::ZERO, std::iter::empty(), 100.0));
}
