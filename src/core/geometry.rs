use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;
use thiserror::Error;

/// Interleaved vertex shared by every scene mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

const VERTEX_FLOATS: usize = 9;
const HEADER_BYTES: usize = 8;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("mesh payload truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),
}

/// CPU-side triangle mesh. Immutable once handed to the scene graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Total payload size for the given header counts; `None` on overflow.
pub fn payload_len(vertex_count: usize, index_count: usize) -> Option<usize> {
    let vertex_bytes = vertex_count.checked_mul(VERTEX_FLOATS * 4)?;
    let index_bytes = index_count.checked_mul(4)?;
    HEADER_BYTES
        .checked_add(vertex_bytes)?
        .checked_add(index_bytes)
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Radius of the sphere around the local origin enclosing every vertex.
    pub fn bounds_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| Vec3::from(v.position).length())
            .fold(0.0, f32::max)
    }

    /// Decode a prop variant payload.
    ///
    /// Layout (little endian): `u32 vertex_count`, `u32 index_count`, then
    /// `vertex_count` vertices of 9 `f32` (position, normal, color) and
    /// `index_count` `u32` indices.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        if bytes.len() < HEADER_BYTES {
            return Err(GeometryError::Truncated {
                expected: HEADER_BYTES,
                actual: bytes.len(),
            });
        }
        let vertex_count = read_u32(&bytes[0..4]) as usize;
        let index_count = read_u32(&bytes[4..8]) as usize;
        // a corrupt header can ask for more than usize holds on wasm32
        let expected = payload_len(vertex_count, index_count).unwrap_or(usize::MAX);
        let vertex_bytes = vertex_count.saturating_mul(VERTEX_FLOATS * 4);
        if bytes.len() != expected {
            return Err(GeometryError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        if index_count % 3 != 0 {
            return Err(GeometryError::NotTriangles(index_count));
        }

        let body = &bytes[HEADER_BYTES..HEADER_BYTES + vertex_bytes];
        let vertices = body
            .chunks_exact(VERTEX_FLOATS * 4)
            .map(|chunk| {
                let mut f = [0.0_f32; VERTEX_FLOATS];
                for (dst, src) in f.iter_mut().zip(chunk.chunks_exact(4)) {
                    *dst = f32::from_le_bytes([src[0], src[1], src[2], src[3]]);
                }
                MeshVertex {
                    position: [f[0], f[1], f[2]],
                    normal: [f[3], f[4], f[5]],
                    color: [f[6], f[7], f[8]],
                }
            })
            .collect::<Vec<_>>();
        let indices = bytes[HEADER_BYTES + vertex_bytes..]
            .chunks_exact(4)
            .map(read_u32)
            .collect::<Vec<_>>();
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                index: bad,
                vertex_count,
            });
        }
        Ok(Self { vertices, indices })
    }

    fn push_triangle(&mut self, a: MeshVertex, b: MeshVertex, c: MeshVertex) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[a, b, c]);
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
}

#[inline]
fn read_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[inline]
fn vertex(position: Vec3, normal: Vec3, color: [f32; 3]) -> MeshVertex {
    MeshVertex {
        position: position.to_array(),
        normal: normal.normalize_or_zero().to_array(),
        color,
    }
}

const BLADE_ROOT: [f32; 3] = [0.05, 0.16, 0.04];
const BLADE_TIP: [f32; 3] = [0.42, 0.72, 0.22];

/// A patch of `blade_count` tapered blades scattered over a disc of `radius`.
///
/// Each blade is a single triangle leaning in a random direction; tips get a
/// lighter tint so the bloom pass picks them up under strong light.
pub fn grass_patch<R: Rng + ?Sized>(
    rng: &mut R,
    blade_count: u32,
    radius: f32,
    blade_height: f32,
) -> MeshData {
    let mut mesh = MeshData {
        vertices: Vec::with_capacity(blade_count as usize * 3),
        indices: Vec::with_capacity(blade_count as usize * 3),
    };
    for _ in 0..blade_count {
        // sqrt keeps the disc uniformly covered
        let r = radius * rng.gen::<f32>().sqrt();
        let theta = rng.gen::<f32>() * TAU;
        let base = Vec3::new(r * theta.cos(), 0.0, r * theta.sin());
        let facing = rng.gen::<f32>() * TAU;
        let across = Vec3::new(facing.cos(), 0.0, facing.sin());
        let normal = Vec3::new(-across.z, 0.35, across.x);
        let half_width = 0.03 + rng.gen::<f32>() * 0.04;
        let height = blade_height * (0.6 + rng.gen::<f32>() * 0.4);
        let lean = Vec3::new(
            (rng.gen::<f32>() - 0.5) * 0.5,
            0.0,
            (rng.gen::<f32>() - 0.5) * 0.5,
        ) * height;
        let tint = 0.85 + rng.gen::<f32>() * 0.3;
        let tip_color = [BLADE_TIP[0] * tint, BLADE_TIP[1] * tint, BLADE_TIP[2] * tint];
        mesh.push_triangle(
            vertex(base - across * half_width, normal, BLADE_ROOT),
            vertex(base + across * half_width, normal, BLADE_ROOT),
            vertex(base + lean + Vec3::Y * height, normal, tip_color),
        );
    }
    mesh
}

const TRUNK_COLOR: [f32; 3] = [0.22, 0.14, 0.08];
const CROWN_COLOR: [f32; 3] = [0.08, 0.3, 0.12];
const PLACEHOLDER_SEGMENTS: usize = 8;

/// Cylinder trunk under a cone crown; stands in for prop variants that have
/// not loaded.
pub fn prop_placeholder() -> MeshData {
    let mut mesh = MeshData::default();
    let n = PLACEHOLDER_SEGMENTS;
    let trunk_r = 0.15;
    let trunk_h = 1.2;
    let crown_r = 0.9;
    let crown_base = 1.0;
    let crown_top = 3.4;
    for i in 0..n {
        let a0 = TAU * i as f32 / n as f32;
        let a1 = TAU * (i + 1) as f32 / n as f32;
        let d0 = Vec3::new(a0.cos(), 0.0, a0.sin());
        let d1 = Vec3::new(a1.cos(), 0.0, a1.sin());

        let b0 = d0 * trunk_r;
        let b1 = d1 * trunk_r;
        let t0 = b0 + Vec3::Y * trunk_h;
        let t1 = b1 + Vec3::Y * trunk_h;
        mesh.push_triangle(
            vertex(b0, d0, TRUNK_COLOR),
            vertex(t0, d0, TRUNK_COLOR),
            vertex(b1, d1, TRUNK_COLOR),
        );
        mesh.push_triangle(
            vertex(b1, d1, TRUNK_COLOR),
            vertex(t0, d0, TRUNK_COLOR),
            vertex(t1, d1, TRUNK_COLOR),
        );

        let apex = Vec3::Y * crown_top;
        let r0 = d0 * crown_r + Vec3::Y * crown_base;
        let r1 = d1 * crown_r + Vec3::Y * crown_base;
        let slope = crown_r / (crown_top - crown_base);
        let mid = (d0 + d1).normalize_or_zero();
        mesh.push_triangle(
            vertex(r0, d0 + Vec3::Y * slope, CROWN_COLOR),
            vertex(apex, mid + Vec3::Y * slope, CROWN_COLOR),
            vertex(r1, d1 + Vec3::Y * slope, CROWN_COLOR),
        );
        mesh.push_triangle(
            vertex(r0, -Vec3::Y, CROWN_COLOR),
            vertex(r1, -Vec3::Y, CROWN_COLOR),
            vertex(Vec3::Y * crown_base, -Vec3::Y, CROWN_COLOR),
        );
    }
    mesh
}

/// Flat square ground quad centered on the origin.
pub fn ground_plane(half_extent: f32, color: [f32; 3]) -> MeshData {
    let corners = [
        Vec3::new(-half_extent, 0.0, -half_extent),
        Vec3::new(half_extent, 0.0, -half_extent),
        Vec3::new(half_extent, 0.0, half_extent),
        Vec3::new(-half_extent, 0.0, half_extent),
    ];
    MeshData {
        vertices: corners
            .iter()
            .map(|&p| vertex(p, Vec3::Y, color))
            .collect(),
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

const ORB_COLOR: [f32; 3] = [2.4, 2.1, 1.6];

/// Small bright octahedron drawn at the pointer position.
pub fn cursor_orb(radius: f32) -> MeshData {
    let axes = [Vec3::X, Vec3::Z, Vec3::NEG_X, Vec3::NEG_Z];
    let mut mesh = MeshData::default();
    for i in 0..4 {
        let a = axes[i] * radius;
        let b = axes[(i + 1) % 4] * radius;
        for pole in [Vec3::Y * radius, Vec3::NEG_Y * radius] {
            let n = (a + b + pole).normalize_or_zero();
            mesh.push_triangle(
                vertex(a, n, ORB_COLOR),
                vertex(b, n, ORB_COLOR),
                vertex(pole, n, ORB_COLOR),
            );
        }
    }
    mesh
}
