use super::config::FieldConfig;
use super::geometry;
use super::placement::{self, ZBand};
use super::scene::{MeshKey, MeshOwnership, NodeId, SceneGraph, SceneNode};
use glam::Vec3;
use rand::Rng;

/// Placement draws per spawn before the spawn is skipped.
pub const MAX_SPAWN_ATTEMPTS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    GroundCover,
    Prop,
}

impl InstanceKind {
    pub const ALL: [InstanceKind; 2] = [InstanceKind::GroundCover, InstanceKind::Prop];

    #[inline]
    fn slot(self) -> usize {
        match self {
            InstanceKind::GroundCover => 0,
            InstanceKind::Prop => 1,
        }
    }
}

pub type InstanceId = u64;

/// Anything the field placed into the scene graph and must take back out.
pub trait SceneHandle {
    fn node(&self) -> NodeId;

    /// Detach from `scene`, releasing geometry the handle owns.
    fn dispose(&self, scene: &mut SceneGraph) {
        scene.remove(self.node());
    }
}

/// A cluster of grass blades; its mesh is generated once and owned by its node.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundCoverPatch {
    pub node: NodeId,
    pub blade_count: u32,
    pub blade_height: f32,
}

impl SceneHandle for GroundCoverPatch {
    fn node(&self) -> NodeId {
        self.node
    }
}

/// A vertical prop drawing a shared variant mesh, or the placeholder when
/// `variant` is `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct PropInstance {
    pub node: NodeId,
    pub variant: Option<usize>,
}

impl SceneHandle for PropInstance {
    fn node(&self) -> NodeId {
        self.node
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InstanceBody {
    GroundCover(GroundCoverPatch),
    Prop(PropInstance),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldInstance {
    pub id: InstanceId,
    pub position: Vec3,
    pub footprint: f32,
    pub body: InstanceBody,
}

impl FieldInstance {
    pub fn kind(&self) -> InstanceKind {
        match self.body {
            InstanceBody::GroundCover(_) => InstanceKind::GroundCover,
            InstanceBody::Prop(_) => InstanceKind::Prop,
        }
    }

    fn handle(&self) -> &dyn SceneHandle {
        match &self.body {
            InstanceBody::GroundCover(g) => g as &dyn SceneHandle,
            InstanceBody::Prop(p) => p as &dyn SceneHandle,
        }
    }

    pub fn node(&self) -> NodeId {
        self.handle().node()
    }

    fn dispose(&self, scene: &mut SceneGraph) {
        self.handle().dispose(scene);
    }
}

/// Keeps ground cover and props alive inside a window sliding along +Z.
///
/// Instances are spawned near `generation_z`, advance toward the viewer and
/// are recycled once past `removal_z`. Same-kind instances are never spawned
/// closer than the kind's minimum distance; since all instances move
/// together the spacing holds for their whole life.
pub struct FieldManager<R: Rng> {
    config: FieldConfig,
    rng: R,
    instances: Vec<FieldInstance>,
    next_id: InstanceId,
    prop_variants: Vec<MeshKey>,
    placeholder: Option<MeshKey>,
    // spawns skipped after exhausting placement attempts, per kind
    deficit: [usize; 2],
}

impl<R: Rng> FieldManager<R> {
    pub fn new(config: FieldConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            instances: Vec::new(),
            next_id: 0,
            prop_variants: Vec::new(),
            placeholder: None,
            deficit: [0; 2],
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// New tuning applies to instances spawned from now on.
    pub fn set_config(&mut self, config: FieldConfig) {
        self.config = config;
    }

    /// Replace the random source, e.g. after the seed changed.
    pub fn set_rng(&mut self, rng: R) {
        self.rng = rng;
    }

    /// Install loaded prop variant meshes (registered as shared in the scene).
    pub fn set_prop_variants(&mut self, variants: Vec<MeshKey>) {
        self.prop_variants = variants;
    }

    pub fn instances(&self) -> &[FieldInstance] {
        &self.instances
    }

    pub fn live_count(&self) -> usize {
        self.instances.len()
    }

    pub fn count_of(&self, kind: InstanceKind) -> usize {
        self.instances.iter().filter(|i| i.kind() == kind).count()
    }

    /// Spawns skipped so far and still waiting for a recycle event.
    pub fn deficit(&self, kind: InstanceKind) -> usize {
        self.deficit[kind.slot()]
    }

    pub fn min_distance(&self, kind: InstanceKind) -> f32 {
        match kind {
            InstanceKind::GroundCover => self.config.ground_min_distance,
            InstanceKind::Prop => self.config.prop_min_distance,
        }
    }

    /// Instances the initial population aims for, summed over every row.
    pub fn initial_target(&self, kind: InstanceKind) -> usize {
        (0..self.config.row_count.max(1))
            .map(|row| self.row_target(kind, row))
            .sum()
    }

    fn row_target(&self, kind: InstanceKind, row: usize) -> usize {
        let base = match kind {
            InstanceKind::GroundCover => self.config.per_row_density,
            InstanceKind::Prop => self.config.props_per_row,
        };
        if base == 0 {
            return 0;
        }
        let rows = self.config.row_count.max(1);
        // row 0 is nearest the viewer; the farthest row gets half the density
        let far_frac = if rows > 1 {
            row as f32 / (rows - 1) as f32
        } else {
            0.0
        };
        ((base as f32 * (1.0 - 0.5 * far_frac)).round() as usize).max(1)
    }

    fn row_band(&self, row: usize) -> ZBand {
        let rows = self.config.row_count.max(1) as f32;
        let depth = (self.config.removal_z - self.config.generation_z) / rows;
        let near = self.config.removal_z - depth * row as f32;
        ZBand::new(near - depth, near)
    }

    fn spawn_band(&self) -> ZBand {
        ZBand::new(
            self.config.generation_z - self.config.spawn_jitter,
            self.config.generation_z,
        )
    }

    /// Replace the live population with a fresh one spread over every row.
    /// Returns the live count.
    pub fn populate_initial(&mut self, scene: &mut SceneGraph) -> usize {
        self.clear(scene);
        for kind in InstanceKind::ALL {
            for row in 0..self.config.row_count.max(1) {
                let band = self.row_band(row);
                for _ in 0..self.row_target(kind, row) {
                    if !self.try_spawn(kind, band, scene) {
                        self.deficit[kind.slot()] += 1;
                    }
                }
            }
        }
        log::debug!(
            "[field] populated ground={} props={} skipped={:?}",
            self.count_of(InstanceKind::GroundCover),
            self.count_of(InstanceKind::Prop),
            self.deficit
        );
        self.instances.len()
    }

    /// Move every instance `distance` units toward the viewer. Negative or
    /// NaN distances move nothing.
    pub fn advance(&mut self, distance: f32, scene: &mut SceneGraph) {
        let d = distance.max(0.0);
        if d == 0.0 {
            return;
        }
        for inst in &mut self.instances {
            inst.position.z += d;
            scene.set_position(inst.node(), inst.position);
        }
    }

    /// Retire instances past `removal_z` and spawn replacements in the
    /// generation band. Returns the live count.
    ///
    /// Replacements that find no free spot are owed and retried at the next
    /// recycle event; a pass that retires nothing leaves the live set as is.
    pub fn recycle(&mut self, scene: &mut SceneGraph) -> usize {
        let removal_z = self.config.removal_z;
        if !self.instances.iter().any(|i| i.position.z > removal_z) {
            return self.instances.len();
        }
        let (crossed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.instances)
            .into_iter()
            .partition(|i| i.position.z > removal_z);
        self.instances = kept;
        for inst in &crossed {
            inst.dispose(scene);
            self.deficit[inst.kind().slot()] += 1;
        }

        let band = self.spawn_band();
        for kind in InstanceKind::ALL {
            let owed = std::mem::take(&mut self.deficit[kind.slot()]);
            for _ in 0..owed {
                if !self.try_spawn(kind, band, scene) {
                    self.deficit[kind.slot()] += 1;
                }
            }
        }
        self.instances.len()
    }

    /// Release every instance and the placeholder mesh. Safe to repeat.
    pub fn dispose(&mut self, scene: &mut SceneGraph) {
        self.clear(scene);
        if let Some(key) = self.placeholder.take() {
            scene.release_mesh(key);
        }
        for key in self.prop_variants.drain(..) {
            scene.release_mesh(key);
        }
    }

    fn clear(&mut self, scene: &mut SceneGraph) {
        for inst in self.instances.drain(..) {
            inst.dispose(scene);
        }
        self.deficit = [0; 2];
    }

    /// One placement with rejection sampling; `false` when every attempt
    /// landed too close to a live instance of the same kind.
    fn try_spawn(&mut self, kind: InstanceKind, band: ZBand, scene: &mut SceneGraph) -> bool {
        let min_distance = self.min_distance(kind);
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let candidate = placement::sample_position(
                &mut self.rng,
                band,
                self.config.half_width(),
                self.config.center_x,
                self.config.center_exponent,
            );
            let same_kind = self
                .instances
                .iter()
                .filter(|i| i.kind() == kind)
                .map(|i| i.position);
            if placement::is_separated(candidate, same_kind, min_distance) {
                let inst = self.create(kind, candidate, scene);
                self.instances.push(inst);
                return true;
            }
        }
        log::trace!("[field] no free spot for {:?} after {} attempts", kind, MAX_SPAWN_ATTEMPTS);
        false
    }

    fn create(&mut self, kind: InstanceKind, position: Vec3, scene: &mut SceneGraph) -> FieldInstance {
        let id = self.next_id;
        self.next_id += 1;
        match kind {
            InstanceKind::GroundCover => {
                let cfg = &self.config;
                let x_norm = (position.x - cfg.center_x) / cfg.half_width().max(1e-3);
                let falloff = placement::center_falloff(x_norm, cfg.periphery_shrink);
                let size = (cfg.min_patch_size
                    + (cfg.max_patch_size - cfg.min_patch_size) * self.rng.gen::<f32>())
                    * falloff;
                let blade_span = (cfg.max_blades - cfg.min_blades) as f32;
                let blades = (((cfg.min_blades as f32 + blade_span * self.rng.gen::<f32>())
                    * falloff)
                    .round() as u32)
                    .max(1);
                let blade_height = cfg.blade_height * (0.7 + 0.3 * falloff);
                let mesh = geometry::grass_patch(&mut self.rng, blades, size, blade_height);
                let key = scene.add_mesh(mesh, MeshOwnership::Owned);
                let node = scene.insert(
                    SceneNode::new(key, position).with_bounds(size.max(blade_height)),
                );
                FieldInstance {
                    id,
                    position,
                    footprint: size,
                    body: InstanceBody::GroundCover(GroundCoverPatch {
                        node,
                        blade_count: blades,
                        blade_height,
                    }),
                }
            }
            InstanceKind::Prop => {
                let scale = 0.8 + self.rng.gen::<f32>() * 0.5;
                let (variant, key) = if self.prop_variants.is_empty() {
                    (None, self.placeholder_mesh(scene))
                } else {
                    let v = self.rng.gen_range(0..self.prop_variants.len());
                    (Some(v), self.prop_variants[v])
                };
                let bounds = scene.mesh(key).map_or(3.0, |m| m.bounds_radius());
                let node = scene.insert(
                    SceneNode::new(key, position)
                        .with_scale(scale)
                        .with_bounds(bounds),
                );
                FieldInstance {
                    id,
                    position,
                    footprint: self.config.prop_footprint * scale,
                    body: InstanceBody::Prop(PropInstance { node, variant }),
                }
            }
        }
    }

    fn placeholder_mesh(&mut self, scene: &mut SceneGraph) -> MeshKey {
        match self.placeholder {
            Some(key) => key,
            None => {
                let key = scene.add_mesh(geometry::prop_placeholder(), MeshOwnership::Shared);
                self.placeholder = Some(key);
                key
            }
        }
    }
}
