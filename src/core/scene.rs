use super::geometry::MeshData;
use fnv::FnvHashMap;
use glam::Vec3;
use std::collections::BTreeMap;

pub type NodeId = u32;
pub type MeshKey = u32;

// Layer indices carried by scene nodes.
pub const LAYER_WORLD: u32 = 0;
pub const LAYER_CURSOR: u32 = 1;

/// Bitmask of scene layers; bit `n` set means "on layer n".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);

    #[inline]
    pub const fn layer(index: u32) -> Self {
        LayerMask(1 << (index & 31))
    }

    #[inline]
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn with(self, index: u32) -> Self {
        LayerMask(self.0 | Self::layer(index).0)
    }
}

/// Whether a mesh lives and dies with the single node that uses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshOwnership {
    /// Released automatically when its node is removed.
    Owned,
    /// Kept until `release_mesh` is called; may back many nodes.
    Shared,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub position: Vec3,
    pub scale: f32,
    pub layers: LayerMask,
    pub visible: bool,
    pub bounds_radius: f32,
    pub mesh: MeshKey,
}

impl SceneNode {
    pub fn new(mesh: MeshKey, position: Vec3) -> Self {
        Self {
            position,
            scale: 1.0,
            layers: LayerMask::layer(LAYER_WORLD),
            visible: true,
            bounds_radius: 1.0,
            mesh,
        }
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_bounds(mut self, radius: f32) -> Self {
        self.bounds_radius = radius;
        self
    }
}

struct MeshEntry {
    data: MeshData,
    ownership: MeshOwnership,
}

/// Nodes currently hidden by `hide_layers`, to be handed back to `restore`.
#[derive(Debug, Default)]
#[must_use]
pub struct HiddenNodes(Vec<NodeId>);

impl HiddenNodes {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Flat scene graph shared by the field manager and the renderer.
///
/// The graph owns CPU mesh data; the GPU mesh cache mirrors it and learns
/// about dropped meshes through `drain_released`.
#[derive(Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    meshes: FnvHashMap<MeshKey, MeshEntry>,
    released: Vec<MeshKey>,
    next_node: NodeId,
    next_mesh: MeshKey,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, data: MeshData, ownership: MeshOwnership) -> MeshKey {
        let key = self.next_mesh;
        self.next_mesh = self.next_mesh.wrapping_add(1);
        self.meshes.insert(key, MeshEntry { data, ownership });
        key
    }

    pub fn mesh(&self, key: MeshKey) -> Option<&MeshData> {
        self.meshes.get(&key).map(|m| &m.data)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Drop a mesh and queue it for GPU release. Unknown keys are ignored.
    pub fn release_mesh(&mut self, key: MeshKey) {
        if self.meshes.remove(&key).is_some() {
            self.released.push(key);
        }
    }

    /// Mesh keys released since the last call.
    pub fn drain_released(&mut self) -> Vec<MeshKey> {
        std::mem::take(&mut self.released)
    }

    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = self.next_node;
        self.next_node = self.next_node.wrapping_add(1);
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node; its mesh goes with it when owned.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        let owned = self
            .meshes
            .get(&node.mesh)
            .is_some_and(|m| m.ownership == MeshOwnership::Owned);
        if owned {
            self.release_mesh(node.mesh);
        }
        Some(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.position = position;
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.nodes().filter(|(_, n)| n.visible)
    }

    /// Hide every visible node on any layer in `mask`.
    pub fn hide_layers(&mut self, mask: LayerMask) -> HiddenNodes {
        if mask == LayerMask::NONE {
            return HiddenNodes::default();
        }
        let mut hidden = Vec::new();
        for (id, node) in self.nodes.iter_mut() {
            if node.visible && node.layers.intersects(mask) {
                node.visible = false;
                hidden.push(*id);
            }
        }
        HiddenNodes(hidden)
    }

    /// Make visible again exactly the nodes `hide_layers` hid.
    pub fn restore(&mut self, hidden: HiddenNodes) {
        for id in hidden.0 {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.visible = true;
            }
        }
    }

    /// Run `f` with nodes on `mask` hidden, restoring them afterwards.
    pub fn with_layers_hidden<T>(&mut self, mask: LayerMask, f: impl FnOnce(&SceneGraph) -> T) -> T {
        let hidden = self.hide_layers(mask);
        let out = f(self);
        self.restore(hidden);
        out
    }
}
