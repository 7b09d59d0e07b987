//! The enumerated-scene context checks run against.

use std::collections::HashMap;

use glam::{DMat4, DVec3};
use meshlint_types::{EntityId, SceneBackend};

use crate::error::SceneError;
use crate::mesh::MeshQuery;
use crate::model::TransformDesc;

/// Read-only view of one scene representation, built once per run.
///
/// All sequences follow depth-first pre-order over the backing document.
pub trait SceneEnumerator {
    fn backend(&self) -> SceneBackend;

    /// All nodes, or only the top-level ones when `root_only` is set.
    fn entities(&self, root_only: bool) -> Vec<EntityId>;

    /// Nodes that carry mesh geometry, paired with their mesh handle.
    fn mesh_entities(&self) -> Vec<(&EntityId, &dyn MeshQuery)>;

    /// Display path for `id`, or the raw id when it cannot be resolved.
    fn resolve_name(&self, id: &EntityId) -> String;

    fn node(&self, id: &EntityId) -> Option<&SceneNode>;

    /// World-space bounds of every mesh point in the subtree rooted at `id`.
    fn world_bounds(&self, id: &EntityId) -> Option<Bounds>;
}

/// What a node is, after mapping backend-specific node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Transform,
    Mesh,
    Scope,
    Camera,
    Light,
    Joint,
    Locator,
}

impl NodeRole {
    /// Nodes that exist only to group other nodes.
    pub fn is_grouping(self) -> bool {
        matches!(self, NodeRole::Transform | NodeRole::Scope)
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: EntityId,
    /// Short name (last path segment).
    pub name: String,
    /// Full display path: `|a|b` for native nodes, `/a/b` for prims.
    pub path: String,
    pub role: NodeRole,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    /// Roots have depth 1.
    pub depth: u32,
    pub local: TransformDesc,
    pub world: DMat4,
    pub visible: bool,
    pub layer: Option<String>,
    /// False when the node sits on a hidden display layer.
    pub layer_visible: bool,
    pub material: Option<String>,
    pub history: Vec<String>,
    pub shape_name: Option<String>,
    /// The node's shape is an intermediate object and carries no renderable mesh.
    pub intermediate: bool,
}

impl SceneNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// World position of the local rotate/scale pivot.
    pub fn world_pivot(&self) -> DVec3 {
        self.world
            .transform_point3(DVec3::from_array(self.local.pivot))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl Bounds {
    fn from_point(p: DVec3) -> Self {
        Self { min: p, max: p }
    }

    fn extend(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }
}

/// Node storage shared by both backends.
///
/// Nodes are kept in pre-order, so a subtree is the contiguous run of nodes
/// after its root with a greater depth.
#[derive(Debug)]
pub struct FlatScene<M> {
    backend: SceneBackend,
    nodes: Vec<SceneNode>,
    index: HashMap<EntityId, usize>,
    meshes: HashMap<usize, M>,
}

impl<M: MeshQuery> FlatScene<M> {
    /// `nodes` must be in pre-order with `parent` already set; children lists are derived.
    pub(crate) fn new(
        backend: SceneBackend,
        mut nodes: Vec<SceneNode>,
        meshes: HashMap<usize, M>,
    ) -> Result<Self, SceneError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if let Some(prev) = index.insert(node.id.clone(), i) {
                return Err(SceneError::DuplicateId {
                    backend,
                    id: node.id.key.clone(),
                    first: nodes[prev].path.clone(),
                    second: node.path.clone(),
                });
            }
        }

        for i in 0..nodes.len() {
            let Some(parent) = nodes[i].parent.clone() else {
                continue;
            };
            if let Some(&p) = index.get(&parent) {
                let child = nodes[i].id.clone();
                nodes[p].children.push(child);
            }
        }

        Ok(Self {
            backend,
            nodes,
            index,
            meshes,
        })
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn subtree(&self, root: usize) -> &[SceneNode] {
        let depth = self.nodes[root].depth;
        let end = self.nodes[root + 1..]
            .iter()
            .position(|n| n.depth <= depth)
            .map_or(self.nodes.len(), |p| root + 1 + p);
        &self.nodes[root..end]
    }
}

impl<M: MeshQuery> SceneEnumerator for FlatScene<M> {
    fn backend(&self) -> SceneBackend {
        self.backend
    }

    fn entities(&self, root_only: bool) -> Vec<EntityId> {
        self.nodes
            .iter()
            .filter(|n| !root_only || n.is_root())
            .map(|n| n.id.clone())
            .collect()
    }

    fn mesh_entities(&self) -> Vec<(&EntityId, &dyn MeshQuery)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| {
                self.meshes
                    .get(&i)
                    .map(|m| (&n.id, m as &dyn MeshQuery))
            })
            .collect()
    }

    fn resolve_name(&self, id: &EntityId) -> String {
        match self.node(id) {
            Some(node) => node.path.clone(),
            None => id.key.clone(),
        }
    }

    fn node(&self, id: &EntityId) -> Option<&SceneNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn world_bounds(&self, id: &EntityId) -> Option<Bounds> {
        let root = *self.index.get(id)?;
        let mut bounds: Option<Bounds> = None;
        for (offset, node) in self.subtree(root).iter().enumerate() {
            let Some(mesh) = self.meshes.get(&(root + offset)) else {
                continue;
            };
            for i in 0..mesh.point_count() as u32 {
                let Some(p) = mesh.point(i) else { continue };
                let p = node.world.transform_point3(p);
                match bounds.as_mut() {
                    Some(b) => b.extend(p),
                    None => bounds = Some(Bounds::from_point(p)),
                }
            }
        }
        bounds
    }
}
