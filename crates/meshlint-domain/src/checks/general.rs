use glam::DVec3;
use meshlint_scene::transform::{IDENTITY_EPSILON, WorldComponents};
use meshlint_scene::{DEFAULT_LAYER, NodeRole, SceneEnumerator, SceneNode};
use meshlint_types::{CATEGORY_GENERAL, CheckResult, EntityKind};

use super::{all_nodes, flag_mesh_nodes, flag_nodes, lookup};
use crate::check::{BackendTable, Check, CheckError, NodeHits};

/// Allowed distance of a root's lowest point from the ground plane.
pub const ON_GRID_TOLERANCE: f64 = 1e-4;

/// Deepest allowed node; roots have depth 1.
pub const MAX_HIERARCHY_DEPTH: u32 = 5;

/// Meshes with more faces than this exceed the polygon budget.
pub const MAX_POLY_COUNT: usize = 2000;

/// Materials a fresh DCC scene assigns by default.
pub const DEFAULT_SHADERS: &[&str] = &["lambert1", "initialShadingGroup", "standardSurface1"];

pub(crate) fn checks() -> Vec<Check> {
    vec![
        Check {
            name: "default_shader",
            label: "Default Shader",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Meshes without a material or bound to the default shader.",
            backends: BackendTable::both(default_shader),
        },
        Check {
            name: "empty_groups",
            label: "Empty Groups",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Group nodes with no children and no shape.",
            backends: BackendTable::both(empty_groups),
        },
        Check {
            name: "history",
            label: "History",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Nodes that still carry construction history.",
            backends: BackendTable::native_only(history),
        },
        Check {
            name: "layers",
            label: "Layers",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Nodes assigned to a display layer other than the default layer.",
            backends: BackendTable::native_only(layers),
        },
        Check {
            name: "on_grid",
            label: "On Grid",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Root nodes whose lowest point is further than 0.0001 from the grid.",
            backends: BackendTable::split(on_grid_native, on_grid_staged),
        },
        Check {
            name: "parent_geometry",
            label: "Parent Geometry",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Mesh nodes that have child nodes.",
            backends: BackendTable::both(parent_geometry),
        },
        Check {
            name: "uncentered_pivots",
            label: "Uncentered Pivots",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Nodes whose world-space pivot is not at the origin.",
            backends: BackendTable::both(uncentered_pivots),
        },
        Check {
            name: "unfrozen_transforms",
            label: "Unfrozen Transforms",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Nodes whose world translation, rotation or scale is not identity.",
            backends: BackendTable::both(unfrozen_transforms),
        },
        Check {
            name: "hidden_objects",
            label: "Hidden Objects",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Meshes hidden directly or through a hidden display layer.",
            backends: BackendTable::both(hidden_objects),
        },
        Check {
            name: "hierarchy_depth",
            label: "Hierarchy Depth",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Nodes nested deeper than five levels.",
            backends: BackendTable::both(hierarchy_depth),
        },
        Check {
            name: "intermediate_objects",
            label: "Intermediate Objects",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Nodes whose shape is an intermediate object left behind by a deformer.",
            backends: BackendTable::native_only(intermediate_objects),
        },
        Check {
            name: "poly_count_limit",
            label: "Poly Count Limit",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "Meshes with more than 2000 faces.",
            backends: BackendTable::both(poly_count_limit),
        },
    ]
}

fn is_default_material(material: Option<&str>) -> bool {
    match material {
        None => true,
        Some(binding) => {
            let leaf = binding.rsplit('/').next().unwrap_or(binding);
            DEFAULT_SHADERS.contains(&leaf)
        }
    }
}

fn default_shader(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_mesh_nodes(scene, |n| is_default_material(n.material.as_deref()))
}

fn empty_groups(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        n.role.is_grouping() && n.children.is_empty() && n.shape_name.is_none()
    })
}

fn history(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| !n.history.is_empty())
}

fn layers(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        n.layer.as_deref().is_some_and(|l| l != DEFAULT_LAYER)
    })
}

fn off_grid(scene: &dyn SceneEnumerator, node: &SceneNode) -> bool {
    scene
        .world_bounds(&node.id)
        .is_some_and(|b| b.min.y.abs() > ON_GRID_TOLERANCE)
}

fn on_grid_native(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, true, |n| off_grid(scene, n))
}

/// The staged pass inspects every prim beneath a root and flags the root when
/// any of them sits off the grid.
fn on_grid_staged(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    let mut hits = NodeHits::new();
    for root in all_nodes(scene, true)? {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if off_grid(scene, node) {
                hits.push(&root.id);
                break;
            }
            for child in node.children.iter().rev() {
                stack.push(lookup(scene, child)?);
            }
        }
    }
    Ok(hits.finish())
}

fn parent_geometry(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        n.role == NodeRole::Mesh && !n.children.is_empty()
    })
}

fn uncentered_pivots(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        !n.world_pivot().abs_diff_eq(DVec3::ZERO, IDENTITY_EPSILON)
    })
}

fn unfrozen_transforms(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        !WorldComponents::from_matrix(&n.world).is_identity()
    })
}

fn hidden_objects(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        n.role == NodeRole::Mesh && (!n.visible || !n.layer_visible)
    })
}

fn hierarchy_depth(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| n.depth > MAX_HIERARCHY_DEPTH)
}

fn intermediate_objects(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| n.intermediate)
}

fn poly_count_limit(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    let mut hits = NodeHits::new();
    for (id, mesh) in scene.mesh_entities() {
        if mesh.face_count() > MAX_POLY_COUNT {
            hits.push(id);
        }
    }
    Ok(hits.finish())
}
