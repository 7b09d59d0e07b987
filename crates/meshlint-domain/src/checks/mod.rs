//! Built-in checks, grouped by category.
//!
//! Every entry point is a plain function of the enumerated scene. Thresholds
//! are module constants.

use meshlint_scene::{MeshQuery, SceneEnumerator, SceneNode};
use meshlint_types::{CheckResult, EntityId};

use crate::check::{Check, CheckError, ComponentHits, NodeHits};

pub mod general;
pub mod naming;
pub mod topology;
pub mod uvs;

/// All built-in checks in registration order.
pub fn builtin() -> Vec<Check> {
    let mut out = Vec::new();
    out.extend(general::checks());
    out.extend(naming::checks());
    out.extend(topology::checks());
    out.extend(uvs::checks());
    out
}

fn lookup<'a>(scene: &'a dyn SceneEnumerator, id: &EntityId) -> Result<&'a SceneNode, CheckError> {
    scene.node(id).ok_or_else(|| CheckError::UnknownEntity { id: id.key.clone() })
}

fn all_nodes(scene: &dyn SceneEnumerator, root_only: bool) -> Result<Vec<&SceneNode>, CheckError> {
    scene
        .entities(root_only)
        .iter()
        .map(|id| lookup(scene, id))
        .collect()
}

/// Flag every node matching `pred`, in enumeration order.
fn flag_nodes(
    scene: &dyn SceneEnumerator,
    root_only: bool,
    pred: impl Fn(&SceneNode) -> bool,
) -> Result<CheckResult, CheckError> {
    let mut hits = NodeHits::new();
    for node in all_nodes(scene, root_only)? {
        if pred(node) {
            hits.push(&node.id);
        }
    }
    Ok(hits.finish())
}

/// Flag mesh-bearing nodes whose scene node matches `pred`.
fn flag_mesh_nodes(
    scene: &dyn SceneEnumerator,
    pred: impl Fn(&SceneNode) -> bool,
) -> Result<CheckResult, CheckError> {
    let mut hits = NodeHits::new();
    for (id, _) in scene.mesh_entities() {
        if pred(lookup(scene, id)?) {
            hits.push(id);
        }
    }
    Ok(hits.finish())
}

/// Collect per-mesh component indices returned by `per_mesh`.
fn flag_components(
    scene: &dyn SceneEnumerator,
    per_mesh: impl Fn(&EntityId, &dyn MeshQuery) -> Vec<u32>,
) -> CheckResult {
    let mut hits = ComponentHits::new();
    for (id, mesh) in scene.mesh_entities() {
        hits.record(id, per_mesh(id, mesh));
    }
    hits.finish()
}
