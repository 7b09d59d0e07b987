//! USD-staged hierarchy backend. Ids are prim paths.

use std::collections::HashMap;

use glam::DMat4;
use meshlint_types::{EntityId, SceneBackend};
use tracing::{debug, warn};

use crate::enumerator::{FlatScene, NodeRole, SceneNode};
use crate::error::SceneError;
use crate::mesh::StagedMesh;
use crate::model::{PrimDesc, PrimType, StageDesc};
use crate::transform::local_matrix;

pub type StagedScene = FlatScene<StagedMesh>;

pub fn build_staged(desc: &StageDesc) -> Result<StagedScene, SceneError> {
    if let Some(default_prim) = &desc.default_prim {
        if !desc.prims.iter().any(|p| &p.name == default_prim) {
            return Err(SceneError::UnknownDefaultPrim {
                name: default_prim.clone(),
            });
        }
    }

    let mut nodes = Vec::new();
    let mut meshes = HashMap::new();
    for prim in &desc.prims {
        visit(prim, None, "", DMat4::IDENTITY, 1, &mut nodes, &mut meshes)?;
    }
    debug!(
        prims = nodes.len(),
        meshes = meshes.len(),
        "built staged scene"
    );
    FlatScene::new(SceneBackend::Staged, nodes, meshes)
}

fn visit(
    prim: &PrimDesc,
    parent: Option<&EntityId>,
    parent_path: &str,
    parent_world: DMat4,
    depth: u32,
    nodes: &mut Vec<SceneNode>,
    meshes: &mut HashMap<usize, StagedMesh>,
) -> Result<(), SceneError> {
    let parent_display = if parent_path.is_empty() { "/" } else { parent_path };
    if prim.name.is_empty() {
        return Err(SceneError::EmptyName {
            backend: SceneBackend::Staged,
            parent: parent_display.to_string(),
        });
    }
    if prim.name.contains('/') {
        return Err(SceneError::InvalidPrimName {
            name: prim.name.clone(),
            parent: parent_display.to_string(),
        });
    }

    let path = format!("{parent_path}/{}", prim.name);
    let id = EntityId::staged(path.clone());
    let world = parent_world * local_matrix(&prim.xform);

    let role = match prim.type_name {
        PrimType::Xform => NodeRole::Transform,
        PrimType::Mesh => NodeRole::Mesh,
        PrimType::Scope => NodeRole::Scope,
        PrimType::Camera => NodeRole::Camera,
        PrimType::Light => NodeRole::Light,
    };

    let index = nodes.len();
    match (&prim.mesh, role) {
        (Some(mesh), NodeRole::Mesh) => {
            meshes.insert(index, StagedMesh::from_desc(mesh));
        }
        (Some(_), _) => warn!(prim = %path, "mesh attributes on a non-Mesh prim are ignored"),
        (None, NodeRole::Mesh) => warn!(prim = %path, "Mesh prim has no mesh attributes"),
        (None, _) => {}
    }

    nodes.push(SceneNode {
        id: id.clone(),
        name: prim.name.clone(),
        path: path.clone(),
        role,
        parent: parent.cloned(),
        children: Vec::new(),
        depth,
        local: prim.xform,
        world,
        visible: prim.visible,
        layer: None,
        layer_visible: true,
        material: prim.material_binding.clone(),
        history: Vec::new(),
        shape_name: None,
        intermediate: false,
    });

    for child in &prim.children {
        visit(child, Some(&id), &path, world, depth + 1, nodes, meshes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::SceneEnumerator;
    use crate::model::UsdMeshDesc;

    fn tri() -> UsdMeshDesc {
        UsdMeshDesc {
            points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            face_vertex_counts: vec![3],
            face_vertex_indices: vec![0, 1, 2],
            ..UsdMeshDesc::default()
        }
    }

    fn stage() -> StageDesc {
        let mut root = PrimDesc::new("root", PrimType::Xform);
        let mut geo = PrimDesc::new("geo", PrimType::Mesh);
        geo.mesh = Some(tri());
        root.children.push(geo);
        root.children.push(PrimDesc::new("looks", PrimType::Scope));
        StageDesc {
            default_prim: Some("root".into()),
            prims: vec![root],
        }
    }

    #[test]
    fn ids_are_prim_paths() {
        let scene = build_staged(&stage()).expect("build");
        let keys: Vec<String> = scene.entities(false).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["/root", "/root/geo", "/root/looks"]);
        let meshes = scene.mesh_entities();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].0.key, "/root/geo");
        assert_eq!(scene.resolve_name(meshes[0].0), "/root/geo");
    }

    #[test]
    fn slash_in_prim_name_is_fatal() {
        let desc = StageDesc {
            default_prim: None,
            prims: vec![PrimDesc::new("a/b", PrimType::Xform)],
        };
        assert!(matches!(
            build_staged(&desc),
            Err(SceneError::InvalidPrimName { .. })
        ));
    }

    #[test]
    fn duplicate_sibling_paths_are_fatal() {
        let desc = StageDesc {
            default_prim: None,
            prims: vec![
                PrimDesc::new("a", PrimType::Xform),
                PrimDesc::new("a", PrimType::Scope),
            ],
        };
        assert!(matches!(
            build_staged(&desc),
            Err(SceneError::DuplicateId { .. })
        ));
    }

    #[test]
    fn unknown_default_prim_is_fatal() {
        let mut desc = stage();
        desc.default_prim = Some("nope".into());
        assert!(matches!(
            build_staged(&desc),
            Err(SceneError::UnknownDefaultPrim { .. })
        ));
    }

    #[test]
    fn mesh_prim_without_attributes_is_not_a_mesh_entity() {
        let desc = StageDesc {
            default_prim: None,
            prims: vec![PrimDesc::new("m", PrimType::Mesh)],
        };
        let scene = build_staged(&desc).expect("build");
        assert!(scene.mesh_entities().is_empty());
        assert_eq!(scene.entities(false).len(), 1);
    }
}
