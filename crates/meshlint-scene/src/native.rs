//! Native DAG scene backend.

use std::collections::HashMap;

use glam::DMat4;
use meshlint_types::{EntityId, SceneBackend};
use tracing::debug;
use uuid::Uuid;

use crate::enumerator::{FlatScene, NodeRole, SceneNode};
use crate::error::SceneError;
use crate::mesh::NativeMesh;
use crate::model::{NativeSceneDesc, NodeDesc, NodeKind};
use crate::transform::local_matrix;

pub const DEFAULT_LAYER: &str = "defaultLayer";

pub type NativeScene = FlatScene<NativeMesh>;

/// Upper-case UUIDv5 of a DAG path, used when a node carries no explicit uuid.
pub fn derive_uuid(dag_path: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, dag_path.as_bytes())
        .to_string()
        .to_uppercase()
}

pub fn build_native(desc: &NativeSceneDesc) -> Result<NativeScene, SceneError> {
    let hidden_layers: Vec<&str> = desc
        .layers
        .iter()
        .filter(|l| !l.visible)
        .map(|l| l.name.as_str())
        .collect();

    let mut builder = Builder {
        hidden_layers,
        nodes: Vec::new(),
        meshes: HashMap::new(),
    };
    for root in &desc.nodes {
        builder.visit(root, None, "", DMat4::IDENTITY, 1)?;
    }
    debug!(
        nodes = builder.nodes.len(),
        meshes = builder.meshes.len(),
        "built native scene"
    );
    FlatScene::new(SceneBackend::Native, builder.nodes, builder.meshes)
}

struct Builder<'a> {
    hidden_layers: Vec<&'a str>,
    nodes: Vec<SceneNode>,
    meshes: HashMap<usize, NativeMesh>,
}

impl Builder<'_> {
    fn visit(
        &mut self,
        desc: &NodeDesc,
        parent: Option<&EntityId>,
        parent_path: &str,
        parent_world: DMat4,
        depth: u32,
    ) -> Result<(), SceneError> {
        if desc.name.is_empty() {
            return Err(SceneError::EmptyName {
                backend: SceneBackend::Native,
                parent: display_parent(parent_path),
            });
        }

        let path = format!("{parent_path}|{}", desc.name);
        let key = match &desc.uuid {
            Some(raw) => Uuid::parse_str(raw)
                .map_err(|_| SceneError::InvalidUuid {
                    path: path.clone(),
                    value: raw.clone(),
                })?
                .to_string()
                .to_uppercase(),
            None => derive_uuid(&path),
        };
        let id = EntityId::native(key);
        let world = parent_world * local_matrix(&desc.transform);

        let role = match (desc.kind, &desc.shape) {
            (NodeKind::Transform, Some(_)) if !desc.intermediate => NodeRole::Mesh,
            (NodeKind::Transform, _) => NodeRole::Transform,
            (NodeKind::Camera, _) => NodeRole::Camera,
            (NodeKind::Light, _) => NodeRole::Light,
            (NodeKind::Joint, _) => NodeRole::Joint,
            (NodeKind::Locator, _) => NodeRole::Locator,
        };

        let layer_visible = desc
            .layer
            .as_deref()
            .is_none_or(|l| !self.hidden_layers.contains(&l));

        let index = self.nodes.len();
        if role == NodeRole::Mesh {
            if let Some(shape) = &desc.shape {
                self.meshes.insert(index, NativeMesh::from_desc(&shape.mesh));
            }
        }

        self.nodes.push(SceneNode {
            id: id.clone(),
            name: desc.name.clone(),
            path: path.clone(),
            role,
            parent: parent.cloned(),
            children: Vec::new(),
            depth,
            local: desc.transform,
            world,
            visible: desc.visible,
            layer: desc.layer.clone(),
            layer_visible,
            material: desc.shader.clone(),
            history: desc.history.clone(),
            shape_name: desc.shape.as_ref().map(|s| s.name.clone()),
            intermediate: desc.intermediate && desc.shape.is_some(),
        });

        for child in &desc.children {
            self.visit(child, Some(&id), &path, world, depth + 1)?;
        }
        Ok(())
    }
}

fn display_parent(parent_path: &str) -> String {
    if parent_path.is_empty() {
        "|".to_string()
    } else {
        parent_path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::SceneEnumerator;
    use crate::model::{FaceDesc, LayerDesc, MeshDesc, ShapeDesc};

    fn cube_shape(name: &str) -> ShapeDesc {
        ShapeDesc {
            name: name.to_string(),
            mesh: MeshDesc {
                points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
                faces: vec![FaceDesc {
                    vertices: vec![0, 1, 2],
                    uvs: None,
                }],
                ..MeshDesc::default()
            },
        }
    }

    fn sample() -> NativeSceneDesc {
        let mut root = NodeDesc::new("grp");
        let mut geo = NodeDesc::new("geo");
        geo.shape = Some(cube_shape("geoShape"));
        geo.layer = Some("hiddenLayer".into());
        root.children.push(geo);
        root.children.push(NodeDesc::new("empty"));
        NativeSceneDesc {
            nodes: vec![root, NodeDesc::new("other")],
            layers: vec![LayerDesc {
                name: "hiddenLayer".into(),
                visible: false,
            }],
        }
    }

    #[test]
    fn enumerates_in_pre_order_with_dag_paths() {
        let scene = build_native(&sample()).expect("build");
        let names: Vec<String> = scene
            .entities(false)
            .iter()
            .map(|id| scene.resolve_name(id))
            .collect();
        assert_eq!(names, vec!["|grp", "|grp|geo", "|grp|empty", "|other"]);
        assert_eq!(scene.entities(true).len(), 2);
    }

    #[test]
    fn derived_ids_are_stable_upper_case_uuids() {
        let a = build_native(&sample()).expect("build");
        let b = build_native(&sample()).expect("build");
        assert_eq!(a.entities(false), b.entities(false));
        let id = &a.entities(false)[1];
        assert_eq!(id.key, derive_uuid("|grp|geo"));
        assert_eq!(id.key, id.key.to_uppercase());
        assert!(Uuid::parse_str(&id.key).is_ok());
    }

    #[test]
    fn mesh_entities_and_layers_are_resolved() {
        let scene = build_native(&sample()).expect("build");
        let meshes = scene.mesh_entities();
        assert_eq!(meshes.len(), 1);
        let node = scene.node(meshes[0].0).expect("node");
        assert_eq!(node.role, NodeRole::Mesh);
        assert!(!node.layer_visible);
        assert_eq!(node.depth, 2);
        let parent = scene.node(node.parent.as_ref().expect("parent")).expect("parent node");
        assert_eq!(parent.children.len(), 2);
    }

    #[test]
    fn intermediate_shape_is_not_a_mesh() {
        let mut desc = sample();
        desc.nodes[0].children[0].intermediate = true;
        let scene = build_native(&desc).expect("build");
        assert!(scene.mesh_entities().is_empty());
        let geo = scene.node(&scene.entities(false)[1]).expect("geo");
        assert_eq!(geo.role, NodeRole::Transform);
        assert!(geo.intermediate);
        assert_eq!(geo.shape_name.as_deref(), Some("geoShape"));
    }

    #[test]
    fn unresolvable_id_falls_back_to_raw_key() {
        let scene = build_native(&sample()).expect("build");
        let ghost = EntityId::native("DEADBEEF");
        assert_eq!(scene.resolve_name(&ghost), "DEADBEEF");
    }

    #[test]
    fn empty_name_is_fatal() {
        let desc = NativeSceneDesc {
            nodes: vec![NodeDesc::new("")],
            layers: vec![],
        };
        assert!(matches!(
            build_native(&desc),
            Err(SceneError::EmptyName { .. })
        ));
    }

    #[test]
    fn duplicate_siblings_are_fatal() {
        let desc = NativeSceneDesc {
            nodes: vec![NodeDesc::new("a"), NodeDesc::new("a")],
            layers: vec![],
        };
        assert!(matches!(
            build_native(&desc),
            Err(SceneError::DuplicateId { .. })
        ));
    }

    #[test]
    fn explicit_uuid_is_normalised() {
        let mut node = NodeDesc::new("a");
        node.uuid = Some("6f9619ff-8b86-d011-b42d-00cf4fc964ff".into());
        let scene = build_native(&NativeSceneDesc {
            nodes: vec![node],
            layers: vec![],
        })
        .expect("build");
        assert_eq!(
            scene.entities(false)[0].key,
            "6F9619FF-8B86-D011-B42D-00CF4FC964FF"
        );
    }

    #[test]
    fn world_bounds_follow_parent_transforms() {
        let mut desc = sample();
        desc.nodes[0].transform.translate = [0.0, 2.0, 0.0];
        let scene = build_native(&desc).expect("build");
        let root = &scene.entities(true)[0];
        let bounds = scene.world_bounds(root).expect("bounds");
        assert!((bounds.min.y - 2.0).abs() < 1e-12);
        assert!((bounds.max.y - 3.0).abs() < 1e-12);
        assert!(scene.world_bounds(&scene.entities(true)[1]).is_none());
    }
}
