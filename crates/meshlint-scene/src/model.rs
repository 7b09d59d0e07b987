//! On-disk scene document.
//!
//! One document can carry both representations: the native DAG scene and a
//! USD-like stage. Either may be absent.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct SceneDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeSceneDesc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageDesc>,
}

// ── Native scene ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct NativeSceneDesc {
    #[serde(default)]
    pub nodes: Vec<NodeDesc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerDesc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LayerDesc {
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Transform,
    Camera,
    Light,
    Joint,
    Locator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NodeDesc {
    pub name: String,
    /// Stable node UUID. Derived from the DAG path when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "TransformDesc::is_identity")]
    pub transform: TransformDesc,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader: Option<String>,
    /// Names of upstream construction-history nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
    #[serde(default)]
    pub intermediate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeDesc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDesc>,
}

impl NodeDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: None,
            kind: NodeKind::Transform,
            transform: TransformDesc::default(),
            visible: true,
            layer: None,
            shader: None,
            history: Vec::new(),
            intermediate: false,
            shape: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ShapeDesc {
    pub name: String,
    pub mesh: MeshDesc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct MeshDesc {
    pub points: Vec<[f64; 3]>,
    pub faces: Vec<FaceDesc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uvs: Vec<[f64; 2]>,
    /// Vertex pairs of edges marked hard.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hard_edges: Vec<[u32; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FaceDesc {
    pub vertices: Vec<u32>,
    /// Per face-vertex indices into `MeshDesc::uvs`; absent when the face has no UVs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<u32>>,
}

// ── Stage ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct StageDesc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_prim: Option<String>,
    #[serde(default)]
    pub prims: Vec<PrimDesc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum PrimType {
    #[default]
    Xform,
    Mesh,
    Scope,
    Camera,
    Light,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PrimDesc {
    pub name: String,
    #[serde(default)]
    pub type_name: PrimType,
    #[serde(default, skip_serializing_if = "TransformDesc::is_identity")]
    pub xform: TransformDesc,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_binding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<UsdMeshDesc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PrimDesc>,
}

impl PrimDesc {
    pub fn new(name: impl Into<String>, type_name: PrimType) -> Self {
        Self {
            name: name.into(),
            type_name,
            xform: TransformDesc::default(),
            visible: true,
            material_binding: None,
            mesh: None,
            children: Vec::new(),
        }
    }
}

/// USD mesh attributes, flat-array layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct UsdMeshDesc {
    pub points: Vec<[f64; 3]>,
    pub face_vertex_counts: Vec<u32>,
    pub face_vertex_indices: Vec<u32>,
    /// `primvars:st` values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub st: Vec<[f64; 2]>,
    /// Face-varying indices into `st`, aligned with `face_vertex_indices`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub st_indices: Vec<u32>,
}

// ── Transforms ─────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

/// Local transform. Rotation is Euler XYZ in degrees; `pivot` is the local
/// rotate/scale pivot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransformDesc {
    #[serde(default)]
    pub translate: [f64; 3],
    #[serde(default)]
    pub rotate: [f64; 3],
    #[serde(default = "default_scale")]
    pub scale: [f64; 3],
    #[serde(default)]
    pub pivot: [f64; 3],
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translate: [0.0; 3],
            rotate: [0.0; 3],
            scale: default_scale(),
            pivot: [0.0; 3],
        }
    }
}

impl TransformDesc {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}
