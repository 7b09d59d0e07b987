//! Fluent builders for scene documents.
//!
//! # Example
//!
//! ```rust
//! use meshlint_testkit::scene_builder::{MeshBuilder, NodeBuilder, PrimBuilder, SceneBuilder};
//!
//! let cube = MeshBuilder::cube().build();
//! let doc = SceneBuilder::new()
//!     .node(NodeBuilder::new("geo").mesh("geoShape", cube.clone()).build())
//!     .prim(PrimBuilder::mesh("geo", &cube).build())
//!     .build();
//!
//! assert!(doc.native.is_some());
//! assert!(doc.stage.is_some());
//! ```

use meshlint_scene::model::{
    FaceDesc, LayerDesc, MeshDesc, NativeSceneDesc, NodeDesc, NodeKind, PrimDesc, PrimType,
    SceneDocument, ShapeDesc, StageDesc, UsdMeshDesc,
};

/// Builder for a native mesh description.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    mesh: MeshDesc,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point(mut self, x: f64, y: f64, z: f64) -> Self {
        self.mesh.points.push([x, y, z]);
        self
    }

    pub fn uv(mut self, u: f64, v: f64) -> Self {
        self.mesh.uvs.push([u, v]);
        self
    }

    /// Add a face without UVs.
    pub fn face(mut self, vertices: &[u32]) -> Self {
        self.mesh.faces.push(FaceDesc {
            vertices: vertices.to_vec(),
            uvs: None,
        });
        self
    }

    pub fn face_with_uvs(mut self, vertices: &[u32], uvs: &[u32]) -> Self {
        self.mesh.faces.push(FaceDesc {
            vertices: vertices.to_vec(),
            uvs: Some(uvs.to_vec()),
        });
        self
    }

    pub fn hard_edge(mut self, a: u32, b: u32) -> Self {
        self.mesh.hard_edges.push([a, b]);
        self
    }

    /// Closed unit cube resting on the grid, one UV island per face laid out
    /// inside the 0-1 tile without touching its borders.
    pub fn cube() -> Self {
        let mut b = Self::new()
            .point(0.0, 0.0, 0.0)
            .point(1.0, 0.0, 0.0)
            .point(1.0, 0.0, 1.0)
            .point(0.0, 0.0, 1.0)
            .point(0.0, 1.0, 0.0)
            .point(1.0, 1.0, 0.0)
            .point(1.0, 1.0, 1.0)
            .point(0.0, 1.0, 1.0);

        let faces: [[u32; 4]; 6] = [
            [0, 1, 2, 3],
            [4, 7, 6, 5],
            [0, 4, 5, 1],
            [3, 2, 6, 7],
            [0, 3, 7, 4],
            [1, 5, 6, 2],
        ];
        for (k, face) in faces.iter().enumerate() {
            let u0 = 0.05 + (k % 3) as f64 * 0.32;
            let v0 = 0.05 + (k / 3) as f64 * 0.32;
            b = b
                .uv(u0, v0)
                .uv(u0 + 0.25, v0)
                .uv(u0 + 0.25, v0 + 0.25)
                .uv(u0, v0 + 0.25);
            let base = (k * 4) as u32;
            b = b.face_with_uvs(face, &[base, base + 1, base + 2, base + 3]);
        }
        b
    }

    /// A single quad in the XZ plane with UVs inside the 0-1 tile.
    pub fn quad() -> Self {
        Self::new()
            .point(0.0, 0.0, 0.0)
            .point(1.0, 0.0, 0.0)
            .point(1.0, 0.0, 1.0)
            .point(0.0, 0.0, 1.0)
            .uv(0.1, 0.1)
            .uv(0.9, 0.1)
            .uv(0.9, 0.9)
            .uv(0.1, 0.9)
            .face_with_uvs(&[0, 1, 2, 3], &[0, 1, 2, 3])
    }

    pub fn build(self) -> MeshDesc {
        self.mesh
    }
}

/// Convert a native mesh to USD flat arrays.
///
/// Face-varying st is emitted only when every face carries UVs, since a USD
/// primvar cannot leave individual faces unmapped.
pub fn to_usd_mesh(mesh: &MeshDesc) -> UsdMeshDesc {
    let face_vertex_counts = mesh.faces.iter().map(|f| f.vertices.len() as u32).collect();
    let face_vertex_indices = mesh
        .faces
        .iter()
        .flat_map(|f| f.vertices.iter().copied())
        .collect();

    let all_mapped = !mesh.faces.is_empty() && mesh.faces.iter().all(|f| f.uvs.is_some());
    let (st, st_indices) = if all_mapped {
        let indices = mesh
            .faces
            .iter()
            .flat_map(|f| f.uvs.iter().flatten().copied())
            .collect();
        (mesh.uvs.clone(), indices)
    } else {
        (Vec::new(), Vec::new())
    };

    UsdMeshDesc {
        points: mesh.points.clone(),
        face_vertex_counts,
        face_vertex_indices,
        st,
        st_indices,
    }
}

/// Builder for a native DAG node.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    node: NodeDesc,
}

impl NodeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            node: NodeDesc::new(name),
        }
    }

    pub fn uuid(mut self, uuid: &str) -> Self {
        self.node.uuid = Some(uuid.to_string());
        self
    }

    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.node.kind = kind;
        self
    }

    pub fn translate(mut self, x: f64, y: f64, z: f64) -> Self {
        self.node.transform.translate = [x, y, z];
        self
    }

    pub fn rotate(mut self, x: f64, y: f64, z: f64) -> Self {
        self.node.transform.rotate = [x, y, z];
        self
    }

    pub fn scale(mut self, x: f64, y: f64, z: f64) -> Self {
        self.node.transform.scale = [x, y, z];
        self
    }

    pub fn pivot(mut self, x: f64, y: f64, z: f64) -> Self {
        self.node.transform.pivot = [x, y, z];
        self
    }

    pub fn hidden(mut self) -> Self {
        self.node.visible = false;
        self
    }

    pub fn layer(mut self, layer: &str) -> Self {
        self.node.layer = Some(layer.to_string());
        self
    }

    pub fn shader(mut self, shader: &str) -> Self {
        self.node.shader = Some(shader.to_string());
        self
    }

    pub fn history(mut self, node: &str) -> Self {
        self.node.history.push(node.to_string());
        self
    }

    pub fn intermediate(mut self) -> Self {
        self.node.intermediate = true;
        self
    }

    pub fn mesh(mut self, shape_name: &str, mesh: MeshDesc) -> Self {
        self.node.shape = Some(ShapeDesc {
            name: shape_name.to_string(),
            mesh,
        });
        self
    }

    pub fn child(mut self, child: NodeDesc) -> Self {
        self.node.children.push(child);
        self
    }

    pub fn build(self) -> NodeDesc {
        self.node
    }
}

/// Builder for a stage prim.
#[derive(Debug, Clone)]
pub struct PrimBuilder {
    prim: PrimDesc,
}

impl PrimBuilder {
    pub fn new(name: &str, type_name: PrimType) -> Self {
        Self {
            prim: PrimDesc::new(name, type_name),
        }
    }

    pub fn xform(name: &str) -> Self {
        Self::new(name, PrimType::Xform)
    }

    pub fn scope(name: &str) -> Self {
        Self::new(name, PrimType::Scope)
    }

    /// A Mesh prim carrying `mesh` converted to USD arrays.
    pub fn mesh(name: &str, mesh: &MeshDesc) -> Self {
        let mut b = Self::new(name, PrimType::Mesh);
        b.prim.mesh = Some(to_usd_mesh(mesh));
        b
    }

    pub fn usd_mesh(mut self, mesh: UsdMeshDesc) -> Self {
        self.prim.mesh = Some(mesh);
        self
    }

    pub fn translate(mut self, x: f64, y: f64, z: f64) -> Self {
        self.prim.xform.translate = [x, y, z];
        self
    }

    pub fn rotate(mut self, x: f64, y: f64, z: f64) -> Self {
        self.prim.xform.rotate = [x, y, z];
        self
    }

    pub fn pivot(mut self, x: f64, y: f64, z: f64) -> Self {
        self.prim.xform.pivot = [x, y, z];
        self
    }

    pub fn hidden(mut self) -> Self {
        self.prim.visible = false;
        self
    }

    pub fn material(mut self, binding: &str) -> Self {
        self.prim.material_binding = Some(binding.to_string());
        self
    }

    pub fn child(mut self, child: PrimDesc) -> Self {
        self.prim.children.push(child);
        self
    }

    pub fn build(self) -> PrimDesc {
        self.prim
    }
}

/// Builder for a whole scene document.
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    native: Option<NativeSceneDesc>,
    stage: Option<StageDesc>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty native section even if no node is added.
    pub fn with_native(mut self) -> Self {
        self.native.get_or_insert_with(NativeSceneDesc::default);
        self
    }

    /// Add an empty stage even if no prim is added.
    pub fn with_stage(mut self) -> Self {
        self.stage.get_or_insert_with(StageDesc::default);
        self
    }

    pub fn node(mut self, node: NodeDesc) -> Self {
        self.native
            .get_or_insert_with(NativeSceneDesc::default)
            .nodes
            .push(node);
        self
    }

    pub fn layer(mut self, name: &str, visible: bool) -> Self {
        self.native
            .get_or_insert_with(NativeSceneDesc::default)
            .layers
            .push(LayerDesc {
                name: name.to_string(),
                visible,
            });
        self
    }

    pub fn prim(mut self, prim: PrimDesc) -> Self {
        self.stage
            .get_or_insert_with(StageDesc::default)
            .prims
            .push(prim);
        self
    }

    pub fn default_prim(mut self, name: &str) -> Self {
        self.stage.get_or_insert_with(StageDesc::default).default_prim = Some(name.to_string());
        self
    }

    pub fn build(self) -> SceneDocument {
        SceneDocument {
            native: self.native,
            stage: self.stage,
        }
    }
}
