//! Mesh handles.
//!
//! Both handles answer the same queries; only the storage differs. The native
//! handle keeps per-face vertex lists, the staged one keeps USD flat arrays and
//! slices them by prefix offsets.

use std::collections::{HashMap, HashSet};

use glam::{DVec2, DVec3};
use tracing::warn;

use crate::model::{MeshDesc, UsdMeshDesc};

/// Read-only geometry queries a check runs against one mesh.
///
/// Out-of-range indices yield `None`; callers skip the component.
pub trait MeshQuery {
    fn point_count(&self) -> usize;
    fn point(&self, index: u32) -> Option<DVec3>;
    fn face_count(&self) -> usize;
    fn face_vertices(&self, face: u32) -> Option<&[u32]>;
    fn uv_count(&self) -> usize;
    fn uv(&self, index: u32) -> Option<DVec2>;
    /// UV indices of a face, aligned with its vertices. `None` when the face has no UVs.
    fn face_uvs(&self, face: u32) -> Option<&[u32]>;
    fn is_hard_edge(&self, a: u32, b: u32) -> bool;
    fn topology(&self) -> &Topology;

    /// Vertex positions of a face; `None` if any index is out of range.
    fn face_points(&self, face: u32) -> Option<Vec<DVec3>> {
        self.face_vertices(face)?
            .iter()
            .map(|&v| self.point(v))
            .collect()
    }

    /// UV coordinates of a face; `None` if the face has no UVs or an index is out of range.
    fn face_uv_coords(&self, face: u32) -> Option<Vec<DVec2>> {
        self.face_uvs(face)?.iter().map(|&i| self.uv(i)).collect()
    }
}

/// An undirected edge: vertices in ascending order and the faces using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub vertices: [u32; 2],
    pub faces: Vec<u32>,
}

impl Edge {
    pub fn is_border(&self) -> bool {
        self.faces.len() == 1
    }
}

/// Edge connectivity derived from face winding.
///
/// Edges are numbered in first-appearance order while walking faces in order,
/// which is how both backends number their edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    edges: Vec<Edge>,
    lookup: HashMap<[u32; 2], u32>,
    valence: Vec<u32>,
}

impl Topology {
    pub fn from_faces<'a>(point_count: usize, faces: impl IntoIterator<Item = &'a [u32]>) -> Self {
        let mut topo = Topology {
            edges: Vec::new(),
            lookup: HashMap::new(),
            valence: vec![0; point_count],
        };

        for (face_idx, verts) in faces.into_iter().enumerate() {
            let face_idx = face_idx as u32;
            let n = verts.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let (a, b) = (verts[i], verts[(i + 1) % n]);
                if a as usize >= point_count || b as usize >= point_count {
                    continue;
                }
                topo.add_edge(a, b, face_idx);
            }
        }

        topo
    }

    fn add_edge(&mut self, a: u32, b: u32, face: u32) {
        let key = edge_key(a, b);
        match self.lookup.get(&key) {
            Some(&idx) => {
                let faces = &mut self.edges[idx as usize].faces;
                if faces.last() != Some(&face) {
                    faces.push(face);
                }
            }
            None => {
                let idx = self.edges.len() as u32;
                self.lookup.insert(key, idx);
                self.edges.push(Edge {
                    vertices: key,
                    faces: vec![face],
                });
                self.valence[key[0] as usize] += 1;
                if key[0] != key[1] {
                    self.valence[key[1] as usize] += 1;
                }
            }
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_index(&self, a: u32, b: u32) -> Option<u32> {
        self.lookup.get(&edge_key(a, b)).copied()
    }

    /// Number of distinct edges touching `vertex`.
    pub fn valence(&self, vertex: u32) -> u32 {
        self.valence.get(vertex as usize).copied().unwrap_or(0)
    }
}

fn edge_key(a: u32, b: u32) -> [u32; 2] {
    if a <= b { [a, b] } else { [b, a] }
}

fn to_points(points: &[[f64; 3]]) -> Vec<DVec3> {
    points.iter().map(|p| DVec3::from_array(*p)).collect()
}

fn to_uvs(uvs: &[[f64; 2]]) -> Vec<DVec2> {
    uvs.iter().map(|p| DVec2::from_array(*p)).collect()
}

// ── Native ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NativeMesh {
    points: Vec<DVec3>,
    faces: Vec<Vec<u32>>,
    face_uvs: Vec<Option<Vec<u32>>>,
    uvs: Vec<DVec2>,
    hard: HashSet<[u32; 2]>,
    topology: Topology,
}

impl NativeMesh {
    pub fn from_desc(desc: &MeshDesc) -> Self {
        let faces: Vec<Vec<u32>> = desc.faces.iter().map(|f| f.vertices.clone()).collect();
        let face_uvs = desc
            .faces
            .iter()
            .enumerate()
            .map(|(i, f)| match &f.uvs {
                Some(uvs) if uvs.len() != f.vertices.len() => {
                    warn!(
                        face = i,
                        vertices = f.vertices.len(),
                        uvs = uvs.len(),
                        "face UV count does not match vertex count; treating face as unmapped"
                    );
                    None
                }
                other => other.clone(),
            })
            .collect();
        let topology =
            Topology::from_faces(desc.points.len(), faces.iter().map(|f| f.as_slice()));

        Self {
            points: to_points(&desc.points),
            faces,
            face_uvs,
            uvs: to_uvs(&desc.uvs),
            hard: desc.hard_edges.iter().map(|[a, b]| edge_key(*a, *b)).collect(),
            topology,
        }
    }
}

impl MeshQuery for NativeMesh {
    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: u32) -> Option<DVec3> {
        self.points.get(index as usize).copied()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn face_vertices(&self, face: u32) -> Option<&[u32]> {
        self.faces.get(face as usize).map(Vec::as_slice)
    }

    fn uv_count(&self) -> usize {
        self.uvs.len()
    }

    fn uv(&self, index: u32) -> Option<DVec2> {
        self.uvs.get(index as usize).copied()
    }

    fn face_uvs(&self, face: u32) -> Option<&[u32]> {
        self.face_uvs.get(face as usize)?.as_deref()
    }

    fn is_hard_edge(&self, a: u32, b: u32) -> bool {
        self.hard.contains(&edge_key(a, b))
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }
}

// ── Staged ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StagedMesh {
    points: Vec<DVec3>,
    counts: Vec<u32>,
    offsets: Vec<usize>,
    indices: Vec<u32>,
    st: Vec<DVec2>,
    /// Face-varying st indices aligned with `indices`; empty when the mesh has no st primvar.
    st_indices: Vec<u32>,
    topology: Topology,
}

impl StagedMesh {
    pub fn from_desc(desc: &UsdMeshDesc) -> Self {
        let mut offsets = Vec::with_capacity(desc.face_vertex_counts.len());
        let mut offset = 0usize;
        for &count in &desc.face_vertex_counts {
            offsets.push(offset);
            offset += count as usize;
        }
        if offset != desc.face_vertex_indices.len() {
            warn!(
                expected = offset,
                actual = desc.face_vertex_indices.len(),
                "faceVertexCounts do not add up to faceVertexIndices"
            );
        }

        let st_indices = resolve_st_indices(desc);

        let mut mesh = Self {
            points: to_points(&desc.points),
            counts: desc.face_vertex_counts.clone(),
            offsets,
            indices: desc.face_vertex_indices.clone(),
            st: to_uvs(&desc.st),
            st_indices,
            topology: Topology::default(),
        };
        let topology = Topology::from_faces(
            mesh.points.len(),
            (0..mesh.counts.len() as u32).filter_map(|f| mesh.face_vertices(f)),
        );
        mesh.topology = topology;
        mesh
    }

    fn face_range(&self, face: u32) -> Option<std::ops::Range<usize>> {
        let start = *self.offsets.get(face as usize)?;
        let count = *self.counts.get(face as usize)? as usize;
        Some(start..start + count)
    }
}

/// Normalise `primvars:st` to face-varying indices.
///
/// Indexed face-varying st is used as is; unindexed face-varying st gets an
/// identity index; vertex-interpolated st reuses the face vertex indices.
fn resolve_st_indices(desc: &UsdMeshDesc) -> Vec<u32> {
    let corners = desc.face_vertex_indices.len();
    if desc.st.is_empty() {
        return Vec::new();
    }
    if !desc.st_indices.is_empty() {
        if desc.st_indices.len() != corners {
            warn!(
                st_indices = desc.st_indices.len(),
                corners, "st indices do not match face corners; ignoring st primvar"
            );
            return Vec::new();
        }
        return desc.st_indices.clone();
    }
    if desc.st.len() == corners {
        return (0..corners as u32).collect();
    }
    if desc.st.len() == desc.points.len() {
        return desc.face_vertex_indices.clone();
    }
    warn!(
        st = desc.st.len(),
        corners, "st primvar has an unsupported interpolation; ignoring it"
    );
    Vec::new()
}

impl MeshQuery for StagedMesh {
    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: u32) -> Option<DVec3> {
        self.points.get(index as usize).copied()
    }

    fn face_count(&self) -> usize {
        self.counts.len()
    }

    fn face_vertices(&self, face: u32) -> Option<&[u32]> {
        self.indices.get(self.face_range(face)?)
    }

    fn uv_count(&self) -> usize {
        self.st.len()
    }

    fn uv(&self, index: u32) -> Option<DVec2> {
        self.st.get(index as usize).copied()
    }

    fn face_uvs(&self, face: u32) -> Option<&[u32]> {
        if self.st_indices.is_empty() {
            return None;
        }
        self.st_indices.get(self.face_range(face)?)
    }

    fn is_hard_edge(&self, _a: u32, _b: u32) -> bool {
        false
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }
}
