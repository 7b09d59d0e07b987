use std::collections::{BTreeSet, HashMap};

use glam::DVec3;
use meshlint_scene::{MeshQuery, SceneEnumerator};
use meshlint_types::{CATEGORY_TOPOLOGY, CheckResult, EntityId, EntityKind};
use tracing::warn;

use super::flag_components;
use crate::check::{BackendTable, Check, CheckError};

/// Faces with more edges than this are n-gons.
pub const MAX_FACE_EDGES: usize = 4;

/// Vertices joined by more edges than this are poles.
pub const MAX_POLE_VALENCE: u32 = 5;

pub const ZERO_AREA_TOLERANCE: f64 = 1e-8;
pub const ZERO_LENGTH_TOLERANCE: f64 = 1e-7;
pub const OVERLAP_TOLERANCE: f64 = 1e-5;

/// A corner turning against the face normal by more than this makes the face concave.
pub const CONCAVE_TOLERANCE: f64 = 1e-9;

pub(crate) fn checks() -> Vec<Check> {
    vec![
        Check {
            name: "hard_edges",
            label: "Hard Edges",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Edge,
            description: "Interior edges marked hard.",
            backends: BackendTable::native_only(hard_edges),
        },
        Check {
            name: "lamina",
            label: "Lamina Faces",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Face,
            description: "Faces that share all of their vertices with another face.",
            backends: BackendTable::both(lamina),
        },
        Check {
            name: "ngons",
            label: "N-gons",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Face,
            description: "Faces with more than four edges.",
            backends: BackendTable::both(ngons),
        },
        Check {
            name: "non_manifold_edges",
            label: "Non-manifold Edges",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Edge,
            description: "Edges shared by more than two faces.",
            backends: BackendTable::both(non_manifold_edges),
        },
        Check {
            name: "open_edges",
            label: "Open Edges",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Edge,
            description: "Border edges used by a single face.",
            backends: BackendTable::both(open_edges),
        },
        Check {
            name: "poles",
            label: "Poles",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Vertex,
            description: "Vertices with more than five connected edges.",
            backends: BackendTable::both(poles),
        },
        Check {
            name: "triangles",
            label: "Triangles",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Face,
            description: "Faces with exactly three edges.",
            backends: BackendTable::both(triangles),
        },
        Check {
            name: "zero_area_faces",
            label: "Zero Area Faces",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Face,
            description: "Faces with an area below 1e-8.",
            backends: BackendTable::both(zero_area_faces),
        },
        Check {
            name: "zero_length_edges",
            label: "Zero Length Edges",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Edge,
            description: "Edges shorter than 1e-7.",
            backends: BackendTable::both(zero_length_edges),
        },
        Check {
            name: "overlapping_vertices",
            label: "Overlapping Vertices",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Vertex,
            description: "Vertices closer than 1e-5 to another vertex of the same mesh.",
            backends: BackendTable::both(overlapping_vertices),
        },
        Check {
            name: "flipped_normals",
            label: "Flipped Normals",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Face,
            description: "Faces whose normal points towards the centre of the mesh bounds.",
            backends: BackendTable::both(flipped_normals),
        },
        Check {
            name: "concave_faces",
            label: "Concave Faces",
            category: CATEGORY_TOPOLOGY,
            entity_kind: EntityKind::Face,
            description: "Polygons with at least one reflex corner.",
            backends: BackendTable::both(concave_faces),
        },
    ]
}

/// Vertex lists of every face, skipping faces the mesh cannot resolve.
fn faces<'m>(id: &EntityId, mesh: &'m dyn MeshQuery) -> impl Iterator<Item = (u32, &'m [u32])> {
    let entity = id.key.clone();
    (0..mesh.face_count() as u32).filter_map(move |f| match mesh.face_vertices(f) {
        Some(verts) => Some((f, verts)),
        None => {
            warn!(entity = %entity, face = f, "face has no vertex data; skipping");
            None
        }
    })
}

fn faces_with_edge_count(
    id: &EntityId,
    mesh: &dyn MeshQuery,
    pred: impl Fn(usize) -> bool,
) -> Vec<u32> {
    faces(id, mesh)
        .filter(|(_, verts)| pred(verts.len()))
        .map(|(f, _)| f)
        .collect()
}

fn hard_edges(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        mesh.topology()
            .edges()
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_border() && mesh.is_hard_edge(e.vertices[0], e.vertices[1]))
            .map(|(i, _)| i as u32)
            .collect()
    }))
}

fn lamina(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |id, mesh| {
        let mut by_vertex_set: HashMap<Vec<u32>, Vec<u32>> = HashMap::new();
        for (f, verts) in faces(id, mesh) {
            let mut key = verts.to_vec();
            key.sort_unstable();
            key.dedup();
            if key.len() < 3 {
                continue;
            }
            by_vertex_set.entry(key).or_default().push(f);
        }
        by_vertex_set
            .into_values()
            .filter(|group| group.len() > 1)
            .flatten()
            .collect()
    }))
}

fn ngons(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |id, mesh| {
        faces_with_edge_count(id, mesh, |n| n > MAX_FACE_EDGES)
    }))
}

fn triangles(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |id, mesh| {
        faces_with_edge_count(id, mesh, |n| n == 3)
    }))
}

fn non_manifold_edges(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        edges_where(mesh, |faces| faces > 2)
    }))
}

fn open_edges(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        edges_where(mesh, |faces| faces == 1)
    }))
}

fn edges_where(mesh: &dyn MeshQuery, pred: impl Fn(usize) -> bool) -> Vec<u32> {
    mesh.topology()
        .edges()
        .iter()
        .enumerate()
        .filter(|(_, e)| pred(e.faces.len()))
        .map(|(i, _)| i as u32)
        .collect()
}

fn poles(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        let topo = mesh.topology();
        (0..mesh.point_count() as u32)
            .filter(|&v| topo.valence(v) > MAX_POLE_VALENCE)
            .collect()
    }))
}

/// Newell normal of a polygon. Its length is twice the polygon's area.
pub fn newell_normal(points: &[DVec3]) -> DVec3 {
    let n = points.len();
    if n < 3 {
        return DVec3::ZERO;
    }
    let mut normal = DVec3::ZERO;
    for i in 0..n {
        normal += points[i].cross(points[(i + 1) % n]);
    }
    normal
}

/// Area of a planar or near-planar polygon.
pub fn polygon_area(points: &[DVec3]) -> f64 {
    newell_normal(points).length() * 0.5
}

fn zero_area_faces(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |id, mesh| {
        let mut out = Vec::new();
        for (f, _) in faces(id, mesh) {
            match mesh.face_points(f) {
                Some(points) if polygon_area(&points) < ZERO_AREA_TOLERANCE => out.push(f),
                Some(_) => {}
                None => warn!(entity = %id, face = f, "face references a missing point; skipping"),
            }
        }
        out
    }))
}

fn zero_length_edges(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        mesh.topology()
            .edges()
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let a = mesh.point(e.vertices[0])?;
                let b = mesh.point(e.vertices[1])?;
                (a.distance(b) < ZERO_LENGTH_TOLERANCE).then_some(i as u32)
            })
            .collect()
    }))
}

/// Vertices within `OVERLAP_TOLERANCE` of another vertex; both ends of each pair are reported.
fn overlapping_vertices(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        // Cells saturate at the i64 range; far-off points share the edge cells.
        let cell = |p: DVec3| {
            let c = (p / OVERLAP_TOLERANCE).floor();
            (c.x as i64, c.y as i64, c.z as i64)
        };

        let mut grid: HashMap<(i64, i64, i64), Vec<(u32, DVec3)>> = HashMap::new();
        let mut flagged = BTreeSet::new();
        for v in 0..mesh.point_count() as u32 {
            let Some(p) = mesh.point(v) else { continue };
            let (cx, cy, cz) = cell(p);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let neighbour = (
                            cx.checked_add(dx),
                            cy.checked_add(dy),
                            cz.checked_add(dz),
                        );
                        let (Some(nx), Some(ny), Some(nz)) = neighbour else {
                            continue;
                        };
                        let Some(bucket) = grid.get(&(nx, ny, nz)) else {
                            continue;
                        };
                        for &(other, q) in bucket {
                            if p.distance(q) < OVERLAP_TOLERANCE {
                                flagged.insert(other);
                                flagged.insert(v);
                            }
                        }
                    }
                }
            }
            grid.entry((cx, cy, cz)).or_default().push((v, p));
        }
        flagged.into_iter().collect()
    }))
}

/// Judged in object space: the sign of `normal · offset` survives any
/// invertible node transform, mirrors included.
fn flipped_normals(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |id, mesh| {
        let mut bounds: Option<(DVec3, DVec3)> = None;
        for v in 0..mesh.point_count() as u32 {
            let Some(p) = mesh.point(v) else { continue };
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(p), hi.max(p)),
                None => (p, p),
            });
        }
        let Some((lo, hi)) = bounds else {
            return Vec::new();
        };
        let centre = (lo + hi) * 0.5;

        let mut out = Vec::new();
        for (f, _) in faces(id, mesh) {
            let Some(points) = mesh.face_points(f) else {
                continue;
            };
            let normal = newell_normal(&points);
            if normal.length() * 0.5 < ZERO_AREA_TOLERANCE {
                continue;
            }
            let face_centre = points.iter().fold(DVec3::ZERO, |acc, p| acc + *p) / points.len() as f64;
            if normal.dot(face_centre - centre) < 0.0 {
                out.push(f);
            }
        }
        out
    }))
}

/// True when some corner of the polygon turns against its overall winding.
pub fn is_concave(points: &[DVec3]) -> bool {
    let count = points.len();
    if count < 4 {
        return false;
    }
    let Some(normal) = newell_normal(points).try_normalize() else {
        return false;
    };
    (0..count).any(|i| {
        let prev = points[(i + count - 1) % count];
        let here = points[i];
        let next = points[(i + 1) % count];
        (here - prev).cross(next - here).dot(normal) < -CONCAVE_TOLERANCE
    })
}

fn concave_faces(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |id, mesh| {
        faces(id, mesh)
            .filter(|&(f, _)| mesh.face_points(f).is_some_and(|points| is_concave(&points)))
            .map(|(f, _)| f)
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::flagged_components;
    use meshlint_testkit::{MeshBuilder, NodeBuilder, PrimBuilder, SceneBuilder, sample_scenes};
    use meshlint_types::SceneBackend;

    const BOTH: [SceneBackend; 2] = [SceneBackend::Native, SceneBackend::Staged];

    fn mesh_scene(mesh: meshlint_scene::model::MeshDesc) -> meshlint_scene::SceneDocument {
        SceneBuilder::new()
            .node(NodeBuilder::new("m").mesh("mShape", mesh.clone()).build())
            .prim(PrimBuilder::mesh("m", &mesh).build())
            .build()
    }

    #[test]
    fn ngon_scenario_flags_only_the_pentagon() {
        let doc = sample_scenes::ngon();
        assert_eq!(
            flagged_components(&doc, SceneBackend::Native, ngons),
            vec![("|ngon_geo".to_string(), vec![2])]
        );
        assert_eq!(
            flagged_components(&doc, SceneBackend::Staged, ngons),
            vec![("/ngon_geo".to_string(), vec![2])]
        );
        assert_eq!(
            flagged_components(&doc, SceneBackend::Native, triangles),
            vec![("|ngon_geo".to_string(), vec![1])]
        );
    }

    #[test]
    fn clean_cube_has_no_topology_findings() {
        let doc = sample_scenes::clean();
        for check in checks() {
            for backend in BOTH {
                if let Some(f) = check.entry(backend) {
                    assert!(
                        flagged_components(&doc, backend, f).is_empty(),
                        "{} flagged the clean cube on {backend}",
                        check.name
                    );
                }
            }
        }
    }

    #[test]
    fn single_quad_has_four_open_edges() {
        let doc = mesh_scene(MeshBuilder::quad().build());
        for backend in BOTH {
            assert_eq!(
                flagged_components(&doc, backend, open_edges)[0].1,
                vec![0, 1, 2, 3]
            );
        }
    }

    #[test]
    fn fin_edge_is_non_manifold() {
        let mesh = MeshBuilder::quad()
            .point(0.5, 1.0, 0.5)
            .point(0.5, -1.0, 0.5)
            .face(&[0, 1, 4])
            .face(&[0, 1, 5])
            .build();
        let doc = mesh_scene(mesh);
        for backend in BOTH {
            // Edge 0 is (0,1), shared by the quad and both fins.
            assert_eq!(flagged_components(&doc, backend, non_manifold_edges)[0].1, vec![0]);
        }
    }

    #[test]
    fn lamina_faces_are_reported_together() {
        let mesh = MeshBuilder::quad().face(&[3, 2, 1, 0]).build();
        let doc = mesh_scene(mesh);
        for backend in BOTH {
            assert_eq!(flagged_components(&doc, backend, lamina)[0].1, vec![0, 1]);
        }
    }

    #[test]
    fn collapsed_geometry_is_flagged() {
        let mesh = MeshBuilder::new()
            .point(0.0, 0.0, 0.0)
            .point(1.0, 0.0, 0.0)
            .point(1.0, 0.0, 0.0)
            .point(2.0, 0.0, 0.0)
            .point(0.0, 0.0, 1.0)
            .face(&[0, 1, 4])
            .face(&[1, 2, 3])
            .build();
        let doc = mesh_scene(mesh);
        for backend in BOTH {
            assert_eq!(flagged_components(&doc, backend, zero_area_faces)[0].1, vec![1]);
            // Edges: (0,1) (1,4) (0,4) (1,2) (2,3) (1,3); (1,2) has zero length.
            assert_eq!(flagged_components(&doc, backend, zero_length_edges)[0].1, vec![3]);
            assert_eq!(
                flagged_components(&doc, backend, overlapping_vertices)[0].1,
                vec![1, 2]
            );
        }
    }

    #[test]
    fn far_off_vertices_do_not_overflow_the_grid() {
        let mesh = MeshBuilder::new()
            .point(1e15, 0.0, 0.0)
            .point(1e15, 1.0, 0.0)
            .point(1e15, 0.0, 1.0)
            .point(1e15, 0.0, 1.0)
            .point(-1e15, -1e15, -1e15)
            .point(-1e15, -1e15, -1e15)
            .face(&[0, 1, 2])
            .face(&[3, 4, 5])
            .build();
        let doc = mesh_scene(mesh);
        for backend in BOTH {
            assert_eq!(
                flagged_components(&doc, backend, overlapping_vertices)[0].1,
                vec![2, 3, 4, 5]
            );
        }
    }

    #[test]
    fn six_edge_vertex_is_a_pole() {
        let mut builder = MeshBuilder::new().point(0.0, 0.0, 0.0);
        for i in 0..6 {
            let a = std::f64::consts::TAU * i as f64 / 6.0;
            builder = builder.point(a.cos(), 0.0, a.sin());
        }
        for i in 0..6u32 {
            builder = builder.face(&[0, 1 + i, 1 + (i + 1) % 6]);
        }
        let doc = mesh_scene(builder.build());
        for backend in BOTH {
            assert_eq!(flagged_components(&doc, backend, poles)[0].1, vec![0]);
        }
    }

    #[test]
    fn hard_border_edges_are_ignored() {
        let mesh = MeshBuilder::quad()
            .point(2.0, 0.0, 0.0)
            .point(2.0, 0.0, 1.0)
            .face(&[1, 4, 5, 2])
            .hard_edge(1, 2)
            .hard_edge(0, 1)
            .build();
        let doc = mesh_scene(mesh);
        assert_eq!(
            flagged_components(&doc, SceneBackend::Native, hard_edges),
            vec![("|m".to_string(), vec![1])]
        );
    }

    #[test]
    fn reversed_cube_face_is_flipped() {
        let mut cube = MeshBuilder::cube().build();
        cube.faces[1].vertices.reverse();
        if let Some(uvs) = cube.faces[1].uvs.as_mut() {
            uvs.reverse();
        }
        let doc = mesh_scene(cube);
        for backend in BOTH {
            assert_eq!(flagged_components(&doc, backend, flipped_normals)[0].1, vec![1]);
        }
    }

    #[test]
    fn mirrored_cube_keeps_its_normals() {
        let cube = MeshBuilder::cube().build();
        let doc = SceneBuilder::new()
            .node(
                NodeBuilder::new("geo_mirror")
                    .scale(-1.0, 1.0, 1.0)
                    .mesh("geo_mirrorShape", cube)
                    .build(),
            )
            .build();
        assert!(flagged_components(&doc, SceneBackend::Native, flipped_normals).is_empty());
    }

    #[test]
    fn dart_quad_is_concave() {
        let mesh = MeshBuilder::new()
            .point(0.0, 0.0, 0.0)
            .point(2.0, 0.0, 1.0)
            .point(0.0, 0.0, 2.0)
            .point(0.5, 0.0, 1.0)
            .face(&[0, 1, 2, 3])
            .build();
        let doc = mesh_scene(mesh);
        for backend in BOTH {
            assert_eq!(flagged_components(&doc, backend, concave_faces)[0].1, vec![0]);
        }
    }

    #[test]
    fn convex_polygons_and_triangles_are_not_concave() {
        let doc = sample_scenes::ngon();
        for backend in BOTH {
            assert!(flagged_components(&doc, backend, concave_faces).is_empty());
        }
        let collinear = [
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 1.0),
        ];
        assert!(!is_concave(&collinear));
        assert!(!is_concave(&collinear[..3]));
    }

    #[test]
    fn polygon_area_of_unit_square() {
        let square = [
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::Z,
        ];
        assert!((polygon_area(&square) - 1.0).abs() < 1e-12);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }
}
