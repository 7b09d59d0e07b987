use std::collections::BTreeSet;

use glam::DVec2;
use meshlint_scene::{MeshQuery, SceneEnumerator};
use meshlint_types::{CATEGORY_UVS, CheckResult, EntityKind};
use tracing::debug;

use super::flag_components;
use crate::check::{BackendTable, Check, CheckError};

/// Distance from an integer tile line that still counts as lying on it.
pub const BORDER_TOLERANCE: f64 = 1e-5;

/// Largest U coordinate the UDIM layout allows.
pub const MAX_U: f64 = 10.0;

pub(crate) fn checks() -> Vec<Check> {
    vec![
        Check {
            name: "cross_border",
            label: "Cross Border",
            category: CATEGORY_UVS,
            entity_kind: EntityKind::Face,
            description: "Faces whose UVs span more than one UV tile.",
            backends: BackendTable::both(cross_border),
        },
        Check {
            name: "on_border",
            label: "On Border",
            category: CATEGORY_UVS,
            entity_kind: EntityKind::Uv,
            description: "UVs lying on a tile border.",
            backends: BackendTable::both(on_border),
        },
        Check {
            name: "self_penetrating_uvs",
            label: "Self Penetrating UVs",
            category: CATEGORY_UVS,
            entity_kind: EntityKind::Face,
            description: "Faces whose UV shells overlap another face of the same mesh.",
            backends: BackendTable::both(self_penetrating_uvs),
        },
        Check {
            name: "uv_range",
            label: "UV Range",
            category: CATEGORY_UVS,
            entity_kind: EntityKind::Uv,
            description: "UVs with negative coordinates or U beyond 10.",
            backends: BackendTable::both(uv_range),
        },
        Check {
            name: "missing_uvs",
            label: "Missing UVs",
            category: CATEGORY_UVS,
            entity_kind: EntityKind::Face,
            description: "Faces without UV coordinates.",
            backends: BackendTable::both(missing_uvs),
        },
    ]
}

/// Index of the UV tile containing `x`. Zero belongs to the tile below.
/// Coordinates beyond the `i64` range share the outermost tile.
fn tile(x: f64) -> i64 {
    if x > 0.0 {
        x.trunc() as i64
    } else {
        (x.trunc() as i64).saturating_sub(1)
    }
}

/// Mapped faces with their UV coordinates.
fn mapped_faces(mesh: &dyn MeshQuery) -> Vec<(u32, Vec<DVec2>)> {
    (0..mesh.face_count() as u32)
        .filter_map(|f| mesh.face_uv_coords(f).map(|uvs| (f, uvs)))
        .collect()
}

fn cross_border(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        mapped_faces(mesh)
            .into_iter()
            .filter(|(_, uvs)| {
                let us: BTreeSet<i64> = uvs.iter().map(|p| tile(p.x)).collect();
                let vs: BTreeSet<i64> = uvs.iter().map(|p| tile(p.y)).collect();
                us.len() > 1 || vs.len() > 1
            })
            .map(|(f, _)| f)
            .collect()
    }))
}

fn on_border(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        let near_line = |x: f64| (x.trunc() - x).abs() < BORDER_TOLERANCE;
        (0..mesh.uv_count() as u32)
            .filter(|&i| mesh.uv(i).is_some_and(|p| near_line(p.x) || near_line(p.y)))
            .collect()
    }))
}

fn uv_range(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        (0..mesh.uv_count() as u32)
            .filter(|&i| {
                mesh.uv(i)
                    .is_some_and(|p| p.x < 0.0 || p.x > MAX_U || p.y < 0.0)
            })
            .collect()
    }))
}

fn missing_uvs(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |id, mesh| {
        let missing: Vec<u32> = (0..mesh.face_count() as u32)
            .filter(|&f| mesh.face_uvs(f).is_none())
            .collect();
        if !missing.is_empty() {
            debug!(entity = %id, faces = missing.len(), "faces without UVs");
        }
        missing
    }))
}

// ── UV overlap ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Rect {
    min: DVec2,
    max: DVec2,
}

impl Rect {
    fn of(points: &[DVec2]) -> Self {
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    /// Strict overlap; rectangles that only touch do not overlap.
    fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// True when the open segments `ab` and `cd` cross at a single interior point.
fn segments_cross(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> bool {
    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Even-odd point in polygon; points on an edge may land either way.
fn contains(polygon: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn centroid(points: &[DVec2]) -> DVec2 {
    points.iter().copied().sum::<DVec2>() / points.len() as f64
}

fn edges(points: &[DVec2]) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}

fn faces_overlap(a: &[DVec2], b: &[DVec2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    let crossing = edges(a).any(|(p, q)| edges(b).any(|(r, s)| segments_cross(p, q, r, s)));
    crossing || contains(b, centroid(a)) || contains(a, centroid(b))
}

fn self_penetrating_uvs(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    Ok(flag_components(scene, |_, mesh| {
        let faces = mapped_faces(mesh);
        let rects: Vec<Rect> = faces.iter().map(|(_, uvs)| Rect::of(uvs)).collect();
        let mut flagged = BTreeSet::new();
        for i in 0..faces.len() {
            for j in (i + 1)..faces.len() {
                if rects[i].overlaps(&rects[j]) && faces_overlap(&faces[i].1, &faces[j].1) {
                    flagged.insert(faces[i].0);
                    flagged.insert(faces[j].0);
                }
            }
        }
        flagged.into_iter().collect()
    }))
}
