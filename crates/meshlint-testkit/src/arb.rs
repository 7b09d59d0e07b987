//! Proptest strategies for generating valid scene inputs.
//!
//! Strategies are constructive: generated meshes only reference existing
//! points and UVs, and generated names are valid for both backends.
//!
//! # Bounds
//!
//! To keep tests fast, the following bounds are enforced:
//! - Max points per mesh: 24
//! - Max faces per mesh: 16
//! - Max children per node: 3
//! - Max tree depth: 3

use meshlint_scene::model::{FaceDesc, MeshDesc, NodeDesc, PrimDesc, SceneDocument};
use meshlint_types::{Backend, EntityComponents, EntityId, SceneBackend};
use proptest::prelude::*;

use crate::scene_builder::{PrimBuilder, SceneBuilder, to_usd_mesh};

// =============================================================================
// Constants for bounding generated data
// =============================================================================

/// Maximum number of points in a generated mesh
pub const MAX_POINTS: usize = 24;

/// Maximum number of faces in a generated mesh
pub const MAX_FACES: usize = 16;

/// Maximum number of children per generated node
pub const MAX_CHILDREN: usize = 3;

// =============================================================================
// Enum Strategies
// =============================================================================

pub fn arb_backend() -> impl Strategy<Value = Backend> {
    prop_oneof![
        Just(Backend::Native),
        Just(Backend::Staged),
        Just(Backend::Both),
    ]
}

// =============================================================================
// Geometry Strategies
// =============================================================================

fn arb_coord() -> impl Strategy<Value = f64> {
    // Quarter steps keep coincident points and degenerate faces likely.
    (-8i32..8).prop_map(|q| q as f64 * 0.25)
}

/// A mesh whose faces reference existing points, optionally with per-face UVs.
pub fn arb_mesh() -> impl Strategy<Value = MeshDesc> {
    (3usize..=MAX_POINTS).prop_flat_map(|n| {
        let points = prop::collection::vec([arb_coord(), arb_coord(), arb_coord()], n);
        let face = (
            prop::collection::vec(0..n as u32, 3..=6),
            any::<bool>(),
            prop::collection::vec(-1.0f64..2.0, 6),
        );
        let faces = prop::collection::vec(face, 0..=MAX_FACES);
        (points, faces).prop_map(|(points, faces)| {
            let mut mesh = MeshDesc {
                points,
                ..MeshDesc::default()
            };
            for (vertices, mapped, coords) in faces {
                let uvs = mapped.then(|| {
                    vertices
                        .iter()
                        .enumerate()
                        .map(|(i, _)| {
                            let idx = mesh.uvs.len() as u32;
                            mesh.uvs.push([coords[i % coords.len()], coords[(i + 1) % coords.len()]]);
                            idx
                        })
                        .collect()
                });
                mesh.faces.push(FaceDesc { vertices, uvs });
            }
            mesh
        })
    })
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,6}[0-9]?"
}

/// A native node tree with unique sibling names.
pub fn arb_node(depth: u32) -> BoxedStrategy<NodeDesc> {
    let leaf = (arb_name(), prop::option::of(arb_mesh()), any::<bool>()).prop_map(
        |(name, mesh, visible)| {
            let mut node = NodeDesc::new(name.clone());
            node.visible = visible;
            node.shape = mesh.map(|mesh| meshlint_scene::model::ShapeDesc {
                name: format!("{name}Shape"),
                mesh,
            });
            node
        },
    );
    if depth == 0 {
        return leaf.boxed();
    }
    (leaf, prop::collection::vec(arb_node(depth - 1), 0..=MAX_CHILDREN))
        .prop_map(|(mut node, children)| {
            node.children = unique_siblings(children, |c| &mut c.name);
            node
        })
        .boxed()
}

/// Mirror a native node tree as stage prims.
pub fn node_to_prim(node: &NodeDesc) -> PrimDesc {
    let mut builder = match &node.shape {
        Some(shape) => PrimBuilder::mesh(&node.name, &shape.mesh),
        None => PrimBuilder::xform(&node.name),
    };
    if !node.visible {
        builder = builder.hidden();
    }
    let mut prim = builder.build();
    prim.children = node.children.iter().map(node_to_prim).collect();
    prim
}

/// A document carrying the same tree in both representations.
pub fn arb_scene() -> impl Strategy<Value = SceneDocument> {
    prop::collection::vec(arb_node(2), 0..=3).prop_map(|roots| {
        let roots = unique_siblings(roots, |n| &mut n.name);
        let mut builder = SceneBuilder::new().with_native().with_stage();
        for root in &roots {
            builder = builder.prim(node_to_prim(root));
        }
        for root in roots {
            builder = builder.node(root);
        }
        builder.build()
    })
}

/// Suffix repeated sibling names so every path is unique.
fn unique_siblings<T>(mut items: Vec<T>, name: impl Fn(&mut T) -> &mut String) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    for (i, item) in items.iter_mut().enumerate() {
        let n = name(item);
        if seen.insert(n.clone()) {
            continue;
        }
        let mut k = i;
        loop {
            let candidate = format!("{n}_dup{k}");
            if seen.insert(candidate.clone()) {
                *n = candidate;
                break;
            }
            k += 1;
        }
    }
    items
}

// =============================================================================
// Result Strategies
// =============================================================================

/// Component entries as a misbehaving check might return them: unsorted,
/// with repeats and empty lists.
pub fn arb_raw_components(backend: SceneBackend) -> impl Strategy<Value = Vec<EntityComponents>> {
    prop::collection::vec(
        ("[a-c]{1,2}", prop::collection::vec(0u32..40, 0..10)).prop_map(
            move |(key, indices)| EntityComponents {
                entity: EntityId { backend, key },
                indices,
            },
        ),
        0..8,
    )
}

/// Convenience for tests that only need USD arrays.
pub fn arb_usd_mesh() -> impl Strategy<Value = meshlint_scene::model::UsdMeshDesc> {
    arb_mesh().prop_map(|m| to_usd_mesh(&m))
}
