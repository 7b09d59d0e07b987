//! Property-based tests for meshlint-domain
//!
//! Every built-in check runs against generated scenes on both backends; the
//! result must match the declared entity kind and reference only components
//! that exist.

use std::collections::HashMap;

use proptest::prelude::*;

use meshlint_domain::Registry;
use meshlint_scene::{MeshQuery, SceneEnumerator, SceneSource};
use meshlint_testkit::arb::arb_scene;
use meshlint_testkit::sample_scenes;
use meshlint_types::{CheckResult, EntityId, EntityKind, SceneBackend};

const BACKENDS: [SceneBackend; 2] = [SceneBackend::Native, SceneBackend::Staged];

fn component_limit(kind: EntityKind, mesh: &dyn MeshQuery) -> usize {
    match kind {
        EntityKind::Vertex => mesh.point_count(),
        EntityKind::Edge => mesh.topology().edge_count(),
        EntityKind::Face => mesh.face_count(),
        EntityKind::Uv => mesh.uv_count(),
        EntityKind::Node => 0,
    }
}

/// Returns a description of the first contract violation, if any.
fn contract_violation(
    kind: EntityKind,
    backend: SceneBackend,
    scene: &dyn SceneEnumerator,
    result: &CheckResult,
) -> Option<String> {
    if result.shape() != kind.shape() {
        return Some(format!("shape {:?} for kind {:?}", result.shape(), kind));
    }
    match result {
        CheckResult::Nodes { entities } => {
            let known = scene.entities(false);
            entities
                .iter()
                .find(|id| id.backend != backend || !known.contains(id))
                .map(|id| format!("unknown entity {id}"))
        }
        CheckResult::Components { entries } => {
            let meshes: HashMap<&EntityId, &dyn MeshQuery> =
                scene.mesh_entities().into_iter().collect();
            for entry in entries {
                let Some(mesh) = meshes.get(&entry.entity) else {
                    return Some(format!("{} is not a mesh entity", entry.entity));
                };
                if entry.indices.is_empty() {
                    return Some(format!("empty index list for {}", entry.entity));
                }
                if entry.indices.windows(2).any(|w| w[0] >= w[1]) {
                    return Some(format!("indices not strictly ascending: {:?}", entry.indices));
                }
                let limit = component_limit(kind, *mesh);
                if entry.indices.iter().any(|&i| i as usize >= limit) {
                    return Some(format!("index out of range ({limit}): {:?}", entry.indices));
                }
            }
            None
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_check_honours_its_result_shape(doc in arb_scene()) {
        let registry = Registry::builtin().expect("builtin registry");
        for backend in BACKENDS {
            let scene = doc.open(backend).expect("generated scenes open");
            for check in registry.all_checks() {
                let Some(f) = check.entry(backend) else { continue };
                let result = f(scene.as_ref()).expect("checks are total on valid scenes");
                let violation = contract_violation(check.entity_kind, backend, scene.as_ref(), &result);
                prop_assert!(violation.is_none(), "{} on {}: {:?}", check.name, backend, violation);
            }
        }
    }

    #[test]
    fn checks_are_deterministic(doc in arb_scene()) {
        let registry = Registry::builtin().expect("builtin registry");
        for backend in BACKENDS {
            let first = doc.open(backend).expect("open");
            let second = doc.open(backend).expect("open");
            for check in registry.all_checks() {
                let Some(f) = check.entry(backend) else { continue };
                let a = f(first.as_ref()).expect("check runs");
                let b = f(second.as_ref()).expect("check runs");
                prop_assert_eq!(a, b, "{} differs between runs", check.name);
            }
        }
    }
}

#[test]
fn empty_scene_yields_empty_results_for_every_check() {
    let doc = sample_scenes::empty();
    let registry = Registry::builtin().expect("builtin registry");
    for backend in BACKENDS {
        let scene = doc.open(backend).expect("empty scene opens");
        for check in registry.all_checks() {
            let Some(f) = check.entry(backend) else { continue };
            let result = f(scene.as_ref()).expect("check runs");
            assert!(result.is_empty(), "{} on {backend}", check.name);
            assert_eq!(result.shape(), check.shape());
        }
    }
}

#[test]
fn ngon_scenario_reports_only_the_five_sided_face() {
    let doc = sample_scenes::ngon();
    let registry = Registry::builtin().expect("builtin registry");
    let ngons = registry.get("ngons").expect("ngons registered");
    for backend in BACKENDS {
        let scene = doc.open(backend).expect("open");
        let f = ngons.entry(backend).expect("ngons supports both backends");
        match f(scene.as_ref()).expect("check runs") {
            CheckResult::Components { entries } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(scene.resolve_name(&entries[0].entity).trim_start_matches(['|', '/']), "ngon_geo");
                assert_eq!(entries[0].indices, vec![2]);
            }
            other => panic!("expected components, got {other:?}"),
        }
    }
}

#[test]
fn uniquely_named_entity_is_never_a_duplicate() {
    let doc = sample_scenes::duplicate_names();
    let registry = Registry::builtin().expect("builtin registry");
    let check = registry.get("duplicated_names").expect("registered");
    for backend in BACKENDS {
        let scene = doc.open(backend).expect("open");
        let f = check.entry(backend).expect("both backends");
        let result = f(scene.as_ref()).expect("check runs");
        let names: Vec<String> = result.entities().iter().map(|id| scene.resolve_name(id)).collect();
        assert_eq!(names.len(), 2, "{names:?}");
        assert!(names.iter().all(|n| !n.ends_with("unique_geo")));
    }
}
