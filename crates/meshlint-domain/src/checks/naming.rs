use std::collections::HashMap;

use meshlint_scene::{NodeRole, SceneEnumerator, SceneNode};
use meshlint_types::{CATEGORY_NAMING, CheckResult, EntityKind};
use regex::Regex;

use super::{all_nodes, flag_nodes};
use crate::check::{BackendTable, Check, CheckError, NodeHits};

/// Names DCC tools hand out to freshly created nodes and prims.
pub const DEFAULT_NAME_PATTERN: &str = r"^(pCube|pSphere|pCylinder|pCone|pPlane|pTorus|pPrism|pPyramid|pPipe|pHelix|pSolid|pDisc|polySurface|nurbsCube|nurbsSphere|nurbsCylinder|nurbsPlane|group|null|transform|locator|Cube|Sphere|Cylinder|Cone|Plane|Mesh|Xform|Scope)\d*$";

// Accepted name prefixes per node role, compared case-insensitively.
pub const MESH_PREFIXES: &[&str] = &["geo_", "mesh_", "msh_"];
pub const GROUP_PREFIXES: &[&str] = &["grp_", "group_"];
pub const JOINT_PREFIXES: &[&str] = &["jnt_", "joint_", "bn_", "bone_"];
pub const LOCATOR_PREFIXES: &[&str] = &["loc_", "locator_"];
pub const CAMERA_PREFIXES: &[&str] = &["cam_", "camera_"];
pub const LIGHT_PREFIXES: &[&str] = &["lgt_", "light_"];

pub(crate) fn checks() -> Vec<Check> {
    vec![
        Check {
            name: "duplicated_names",
            label: "Duplicated Names",
            category: CATEGORY_NAMING,
            entity_kind: EntityKind::Node,
            description: "Nodes whose short name, ignoring a numeric suffix, is used more than once.",
            backends: BackendTable::both(duplicated_names),
        },
        Check {
            name: "namespaces",
            label: "Namespaces",
            category: CATEGORY_NAMING,
            entity_kind: EntityKind::Node,
            description: "Nodes whose name carries a namespace.",
            backends: BackendTable::native_only(namespaces),
        },
        Check {
            name: "shape_names",
            label: "Shape Names",
            category: CATEGORY_NAMING,
            entity_kind: EntityKind::Node,
            description: "Mesh shapes not named after their transform with a 'Shape' suffix.",
            backends: BackendTable::native_only(shape_names),
        },
        Check {
            name: "trailing_numbers",
            label: "Trailing Numbers",
            category: CATEGORY_NAMING,
            entity_kind: EntityKind::Node,
            description: "Nodes whose name ends in a digit.",
            backends: BackendTable::both(trailing_numbers),
        },
        Check {
            name: "default_names",
            label: "Default Names",
            category: CATEGORY_NAMING,
            entity_kind: EntityKind::Node,
            description: "Nodes still carrying a name the DCC generated.",
            backends: BackendTable::both(default_names),
        },
        Check {
            name: "naming_convention",
            label: "Naming Convention",
            category: CATEGORY_NAMING,
            entity_kind: EntityKind::Node,
            description: "Nodes whose name lacks the prefix for their type (geo_, grp_, jnt_, loc_, cam_, lgt_).",
            backends: BackendTable::both(naming_convention),
        },
    ]
}

/// `geo_cube12` -> `geo_cube`. Names made only of digits are their own stem.
fn name_stem(name: &str) -> &str {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if stem.is_empty() { name } else { stem }
}

fn duplicated_names(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    let nodes = all_nodes(scene, false)?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for node in &nodes {
        *counts.entry(name_stem(&node.name)).or_default() += 1;
    }

    let mut hits = NodeHits::new();
    for node in &nodes {
        if counts.get(name_stem(&node.name)).copied().unwrap_or(0) > 1 {
            hits.push(&node.id);
        }
    }
    Ok(hits.finish())
}

fn namespaces(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| n.name.contains(':'))
}

fn shape_names(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        n.role == NodeRole::Mesh
            && n.shape_name.as_deref() != Some(format!("{}Shape", n.name).as_str())
    })
}

fn trailing_numbers(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        n.name.chars().last().is_some_and(|c| c.is_ascii_digit())
    })
}

fn default_names(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    let re = Regex::new(DEFAULT_NAME_PATTERN).map_err(|source| CheckError::Pattern {
        pattern: DEFAULT_NAME_PATTERN.to_string(),
        source,
    })?;
    // Namespaced names are judged by their last segment.
    flag_nodes(scene, false, |n| {
        re.is_match(n.name.rsplit(':').next().unwrap_or(&n.name))
    })
}

fn role_prefixes(node: &SceneNode) -> &'static [&'static str] {
    if node.intermediate {
        return MESH_PREFIXES;
    }
    match node.role {
        NodeRole::Mesh => MESH_PREFIXES,
        NodeRole::Transform | NodeRole::Scope => GROUP_PREFIXES,
        NodeRole::Joint => JOINT_PREFIXES,
        NodeRole::Locator => LOCATOR_PREFIXES,
        NodeRole::Camera => CAMERA_PREFIXES,
        NodeRole::Light => LIGHT_PREFIXES,
    }
}

fn naming_convention(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
    flag_nodes(scene, false, |n| {
        let short = n.name.rsplit(':').next().unwrap_or(&n.name).to_ascii_lowercase();
        !role_prefixes(n).iter().any(|p| short.starts_with(p))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::flagged_names;
    use meshlint_scene::model::NodeKind;
    use meshlint_testkit::{MeshBuilder, NodeBuilder, PrimBuilder, SceneBuilder, sample_scenes};
    use meshlint_types::SceneBackend;

    #[test]
    fn duplicate_stems_flag_both_entities() {
        let doc = sample_scenes::duplicate_names();
        assert_eq!(
            flagged_names(&doc, SceneBackend::Native, duplicated_names),
            vec!["|geo_cube1", "|geo_cube2"]
        );
        assert_eq!(
            flagged_names(&doc, SceneBackend::Staged, duplicated_names),
            vec!["/geo_cube1", "/geo_cube2"]
        );
    }

    #[test]
    fn identical_names_under_different_parents_are_duplicates() {
        let doc = SceneBuilder::new()
            .node(NodeBuilder::new("a").child(NodeBuilder::new("geo").build()).build())
            .node(NodeBuilder::new("b").child(NodeBuilder::new("geo").build()).build())
            .build();
        assert_eq!(
            flagged_names(&doc, SceneBackend::Native, duplicated_names),
            vec!["|a|geo", "|b|geo"]
        );
    }

    #[test]
    fn name_stem_keeps_all_digit_names() {
        assert_eq!(name_stem("geo_cube12"), "geo_cube");
        assert_eq!(name_stem("42"), "42");
        assert_eq!(name_stem("geo"), "geo");
    }

    #[test]
    fn messy_scene_naming() {
        let doc = sample_scenes::messy();
        let native = SceneBackend::Native;
        assert_eq!(
            flagged_names(&doc, native, namespaces),
            vec!["|group1|ns:light"]
        );
        assert_eq!(
            flagged_names(&doc, native, shape_names),
            vec!["|group1|pCube1"]
        );
        assert_eq!(
            flagged_names(&doc, native, trailing_numbers),
            vec!["|group1", "|group1|pCube1", "|null1"]
        );
        assert_eq!(
            flagged_names(&doc, native, default_names),
            vec!["|group1", "|group1|pCube1", "|null1"]
        );
        assert_eq!(
            flagged_names(&doc, SceneBackend::Staged, default_names),
            vec!["/group1", "/group1/pCube1", "/null1"]
        );
    }

    #[test]
    fn correctly_named_shape_passes() {
        let doc = SceneBuilder::new()
            .node(
                NodeBuilder::new("wheel")
                    .mesh("wheelShape", MeshBuilder::cube().build())
                    .build(),
            )
            .build();
        assert!(flagged_names(&doc, SceneBackend::Native, shape_names).is_empty());
    }

    #[test]
    fn prefixes_follow_the_node_type() {
        let cube = MeshBuilder::cube().build();
        let doc = SceneBuilder::new()
            .node(
                NodeBuilder::new("grp_props")
                    .child(NodeBuilder::new("geo_crate").mesh("geo_crateShape", cube.clone()).build())
                    .child(NodeBuilder::new("GEO_barrel").mesh("GEO_barrelShape", cube.clone()).build())
                    .child(NodeBuilder::new("crate").mesh("crateShape", cube.clone()).build())
                    .child(NodeBuilder::new("jnt_spine").kind(NodeKind::Joint).build())
                    .child(NodeBuilder::new("loc_target").kind(NodeKind::Locator).build())
                    .child(NodeBuilder::new("geo_rig").kind(NodeKind::Joint).build())
                    .child(NodeBuilder::new("rig:lgt_key").kind(NodeKind::Light).build())
                    .build(),
            )
            .node(NodeBuilder::new("props").build())
            .prim(
                PrimBuilder::scope("grp_set")
                    .child(PrimBuilder::mesh("rock", &cube).build())
                    .child(PrimBuilder::mesh("msh_tree", &cube).build())
                    .build(),
            )
            .build();
        assert_eq!(
            flagged_names(&doc, SceneBackend::Native, naming_convention),
            vec!["|grp_props|crate", "|grp_props|geo_rig", "|props"]
        );
        assert_eq!(
            flagged_names(&doc, SceneBackend::Staged, naming_convention),
            vec!["/grp_set/rock"]
        );
    }

    #[test]
    fn messy_scene_misses_every_prefix() {
        let doc = sample_scenes::messy();
        assert_eq!(
            flagged_names(&doc, SceneBackend::Native, naming_convention),
            vec!["|group1", "|group1|pCube1", "|group1|ns:light", "|null1"]
        );
        assert!(flagged_names(&sample_scenes::clean(), SceneBackend::Native, naming_convention).is_empty());
    }

    #[test]
    fn default_name_pattern_compiles() {
        assert!(Regex::new(DEFAULT_NAME_PATTERN).is_ok());
    }
}
