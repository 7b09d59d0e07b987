//! Common test fixtures for meshlint.
//!
//! This module provides sample scene documents and configs for use in tests
//! across the workspace.

use meshlint_scene::model::{NodeKind, SceneDocument};
use meshlint_types::{ConfigFile, Defaults, FailOn, SelectionConfig, Verbosity};

use crate::scene_builder::{MeshBuilder, NodeBuilder, PrimBuilder, SceneBuilder};

// =============================================================================
// Sample Scenes
// =============================================================================

/// Collection of sample scene documents.
pub mod sample_scenes {
    use super::*;

    /// Both sections present, nothing in them.
    pub fn empty() -> SceneDocument {
        SceneBuilder::new().with_native().with_stage().build()
    }

    /// A grouped unit cube that passes every built-in check on both backends.
    pub fn clean() -> SceneDocument {
        let cube = MeshBuilder::cube().build();
        SceneBuilder::new()
            .node(
                NodeBuilder::new("grp_body")
                    .child(
                        NodeBuilder::new("geo_body")
                            .mesh("geo_bodyShape", cube.clone())
                            .shader("body_mat")
                            .build(),
                    )
                    .build(),
            )
            .prim(
                PrimBuilder::xform("grp_body")
                    .child(
                        PrimBuilder::mesh("geo_body", &cube)
                            .material("/looks/body_mat")
                            .build(),
                    )
                    .build(),
            )
            .default_prim("grp_body")
            .build()
    }

    /// `geo_cube1` and `geo_cube2` share a name stem; `unique_geo` does not.
    pub fn duplicate_names() -> SceneDocument {
        SceneBuilder::new()
            .node(NodeBuilder::new("geo_cube1").build())
            .node(NodeBuilder::new("geo_cube2").build())
            .node(NodeBuilder::new("unique_geo").build())
            .prim(PrimBuilder::xform("geo_cube1").build())
            .prim(PrimBuilder::xform("geo_cube2").build())
            .prim(PrimBuilder::xform("unique_geo").build())
            .build()
    }

    /// One mesh with a quad (face 0), a triangle (face 1) and a pentagon (face 2).
    pub fn ngon() -> SceneDocument {
        let mesh = MeshBuilder::new()
            .point(0.0, 0.0, 0.0)
            .point(1.0, 0.0, 0.0)
            .point(1.0, 0.0, 1.0)
            .point(0.0, 0.0, 1.0)
            .point(2.0, 0.0, 0.5)
            .point(3.0, 0.0, 0.0)
            .point(4.0, 0.0, 0.0)
            .point(4.5, 0.0, 1.0)
            .point(3.5, 0.0, 1.8)
            .point(2.5, 0.0, 1.0)
            .face(&[0, 1, 2, 3])
            .face(&[1, 4, 2])
            .face(&[5, 6, 7, 8, 9])
            .build();
        SceneBuilder::new()
            .node(
                NodeBuilder::new("ngon_geo")
                    .mesh("ngon_geoShape", mesh.clone())
                    .build(),
            )
            .prim(PrimBuilder::mesh("ngon_geo", &mesh).build())
            .build()
    }

    /// A scene that trips many checks at once.
    pub fn messy() -> SceneDocument {
        let open_quad = MeshBuilder::quad().build();
        SceneBuilder::new()
            .layer("hidden_layer", false)
            .node(
                NodeBuilder::new("group1")
                    .translate(0.0, 2.0, 0.0)
                    .child(
                        NodeBuilder::new("pCube1")
                            .mesh("wrongShape", open_quad.clone())
                            .layer("hidden_layer")
                            .history("polyCube1")
                            .build(),
                    )
                    .child(NodeBuilder::new("ns:light").kind(NodeKind::Light).build())
                    .build(),
            )
            .node(NodeBuilder::new("null1").build())
            .prim(
                PrimBuilder::xform("group1")
                    .translate(0.0, 2.0, 0.0)
                    .child(PrimBuilder::mesh("pCube1", &open_quad).hidden().build())
                    .build(),
            )
            .prim(PrimBuilder::scope("null1").build())
            .build()
    }

    /// Serialize a document the way scene files on disk look.
    pub fn to_json(doc: &SceneDocument) -> String {
        serde_json::to_string_pretty(doc).expect("scene documents serialize")
    }
}

// =============================================================================
// Sample Configs
// =============================================================================

/// Collection of sample configuration files for testing.
pub mod sample_configs {
    use super::*;

    /// An empty configuration with default values.
    pub fn empty() -> ConfigFile {
        ConfigFile::default()
    }

    /// The built-in configuration from meshlint-types.
    pub fn built_in() -> ConfigFile {
        ConfigFile::built_in()
    }

    /// Topology checks only, both backends, never failing the process.
    pub fn topology_only() -> ConfigFile {
        ConfigFile {
            includes: vec![],
            defaults: Defaults {
                backend: Some(meshlint_types::Backend::Both),
                fail_on: Some(FailOn::Never),
                verbosity: Some(Verbosity::Verbose),
                preset: None,
                max_items: Some(50),
            },
            selection: SelectionConfig {
                only_categories: vec!["Topology".to_string()],
                ..SelectionConfig::default()
            },
        }
    }
}
