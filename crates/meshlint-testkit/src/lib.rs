//! Shared test utilities for the meshlint workspace.
//!
//! This crate provides:
//! - **scene_builder**: fluent builders for meshes, native nodes and stage prims
//! - **fixtures**: sample scene documents and configs
//! - **arb**: proptest strategies for meshes and scenes
//! - **schema**: JSON schema validation of receipts and config files
//!
//! # Example
//!
//! ```rust
//! use meshlint_testkit::scene_builder::{MeshBuilder, NodeBuilder};
//!
//! let node = NodeBuilder::new("geo_body")
//!     .mesh("geo_bodyShape", MeshBuilder::cube().build())
//!     .build();
//! assert!(node.shape.is_some());
//! ```

pub mod arb;
pub mod fixtures;
pub mod scene_builder;
pub mod schema;

pub use fixtures::{sample_configs, sample_scenes};
pub use scene_builder::{MeshBuilder, NodeBuilder, PrimBuilder, SceneBuilder, to_usd_mesh};
pub use schema::{validate_config_file, validate_run_receipt};
