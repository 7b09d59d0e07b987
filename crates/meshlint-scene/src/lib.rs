//! Scene access for meshlint: the on-disk scene document, the two scene
//! representations built from it, and the mesh handles checks query.

mod enumerator;
mod error;
mod load;
pub mod mesh;
pub mod model;
mod native;
mod staged;
pub mod transform;

pub use enumerator::{Bounds, FlatScene, NodeRole, SceneEnumerator, SceneNode};
pub use error::SceneError;
pub use load::{SceneFile, SceneSource};
pub use mesh::{Edge, MeshQuery, NativeMesh, StagedMesh, Topology};
pub use model::SceneDocument;
pub use native::{DEFAULT_LAYER, NativeScene, build_native, derive_uuid};
pub use staged::{StagedScene, build_staged};
