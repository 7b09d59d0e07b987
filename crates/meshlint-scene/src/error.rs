use std::path::PathBuf;

use meshlint_types::SceneBackend;

/// Run-level scene failures. Any of these makes the scene unusable for a backend.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene has no {backend} section")]
    MissingBackend { backend: SceneBackend },

    #[error("{backend} node under '{parent}' has an empty name")]
    EmptyName {
        backend: SceneBackend,
        parent: String,
    },

    #[error("node '{path}' has invalid uuid '{value}'")]
    InvalidUuid { path: String, value: String },

    #[error("duplicate {backend} id '{id}' ('{first}' and '{second}')")]
    DuplicateId {
        backend: SceneBackend,
        id: String,
        first: String,
        second: String,
    },

    #[error("prim name '{name}' under '{parent}' contains '/'")]
    InvalidPrimName { name: String, parent: String },

    #[error("default prim '{name}' is not a root prim")]
    UnknownDefaultPrim { name: String },

    #[error("failed to read scene '{path}'")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("scene '{path}' is not valid UTF-8")]
    Encoding {
        path: PathBuf,
        source: std::str::Utf8Error,
    },

    #[error("failed to parse scene JSON")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse scene TOML")]
    Toml(#[from] toml::de::Error),
}
