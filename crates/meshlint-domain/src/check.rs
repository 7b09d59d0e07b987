use std::collections::HashSet;
use std::fmt;

use meshlint_scene::SceneEnumerator;
use meshlint_types::{
    Backend, CheckResult, EntityComponents, EntityId, EntityKind, ResultShape, SceneBackend,
};

/// One backend entry point of a check.
pub type CheckFn = fn(&dyn SceneEnumerator) -> Result<CheckResult, CheckError>;

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("entity '{id}' was enumerated but cannot be looked up")]
    UnknownEntity { id: String },

    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Per-backend entry points. A missing entry means the check does not support that backend.
#[derive(Clone, Copy)]
pub struct BackendTable {
    pub native: Option<CheckFn>,
    pub staged: Option<CheckFn>,
}

impl BackendTable {
    /// The same function for both backends.
    pub const fn both(f: CheckFn) -> Self {
        Self {
            native: Some(f),
            staged: Some(f),
        }
    }

    pub const fn split(native: CheckFn, staged: CheckFn) -> Self {
        Self {
            native: Some(native),
            staged: Some(staged),
        }
    }

    pub const fn native_only(f: CheckFn) -> Self {
        Self {
            native: Some(f),
            staged: None,
        }
    }

    pub const fn staged_only(f: CheckFn) -> Self {
        Self {
            native: None,
            staged: Some(f),
        }
    }

    pub fn get(&self, backend: SceneBackend) -> Option<CheckFn> {
        match backend {
            SceneBackend::Native => self.native,
            SceneBackend::Staged => self.staged,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.native.is_none() && self.staged.is_none()
    }
}

impl fmt::Debug for BackendTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendTable")
            .field("native", &self.native.is_some())
            .field("staged", &self.staged.is_some())
            .finish()
    }
}

/// A registered check: identity plus one entry point per supported backend.
#[derive(Debug, Clone, Copy)]
pub struct Check {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub entity_kind: EntityKind,
    pub description: &'static str,
    pub backends: BackendTable,
}

impl Check {
    pub fn supports(&self, backend: SceneBackend) -> bool {
        self.backends.get(backend).is_some()
    }

    pub fn entry(&self, backend: SceneBackend) -> Option<CheckFn> {
        self.backends.get(backend)
    }

    /// The narrowest backend selector covering every supported backend.
    pub fn supported_backends(&self) -> Option<Backend> {
        match (self.backends.native, self.backends.staged) {
            (Some(_), Some(_)) => Some(Backend::Both),
            (Some(_), None) => Some(Backend::Native),
            (None, Some(_)) => Some(Backend::Staged),
            (None, None) => None,
        }
    }

    pub fn shape(&self) -> ResultShape {
        self.entity_kind.shape()
    }
}

// ── Result builders ────────────────────────────────────────────

/// Collects offending entities for a node-level check, skipping repeats.
#[derive(Debug, Default)]
pub struct NodeHits {
    entities: Vec<EntityId>,
    seen: HashSet<EntityId>,
}

impl NodeHits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: &EntityId) {
        if self.seen.insert(id.clone()) {
            self.entities.push(id.clone());
        }
    }

    pub fn finish(self) -> CheckResult {
        CheckResult::Nodes {
            entities: self.entities,
        }
    }
}

/// Collects offending component indices per entity, in call order.
#[derive(Debug, Default)]
pub struct ComponentHits {
    entries: Vec<EntityComponents>,
}

impl ComponentHits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the indices flagged on one entity. Empty index sets add nothing.
    pub fn record(&mut self, entity: &EntityId, indices: impl IntoIterator<Item = u32>) {
        let mut indices: Vec<u32> = indices.into_iter().collect();
        if indices.is_empty() {
            return;
        }
        indices.sort_unstable();
        indices.dedup();
        self.entries.push(EntityComponents {
            entity: entity.clone(),
            indices,
        });
    }

    pub fn finish(self) -> CheckResult {
        CheckResult::Components {
            entries: self.entries,
        }
    }
}
