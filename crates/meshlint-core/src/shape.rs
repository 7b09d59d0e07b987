//! Shape validation and normalisation of check results.
//!
//! A check declares its entity kind statically; the runner holds every result
//! to that declaration before it reaches the aggregate.

use std::collections::{HashMap, HashSet};

use meshlint_types::{
    CheckResult, EntityComponents, EntityId, EntityKind, ResultShape, SceneBackend,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("expected a {} result, got {}", .expected.as_str(), .actual.as_str())]
    WrongShape {
        expected: ResultShape,
        actual: ResultShape,
    },

    #[error("entity '{key}' belongs to the {found} backend, not {expected}")]
    WrongBackend {
        key: String,
        expected: SceneBackend,
        found: SceneBackend,
    },
}

fn check_backend(id: &EntityId, backend: SceneBackend) -> Result<(), ShapeError> {
    if id.backend == backend {
        Ok(())
    } else {
        Err(ShapeError::WrongBackend {
            key: id.key.clone(),
            expected: backend,
            found: id.backend,
        })
    }
}

/// Validate `result` against `kind` and bring it into canonical form.
///
/// Node lists keep the first occurrence of each entity. Component entries for
/// the same entity are merged, their indices sorted ascending without repeats,
/// and entries left without indices are dropped. Entity order follows first
/// appearance.
pub fn normalise(
    kind: EntityKind,
    backend: SceneBackend,
    result: CheckResult,
) -> Result<CheckResult, ShapeError> {
    let expected = kind.shape();
    if result.shape() != expected {
        return Err(ShapeError::WrongShape {
            expected,
            actual: result.shape(),
        });
    }

    match result {
        CheckResult::Nodes { entities } => {
            let mut seen: HashSet<EntityId> = HashSet::with_capacity(entities.len());
            let mut out: Vec<EntityId> = Vec::with_capacity(entities.len());
            for id in entities {
                check_backend(&id, backend)?;
                if seen.insert(id.clone()) {
                    out.push(id);
                }
            }
            Ok(CheckResult::Nodes { entities: out })
        }
        CheckResult::Components { entries } => {
            let mut slot: HashMap<EntityId, usize> = HashMap::new();
            let mut merged: Vec<EntityComponents> = Vec::new();
            for entry in entries {
                check_backend(&entry.entity, backend)?;
                match slot.get(&entry.entity) {
                    Some(&i) => merged[i].indices.extend(entry.indices),
                    None => {
                        slot.insert(entry.entity.clone(), merged.len());
                        merged.push(entry);
                    }
                }
            }
            for entry in &mut merged {
                entry.indices.sort_unstable();
                entry.indices.dedup();
            }
            merged.retain(|e| !e.indices.is_empty());
            Ok(CheckResult::Components { entries: merged })
        }
    }
}
