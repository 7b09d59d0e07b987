use std::collections::{HashMap, HashSet};

use meshlint_types::{CheckResult, EntityId};

/// Union two results of the same shape, `a` first.
///
/// Node lists are concatenated without repeats. Component entries for the
/// same entity have their index lists unioned; ids never collide across
/// backends, so a BOTH run keeps the native entries ahead of the staged ones.
/// Returns `None` when the shapes differ.
pub fn merge_results(a: CheckResult, b: CheckResult) -> Option<CheckResult> {
    match (a, b) {
        (CheckResult::Nodes { entities: first }, CheckResult::Nodes { entities: more }) => {
            let mut seen: HashSet<EntityId> = HashSet::with_capacity(first.len() + more.len());
            let mut entities = Vec::with_capacity(first.len() + more.len());
            for id in first.into_iter().chain(more) {
                if seen.insert(id.clone()) {
                    entities.push(id);
                }
            }
            Some(CheckResult::Nodes { entities })
        }
        (CheckResult::Components { mut entries }, CheckResult::Components { entries: more }) => {
            let mut slot: HashMap<EntityId, usize> = entries
                .iter()
                .enumerate()
                .map(|(i, e)| (e.entity.clone(), i))
                .collect();
            let mut touched = Vec::new();
            for entry in more {
                match slot.get(&entry.entity) {
                    Some(&i) => {
                        entries[i].indices.extend(entry.indices);
                        touched.push(i);
                    }
                    None => {
                        slot.insert(entry.entity.clone(), entries.len());
                        entries.push(entry);
                    }
                }
            }
            for i in touched {
                entries[i].indices.sort_unstable();
                entries[i].indices.dedup();
            }
            Some(CheckResult::Components { entries })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlint_types::{EntityComponents, EntityId, ResultShape};

    #[test]
    fn node_merge_contains_both_sides_once() {
        let native = CheckResult::Nodes {
            entities: vec![EntityId::native("X")],
        };
        let staged = CheckResult::Nodes {
            entities: vec![EntityId::staged("/Y")],
        };
        let merged = merge_results(native, staged).unwrap();
        assert_eq!(
            merged,
            CheckResult::Nodes {
                entities: vec![EntityId::native("X"), EntityId::staged("/Y")],
            }
        );
    }

    #[test]
    fn component_merge_unions_indices() {
        let a = CheckResult::Components {
            entries: vec![EntityComponents {
                entity: EntityId::native("X"),
                indices: vec![1, 3],
            }],
        };
        let b = CheckResult::Components {
            entries: vec![EntityComponents {
                entity: EntityId::native("X"),
                indices: vec![2, 3],
            }],
        };
        let merged = merge_results(a, b).unwrap();
        assert_eq!(merged.offending_count(), 3);
    }

    #[test]
    fn large_node_merge_keeps_order_without_repeats() {
        let a: Vec<EntityId> = (0..30_000)
            .map(|i| EntityId::native(format!("N{i}")))
            .collect();
        let b: Vec<EntityId> = (15_000..45_000)
            .map(|i| EntityId::native(format!("N{i}")))
            .collect();
        let merged = merge_results(
            CheckResult::Nodes { entities: a },
            CheckResult::Nodes { entities: b },
        )
        .unwrap();
        let CheckResult::Nodes { entities } = merged else {
            panic!("expected node result");
        };
        assert_eq!(entities.len(), 45_000);
        assert_eq!(entities[0], EntityId::native("N0"));
        assert_eq!(entities[44_999], EntityId::native("N44999"));
    }

    #[test]
    fn mismatched_shapes_do_not_merge() {
        assert!(
            merge_results(
                CheckResult::empty(ResultShape::Nodes),
                CheckResult::empty(ResultShape::Components)
            )
            .is_none()
        );
    }
}
