//! The check registry: every known check, keyed by name and grouped by category.

use std::collections::HashMap;

use crate::check::Check;
use crate::checks;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("check '{name}' is registered more than once")]
    DuplicateName { name: String },

    #[error("check '{name}' supports no backend")]
    NoBackend { name: String },

    #[error("check name '{name}' must be lower snake case")]
    InvalidName { name: String },
}

#[derive(Debug, Clone)]
pub struct Registry {
    checks: Vec<Check>,
    by_name: HashMap<&'static str, usize>,
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl Registry {
    /// Build a registry, rejecting duplicate names, malformed names and checks
    /// without any backend entry.
    pub fn new(checks: Vec<Check>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(checks.len());
        for (idx, check) in checks.iter().enumerate() {
            if !valid_name(check.name) {
                return Err(RegistryError::InvalidName {
                    name: check.name.to_string(),
                });
            }
            if check.backends.is_empty() {
                return Err(RegistryError::NoBackend {
                    name: check.name.to_string(),
                });
            }
            if by_name.insert(check.name, idx).is_some() {
                return Err(RegistryError::DuplicateName {
                    name: check.name.to_string(),
                });
            }
        }
        Ok(Self { checks, by_name })
    }

    /// The built-in check catalogue.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(checks::builtin())
    }

    /// All checks in registration order.
    pub fn all_checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn get(&self, name: &str) -> Option<&Check> {
        self.by_name.get(name).map(|&idx| &self.checks[idx])
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Category names in first-appearance order.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        for check in &self.checks {
            if !out.contains(&check.category) {
                out.push(check.category);
            }
        }
        out
    }

    /// Checks grouped by category; categories and checks keep registration order.
    pub fn by_category(&self) -> Vec<(&'static str, Vec<&Check>)> {
        self.categories()
            .into_iter()
            .map(|cat| {
                let members = self.checks.iter().filter(|c| c.category == cat).collect();
                (cat, members)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::BackendTable;
    use meshlint_scene::SceneEnumerator;
    use meshlint_types::{
        CATEGORY_GENERAL, CATEGORY_NAMING, CATEGORY_TOPOLOGY, CATEGORY_UVS, CheckResult,
        EntityKind, ResultShape,
    };

    fn nothing(_: &dyn SceneEnumerator) -> Result<CheckResult, crate::check::CheckError> {
        Ok(CheckResult::empty(ResultShape::Nodes))
    }

    fn check(name: &'static str, backends: BackendTable) -> Check {
        Check {
            name,
            label: "Test",
            category: CATEGORY_GENERAL,
            entity_kind: EntityKind::Node,
            description: "",
            backends,
        }
    }

    #[test]
    fn builtin_registry_has_thirty_five_checks_in_four_categories() {
        let registry = Registry::builtin().expect("builtin registry is valid");
        assert_eq!(registry.len(), 35);
        assert_eq!(
            registry.categories(),
            vec![CATEGORY_GENERAL, CATEGORY_NAMING, CATEGORY_TOPOLOGY, CATEGORY_UVS]
        );
        let sizes: Vec<usize> = registry
            .by_category()
            .iter()
            .map(|(_, checks)| checks.len())
            .collect();
        assert_eq!(sizes, vec![12, 6, 12, 5]);
    }

    #[test]
    fn lookup_by_name() {
        let registry = Registry::builtin().expect("builtin registry is valid");
        let ngons = registry.get("ngons").expect("ngons registered");
        assert_eq!(ngons.category, CATEGORY_TOPOLOGY);
        assert_eq!(ngons.entity_kind, EntityKind::Face);
        assert!(registry.get("no_such_check").is_none());
    }

    #[test]
    fn native_only_checks() {
        let registry = Registry::builtin().expect("builtin registry is valid");
        let native_only: Vec<&str> = registry
            .all_checks()
            .iter()
            .filter(|c| c.backends.staged.is_none())
            .map(|c| c.name)
            .collect();
        assert_eq!(
            native_only,
            vec![
                "history",
                "layers",
                "intermediate_objects",
                "namespaces",
                "shape_names",
                "hard_edges"
            ]
        );
    }

    #[test]
    fn rejects_duplicates() {
        let err = Registry::new(vec![
            check("a", BackendTable::both(nothing)),
            check("a", BackendTable::both(nothing)),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName { name: "a".into() });
    }

    #[test]
    fn rejects_backendless_checks() {
        let empty = BackendTable {
            native: None,
            staged: None,
        };
        let err = Registry::new(vec![check("a", empty)]).unwrap_err();
        assert_eq!(err, RegistryError::NoBackend { name: "a".into() });
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["", "Ngons", "1st", "has-dash"] {
            let err = Registry::new(vec![check(bad, BackendTable::both(nothing))]).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidName { .. }), "{bad}");
        }
    }
}
