use globset::{Glob, GlobSet, GlobSetBuilder};

use meshlint_domain::{Check, Registry};
use meshlint_types::SelectionConfig;

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("unknown category '{name}' (known: {known})")]
    UnknownCategory { name: String, known: String },

    #[error("invalid check glob '{glob}': {source}")]
    InvalidGlob {
        glob: String,
        source: globset::Error,
    },
}

fn compile_globs(globs: &[String]) -> Result<Option<GlobSet>, SelectionError> {
    if globs.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for g in globs {
        let glob = Glob::new(g).map_err(|e| SelectionError::InvalidGlob {
            glob: g.clone(),
            source: e,
        })?;
        b.add(glob);
    }
    b.build().map(Some).map_err(|e| SelectionError::InvalidGlob {
        glob: globs.join(","),
        source: e,
    })
}

fn validate_categories(registry: &Registry, names: &[String]) -> Result<(), SelectionError> {
    let known = registry.categories();
    for name in names {
        if !known.iter().any(|k| k.eq_ignore_ascii_case(name)) {
            return Err(SelectionError::UnknownCategory {
                name: name.clone(),
                known: known.join(", "),
            });
        }
    }
    Ok(())
}

fn in_categories(check: &Check, categories: &[String]) -> bool {
    categories
        .iter()
        .any(|c| c.eq_ignore_ascii_case(check.category))
}

/// Resolve a selection against the registry. The result keeps registry order.
///
/// - If `only_categories` is non-empty, a check must be in one of them or
///   match an `enable` glob.
/// - Checks in `disable_categories` or matching a `disable` glob are dropped.
pub fn select_checks(
    registry: &Registry,
    selection: &SelectionConfig,
) -> Result<Vec<Check>, SelectionError> {
    validate_categories(registry, &selection.only_categories)?;
    validate_categories(registry, &selection.disable_categories)?;
    let enable = compile_globs(&selection.enable)?;
    let disable = compile_globs(&selection.disable)?;

    let selected = registry
        .all_checks()
        .iter()
        .filter(|check| {
            if !selection.only_categories.is_empty() {
                let in_only = in_categories(check, &selection.only_categories);
                let enabled = enable.as_ref().is_some_and(|g| g.is_match(check.name));
                if !in_only && !enabled {
                    return false;
                }
            }
            if in_categories(check, &selection.disable_categories) {
                return false;
            }
            !disable.as_ref().is_some_and(|g| g.is_match(check.name))
        })
        .copied()
        .collect();
    Ok(selected)
}
