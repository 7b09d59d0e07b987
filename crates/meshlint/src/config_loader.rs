//! Configuration loading with include resolution.
//!
//! This module handles loading configuration files with support for:
//! - `includes` directive to compose configs from multiple files
//! - Circular include detection
//! - Merge semantics (later files override defaults and extend selection lists)

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use meshlint_types::{ConfigFile, Defaults, SelectionConfig};

/// Maximum depth for include resolution to prevent excessive nesting.
const MAX_INCLUDE_DEPTH: usize = 10;

/// Load a configuration file with include resolution.
///
/// Includes are loaded first, in order, and the including file is merged on
/// top of them.
pub fn load_config_with_includes<F>(path: &Path, expand_env: F) -> Result<ConfigFile>
where
    F: Fn(&str) -> Result<Cow<'_, str>> + Copy,
{
    let mut visited = HashSet::new();
    load_config_recursive(path, expand_env, &mut visited, 0)
}

fn load_config_recursive<F>(
    path: &Path,
    expand_env: F,
    visited: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<ConfigFile>
where
    F: Fn(&str) -> Result<Cow<'_, str>> + Copy,
{
    if depth > MAX_INCLUDE_DEPTH {
        bail!(
            "Include depth exceeded maximum of {} levels at '{}'",
            MAX_INCLUDE_DEPTH,
            path.display()
        );
    }

    let canonical = path
        .canonicalize()
        .with_context(|| format!("canonicalize path '{}'", path.display()))?;

    if !visited.insert(canonical.clone()) {
        bail!("Circular include detected: '{}'", path.display());
    }

    debug!("Loading config from '{}' (depth {})", path.display(), depth);

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    let expanded = expand_env(&text)?;
    let config: ConfigFile =
        toml::from_str(&expanded).with_context(|| format!("parse config '{}'", path.display()))?;

    let base_dir = path.parent().unwrap_or(Path::new("."));
    let mut merged = ConfigFile::default();

    for include_path in &config.includes {
        let full_path = base_dir.join(include_path);
        if !full_path.exists() {
            bail!(
                "Included config file not found: '{}' (resolved from '{}')",
                full_path.display(),
                include_path
            );
        }
        let included = load_config_recursive(&full_path, expand_env, visited, depth + 1)?;
        merged = merge_configs(merged, included);
    }

    // Siblings may include the same file; only an include back up the
    // current chain is a cycle.
    visited.remove(&canonical);

    Ok(merge_configs(
        merged,
        ConfigFile {
            includes: vec![],
            ..config
        },
    ))
}

/// Merge `other` on top of `base`.
pub fn merge_configs(base: ConfigFile, other: ConfigFile) -> ConfigFile {
    ConfigFile {
        includes: vec![],
        defaults: merge_defaults(base.defaults, other.defaults),
        selection: merge_selection(base.selection, other.selection),
    }
}

fn merge_defaults(base: Defaults, other: Defaults) -> Defaults {
    Defaults {
        backend: other.backend.or(base.backend),
        fail_on: other.fail_on.or(base.fail_on),
        verbosity: other.verbosity.or(base.verbosity),
        preset: other.preset.or(base.preset),
        max_items: other.max_items.or(base.max_items),
    }
}

/// Concatenate selection lists, dropping repeats.
pub fn merge_selection(base: SelectionConfig, other: SelectionConfig) -> SelectionConfig {
    SelectionConfig {
        only_categories: extend_unique(base.only_categories, other.only_categories),
        disable_categories: extend_unique(base.disable_categories, other.disable_categories),
        enable: extend_unique(base.enable, other.enable),
        disable: extend_unique(base.disable, other.disable),
    }
}

fn extend_unique(mut base: Vec<String>, other: Vec<String>) -> Vec<String> {
    for item in other {
        if !base.contains(&item) {
            base.push(item);
        }
    }
    base
}
