//! Environment variable expansion for configuration files.
//!
//! `${VAR}` expands to the value of VAR and fails when it is unset.
//! `${VAR:-default}` falls back to `default` when VAR is unset or empty.

use std::borrow::Cow;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::{Captures, Regex};
use tracing::debug;

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("env var regex compiles")
});

/// Expand environment variable references in config text.
pub fn expand_env_vars(text: &str) -> Result<Cow<'_, str>> {
    if !text.contains("${") {
        return Ok(Cow::Borrowed(text));
    }

    let mut missing: Option<String> = None;
    let expanded = ENV_REF.replace_all(text, |cap: &Captures<'_>| {
        let name = &cap[1];
        match (std::env::var(name), cap.get(2)) {
            (Ok(value), Some(default)) if value.is_empty() => default.as_str().to_string(),
            (Ok(value), _) => value,
            (Err(_), Some(default)) => {
                debug!(var = name, "env var not set, using default");
                default.as_str().to_string()
            }
            (Err(_), None) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    if let Some(name) = missing {
        bail!("Environment variable '{name}' is not set and no default provided");
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_references_is_borrowed() {
        let out = expand_env_vars("backend = \"native\"").unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn default_applies_when_unset() {
        let out = expand_env_vars("preset = \"${MESHLINT_TEST_UNSET_PRESET:-vehicles}\"").unwrap();
        assert_eq!(out, "preset = \"vehicles\"");
    }

    #[test]
    fn set_variable_is_substituted() {
        // PATH is set in every test environment.
        let path = std::env::var("PATH").unwrap();
        let out = expand_env_vars("x = \"${PATH}\"").unwrap();
        assert_eq!(out, format!("x = \"{path}\""));
    }

    #[test]
    fn unset_variable_without_default_is_an_error() {
        let err = expand_env_vars("x = \"${MESHLINT_TEST_DEFINITELY_UNSET}\"").unwrap_err();
        assert!(err.to_string().contains("MESHLINT_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn lone_dollar_is_left_alone() {
        let out = expand_env_vars("price = \"$5 ${MESHLINT_TEST_UNSET_X:-}\"").unwrap();
        assert_eq!(out, "price = \"$5 \"");
    }
}
