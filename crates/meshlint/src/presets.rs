//! Built-in check-selection presets.
//!
//! A preset only chooses which checks run. Explicit selection from the config
//! file and the command line is layered on top of it.

use clap::ValueEnum;

use meshlint_types::{CATEGORY_GENERAL, CATEGORY_NAMING, CATEGORY_TOPOLOGY, SelectionConfig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Every registered check.
    #[default]
    Full,
    /// Organic assets: everything except ground placement.
    CharacterModeling,
    /// Set dressing: no UV checks; triangulated, deeply grouped assets are expected.
    Environment,
    /// Hard-surface assets: hard edges, poles and triangles are expected.
    Vehicles,
}

impl Preset {
    pub fn name(self) -> &'static str {
        match self {
            Preset::Full => "full",
            Preset::CharacterModeling => "character-modeling",
            Preset::Environment => "environment",
            Preset::Vehicles => "vehicles",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Preset::Full => "Every registered check",
            Preset::CharacterModeling => "Organic assets; ground placement is not checked",
            Preset::Environment => "Set dressing; UV, triangle, pole and depth checks are skipped",
            Preset::Vehicles => "Hard-surface assets; skips hard edge, pole and triangle checks",
        }
    }

    /// Look a preset up by the name used in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::value_variants()
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn selection(self) -> SelectionConfig {
        let disable: &[&str] = match self {
            Preset::Full => &[],
            Preset::CharacterModeling => &["on_grid"],
            Preset::Environment => &["triangles", "poles", "hierarchy_depth"],
            Preset::Vehicles => &["hard_edges", "poles", "triangles"],
        };
        let only_categories: &[&str] = match self {
            Preset::Environment => &[CATEGORY_GENERAL, CATEGORY_NAMING, CATEGORY_TOPOLOGY],
            _ => &[],
        };
        SelectionConfig {
            only_categories: only_categories.iter().map(|s| s.to_string()).collect(),
            disable: disable.iter().map(|s| s.to_string()).collect(),
            ..SelectionConfig::default()
        }
    }

    /// Starter `meshlint.toml` content for this preset.
    pub fn generate(self) -> String {
        format!(
            r#"# meshlint configuration ({name} preset)
# {description}.
#
# Run `meshlint checks` to list every check and `meshlint explain <check>`
# for details on one.

# includes = ["studio.toml"]

[defaults]
backend = "native"
fail_on = "findings"
verbosity = "normal"
preset = "{name}"
max_items = 1000

[selection]
# only_categories = ["Topology", "UVs"]
# disable_categories = []
# enable = ["default_shader"]
# disable = ["zero_*"]
"#,
            name = self.name(),
            description = self.description()
        )
    }
}
