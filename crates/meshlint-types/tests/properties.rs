//! Property tests for meshlint-types.
//!
//! These cover the DTO invariants other crates lean on: result shape tagging,
//! offending counts, and config parsing defaults.

use proptest::prelude::*;

use meshlint_types::{
    Backend, CheckResult, ConfigFile, EntityComponents, EntityId, FailOn, ResultShape, Verbosity,
};

fn arb_entity() -> impl Strategy<Value = EntityId> {
    prop_oneof![
        "[A-F0-9]{8}".prop_map(EntityId::native),
        "/[a-z]{1,6}(/[a-z]{1,6}){0,3}".prop_map(EntityId::staged),
    ]
}

fn arb_components() -> impl Strategy<Value = Vec<EntityComponents>> {
    prop::collection::vec(
        (arb_entity(), prop::collection::vec(0u32..500, 0..12))
            .prop_map(|(entity, indices)| EntityComponents { entity, indices }),
        0..8,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn component_count_is_sum_of_index_lists(entries in arb_components()) {
        let expected: usize = entries.iter().map(|e| e.indices.len()).sum();
        let result = CheckResult::Components { entries };
        prop_assert_eq!(result.offending_count(), expected);
        prop_assert_eq!(result.shape(), ResultShape::Components);
        prop_assert_eq!(result.is_empty(), expected == 0);
    }

    #[test]
    fn node_results_keep_entity_order(entities in prop::collection::vec(arb_entity(), 0..16)) {
        let result = CheckResult::Nodes { entities: entities.clone() };
        let listed: Vec<EntityId> = result.entities().into_iter().cloned().collect();
        prop_assert_eq!(listed, entities);
    }

    #[test]
    fn json_shape_tag_matches_variant(entries in arb_components()) {
        let result = CheckResult::Components { entries };
        let json = serde_json::to_value(&result).expect("serialize");
        prop_assert_eq!(json["shape"].as_str(), Some("components"));
        let back: CheckResult = serde_json::from_value(json).expect("deserialize");
        prop_assert_eq!(back, result);
    }
}

#[test]
fn empty_config_parses_to_defaults() {
    let cfg: ConfigFile = toml::from_str("").expect("parse");
    assert_eq!(cfg, ConfigFile::default());
    assert!(cfg.selection.is_empty());
}

#[test]
fn config_parses_defaults_and_selection() {
    let cfg: ConfigFile = toml::from_str(
        r#"
includes = ["base.toml"]

[defaults]
backend = "both"
fail_on = "errors"
verbosity = "verbose"
preset = "vehicles"
max_items = 25

[selection]
only_categories = ["Topology"]
enable = ["duplicated_*"]
disable = ["poles"]
"#,
    )
    .expect("parse");

    assert_eq!(cfg.includes, vec!["base.toml".to_string()]);
    assert_eq!(cfg.defaults.backend, Some(Backend::Both));
    assert_eq!(cfg.defaults.fail_on, Some(FailOn::Errors));
    assert_eq!(cfg.defaults.verbosity, Some(Verbosity::Verbose));
    assert_eq!(cfg.defaults.preset.as_deref(), Some("vehicles"));
    assert_eq!(cfg.defaults.max_items, Some(25));
    assert_eq!(cfg.selection.only_categories, vec!["Topology".to_string()]);
    assert_eq!(cfg.selection.disable, vec!["poles".to_string()]);
    assert!(!cfg.selection.is_empty());
}

#[test]
fn built_in_config_targets_native_backend() {
    let cfg = ConfigFile::built_in();
    assert_eq!(cfg.defaults.backend, Some(Backend::Native));
    assert_eq!(cfg.defaults.fail_on, Some(FailOn::Findings));
    assert!(cfg.selection.is_empty());
}
