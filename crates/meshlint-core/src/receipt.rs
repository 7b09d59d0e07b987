//! Turning an aggregate result into a run receipt.

use meshlint_domain::Check;
use meshlint_scene::SceneEnumerator;
use meshlint_types::{
    AggregateResult, CheckOutcome, CheckResult, CheckStatus, EntityId, EntityKind,
    FailOn, REASON_CANCELLED, REASON_CHECK_ERRORS, REASON_NO_CHECKS, REASON_TRUNCATED,
    RUN_SCHEMA_V1, RunReceipt, SceneBackend, SceneMeta, ToolMeta, Verdict, VerdictCounts,
    VerdictStatus,
};

/// Display-name lookup for report items.
///
/// Ids whose backend has no scene here resolve to the raw id.
pub struct SceneNames<'s> {
    scenes: Vec<Box<dyn SceneEnumerator + 's>>,
}

impl<'s> SceneNames<'s> {
    /// Resolve names through scenes that are already enumerated.
    pub fn from_scenes(scenes: Vec<Box<dyn SceneEnumerator + 's>>) -> Self {
        Self { scenes }
    }

    /// A lookup with no scenes: every id resolves to itself.
    pub fn raw() -> Self {
        Self { scenes: Vec::new() }
    }

    pub fn resolve(&self, id: &EntityId) -> String {
        self.scenes
            .iter()
            .find(|s| s.backend() == id.backend)
            .map(|s| s.resolve_name(id))
            .unwrap_or_else(|| id.key.clone())
    }
}

/// Component accessor appended to a display name, per backend convention.
pub fn component_suffix(backend: SceneBackend, kind: EntityKind) -> &'static str {
    match (backend, kind) {
        (_, EntityKind::Node) => "",
        (SceneBackend::Native, EntityKind::Vertex) => "vtx",
        (SceneBackend::Native, EntityKind::Edge) => "e",
        (SceneBackend::Native, EntityKind::Face) => "f",
        (SceneBackend::Native, EntityKind::Uv) => "map",
        (SceneBackend::Staged, EntityKind::Vertex) => "points",
        (SceneBackend::Staged, EntityKind::Edge) => "edges",
        (SceneBackend::Staged, EntityKind::Face) => "faces",
        (SceneBackend::Staged, EntityKind::Uv) => "st",
    }
}

/// Display strings for every offending item, in result order.
pub fn display_items(result: &CheckResult, kind: EntityKind, names: &SceneNames<'_>) -> Vec<String> {
    match result {
        CheckResult::Nodes { entities } => entities.iter().map(|id| names.resolve(id)).collect(),
        CheckResult::Components { entries } => entries
            .iter()
            .flat_map(|entry| {
                let name = names.resolve(&entry.entity);
                let suffix = component_suffix(entry.entity.backend, kind);
                entry
                    .indices
                    .iter()
                    .map(move |i| format!("{name}.{suffix}[{i}]"))
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptOptions {
    pub source: String,
    pub digest: Option<String>,
    pub started_at: Option<String>,
    /// Items kept per check; the count still reflects every item.
    pub max_items: usize,
}

impl Default for ReceiptOptions {
    fn default() -> Self {
        Self {
            source: String::new(),
            digest: None,
            started_at: None,
            max_items: 1000,
        }
    }
}

/// Build the receipt for the checks that executed, in the order of `checks`.
pub fn build_receipt(
    agg: &AggregateResult,
    checks: &[Check],
    names: &SceneNames<'_>,
    opts: &ReceiptOptions,
) -> RunReceipt {
    let mut outcomes = Vec::new();
    let mut counts = VerdictCounts::default();
    let mut truncated = false;

    for check in checks {
        let base = |status, count, items, error| CheckOutcome {
            name: check.name.to_string(),
            label: check.label.to_string(),
            category: check.category.to_string(),
            entity_kind: check.entity_kind,
            status,
            count,
            items,
            error,
        };

        if let Some(failure) = agg.errors.get(check.name) {
            counts.errored += 1;
            outcomes.push(base(CheckStatus::Error, 0, Vec::new(), Some(failure.to_string())));
        } else if let Some(result) = agg.results.get(check.name) {
            let count = result.offending_count() as u32;
            let mut items = display_items(result, check.entity_kind, names);
            if items.len() > opts.max_items {
                items.truncate(opts.max_items);
                truncated = true;
            }
            let status = if count > 0 {
                counts.failed += 1;
                CheckStatus::Fail
            } else {
                counts.passed += 1;
                CheckStatus::Pass
            };
            outcomes.push(base(status, count, items, None));
        }
    }

    let status = if counts.errored > 0 {
        VerdictStatus::Error
    } else if counts.failed > 0 {
        VerdictStatus::Fail
    } else {
        VerdictStatus::Pass
    };

    let mut reasons = Vec::new();
    if counts.errored > 0 {
        reasons.push(REASON_CHECK_ERRORS.to_string());
    }
    if truncated {
        reasons.push(REASON_TRUNCATED.to_string());
    }
    if agg.cancelled {
        reasons.push(REASON_CANCELLED.to_string());
    }
    if checks.is_empty() {
        reasons.push(REASON_NO_CHECKS.to_string());
    }

    RunReceipt {
        schema: RUN_SCHEMA_V1.to_string(),
        tool: ToolMeta {
            name: "meshlint".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at: opts.started_at.clone(),
        scene: SceneMeta {
            source: opts.source.clone(),
            digest: opts.digest.clone(),
            backend: agg.backend,
            entities_considered: agg.entities_considered,
        },
        checks: outcomes,
        verdict: Verdict {
            status,
            counts,
            reasons,
        },
        timing: agg.timing.clone(),
    }
}

/// Process exit code for a verdict: 0 clean, 2 failing checks, 3 check errors.
pub fn compute_exit_code(fail_on: FailOn, verdict: &Verdict) -> i32 {
    if matches!(fail_on, FailOn::Never) {
        return 0;
    }

    if verdict.counts.errored > 0 {
        return 3;
    }

    if matches!(fail_on, FailOn::Findings) && verdict.counts.failed > 0 {
        return 2;
    }

    0
}
