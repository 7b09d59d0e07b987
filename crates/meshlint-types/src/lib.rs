//! Data types (config + run receipts) for meshlint.
//!
//! This crate is intentionally "dumb": pure DTOs with serde + schemars.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Schema Identifiers ─────────────────────────────────────────
pub const RUN_SCHEMA_V1: &str = "meshlint.run.v1";

// ── Frozen Vocabulary ──────────────────────────────────────────
// Categories
pub const CATEGORY_GENERAL: &str = "General";
pub const CATEGORY_NAMING: &str = "Naming";
pub const CATEGORY_TOPOLOGY: &str = "Topology";
pub const CATEGORY_UVS: &str = "UVs";

// Reason tokens (snake_case)
pub const REASON_TRUNCATED: &str = "truncated";
pub const REASON_CHECK_ERRORS: &str = "check_errors";
pub const REASON_CANCELLED: &str = "cancelled";
pub const REASON_NO_CHECKS: &str = "no_checks_selected";

/// Which scene representation a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Native,
    Staged,
    /// Run every applicable check under both representations and merge.
    Both,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Native => "native",
            Backend::Staged => "staged",
            Backend::Both => "both",
        }
    }

    /// The concrete scene representations this selector expands to.
    pub fn scene_backends(self) -> &'static [SceneBackend] {
        match self {
            Backend::Native => &[SceneBackend::Native],
            Backend::Staged => &[SceneBackend::Staged],
            Backend::Both => &[SceneBackend::Native, SceneBackend::Staged],
        }
    }
}

impl From<SceneBackend> for Backend {
    fn from(value: SceneBackend) -> Self {
        match value {
            SceneBackend::Native => Backend::Native,
            SceneBackend::Staged => Backend::Staged,
        }
    }
}

/// A concrete scene representation: the live DAG scene or the USD-staged hierarchy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SceneBackend {
    Native,
    Staged,
}

impl SceneBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            SceneBackend::Native => "native",
            SceneBackend::Staged => "staged",
        }
    }
}

impl fmt::Display for SceneBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, stable identifier of a scene node.
///
/// `key` is a UUID for the native backend and a prim path for the staged one.
/// It is never a display name; use a scene's `resolve_name` for that.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct EntityId {
    pub backend: SceneBackend,
    pub key: String,
}

impl EntityId {
    pub fn native(key: impl Into<String>) -> Self {
        Self {
            backend: SceneBackend::Native,
            key: key.into(),
        }
    }

    pub fn staged(key: impl Into<String>) -> Self {
        Self {
            backend: SceneBackend::Staged,
            key: key.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// What a check inspects. Fixed per check; governs the result shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Node,
    Vertex,
    Edge,
    Face,
    Uv,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Vertex => "vertex",
            EntityKind::Edge => "edge",
            EntityKind::Face => "face",
            EntityKind::Uv => "uv",
        }
    }

    pub fn is_component(self) -> bool {
        !matches!(self, EntityKind::Node)
    }

    pub fn shape(self) -> ResultShape {
        if self.is_component() {
            ResultShape::Components
        } else {
            ResultShape::Nodes
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    Nodes,
    Components,
}

impl ResultShape {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultShape::Nodes => "nodes",
            ResultShape::Components => "components",
        }
    }
}

/// Offending component indices (local to the entity's mesh) for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntityComponents {
    pub entity: EntityId,
    pub indices: Vec<u32>,
}

/// Output of one check: a flat entity list, or per-entity component indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum CheckResult {
    Nodes { entities: Vec<EntityId> },
    Components { entries: Vec<EntityComponents> },
}

impl CheckResult {
    pub fn empty(shape: ResultShape) -> Self {
        match shape {
            ResultShape::Nodes => CheckResult::Nodes {
                entities: Vec::new(),
            },
            ResultShape::Components => CheckResult::Components {
                entries: Vec::new(),
            },
        }
    }

    pub fn shape(&self) -> ResultShape {
        match self {
            CheckResult::Nodes { .. } => ResultShape::Nodes,
            CheckResult::Components { .. } => ResultShape::Components,
        }
    }

    /// Number of offending items: entities for node results, indices for component results.
    pub fn offending_count(&self) -> usize {
        match self {
            CheckResult::Nodes { entities } => entities.len(),
            CheckResult::Components { entries } => entries.iter().map(|e| e.indices.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offending_count() == 0
    }

    /// Entities mentioned by this result, in result order.
    pub fn entities(&self) -> Vec<&EntityId> {
        match self {
            CheckResult::Nodes { entities } => entities.iter().collect(),
            CheckResult::Components { entries } => entries.iter().map(|e| &e.entity).collect(),
        }
    }
}

/// Progress counters handed to an optional progress sink after each check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ProgressUpdate {
    pub checks_total: u32,
    pub checks_done: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities_done: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The check returned an error.
    Failed,
    /// The check panicked; the panic was contained at the runner boundary.
    Panicked,
    /// The check returned a result that contradicts its declared entity kind.
    InvalidResult,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Failed => "failed",
            FailureKind::Panicked => "panicked",
            FailureKind::InvalidResult => "invalid_result",
        }
    }
}

/// Captured description of a single check that could not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

/// Timing metrics for performance analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimingMetrics {
    pub total_ms: u64,
    pub enumerate_ms: u64,
    pub checks_ms: u64,
}

/// The runner's combined output for one run.
///
/// `results` only contains checks that ran and produced a well-shaped result;
/// skipped checks appear nowhere and failed checks appear only in `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateResult {
    pub backend: Backend,
    pub results: BTreeMap<String, CheckResult>,
    pub errors: BTreeMap<String, CheckFailure>,
    pub entities_considered: u32,
    pub progress: ProgressUpdate,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,
}

impl AggregateResult {
    pub fn empty(backend: Backend) -> Self {
        Self {
            backend,
            results: BTreeMap::new(),
            errors: BTreeMap::new(),
            entities_considered: 0,
            progress: ProgressUpdate::default(),
            cancelled: false,
            timing: None,
        }
    }

    /// Names of checks whose result flagged at least one item.
    pub fn failing_checks(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|(_, r)| !r.is_empty())
            .map(|(name, _)| name.as_str())
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ── Receipt ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SceneMeta {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub backend: Backend,
    pub entities_considered: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Error,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckOutcome {
    pub name: String,
    pub label: String,
    pub category: String,
    pub entity_kind: EntityKind,
    pub status: CheckStatus,
    /// Offending items before truncation.
    pub count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
    /// At least one check could not run to completion.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct VerdictCounts {
    pub passed: u32,
    pub failed: u32,
    pub errored: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub counts: VerdictCounts,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunReceipt {
    pub schema: String,
    pub tool: ToolMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    pub scene: SceneMeta,
    pub checks: Vec<CheckOutcome>,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMetrics>,
}

// ── Configuration ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailOn {
    /// Fail when any check flags an item or errors.
    Findings,
    /// Fail only when a check could not run.
    Errors,
    Never,
}

impl FailOn {
    pub fn as_str(self) -> &'static str {
        match self {
            FailOn::Findings => "findings",
            FailOn::Errors => "errors",
            FailOn::Never => "never",
        }
    }
}

/// Report detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Overview,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn as_str(self) -> &'static str {
        match self {
            Verbosity::Overview => "overview",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
        }
    }
}

/// The on-disk configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ConfigFile {
    /// Include other config files. Paths are relative to this config file's directory.
    /// Later files override defaults and extend selection lists.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<FailOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,
    /// Name of a built-in check-selection preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Maximum number of display items kept per check in the receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

/// Which registered checks a run selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct SelectionConfig {
    /// Only run checks in one of these categories (case-insensitive).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub only_categories: Vec<String>,
    /// Skip checks in any of these categories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disable_categories: Vec<String>,
    /// Check-name globs added even when `only_categories` excludes them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enable: Vec<String>,
    /// Check-name globs to skip. Applied last.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disable: Vec<String>,
}

impl SelectionConfig {
    pub fn is_empty(&self) -> bool {
        self.only_categories.is_empty()
            && self.disable_categories.is_empty()
            && self.enable.is_empty()
            && self.disable.is_empty()
    }
}

impl ConfigFile {
    /// Configuration used when no config file is present: every check, native backend.
    pub fn built_in() -> Self {
        Self {
            includes: vec![],
            defaults: Defaults {
                backend: Some(Backend::Native),
                fail_on: Some(FailOn::Findings),
                verbosity: Some(Verbosity::Normal),
                preset: None,
                max_items: Some(1000),
            },
            selection: SelectionConfig::default(),
        }
    }
}
