#![allow(clippy::collapsible_if)]

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use meshlint_core::{
    ReceiptOptions, Runner, build_receipt, compute_exit_code,
    render_junit_for_receipt, render_markdown_for_receipt, select_checks,
};
use meshlint_domain::{Check, Registry};
use meshlint_scene::{SceneDocument, SceneFile, SceneSource};
use meshlint_types::{
    Backend, ConfigFile, FailOn, RunReceipt, SelectionConfig, Verbosity,
};

mod config_loader;
mod env_expand;
mod presets;

use config_loader::{load_config_with_includes, merge_configs, merge_selection};
use env_expand::expand_env_vars;
use presets::Preset;

const DEFAULT_CONFIG: &str = "meshlint.toml";

#[derive(Parser)]
#[command(name = "meshlint")]
#[command(about = "Quality checks for 3D scene assets", long_about = None)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the selected checks against a scene document.
    Run(Box<RunArgs>),

    /// List the registered checks.
    Checks(ChecksArgs),

    /// Show detailed information about a specific check.
    Explain(ExplainArgs),

    /// Validate the configuration file (presets, categories and globs).
    Validate(ValidateArgs),

    /// Initialize a new meshlint.toml configuration file.
    Init(InitArgs),

    /// Print a JSON Schema for one of the file formats.
    Schema(SchemaArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Scene document to check (.json, or .toml by extension).
    scene: PathBuf,

    /// Scene representation to check (defaults to config, else native).
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Path to a config file. If omitted, uses ./meshlint.toml if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check-selection preset (overrides the config preset).
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Only run checks in this category (repeatable, case-insensitive).
    #[arg(long = "only-category", action = clap::ArgAction::Append)]
    only_category: Vec<String>,

    /// Skip checks in this category (repeatable).
    #[arg(long = "disable-category", action = clap::ArgAction::Append)]
    disable_category: Vec<String>,

    /// Check-name glob to run even outside --only-category (repeatable).
    #[arg(long, action = clap::ArgAction::Append)]
    enable: Vec<String>,

    /// Check-name glob to skip (repeatable). Applied last.
    #[arg(long, action = clap::ArgAction::Append)]
    disable: Vec<String>,

    /// Where to write the JSON receipt.
    #[arg(long, default_value = "artifacts/meshlint/receipt.json")]
    out: PathBuf,

    /// Also write a Markdown report here.
    #[arg(long)]
    md: Option<PathBuf>,

    /// Also write a JUnit XML report here.
    #[arg(long)]
    junit: Option<PathBuf>,

    /// Markdown detail level (defaults to config, else normal).
    #[arg(long, value_enum)]
    verbosity: Option<VerbosityArg>,

    /// When to exit non-zero (defaults to config, else findings).
    #[arg(long, value_enum)]
    fail_on: Option<FailOnArg>,

    /// Display items kept per check in the receipt (defaults to config, else 1000).
    #[arg(long)]
    max_items: Option<usize>,

    /// Do not print the Markdown report to stdout.
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Parser, Debug)]
struct ChecksArgs {
    /// Only list checks in this category.
    #[arg(long)]
    category: Option<String>,

    #[arg(long, value_enum, default_value_t = ListFormat::Text)]
    format: ListFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ListFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
struct ExplainArgs {
    /// The check name to explain (e.g., "non_manifold_edges").
    check: String,
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Configuration preset to use.
    ///
    /// Available presets:
    /// - full: every registered check (default)
    /// - character-modeling: organic assets
    /// - environment: set dressing
    /// - vehicles: hard-surface assets
    #[arg(long, short, value_enum, default_value_t = Preset::Full)]
    preset: Preset,

    /// Output path for the configuration file.
    #[arg(long, short, default_value = DEFAULT_CONFIG)]
    output: PathBuf,

    /// Overwrite existing configuration file without prompting.
    #[arg(long, short)]
    force: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Path to a config file. If omitted, uses ./meshlint.toml if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable strict mode: also report selections that have no effect.
    #[arg(long)]
    strict: bool,

    /// Output format for validation results.
    #[arg(long, value_enum, default_value_t = ListFormat::Text)]
    format: ListFormat,
}

#[derive(Parser, Debug)]
struct SchemaArgs {
    /// Which document to describe.
    #[arg(value_enum)]
    kind: SchemaKind,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaKind {
    Config,
    Scene,
    Receipt,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Native,
    Staged,
    Both,
}

impl From<BackendArg> for Backend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Native => Backend::Native,
            BackendArg::Staged => Backend::Staged,
            BackendArg::Both => Backend::Both,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VerbosityArg {
    Overview,
    Normal,
    Verbose,
}

impl From<VerbosityArg> for Verbosity {
    fn from(v: VerbosityArg) -> Self {
        match v {
            VerbosityArg::Overview => Verbosity::Overview,
            VerbosityArg::Normal => Verbosity::Normal,
            VerbosityArg::Verbose => Verbosity::Verbose,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FailOnArg {
    Findings,
    Errors,
    Never,
}

impl From<FailOnArg> for FailOn {
    fn from(v: FailOnArg) -> Self {
        match v {
            FailOnArg::Findings => FailOn::Findings,
            FailOnArg::Errors => FailOn::Errors,
            FailOnArg::Never => FailOn::Never,
        }
    }
}

#[cfg(not(test))]
fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Run(args) => cmd_run(*args),
        Commands::Checks(args) => {
            cmd_checks(args)?;
            Ok(0)
        }
        Commands::Explain(args) => {
            cmd_explain(args)?;
            Ok(0)
        }
        Commands::Validate(args) => cmd_validate(args),
        Commands::Init(args) => {
            cmd_init(args)?;
            Ok(0)
        }
        Commands::Schema(args) => {
            cmd_schema(args)?;
            Ok(0)
        }
    }
}

/// Initialize tracing/logging based on CLI flags.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn builtin_registry() -> Result<Registry> {
    Registry::builtin().context("build check registry")
}

// ── run ────────────────────────────────────────────────────────

/// Effective settings for one run after layering CLI over config over built-ins.
#[derive(Debug, Clone, PartialEq)]
struct RunSettings {
    backend: Backend,
    fail_on: FailOn,
    verbosity: Verbosity,
    max_items: usize,
    preset: Option<Preset>,
    selection: SelectionConfig,
}

fn resolve_settings(args: &RunArgs, cfg: &ConfigFile) -> Result<RunSettings> {
    let defaults = &cfg.defaults;

    let preset = match (args.preset, defaults.preset.as_deref()) {
        (Some(p), _) => Some(p),
        (None, Some(name)) => Some(
            Preset::from_name(name)
                .with_context(|| format!("unknown preset '{name}' in config defaults"))?,
        ),
        (None, None) => None,
    };

    let mut selection = preset.map(Preset::selection).unwrap_or_default();
    selection = merge_selection(selection, cfg.selection.clone());
    selection = merge_selection(
        selection,
        SelectionConfig {
            only_categories: args.only_category.clone(),
            disable_categories: args.disable_category.clone(),
            enable: args.enable.clone(),
            disable: args.disable.clone(),
        },
    );

    Ok(RunSettings {
        backend: args
            .backend
            .map(Backend::from)
            .or(defaults.backend)
            .unwrap_or(Backend::Native),
        fail_on: args
            .fail_on
            .map(FailOn::from)
            .or(defaults.fail_on)
            .unwrap_or(FailOn::Findings),
        verbosity: args
            .verbosity
            .map(Verbosity::from)
            .or(defaults.verbosity)
            .unwrap_or(Verbosity::Normal),
        max_items: args.max_items.or(defaults.max_items).unwrap_or(1000),
        preset,
        selection,
    })
}

fn cmd_run(args: RunArgs) -> Result<i32> {
    let started_at = Utc::now();

    let cfg = load_config(args.config.clone())?;
    let settings = resolve_settings(&args, &cfg)?;
    debug!(?settings, "resolved run settings");

    let registry = builtin_registry()?;
    let checks = select_checks(&registry, &settings.selection).context("select checks")?;
    info!(
        selected = checks.len(),
        registered = registry.len(),
        preset = settings.preset.map(Preset::name).unwrap_or("none"),
        "checks selected"
    );

    let scene = SceneFile::read(&args.scene)
        .with_context(|| format!("load scene {}", args.scene.display()))?;

    let (agg, names) = Runner::new(&scene)
        .with_progress(|p| debug!(done = p.checks_done, total = p.checks_total, "progress"))
        .run_with_names(settings.backend, &checks)
        .context("run checks")?;

    let opts = ReceiptOptions {
        source: scene.label(),
        digest: Some(sha256_hex(scene.bytes())),
        started_at: Some(started_at.to_rfc3339()),
        max_items: settings.max_items,
    };
    let receipt = build_receipt(&agg, &checks, &names, &opts);

    write_outputs(&args, &settings, &receipt)?;

    let exit_code = compute_exit_code(settings.fail_on, &receipt.verdict);
    info!(
        verdict = ?receipt.verdict.status,
        exit_code,
        "run complete"
    );
    Ok(exit_code)
}

fn write_outputs(args: &RunArgs, settings: &RunSettings, receipt: &RunReceipt) -> Result<()> {
    write_json(&args.out, receipt)?;

    let md = render_markdown_for_receipt(receipt, settings.verbosity);
    if let Some(path) = &args.md {
        write_text(path, &md)?;
    }
    if let Some(path) = &args.junit {
        write_text(path, &render_junit_for_receipt(receipt))?;
    }
    if !args.quiet {
        print!("{md}");
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(bytes))
}

// ── checks / explain ───────────────────────────────────────────

fn backends_label(check: &Check) -> &'static str {
    check.supported_backends().map(Backend::as_str).unwrap_or("none")
}

fn cmd_checks(args: ChecksArgs) -> Result<()> {
    let registry = builtin_registry()?;

    let groups: Vec<_> = registry
        .by_category()
        .into_iter()
        .filter(|(category, _)| {
            args.category
                .as_deref()
                .is_none_or(|wanted| wanted.eq_ignore_ascii_case(category))
        })
        .collect();

    if groups.is_empty() {
        if let Some(wanted) = &args.category {
            bail!(
                "Unknown category '{}'. Known categories: {}",
                wanted,
                registry.categories().join(", ")
            );
        }
    }

    match args.format {
        ListFormat::Json => {
            let list: Vec<serde_json::Value> = groups
                .iter()
                .flat_map(|(_, checks)| checks.iter())
                .map(|c| {
                    serde_json::json!({
                        "name": c.name,
                        "label": c.label,
                        "category": c.category,
                        "entity_kind": c.entity_kind.as_str(),
                        "backends": backends_label(c),
                        "description": c.description,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        ListFormat::Text => {
            for (category, checks) in &groups {
                println!("{category}");
                for c in checks {
                    println!(
                        "  {:<24} {:<7} {:<7} {}",
                        c.name,
                        c.entity_kind.as_str(),
                        backends_label(c),
                        c.label
                    );
                }
            }
        }
    }
    Ok(())
}

fn cmd_explain(args: ExplainArgs) -> Result<()> {
    let registry = builtin_registry()?;

    match registry.get(&args.check) {
        Some(check) => {
            print!("{}", format_check_explanation(check));
            Ok(())
        }
        None => {
            let suggestions = find_similar_checks(&args.check, registry.all_checks());
            let mut msg = format!("Check '{}' not found.", args.check);

            if !suggestions.is_empty() {
                msg.push_str("\n\nDid you mean one of these?\n");
                for s in &suggestions {
                    msg.push_str(&format!("  - {s}\n"));
                }
            }

            msg.push_str("\nUse 'meshlint checks' to list all available checks.");

            bail!("{}", msg);
        }
    }
}

fn format_check_explanation(check: &Check) -> String {
    let mut out = String::new();
    out.push_str(&format!("Check: {}\n", check.name));
    out.push_str(&format!("Label: {}\n", check.label));
    out.push_str(&format!("Category: {}\n", check.category));
    out.push_str(&format!("Reports: {}\n", check.entity_kind.as_str()));
    out.push_str(&format!("Backends: {}\n", backends_label(check)));
    if !check.description.is_empty() {
        out.push_str(&format!("\n{}\n", check.description));
    }
    out
}

/// Check names close to `name`, best match first.
fn find_similar_checks(name: &str, checks: &[Check]) -> Vec<String> {
    let wanted = name.to_lowercase();
    let mut candidates: Vec<(&str, usize)> = Vec::new();

    for c in checks {
        if c.name.starts_with(&wanted) || wanted.starts_with(c.name) {
            candidates.push((c.name, 0));
        } else if c.name.contains(&wanted) || wanted.contains(c.name) {
            candidates.push((c.name, 1));
        } else {
            let distance = simple_edit_distance(&wanted, c.name);
            if distance <= 3 {
                candidates.push((c.name, distance + 2));
            }
        }
    }

    candidates.sort_by_key(|(_, score)| *score);
    candidates.truncate(5);
    candidates.into_iter().map(|(n, _)| n.to_string()).collect()
}

fn simple_edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

// ── validate ───────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn validate_config(cfg: &ConfigFile, registry: &Registry, strict: bool) -> Findings {
    let mut f = Findings::default();
    let known = registry.categories();

    if let Some(name) = cfg.defaults.preset.as_deref() {
        if Preset::from_name(name).is_none() {
            f.errors.push(format!("Unknown preset '{name}'"));
        }
    }

    let sel = &cfg.selection;
    for (field, categories) in [
        ("only_categories", &sel.only_categories),
        ("disable_categories", &sel.disable_categories),
    ] {
        for category in categories {
            if !known.iter().any(|k| k.eq_ignore_ascii_case(category)) {
                f.errors.push(format!(
                    "{field}: unknown category '{category}' (known: {})",
                    known.join(", ")
                ));
            }
        }
    }

    for (field, globs) in [("enable", &sel.enable), ("disable", &sel.disable)] {
        for glob in globs {
            match globset::Glob::new(glob) {
                Err(e) => f.errors.push(format!("{field}: invalid glob '{glob}': {e}")),
                Ok(g) if strict => {
                    let matcher = g.compile_matcher();
                    if !registry.all_checks().iter().any(|c| matcher.is_match(c.name)) {
                        f.warnings
                            .push(format!("{field}: glob '{glob}' matches no check"));
                    }
                }
                Ok(_) => {}
            }
        }
    }

    if strict {
        if !sel.enable.is_empty() && sel.only_categories.is_empty() {
            f.warnings
                .push("enable has no effect without only_categories".to_string());
        }
        if cfg.defaults.max_items == Some(0) {
            f.warnings
                .push("max_items = 0 keeps no display items".to_string());
        }
    }

    if f.errors.is_empty() {
        let preset = cfg.defaults.preset.as_deref().and_then(Preset::from_name);
        let effective = merge_selection(
            preset.map(Preset::selection).unwrap_or_default(),
            sel.clone(),
        );
        match select_checks(registry, &effective) {
            Ok(checks) if checks.is_empty() => {
                f.warnings.push("Selection matches no checks".to_string());
            }
            Ok(_) => {}
            Err(e) => f.errors.push(format!("Selection error: {e}")),
        }
    }

    f
}

fn cmd_validate(args: ValidateArgs) -> Result<i32> {
    info!("Validating configuration file");

    let Some(path) = args.config.clone().or_else(default_config_path) else {
        bail!("No configuration file found. Specify --config or create {DEFAULT_CONFIG}");
    };

    let cfg = load_config_with_includes(&path, expand_env_vars)?;
    let registry = builtin_registry()?;
    let Findings { errors, warnings } = validate_config(&cfg, &registry, args.strict);

    match args.format {
        ListFormat::Json => {
            let result = serde_json::json!({
                "valid": errors.is_empty(),
                "path": path.display().to_string(),
                "errors": errors,
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        ListFormat::Text => {
            println!("Validating {}...", path.display());
            println!();

            if !warnings.is_empty() {
                println!("Warnings ({}):", warnings.len());
                for (i, warn) in warnings.iter().enumerate() {
                    println!("  {}. {}", i + 1, warn);
                }
                println!();
            }

            if errors.is_empty() {
                println!("Configuration is valid!");
            } else {
                println!("Configuration has {} error(s):", errors.len());
                println!();
                for (i, err) in errors.iter().enumerate() {
                    println!("  {}. {}", i + 1, err);
                }
            }
        }
    }

    if errors.is_empty() { Ok(0) } else { Ok(1) }
}

// ── init / schema ──────────────────────────────────────────────

fn confirm_overwrite<R: BufRead, W: Write>(
    input: &mut R,
    mut err: W,
    output_path: &Path,
) -> Result<bool> {
    write!(
        err,
        "Configuration file '{}' already exists. Overwrite? [y/N] ",
        output_path.display()
    )
    .context("write prompt")?;
    err.flush().context("flush stderr")?;

    let mut line = String::new();
    input.read_line(&mut line).context("read stdin")?;

    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn cmd_init(args: InitArgs) -> Result<()> {
    let mut input = io::stdin().lock();
    cmd_init_with_io(args, &mut input, io::stderr())
}

fn cmd_init_with_io<R: BufRead, W: Write>(args: InitArgs, input: &mut R, err: W) -> Result<()> {
    let output_path = &args.output;

    if output_path.exists() && !args.force && !confirm_overwrite(input, err, output_path)? {
        println!("Aborted.");
        return Ok(());
    }

    write_text(output_path, &args.preset.generate())?;

    println!(
        "Created {} with '{}' preset.",
        output_path.display(),
        args.preset.name()
    );
    println!();
    println!("Next steps:");
    println!("  1. Review the selection in {}", output_path.display());
    println!("  2. Run 'meshlint run <scene>' to check a scene");
    println!();
    println!("Available presets:");
    for preset in Preset::value_variants() {
        println!("  - {:<20} {}", preset.name(), preset.description());
    }

    Ok(())
}

fn cmd_schema(args: SchemaArgs) -> Result<()> {
    let schema = match args.kind {
        SchemaKind::Config => schemars::schema_for!(ConfigFile),
        SchemaKind::Scene => schemars::schema_for!(SceneDocument),
        SchemaKind::Receipt => schemars::schema_for!(RunReceipt),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&schema).context("render schema")?
    );
    Ok(())
}

// ── config and output helpers ──────────────────────────────────

fn default_config_path() -> Option<PathBuf> {
    let p = PathBuf::from(DEFAULT_CONFIG);
    if p.exists() { Some(p) } else { None }
}

/// The user config (if any) layered over the built-in configuration.
fn load_config(path: Option<PathBuf>) -> Result<ConfigFile> {
    let Some(path) = path.or_else(default_config_path) else {
        debug!("No config file found, using built-in configuration");
        return Ok(ConfigFile::built_in());
    };

    info!("Loading config from: {}", path.display());
    let user = load_config_with_includes(&path, expand_env_vars)?;
    Ok(merge_configs(ConfigFile::built_in(), user))
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serialize receipt")?;
    create_parent(path)?;
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    create_parent(path)?;
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
    }
    Ok(())
}
