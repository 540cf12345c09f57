// crates/lootforge-cli/src/main.rs
// ============================================================================
// Module: LootForge CLI Entry Point
// Description: Command dispatcher for the full pipeline: init, plan,
//   validate, generate, regenerate, process, atlas, eval, review, select,
//   package.
// Purpose: Thin boundary that wires each stage crate's entry point to
//   stdin/stdout/exit-code conventions; owns no pipeline logic itself.
// Dependencies: clap, lootforge-core, lootforge-manifest, lootforge-config,
//   lootforge-providers, lootforge-generate, lootforge-process,
//   lootforge-eval, lootforge-select, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! Every subcommand reads its input artifacts from disk, calls exactly one
//! stage crate entry point, writes its output artifact(s), prints a
//! one-line pass/fail/warn summary, and maps the result to an exit code:
//! `0` success, `1` stage failure or validation error, higher codes
//! reserved for contract violations (never actually raised here — a
//! contract violation always surfaces as a stage failure today).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use lootforge_config::adapter_config;
use lootforge_config::adapter_config::AdapterMode;
use lootforge_config::adapter_config::AdapterName;
use lootforge_config::env::ProcessEnv;
use lootforge_config::provider_config;
use lootforge_config::provider_config::ManifestProviderOverrides;
use lootforge_core::contract::acceptance::AcceptanceReport;
use lootforge_core::contract::eval::EvalReport;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::selection_lock::SelectionLock;
use lootforge_core::contract::targets_index::TargetsIndex;
use lootforge_core::hashing::hash_canonical_json;
use lootforge_core::identifiers::ProviderName;
use lootforge_core::time::SystemClock;
use lootforge_manifest::authored::Manifest;
use lootforge_providers::ProviderRegistry;
use lootforge_providers::ReqwestTransport;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "lootforge", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = clap::ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands, one per pipeline stage.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Writes a minimal starter manifest to disk.
    Init(InitCommand),
    /// Normalizes a manifest into a validated targets index.
    Plan(PlanCommand),
    /// Runs manifest validation without producing a targets index.
    Validate(ValidateCommand),
    /// Dispatches every planned target's provider job.
    Generate(GenerateCommand),
    /// Regenerates a named subset of locked targets from their approved
    /// selection.
    Regenerate(RegenerateCommand),
    /// Runs the post-process pipeline over a provenance run's selections.
    Process(ProcessCommand),
    /// Resolves atlas group membership against a targets index.
    Atlas(AtlasCommand),
    /// Scores and checks pack invariants over a provenance/acceptance pair.
    Eval(EvalCommand),
    /// Emits a consolidated review document for human inspection.
    Review(ReviewCommand),
    /// Builds or merges this run's selection lock.
    Select(SelectCommand),
    /// Assembles the final shippable catalog from a selection lock.
    Package(PackageCommand),
}

// ============================================================================
// SECTION: Command Argument Structs
// ============================================================================

/// Arguments for `init`.
#[derive(Args, Debug)]
struct InitCommand {
    /// Path the starter manifest is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
    /// Pack identity name.
    #[arg(long, default_value = "untitled-pack")]
    pack: String,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
struct PlanCommand {
    /// Path to the authored manifest JSON file.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Output root every target's `out` resolves inside.
    #[arg(long, value_name = "DIR")]
    out_root: PathBuf,
    /// Path the resulting targets-index JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
    /// Provider used for targets that omit one, overriding manifest
    /// defaults.
    #[arg(long, value_parser = parse_provider_arg)]
    provider: Option<ProviderName>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Path to the authored manifest JSON file.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Output root every target's `out` resolves inside.
    #[arg(long, value_name = "DIR")]
    out_root: PathBuf,
}

/// Arguments for `generate`.
#[derive(Args, Debug)]
struct GenerateCommand {
    /// Path to the targets-index JSON produced by `plan`.
    #[arg(long, value_name = "PATH")]
    targets_index: PathBuf,
    /// Directory raw provider candidates are written under.
    #[arg(long, value_name = "DIR")]
    raw_output_dir: PathBuf,
    /// Path the resulting provenance-run JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
    /// Prior selection lock; when present, locked targets are skipped.
    #[arg(long, value_name = "PATH")]
    lock: Option<PathBuf>,
}

/// Arguments for `regenerate`.
#[derive(Args, Debug)]
struct RegenerateCommand {
    /// Path to the targets-index JSON produced by `plan`.
    #[arg(long, value_name = "PATH")]
    targets_index: PathBuf,
    /// Path to the selection lock the named targets must already appear in.
    #[arg(long, value_name = "PATH")]
    lock: PathBuf,
    /// Directory raw provider candidates are written under.
    #[arg(long, value_name = "DIR")]
    raw_output_dir: PathBuf,
    /// Output root the locked selections were written under.
    #[arg(long, value_name = "DIR")]
    out_root: PathBuf,
    /// Path the resulting provenance-run JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
    /// Target ids to regenerate.
    #[arg(long = "target", value_name = "ID", required = true)]
    targets: Vec<String>,
}

/// Arguments for `process`.
#[derive(Args, Debug)]
struct ProcessCommand {
    /// Path to the targets-index JSON produced by `plan`.
    #[arg(long, value_name = "PATH")]
    targets_index: PathBuf,
    /// Path to the provenance-run JSON produced by `generate`.
    #[arg(long, value_name = "PATH")]
    provenance: PathBuf,
    /// Directory raw provider candidates were written under.
    #[arg(long, value_name = "DIR")]
    raw_output_dir: PathBuf,
    /// Root directory final pack assets are written under.
    #[arg(long, value_name = "DIR")]
    out_root: PathBuf,
    /// Path the resulting acceptance-report JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
    /// Path the resulting output catalog JSON is written to.
    #[arg(long, value_name = "PATH")]
    catalog: PathBuf,
    /// Abort on the first per-target failure instead of collecting them.
    #[arg(long)]
    strict: bool,
}

/// Arguments for `atlas`.
#[derive(Args, Debug)]
struct AtlasCommand {
    /// Path to the authored manifest JSON file (atlas groups are
    /// manifest-only; they never survive into a targets index).
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Path to the targets-index JSON, used to resolve each member's
    /// final output path.
    #[arg(long, value_name = "PATH")]
    targets_index: PathBuf,
    /// Path the resolved atlas-groups JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

/// Arguments for `eval`.
#[derive(Args, Debug)]
struct EvalCommand {
    /// Path to the targets-index JSON produced by `plan`.
    #[arg(long, value_name = "PATH")]
    targets_index: PathBuf,
    /// Path to the provenance-run JSON produced by `generate`.
    #[arg(long, value_name = "PATH")]
    provenance: PathBuf,
    /// Path to the acceptance-report JSON produced by `process`.
    #[arg(long, value_name = "PATH")]
    acceptance: PathBuf,
    /// Path to the authored manifest JSON, used for evaluation-profile
    /// weights and consistency-group thresholds.
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,
    /// Path the resulting eval-report JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
    /// Abort on the first pack-invariant violation instead of forcing the
    /// targets it names ineligible and continuing.
    #[arg(long)]
    strict: bool,
}

/// Arguments for `review`.
#[derive(Args, Debug)]
struct ReviewCommand {
    /// Path to the eval-report JSON produced by `eval`.
    #[arg(long, value_name = "PATH")]
    eval_report: PathBuf,
    /// Path to the acceptance-report JSON produced by `process`.
    #[arg(long, value_name = "PATH")]
    acceptance: PathBuf,
    /// Path the consolidated review JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

/// Arguments for `select`.
#[derive(Args, Debug)]
struct SelectCommand {
    /// Path to the provenance-run JSON produced by `generate`.
    #[arg(long, value_name = "PATH")]
    provenance: PathBuf,
    /// Path to the eval-report JSON produced by `eval`.
    #[arg(long, value_name = "PATH")]
    eval_report: PathBuf,
    /// Prior selection lock to merge fresh entries into, if any.
    #[arg(long, value_name = "PATH")]
    previous_lock: Option<PathBuf>,
    /// Path the resulting selection-lock JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

/// Arguments for `package`.
#[derive(Args, Debug)]
struct PackageCommand {
    /// Path to the output catalog JSON produced by `process`.
    #[arg(long, value_name = "PATH")]
    catalog: PathBuf,
    /// Path to the selection-lock JSON produced by `select`.
    #[arg(long, value_name = "PATH")]
    lock: PathBuf,
    /// Path the resulting pack-manifest JSON is written to.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

/// Parses a `--provider` argument, rejecting anything outside openai/nano/local.
fn parse_provider_arg(value: &str) -> Result<ProviderName, String> {
    ProviderName::parse(value).ok_or_else(|| format!("unknown provider `{value}`; expected one of openai, nano, local"))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper; every path that can fail collapses into one message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Wraps a message into a [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        write_stdout_line(&format!("lootforge {}", env!("CARGO_PKG_VERSION")))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        write_stdout_line("usage: lootforge <init|plan|validate|generate|regenerate|process|atlas|eval|review|select|package> ...")?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Init(command) => command_init(&command),
        Commands::Plan(command) => command_plan(&command),
        Commands::Validate(command) => command_validate(&command),
        Commands::Generate(command) => command_generate(&command).await,
        Commands::Regenerate(command) => command_regenerate(&command).await,
        Commands::Process(command) => command_process(&command),
        Commands::Atlas(command) => command_atlas(&command),
        Commands::Eval(command) => command_eval(&command),
        Commands::Review(command) => command_review(&command),
        Commands::Select(command) => command_select(&command),
        Commands::Package(command) => command_package(&command),
    }
}

// ============================================================================
// SECTION: init
// ============================================================================

/// Writes a minimal starter manifest to disk.
fn command_init(command: &InitCommand) -> CliResult<ExitCode> {
    let manifest = Manifest {
        pack: command.pack.clone(),
        provider_defaults: lootforge_manifest::authored::ProviderDefaults::default(),
        style_kits: BTreeMap::new(),
        consistency_groups: BTreeMap::new(),
        evaluation_profiles: BTreeMap::new(),
        atlases: Vec::new(),
        targets: Vec::new(),
    };
    write_json_file(&command.out, &manifest)?;
    write_stdout_line(&format!("init: wrote starter manifest for pack `{}` to {}", command.pack, command.out.display()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: plan
// ============================================================================

/// Normalizes a manifest into a validated targets index.
fn command_plan(command: &PlanCommand) -> CliResult<ExitCode> {
    let manifest = read_json_file::<Manifest>(&command.manifest)?;
    let ctx = lootforge_manifest::PlanContext {
        output_root: command.out_root.clone(),
        requested_provider: command.provider,
    };
    match lootforge_manifest::plan(&manifest, &ctx) {
        Ok(outcome) => {
            write_json_file(&command.out, &outcome.index)?;
            let warnings = outcome.warnings.len();
            write_stdout_line(&format!("plan: passed 1, failed 0, warned {warnings} ({} targets planned)", outcome.index.targets.len()))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(lootforge_manifest::PlanError::ManifestInvalid { issues }) => {
            print_manifest_issues(&issues)?;
            write_stdout_line(&format!("plan: passed 0, failed 1, warned {}", issues.iter().filter(|issue| issue.level == lootforge_manifest::errors::IssueLevel::Warning).count()))?;
            Ok(ExitCode::from(1))
        }
        Err(lootforge_manifest::PlanError::ContractInvalid(err)) => Err(CliError::new(err.to_string())),
    }
}

// ============================================================================
// SECTION: validate
// ============================================================================

/// Runs manifest validation without producing a targets index.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let manifest = read_json_file::<Manifest>(&command.manifest)?;
    let ctx = lootforge_manifest::PlanContext {
        output_root: command.out_root.clone(),
        requested_provider: None,
    };
    match lootforge_manifest::validate(&manifest, &ctx) {
        Ok(warnings) => {
            print_manifest_issues(&warnings)?;
            write_stdout_line(&format!("validate: passed 1, failed 0, warned {}", warnings.len()))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(lootforge_manifest::PlanError::ManifestInvalid { issues }) => {
            print_manifest_issues(&issues)?;
            write_stdout_line(&format!("validate: passed 0, failed 1, warned {}", issues.iter().filter(|issue| issue.level == lootforge_manifest::errors::IssueLevel::Warning).count()))?;
            Ok(ExitCode::from(1))
        }
        Err(lootforge_manifest::PlanError::ContractInvalid(err)) => Err(CliError::new(err.to_string())),
    }
}

/// Prints one line per manifest issue: level, code, target, message.
fn print_manifest_issues(issues: &[lootforge_manifest::ManifestIssue]) -> CliResult<()> {
    for issue in issues {
        let level = match issue.level {
            lootforge_manifest::errors::IssueLevel::Error => "error",
            lootforge_manifest::errors::IssueLevel::Warning => "warning",
        };
        let target = issue.target_id.as_deref().unwrap_or("-");
        write_stdout_line(&format!("{level}: {} [{target}] {}", issue.code, issue.message))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: generate / regenerate
// ============================================================================

/// Dispatches every planned target's provider job.
async fn command_generate(command: &GenerateCommand) -> CliResult<ExitCode> {
    let targets_index = read_json_file::<TargetsIndex>(&command.targets_index)?;
    let lock = command.lock.as_deref().map(read_json_file::<SelectionLock>).transpose()?;

    let ctx = build_generate_context(&targets_index, &command.raw_output_dir, lock)?;
    let provenance = lootforge_generate::run(&targets_index, ctx).await;

    write_json_file(&command.out, &provenance)?;
    print_provenance_summary("generate", &provenance)?;
    Ok(exit_code_for_provenance(&provenance))
}

/// Regenerates a named subset of locked targets from their approved selection.
async fn command_regenerate(command: &RegenerateCommand) -> CliResult<ExitCode> {
    let targets_index = read_json_file::<TargetsIndex>(&command.targets_index)?;
    let lock = read_json_file::<SelectionLock>(&command.lock)?;
    let ctx = build_generate_context(&targets_index, &command.raw_output_dir, Some(lock.clone()))?;

    let provenance = lootforge_select::run_regenerate(&targets_index, Arc::new(lock), &command.targets, &command.out_root, ctx).await.map_err(|err| CliError::new(err.to_string()))?;

    write_json_file(&command.out, &provenance)?;
    print_provenance_summary("regenerate", &provenance)?;
    Ok(exit_code_for_provenance(&provenance))
}

/// Builds a [`lootforge_generate::GenerateContext`] wired to the real
/// process environment, provider registry, and system clock.
fn build_generate_context(targets_index: &TargetsIndex, raw_output_dir: &Path, lock: Option<SelectionLock>) -> CliResult<lootforge_generate::GenerateContext> {
    let env = ProcessEnv;
    let mut registry = ProviderRegistry::with_builtin_adapters();
    for provider in [ProviderName::Openai, ProviderName::Nano, ProviderName::Local] {
        let config = provider_config::resolve(provider, ManifestProviderOverrides::default(), &env);
        registry.configure(provider, config);
    }

    let input_hash = hash_canonical_json(targets_index).map_err(|err| CliError::new(format!("failed to hash targets index: {err}")))?;

    Ok(lootforge_generate::GenerateContext {
        raw_output_dir: Arc::new(raw_output_dir.to_path_buf()),
        registry: Arc::new(registry),
        transport: Arc::new(ReqwestTransport),
        clock: Arc::new(SystemClock),
        progress: Arc::new(lootforge_generate::NullProgressSink),
        input_hash,
        skip_locked: lock.is_some(),
        selection_lock: lock.map(Arc::new),
    })
}

/// Prints a one-line passed/failed/warned summary for a provenance run.
fn print_provenance_summary(label: &str, provenance: &ProvenanceRun) -> CliResult<()> {
    let passed = provenance.jobs.len();
    let failed = provenance.failures.len();
    let warned = provenance.skipped.len();
    write_stdout_line(&format!("{label}: passed {passed}, failed {failed}, warned {warned}"))
}

/// Maps a provenance run to an exit code: success iff it recorded no failures.
fn exit_code_for_provenance(provenance: &ProvenanceRun) -> ExitCode {
    if provenance.failures.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(1) }
}

// ============================================================================
// SECTION: process
// ============================================================================

/// Runs the post-process pipeline over a provenance run's selections.
fn command_process(command: &ProcessCommand) -> CliResult<ExitCode> {
    let targets_index = read_json_file::<TargetsIndex>(&command.targets_index)?;
    let provenance = read_json_file::<ProvenanceRun>(&command.provenance)?;

    let options = lootforge_process::ProcessOptions {
        out_root: command.out_root.clone(),
        raw_output_dir: command.raw_output_dir.clone(),
        strict: command.strict,
    };

    let outcome = lootforge_process::run(&targets_index, &provenance, &options).map_err(|err| CliError::new(err.to_string()))?;

    write_json_file(&command.out, &outcome.report)?;
    write_json_file(&command.catalog, &outcome.catalog)?;

    let passed = outcome.report.targets.len();
    let failed = outcome.errors.len();
    write_stdout_line(&format!("process: passed {passed}, failed {failed}, warned 0"))?;
    Ok(if outcome.errors.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

// ============================================================================
// SECTION: atlas
// ============================================================================

/// One resolved atlas group: its declared members' final output paths.
#[derive(Debug, Serialize)]
struct ResolvedAtlasGroup {
    /// Atlas group name as declared in the manifest.
    name: String,
    /// The group's members, each resolved against the targets index.
    members: Vec<ResolvedAtlasMember>,
}

/// One atlas member, resolved against the planned targets index.
#[derive(Debug, Serialize)]
struct ResolvedAtlasMember {
    /// Member target id as declared in the manifest's atlas group.
    target_id: String,
    /// The member's final output path, absent if the target id is unknown.
    out: Option<String>,
}

/// Resolves atlas group membership against a targets index.
fn command_atlas(command: &AtlasCommand) -> CliResult<ExitCode> {
    let manifest = read_json_file::<Manifest>(&command.manifest)?;
    let targets_index = read_json_file::<TargetsIndex>(&command.targets_index)?;

    let outs: BTreeMap<&str, &str> = targets_index.targets.iter().map(|target| (target.id.as_str(), target.out.as_str())).collect();

    let mut missing = 0_usize;
    let groups: Vec<ResolvedAtlasGroup> = manifest
        .atlases
        .iter()
        .map(|group| ResolvedAtlasGroup {
            name: group.name.clone(),
            members: group
                .members
                .iter()
                .map(|member| {
                    let out = outs.get(member.as_str()).map(|out| (*out).to_string());
                    if out.is_none() {
                        missing += 1;
                    }
                    ResolvedAtlasMember { target_id: member.clone(), out }
                })
                .collect(),
        })
        .collect();

    write_json_file(&command.out, &groups)?;
    write_stdout_line(&format!("atlas: passed {}, failed 0, warned {missing}", groups.len()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: eval
// ============================================================================

/// Scores and checks pack invariants over a provenance/acceptance pair.
fn command_eval(command: &EvalCommand) -> CliResult<ExitCode> {
    let targets_index = read_json_file::<TargetsIndex>(&command.targets_index)?;
    let provenance = read_json_file::<ProvenanceRun>(&command.provenance)?;
    let acceptance = read_json_file::<AcceptanceReport>(&command.acceptance)?;
    let manifest = read_json_file::<Manifest>(&command.manifest)?;

    let env = ProcessEnv;
    let adapter_modes: Vec<(AdapterName, AdapterMode)> = AdapterName::all().into_iter().map(|name| (name, adapter_config::resolve(name, &env))).collect();

    let profile_weights: BTreeMap<String, lootforge_eval::ProfileWeights> = manifest
        .evaluation_profiles
        .iter()
        .map(|(name, profile)| {
            (
                name.clone(),
                lootforge_eval::ProfileWeights {
                    candidate_score_weight: profile.candidate_score_weight,
                    adapter_bonus_weight: profile.adapter_bonus_weight,
                    texture_budget_bytes: profile.texture_budget_kb.map(|kb| kb * 1024),
                },
            )
        })
        .collect();

    let consistency_thresholds: BTreeMap<String, f64> = manifest.consistency_groups.iter().filter_map(|(name, group)| group.warning_threshold.map(|threshold| (name.clone(), threshold))).collect();

    let options = lootforge_eval::EvalOptions {
        adapter_modes,
        profile_weights,
        consistency_thresholds,
        strict: command.strict,
    };

    let outcome = lootforge_eval::run(&targets_index, &provenance, &acceptance, &options).map_err(|err| CliError::new(err.to_string()))?;

    write_json_file(&command.out, &outcome.report)?;

    let eligible = outcome.report.targets.iter().filter(|target| target.eligible).count();
    let ineligible = outcome.report.targets.len() - eligible;
    write_stdout_line(&format!("eval: passed {eligible}, failed {ineligible}, warned {}", outcome.warnings.len()))?;
    Ok(if ineligible == 0 { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

// ============================================================================
// SECTION: review
// ============================================================================

/// A consolidated, renderer-agnostic review document: eval scores next to
/// their acceptance issues, one entry per target.
#[derive(Debug, Serialize)]
struct ReviewDocument {
    /// One entry per scored target.
    targets: Vec<ReviewEntry>,
}

/// One target's review entry.
#[derive(Debug, Serialize)]
struct ReviewEntry {
    /// The target's id.
    target_id: String,
    /// The target's eval-stage final score.
    final_score: f64,
    /// Whether the target passed every hard gate.
    eligible: bool,
    /// Count of acceptance issues recorded against this target.
    issue_count: usize,
}

/// Emits a consolidated review document for human inspection.
fn command_review(command: &ReviewCommand) -> CliResult<ExitCode> {
    let eval_report = read_json_file::<EvalReport>(&command.eval_report)?;
    let acceptance = read_json_file::<AcceptanceReport>(&command.acceptance)?;

    let issue_counts: BTreeMap<&str, usize> = acceptance.targets.iter().map(|entry| (entry.target_id.as_str(), entry.issues.len())).collect();

    let targets: Vec<ReviewEntry> = eval_report
        .targets
        .iter()
        .map(|target| ReviewEntry {
            target_id: target.target_id.as_str().to_string(),
            final_score: target.final_score,
            eligible: target.eligible,
            issue_count: issue_counts.get(target.target_id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    let document = ReviewDocument { targets };
    write_json_file(&command.out, &document)?;
    write_stdout_line(&format!("review: passed {}, failed 0, warned 0", document.targets.len()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: select
// ============================================================================

/// Builds or merges this run's selection lock.
fn command_select(command: &SelectCommand) -> CliResult<ExitCode> {
    let provenance = read_json_file::<ProvenanceRun>(&command.provenance)?;
    let eval_report = read_json_file::<EvalReport>(&command.eval_report)?;
    let previous = command.previous_lock.as_deref().map(read_json_file::<SelectionLock>).transpose()?;

    let lock = lootforge_select::run(&provenance, &eval_report, previous.as_ref()).map_err(|err| CliError::new(err.to_string()))?;

    write_json_file(&command.out, &lock)?;
    write_stdout_line(&format!("select: passed {}, failed 0, warned 0", lock.entries.len()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: package
// ============================================================================

/// The final shippable manifest: every catalog entry whose target carries
/// an approved selection-lock entry.
#[derive(Debug, Serialize)]
struct PackManifest {
    /// Shippable entries, keyed by target id.
    entries: BTreeMap<String, lootforge_process::stage::CatalogEntry>,
}

/// Assembles the final shippable catalog from a selection lock.
fn command_package(command: &PackageCommand) -> CliResult<ExitCode> {
    let catalog = read_json_file::<lootforge_process::Catalog>(&command.catalog)?;
    let lock = read_json_file::<SelectionLock>(&command.lock)?;

    let total = catalog.entries.len();
    let entries: BTreeMap<String, lootforge_process::stage::CatalogEntry> = catalog.entries.into_iter().filter(|(target_id, _)| lock.entries.contains_key(target_id.as_str())).collect();
    let dropped = total - entries.len();

    let manifest = PackManifest { entries };
    write_json_file(&command.out, &manifest)?;
    write_stdout_line(&format!("package: passed {}, failed 0, warned {dropped}", manifest.entries.len()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: File I/O Helpers
// ============================================================================

/// Reads and parses a JSON artifact from `path`.
fn read_json_file<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|err| CliError::new(format!("failed to read {}: {err}", path.display())))?;
    serde_json::from_str(&raw).map_err(|err| CliError::new(format!("failed to parse {}: {err}", path.display())))
}

/// Serializes `value` as pretty JSON to `path`, creating parent directories
/// as needed.
fn write_json_file<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| CliError::new(format!("failed to create {}: {err}", parent.display())))?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value).map_err(|err| CliError::new(format!("failed to serialize {}: {err}", path.display())))?;
    std::fs::write(path, bytes).map_err(|err| CliError::new(format!("failed to write {}: {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "error: {message}");
    ExitCode::FAILURE
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::parse_provider_arg;
    use lootforge_core::identifiers::ProviderName;

    #[test]
    fn parses_known_providers() {
        assert_eq!(parse_provider_arg("openai"), Ok(ProviderName::Openai));
        assert_eq!(parse_provider_arg("local"), Ok(ProviderName::Local));
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(parse_provider_arg("bogus").is_err());
    }
}
