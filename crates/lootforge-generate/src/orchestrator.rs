// crates/lootforge-generate/src/orchestrator.rs
// ============================================================================
// Module: Generate Orchestrator
// Description: Dispatches provider jobs for every eligible planned target,
//   retrying and falling back per target, bounding per-provider
//   concurrency, and rate limiting dispatch.
// Purpose: Turn a validated targets index into a ProvenanceRun (§4.3-§4.5).
// Dependencies: lootforge-core, lootforge-providers, tokio
// ============================================================================

//! ## Overview
//! [`run`] spawns one async task per eligible target. Each task walks its
//! resolved provider chain (primary, then fallbacks); within a provider it
//! retries up to `max_retries + 1` times with exponential backoff, capped
//! at five seconds. Every attempt acquires a per-provider
//! [`tokio::sync::Semaphore`] permit before dispatch, and waits on a shared
//! rate limiter keyed by provider. The provider call itself is synchronous
//! ([`lootforge_providers::Provider::run_job`] blocks on the wire), so each
//! attempt runs inside [`tokio::task::spawn_blocking`].
//!
//! Targets already covered by an approved, input-hash-matching selection
//! lock entry are skipped when `skip_locked` is set, and recorded in the
//! resulting [`ProvenanceRun::skipped`] list instead of being dispatched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use lootforge_core::capabilities::capabilities_for;
use lootforge_core::contract::provenance::ProvenanceRun;
use lootforge_core::contract::selection_lock::SelectionLock;
use lootforge_core::contract::targets_index::TargetsIndex;
use lootforge_core::domain::job::ProviderJob;
use lootforge_core::domain::run_result::AttemptOutcome;
use lootforge_core::domain::run_result::JobAttempt;
use lootforge_core::domain::run_result::JobFailure;
use lootforge_core::domain::run_result::ProviderRunResult;
use lootforge_core::domain::run_result::RegenerationSource;
use lootforge_core::domain::target::PlannedTarget;
use lootforge_core::identifiers::ProviderName;
use lootforge_core::identifiers::RunId;
use lootforge_core::time::Clock;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use lootforge_providers::PrepareContext;
use lootforge_providers::ProviderRegistry;
use lootforge_providers::ProviderTransport;
use lootforge_providers::RunContext;

use crate::progress::ProgressEvent;
use crate::progress::ProgressSink;
use crate::scoring;

/// Longest backoff between retries on the same provider, in milliseconds.
const MAX_BACKOFF_MILLIS: u64 = 5_000;
/// Base backoff before doubling per attempt, in milliseconds.
const BASE_BACKOFF_MILLIS: u64 = 300;

// ============================================================================
// SECTION: Context
// ============================================================================

/// Everything [`run`] needs beyond the targets index itself.
///
/// Cheap to clone: every field is either an `Arc` or a `String`/`bool`, so
/// one context is shared across every spawned per-target task.
#[derive(Clone)]
pub struct GenerateContext {
    /// Directory raw provider candidates are written under.
    pub raw_output_dir: Arc<PathBuf>,
    /// Configured provider adapters and their resolved runtime config.
    pub registry: Arc<ProviderRegistry>,
    /// The HTTP boundary every adapter call goes through.
    pub transport: Arc<dyn ProviderTransport>,
    /// Time source for rate limiting and run-id derivation.
    pub clock: Arc<dyn Clock>,
    /// Job lifecycle observer.
    pub progress: Arc<dyn ProgressSink>,
    /// Hash of this run's declared inputs (manifest + referenced assets).
    pub input_hash: String,
    /// Whether targets already covered by an approved lock entry should be
    /// skipped instead of regenerated.
    pub skip_locked: bool,
    /// The selection lock to check `skip_locked` against, if any.
    pub selection_lock: Option<Arc<SelectionLock>>,
}

// ============================================================================
// SECTION: Run
// ============================================================================

/// Dispatches every eligible target in `targets_index` and returns the
/// resulting provenance run. Spritesheet sheet targets
/// (`generation_disabled`) are never dispatched; they have no image of
/// their own to generate.
pub async fn run(targets_index: &TargetsIndex, ctx: GenerateContext) -> ProvenanceRun {
    let started_at_millis = ctx.clock.now_millis();
    let run_id = RunId::derive(&ctx.input_hash, started_at_millis);

    let mut eligible = Vec::new();
    let mut skipped = Vec::new();
    for target in &targets_index.targets {
        if target.generation_disabled {
            continue;
        }
        if ctx.skip_locked && already_locked(target, ctx.selection_lock.as_deref(), &ctx.input_hash) {
            skipped.push(target.id.as_str().to_string());
        } else {
            eligible.push(target.clone());
        }
    }

    ctx.progress.on_event(ProgressEvent::Prepare { run_id: &run_id, target_count: eligible.len() });

    let semaphores = Arc::new(build_semaphores(&eligible, &ctx.registry));
    let rate_state: Arc<Mutex<BTreeMap<ProviderName, i64>>> = Arc::new(Mutex::new(BTreeMap::new()));

    let mut joins: JoinSet<Result<ProviderRunResult, JobFailure>> = JoinSet::new();
    for target in eligible {
        let ctx = ctx.clone();
        let semaphores = Arc::clone(&semaphores);
        let rate_state = Arc::clone(&rate_state);
        joins.spawn(async move { run_target(target, ctx, semaphores, rate_state).await });
    }

    let mut jobs = Vec::new();
    let mut failures = Vec::new();
    while let Some(outcome) = joins.join_next().await {
        match outcome {
            Ok(Ok(result)) => jobs.push(result),
            Ok(Err(failure)) => failures.push(failure),
            Err(_join_error) => {}
        }
    }

    let finished_at_millis = ctx.clock.now_millis();
    ProvenanceRun::new(run_id, ctx.input_hash, jobs, failures, skipped, started_at_millis, finished_at_millis)
}

/// Whether `target` is covered by an approved selection-lock entry whose
/// recorded input hash matches the current run, meaning nothing about its
/// inputs has changed since it was last approved.
fn already_locked(target: &PlannedTarget, lock: Option<&SelectionLock>, input_hash: &str) -> bool {
    lock.and_then(|lock| lock.get(&target.id)).is_some_and(|entry| entry.approved && entry.input_hash == input_hash)
}

/// Builds one semaphore per provider that appears in `targets`' resolved
/// routes, sized to the larger of the provider's configured default
/// concurrency and the highest per-target `provider_concurrency` override
/// that names it, floored at one permit.
fn build_semaphores(targets: &[PlannedTarget], registry: &ProviderRegistry) -> BTreeMap<ProviderName, Arc<Semaphore>> {
    let mut concurrency_hints: BTreeMap<ProviderName, u32> = BTreeMap::new();
    for target in targets {
        let route = registry.route(target);
        let hint = target.generation_policy.provider_concurrency.unwrap_or(0);
        for provider in std::iter::once(route.primary).chain(route.fallbacks) {
            let entry = concurrency_hints.entry(provider).or_insert(0);
            *entry = (*entry).max(hint);
        }
    }

    concurrency_hints
        .into_iter()
        .map(|(provider, hint)| {
            let base = registry.config_for(provider).map_or_else(|| capabilities_for(provider).default_concurrency, |config| config.default_concurrency);
            let effective = usize::try_from(base.max(hint).max(1)).unwrap_or(1);
            (provider, Arc::new(Semaphore::new(effective)))
        })
        .collect()
}

/// Computes the mandated delay between dispatches on one provider, in
/// milliseconds: the larger of the provider's minimum delay and the
/// ceiling of `60_000 / rate_limit_per_minute` when a per-target rate
/// limit is declared.
fn rate_delay_millis(min_delay_ms: u64, rate_limit_per_minute: Option<u32>) -> u64 {
    let from_rate_limit = rate_limit_per_minute.map_or(0, |rpm| {
        let rpm = u64::from(rpm.max(1));
        (60_000 + rpm - 1) / rpm
    });
    from_rate_limit.max(min_delay_ms)
}

/// Blocks the current task until this provider's rate limit admits the
/// next dispatch, then reserves the next admissible slot.
async fn wait_for_rate_limit(rate_state: &Mutex<BTreeMap<ProviderName, i64>>, clock: &dyn Clock, provider: ProviderName, delay_millis: u64) {
    let wait_millis = {
        let mut guard = rate_state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = clock.now_millis();
        let last_run_at = guard.get(&provider).copied();
        let delay = i64::try_from(delay_millis).unwrap_or(i64::MAX);
        let earliest_allowed = last_run_at.map_or(now, |last| last.saturating_add(delay));
        let run_at = now.max(earliest_allowed);
        guard.insert(provider, run_at);
        (run_at - now).max(0)
    };
    if wait_millis > 0 {
        tokio::time::sleep(Duration::from_millis(u64::try_from(wait_millis).unwrap_or(0))).await;
    }
}

/// Runs one target's job to completion: walks its provider chain, retrying
/// each provider up to `max_retries + 1` times, and returns either the
/// winning provider's scored result or the accumulated failure record.
async fn run_target(
    target: PlannedTarget,
    ctx: GenerateContext,
    semaphores: Arc<BTreeMap<ProviderName, Arc<Semaphore>>>,
    rate_state: Arc<Mutex<BTreeMap<ProviderName, i64>>>,
) -> Result<ProviderRunResult, JobFailure> {
    let started_at_millis = ctx.clock.now_millis();
    let route = ctx.registry.route(&target);
    let chain: Vec<ProviderName> = std::iter::once(route.primary).chain(route.fallbacks.iter().copied()).collect();

    let retry = lootforge_core::domain::job::RetryFallbackDirective {
        max_retries: target.generation_policy.max_retries,
        fallback_providers: route.fallbacks.clone(),
        rate_limit_per_minute: target.generation_policy.rate_limit_per_minute,
    };
    let prepare_ctx = PrepareContext { input_hash: ctx.input_hash.clone(), retry };

    let mut attempts = Vec::new();
    let mut attempted_providers = Vec::new();

    for provider in chain {
        let Some(adapter) = ctx.registry.adapter_for(provider) else {
            continue;
        };
        attempted_providers.push(provider);

        let jobs = adapter.prepare_jobs(&target, &prepare_ctx);
        let Some(job) = jobs.into_iter().next() else {
            continue;
        };

        let max_retries = job.retry.max_retries;
        let min_delay_ms = ctx.registry.config_for(provider).map_or_else(|| capabilities_for(provider).min_delay_ms, |config| config.min_delay_ms);
        let delay_ms = rate_delay_millis(min_delay_ms, job.retry.rate_limit_per_minute);
        let semaphore = semaphores.get(&provider).cloned();

        for attempt in 1..=max_retries.saturating_add(1) {
            ctx.progress.on_event(ProgressEvent::JobStart { target_id: &target.id, provider, attempt });

            if let Some(semaphore) = &semaphore {
                wait_for_rate_limit(&rate_state, ctx.clock.as_ref(), provider, delay_ms).await;
                let permit = semaphore.clone().acquire_owned().await;
                let outcome = dispatch(Arc::clone(&ctx.registry), Arc::clone(&ctx.raw_output_dir), Arc::clone(&ctx.transport), provider, job.clone(), target.edit_spec.clone()).await;
                drop(permit);

                match outcome {
                    Ok(raw) => {
                        attempts.push(JobAttempt { provider, attempt, outcome: AttemptOutcome::Success });
                        ctx.progress.on_event(ProgressEvent::JobFinish { target_id: &target.id, provider });
                        let finished_at_millis = ctx.clock.now_millis();
                        let (candidates, coarse_to_fine) = scoring::score_job(&target, &raw);
                        let primary_output_path = candidates.iter().find(|candidate| candidate.selected).map_or_else(String::new, |candidate| candidate.path.clone());
                        let regeneration_source = target.regeneration_source.as_ref().and_then(|_| {
                            ctx.selection_lock.as_ref().and_then(|lock| lock.get(&target.id)).map(|entry| RegenerationSource {
                                lock_selected_output_path: entry.selected_output_path.clone(),
                                lock_provider: entry.provider,
                            })
                        });
                        return Ok(ProviderRunResult {
                            target_id: target.id.clone(),
                            provider,
                            model: raw.model.clone(),
                            primary_output_path,
                            candidates,
                            coarse_to_fine,
                            generation_mode: raw.generation_mode,
                            regeneration_source,
                            started_at_millis,
                            finished_at_millis,
                            input_hash: ctx.input_hash.clone(),
                            attempts,
                        });
                    }
                    Err(error) => {
                        ctx.progress.on_event(ProgressEvent::JobError { target_id: &target.id, provider, code: &error.code });
                        attempts.push(JobAttempt { provider, attempt, outcome: AttemptOutcome::Failure { code: error.code.clone(), message: error.message.clone() } });
                        if !error.is_retriable() {
                            break;
                        }
                        if attempt < max_retries.saturating_add(1) {
                            let backoff = BASE_BACKOFF_MILLIS.saturating_mul(1_u64 << attempt.saturating_sub(1).min(16)).min(MAX_BACKOFF_MILLIS);
                            tokio::time::sleep(Duration::from_millis(backoff)).await;
                        }
                    }
                }
            }
        }
    }

    ctx.progress.on_event(ProgressEvent::JobExhausted { target_id: &target.id });
    Err(JobFailure { target_id: target.id, attempted_providers, attempts })
}

/// Runs one provider call on a blocking thread, since
/// [`lootforge_providers::Provider::run_job`] blocks on the wire.
async fn dispatch(
    registry: Arc<ProviderRegistry>,
    raw_output_dir: Arc<PathBuf>,
    transport: Arc<dyn ProviderTransport>,
    provider: ProviderName,
    job: ProviderJob,
    edit: Option<lootforge_core::domain::target::EditSpec>,
) -> Result<lootforge_core::domain::raw_output::RawJobOutput, lootforge_providers::ProviderError> {
    let outcome = tokio::task::spawn_blocking(move || {
        let Some(adapter) = registry.adapter_for(provider) else {
            return Err(lootforge_providers::ProviderError::actionable(provider, format!("{}_adapter_not_registered", provider.as_str()), "no adapter registered for this provider"));
        };
        let Some(config) = registry.config_for(provider) else {
            return Err(lootforge_providers::ProviderError::actionable(provider, format!("{}_not_configured", provider.as_str()), "no runtime configuration resolved for this provider"));
        };
        let run_ctx = RunContext { raw_output_dir: raw_output_dir.as_path(), config, transport: transport.as_ref() };
        match &edit {
            Some(edit) => adapter.run_edit_job(&job, edit, &run_ctx),
            None => adapter.run_job(&job, &run_ctx),
        }
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(join_error) => Err(lootforge_providers::ProviderError::transient(provider, format!("{}_task_join_error", provider.as_str()), join_error.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use super::rate_delay_millis;

    #[test]
    fn rate_delay_is_ceiling_of_sixty_seconds_over_rate() {
        assert_eq!(rate_delay_millis(0, Some(60)), 1_000);
        assert_eq!(rate_delay_millis(0, Some(7)), 8_572);
    }

    #[test]
    fn rate_delay_falls_back_to_provider_minimum() {
        assert_eq!(rate_delay_millis(500, None), 500);
        assert_eq!(rate_delay_millis(500, Some(1_000_000)), 500);
    }
}
