//! Process-wide enqueue API.
//!
//! Every free function goes through the registered
//! [`CompatibilityOverrides`](super::compat::CompatibilityOverrides) first and
//! then into the process-wide [`GlobalExecutor`]. The executor is either
//! installed explicitly with [`install_global_executor`] or built lazily from
//! the environment on first use.

use std::sync::{Arc, OnceLock};

use anyhow::Context;
use tracing::{error, info, warn};

use crate::backend::{BackendKind, BackendStats, DrainMode};
use crate::builders::build_executor;
use crate::config::ExecutorConfig;
use crate::core::{
    AppResult, Deadline, EnqueueGlobalHook, EnqueueGlobalWithDeadlineHook,
    EnqueueGlobalWithDelayHook, EnqueueMainHook, ExecutorRef, GlobalExecutor, Job, JobDelay,
    SchedulerError, SetMainExecutorHook,
};

use super::compat;

static GLOBAL: OnceLock<GlobalExecutor> = OnceLock::new();

/// Install the process-wide executor. Must happen before anything enqueues.
///
/// # Errors
///
/// [`SchedulerError::AlreadyInstalled`] if an executor is already in place,
/// including one built lazily by an earlier enqueue.
pub fn install_global_executor(executor: GlobalExecutor) -> Result<(), SchedulerError> {
    let kind = executor.backend_kind();
    GLOBAL
        .set(executor)
        .map_err(|_| SchedulerError::AlreadyInstalled("global executor"))?;
    info!(backend = %kind, "global executor installed");
    Ok(())
}

/// Build an executor from `cfg` and install it process-wide.
///
/// # Errors
///
/// Fails when the backend cannot be built or an executor is already
/// installed.
pub fn install_from_config(cfg: &ExecutorConfig) -> AppResult<()> {
    let executor = build_executor(cfg)
        .with_context(|| format!("building {} global executor", cfg.backend))?;
    install_global_executor(executor).context("installing global executor")?;
    Ok(())
}

/// The process-wide executor, built from the environment on first use.
///
/// # Panics
///
/// When neither the configured engine nor the thread-pool fallback can be
/// started. Scheduling cannot continue without an executor.
pub fn global() -> &'static GlobalExecutor {
    GLOBAL.get_or_init(build_from_env)
}

/// The process-wide executor, if one has been installed or built.
#[must_use]
pub fn installed() -> Option<&'static GlobalExecutor> {
    GLOBAL.get()
}

fn build_from_env() -> GlobalExecutor {
    let cfg = ExecutorConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "invalid executor environment, using defaults");
        ExecutorConfig::default()
    });
    match build_executor(&cfg) {
        Ok(executor) => executor,
        Err(e) => {
            error!(backend = %cfg.backend, error = %e, "global executor unavailable, falling back to thread pool");
            let fallback = ExecutorConfig::default().with_backend(BackendKind::ThreadPool);
            match build_executor(&fallback) {
                Ok(executor) => executor,
                Err(e) => panic!("global executor could not be started: {e}"),
            }
        }
    }
}

// ---- enqueue ----

/// Run `job` on the global executor as soon as possible.
pub fn enqueue_global(job: Job) {
    match compat::overrides().and_then(|o| o.enqueue_global) {
        Some(replacement) => replacement(job, enqueue_global_original),
        None => enqueue_global_original(job),
    }
}

fn enqueue_global_original(job: Job) {
    global().enqueue_global(job);
}

/// Run `job` on the global executor no earlier than `delay` from now.
pub fn enqueue_global_with_delay(delay: JobDelay, job: Job) {
    match compat::overrides().and_then(|o| o.enqueue_global_with_delay) {
        Some(replacement) => replacement(delay, job, enqueue_global_with_delay_original),
        None => enqueue_global_with_delay_original(delay, job),
    }
}

fn enqueue_global_with_delay_original(delay: JobDelay, job: Job) {
    global().enqueue_global_with_delay(delay, job);
}

/// Run `job` on the global executor no earlier than `deadline`.
pub fn enqueue_global_with_deadline(deadline: Deadline, job: Job) {
    match compat::overrides().and_then(|o| o.enqueue_global_with_deadline) {
        Some(replacement) => replacement(deadline, job, enqueue_global_with_deadline_original),
        None => enqueue_global_with_deadline_original(deadline, job),
    }
}

fn enqueue_global_with_deadline_original(deadline: Deadline, job: Job) {
    global().enqueue_global_with_deadline(deadline, job);
}

/// Run `job` on the main executor.
pub fn enqueue_main(job: Job) {
    match compat::overrides().and_then(|o| o.enqueue_main) {
        Some(replacement) => replacement(job, enqueue_main_original),
        None => enqueue_main_original(job),
    }
}

fn enqueue_main_original(job: Job) {
    global().enqueue_main(job);
}

// ---- main executor ----

/// The current main executor.
#[must_use]
pub fn main_executor() -> ExecutorRef {
    match compat::overrides().and_then(|o| o.main_executor) {
        Some(replacement) => replacement(main_executor_original),
        None => main_executor_original(),
    }
}

fn main_executor_original() -> ExecutorRef {
    global().main_executor()
}

/// Whether `executor` is the current main executor.
///
/// Never builds the process-wide executor. Before one is installed the
/// answer comes from the built-in main executor of the compiled-default
/// engine: the generic executor for the cooperative engine, nothing for the
/// thread-based ones.
#[must_use]
pub fn is_main_executor(executor: &ExecutorRef) -> bool {
    match installed() {
        Some(global) => global.is_main_executor(executor),
        None => BackendKind::compiled_default() == BackendKind::Cooperative && executor.is_generic(),
    }
}

/// Replace the process-wide main executor. Allowed once.
///
/// # Errors
///
/// [`SchedulerError::MainExecutorOverridden`] on a second call.
pub fn set_main_executor_override(executor: ExecutorRef) -> Result<(), SchedulerError> {
    match compat::overrides().and_then(|o| o.set_main_executor_override) {
        Some(replacement) => replacement(executor, set_main_executor_override_original),
        None => set_main_executor_override_original(executor),
    }
}

fn set_main_executor_override_original(executor: ExecutorRef) -> Result<(), SchedulerError> {
    global().set_main_executor_override(executor)
}

// ---- driving ----

/// Hand the calling thread to the main queue.
///
/// # Errors
///
/// [`SchedulerError::NotMainThread`] when another thread already drains the
/// main queue, [`SchedulerError::Shutdown`] after shutdown.
pub fn drain_main_queue(mode: DrainMode) -> Result<usize, SchedulerError> {
    global().drain_main_queue(mode)
}

/// Statistics of the process-wide backend.
#[must_use]
pub fn stats() -> BackendStats {
    global().stats()
}

// ---- hooks ----

/// Install the process-wide immediate-enqueue hook.
pub fn set_enqueue_global_hook(hook: Arc<EnqueueGlobalHook>) {
    global().set_enqueue_global_hook(hook);
}

/// Remove the immediate-enqueue hook. Returns whether one was installed.
pub fn clear_enqueue_global_hook() -> bool {
    global().hooks().enqueue_global.clear().is_some()
}

/// Install the process-wide delayed-enqueue hook.
pub fn set_enqueue_global_with_delay_hook(hook: Arc<EnqueueGlobalWithDelayHook>) {
    global().set_enqueue_global_with_delay_hook(hook);
}

/// Remove the delayed-enqueue hook. Returns whether one was installed.
pub fn clear_enqueue_global_with_delay_hook() -> bool {
    global().hooks().enqueue_global_with_delay.clear().is_some()
}

/// Install the process-wide deadline-enqueue hook.
pub fn set_enqueue_global_with_deadline_hook(hook: Arc<EnqueueGlobalWithDeadlineHook>) {
    global().set_enqueue_global_with_deadline_hook(hook);
}

/// Remove the deadline-enqueue hook. Returns whether one was installed.
pub fn clear_enqueue_global_with_deadline_hook() -> bool {
    global().hooks().enqueue_global_with_deadline.clear().is_some()
}

/// Install the process-wide main-enqueue hook.
pub fn set_enqueue_main_hook(hook: Arc<EnqueueMainHook>) {
    global().set_enqueue_main_hook(hook);
}

/// Remove the main-enqueue hook. Returns whether one was installed.
pub fn clear_enqueue_main_hook() -> bool {
    global().hooks().enqueue_main.clear().is_some()
}

/// Install the process-wide observer for main executor overrides.
pub fn set_main_executor_hook(hook: Arc<SetMainExecutorHook>) {
    global().set_main_executor_hook(hook);
}

/// Remove the main executor observer. Returns whether one was installed.
pub fn clear_main_executor_hook() -> bool {
    global().hooks().set_main_executor.clear().is_some()
}
