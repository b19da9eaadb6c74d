//! Replaceable entry points.
//!
//! A component loaded into the process can swap the implementation behind
//! any public free function in [`crate::runtime::api`] by registering a
//! [`CompatibilityOverrides`] table before first use. Each override receives
//! the call's arguments and the original implementation, so it can wrap,
//! redirect or replace the default behavior.

use std::sync::OnceLock;

use tracing::info;

use crate::core::{Deadline, ExecutorRef, Job, JobDelay, SchedulerError};

/// Original implementation of [`crate::runtime::api::enqueue_global`].
pub type EnqueueGlobalFn = fn(Job);
/// Original implementation of [`crate::runtime::api::enqueue_global_with_delay`].
pub type EnqueueGlobalWithDelayFn = fn(JobDelay, Job);
/// Original implementation of [`crate::runtime::api::enqueue_global_with_deadline`].
pub type EnqueueGlobalWithDeadlineFn = fn(Deadline, Job);
/// Original implementation of [`crate::runtime::api::enqueue_main`].
pub type EnqueueMainFn = fn(Job);
/// Original implementation of [`crate::runtime::api::set_main_executor_override`].
pub type SetMainExecutorOverrideFn = fn(ExecutorRef) -> Result<(), SchedulerError>;
/// Original implementation of [`crate::runtime::api::main_executor`].
pub type MainExecutorFn = fn() -> ExecutorRef;

/// Replacement table. Unset entries fall through to the original.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityOverrides {
    /// Replaces `enqueue_global`.
    pub enqueue_global: Option<fn(Job, EnqueueGlobalFn)>,
    /// Replaces `enqueue_global_with_delay`.
    pub enqueue_global_with_delay: Option<fn(JobDelay, Job, EnqueueGlobalWithDelayFn)>,
    /// Replaces `enqueue_global_with_deadline`.
    pub enqueue_global_with_deadline: Option<fn(Deadline, Job, EnqueueGlobalWithDeadlineFn)>,
    /// Replaces `enqueue_main`.
    pub enqueue_main: Option<fn(Job, EnqueueMainFn)>,
    /// Replaces `set_main_executor_override`.
    pub set_main_executor_override:
        Option<fn(ExecutorRef, SetMainExecutorOverrideFn) -> Result<(), SchedulerError>>,
    /// Replaces `main_executor`.
    pub main_executor: Option<fn(MainExecutorFn) -> ExecutorRef>,
}

impl CompatibilityOverrides {
    /// Number of entries that are set.
    #[must_use]
    pub fn installed_count(&self) -> usize {
        [
            self.enqueue_global.is_some(),
            self.enqueue_global_with_delay.is_some(),
            self.enqueue_global_with_deadline.is_some(),
            self.enqueue_main.is_some(),
            self.set_main_executor_override.is_some(),
            self.main_executor.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

static OVERRIDES: OnceLock<CompatibilityOverrides> = OnceLock::new();

/// Register the process-wide override table. Allowed once.
///
/// # Errors
///
/// [`SchedulerError::AlreadyInstalled`] if a table is already registered.
pub fn register_overrides(overrides: CompatibilityOverrides) -> Result<(), SchedulerError> {
    let count = overrides.installed_count();
    OVERRIDES
        .set(overrides)
        .map_err(|_| SchedulerError::AlreadyInstalled("compatibility overrides"))?;
    info!(overrides = count, "compatibility overrides registered");
    Ok(())
}

/// The registered table, if any.
#[must_use]
pub fn overrides() -> Option<&'static CompatibilityOverrides> {
    OVERRIDES.get()
}
