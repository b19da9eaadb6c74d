//! The enqueue API: hooks, tracing and main-executor routing in front of a
//! backend.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::backend::{Backend, BackendKind, BackendStats, DrainMode};

use super::error::SchedulerError;
use super::executor_ref::ExecutorRef;
use super::hooks::{
    EnqueueGlobalHook, EnqueueGlobalWithDeadlineHook, EnqueueGlobalWithDelayHook, EnqueueHooks,
    EnqueueMainHook, SetMainExecutorHook,
};
use super::job::Job;
use super::main_executor::MainExecutorCell;
use super::time::{Deadline, JobDelay};
use super::trace::{self, TraceSink};

/// Routes jobs to one backend.
///
/// Every enqueue method has the same shape: emit a trace event, then either
/// call the installed hook with the default routing as `original`, or run
/// the default routing directly. Enqueue never blocks and never runs the job
/// on the calling thread.
pub struct GlobalExecutor {
    backend: Arc<dyn Backend>,
    hooks: EnqueueHooks,
    main: MainExecutorCell,
    trace_sink: Option<Arc<dyn TraceSink>>,
}

impl GlobalExecutor {
    /// Executor in front of `backend`.
    pub fn new<B>(backend: B) -> Self
    where
        B: Backend + 'static,
    {
        Self::from_arc(Arc::new(backend))
    }

    /// Executor in front of a shared backend.
    #[must_use]
    pub fn from_arc(backend: Arc<dyn Backend>) -> Self {
        let main = MainExecutorCell::new(backend.main_executor());
        Self {
            backend,
            hooks: EnqueueHooks::default(),
            main,
            trace_sink: None,
        }
    }

    /// Attach a trace sink.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Which engine runs the jobs.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Hook slots.
    #[must_use]
    pub const fn hooks(&self) -> &EnqueueHooks {
        &self.hooks
    }

    fn sink(&self) -> Option<&dyn TraceSink> {
        self.trace_sink.as_deref()
    }

    // ---- immediate ----

    /// Run `job` on the global executor as soon as possible.
    pub fn enqueue_global(&self, job: Job) {
        trace::job_enqueue_global(self.sink(), &job);
        match self.hooks.enqueue_global.get() {
            Some(hook) => hook(job, &|job: Job| self.enqueue_global_impl(job)),
            None => self.enqueue_global_impl(job),
        }
    }

    /// Default routing for [`GlobalExecutor::enqueue_global`].
    pub fn enqueue_global_impl(&self, job: Job) {
        self.backend.enqueue_global(job);
    }

    // ---- delayed ----

    /// Run `job` on the global executor no earlier than `delay` from now.
    pub fn enqueue_global_with_delay(&self, delay: JobDelay, job: Job) {
        trace::job_enqueue_global_with_delay(self.sink(), delay, &job);
        match self.hooks.enqueue_global_with_delay.get() {
            Some(hook) => hook(delay, job, &|delay: JobDelay, job: Job| {
                self.enqueue_global_with_delay_impl(delay, job);
            }),
            None => self.enqueue_global_with_delay_impl(delay, job),
        }
    }

    /// Default routing for [`GlobalExecutor::enqueue_global_with_delay`].
    pub fn enqueue_global_with_delay_impl(&self, delay: JobDelay, job: Job) {
        self.backend.enqueue_global_with_delay(delay, job);
    }

    // ---- deadline ----

    /// Run `job` on the global executor no earlier than `deadline`.
    pub fn enqueue_global_with_deadline(&self, deadline: Deadline, job: Job) {
        trace::job_enqueue_global_with_deadline(self.sink(), &deadline, &job);
        match self.hooks.enqueue_global_with_deadline.get() {
            Some(hook) => hook(deadline, job, &|deadline: Deadline, job: Job| {
                self.enqueue_global_with_deadline_impl(deadline, job);
            }),
            None => self.enqueue_global_with_deadline_impl(deadline, job),
        }
    }

    /// Default routing for [`GlobalExecutor::enqueue_global_with_deadline`].
    pub fn enqueue_global_with_deadline_impl(&self, deadline: Deadline, job: Job) {
        self.backend.enqueue_global_with_deadline(deadline, job);
    }

    // ---- main ----

    /// Run `job` on the main executor after every main job enqueued before it.
    pub fn enqueue_main(&self, job: Job) {
        trace::job_enqueue_main_executor(self.sink(), &job);
        match self.hooks.enqueue_main.get() {
            Some(hook) => hook(job, &|job: Job| self.enqueue_main_impl(job)),
            None => self.enqueue_main_impl(job),
        }
    }

    /// Default routing for [`GlobalExecutor::enqueue_main`]: the override's
    /// capabilities if one is installed, the backend's main queue otherwise.
    pub fn enqueue_main_impl(&self, job: Job) {
        if self.main.is_overridden() {
            let current = self.main.current();
            if current.identity() != self.main.builtin().identity() {
                if let Some(caps) = current.capabilities() {
                    debug!(job_id = job.id(), "routing main job to override executor");
                    caps.enqueue(job);
                    return;
                }
            }
        }
        self.backend.enqueue_main(job);
    }

    /// The current main executor.
    #[must_use]
    pub fn main_executor(&self) -> ExecutorRef {
        (*self.main.current()).clone()
    }

    /// Whether `executor` is the current main executor.
    #[must_use]
    pub fn is_main_executor(&self, executor: &ExecutorRef) -> bool {
        self.main.is_main(executor)
    }

    /// Replace the main executor. Allowed once, before the main executor is
    /// in active use.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::MainExecutorOverridden`] if an override is already
    /// installed.
    pub fn set_main_executor_override(&self, executor: ExecutorRef) -> Result<(), SchedulerError> {
        self.main.install(executor.clone())?;
        self.backend.set_main_executor_override(&executor);
        if let Some(hook) = self.hooks.set_main_executor.get() {
            hook(&executor);
        }
        Ok(())
    }

    // ---- hook installation ----

    /// Install the immediate-enqueue hook.
    pub fn set_enqueue_global_hook(&self, hook: Arc<EnqueueGlobalHook>) {
        self.hooks.enqueue_global.set(hook);
    }

    /// Install the delayed-enqueue hook.
    pub fn set_enqueue_global_with_delay_hook(&self, hook: Arc<EnqueueGlobalWithDelayHook>) {
        self.hooks.enqueue_global_with_delay.set(hook);
    }

    /// Install the deadline-enqueue hook.
    pub fn set_enqueue_global_with_deadline_hook(&self, hook: Arc<EnqueueGlobalWithDeadlineHook>) {
        self.hooks.enqueue_global_with_deadline.set(hook);
    }

    /// Install the main-enqueue hook.
    pub fn set_enqueue_main_hook(&self, hook: Arc<EnqueueMainHook>) {
        self.hooks.enqueue_main.set(hook);
    }

    /// Install the observer for main executor overrides.
    pub fn set_main_executor_hook(&self, hook: Arc<SetMainExecutorHook>) {
        self.hooks.set_main_executor.set(hook);
    }

    // ---- driving ----

    /// Hand the calling thread to the main queue.
    ///
    /// # Errors
    ///
    /// See [`Backend::drain_main_queue`].
    pub fn drain_main_queue(&self, mode: DrainMode) -> Result<usize, SchedulerError> {
        self.backend.drain_main_queue(mode)
    }

    /// Backend statistics.
    #[must_use]
    pub fn stats(&self) -> BackendStats {
        self.backend.stats()
    }

    /// Shut the backend down.
    pub fn shutdown(&self) {
        self.backend.shutdown();
    }
}

impl fmt::Debug for GlobalExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalExecutor")
            .field("backend", &self.backend.kind())
            .field("hooks", &self.hooks)
            .field("main", &self.main)
            .field("trace_sink", &self.trace_sink.is_some())
            .finish()
    }
}
