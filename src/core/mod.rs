//! Jobs, executor references, hooks and the enqueue API.

pub mod error;
pub mod executor_ref;
pub mod global;
pub mod hooks;
pub mod job;
pub mod main_executor;
pub mod time;
pub mod trace;

pub use error::{AppResult, SchedulerError};
pub use executor_ref::{ExecutorIdentity, ExecutorRef, SerialExecutor};
pub use global::GlobalExecutor;
pub use hooks::{
    EnqueueGlobalHook, EnqueueGlobalOriginal, EnqueueGlobalWithDeadlineHook,
    EnqueueGlobalWithDeadlineOriginal, EnqueueGlobalWithDelayHook, EnqueueGlobalWithDelayOriginal,
    EnqueueHooks, EnqueueMainHook, EnqueueMainOriginal, HookSlot, SetMainExecutorHook,
};
pub use job::{Job, JobId, JobMetadata, JobPriority};
pub use main_executor::MainExecutorCell;
pub use time::{ClockId, Deadline, JobDelay, Timestamp};
pub use trace::{EnqueueKind, InMemoryTraceSink, TraceEvent, TraceSink};
