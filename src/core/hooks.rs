//! Interception hooks for the enqueue entry points.
//!
//! Each entry point has one [`HookSlot`]. An installed hook replaces the
//! default routing and receives the default implementation as `original`, so
//! it may delegate, defer, redirect or drop the job. A hook that never calls
//! `original` suppresses execution; the dropped job is retired normally.
//!
//! Slots are written by configuration code before concurrent scheduling
//! starts and read on every enqueue. The `installed` flag is published with
//! release ordering and checked with acquire ordering, so the common
//! "no hook" path never touches the lock.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::executor_ref::ExecutorRef;
use super::job::Job;
use super::time::{Deadline, JobDelay};

/// Default routing for immediate global enqueue.
pub type EnqueueGlobalOriginal<'a> = &'a dyn Fn(Job);
/// Default routing for delayed global enqueue.
pub type EnqueueGlobalWithDelayOriginal<'a> = &'a dyn Fn(JobDelay, Job);
/// Default routing for deadline global enqueue.
pub type EnqueueGlobalWithDeadlineOriginal<'a> = &'a dyn Fn(Deadline, Job);
/// Default routing for main-executor enqueue.
pub type EnqueueMainOriginal<'a> = &'a dyn Fn(Job);

/// Hook for immediate global enqueue.
pub type EnqueueGlobalHook = dyn for<'a> Fn(Job, EnqueueGlobalOriginal<'a>) + Send + Sync;
/// Hook for delayed global enqueue.
pub type EnqueueGlobalWithDelayHook =
    dyn for<'a> Fn(JobDelay, Job, EnqueueGlobalWithDelayOriginal<'a>) + Send + Sync;
/// Hook for deadline global enqueue.
pub type EnqueueGlobalWithDeadlineHook =
    dyn for<'a> Fn(Deadline, Job, EnqueueGlobalWithDeadlineOriginal<'a>) + Send + Sync;
/// Hook for main-executor enqueue.
pub type EnqueueMainHook = dyn for<'a> Fn(Job, EnqueueMainOriginal<'a>) + Send + Sync;
/// Observer notified when a main executor override is installed.
pub type SetMainExecutorHook = dyn Fn(&ExecutorRef) + Send + Sync;

/// A single, atomically swappable hook.
pub struct HookSlot<H: ?Sized> {
    installed: AtomicBool,
    hook: RwLock<Option<Arc<H>>>,
}

impl<H: ?Sized> HookSlot<H> {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            installed: AtomicBool::new(false),
            hook: RwLock::new(None),
        }
    }

    /// Install `hook`, replacing any previous one.
    pub fn set(&self, hook: Arc<H>) {
        *self.hook.write() = Some(hook);
        self.installed.store(true, Ordering::Release);
    }

    /// Remove the installed hook, restoring default routing.
    pub fn clear(&self) -> Option<Arc<H>> {
        self.installed.store(false, Ordering::Release);
        self.hook.write().take()
    }

    /// Whether a hook is installed.
    pub fn is_set(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Snapshot of the installed hook.
    pub fn get(&self) -> Option<Arc<H>> {
        if !self.installed.load(Ordering::Acquire) {
            return None;
        }
        self.hook.read().clone()
    }
}

impl<H: ?Sized> Default for HookSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for HookSlot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSlot").field("installed", &self.is_set()).finish()
    }
}

/// The hook slots of one global executor.
#[derive(Debug, Default)]
pub struct EnqueueHooks {
    /// Immediate global enqueue.
    pub enqueue_global: HookSlot<EnqueueGlobalHook>,
    /// Delayed global enqueue.
    pub enqueue_global_with_delay: HookSlot<EnqueueGlobalWithDelayHook>,
    /// Deadline global enqueue.
    pub enqueue_global_with_deadline: HookSlot<EnqueueGlobalWithDeadlineHook>,
    /// Main-executor enqueue.
    pub enqueue_main: HookSlot<EnqueueMainHook>,
    /// Main executor override installation.
    pub set_main_executor: HookSlot<SetMainExecutorHook>,
}

impl EnqueueHooks {
    /// Clear every slot.
    pub fn clear_all(&self) {
        self.enqueue_global.clear();
        self.enqueue_global_with_delay.clear();
        self.enqueue_global_with_deadline.clear();
        self.enqueue_main.clear();
        self.set_main_executor.clear();
    }
}
