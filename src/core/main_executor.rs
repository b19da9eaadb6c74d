//! Main executor identity and its one-time override.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::error::SchedulerError;
use super::executor_ref::{ExecutorIdentity, ExecutorRef};

/// Process-wide record of which serial executor is "main".
///
/// Starts out resolving to the backend's built-in main executor. An override
/// replaces identity and capabilities together as a single snapshot, so a
/// reader never sees the new identity paired with the old capabilities.
#[derive(Debug)]
pub struct MainExecutorCell {
    builtin: ExecutorRef,
    overridden: AtomicBool,
    current: RwLock<Arc<ExecutorRef>>,
}

impl MainExecutorCell {
    /// Cell resolving to `builtin` until overridden.
    #[must_use]
    pub fn new(builtin: ExecutorRef) -> Self {
        Self {
            current: RwLock::new(Arc::new(builtin.clone())),
            builtin,
            overridden: AtomicBool::new(false),
        }
    }

    /// The built-in main executor of the backend.
    #[must_use]
    pub const fn builtin(&self) -> &ExecutorRef {
        &self.builtin
    }

    /// The current main executor.
    #[must_use]
    pub fn current(&self) -> Arc<ExecutorRef> {
        Arc::clone(&self.current.read())
    }

    /// Identity of the current main executor.
    #[must_use]
    pub fn identity(&self) -> ExecutorIdentity {
        self.current.read().identity()
    }

    /// Whether `executor` is the current main executor.
    #[must_use]
    pub fn is_main(&self, executor: &ExecutorRef) -> bool {
        if !self.overridden.load(Ordering::Acquire) {
            return executor.identity() == self.builtin.identity();
        }
        executor.identity() == self.identity()
    }

    /// Whether an override is installed.
    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.overridden.load(Ordering::Acquire)
    }

    /// Install `executor` as the main executor.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::MainExecutorOverridden`] if an override was
    /// already installed.
    pub fn install(&self, executor: ExecutorRef) -> Result<(), SchedulerError> {
        let mut current = self.current.write();
        if self.overridden.load(Ordering::Acquire) {
            return Err(SchedulerError::MainExecutorOverridden);
        }
        info!(identity = executor.identity().as_raw(), "installing main executor override");
        *current = Arc::new(executor);
        self.overridden.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor_ref::SerialExecutor;
    use crate::core::job::Job;

    struct Noop;

    impl SerialExecutor for Noop {
        fn enqueue(&self, _job: Job) {}
    }

    #[test]
    fn test_defaults_to_builtin() {
        let cell = MainExecutorCell::new(ExecutorRef::generic());
        assert!(cell.is_main(&ExecutorRef::generic()));
        assert!(!cell.is_overridden());
        assert!(cell.current().is_generic());
    }

    #[test]
    fn test_override_switches_identity() {
        let cell = MainExecutorCell::new(ExecutorRef::generic());
        let id = ExecutorIdentity::unique();
        let replacement = ExecutorRef::for_ordinary(id, Arc::new(Noop));
        cell.install(replacement.clone()).unwrap();

        assert!(cell.is_main(&replacement));
        assert!(!cell.is_main(&ExecutorRef::generic()));
        assert_eq!(cell.identity(), id);
        assert!(cell.current().capabilities().is_some());
    }

    #[test]
    fn test_second_override_rejected() {
        let cell = MainExecutorCell::new(ExecutorRef::generic());
        let first = ExecutorRef::for_ordinary(ExecutorIdentity::unique(), Arc::new(Noop));
        let second = ExecutorRef::for_ordinary(ExecutorIdentity::unique(), Arc::new(Noop));
        cell.install(first.clone()).unwrap();
        assert!(matches!(
            cell.install(second),
            Err(SchedulerError::MainExecutorOverridden)
        ));
        assert!(cell.is_main(&first));
    }
}
