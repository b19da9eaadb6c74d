//! Executor references: an identity plus the capabilities used to enqueue.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::job::Job;

static NEXT_IDENTITY: AtomicUsize = AtomicUsize::new(1);

/// Stable, pointer-sized handle identifying an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutorIdentity(usize);

impl ExecutorIdentity {
    /// Identity of the generic (global concurrent) executor.
    pub const GENERIC: Self = Self(0);

    /// Allocate a fresh identity that compares unequal to every other one.
    #[must_use]
    pub fn unique() -> Self {
        Self(NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw handle, e.g. the address of a foreign executor object.
    #[must_use]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// The raw handle.
    #[must_use]
    pub const fn as_raw(self) -> usize {
        self.0
    }
}

/// Capability table of a serial executor: how to hand it a job.
pub trait SerialExecutor: Send + Sync {
    /// Enqueue a job. Must not run it synchronously on the calling thread.
    fn enqueue(&self, job: Job);
}

/// Reference to an executor: `(identity, capabilities)`.
///
/// Equality and hashing consider the identity only.
#[derive(Clone)]
pub struct ExecutorRef {
    identity: ExecutorIdentity,
    capabilities: Option<Arc<dyn SerialExecutor>>,
}

impl ExecutorRef {
    /// The generic executor: "run anywhere on the global executor".
    #[must_use]
    pub const fn generic() -> Self {
        Self {
            identity: ExecutorIdentity::GENERIC,
            capabilities: None,
        }
    }

    /// Reference to an ordinary serial executor.
    #[must_use]
    pub fn for_ordinary(identity: ExecutorIdentity, capabilities: Arc<dyn SerialExecutor>) -> Self {
        Self {
            identity,
            capabilities: Some(capabilities),
        }
    }

    /// Identity handle.
    #[must_use]
    pub const fn identity(&self) -> ExecutorIdentity {
        self.identity
    }

    /// Capability table, if this is not the generic executor.
    #[must_use]
    pub fn capabilities(&self) -> Option<&Arc<dyn SerialExecutor>> {
        self.capabilities.as_ref()
    }

    /// Whether this is the generic executor.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.identity == ExecutorIdentity::GENERIC
    }

    /// Whether this references the main executor of the process-wide
    /// global executor.
    #[must_use]
    pub fn is_main_executor(&self) -> bool {
        crate::runtime::api::is_main_executor(self)
    }
}

impl PartialEq for ExecutorRef {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for ExecutorRef {}

impl Hash for ExecutorRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Debug for ExecutorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRef")
            .field("identity", &self.identity)
            .field("has_capabilities", &self.capabilities.is_some())
            .finish()
    }
}
