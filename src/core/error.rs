//! Error types for executor operations.

use thiserror::Error;

/// Errors produced by the global executor and its backends.
///
/// Enqueueing itself never fails: jobs are moved into the executor and the
/// call returns immediately. These errors cover configuration, installation
/// and main-queue driving.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The requested backend was not compiled into this build.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A main executor override has already been installed.
    #[error("main executor override already installed")]
    MainExecutorOverridden,
    /// The main queue is bound to a different thread.
    #[error("main queue drained from a thread other than the main thread")]
    NotMainThread,
    /// A process-wide component was already installed.
    #[error("already installed: {0}")]
    AlreadyInstalled(&'static str),
    /// The backend has been shut down.
    #[error("backend has been shut down")]
    Shutdown,
    /// A backend thread or runtime could not be created.
    #[error("failed to spawn backend thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
