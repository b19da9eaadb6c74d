//! Builders to construct the global executor from configuration.

use std::sync::Arc;

use tracing::info;

use crate::backend::{Backend, BackendKind, CooperativeBackend, ThreadPoolBackend};
use crate::config::ExecutorConfig;
use crate::core::{GlobalExecutor, SchedulerError};

/// Build the backend requested by `cfg`.
///
/// # Errors
///
/// [`SchedulerError::InvalidConfig`] when the configuration does not
/// validate, [`SchedulerError::BackendUnavailable`] when the requested engine
/// was not compiled in, and any error the engine itself reports while
/// starting threads.
pub fn build_backend(cfg: &ExecutorConfig) -> Result<Arc<dyn Backend>, SchedulerError> {
    if !cfg.backend.is_available() {
        return Err(SchedulerError::BackendUnavailable(format!(
            "{} engine not compiled in",
            cfg.backend
        )));
    }

    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;

    let backend: Arc<dyn Backend> = match cfg.backend {
        BackendKind::Cooperative => Arc::new(CooperativeBackend::new()),
        BackendKind::ThreadPool => Arc::new(ThreadPoolBackend::new(cfg)?),
        #[cfg(feature = "tokio-runtime")]
        BackendKind::Dispatch => Arc::new(crate::backend::DispatchBackend::new(cfg)?),
        #[cfg(not(feature = "tokio-runtime"))]
        BackendKind::Dispatch => {
            return Err(SchedulerError::BackendUnavailable(
                "dispatch engine requires the tokio-runtime feature".into(),
            ))
        }
    };
    info!(backend = %backend.kind(), "global executor backend built");
    Ok(backend)
}

/// Build a [`GlobalExecutor`] in front of the backend requested by `cfg`.
///
/// # Errors
///
/// See [`build_backend`].
pub fn build_executor(cfg: &ExecutorConfig) -> Result<GlobalExecutor, SchedulerError> {
    build_backend(cfg).map(GlobalExecutor::from_arc)
}
