//! Tests for error types

use global_executor::core::{AppResult, SchedulerError};

#[test]
fn test_backend_unavailable_error() {
    let err = SchedulerError::BackendUnavailable("dispatch".to_string());
    assert_eq!(format!("{}", err), "backend unavailable: dispatch");
}

#[test]
fn test_override_error() {
    let err = SchedulerError::MainExecutorOverridden;
    assert_eq!(format!("{}", err), "main executor override already installed");
}

#[test]
fn test_already_installed_error() {
    let err = SchedulerError::AlreadyInstalled("global executor");
    assert_eq!(format!("{}", err), "already installed: global executor");
}

#[test]
fn test_io_error_converts() {
    fn spawn() -> Result<(), SchedulerError> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "no threads"))?;
        Ok(())
    }
    let err = spawn().unwrap_err();
    assert!(matches!(err, SchedulerError::Spawn(_)));
    assert!(err.to_string().contains("no threads"));
}

#[test]
fn test_app_result_wraps_scheduler_error() {
    fn load() -> AppResult<()> {
        Err(SchedulerError::Shutdown.into())
    }
    let err = load().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
