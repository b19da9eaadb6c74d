//! Tests for configuration validation and loading

use global_executor::config::executor::{ENV_BACKEND, ENV_STACK_SIZE, ENV_WORKERS};
use global_executor::config::{BackendKind, ExecutorConfig};

#[test]
fn test_default_config_is_valid() {
    let cfg = ExecutorConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.backend, BackendKind::compiled_default());
    assert!(cfg.effective_worker_count() >= 1);
}

#[test]
fn test_explicit_worker_count_wins() {
    let cfg = ExecutorConfig::new().with_worker_count(3);
    assert_eq!(cfg.effective_worker_count(), 3);
}

#[test]
fn test_empty_prefix_rejected() {
    let cfg = ExecutorConfig::new().with_thread_name_prefix("");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_shutdown_timeout_rejected() {
    let cfg = ExecutorConfig::new().with_shutdown_timeout_ms(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_partial() {
    let cfg = ExecutorConfig::from_json_str(r#"{"backend":"thread_pool","worker_count":2}"#).unwrap();
    assert_eq!(cfg.backend, BackendKind::ThreadPool);
    assert_eq!(cfg.worker_count, 2);
    assert_eq!(cfg.thread_name_prefix, "global-executor");
}

#[test]
fn test_from_json_rejects_unknown_backend() {
    assert!(ExecutorConfig::from_json_str(r#"{"backend":"fibers"}"#).is_err());
}

#[test]
fn test_from_lookup_reads_variables() {
    let cfg = ExecutorConfig::from_lookup(|key| match key {
        k if k == ENV_BACKEND => Some("cooperative".into()),
        k if k == ENV_WORKERS => Some("6".into()),
        k if k == ENV_STACK_SIZE => Some("1048576".into()),
        _ => None,
    })
    .unwrap();
    assert_eq!(cfg.backend, BackendKind::Cooperative);
    assert_eq!(cfg.worker_count, 6);
    assert_eq!(cfg.thread_stack_size, 1_048_576);
}

#[test]
fn test_backend_kind_parse() {
    assert_eq!("dispatch".parse::<BackendKind>().unwrap(), BackendKind::Dispatch);
    assert!("gcd".parse::<BackendKind>().is_err());
}
