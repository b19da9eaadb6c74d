//! Global executor configuration.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::BackendKind;

/// Environment variable selecting the backend.
pub const ENV_BACKEND: &str = "GLOBAL_EXECUTOR_BACKEND";
/// Environment variable setting the worker count.
pub const ENV_WORKERS: &str = "GLOBAL_EXECUTOR_WORKERS";
/// Environment variable setting the worker stack size in bytes.
pub const ENV_STACK_SIZE: &str = "GLOBAL_EXECUTOR_STACK_SIZE";

const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 64 * 1024;

/// Configuration of the global executor and its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Backend engine.
    pub backend: BackendKind,
    /// Worker threads for thread-based engines; 0 means one per CPU.
    pub worker_count: usize,
    /// Stack size of worker threads in bytes.
    pub thread_stack_size: usize,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
    /// How long shutdown waits for each worker, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::compiled_default(),
            worker_count: 0,
            thread_stack_size: DEFAULT_STACK_SIZE,
            thread_name_prefix: "global-executor".into(),
            shutdown_timeout_ms: 2_000,
        }
    }
}

impl ExecutorConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Set the worker count (0 means one per CPU).
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the worker stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the per-worker shutdown timeout.
    #[must_use]
    pub const fn with_shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.shutdown_timeout_ms = ms;
        self
    }

    /// Worker count with 0 resolved to the number of CPUs.
    #[must_use]
    pub fn effective_worker_count(&self) -> usize {
        if self.worker_count == 0 {
            num_cpus::get().max(1)
        } else {
            self.worker_count
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if !self.backend.is_available() {
            return Err(format!("backend `{}` is not compiled into this build", self.backend));
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!("thread_stack_size must be at least {MIN_STACK_SIZE} bytes"));
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        if self.shutdown_timeout_ms == 0 {
            return Err("shutdown_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment (and a `.env` file, if
    /// present), falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed variable or validation
    /// failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ExecutorConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(backend) = lookup(ENV_BACKEND) {
            cfg.backend = backend.parse().map_err(|e| format!("{ENV_BACKEND}: {e}"))?;
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            cfg.worker_count = workers
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_WORKERS}: {e}"))?;
        }
        if let Some(stack) = lookup(ENV_STACK_SIZE) {
            cfg.thread_stack_size = stack
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_STACK_SIZE}: {e}"))?;
        }
        cfg.validate()?;
        debug!(backend = %cfg.backend, workers = cfg.worker_count, "executor config loaded");
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_is_valid() {
        assert!(ExecutorConfig::default().validate().is_ok());
        assert!(ExecutorConfig::new().effective_worker_count() >= 1);
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BACKEND, "thread_pool"),
            (ENV_WORKERS, "3"),
            (ENV_STACK_SIZE, "131072"),
        ]
        .into_iter()
        .collect();
        let cfg = ExecutorConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
        assert_eq!(cfg.backend, BackendKind::ThreadPool);
        assert_eq!(cfg.effective_worker_count(), 3);
        assert_eq!(cfg.thread_stack_size, 131_072);
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let err = ExecutorConfig::from_lookup(|k| (k == ENV_WORKERS).then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.contains(ENV_WORKERS));
    }

    #[test]
    fn test_tiny_stack_rejected() {
        let cfg = ExecutorConfig::new().with_thread_stack_size(1024);
        assert!(cfg.validate().is_err());
    }
}
