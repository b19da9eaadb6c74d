//! # Global Executor
//!
//! The process-wide job scheduling layer of a concurrent task runtime. Every
//! unit of asynchronous work produced anywhere in a program is handed to the
//! global executor, which decides which engine runs it, when, and with what
//! ordering and identity guarantees.
//!
//! ## Key Features
//!
//! - **Three enqueue modes**: immediate, after a relative delay, or at an
//!   absolute deadline on a named clock
//! - **Main executor**: a distinguished serial context drained by the
//!   program's primary thread, replaceable once at startup
//! - **Interposition hooks**: per-entry-point hooks that observe, redirect or
//!   suppress jobs and may delegate to the default routing
//! - **Pluggable engines**: a single-threaded cooperative run loop, a tokio
//!   backed dispatch engine, and a minimal OS thread pool
//! - **Compatibility seam**: the public free functions can be repointed at
//!   load time without recompiling callers
//!
//! ## Instance API
//!
//! ```rust,ignore
//! use global_executor::backend::{CooperativeBackend, DrainMode};
//! use global_executor::core::{GlobalExecutor, Job, JobDelay};
//! use std::time::Duration;
//!
//! let exec = GlobalExecutor::new(CooperativeBackend::new());
//! exec.enqueue_global(Job::new(|| println!("global")));
//! exec.enqueue_global_with_delay(
//!     JobDelay::from(Duration::from_millis(10)),
//!     Job::new(|| println!("later")),
//! );
//! exec.enqueue_main(Job::new(|| println!("main")));
//! exec.drain_main_queue(DrainMode::UntilIdle)?;
//! ```
//!
//! ## Process-wide API
//!
//! ```rust,ignore
//! use global_executor::runtime;
//! use global_executor::core::Job;
//!
//! // Built from GLOBAL_EXECUTOR_* environment variables on first use
//! runtime::enqueue_global(Job::new(|| println!("hello")));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Jobs, executor references, hooks and the enqueue API.
pub mod core;
/// Execution engines behind the enqueue API.
pub mod backend;
/// Configuration models for the global executor.
pub mod config;
/// Builders to construct backends and executors from configuration.
pub mod builders;
/// Process-wide entry points and the compatibility seam.
pub mod runtime;
/// Shared utilities.
pub mod util;
