//! Builders to construct backends and executors from configuration.

pub mod executor_builder;

pub use executor_builder::{build_backend, build_executor};
